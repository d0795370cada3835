//! Headless preview of a scripted world generator.
//!
//! Configuration is loaded from `worldgen.ron` and can be overridden via CLI
//! flags. The configured generator script is prepared against a small block
//! registry, a grid of heightmaps is generated on the worker thread, and
//! statistics are logged.
//!
//! Run with `cargo run -p nebula-demo -- --generator crates/nebula-demo/generators/default.lua`.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use glam::{IVec2, UVec2};
use nebula_config::{CliArgs, Config, WorldgenConfig};
use nebula_scripting::{
    GeneratorLoadError, LuaGeneratorScript, ScriptEngine, load_generator, load_generator_source,
};
use nebula_terrain::{
    Biome, BiomeSampler, BlocksLayers, GeneratedHeightmap, GeneratorScript, HeightmapTask,
    HeightmapWorker,
};
use nebula_voxel::{BlockDef, BlockRegistry, RegistryError};
use tracing::{error, info, warn};

/// Generator used when the configured script does not exist.
const BUNDLED_GENERATOR: &str = include_str!("../generators/default.lua");

const SOLID_BLOCKS: &[&str] = &[
    "stone",
    "dirt",
    "grass",
    "sand",
    "sandstone",
    "gravel",
    "snow",
    "clay",
];

const RESULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Column spacing used when sampling the biome distribution.
const BIOME_SAMPLE_STEP: usize = 4;

fn build_registry() -> Result<BlockRegistry, RegistryError> {
    let mut registry = BlockRegistry::new();
    for name in SOLID_BLOCKS {
        registry.register(BlockDef::solid(*name))?;
    }
    registry.register(BlockDef::liquid("water"))?;
    Ok(registry)
}

fn load(
    engine: &Arc<ScriptEngine>,
    worldgen: &WorldgenConfig,
) -> Result<LuaGeneratorScript, GeneratorLoadError> {
    if worldgen.generator.exists() {
        load_generator(engine, &worldgen.generator, worldgen.chunk_height)
    } else {
        warn!(
            path = %worldgen.generator.display(),
            "generator script not found, using the bundled default"
        );
        load_generator_source(engine, "default.lua", BUNDLED_GENERATOR, worldgen.chunk_height)
    }
}

fn describe_layers(layers: &BlocksLayers) -> String {
    layers
        .iter()
        .map(|layer| {
            let id = layer
                .try_block_id()
                .map_or_else(|| "?".to_string(), |id| id.0.to_string());
            if layer.is_resizeable() {
                format!("{}#{id} x*", layer.block)
            } else {
                format!("{}#{id} x{}", layer.block, layer.height)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_biomes(biomes: &[Biome]) {
    for biome in biomes {
        info!(
            biome = %biome.name,
            parameters = ?biome.parameters.iter().map(|p| (p.value, p.weight)).collect::<Vec<_>>(),
            ground = %describe_layers(&biome.ground_layers),
            ground_fixed_height = biome.ground_layers.fixed_height,
            sea = %describe_layers(&biome.sea_layers),
            "biome"
        );
    }
}

/// Generates `preview_regions`² heightmaps through the worker.
fn generate_preview(
    generator: &Arc<dyn GeneratorScript>,
    worldgen: &WorldgenConfig,
) -> std::io::Result<Vec<GeneratedHeightmap>> {
    let regions = worldgen.preview_regions.max(1) as i32;
    let size = UVec2::splat(worldgen.region_size.max(1));
    let count = (regions * regions) as usize;

    let worker = HeightmapWorker::spawn(Arc::clone(generator), count, count)?;
    for z in 0..regions {
        for x in 0..regions {
            let region = IVec2::new(x, z);
            let task = HeightmapTask {
                region,
                offset: region * size.as_ivec2(),
                size,
                seed: worldgen.seed,
            };
            if let Err(task) = worker.submit(task) {
                warn!(region = ?task.region, "heightmap queue full, skipping region");
            }
        }
    }

    let deadline = Instant::now() + RESULT_TIMEOUT;
    let mut results = Vec::with_capacity(count);
    while worker.in_flight_count() > 0 {
        if Instant::now() >= deadline {
            warn!(
                pending = worker.in_flight_count(),
                "timed out waiting for heightmaps"
            );
            break;
        }
        results.extend(worker.drain_results());
        std::thread::sleep(Duration::from_millis(1));
    }
    results.extend(worker.drain_results());
    results.sort_by_key(|done| (done.region.y, done.region.x));
    Ok(results)
}

fn report_heightmaps(results: &[GeneratedHeightmap], sea_level: u32) {
    let mut low = f32::INFINITY;
    let mut high = f32::NEG_INFINITY;
    let mut cells = 0usize;
    let mut submerged = 0usize;

    for done in results {
        let Some((min, max)) = done.heightmap.min_max() else {
            continue;
        };
        info!(
            region = ?done.region,
            min,
            max,
            time_us = done.generation_time_us,
            "heightmap"
        );
        low = low.min(min);
        high = high.max(max);
        cells += done.heightmap.values().len();
        submerged += done
            .heightmap
            .values()
            .iter()
            .filter(|&&h| h < sea_level as f32)
            .count();
    }

    if cells == 0 {
        warn!("no heightmaps generated");
        return;
    }
    info!(
        regions = results.len(),
        min = low,
        max = high,
        sea_level,
        submerged_percent = submerged as f64 * 100.0 / cells as f64,
        "heightmap preview complete"
    );
}

/// Counts how often each biome is selected over the preview area.
fn biome_distribution(
    biomes: &[Biome],
    sampler: &BiomeSampler,
    extent: i32,
) -> Vec<(String, usize)> {
    let mut counts = vec![0usize; biomes.len()];
    for z in (0..extent).step_by(BIOME_SAMPLE_STEP) {
        for x in (0..extent).step_by(BIOME_SAMPLE_STEP) {
            if let Some(index) = sampler.biome_at(biomes, x, z) {
                counts[index] += 1;
            }
        }
    }
    biomes
        .iter()
        .zip(counts)
        .map(|(biome, count)| (biome.name.clone(), count))
        .collect()
}

fn run(config: &Config) -> Result<(), Box<dyn Error>> {
    let worldgen = &config.worldgen;
    let registry = build_registry()?;
    info!(blocks = registry.len(), "block registry ready");

    let engine = Arc::new(ScriptEngine::new()?);
    let mut generator = load(&engine, worldgen)?;
    generator.prepare(&registry)?;
    describe_biomes(generator.biomes());

    let generator: Arc<dyn GeneratorScript> = Arc::new(generator);
    let results = generate_preview(&generator, worldgen)?;
    report_heightmaps(&results, generator.sea_level());

    if !generator.biomes().is_empty() {
        let sampler = BiomeSampler::new(worldgen.seed, generator.biome_parameter_count() as usize);
        let extent = (worldgen.preview_regions.max(1) * worldgen.region_size.max(1)) as i32;
        for (name, count) in biome_distribution(generator.biomes(), &sampler, extent) {
            info!(biome = %name, columns = count, "biome coverage");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = match args.config.clone() {
        Some(dir) => dir,
        None => Config::default_dir().unwrap_or_else(|e| {
            eprintln!("{e}, using the working directory");
            PathBuf::from(".")
        }),
    };

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config
        .debug
        .log_dir
        .clone()
        .unwrap_or_else(|| config_dir.join("logs"));
    nebula_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    info!(
        generator = %config.worldgen.generator.display(),
        seed = config.worldgen.seed,
        chunk_height = config.worldgen.chunk_height,
        "starting generator preview"
    );

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(load_error) = e.downcast_ref::<GeneratorLoadError>() {
                error!(cause = %load_error.root(), "generator failed to load: {load_error}");
            } else {
                error!("{e}");
            }
            ExitCode::FAILURE
        }
    }
}
