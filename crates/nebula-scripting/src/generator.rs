//! [`GeneratorScript`] backed by a loaded Lua definition.

use std::fmt;
use std::sync::Arc;

use glam::{IVec2, UVec2};
use mlua::Value;
use nebula_terrain::{Biome, GeneratorScript, Heightmap};
use nebula_voxel::{BlockRegistry, RegistryError};

use crate::engine::{ScriptEngine, ScriptEnv};
use crate::error::HeightmapCallError;
use crate::heightmap::LuaHeightmap;

/// Name of the optional script function producing heightmaps.
pub const HEIGHTMAP_FUNCTION: &str = "generate_heightmap";

/// A generator definition loaded from a Lua script.
///
/// Owns the script's environment for its whole lifetime; the environment is
/// released when the generator is dropped.
pub struct LuaGeneratorScript {
    engine: Arc<ScriptEngine>,
    env: ScriptEnv,
    biomes: Vec<Biome>,
    biome_parameters: u32,
    sea_level: u32,
    prepared: bool,
}

impl LuaGeneratorScript {
    pub(crate) fn new(
        engine: Arc<ScriptEngine>,
        env: ScriptEnv,
        biomes: Vec<Biome>,
        biome_parameters: u32,
        sea_level: u32,
    ) -> Self {
        Self {
            engine,
            env,
            biomes,
            biome_parameters,
            sea_level,
            prepared: false,
        }
    }

    /// Whether [`prepare`](GeneratorScript::prepare) has completed.
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// The script engine this generator runs in.
    pub fn engine(&self) -> &Arc<ScriptEngine> {
        &self.engine
    }

    /// Calls `generate_heightmap(x, y, w, h, seed)` and validates the result.
    ///
    /// The seed is passed as a Lua integer, reinterpreting the bits as signed.
    pub fn try_generate_heightmap(
        &self,
        offset: IVec2,
        size: UVec2,
        seed: u64,
    ) -> Result<Heightmap, HeightmapCallError> {
        let function = match self
            .env
            .table()
            .get::<Value>(HEIGHTMAP_FUNCTION)
            .map_err(HeightmapCallError::Script)?
        {
            Value::Function(function) => function,
            Value::Nil => return Err(HeightmapCallError::MissingFunction),
            other => return Err(HeightmapCallError::NotAFunction(other.type_name())),
        };

        let result = function
            .call::<Value>((offset.x, offset.y, size.x, size.y, seed as i64))
            .map_err(HeightmapCallError::Script)?;
        heightmap_from_value(result, size)
    }
}

/// Converts a script return value into a heightmap of exactly `size`.
///
/// Accepts a `Heightmap` userdata or a flat row-major array of numbers.
fn heightmap_from_value(value: Value, size: UVec2) -> Result<Heightmap, HeightmapCallError> {
    let map = match value {
        Value::UserData(ud) => ud
            .borrow::<LuaHeightmap>()
            .map(|map| map.0.clone())
            .map_err(|_| HeightmapCallError::Malformed("a foreign userdata".to_string()))?,
        Value::Table(table) => {
            let expected = size.x as usize * size.y as usize;
            let len = table.raw_len();
            if len != expected {
                return Err(HeightmapCallError::Malformed(format!(
                    "an array of {len} values for {expected} cells"
                )));
            }
            let mut values = Vec::with_capacity(expected);
            for i in 1..=len {
                match table.raw_get::<Value>(i).map_err(HeightmapCallError::Script)? {
                    Value::Integer(v) => values.push(v as f32),
                    Value::Number(v) => values.push(v as f32),
                    other => {
                        return Err(HeightmapCallError::Malformed(format!(
                            "an array containing a {}",
                            other.type_name()
                        )));
                    }
                }
            }
            Heightmap::from_values(size.x, size.y, values).ok_or_else(|| {
                HeightmapCallError::Malformed("an array of the wrong length".to_string())
            })?
        }
        other => return Err(HeightmapCallError::Malformed(format!("a {}", other.type_name()))),
    };

    if map.size() != size {
        return Err(HeightmapCallError::DimensionMismatch {
            expected: size,
            actual: map.size(),
        });
    }
    Ok(map)
}

impl GeneratorScript for LuaGeneratorScript {
    fn prepare(&mut self, registry: &BlockRegistry) -> Result<(), RegistryError> {
        for biome in &mut self.biomes {
            biome.resolve(registry).inspect_err(|err| {
                tracing::error!(biome = %biome.name, %err, "failed to prepare world generator");
            })?;
        }
        self.prepared = true;
        tracing::info!(biomes = self.biomes.len(), "world generator prepared");
        Ok(())
    }

    fn generate_heightmap(&self, offset: IVec2, size: UVec2, seed: u64) -> Heightmap {
        match self.try_generate_heightmap(offset, size, seed) {
            Ok(map) => map,
            Err(HeightmapCallError::MissingFunction) => Heightmap::flat(size),
            Err(err) => {
                tracing::warn!(%offset, %size, %err, "heightmap generation failed, using flat heightmap");
                Heightmap::flat(size)
            }
        }
    }

    fn biomes(&self) -> &[Biome] {
        &self.biomes
    }

    fn biome_parameter_count(&self) -> u32 {
        self.biome_parameters
    }

    fn sea_level(&self) -> u32 {
        self.sea_level
    }
}

impl fmt::Debug for LuaGeneratorScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LuaGeneratorScript")
            .field("biomes", &self.biomes.len())
            .field("biome_parameters", &self.biome_parameters)
            .field("sea_level", &self.sea_level)
            .field("prepared", &self.prepared)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_generator_source;
    use nebula_voxel::{BlockDef, CHUNK_HEIGHT};

    const BIOMES: &str = r#"
        biome_parameters = 1
        sea_level = 48
        biomes = {
            hills = {
                parameters = { {value = 0.8, weight = 1} },
                layers = { {block = "grass", height = 1}, {block = "stone", height = -1} },
                sea_layers = { {block = "sand", height = 2} },
            },
        }
    "#;

    fn load(extra: &str) -> LuaGeneratorScript {
        let engine = Arc::new(ScriptEngine::new().unwrap());
        let source = format!("{BIOMES}\n{extra}");
        load_generator_source(&engine, "generator.lua", &source, CHUNK_HEIGHT).unwrap()
    }

    fn registry() -> BlockRegistry {
        let mut reg = BlockRegistry::new();
        for name in ["stone", "grass", "sand"] {
            reg.register(BlockDef::solid(name)).unwrap();
        }
        reg
    }

    fn size() -> UVec2 {
        UVec2::new(8, 4)
    }

    // --- prepare ----------------------------------------------------------

    #[test]
    fn test_prepare_resolves_every_layer() {
        let reg = registry();
        let mut generator = load("");
        assert!(!generator.is_prepared());
        generator.prepare(&reg).unwrap();
        assert!(generator.is_prepared());

        let biome = &generator.biomes()[0];
        for layer in biome.ground_layers.iter().chain(biome.sea_layers.iter()) {
            assert_eq!(layer.block_id(), reg.require(&layer.block).unwrap());
        }
    }

    #[test]
    fn test_prepare_fails_on_unknown_block() {
        let mut reg = BlockRegistry::new();
        reg.register(BlockDef::solid("grass")).unwrap();
        let mut generator = load("");
        let err = generator.prepare(&reg).unwrap_err();
        assert_eq!(err, RegistryError::UnknownBlock("stone".into()));
        assert!(!generator.is_prepared());
    }

    #[test]
    fn test_prepare_twice_is_harmless() {
        let reg = registry();
        let mut generator = load("");
        generator.prepare(&reg).unwrap();
        generator.prepare(&reg).unwrap();
        let stone = &generator.biomes()[0].ground_layers.layers[1];
        assert_eq!(stone.block_id(), reg.require("stone").unwrap());
    }

    #[test]
    fn test_heightmap_before_prepare_does_not_touch_layers() {
        let generator = load(
            "function generate_heightmap(x, y, w, h, seed) local m = Heightmap(w, h); m:fill(5); return m end",
        );
        let map = generator.generate_heightmap(IVec2::ZERO, size(), 1);
        assert!(map.values().iter().all(|&v| v == 5.0));
        let layer = &generator.biomes()[0].ground_layers.layers[0];
        assert_eq!(layer.try_block_id(), None);
    }

    // --- heightmaps -------------------------------------------------------

    #[test]
    fn test_script_receives_offset_size_and_seed() {
        let generator = load(
            r#"
            function generate_heightmap(x, y, w, h, seed)
                local m = Heightmap(w, h)
                m:set(0, 0, x)
                m:set(1, 0, y)
                m:set(2, 0, w)
                m:set(3, 0, h)
                m:set(4, 0, seed)
                return m
            end
            "#,
        );
        let map = generator
            .try_generate_heightmap(IVec2::new(-32, 64), size(), 99)
            .unwrap();
        assert_eq!(&map.values()[..5], &[-32.0, 64.0, 8.0, 4.0, 99.0]);
    }

    #[test]
    fn test_flat_array_result_is_accepted() {
        let generator = load(
            r#"
            function generate_heightmap(x, y, w, h, seed)
                local values = {}
                for i = 1, w * h do values[i] = i end
                return values
            end
            "#,
        );
        let map = generator.try_generate_heightmap(IVec2::ZERO, size(), 0).unwrap();
        assert_eq!(map.get(0, 0), Some(1.0));
        assert_eq!(map.get(7, 3), Some(32.0));
    }

    #[test]
    fn test_missing_function_falls_back_to_flat() {
        let generator = load("");
        assert!(matches!(
            generator.try_generate_heightmap(IVec2::ZERO, size(), 0),
            Err(HeightmapCallError::MissingFunction)
        ));
        assert_eq!(generator.generate_heightmap(IVec2::ZERO, size(), 0), Heightmap::flat(size()));
    }

    #[test]
    fn test_raising_function_falls_back_to_flat() {
        let generator = load("function generate_heightmap() error('no terrain today') end");
        let err = generator
            .try_generate_heightmap(IVec2::ZERO, size(), 0)
            .unwrap_err();
        assert!(matches!(err, HeightmapCallError::Script(_)));
        assert!(err.to_string().contains("no terrain today"), "{err}");
        assert_eq!(generator.generate_heightmap(IVec2::ZERO, size(), 0), Heightmap::flat(size()));
    }

    #[test]
    fn test_wrong_return_type_falls_back_to_flat() {
        let generator = load("function generate_heightmap() return 'mountains' end");
        assert!(matches!(
            generator.try_generate_heightmap(IVec2::ZERO, size(), 0),
            Err(HeightmapCallError::Malformed(_))
        ));
        assert_eq!(generator.generate_heightmap(IVec2::ZERO, size(), 0), Heightmap::flat(size()));
    }

    #[test]
    fn test_wrong_dimensions_fall_back_to_flat() {
        let generator = load("function generate_heightmap(x, y, w, h) return Heightmap(w + 1, h) end");
        assert!(matches!(
            generator.try_generate_heightmap(IVec2::ZERO, size(), 0),
            Err(HeightmapCallError::DimensionMismatch { .. })
        ));
        let map = generator.generate_heightmap(IVec2::ZERO, size(), 0);
        assert_eq!(map.size(), size());
        assert_eq!(map, Heightmap::flat(size()));
    }

    #[test]
    fn test_non_function_global_falls_back_to_flat() {
        let generator = load("generate_heightmap = 12");
        assert!(matches!(
            generator.try_generate_heightmap(IVec2::ZERO, size(), 0),
            Err(HeightmapCallError::NotAFunction("integer"))
        ));
        assert_eq!(generator.generate_heightmap(IVec2::ZERO, size(), 0), Heightmap::flat(size()));
    }

    #[test]
    fn test_failed_call_does_not_break_later_calls() {
        let generator = load(
            r#"
            calls = 0
            function generate_heightmap(x, y, w, h)
                calls = calls + 1
                if calls == 1 then error('first call fails') end
                local m = Heightmap(w, h)
                m:fill(calls)
                return m
            end
            "#,
        );
        assert_eq!(generator.generate_heightmap(IVec2::ZERO, size(), 0), Heightmap::flat(size()));
        let map = generator.generate_heightmap(IVec2::ZERO, size(), 0);
        assert!(map.values().iter().all(|&v| v == 2.0));
    }

    #[test]
    fn test_noise_heightmap_is_deterministic_per_seed() {
        let generator = load(
            r#"
            function generate_heightmap(x, y, w, h, seed)
                local m = Heightmap(w, h)
                m:noise(x, y, 0.05, 3, 16, seed)
                m:add(sea_level)
                return m
            end
            "#,
        );
        let a = generator.generate_heightmap(IVec2::new(16, 16), UVec2::new(16, 16), 5);
        let b = generator.generate_heightmap(IVec2::new(16, 16), UVec2::new(16, 16), 5);
        assert_eq!(a, b);
        let (lo, hi) = a.min_max().unwrap();
        assert!(lo < hi);
        assert!(lo > 48.0 - 32.0 && hi < 48.0 + 32.0, "range {lo}..{hi}");
    }

    // --- sharing ----------------------------------------------------------

    const NOISE_HEIGHTMAP: &str = r#"
        function generate_heightmap(x, y, w, h, seed)
            local m = Heightmap(w, h)
            m:noise(x, y, 0.05, 3, 16, seed)
            m:add(sea_level)
            return m
        end
    "#;

    fn shared_noise_generator() -> Arc<LuaGeneratorScript> {
        let mut generator = load(NOISE_HEIGHTMAP);
        generator.prepare(&registry()).unwrap();
        Arc::new(generator)
    }

    #[test]
    fn test_other_definitions_cannot_break_heightmap_api() {
        let engine = Arc::new(ScriptEngine::new().unwrap());
        let source = format!(
            "{BIOMES}\nfunction generate_heightmap(x, y, w, h) local m = Heightmap(w, h); m:fill(9); return m end"
        );
        let generator =
            load_generator_source(&engine, "good.lua", &source, CHUNK_HEIGHT).unwrap();
        let before = generator.generate_heightmap(IVec2::ZERO, size(), 0);
        assert!(before.values().iter().all(|&v| v == 9.0));

        load_generator_source(
            &engine,
            "hostile.lua",
            "_G.Heightmap = nil; rawset(_G, 'generate_heightmap', 1); biomes = {}",
            CHUNK_HEIGHT,
        )
        .unwrap();

        let after = generator
            .try_generate_heightmap(IVec2::ZERO, size(), 0)
            .unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_calls_from_several_threads_match_direct_calls() {
        let generator = shared_noise_generator();
        let offsets: Vec<IVec2> = (0..4).map(|i| IVec2::new(i * 16, -i * 8)).collect();
        let expected: Vec<Heightmap> = offsets
            .iter()
            .map(|&offset| generator.generate_heightmap(offset, UVec2::splat(16), 11))
            .collect();

        let handles: Vec<_> = offsets
            .iter()
            .map(|&offset| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || {
                    (0..5)
                        .map(|_| generator.generate_heightmap(offset, UVec2::splat(16), 11))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for (handle, expected) in handles.into_iter().zip(&expected) {
            for map in handle.join().unwrap() {
                assert_eq!(&map, expected);
            }
        }
    }

    #[test]
    fn test_worker_results_match_direct_calls() {
        use nebula_terrain::{HeightmapTask, HeightmapWorker};
        use std::time::{Duration, Instant};

        let generator = shared_noise_generator();
        let worker = HeightmapWorker::spawn(
            Arc::clone(&generator) as Arc<dyn GeneratorScript>,
            16,
            16,
        )
        .unwrap();

        let size = UVec2::splat(16);
        for x in 0..3 {
            for z in 0..2 {
                let region = IVec2::new(x, z);
                worker
                    .submit(HeightmapTask {
                        region,
                        offset: region * 16,
                        size,
                        seed: 7,
                    })
                    .unwrap();
            }
        }

        let mut results = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(10);
        while results.len() < 6 && Instant::now() < deadline {
            results.extend(worker.drain_results());
            std::thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(results.len(), 6);
        for done in results {
            let direct = generator.generate_heightmap(done.region * 16, size, 7);
            assert_eq!(done.heightmap, direct, "region {}", done.region);
            assert_ne!(done.heightmap, Heightmap::flat(size));
        }
    }
}
