//! Loading generator definitions from Lua scripts.
//!
//! A definition script sets a few globals:
//!
//! ```lua
//! biome_parameters = 2
//! sea_level = 63
//! biomes = {
//!     plains = {
//!         parameters = { {value = 0.5, weight = 1.0}, {value = 0.2, weight = 1.0} },
//!         layers = { {block = "grass", height = 1}, {block = "stone", height = -1} },
//!         sea_layers = { {block = "sand", height = 3, below_sea_level = true} },
//!     },
//! }
//! ```
//!
//! and optionally `generate_heightmap(x, y, w, h, seed)`.

use std::path::Path;
use std::sync::Arc;

use mlua::{Table, Value};
use nebula_terrain::{Biome, BiomeParameter, BlocksLayer, BlocksLayers, RESIZEABLE_HEIGHT};

use crate::engine::ScriptEngine;
use crate::error::GeneratorLoadError;
use crate::fields;
use crate::generator::LuaGeneratorScript;

/// Upper bound of the `biome_parameters` global.
pub const MAX_BIOME_PARAMETERS: u32 = 16;

/// Reads one `{block, height, below_sea_level}` entry.
pub fn load_layer(table: &Table) -> Result<BlocksLayer, GeneratorLoadError> {
    let block = fields::require_string(table, "block")?;
    let height = fields::require_integer(table, "height")?;
    let below_sea_level = fields::get_boolean(table, "below_sea_level", true)?;

    if height != i64::from(RESIZEABLE_HEIGHT) && !(1..=i64::from(i32::MAX)).contains(&height) {
        return Err(GeneratorLoadError::InvalidLayerHeight(height));
    }
    Ok(BlocksLayer::new(block, height as i32, below_sea_level))
}

/// The `i`-th (1-based) entry of a script list, which must be a table.
fn entry_table(list: &Table, i: usize, what: &str) -> Result<Table, GeneratorLoadError> {
    match list.raw_get::<Value>(i)? {
        Value::Table(entry) => Ok(entry),
        other => Err(GeneratorLoadError::InvalidDefinition(format!(
            "expected a {what} table, got {}",
            other.type_name()
        ))),
    }
}

fn layer_entry(
    list: &Table,
    i: usize,
    resizeable_seen: bool,
) -> Result<BlocksLayer, GeneratorLoadError> {
    let layer = load_layer(&entry_table(list, i, "layer")?)?;
    if layer.is_resizeable() && resizeable_seen {
        return Err(GeneratorLoadError::DuplicateResizeableLayer);
    }
    Ok(layer)
}

fn parameter_entry(list: &Table, i: usize) -> Result<BiomeParameter, GeneratorLoadError> {
    let entry = entry_table(list, i, "{value, weight}")?;
    Ok(BiomeParameter {
        value: fields::require_number(&entry, "value")? as f32,
        weight: fields::require_number(&entry, "weight")? as f32,
    })
}

/// Reads the layer list stored in `field`. An absent field is an empty stack.
///
/// Failures are prefixed with the field name and 1-based entry index.
pub fn load_layers(table: &Table, field: &str) -> Result<BlocksLayers, GeneratorLoadError> {
    let Some(list) = fields::optional_table(table, field)? else {
        return Ok(BlocksLayers::default());
    };

    let mut layers = Vec::new();
    let mut resizeable_seen = false;
    let mut fixed_height: u32 = 0;
    let mut total_height: u32 = 0;

    for i in 1..=list.raw_len() {
        let layer = layer_entry(&list, i, resizeable_seen)
            .map_err(|e| e.context(format!("{field} #{i}")))?;

        if layer.is_resizeable() {
            resizeable_seen = true;
        } else {
            let height = layer.height as u32;
            total_height = total_height.saturating_add(height);
            // Only layers after the resizeable one count towards its fixed height.
            if resizeable_seen {
                fixed_height = fixed_height.saturating_add(height);
            }
        }
        layers.push(layer);
    }

    if !resizeable_seen {
        fixed_height = total_height;
    }
    Ok(BlocksLayers::new(layers, fixed_height))
}

/// Reads one entry of the `biomes` table.
///
/// Exactly `parameter_count` parameters are read, in list order; extra entries
/// are ignored. Layer failures are prefixed with `biome <name>`.
pub fn load_biome(
    table: &Table,
    name: &str,
    parameter_count: u32,
) -> Result<Biome, GeneratorLoadError> {
    let list = fields::require_table(table, "parameters")?;
    let available = list.raw_len();
    if available < parameter_count as usize {
        return Err(GeneratorLoadError::InsufficientParameters {
            expected: parameter_count,
            actual: available,
        });
    }

    let mut parameters = Vec::with_capacity(parameter_count as usize);
    for i in 1..=parameter_count as usize {
        let parameter =
            parameter_entry(&list, i).map_err(|e| e.context(format!("parameters #{i}")))?;
        parameters.push(parameter);
    }

    let (ground_layers, sea_layers) = load_layers(table, "layers")
        .and_then(|ground| Ok((ground, load_layers(table, "sea_layers")?)))
        .map_err(|e| e.context(format!("biome {name}")))?;

    Ok(Biome {
        name: name.to_string(),
        parameters,
        ground_layers,
        sea_layers,
    })
}

fn biome_key_name(key: &Value) -> Result<String, GeneratorLoadError> {
    match key {
        Value::String(s) => Ok(s.to_string_lossy().to_string()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(GeneratorLoadError::InvalidDefinition(format!(
            "biome names must be strings, got {}",
            other.type_name()
        ))),
    }
}

/// Loads a generator definition file.
///
/// `chunk_height` bounds the `sea_level` global.
pub fn load_generator(
    engine: &Arc<ScriptEngine>,
    path: &Path,
    chunk_height: u32,
) -> Result<LuaGeneratorScript, GeneratorLoadError> {
    let source = std::fs::read_to_string(path).map_err(|source| GeneratorLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_generator_source(engine, &path.display().to_string(), &source, chunk_height)
}

/// Loads a generator definition from source text. `name` labels script errors.
///
/// Biomes are returned sorted by name so that generation does not depend on
/// Lua's table iteration order.
pub fn load_generator_source(
    engine: &Arc<ScriptEngine>,
    name: &str,
    source: &str,
    chunk_height: u32,
) -> Result<LuaGeneratorScript, GeneratorLoadError> {
    let env = engine.create_environment()?;
    env.exec(engine, name, source)
        .map_err(|source| GeneratorLoadError::ScriptLoad {
            name: name.to_string(),
            source,
        })?;

    let globals = env.table();
    let biome_parameters = fields::get_integer(
        globals,
        "biome_parameters",
        0,
        0,
        i64::from(MAX_BIOME_PARAMETERS),
    )? as u32;
    let sea_level = fields::get_integer(globals, "sea_level", 0, 0, i64::from(chunk_height))? as u32;

    let Value::Table(biome_table) = globals.get::<Value>("biomes")? else {
        return Err(GeneratorLoadError::InvalidDefinition(
            "'biomes' must be a table".to_string(),
        ));
    };

    let mut biomes = Vec::new();
    for pair in biome_table.pairs::<Value, Value>() {
        let (key, value) = pair?;
        let biome_name = biome_key_name(&key)?;
        let biome = match value {
            Value::Table(table) => load_biome(&table, &biome_name, biome_parameters),
            other => Err(GeneratorLoadError::InvalidDefinition(format!(
                "expected a biome table, got {}",
                other.type_name()
            ))),
        }
        .map_err(|e| e.context(format!("biome {biome_name}")))?;

        tracing::debug!(
            biome = %biome.name,
            ground_layers = biome.ground_layers.len(),
            sea_layers = biome.sea_layers.len(),
            "loaded biome"
        );
        biomes.push(biome);
    }
    biomes.sort_by(|a, b| a.name.cmp(&b.name));

    tracing::info!(
        script = name,
        biomes = biomes.len(),
        biome_parameters,
        sea_level,
        "loaded world generator"
    );
    Ok(LuaGeneratorScript::new(
        Arc::clone(engine),
        env,
        biomes,
        biome_parameters,
        sea_level,
    ))
}
