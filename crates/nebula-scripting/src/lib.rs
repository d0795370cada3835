//! Lua bridge for procedural world generation.
//!
//! Generator definition scripts describe biomes, their block layer stacks, and
//! optionally a `generate_heightmap` function. [`load_generator`] validates a
//! script into a [`LuaGeneratorScript`], which chunk generation then drives
//! through the [`nebula_terrain::GeneratorScript`] trait.

mod engine;
mod error;
mod generator;
mod heightmap;
mod loader;

pub mod fields;

pub use engine::{ScriptEngine, ScriptEnv};
pub use error::{GeneratorLoadError, HeightmapCallError};
pub use fields::FieldError;
pub use generator::{HEIGHTMAP_FUNCTION, LuaGeneratorScript};
pub use heightmap::LuaHeightmap;
pub use loader::{
    MAX_BIOME_PARAMETERS, load_biome, load_generator, load_generator_source, load_layer,
    load_layers,
};
