//! Biome system: script-defined biomes and parameter-space selection.
//!
//! Each biome sits at a point in an N-dimensional parameter space (temperature,
//! humidity, ...). World columns sample the same axes from noise and pick the
//! nearest biome.

mod def;
mod sampler;

pub use def::{Biome, BiomeParameter};
pub use sampler::{BiomeSampler, BiomeSelector};
