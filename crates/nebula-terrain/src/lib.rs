//! World generation data model: biomes, block layer stacks, heightmaps, and the
//! contract between scripted generators and chunk generation.

mod async_generation;
mod generator;
mod heightmap;
mod layers;

pub mod biome;

pub use async_generation::{GeneratedHeightmap, HeightmapTask, HeightmapWorker};
pub use biome::{Biome, BiomeParameter, BiomeSampler, BiomeSelector};
pub use generator::GeneratorScript;
pub use heightmap::{Heightmap, HeightmapParams, HeightmapSampler};
pub use layers::{BlocksLayer, BlocksLayers, RESIZEABLE_HEIGHT};
