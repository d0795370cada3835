//! Biome definition: parameter-space position plus ground and sea layer stacks.

use nebula_voxel::{BlockRegistry, RegistryError};

use crate::layers::BlocksLayers;

/// One coordinate of a biome's position in parameter space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeParameter {
    /// Position on this axis.
    pub value: f32,
    /// Blend weight; larger weights make the biome cover a wider range of the axis.
    pub weight: f32,
}

/// A named terrain classification.
#[derive(Clone, Debug, PartialEq)]
pub struct Biome {
    /// Key of the biome in the generator's `biomes` table.
    pub name: String,
    /// Index-aligned with the generator's sampling axes.
    pub parameters: Vec<BiomeParameter>,
    /// Layers placed under the surface on land.
    pub ground_layers: BlocksLayers,
    /// Layers placed under the surface when it is below sea level.
    pub sea_layers: BlocksLayers,
}

impl Biome {
    /// Resolves the block names of both layer stacks.
    pub fn resolve(&mut self, registry: &BlockRegistry) -> Result<(), RegistryError> {
        self.ground_layers.resolve(registry)?;
        self.sea_layers.resolve(registry)
    }
}
