//! Engine-facing contract of a scripted world generator.

use glam::{IVec2, UVec2};
use nebula_voxel::{BlockRegistry, RegistryError};

use crate::biome::Biome;
use crate::heightmap::Heightmap;

/// A loaded generator definition as seen by chunk generation.
///
/// Lifecycle: constructed by a loader, [`prepare`](Self::prepare)d once against
/// the content registry, then queried for heightmaps for the rest of its life.
pub trait GeneratorScript: Send + Sync {
    /// Resolves every layer's block name to a runtime ID.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownBlock`] for the first name the registry does not
    /// know. A generator that failed to prepare must not be used.
    fn prepare(&mut self, registry: &BlockRegistry) -> Result<(), RegistryError>;

    /// Elevation grid for the region starting at world column `offset`.
    ///
    /// Never fails: the result always has exactly `size` cells, falling back
    /// to a flat heightmap when the generator cannot produce one.
    fn generate_heightmap(&self, offset: IVec2, size: UVec2, seed: u64) -> Heightmap;

    /// Loaded biomes, sorted by name.
    ///
    /// The order does not follow the definition source; callers that index
    /// biomes (e.g. [`BiomeSelector`](crate::BiomeSelector)) rely on it being
    /// stable across loads of the same definition.
    fn biomes(&self) -> &[Biome];

    /// Number of parameters every biome carries.
    fn biome_parameter_count(&self) -> u32;

    fn sea_level(&self) -> u32;
}
