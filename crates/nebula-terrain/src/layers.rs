//! Block layer stacks: the vertical profile of a biome.
//!
//! A [`BlocksLayers`] stack lists strata from the surface downwards. At most one
//! layer may be resizeable (height [`RESIZEABLE_HEIGHT`]); it stretches to fill
//! whatever the fixed layers leave over.

use nebula_voxel::{BlockId, BlockRegistry, RegistryError};

/// Height sentinel marking a layer that fills the remaining column space.
pub const RESIZEABLE_HEIGHT: i32 = -1;

/// One stratum of a single block type.
#[derive(Clone, Debug, PartialEq)]
pub struct BlocksLayer {
    /// Block name as written in the generator script.
    pub block: String,
    /// Thickness in blocks, or [`RESIZEABLE_HEIGHT`].
    pub height: i32,
    /// Whether the layer is still placed when the surface is below sea level.
    pub below_sea_level: bool,
    resolved: Option<BlockId>,
}

impl BlocksLayer {
    /// Creates an unresolved layer.
    pub fn new(block: impl Into<String>, height: i32, below_sea_level: bool) -> Self {
        Self {
            block: block.into(),
            height,
            below_sea_level,
            resolved: None,
        }
    }

    pub fn is_resizeable(&self) -> bool {
        self.height == RESIZEABLE_HEIGHT
    }

    /// Runtime block ID resolved by [`BlocksLayers::resolve`].
    ///
    /// # Panics
    ///
    /// Panics if the layer has not been resolved yet. Generators must be
    /// prepared against the content registry before their layers are consumed.
    pub fn block_id(&self) -> BlockId {
        match self.resolved {
            Some(id) => id,
            None => panic!("layer '{}' used before its generator was prepared", self.block),
        }
    }

    /// Runtime block ID, or `None` before resolution.
    pub fn try_block_id(&self) -> Option<BlockId> {
        self.resolved
    }
}

/// Ordered layer stack of a biome (ground or sea).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlocksLayers {
    pub layers: Vec<BlocksLayer>,
    /// Summed height of the fixed layers following the resizeable one.
    ///
    /// Accumulation starts at the resizeable layer, so strata listed before it
    /// are not counted. Stacks without a resizeable layer report the sum of
    /// every layer.
    pub fixed_height: u32,
}

impl BlocksLayers {
    pub fn new(layers: Vec<BlocksLayer>, fixed_height: u32) -> Self {
        Self {
            layers,
            fixed_height,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BlocksLayer> {
        self.layers.iter()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Index of the resizeable layer, if the stack has one.
    pub fn resizeable_index(&self) -> Option<usize> {
        self.layers.iter().position(BlocksLayer::is_resizeable)
    }

    /// Resolves every layer's block name against the registry.
    ///
    /// Stops at the first unknown name; layers before it stay resolved.
    pub fn resolve(&mut self, registry: &BlockRegistry) -> Result<(), RegistryError> {
        for layer in &mut self.layers {
            layer.resolved = Some(registry.require(&layer.block)?);
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a BlocksLayers {
    type Item = &'a BlocksLayer;
    type IntoIter = std::slice::Iter<'a, BlocksLayer>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
