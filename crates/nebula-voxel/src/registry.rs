//! Block registry: maps block names to compact runtime [`BlockId`] values.
//!
//! Content packs register their blocks once at startup; world generators then
//! resolve the block names they reference with [`BlockRegistry::require`].
//! Air is always ID 0 so that zero-initialized chunk memory is empty space.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Runtime identifier of a registered block. Stable for the registry's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u16);

/// Transparency mode for a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transparency {
    /// Fully blocks light and visibility.
    Opaque,
    /// Partially transparent (e.g. water, leaves).
    SemiTransparent,
    /// Completely transparent (e.g. air).
    FullyTransparent,
}

/// Content definition of a block as registered by a content pack.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockDef {
    /// Namespaced or plain name referenced by scripts (e.g. "stone", "base:sand").
    pub name: String,
    /// Whether entities collide with this block.
    pub solid: bool,
    /// Transparency mode.
    pub transparency: Transparency,
}

impl BlockDef {
    /// Shorthand for an opaque, solid block.
    pub fn solid(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            solid: true,
            transparency: Transparency::Opaque,
        }
    }

    /// Shorthand for a non-solid, semi-transparent block such as water.
    pub fn liquid(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            solid: false,
            transparency: Transparency::SemiTransparent,
        }
    }
}

/// Errors produced by the block registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A block with the same name has already been registered.
    #[error("duplicate block name: {0}")]
    DuplicateName(String),
    /// All 65 536 slots have been consumed.
    #[error("block registry is full (max 65536 blocks)")]
    RegistryFull,
    /// A lookup referenced a block that was never registered.
    #[error("block '{0}' is not registered")]
    UnknownBlock(String),
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Dense block table with O(1) lookup by [`BlockId`] and by name.
pub struct BlockRegistry {
    /// `index == BlockId.0`.
    blocks: Vec<BlockDef>,
    name_to_id: FxHashMap<String, BlockId>,
}

impl BlockRegistry {
    /// Name of the block pre-registered as ID 0.
    pub const AIR: &'static str = "air";

    /// Creates a registry with only Air registered.
    pub fn new() -> Self {
        let air = BlockDef {
            name: Self::AIR.to_string(),
            solid: false,
            transparency: Transparency::FullyTransparent,
        };
        let mut name_to_id = FxHashMap::default();
        name_to_id.insert(air.name.clone(), BlockId(0));
        Self {
            blocks: vec![air],
            name_to_id,
        }
    }

    /// Registers a block and returns its ID. IDs are assigned sequentially from 1.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateName`] if the name is taken,
    /// [`RegistryError::RegistryFull`] if no IDs are left.
    pub fn register(&mut self, def: BlockDef) -> Result<BlockId, RegistryError> {
        if self.name_to_id.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }
        if self.blocks.len() > u16::MAX as usize {
            return Err(RegistryError::RegistryFull);
        }

        let id = BlockId(self.blocks.len() as u16);
        tracing::trace!(name = %def.name, id = id.0, "registered block");
        self.name_to_id.insert(def.name.clone(), id);
        self.blocks.push(def);
        Ok(id)
    }

    /// Returns the definition for an ID, or `None` if out of range.
    pub fn get(&self, id: BlockId) -> Option<&BlockDef> {
        self.blocks.get(id.0 as usize)
    }

    /// Returns the ID for a named block, or `None` if not registered.
    pub fn lookup_by_name(&self, name: &str) -> Option<BlockId> {
        self.name_to_id.get(name).copied()
    }

    /// Resolves a block name that must exist.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownBlock`] if `name` was never registered.
    pub fn require(&self, name: &str) -> Result<BlockId, RegistryError> {
        self.lookup_by_name(name)
            .ok_or_else(|| RegistryError::UnknownBlock(name.to_string()))
    }

    /// Total number of registered blocks, including Air.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if only Air is registered.
    pub fn is_empty(&self) -> bool {
        self.blocks.len() <= 1
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
