//! Block content registry shared by world generation and chunk storage.

pub mod registry;

pub use registry::{BlockDef, BlockId, BlockRegistry, RegistryError, Transparency};

/// Vertical extent of a chunk column in blocks.
pub const CHUNK_HEIGHT: u32 = 256;
