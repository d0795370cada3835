//! Error types for generator loading and heightmap calls.

use std::path::PathBuf;

use glam::UVec2;

use crate::fields::FieldError;

/// Errors that abort loading a generator definition.
///
/// Nested failures are wrapped in [`GeneratorLoadError::Context`] as they
/// propagate, so the message reads like a path:
/// `biome plains: biome plains: layers #2: only one resizeable layer allowed`.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorLoadError {
    /// The script file could not be read.
    #[error("failed to read generator script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The script failed to compile or raised while running.
    #[error("failed to load generator script '{name}': {source}")]
    ScriptLoad {
        name: String,
        #[source]
        source: mlua::Error,
    },

    /// A required top-level definition is missing or malformed.
    #[error("{0}")]
    InvalidDefinition(String),

    /// A biome lists fewer parameters than `biome_parameters`.
    #[error("{expected} parameters expected, got {actual}")]
    InsufficientParameters { expected: u32, actual: usize },

    #[error("only one resizeable layer allowed")]
    DuplicateResizeableLayer,

    #[error("invalid layer height {0}: expected a positive height or -1")]
    InvalidLayerHeight(i64),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("script error: {0}")]
    Lua(#[from] mlua::Error),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<GeneratorLoadError>,
    },
}

impl GeneratorLoadError {
    /// Wraps the error with a path segment such as `"layers #2"`.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, past all context wrappers.
    pub fn root(&self) -> &GeneratorLoadError {
        let mut err = self;
        while let Self::Context { source, .. } = err {
            err = &**source;
        }
        err
    }
}

/// Why a `generate_heightmap` call produced no usable heightmap.
#[derive(Debug, thiserror::Error)]
pub enum HeightmapCallError {
    #[error("generator does not define 'generate_heightmap'")]
    MissingFunction,

    #[error("'generate_heightmap' is a {0}, not a function")]
    NotAFunction(&'static str),

    #[error("'generate_heightmap' raised: {0}")]
    Script(#[source] mlua::Error),

    #[error("'generate_heightmap' returned {0}, expected a Heightmap")]
    Malformed(String),

    #[error("'generate_heightmap' returned a {actual} heightmap, expected {expected}")]
    DimensionMismatch { expected: UVec2, actual: UVec2 },
}
