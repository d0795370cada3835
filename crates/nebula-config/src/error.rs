//! Configuration error types.

/// Errors that can occur when loading, saving, or parsing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read `worldgen.ron`.
    #[error("failed to read worldgen config: {0}")]
    ReadError(#[source] std::io::Error),

    /// Failed to write `worldgen.ron`.
    #[error("failed to write worldgen config: {0}")]
    WriteError(#[source] std::io::Error),

    /// The file is not valid RON for [`crate::Config`].
    #[error("failed to parse worldgen config: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    #[error("failed to serialize worldgen config: {0}")]
    SerializeError(#[source] ron::Error),

    /// The platform has no per-user config directory.
    #[error("no config directory available on this platform")]
    NoConfigDir,
}
