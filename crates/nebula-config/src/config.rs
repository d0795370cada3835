//! Configuration structs with defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "worldgen.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// World generation settings.
    pub worldgen: WorldgenConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// World generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldgenConfig {
    /// Generator definition script.
    pub generator: PathBuf,
    /// World seed passed to `generate_heightmap`.
    pub seed: u64,
    /// Column height; upper bound for the script's `sea_level`.
    pub chunk_height: u32,
    /// Edge length of a generated region in columns.
    pub region_size: u32,
    /// Regions per axis rendered by the preview tool.
    pub preview_regions: u32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level filter (e.g. "debug", "info,nebula_scripting=trace").
    pub log_level: String,
    /// Write JSON logs to this directory in debug builds.
    pub log_dir: Option<PathBuf>,
}

impl Default for WorldgenConfig {
    fn default() -> Self {
        Self {
            generator: PathBuf::from("generators/default.lua"),
            seed: 0,
            chunk_height: nebula_voxel::CHUNK_HEIGHT,
            region_size: 16,
            preview_regions: 4,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl Config {
    /// Per-user config directory (`<config dir>/nebula`).
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("nebula"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Location of `worldgen.ron` inside `config_dir`.
    pub fn path_in(config_dir: &Path) -> PathBuf {
        config_dir.join(CONFIG_FILE)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        ron::from_str(&contents).map_err(ConfigError::ParseError)
    }

    /// Reads `worldgen.ron` from `config_dir`, writing the defaults there first
    /// if the file does not exist yet.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::path_in(config_dir);
        if !path.exists() {
            let config = Self::default();
            config.save(config_dir)?;
            log::info!("Wrote default worldgen config to {}", path.display());
            return Ok(config);
        }

        let config = Self::read(&path)?;
        log::info!(
            "Loaded worldgen config from {} (generator {})",
            path.display(),
            config.worldgen.generator.display()
        );
        Ok(config)
    }

    /// Writes the config as pretty RON, creating `config_dir` if needed.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(2)
            .enumerate_arrays(false);
        let text = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;
        std::fs::write(Self::path_in(config_dir), text).map_err(ConfigError::WriteError)
    }

    /// Re-reads the file. `None` when it matches `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let fresh = Self::read(&Self::path_in(config_dir))?;
        if fresh == *self {
            return Ok(None);
        }
        log::info!("Worldgen config changed on disk");
        Ok(Some(fresh))
    }
}
