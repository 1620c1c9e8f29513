//! Ambient pipeline configuration.
//!
//! Unlike the bundle/module/variant data model, this configuration is not
//! part of any single bundle; it controls how the tool itself runs
//! (worker-pool sizing, subprocess timeouts, temp directory, the
//! bundletool-version-pinned optimization table). Loaded from and saved to
//! TOML in the platform config directory.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{AabForgeError, Result};

/// A named point in the bundletool-version-pinned optimization history.
/// Only the two entries this tool actually distinguishes between are
/// modeled; see `DESIGN.md` for the narrowing rationale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationEra {
    /// No uncompressed-native-libs or uncompressed-dex splitting.
    Baseline,
    /// Introduces uncompressed native libraries (API 23) and uncompressed
    /// dex (API 28) as separate variant boundaries.
    Current,
}

impl OptimizationEra {
    /// Minimum API levels at which this era introduces a new variant
    /// boundary, beyond the unconditional API-21 default variant.
    pub fn variant_boundaries(&self) -> &'static [u32] {
        match self {
            OptimizationEra::Baseline => &[],
            OptimizationEra::Current => &[23, 28],
        }
    }
}

/// Process-wide pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Configuration format version, for forward migrations.
    pub version: u32,
    /// Directory used for the writer's staging file before the atomic
    /// rename to the final destination.
    pub temp_dir: Option<PathBuf>,
    /// Wall-clock budget, in seconds, for a single external-tool
    /// invocation (aapt2, dex merger, signer).
    pub tool_timeout_secs: u64,
    /// Size of the bounded worker pool used for off-thread compression of
    /// entries above the inline-compression threshold.
    pub compression_workers: usize,
    /// Entries at or above this size are compressed on the worker pool
    /// instead of inline on the writer thread.
    pub parallel_compression_threshold_bytes: u64,
    /// Which optimization era to plan variants against.
    pub optimization_era: OptimizationEra,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: 1,
            temp_dir: None,
            tool_timeout_secs: 5 * 60,
            compression_workers: num_cpus::get().max(1),
            parallel_compression_threshold_bytes: 100 * 1024,
            optimization_era: OptimizationEra::Current,
        }
    }
}

impl PipelineConfig {
    /// Wall-clock budget for a single external-tool invocation, as a
    /// [`Duration`].
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("dev", "aabforge", "aabforge")
    }

    pub fn config_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load configuration from disk, creating a default file if none
    /// exists yet.
    pub async fn load() -> Result<Self> {
        let config_file = Self::config_file()
            .ok_or_else(|| AabForgeError::InvalidCommand("cannot determine config path".into()))?;

        if config_file.exists() {
            debug!("loading pipeline config from {:?}", config_file);
            let contents = tokio::fs::read_to_string(&config_file).await?;
            let config: PipelineConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            info!("no pipeline config found, writing defaults to {:?}", config_file);
            let config = PipelineConfig::default();
            config.save().await?;
            Ok(config)
        }
    }

    pub async fn save(&self) -> Result<()> {
        let config_file = Self::config_file()
            .ok_or_else(|| AabForgeError::InvalidCommand("cannot determine config path".into()))?;

        if let Some(parent) = config_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(&config_file, contents).await?;
        debug!("pipeline config saved to {:?}", config_file);
        Ok(())
    }
}
