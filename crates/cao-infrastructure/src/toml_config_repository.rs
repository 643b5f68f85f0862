//! TOML-based ConfigRepository implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cao_core::config::CaoConfig;
use cao_core::error::Result;
use cao_core::repository::ConfigRepository;
use tracing::{debug, info};

use crate::paths::CaoPaths;
use crate::storage::AtomicTomlFile;

/// Stores the cao configuration in a single `config.toml`.
///
/// Responsibilities:
/// - Merge the file over the built-in defaults on load
/// - Create the file with defaults when it does not exist yet
/// - Replace the file atomically on save
/// - Hold the file lock across the whole read-modify-write in `update`
pub struct TomlConfigRepository {
    file: AtomicTomlFile<CaoConfig>,
}

impl TomlConfigRepository {
    /// Creates a repository at the user's config path.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(CaoPaths::config_file()?))
    }

    /// Creates a repository backed by a custom path (for testing and `--config`-style overrides).
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Reads a standalone config file, as used by `cao config import`.
    ///
    /// The file is validated but not merged with defaults.
    pub fn read_external(path: &Path) -> Result<CaoConfig> {
        let config: CaoConfig = toml::from_str(&std::fs::read_to_string(path)?)?;
        config.validate()?;
        Ok(config)
    }
}

#[async_trait]
impl ConfigRepository for TomlConfigRepository {
    async fn load(&self) -> Result<CaoConfig> {
        match self.file.load()? {
            Some(stored) => {
                debug!("Loaded config from {}", self.path().display());
                Ok(CaoConfig::merged_over_defaults(stored))
            }
            None => {
                let config = CaoConfig::default();
                self.file.save(&config)?;
                info!("Created default config at {}", self.path().display());
                Ok(config)
            }
        }
    }

    async fn save(&self, config: &CaoConfig) -> Result<()> {
        self.file.save(config)?;
        debug!("Saved config to {}", self.path().display());
        Ok(())
    }

    async fn update<F>(&self, f: F) -> Result<CaoConfig>
    where
        F: FnOnce(&mut CaoConfig) -> Result<()> + Send + 'static,
    {
        let config = self.file.update(|stored| {
            let mut config = stored
                .map(CaoConfig::merged_over_defaults)
                .unwrap_or_default();
            f(&mut config)?;
            Ok(config)
        })?;
        debug!("Updated config at {}", self.path().display());
        Ok(config)
    }
}
