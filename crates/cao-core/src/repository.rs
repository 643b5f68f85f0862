//! Configuration repository trait.

use async_trait::async_trait;

use crate::config::CaoConfig;
use crate::error::Result;

/// Persistence for the cao configuration file.
///
/// Implementations merge the stored file over the built-in defaults on load,
/// so callers always see a config with every default model present.
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// Loads the effective configuration, creating the store if it is absent.
    async fn load(&self) -> Result<CaoConfig>;

    /// Replaces the stored configuration.
    async fn save(&self, config: &CaoConfig) -> Result<()>;

    /// Applies `f` to the current configuration and stores the result.
    ///
    /// Nothing is written when `f` fails. Stores shared between processes
    /// override this to lock across the read and the write.
    async fn update<F>(&self, f: F) -> Result<CaoConfig>
    where
        F: FnOnce(&mut CaoConfig) -> Result<()> + Send + 'static,
    {
        let mut config = self.load().await?;
        f(&mut config)?;
        self.save(&config).await?;
        Ok(config)
    }
}
