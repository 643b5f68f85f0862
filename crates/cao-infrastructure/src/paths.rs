//! Path resolution for the cao configuration file.
//!
//! ```text
//! $XDG_CONFIG_HOME/cao/config.toml    when XDG_CONFIG_HOME is set
//! ~/.cao/config.toml                  otherwise
//! ```

use std::path::PathBuf;

use cao_core::error::{CaoError, Result};

const APP_DIR: &str = "cao";
const LEGACY_DIR: &str = ".cao";
const CONFIG_FILE: &str = "config.toml";

pub struct CaoPaths;

impl CaoPaths {
    /// Returns the cao configuration directory for the current user.
    pub fn config_dir() -> Result<PathBuf> {
        let xdg = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);
        Self::config_dir_from(xdg, dirs::home_dir())
    }

    /// Returns the path of `config.toml`.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    fn config_dir_from(xdg_config_home: Option<PathBuf>, home: Option<PathBuf>) -> Result<PathBuf> {
        match xdg_config_home.filter(|p| !p.as_os_str().is_empty()) {
            Some(base) => Ok(base.join(APP_DIR)),
            None => home
                .map(|h| h.join(LEGACY_DIR))
                .ok_or_else(|| CaoError::config("cannot determine the home directory")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_config_home_wins() {
        let dir = CaoPaths::config_dir_from(
            Some(PathBuf::from("/tmp/xdg")),
            Some(PathBuf::from("/home/u")),
        )
        .unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/xdg/cao"));
    }

    #[test]
    fn falls_back_to_dot_cao_in_home() {
        let dir = CaoPaths::config_dir_from(None, Some(PathBuf::from("/home/u"))).unwrap();
        assert_eq!(dir, PathBuf::from("/home/u/.cao"));

        let dir =
            CaoPaths::config_dir_from(Some(PathBuf::new()), Some(PathBuf::from("/home/u"))).unwrap();
        assert_eq!(dir, PathBuf::from("/home/u/.cao"));
    }

    #[test]
    fn no_home_is_a_config_error() {
        assert!(CaoPaths::config_dir_from(None, None).unwrap_err().is_config());
    }
}
