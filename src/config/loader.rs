//! Configuration file loading

use super::file::{WeighInConfig, CONFIG_FILE_NAME};
use crate::infra::{FileSystem, RealFileSystem};
use anyhow::{Context, Result};
use std::path::Path;

/// Handles loading configuration files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from .weigh-in.toml in the given directory
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use circleci_weigh_in::config::ConfigLoader;
    /// use std::path::Path;
    ///
    /// let config = ConfigLoader::load(Path::new("."))?;
    /// println!("Status label: {:?}", config.label);
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn load(project_root: &Path) -> Result<WeighInConfig> {
        Self::load_with_fs(project_root, &RealFileSystem)
    }

    /// Load config with a custom filesystem implementation
    pub fn load_with_fs(project_root: &Path, fs: &dyn FileSystem) -> Result<WeighInConfig> {
        let config_path = project_root.join(CONFIG_FILE_NAME);

        let contents = match fs.read_to_string(&config_path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(WeighInConfig::default());
            }
            Err(e) => {
                return Err(e).context("Failed to read .weigh-in.toml");
            }
        };

        let config: WeighInConfig =
            toml_edit::de::from_str(&contents).context("Failed to parse .weigh-in.toml")?;

        log::debug!("Loaded {}", config_path.display());
        Ok(config)
    }
}
