//! INI configuration file.
//!
//! ```ini
//! [layer]
//! resolution = 4
//! pointer_cursor = true
//! mouse_interval = 66
//! tile_size = 256
//! wrap_vertical = true
//!
//! [source]
//! url = https://{s}.tiles.example.com/{z}/{x}/{y}.grid.json
//! subdomains = a,b,c
//! timeout = 30
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use tracing::debug;

use super::keys::ConfigKey;
use super::{ConfigError, LayerConfig};

/// File name inside the configuration directory.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Path of the user's configuration file.
///
/// `<config dir>/utfgrid/config.ini`, falling back to the working
/// directory when the platform has no config directory.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("utfgrid")
        .join(CONFIG_FILE_NAME)
}

/// `[layer]` section.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerSection {
    pub resolution: u32,
    pub pointer_cursor: bool,
    /// Milliseconds.
    pub mouse_interval: u64,
    pub tile_size: u32,
    pub wrap_vertical: bool,
}

/// `[source]` section.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceSection {
    /// Tile URL template.
    pub url: Option<String>,
    pub subdomains: Vec<String>,
    /// Request timeout in seconds.
    pub timeout: u64,
}

/// Parsed configuration file.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigFile {
    pub layer: LayerSection,
    pub source: SourceSection,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let defaults = LayerConfig::default();
        Self {
            layer: LayerSection {
                resolution: defaults.resolution,
                pointer_cursor: defaults.pointer_cursor,
                mouse_interval: defaults.mouse_interval.as_millis() as u64,
                tile_size: defaults.tile_size,
                wrap_vertical: defaults.wrap_vertical,
            },
            source: SourceSection {
                url: None,
                subdomains: defaults.subdomains,
                timeout: defaults.request_timeout.as_secs(),
            },
        }
    }
}

impl ConfigFile {
    /// Loads the user's configuration file, or defaults if it does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Loads a configuration file, or defaults if it does not exist.
    ///
    /// Keys missing from the file keep their defaults; unknown keys are
    /// ignored.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(config);
        }

        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        for key in ConfigKey::all() {
            if let Some(value) = ini.get_from(Some(key.section()), key.key_name()) {
                key.set(&mut config, value)?;
            }
        }

        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Writes the user's configuration file, creating its directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Writes the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }
        ini.write_to_file(path).map_err(write_err)
    }

    /// Layer options described by this file.
    pub fn to_layer_config(&self) -> LayerConfig {
        LayerConfig::default()
            .with_resolution(self.layer.resolution)
            .with_pointer_cursor(self.layer.pointer_cursor)
            .with_mouse_interval(Duration::from_millis(self.layer.mouse_interval))
            .with_tile_size(self.layer.tile_size)
            .with_wrap_vertical(self.layer.wrap_vertical)
            .with_request_timeout(Duration::from_secs(self.source.timeout))
            .with_subdomains(self.source.subdomains.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = ConfigFile::default();
        config.layer.resolution = 2;
        config.layer.wrap_vertical = false;
        config.source.url = Some("https://{s}.example.com/{z}/{x}/{y}.json".to_string());
        config.source.subdomains = vec!["t1".to_string(), "t2".to_string()];
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[layer]\nresolution = 8\nunknown = 1\n").unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.layer.resolution, 8);
        assert_eq!(config.layer.tile_size, 256);
        assert!(config.source.url.is_none());
    }

    #[test]
    fn test_invalid_value_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[layer]\npointer_cursor = maybe\n").unwrap();

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert!(err.to_string().contains("layer.pointer_cursor"));
    }

    #[test]
    fn test_to_layer_config() {
        let mut config = ConfigFile::default();
        config.layer.mouse_interval = 100;
        config.source.timeout = 5;
        let layer = config.to_layer_config();
        assert_eq!(layer.mouse_interval, Duration::from_millis(100));
        assert_eq!(layer.request_timeout, Duration::from_secs(5));
        assert_eq!(layer.resolution, 4);
    }
}
