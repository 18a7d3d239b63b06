//! Settable configuration keys.

use std::fmt;
use std::str::FromStr;

use super::file::ConfigFile;
use super::ConfigError;
use crate::provider::UrlTemplate;

/// A value in the configuration file, addressed as `section.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    LayerResolution,
    LayerPointerCursor,
    LayerMouseInterval,
    LayerTileSize,
    LayerWrapVertical,
    SourceUrl,
    SourceSubdomains,
    SourceTimeout,
}

const ALL_KEYS: &[ConfigKey] = &[
    ConfigKey::LayerResolution,
    ConfigKey::LayerPointerCursor,
    ConfigKey::LayerMouseInterval,
    ConfigKey::LayerTileSize,
    ConfigKey::LayerWrapVertical,
    ConfigKey::SourceUrl,
    ConfigKey::SourceSubdomains,
    ConfigKey::SourceTimeout,
];

impl ConfigKey {
    /// Every key, grouped by section.
    pub fn all() -> &'static [ConfigKey] {
        ALL_KEYS
    }

    /// Full name, e.g. `layer.resolution`.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::LayerResolution => "layer.resolution",
            ConfigKey::LayerPointerCursor => "layer.pointer_cursor",
            ConfigKey::LayerMouseInterval => "layer.mouse_interval",
            ConfigKey::LayerTileSize => "layer.tile_size",
            ConfigKey::LayerWrapVertical => "layer.wrap_vertical",
            ConfigKey::SourceUrl => "source.url",
            ConfigKey::SourceSubdomains => "source.subdomains",
            ConfigKey::SourceTimeout => "source.timeout",
        }
    }

    pub fn section(&self) -> &'static str {
        self.split().0
    }

    pub fn key_name(&self) -> &'static str {
        self.split().1
    }

    fn split(&self) -> (&'static str, &'static str) {
        let name = self.name();
        name.split_once('.').unwrap_or(("", name))
    }

    /// Current value as written to the file; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::LayerResolution => config.layer.resolution.to_string(),
            ConfigKey::LayerPointerCursor => config.layer.pointer_cursor.to_string(),
            ConfigKey::LayerMouseInterval => config.layer.mouse_interval.to_string(),
            ConfigKey::LayerTileSize => config.layer.tile_size.to_string(),
            ConfigKey::LayerWrapVertical => config.layer.wrap_vertical.to_string(),
            ConfigKey::SourceUrl => config.source.url.clone().unwrap_or_default(),
            ConfigKey::SourceSubdomains => config.source.subdomains.join(","),
            ConfigKey::SourceTimeout => config.source.timeout.to_string(),
        }
    }

    /// Parses and stores a value.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::LayerResolution => {
                config.layer.resolution = self.parse_positive(value)? as u32;
            }
            ConfigKey::LayerPointerCursor => {
                config.layer.pointer_cursor = self.parse_bool(value)?;
            }
            ConfigKey::LayerMouseInterval => {
                config.layer.mouse_interval = self.parse_number(value)?;
            }
            ConfigKey::LayerTileSize => {
                config.layer.tile_size = self.parse_positive(value)? as u32;
            }
            ConfigKey::LayerWrapVertical => {
                config.layer.wrap_vertical = self.parse_bool(value)?;
            }
            ConfigKey::SourceUrl => {
                config.source.url = if value.is_empty() {
                    None
                } else {
                    UrlTemplate::with_subdomains(value, config.source.subdomains.clone())
                        .map_err(|e| self.invalid(value, e.to_string()))?;
                    Some(value.to_string())
                };
            }
            ConfigKey::SourceSubdomains => {
                config.source.subdomains = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            ConfigKey::SourceTimeout => {
                config.source.timeout = self.parse_positive(value)?;
            }
        }
        Ok(())
    }

    fn invalid(&self, value: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name().to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    fn parse_number(&self, value: &str) -> Result<u64, ConfigError> {
        value
            .parse::<u64>()
            .map_err(|_| self.invalid(value, "expected a non-negative integer"))
    }

    fn parse_positive(&self, value: &str) -> Result<u64, ConfigError> {
        match self.parse_number(value)? {
            0 => Err(self.invalid(value, "must be at least 1")),
            n if n > u32::MAX as u64 => Err(self.invalid(value, "too large")),
            n => Ok(n),
        }
    }

    fn parse_bool(&self, value: &str) -> Result<bool, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(self.invalid(value, "expected true or false")),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
