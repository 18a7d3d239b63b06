//! Layer configuration.
//!
//! [`LayerConfig`] is what the layer runs with. [`ConfigFile`] is the
//! on-disk INI form the CLI reads and edits; [`ConfigKey`] names each
//! settable value in `section.key` form.

mod file;
mod keys;

pub use file::{config_file_path, ConfigFile, LayerSection, SourceSection, CONFIG_FILE_NAME};
pub use keys::ConfigKey;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::interaction::DEFAULT_RESUME_DELAY;
use crate::provider::{DEFAULT_SUBDOMAINS, DEFAULT_TIMEOUT_SECS};

/// Default grid cell size in pixels.
pub const DEFAULT_RESOLUTION: u32 = 4;

/// Default pointer-move throttle interval.
pub const DEFAULT_MOUSE_INTERVAL: Duration = Duration::from_millis(66);

/// Default rendered tile size in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Errors raised while loading, editing or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Options the layer runs with.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerConfig {
    /// Pixel footprint of one grid cell.
    pub resolution: u32,

    /// Show a pointer cursor while hovering a feature.
    pub pointer_cursor: bool,

    /// Minimum spacing of processed pointer moves.
    pub mouse_interval: Duration,

    /// Rendered tile size in pixels.
    pub tile_size: u32,

    /// Wrap tile rows around the world like columns.
    pub wrap_vertical: bool,

    /// Delay before pointer input resumes after a box zoom.
    pub box_zoom_resume_delay: Duration,

    /// Timeout for one tile request.
    pub request_timeout: Duration,

    /// Values substituted for `{s}` in the URL template.
    pub subdomains: Vec<String>,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            pointer_cursor: true,
            mouse_interval: DEFAULT_MOUSE_INTERVAL,
            tile_size: DEFAULT_TILE_SIZE,
            wrap_vertical: true,
            box_zoom_resume_delay: DEFAULT_RESUME_DELAY,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            subdomains: DEFAULT_SUBDOMAINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl LayerConfig {
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_pointer_cursor(mut self, enabled: bool) -> Self {
        self.pointer_cursor = enabled;
        self
    }

    pub fn with_mouse_interval(mut self, interval: Duration) -> Self {
        self.mouse_interval = interval;
        self
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_wrap_vertical(mut self, wrap: bool) -> Self {
        self.wrap_vertical = wrap;
        self
    }

    pub fn with_box_zoom_resume_delay(mut self, delay: Duration) -> Self {
        self.box_zoom_resume_delay = delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_subdomains<I, S>(mut self, subdomains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subdomains = subdomains.into_iter().map(Into::into).collect();
        self
    }

    /// Checks values the layer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution == 0 {
            return Err(ConfigError::Invalid("resolution must be at least 1".into()));
        }
        if self.tile_size == 0 {
            return Err(ConfigError::Invalid("tile_size must be at least 1".into()));
        }
        if self.resolution > self.tile_size {
            return Err(ConfigError::Invalid(format!(
                "resolution {} exceeds tile_size {}",
                self.resolution, self.tile_size
            )));
        }
        Ok(())
    }
}
