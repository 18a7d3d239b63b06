//! Common helpers shared across CLI commands.

use std::sync::Arc;

use tokio::runtime::Runtime;
use tracing::debug;
use utfgrid::config::{ConfigFile, LayerConfig};
use utfgrid::provider::{AsyncReqwestClient, TileSource, UrlTemplate, UrlTileSource};

use crate::error::CliError;

/// Settings for commands that talk to a tile source.
pub struct SourceSettings {
    pub layer: LayerConfig,
    pub template: UrlTemplate,
}

/// Resolves layer options and the URL template from CLI args and config.
///
/// `--url` takes precedence over `source.url`.
pub fn resolve_source(cli_url: Option<String>) -> Result<SourceSettings, CliError> {
    let config = ConfigFile::load()?;
    let layer = config.to_layer_config();
    layer.validate()?;

    let url = cli_url.or(config.source.url).ok_or_else(|| {
        CliError::Config(
            "No tile URL configured. Pass --url or run \
             'utfgrid config set source.url <template>'"
                .to_string(),
        )
    })?;
    let template = UrlTemplate::with_subdomains(url, layer.subdomains.clone())?;
    debug!(template = %template, resolution = layer.resolution, "Resolved tile source");

    Ok(SourceSettings { layer, template })
}

/// HTTP tile source for the resolved settings.
pub fn build_source(settings: &SourceSettings) -> Result<Arc<dyn TileSource>, CliError> {
    let client = AsyncReqwestClient::with_timeout(settings.layer.request_timeout.as_secs())?;
    Ok(Arc::new(UrlTileSource::new(settings.template.clone(), client)))
}

/// Multi-threaded runtime for fetch tasks.
pub fn build_runtime() -> Result<Runtime, CliError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(format!("Failed to start async runtime: {}", e)))
}
