//! Probe command - report the feature under a geographic point.

use std::time::Instant;

use utfgrid::coord::{CoordError, GeoPoint, MAX_LAT, MIN_LAT};
use utfgrid::hit;
use utfgrid::host::{MapHost, WebMercatorHost};
use utfgrid::interaction::LayerEvent;
use utfgrid::UtfGridLayer;

use super::common::{build_runtime, build_source, resolve_source};
use crate::error::CliError;

/// Run the probe command.
pub fn run(url: Option<String>, lat: f64, lon: f64, zoom: u8) -> Result<(), CliError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat).into());
    }

    let settings = resolve_source(url)?;
    let runtime = build_runtime()?;
    let host = WebMercatorHost::new(zoom, settings.layer.tile_size);
    let (mut layer, mut events) = UtfGridLayer::new(
        settings.layer.clone(),
        build_source(&settings)?,
        host,
        runtime.handle().clone(),
    )?;
    layer.attach();

    let geo = GeoPoint::new(lat, lon);
    let view = layer.view();
    let tile = hit::locate(layer.host().project(geo, zoom), &view).tile;

    println!("Point: {}", geo);
    println!("Tile:  {}", tile);
    println!("URL:   {}", settings.template.url_for(tile));
    println!();

    let mut handle = layer.on_tile_created(tile);
    runtime.block_on(async {
        while layer.next_update().await.is_some() {}
        handle.wait().await
    })?;

    layer.pointer_click(geo, Instant::now());
    while let Ok(event) = events.try_recv() {
        if let LayerEvent::Click(click) = event {
            println!("Cell:  {}", click.cell_key.as_deref().unwrap_or("(none)"));
            match &click.feature {
                Some(feature) => {
                    println!("Feature:");
                    println!("{:#}", feature.value());
                }
                None => println!("No feature at this point."),
            }
        }
    }
    Ok(())
}
