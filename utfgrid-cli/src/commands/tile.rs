//! Tile command - fetch one tile and summarize its grid.

use std::collections::BTreeMap;

use utfgrid::cache::TileCache;
use utfgrid::coord::TileCoord;
use utfgrid::grid::TileGrid;

use super::common::{build_runtime, build_source, resolve_source};
use crate::error::CliError;

/// Run the tile command.
pub fn run(url: Option<String>, z: u8, x: i64, y: i64) -> Result<(), CliError> {
    let settings = resolve_source(url)?;
    let coord = TileCoord::new(x, y, z);

    println!("Tile: {}", coord);
    println!("URL:  {}", settings.template.url_for(coord));
    println!();

    let runtime = build_runtime()?;
    let mut cache = TileCache::new(build_source(&settings)?, runtime.handle().clone());

    let mut handle = cache.request(coord);
    runtime.block_on(async {
        while cache.next_update().await.is_some() {}
        handle.wait().await
    })?;

    let grid = cache
        .lookup(&coord)
        .ok_or_else(|| CliError::Runtime(format!("tile {} missing after load", coord)))?;
    print_summary(&grid);
    Ok(())
}

fn print_summary(grid: &TileGrid) {
    println!("Grid:     {} x {} cells", grid.width(), grid.height());
    println!("Keys:     {}", grid.keys().len());
    println!("Features: {}", grid.feature_count());

    let coverage = cell_coverage(grid);
    if coverage.is_empty() {
        return;
    }

    println!();
    println!("Coverage:");
    for (key, cells) in &coverage {
        let id = grid
            .features()
            .find(|(k, _)| k == key)
            .and_then(|(_, feature)| feature.id())
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<24} id={:<12} {} cells", key, id, cells);
    }
}

/// Cells per key, for keys that occur in the grid.
fn cell_coverage(grid: &TileGrid) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for gy in 0..grid.height() as i64 {
        for gx in 0..grid.width() as i64 {
            let key = grid
                .char_code(gx, gy)
                .and_then(|code| grid.key_for_char_code(code));
            if let Some(key) = key {
                *counts.entry(key.to_string()).or_insert(0) += 1;
            }
        }
    }
    counts
}
