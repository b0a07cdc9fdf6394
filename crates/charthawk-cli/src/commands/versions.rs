//! Versions command - show which version each chart constraint selects

use std::path::Path;

use charthawk_repo::{resolver, ChartLoader, IndexLoader};

use crate::config::Config;
use crate::display;
use crate::error::Result;

/// Run the versions command
pub async fn run(config_path: &Path, latest: bool) -> Result<()> {
    let config = Config::from_file(config_path)?;
    let loader = IndexLoader::new(config.charts_dir.clone());

    display::render_version_header();

    for chart in &config.charts {
        let resolved = if latest {
            let published = loader.published_versions(chart).await?;
            resolver::latest_candidates(&chart.name, &published)?
        } else if resolver::is_exact(&chart.version) {
            chart.version.clone()
        } else {
            let published = loader.published_versions(chart).await?;
            resolver::resolve_candidates(&chart.name, &published, &chart.version)?
        };
        display::render_version_row(&chart.name, &chart.version, &resolved);
    }

    Ok(())
}
