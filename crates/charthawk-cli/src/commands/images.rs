//! Images command - run discovery over the configured chart collection

use std::path::Path;

use charthawk_discover::{Discovery, Output};
use charthawk_repo::{IndexLoader, OciProber};

use crate::config::Config;
use crate::display;
use crate::error::Result;

/// Run the images command
pub async fn run(config_path: &Path, all: bool, update: bool, output: Option<&Path>) -> Result<()> {
    let config = Config::from_file(config_path)?;
    let collection = config.collection();
    tracing::debug!(charts = collection.charts.len(), "loaded configuration");

    let loader = IndexLoader::new(config.charts_dir.clone());
    let prober = OciProber::new();

    let discovery = Discovery::new(loader, prober)
        .with_options(config.discover_options(update))
        .with_mirrors(config.mirrors.clone())
        .with_standalone_images(config.standalone_images()?);

    let data = discovery.run(&collection).await?;

    display::render_chart_table(&data, all);
    display::render_image_table(&data);

    if let Some(path) = output {
        let report = Output::from_data(&data);
        report.write_to_file(path)?;
        println!("Result written to {}.yaml", path.display());
    }

    Ok(())
}
