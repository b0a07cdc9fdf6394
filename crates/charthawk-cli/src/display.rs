//! Display formatting for CLI output
//!
//! Fixed-width tables for the chart overview and the image-to-value-path
//! mapping, colored with console styles.

use console::style;

use charthawk_discover::ChartData;

/// Print the chart overview table. Charts with zero images are hidden
/// unless `show_empty` is set.
pub fn render_chart_table(data: &ChartData, show_empty: bool) {
    println!(
        "{:<28} {:<16} {:<44} {:>6}",
        style("CHART").bold(),
        style("VERSION").bold(),
        style("REPOSITORY").bold(),
        style("IMAGES").bold()
    );

    for (chart, images) in data {
        if images.is_empty() && !show_empty {
            continue;
        }

        let name = if chart.parent.is_some() {
            format!("  └─ {}", chart.name)
        } else {
            chart.name.clone()
        };
        let count = if images.is_empty() {
            style(images.len().to_string()).dim()
        } else {
            style(images.len().to_string()).green()
        };

        println!(
            "{:<28} {:<16} {:<44} {:>6}",
            name,
            chart.version,
            chart.repo.url,
            count
        );
    }
    println!();
}

/// Print every image with the chart that owns it and the value paths that
/// referenced it.
pub fn render_image_table(data: &ChartData) {
    println!(
        "{:<24} {:<52} {}",
        style("CHART").bold(),
        style("IMAGE").bold(),
        style("VALUE PATHS").bold()
    );

    for (chart, images) in data {
        for (image, paths) in images {
            let paths = if paths.is_empty() {
                style("-".to_string()).dim()
            } else {
                style(paths.join(", ")).dim()
            };
            println!("{:<24} {:<52} {}", chart.name, image.normalized(), paths);
        }
    }
    println!();
}

/// Print the version resolution table row by row.
pub fn render_version_row(chart: &str, constraint: &str, resolved: &str) {
    let changed = constraint != resolved;
    let resolved = if changed {
        style(resolved.to_string()).green()
    } else {
        style(resolved.to_string()).dim()
    };
    println!("{:<28} {:<24} {}", chart, constraint, resolved);
}

/// Print the version table header.
pub fn render_version_header() {
    println!(
        "{:<28} {:<24} {}",
        style("CHART").bold(),
        style("CONSTRAINT").bold(),
        style("RESOLVED").bold()
    );
}
