use anyhow::{Context, Result};
use tracing::info;

use entity_locator::config::LocatorConfig;
use entity_locator::model::MatchReport;

use crate::cli::OverlayArgs;
use crate::commands::{build_overlay, load_config, target_dimensions};
use crate::util::{read_json, write_json_pretty};

pub fn run(args: OverlayArgs) -> Result<()> {
    let config = effective_config(&args)?;
    let dimensions = target_dimensions(&args.dimensions)?
        .context("overlay requires --width and --height")?;

    let report: MatchReport = read_json(&args.report)?;
    let overlay = build_overlay(&report.matched_entities, dimensions, &config.overlay)?;

    write_json_pretty(&args.out, &overlay)?;
    info!(
        path = %args.out.display(),
        records = report.matched_entities.len(),
        regions = overlay.records.len(),
        merged = config.overlay.merge_overlaps,
        "wrote overlay"
    );

    Ok(())
}

fn effective_config(args: &OverlayArgs) -> Result<LocatorConfig> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(value) = args.confidence_threshold {
        config.overlay.confidence_threshold = value;
    }
    if let Some(value) = args.overlap_threshold {
        config.overlay.overlap_threshold = value;
    }
    if args.merge_overlaps {
        config.overlay.merge_overlaps = true;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}
