pub mod inspect;
pub mod match_entities;
pub mod overlay;

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use entity_locator::config::{LocatorConfig, OverlayConfig};
use entity_locator::geometry::TargetDimensions;
use entity_locator::model::MatchRecord;
use entity_locator::overlay::{self as assembler, Overlay};

use crate::cli::DimensionArgs;
use crate::util::read_json;

pub(crate) fn load_config(path: Option<&Path>) -> Result<LocatorConfig> {
    let Some(path) = path else {
        return Ok(LocatorConfig::default());
    };

    let config: LocatorConfig = read_json(path)?;
    info!(path = %path.display(), "loaded locator config");
    Ok(config)
}

pub(crate) fn target_dimensions(args: &DimensionArgs) -> Result<Option<TargetDimensions>> {
    match (args.width, args.height) {
        (Some(width), Some(height)) => TargetDimensions::new(width, height, args.scale)
            .map(Some)
            .context("invalid target dimensions"),
        (None, None) => Ok(None),
        _ => bail!("--width and --height must be given together"),
    }
}

pub(crate) fn build_overlay(
    records: &[MatchRecord],
    dimensions: TargetDimensions,
    config: &OverlayConfig,
) -> Result<Overlay> {
    let records = if config.merge_overlaps {
        assembler::assemble_deduplicated(
            records,
            Some(&dimensions),
            config.confidence_threshold,
            config.overlap_threshold,
            &config.colors,
        )
    } else {
        assembler::assemble(
            records,
            Some(&dimensions),
            config.confidence_threshold,
            &config.colors,
        )
    }
    .context("failed to assemble overlay")?;

    Ok(Overlay {
        dimensions,
        records,
    })
}
