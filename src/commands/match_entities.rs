use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use entity_locator::config::LocatorConfig;
use entity_locator::layout::{DocumentLayout, LayoutDocument};
use entity_locator::matching::{CacheCounters, CancellationToken, MatchDispatcher, build_report};
use entity_locator::model::{EntityInput, Statistics};

use crate::cli::MatchArgs;
use crate::commands::{build_overlay, load_config, target_dimensions};
use crate::util::{now_utc_string, read_json, sha256_file, write_json_pretty};

const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputFingerprint {
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_document: Option<String>,
    pub entities: InputFingerprint,
    pub layout: InputFingerprint,
    pub config: LocatorConfig,
    pub statistics: Statistics,
    pub cache: CacheCounters,
    pub duration_ms: u128,
    pub cancelled: bool,
}

pub fn run(args: MatchArgs) -> Result<()> {
    let started = Instant::now();
    let config = effective_config(&args)?;

    // Fail before matching rather than after a long batch.
    let dimensions = target_dimensions(&args.dimensions)?;
    if args.overlay_out.is_some() && dimensions.is_none() {
        bail!("--overlay-out requires --width and --height");
    }

    let input: EntityInput = read_json(&args.entities)?;
    let source_document = input.source_document().map(ToOwned::to_owned);
    let entities = input.into_entities();

    let document: LayoutDocument = read_json(&args.layout)?;
    let layout = DocumentLayout::from_document(document)
        .with_context(|| format!("invalid layout: {}", args.layout.display()))?;

    info!(
        entities = entities.len(),
        pages = layout.page_count(),
        spans = layout.span_count(),
        source = %source_document.as_deref().unwrap_or("-"),
        "starting match run"
    );

    let dispatcher = MatchDispatcher::new(&layout, &config.matcher);
    let cancel = CancellationToken::new();
    let outcome = dispatcher
        .match_batch(&entities, &cancel)
        .context("entity matching failed")?;
    let cache = dispatcher.cache_counters();

    let report = build_report(outcome.records);
    write_json_pretty(&args.out, &report)?;
    info!(
        path = %args.out.display(),
        matched = report.statistics.matched,
        partial_matched = report.statistics.partial_matched,
        unmatched = report.statistics.unmatched,
        "wrote match report"
    );

    if let (Some(path), Some(dimensions)) = (args.overlay_out.as_deref(), dimensions) {
        let overlay = build_overlay(&report.matched_entities, dimensions, &config.overlay)?;
        write_json_pretty(path, &overlay)?;
        info!(path = %path.display(), regions = overlay.records.len(), "wrote overlay");
    }

    if outcome.cancelled {
        warn!("match run cancelled; report is partial");
    }

    if let Some(manifest_path) = args.manifest_path.as_deref() {
        let manifest = RunManifest {
            manifest_version: MANIFEST_VERSION,
            generated_at: now_utc_string(),
            source_document,
            entities: fingerprint(&args.entities)?,
            layout: fingerprint(&args.layout)?,
            config,
            statistics: report.statistics.clone(),
            cache,
            duration_ms: started.elapsed().as_millis(),
            cancelled: outcome.cancelled,
        };
        write_json_pretty(manifest_path, &manifest)?;
        info!(path = %manifest_path.display(), "wrote run manifest");
    }

    Ok(())
}

fn effective_config(args: &MatchArgs) -> Result<LocatorConfig> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(value) = args.fuzzy_threshold {
        config.matcher.fuzzy_threshold = value;
    }
    if let Some(value) = args.proximity_threshold {
        config.matcher.proximity_threshold = value;
    }
    if args.parallel {
        config.matcher.parallel = true;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn fingerprint(path: &Path) -> Result<InputFingerprint> {
    Ok(InputFingerprint {
        path: path.display().to_string(),
        sha256: sha256_file(path)?,
    })
}
