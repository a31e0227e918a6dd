use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ColorScheme;
use crate::error::GeometryError;
use crate::geometry::{self, NormalizedBounds, RenderedBounds, TargetDimensions};
use crate::model::{EntityType, MatchRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualRecord {
    pub entity_name: String,
    pub pixel_bounds: RenderedBounds,
    pub confidence: f64,
    pub color: String,
}

/// Render-ready regions together with the dimensions they were produced for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub dimensions: TargetDimensions,
    pub records: Vec<VisualRecord>,
}

impl Overlay {
    pub fn for_page(&self, page: u32) -> impl Iterator<Item = &VisualRecord> {
        self.records
            .iter()
            .filter(move |record| record.pixel_bounds.page == page)
    }

    pub fn find(&self, entity_name: &str) -> Option<&VisualRecord> {
        self.records
            .iter()
            .find(|record| record.entity_name == entity_name)
    }
}

struct Survivor<'a> {
    entity_name: &'a str,
    entity_type: &'a EntityType,
    confidence: f64,
    bounds: NormalizedBounds,
}

fn survivors(records: &[MatchRecord], confidence_threshold: f64) -> Vec<Survivor<'_>> {
    records
        .iter()
        .filter(|record| record.confidence >= confidence_threshold)
        .filter_map(|record| {
            record.bounds.map(|bounds| Survivor {
                entity_name: record.entity_name.as_str(),
                entity_type: &record.entity_type,
                confidence: record.confidence,
                bounds,
            })
        })
        .collect()
}

/// One visual record per record at or above `confidence_threshold` that has bounds, in input order.
pub fn assemble(
    records: &[MatchRecord],
    dimensions: Option<&TargetDimensions>,
    confidence_threshold: f64,
    colors: &ColorScheme,
) -> Result<Vec<VisualRecord>, GeometryError> {
    let kept = survivors(records, confidence_threshold);
    debug!(
        input = records.len(),
        kept = kept.len(),
        confidence_threshold,
        "assembling overlay"
    );

    kept.into_iter()
        .map(|survivor| -> Result<VisualRecord, GeometryError> {
            Ok(VisualRecord {
                entity_name: survivor.entity_name.to_string(),
                pixel_bounds: geometry::convert(&survivor.bounds, dimensions)?,
                confidence: survivor.confidence,
                color: colors.color_for(survivor.entity_type).to_string(),
            })
        })
        .collect()
}

/// [`assemble`] followed by merging regions that overlap by at least `overlap_threshold`.
///
/// A merged region lists its entities joined by `" / "`, keeps the highest
/// confidence and takes the color of its most confident entity.
pub fn assemble_deduplicated(
    records: &[MatchRecord],
    dimensions: Option<&TargetDimensions>,
    confidence_threshold: f64,
    overlap_threshold: f64,
    colors: &ColorScheme,
) -> Result<Vec<VisualRecord>, GeometryError> {
    let kept = survivors(records, confidence_threshold);
    let bounds = kept
        .iter()
        .map(|survivor| survivor.bounds)
        .collect::<Vec<NormalizedBounds>>();
    let clusters = geometry::merge_clusters(&bounds, overlap_threshold);
    debug!(
        kept = kept.len(),
        regions = clusters.len(),
        overlap_threshold,
        "deduplicating overlay"
    );

    let mut visuals = Vec::<VisualRecord>::with_capacity(clusters.len());
    for cluster in clusters {
        let members = cluster
            .members
            .iter()
            .map(|index| &kept[*index])
            .collect::<Vec<&Survivor<'_>>>();

        // First member wins confidence ties.
        let Some(leader) = members.iter().copied().reduce(|best, next| {
            if next.confidence > best.confidence {
                next
            } else {
                best
            }
        }) else {
            continue;
        };

        let entity_name = members
            .iter()
            .map(|member| member.entity_name)
            .collect::<Vec<&str>>()
            .join(" / ");

        visuals.push(VisualRecord {
            entity_name,
            pixel_bounds: geometry::convert(&cluster.bounds, dimensions)?,
            confidence: leader.confidence,
            color: colors.color_for(leader.entity_type).to_string(),
        });
    }

    Ok(visuals)
}
