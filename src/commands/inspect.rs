use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use entity_locator::geometry::NormalizedBounds;
use entity_locator::layout::{DocumentLayout, LayoutDocument, TextLayoutProvider};

use crate::cli::InspectArgs;
use crate::util::read_json;

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSummary {
    pub pages: usize,
    pub spans: usize,
    pub lines: usize,
    pub occurrences: Option<Vec<NormalizedBounds>>,
}

pub fn run(args: InspectArgs) -> Result<()> {
    let summary = summarize(&args.layout, args.search.as_deref())?;

    info!(
        path = %args.layout.display(),
        pages = summary.pages,
        spans = summary.spans,
        lines = summary.lines,
        "layout summary"
    );

    if let (Some(needle), Some(occurrences)) =
        (args.search.as_deref(), summary.occurrences.as_ref())
    {
        if occurrences.is_empty() {
            warn!(text = %needle, "no occurrences found");
        }
        for bounds in occurrences {
            info!(
                text = %needle,
                page = bounds.page(),
                x = bounds.x(),
                y = bounds.y(),
                width = bounds.width(),
                height = bounds.height(),
                "occurrence"
            );
        }
    }

    Ok(())
}

fn summarize(path: &Path, search: Option<&str>) -> Result<LayoutSummary> {
    let document: LayoutDocument = read_json(path)?;
    let layout = DocumentLayout::from_document(document)
        .with_context(|| format!("invalid layout: {}", path.display()))?;

    for page in layout.page_numbers() {
        let dimensions = layout
            .page_dimensions(page)
            .with_context(|| format!("failed to read page {page} dimensions"))?;
        info!(page, width = dimensions.width, height = dimensions.height, "page");
    }

    let occurrences = search
        .map(|text| layout.search(text))
        .transpose()
        .context("layout search failed")?;

    Ok(LayoutSummary {
        pages: layout.page_count(),
        spans: layout.span_count(),
        lines: layout.line_count(),
        occurrences,
    })
}
