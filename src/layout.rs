use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::geometry::NormalizedBounds;
use crate::text::{condense_whitespace, normalize_search_text};

/// Source of positioned text for one document.
///
/// Implementations own document parsing; the matcher only asks for occurrences
/// of a string, the searchable spans, and page sizes.
pub trait TextLayoutProvider: Send + Sync {
    /// Every occurrence of `text`, in page then reading order.
    fn search(&self, text: &str) -> Result<Vec<NormalizedBounds>, LayoutError>;

    fn spans(&self) -> Result<Vec<TextSpan>, LayoutError>;

    fn page_dimensions(&self, page: u32) -> Result<PageDimensions, LayoutError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub bounds: NormalizedBounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    pub width: f64,
    pub height: f64,
}

/// Serialized layout: page sizes and span rectangles in page units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutDocument {
    pub pages: Vec<LayoutPage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutPage {
    pub page: u32,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub spans: Vec<LayoutSpan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutSpan {
    pub text: String,
    /// `[x0, y0, x1, y1]`
    pub bbox: [f64; 4],
}

#[derive(Debug, Clone)]
struct IndexedSpan {
    /// Document text with whitespace collapsed, as reported to callers.
    text: String,
    search_text: String,
    bounds: NormalizedBounds,
    char_count: usize,
}

#[derive(Debug, Clone)]
struct LineSegment {
    span_index: usize,
    char_start: usize,
    char_end: usize,
}

#[derive(Debug, Clone)]
struct IndexedLine {
    text: String,
    search_text: String,
    segments: Vec<LineSegment>,
}

#[derive(Debug, Clone)]
struct IndexedPage {
    page: u32,
    dimensions: PageDimensions,
}

/// In-memory [`TextLayoutProvider`] over a pre-extracted [`LayoutDocument`].
///
/// Search is case-insensitive on whitespace-collapsed text and may cross span
/// boundaries within a line; a hit covering part of a span is narrowed in
/// proportion to its character offsets.
#[derive(Debug, Clone)]
pub struct DocumentLayout {
    pages: Vec<IndexedPage>,
    spans: Vec<IndexedSpan>,
    lines: Vec<IndexedLine>,
}

impl DocumentLayout {
    pub fn from_document(document: LayoutDocument) -> Result<Self, LayoutError> {
        let mut pages = document.pages;
        pages.sort_by_key(|page| page.page);

        let mut indexed_pages = Vec::<IndexedPage>::with_capacity(pages.len());
        let mut spans = Vec::<IndexedSpan>::new();
        let mut lines = Vec::<IndexedLine>::new();

        for page in pages {
            if page.page == 0 {
                return Err(LayoutError::InvalidLayout(
                    "page numbers are 1-based".to_string(),
                ));
            }
            if indexed_pages.iter().any(|existing| existing.page == page.page) {
                return Err(LayoutError::InvalidLayout(format!(
                    "duplicate page {}",
                    page.page
                )));
            }

            let first_span = spans.len();
            for span in &page.spans {
                let search_text = normalize_search_text(&span.text);
                if search_text.is_empty() {
                    continue;
                }

                let bounds =
                    NormalizedBounds::from_page_rect(page.page, span.bbox, page.width, page.height)
                        .map_err(|error| {
                            LayoutError::InvalidLayout(format!(
                                "span '{}' on page {}: {error}",
                                span.text, page.page
                            ))
                        })?;

                spans.push(IndexedSpan {
                    text: condense_whitespace(&span.text),
                    char_count: search_text.chars().count(),
                    search_text,
                    bounds,
                });
            }
            lines.extend(build_lines(&spans, first_span));

            indexed_pages.push(IndexedPage {
                page: page.page,
                dimensions: PageDimensions {
                    width: page.width,
                    height: page.height,
                },
            });
        }

        Ok(Self {
            pages: indexed_pages,
            spans,
            lines,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page numbers in ascending order; they need not be contiguous.
    pub fn page_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.iter().map(|entry| entry.page)
    }

    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn occurrence_bounds(
        &self,
        line: &IndexedLine,
        char_start: usize,
        char_end: usize,
    ) -> Result<Option<NormalizedBounds>, LayoutError> {
        let mut pieces = Vec::<NormalizedBounds>::new();

        for segment in &line.segments {
            let start = char_start.max(segment.char_start);
            let end = char_end.min(segment.char_end);
            if start >= end {
                continue;
            }

            let span = &self.spans[segment.span_index];
            let total = span.char_count.max(1) as f64;
            let local_start = (start - segment.char_start) as f64;
            let local_len = (end - start) as f64;
            let bounds = span.bounds;

            let piece = NormalizedBounds::new(
                bounds.page(),
                bounds.x() + bounds.width() * local_start / total,
                bounds.y(),
                bounds.width() * local_len / total,
                bounds.height(),
            )
            .map_err(|error| LayoutError::InvalidLayout(error.to_string()))?;
            pieces.push(piece);
        }

        if pieces.is_empty() {
            return Ok(None);
        }

        crate::geometry::merge(&pieces)
            .map(Some)
            .map_err(|error| LayoutError::InvalidLayout(error.to_string()))
    }
}

impl TextLayoutProvider for DocumentLayout {
    fn search(&self, text: &str) -> Result<Vec<NormalizedBounds>, LayoutError> {
        let needle = normalize_search_text(text);
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let needle_chars = needle.chars().count();

        let mut found = Vec::<NormalizedBounds>::new();
        for line in &self.lines {
            for (byte_index, _) in line.search_text.match_indices(needle.as_str()) {
                let char_start = line.search_text[..byte_index].chars().count();
                if let Some(bounds) =
                    self.occurrence_bounds(line, char_start, char_start + needle_chars)?
                {
                    found.push(bounds);
                }
            }
        }

        Ok(found)
    }

    fn spans(&self) -> Result<Vec<TextSpan>, LayoutError> {
        let mut candidates = Vec::<TextSpan>::with_capacity(self.spans.len() + self.lines.len());

        for line in &self.lines {
            for segment in &line.segments {
                let span = &self.spans[segment.span_index];
                candidates.push(TextSpan {
                    text: span.text.clone(),
                    bounds: span.bounds,
                });
            }

            if line.segments.len() > 1 {
                let char_end = line.search_text.chars().count();
                if let Some(bounds) = self.occurrence_bounds(line, 0, char_end)? {
                    candidates.push(TextSpan {
                        text: line.text.clone(),
                        bounds,
                    });
                }
            }
        }

        Ok(candidates)
    }

    fn page_dimensions(&self, page: u32) -> Result<PageDimensions, LayoutError> {
        self.pages
            .iter()
            .find(|entry| entry.page == page)
            .map(|entry| entry.dimensions)
            .ok_or(LayoutError::PageOutOfRange {
                page,
                page_count: self.pages.len(),
            })
    }
}

/// Groups consecutive spans of one page whose vertical centers line up.
fn build_lines(spans: &[IndexedSpan], first_span: usize) -> Vec<IndexedLine> {
    let mut lines = Vec::<IndexedLine>::new();
    let mut current: Option<(IndexedLine, f64, f64)> = None;

    for (span_index, span) in spans.iter().enumerate().skip(first_span) {
        let center = span.bounds.y() + span.bounds.height() / 2.0;
        let height = span.bounds.height();

        if let Some((line, line_center, line_height)) = current.as_mut() {
            let tolerance = line_height.max(height) / 2.0;
            if (center - *line_center).abs() <= tolerance {
                line.text.push(' ');
                line.text.push_str(&span.text);
                line.search_text.push(' ');
                let char_start = line.search_text.chars().count();
                line.search_text.push_str(&span.search_text);
                line.segments.push(LineSegment {
                    span_index,
                    char_start,
                    char_end: char_start + span.char_count,
                });
                *line_height = line_height.max(height);
                continue;
            }
        }

        if let Some((line, _, _)) = current.take() {
            lines.push(line);
        }
        current = Some((
            IndexedLine {
                text: span.text.clone(),
                search_text: span.search_text.clone(),
                segments: vec![LineSegment {
                    span_index,
                    char_start: 0,
                    char_end: span.char_count,
                }],
            },
            center,
            height,
        ));
    }

    if let Some((line, _, _)) = current {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(pages: Vec<LayoutPage>) -> DocumentLayout {
        DocumentLayout::from_document(LayoutDocument { pages }).expect("layout should index")
    }

    fn page(page: u32, spans: &[(&str, [f64; 4])]) -> LayoutPage {
        LayoutPage {
            page,
            width: 100.0,
            height: 100.0,
            spans: spans
                .iter()
                .map(|(text, bbox)| LayoutSpan {
                    text: text.to_string(),
                    bbox: *bbox,
                })
                .collect(),
        }
    }

    #[test]
    fn search_is_case_insensitive_and_narrows_within_span() {
        let document = layout(vec![page(1, &[("Total REVENUE 2024", [10.0, 10.0, 46.0, 14.0])])]);

        let hits = document.search("revenue").expect("search should succeed");

        assert_eq!(hits.len(), 1);
        let hit = hits[0];
        assert_eq!(hit.page(), 1);
        // "total revenue 2024" is 18 chars; "revenue" starts at 6 and spans 7.
        assert!((hit.x() - (0.10 + 0.36 * 6.0 / 18.0)).abs() < 1e-9);
        assert!((hit.width() - 0.36 * 7.0 / 18.0).abs() < 1e-9);
        assert!((hit.y() - 0.10).abs() < 1e-9);
    }

    #[test]
    fn search_crosses_spans_on_the_same_line() {
        let document = layout(vec![page(
            1,
            &[
                ("On-Time", [10.0, 20.0, 24.0, 24.0]),
                ("Delivery Rate", [25.0, 20.0, 51.0, 24.0]),
                ("Next line", [10.0, 40.0, 28.0, 44.0]),
            ],
        )]);

        let hits = document
            .search("on-time   delivery")
            .expect("search should succeed");

        assert_eq!(hits.len(), 1);
        assert!((hits[0].x() - 0.10).abs() < 1e-9);
        assert!(hits[0].right() > 0.25 && hits[0].right() < 0.51);
        assert!(document.search("rate next").expect("search").is_empty());
    }

    #[test]
    fn search_returns_occurrences_in_page_order() {
        let document = layout(vec![
            page(2, &[("Revenue", [10.0, 10.0, 24.0, 14.0])]),
            page(1, &[("Revenue", [50.0, 50.0, 64.0, 54.0])]),
        ]);

        let hits = document.search("Revenue").expect("search should succeed");

        assert_eq!(hits.iter().map(|hit| hit.page()).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn spans_include_joined_lines_in_document_casing() {
        let document = layout(vec![page(
            1,
            &[
                ("Acme", [10.0, 10.0, 20.0, 14.0]),
                ("Logistics   CORPORATION", [21.0, 10.0, 65.0, 14.0]),
            ],
        )]);

        let spans = document.spans().expect("spans should enumerate");
        let texts = spans.iter().map(|span| span.text.as_str()).collect::<Vec<_>>();

        assert_eq!(
            texts,
            vec!["Acme", "Logistics CORPORATION", "Acme Logistics CORPORATION"]
        );
        assert_eq!(document.line_count(), 1);
        assert_eq!(
            document
                .search("acme logistics corporation")
                .expect("search should succeed")
                .len(),
            1
        );
    }

    #[test]
    fn page_dimensions_report_missing_pages() {
        let document = layout(vec![page(1, &[])]);

        let dimensions = document.page_dimensions(1).expect("page 1 exists");
        assert_eq!(dimensions.width, 100.0);

        let error = document.page_dimensions(5).expect_err("page 5 is missing");
        assert_eq!(
            error,
            LayoutError::PageOutOfRange {
                page: 5,
                page_count: 1
            }
        );
    }

    #[test]
    fn from_document_rejects_zero_based_pages() {
        let result = DocumentLayout::from_document(LayoutDocument {
            pages: vec![page(0, &[])],
        });
        assert!(matches!(result, Err(LayoutError::InvalidLayout(_))));
    }

    #[test]
    fn layout_document_parses_from_json() {
        let raw = r#"
        {
          "pages": [
            {
              "page": 1,
              "width": 612,
              "height": 792,
              "spans": [{ "text": "Quarterly Report", "bbox": [72, 72, 240, 90] }]
            }
          ]
        }
        "#;

        let document: LayoutDocument = serde_json::from_str(raw).expect("layout json should parse");
        let indexed = DocumentLayout::from_document(document).expect("layout should index");

        assert_eq!(indexed.page_count(), 1);
        assert_eq!(indexed.span_count(), 1);
        assert_eq!(indexed.search("quarterly").expect("search").len(), 1);
    }
}
