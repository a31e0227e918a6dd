use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

#[cfg(test)]
mod tests;

/// Rounding slack allowed on the right/bottom page edge.
pub const BOUNDS_EPSILON: f64 = 1e-6;

/// A region expressed as fractions of its page, with 1-based page numbers.
///
/// Fields are private so every instance has passed [`NormalizedBounds::new`];
/// deserialization goes through the same validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoundsFields")]
pub struct NormalizedBounds {
    page: u32,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

#[derive(Deserialize)]
struct BoundsFields {
    page: u32,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl TryFrom<BoundsFields> for NormalizedBounds {
    type Error = GeometryError;

    fn try_from(fields: BoundsFields) -> Result<Self, Self::Error> {
        Self::new(fields.page, fields.x, fields.y, fields.width, fields.height)
    }
}

impl NormalizedBounds {
    pub fn new(page: u32, x: f64, y: f64, width: f64, height: f64) -> Result<Self, GeometryError> {
        for (name, value) in [("x", x), ("y", y), ("width", width), ("height", height)] {
            if !value.is_finite() {
                return Err(GeometryError::InvalidBounds(format!(
                    "{name} is not finite: {value}"
                )));
            }
        }

        if width < 0.0 || height < 0.0 {
            return Err(GeometryError::InvalidBounds(format!(
                "negative size: width={width} height={height}"
            )));
        }
        if x < -BOUNDS_EPSILON || y < -BOUNDS_EPSILON {
            return Err(GeometryError::InvalidBounds(format!(
                "origin outside page: x={x} y={y}"
            )));
        }
        if x + width > 1.0 + BOUNDS_EPSILON || y + height > 1.0 + BOUNDS_EPSILON {
            return Err(GeometryError::InvalidBounds(format!(
                "region exceeds page: right={} bottom={}",
                x + width,
                y + height
            )));
        }

        Ok(Self {
            page,
            x,
            y,
            width,
            height,
        })
    }

    /// Normalizes a `[x0, y0, x1, y1]` rectangle given in page units.
    ///
    /// Coordinates spilling past the page edge are clamped, which happens with
    /// glyph boxes that overhang the media box.
    pub fn from_page_rect(
        page: u32,
        rect: [f64; 4],
        page_width: f64,
        page_height: f64,
    ) -> Result<Self, GeometryError> {
        let positive = |value: f64| value.is_finite() && value > 0.0;
        if !(positive(page_width) && positive(page_height)) {
            return Err(GeometryError::InvalidBounds(format!(
                "page size must be positive: {page_width}x{page_height}"
            )));
        }

        let [x0, y0, x1, y1] = rect;
        let left = (x0.min(x1) / page_width).clamp(0.0, 1.0);
        let right = (x0.max(x1) / page_width).clamp(0.0, 1.0);
        let top = (y0.min(y1) / page_height).clamp(0.0, 1.0);
        let bottom = (y0.max(y1) / page_height).clamp(0.0, 1.0);

        Self::new(page, left, top, right - left, bottom - top)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Area as a fraction of the page area.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    fn union(&self, other: &NormalizedBounds) -> NormalizedBounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        NormalizedBounds {
            page: self.page,
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DimensionFields")]
pub struct TargetDimensions {
    width: f64,
    height: f64,
    scale: f64,
}

#[derive(Deserialize)]
struct DimensionFields {
    width: f64,
    height: f64,
    #[serde(default = "default_scale")]
    scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl TryFrom<DimensionFields> for TargetDimensions {
    type Error = GeometryError;

    fn try_from(fields: DimensionFields) -> Result<Self, Self::Error> {
        Self::new(fields.width, fields.height, fields.scale)
    }
}

impl TargetDimensions {
    pub fn new(width: f64, height: f64, scale: f64) -> Result<Self, GeometryError> {
        for (name, value) in [("width", width), ("height", height), ("scale", scale)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GeometryError::Configuration(format!(
                    "target {name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(Self {
            width,
            height,
            scale,
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    fn horizontal_factor(&self) -> f64 {
        self.width * self.scale
    }

    fn vertical_factor(&self) -> f64 {
        self.height * self.scale
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderedBounds {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RenderedBounds {
    /// Inverse of [`convert`] for the same dimensions.
    pub fn to_normalized(
        &self,
        dimensions: &TargetDimensions,
    ) -> Result<NormalizedBounds, GeometryError> {
        let horizontal = dimensions.horizontal_factor();
        let vertical = dimensions.vertical_factor();
        NormalizedBounds::new(
            self.page,
            self.x / horizontal,
            self.y / vertical,
            self.width / horizontal,
            self.height / vertical,
        )
    }
}

/// One surviving box of [`merge_clusters`] and the input indices folded into it.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedCluster {
    pub bounds: NormalizedBounds,
    pub members: Vec<usize>,
}

/// Intersection-over-union of two regions; always 0 across pages.
pub fn overlap(a: &NormalizedBounds, b: &NormalizedBounds) -> f64 {
    if a.page != b.page {
        return 0.0;
    }

    if a.area() <= 0.0 || b.area() <= 0.0 {
        return if a == b { 1.0 } else { 0.0 };
    }

    let intersection_width = (a.right().min(b.right()) - a.x.max(b.x)).max(0.0);
    let intersection_height = (a.bottom().min(b.bottom()) - a.y.max(b.y)).max(0.0);
    let intersection = intersection_width * intersection_height;
    let union = a.area() + b.area() - intersection;

    if union > 0.0 {
        (intersection / union).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Minimal box covering every input, on the page of the first input.
///
/// Page grouping is the caller's job.
pub fn merge(bounds: &[NormalizedBounds]) -> Result<NormalizedBounds, GeometryError> {
    let (first, rest) = bounds
        .split_first()
        .ok_or_else(|| {
            GeometryError::InvalidInput("cannot merge an empty bounds list".to_string())
        })?;

    Ok(rest.iter().fold(*first, |merged, next| merged.union(next)))
}

pub fn convert(
    bounds: &NormalizedBounds,
    dimensions: Option<&TargetDimensions>,
) -> Result<RenderedBounds, GeometryError> {
    let dimensions = dimensions.ok_or_else(|| {
        GeometryError::Configuration("target dimensions are not set".to_string())
    })?;

    let horizontal = dimensions.horizontal_factor();
    let vertical = dimensions.vertical_factor();

    Ok(RenderedBounds {
        page: bounds.page,
        x: bounds.x * horizontal,
        y: bounds.y * vertical,
        width: bounds.width * horizontal,
        height: bounds.height * vertical,
    })
}

pub fn group_by_page(bounds: &[NormalizedBounds]) -> BTreeMap<u32, Vec<NormalizedBounds>> {
    let mut groups = BTreeMap::<u32, Vec<NormalizedBounds>>::new();
    for value in bounds {
        groups.entry(value.page).or_default().push(*value);
    }
    groups
}

/// Merges same-page boxes whose overlap reaches `threshold` until no such pair is left.
pub fn detect_and_merge_overlaps(
    bounds: &[NormalizedBounds],
    threshold: f64,
) -> Vec<NormalizedBounds> {
    merge_clusters(bounds, threshold)
        .into_iter()
        .map(|cluster| cluster.bounds)
        .collect()
}

/// Fixed-point overlap merging that also reports which inputs ended up in each box.
///
/// A merged box keeps the position of its earliest member, so the output follows
/// input order. Every merge removes one box, which bounds the number of passes.
pub fn merge_clusters(bounds: &[NormalizedBounds], threshold: f64) -> Vec<MergedCluster> {
    let mut clusters = bounds
        .iter()
        .enumerate()
        .map(|(index, value)| MergedCluster {
            bounds: *value,
            members: vec![index],
        })
        .collect::<Vec<MergedCluster>>();

    while let Some((keep, absorb)) = find_mergeable_pair(&clusters, threshold) {
        let absorbed = clusters.remove(absorb);
        let target = &mut clusters[keep];
        target.bounds = target.bounds.union(&absorbed.bounds);
        target.members.extend(absorbed.members);
        target.members.sort_unstable();
    }

    clusters
}

fn find_mergeable_pair(clusters: &[MergedCluster], threshold: f64) -> Option<(usize, usize)> {
    for (left_index, left) in clusters.iter().enumerate() {
        for (offset, right) in clusters[left_index + 1..].iter().enumerate() {
            let same_page = left.bounds.page == right.bounds.page;
            if same_page && overlap(&left.bounds, &right.bounds) >= threshold {
                return Some((left_index, left_index + 1 + offset));
            }
        }
    }
    None
}
