use super::*;

fn bounds(page: u32, x: f64, y: f64, width: f64, height: f64) -> NormalizedBounds {
    NormalizedBounds::new(page, x, y, width, height).expect("fixture bounds should be valid")
}

fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} (+/- {tolerance}), got {actual}"
    );
}

fn assert_bounds_close(actual: &NormalizedBounds, expected: &NormalizedBounds) {
    assert_eq!(actual.page(), expected.page());
    assert_close(actual.x(), expected.x(), 1e-9);
    assert_close(actual.y(), expected.y(), 1e-9);
    assert_close(actual.width(), expected.width(), 1e-9);
    assert_close(actual.height(), expected.height(), 1e-9);
}

#[test]
fn new_rejects_regions_outside_the_page() {
    assert!(NormalizedBounds::new(1, 0.9, 0.1, 0.2, 0.1).is_err());
    assert!(NormalizedBounds::new(1, 0.1, 0.1, -0.1, 0.1).is_err());
    assert!(NormalizedBounds::new(1, f64::NAN, 0.1, 0.1, 0.1).is_err());
    assert!(NormalizedBounds::new(1, 0.5, 0.5, 0.5 + BOUNDS_EPSILON / 2.0, 0.5).is_ok());
}

#[test]
fn deserialization_validates_bounds() {
    let valid: NormalizedBounds =
        serde_json::from_str(r#"{"page":2,"x":0.1,"y":0.2,"width":0.3,"height":0.1}"#)
            .expect("valid bounds should deserialize");
    assert_eq!(valid.page(), 2);

    let invalid = serde_json::from_str::<NormalizedBounds>(
        r#"{"page":2,"x":0.9,"y":0.2,"width":0.3,"height":0.1}"#,
    );
    assert!(invalid.is_err());
}

#[test]
fn from_page_rect_normalizes_and_clamps() {
    let normalized = NormalizedBounds::from_page_rect(3, [61.2, 79.2, 700.0, 158.4], 612.0, 792.0)
        .expect("rect should normalize");

    assert_eq!(normalized.page(), 3);
    assert_close(normalized.x(), 0.1, 1e-9);
    assert_close(normalized.y(), 0.1, 1e-9);
    assert_close(normalized.right(), 1.0, 1e-9);
    assert_close(normalized.height(), 0.1, 1e-9);
}

#[test]
fn overlap_is_symmetric_and_reflexive() {
    let a = bounds(1, 0.1, 0.1, 0.4, 0.2);
    let b = bounds(1, 0.3, 0.15, 0.4, 0.2);

    assert_close(overlap(&a, &b), overlap(&b, &a), 1e-12);
    assert_close(overlap(&a, &a), 1.0, 1e-12);

    // intersection 0.2 x 0.15 = 0.03, union 0.08 + 0.08 - 0.03 = 0.13
    assert_close(overlap(&a, &b), 0.03 / 0.13, 1e-9);
}

#[test]
fn overlap_is_zero_across_pages() {
    let a = bounds(1, 0.1, 0.1, 0.4, 0.2);
    let b = bounds(2, 0.1, 0.1, 0.4, 0.2);
    assert_eq!(overlap(&a, &b), 0.0);
}

#[test]
fn overlap_handles_degenerate_boxes() {
    let point = bounds(1, 0.5, 0.5, 0.0, 0.0);
    let same_point = bounds(1, 0.5, 0.5, 0.0, 0.0);
    let line = bounds(1, 0.5, 0.5, 0.2, 0.0);
    let covering = bounds(1, 0.4, 0.4, 0.2, 0.2);

    assert_eq!(overlap(&point, &same_point), 1.0);
    assert_eq!(overlap(&point, &line), 0.0);
    assert_eq!(overlap(&point, &covering), 0.0);
}

#[test]
fn merge_rejects_empty_input() {
    let error = merge(&[]).expect_err("empty merge should fail");
    assert!(matches!(error, GeometryError::InvalidInput(_)));
}

#[test]
fn merge_is_order_independent() {
    let a = bounds(1, 0.1, 0.2, 0.1, 0.05);
    let b = bounds(1, 0.5, 0.1, 0.2, 0.05);
    let c = bounds(1, 0.3, 0.6, 0.05, 0.2);

    let reference = merge(&[a, b, c]).expect("merge should succeed");
    for order in [[a, c, b], [b, a, c], [b, c, a], [c, a, b], [c, b, a]] {
        let merged = merge(&order).expect("merge should succeed");
        assert_bounds_close(&merged, &reference);
    }

    assert_close(reference.x(), 0.1, 1e-9);
    assert_close(reference.y(), 0.1, 1e-9);
    assert_close(reference.right(), 0.7, 1e-9);
    assert_close(reference.bottom(), 0.8, 1e-9);
}

#[test]
fn merge_keeps_page_of_first_element() {
    let merged = merge(&[bounds(4, 0.1, 0.1, 0.1, 0.1), bounds(2, 0.5, 0.5, 0.1, 0.1)])
        .expect("merge should succeed");
    assert_eq!(merged.page(), 4);
}

#[test]
fn convert_scales_to_target_space() {
    let dimensions = TargetDimensions::new(612.0, 792.0, 1.5).expect("dimensions should be valid");
    let normalized = bounds(2, 0.1, 0.2, 0.15, 0.03);

    let rendered = convert(&normalized, Some(&dimensions)).expect("conversion should succeed");

    assert_eq!(rendered.page, 2);
    assert_close(rendered.x, 91.8, 0.01);
    assert_close(rendered.y, 237.6, 0.01);
    assert_close(rendered.width, 137.7, 0.01);
    assert_close(rendered.height, 35.64, 0.01);
}

#[test]
fn convert_requires_dimensions() {
    let error = convert(&bounds(1, 0.1, 0.1, 0.1, 0.1), None).expect_err("missing dimensions");
    assert!(matches!(error, GeometryError::Configuration(_)));
}

#[test]
fn convert_round_trips_through_inverse() {
    let dimensions =
        TargetDimensions::new(1024.0, 768.0, 0.75).expect("dimensions should be valid");
    for source in [
        bounds(1, 0.0, 0.0, 1.0, 1.0),
        bounds(3, 0.123, 0.456, 0.2, 0.0125),
        bounds(7, 0.9, 0.95, 0.1, 0.05),
    ] {
        let rendered = convert(&source, Some(&dimensions)).expect("conversion should succeed");
        let restored = rendered
            .to_normalized(&dimensions)
            .expect("inverse conversion should succeed");
        assert_bounds_close(&restored, &source);
    }
}

#[test]
fn target_dimensions_reject_non_positive_values() {
    assert!(TargetDimensions::new(0.0, 792.0, 1.0).is_err());
    assert!(TargetDimensions::new(612.0, 792.0, -1.0).is_err());
    assert!(TargetDimensions::new(612.0, f64::INFINITY, 1.0).is_err());

    let parsed: TargetDimensions = serde_json::from_str(r#"{"width":612,"height":792}"#)
        .expect("scale should default");
    assert_eq!(parsed.scale(), 1.0);
}

#[test]
fn group_by_page_is_stable_within_pages() {
    let first = bounds(2, 0.1, 0.1, 0.1, 0.1);
    let second = bounds(1, 0.2, 0.2, 0.1, 0.1);
    let third = bounds(2, 0.3, 0.3, 0.1, 0.1);

    let groups = group_by_page(&[first, second, third]);

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[&1], vec![second]);
    assert_eq!(groups[&2], vec![first, third]);
}

#[test]
fn detect_and_merge_overlaps_merges_chains_to_fixed_point() {
    let a = bounds(1, 0.10, 0.10, 0.20, 0.10);
    let b = bounds(1, 0.12, 0.10, 0.20, 0.10);
    let lone = bounds(1, 0.70, 0.70, 0.10, 0.10);
    let c = bounds(1, 0.14, 0.10, 0.20, 0.10);
    let other_page = bounds(2, 0.10, 0.10, 0.20, 0.10);

    let merged = detect_and_merge_overlaps(&[a, b, lone, c, other_page], 0.3);

    assert_eq!(merged.len(), 3);
    assert_close(merged[0].x(), 0.10, 1e-9);
    assert_close(merged[0].right(), 0.34, 1e-9);
    assert_eq!(merged[1], lone);
    assert_eq!(merged[2], other_page);
}

#[test]
fn detect_and_merge_overlaps_is_idempotent() {
    let input = [
        bounds(1, 0.10, 0.10, 0.20, 0.10),
        bounds(1, 0.15, 0.12, 0.20, 0.10),
        bounds(1, 0.50, 0.50, 0.10, 0.10),
        bounds(1, 0.52, 0.52, 0.10, 0.10),
        bounds(2, 0.10, 0.10, 0.20, 0.10),
        bounds(2, 0.11, 0.10, 0.20, 0.10),
    ];

    let once = detect_and_merge_overlaps(&input, 0.3);
    let twice = detect_and_merge_overlaps(&once, 0.3);

    assert_eq!(once, twice);
    for (index, left) in once.iter().enumerate() {
        for right in &once[index + 1..] {
            assert!(overlap(left, right) < 0.3);
        }
    }
}

#[test]
fn merge_clusters_reports_members_in_input_order() {
    let a = bounds(1, 0.10, 0.10, 0.20, 0.10);
    let lone = bounds(1, 0.70, 0.70, 0.10, 0.10);
    let b = bounds(1, 0.11, 0.10, 0.20, 0.10);

    let clusters = merge_clusters(&[a, lone, b], 0.5);

    assert_eq!(clusters.len(), 2);
    assert_eq!(clusters[0].members, vec![0, 2]);
    assert_eq!(clusters[1].members, vec![1]);
}
