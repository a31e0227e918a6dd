use crate::error::LayoutError;
use crate::geometry::{self, NormalizedBounds};
use crate::layout::{TextLayoutProvider, TextSpan};
use crate::model::{ComponentMatch, Entity, StrategyKind};

use super::cache::BoundsCache;
use super::similarity::similarity;
use super::splitter::is_value_token;

const PARTIAL_BASE_CONFIDENCE: f64 = 0.7;
const PARTIAL_VALUE_BONUS: f64 = 0.2;
const PARTIAL_LABEL_BONUS: f64 = 0.1;
const AGGREGATION_SAME_PAGE_BONUS: f64 = 0.1;
const AGGREGATION_PROXIMITY_BONUS: f64 = 0.1;

/// Shared inputs for one strategy attempt.
#[derive(Clone, Copy)]
pub struct MatchContext<'a> {
    pub provider: &'a dyn TextLayoutProvider,
    pub cache: &'a BoundsCache,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyMatch {
    pub strategy: StrategyKind,
    pub confidence: f64,
    pub bounds: NormalizedBounds,
    pub component_matches: Vec<ComponentMatch>,
}

/// The closed set of matching strategies, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    Exact,
    Partial,
    Aggregation { proximity_threshold: f64 },
    Fuzzy { threshold: f64 },
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Exact => StrategyKind::Exact,
            Self::Partial => StrategyKind::Partial,
            Self::Aggregation { .. } => StrategyKind::Aggregation,
            Self::Fuzzy { .. } => StrategyKind::Fuzzy,
        }
    }

    /// `Ok(None)` means this strategy could not place the entity.
    pub fn attempt(
        &self,
        entity: &Entity,
        components: &[String],
        context: MatchContext<'_>,
    ) -> Result<Option<StrategyMatch>, LayoutError> {
        match *self {
            Self::Exact => match_exact(entity, context),
            Self::Partial => match_partial(components, context),
            Self::Aggregation {
                proximity_threshold,
            } => match_aggregation(components, proximity_threshold, context),
            Self::Fuzzy { threshold } => match_fuzzy(entity, threshold, context),
        }
    }
}

pub(crate) fn clamp_confidence(value: f64) -> f64 {
    debug_assert!(value.is_finite(), "confidence must be finite, got {value}");
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn match_exact(
    entity: &Entity,
    context: MatchContext<'_>,
) -> Result<Option<StrategyMatch>, LayoutError> {
    let Some(bounds) = context
        .cache
        .find_first(context.provider, &entity.entity_name)?
    else {
        return Ok(None);
    };

    Ok(Some(StrategyMatch {
        strategy: StrategyKind::Exact,
        confidence: 1.0,
        bounds,
        component_matches: vec![ComponentMatch {
            text: entity.entity_name.clone(),
            bounds: Some(bounds),
        }],
    }))
}

fn match_partial(
    components: &[String],
    context: MatchContext<'_>,
) -> Result<Option<StrategyMatch>, LayoutError> {
    for component in components {
        let Some(bounds) = context.cache.find_first(context.provider, component)? else {
            continue;
        };

        let bonus = if is_value_token(component) {
            PARTIAL_VALUE_BONUS
        } else {
            PARTIAL_LABEL_BONUS
        };

        return Ok(Some(StrategyMatch {
            strategy: StrategyKind::Partial,
            confidence: clamp_confidence(PARTIAL_BASE_CONFIDENCE + bonus),
            bounds,
            component_matches: vec![ComponentMatch {
                text: component.clone(),
                bounds: Some(bounds),
            }],
        }));
    }

    Ok(None)
}

fn match_aggregation(
    components: &[String],
    proximity_threshold: f64,
    context: MatchContext<'_>,
) -> Result<Option<StrategyMatch>, LayoutError> {
    if components.is_empty() {
        return Ok(None);
    }

    let mut component_matches = Vec::<ComponentMatch>::with_capacity(components.len());
    for component in components {
        let bounds = context.cache.find_first(context.provider, component)?;
        component_matches.push(ComponentMatch {
            text: component.clone(),
            bounds,
        });
    }

    let found = component_matches
        .iter()
        .filter_map(|component| component.bounds)
        .collect::<Vec<NormalizedBounds>>();
    let Some(page) = majority_page(&found) else {
        return Ok(None);
    };

    let page_groups = geometry::group_by_page(&found);
    let same_page = page_groups.len() == 1;
    let Some(on_page) = page_groups.get(&page) else {
        return Ok(None);
    };
    let bounds = match geometry::merge(on_page) {
        Ok(bounds) => bounds,
        Err(_) => return Ok(None),
    };

    let mut confidence = found.len() as f64 / components.len() as f64;
    if same_page {
        confidence += AGGREGATION_SAME_PAGE_BONUS;
    }
    if bounds.area() < proximity_threshold {
        confidence += AGGREGATION_PROXIMITY_BONUS;
    }

    Ok(Some(StrategyMatch {
        strategy: StrategyKind::Aggregation,
        confidence: clamp_confidence(confidence),
        bounds,
        component_matches,
    }))
}

/// Page holding the most located components; ties go to the page found first.
fn majority_page(found: &[NormalizedBounds]) -> Option<u32> {
    let mut counts = Vec::<(u32, usize)>::new();
    for bounds in found {
        match counts.iter_mut().find(|(page, _)| *page == bounds.page()) {
            Some((_, count)) => *count += 1,
            None => counts.push((bounds.page(), 1)),
        }
    }

    let mut best: Option<(u32, usize)> = None;
    for (page, count) in counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((page, count));
        }
    }
    best.map(|(page, _)| page)
}

fn match_fuzzy(
    entity: &Entity,
    threshold: f64,
    context: MatchContext<'_>,
) -> Result<Option<StrategyMatch>, LayoutError> {
    let mut best: Option<(f64, TextSpan)> = None;

    for span in context.provider.spans()? {
        let score = similarity(&entity.entity_name, &span.text);
        if score <= threshold {
            continue;
        }
        if best
            .as_ref()
            .is_none_or(|(best_score, _)| score > *best_score)
        {
            best = Some((score, span));
        }
    }

    Ok(best.map(|(score, span)| StrategyMatch {
        strategy: StrategyKind::Fuzzy,
        confidence: clamp_confidence(score),
        bounds: span.bounds,
        component_matches: vec![ComponentMatch {
            text: span.text,
            bounds: Some(span.bounds),
        }],
    }))
}
