use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::{EntityType, StrategyKind};

pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.8;
pub const DEFAULT_PROXIMITY_THRESHOLD: f64 = 0.05;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.1;
pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.3;
pub const DEFAULT_COLOR_KEY: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub fuzzy_threshold: f64,
    /// Union area, as a fraction of the page, under which aggregated components count as clustered.
    pub proximity_threshold: f64,
    pub primary_strategies: HashMap<EntityType, StrategyKind>,
    pub parallel: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        let primary_strategies = [EntityType::Kpi, EntityType::Metric, EntityType::Financial]
            .into_iter()
            .map(|entity_type| (entity_type, StrategyKind::Aggregation))
            .collect();

        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
            primary_strategies,
            parallel: false,
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_unit_range("fuzzy_threshold", self.fuzzy_threshold)?;
        ensure_unit_range("proximity_threshold", self.proximity_threshold)?;
        if let Some(strategy) = self
            .primary_strategies
            .values()
            .find(|strategy| **strategy == StrategyKind::None)
        {
            return Err(ConfigError::UnknownStrategy(strategy.as_str().to_string()));
        }
        Ok(())
    }

    pub fn primary_strategy(&self, entity_type: &EntityType) -> Option<StrategyKind> {
        self.primary_strategies.get(entity_type).copied()
    }
}

/// Entity type -> display color, with a mandatory `default` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorScheme(BTreeMap<String, String>);

impl Default for ColorScheme {
    fn default() -> Self {
        let entries = [
            ("KPI", "#e4572e"),
            ("METRIC", "#f3a712"),
            ("FINANCIAL", "#29335c"),
            ("DATE", "#669bbc"),
            ("ORGANIZATION", "#4c956c"),
            ("PERSON", "#8e7dbe"),
            ("LOCATION", "#2a9d8f"),
            ("PRODUCT", "#d62828"),
            (DEFAULT_COLOR_KEY, "#888888"),
        ];
        Self(
            entries
                .into_iter()
                .map(|(key, color)| (key.to_string(), color.to_string()))
                .collect(),
        )
    }
}

impl ColorScheme {
    pub fn new(entries: BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let scheme = Self(entries);
        scheme.validate()?;
        Ok(scheme)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.0.contains_key(DEFAULT_COLOR_KEY) {
            Ok(())
        } else {
            Err(ConfigError::MissingDefaultColor)
        }
    }

    /// Exact key first, then the upper-cased key, then `default`.
    pub fn color_for(&self, entity_type: &EntityType) -> &str {
        let key = entity_type.as_str();
        self.0
            .get(key)
            .or_else(|| self.0.get(&key.to_ascii_uppercase()))
            .or_else(|| self.0.get(DEFAULT_COLOR_KEY))
            .map(String::as_str)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub confidence_threshold: f64,
    pub overlap_threshold: f64,
    pub merge_overlaps: bool,
    pub colors: ColorScheme,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            merge_overlaps: false,
            colors: ColorScheme::default(),
        }
    }
}

impl OverlayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_unit_range("confidence_threshold", self.confidence_threshold)?;
        ensure_unit_range("overlap_threshold", self.overlap_threshold)?;
        self.colors.validate()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    pub matcher: MatcherConfig,
    pub overlay: OverlayConfig,
}

impl LocatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.matcher.validate()?;
        self.overlay.validate()
    }
}

fn ensure_unit_range(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min: 0.0,
            max: 1.0,
        })
    }
}
