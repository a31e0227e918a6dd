use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::NormalizedBounds;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityType {
    Kpi,
    Metric,
    Financial,
    Date,
    Organization,
    Person,
    Location,
    Product,
    Other(String),
}

impl EntityType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Kpi => "KPI",
            Self::Metric => "METRIC",
            Self::Financial => "FINANCIAL",
            Self::Date => "DATE",
            Self::Organization => "ORGANIZATION",
            Self::Person => "PERSON",
            Self::Location => "LOCATION",
            Self::Product => "PRODUCT",
            Self::Other(value) => value.as_str(),
        }
    }
}

impl From<&str> for EntityType {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "KPI" => Self::Kpi,
            "METRIC" => Self::Metric,
            "FINANCIAL" => Self::Financial,
            "DATE" => Self::Date,
            "ORGANIZATION" | "ORG" => Self::Organization,
            "PERSON" => Self::Person,
            "LOCATION" => Self::Location,
            "PRODUCT" => Self::Product,
            _ => Self::Other(value.to_string()),
        }
    }
}

impl From<String> for EntityType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<EntityType> for String {
    fn from(value: EntityType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(alias = "name")]
    pub entity_name: String,
    #[serde(alias = "type")]
    pub entity_type: EntityType,
}

impl Entity {
    pub fn new(name: impl Into<String>, entity_type: impl Into<EntityType>) -> Self {
        Self {
            entity_name: name.into(),
            entity_type: entity_type.into(),
        }
    }
}

/// Entity list as produced upstream: a bare array or an object with an `entities` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EntityInput {
    List(Vec<Entity>),
    Document {
        #[serde(default)]
        pdf_file: Option<String>,
        entities: Vec<Entity>,
    },
}

impl EntityInput {
    pub fn into_entities(self) -> Vec<Entity> {
        match self {
            Self::List(entities) => entities,
            Self::Document { entities, .. } => entities,
        }
    }

    pub fn source_document(&self) -> Option<&str> {
        match self {
            Self::List(_) => None,
            Self::Document { pdf_file, .. } => pdf_file.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Exact,
    Partial,
    Aggregation,
    Fuzzy,
    None,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Partial => "partial",
            Self::Aggregation => "aggregation",
            Self::Fuzzy => "fuzzy",
            Self::None => "none",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "partial" => Ok(Self::Partial),
            "aggregation" => Ok(Self::Aggregation),
            "fuzzy" => Ok(Self::Fuzzy),
            "none" => Ok(Self::None),
            _ => Err(ConfigError::UnknownStrategy(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentMatch {
    pub text: String,
    pub bounds: Option<NormalizedBounds>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub entity_name: String,
    pub entity_type: EntityType,
    pub match_strategy: StrategyKind,
    pub confidence: f64,
    pub bounds: Option<NormalizedBounds>,
    pub component_matches: Vec<ComponentMatch>,
}

impl MatchRecord {
    pub fn unmatched(entity: &Entity) -> Self {
        Self {
            entity_name: entity.entity_name.clone(),
            entity_type: entity.entity_type.clone(),
            match_strategy: StrategyKind::None,
            confidence: 0.0,
            bounds: None,
            component_matches: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_entities: usize,
    pub matched: usize,
    pub partial_matched: usize,
    pub unmatched: usize,
    pub strategies_used: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub matched_entities: Vec<MatchRecord>,
    pub statistics: Statistics,
}
