use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid bounds: {0}")]
    InvalidBounds(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    #[error("text layout unavailable: {0}")]
    Unavailable(String),

    #[error("text layout call timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: usize },

    #[error("invalid layout: {0}")]
    InvalidLayout(String),
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("batch failed while matching entity '{entity}'")]
    BatchFailure {
        entity: String,
        #[source]
        source: LayoutError,
    },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("color scheme is missing the required 'default' entry")]
    MissingDefaultColor,

    #[error("unknown match strategy '{0}'")]
    UnknownStrategy(String),
}
