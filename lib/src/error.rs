use crate::models::collection::CollectionId;

/// Error type for the raindump library
///
/// Variants are grouped by how the run reacts to them: terminal errors
/// (`Config`, `Auth`), retryable responses (`RateLimited`, `Server`) that the
/// client consumes attempts for, and plain failures surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Missing credential or unusable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The API rejected the token (HTTP 401)
    #[error("Authentication failed: the API rejected the token (HTTP 401)")]
    Auth,

    /// HTTP 429
    #[error("Rate limited by the API (HTTP 429)")]
    RateLimited,

    /// HTTP 5xx
    #[error("Server error (HTTP {status})")]
    Server { status: u16 },

    /// Any other non-success status
    #[error("Request to {url} failed with HTTP {status}: {body}")]
    Status { status: u16, url: String, body: String },

    /// Bounded retries ran out; wraps the last retryable error
    #[error("Giving up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ExportError>,
    },

    /// Parent references loop back onto themselves
    #[error("Collection {} sits on a parent cycle: {}", .id, format_chain(.chain))]
    GraphCycle {
        id: CollectionId,
        chain: Vec<CollectionId>,
    },

    /// Resolver queried for an id the graph does not contain
    #[error("Collection {0} is not part of the collection graph")]
    UnknownCollection(CollectionId),

    /// Transport-level HTTP failures (DNS, TLS, connection, body read)
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O errors (output files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML config errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Malformed CSV export bodies
    #[error("CSV error: {0}")]
    Csv(String),
}

/// Result type alias using ExportError
pub type Result<T> = std::result::Result<T, ExportError>;

impl ExportError {
    /// Whether the client may spend another attempt on this error
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExportError::RateLimited | ExportError::Server { .. })
    }

    /// Errors that must stop the whole run, even mid-aggregation
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExportError::Auth | ExportError::Config(_))
    }

    /// HTTP status behind this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ExportError::Auth => Some(401),
            ExportError::RateLimited => Some(429),
            ExportError::Server { status } | ExportError::Status { status, .. } => Some(*status),
            ExportError::RetriesExhausted { source, .. } => source.status(),
            ExportError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

fn format_chain(chain: &[CollectionId]) -> String {
    chain
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
