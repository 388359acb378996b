use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("upstream API error {code} for {context}: {message}")]
    Api {
        code: i64,
        message: String,
        context: String,
    },

    #[error("malformed payload for {context}: {reason}")]
    Malformed { context: String, reason: String },

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("{source_name} unavailable: {reason}")]
    SourceUnavailable {
        source_name: &'static str,
        reason: String,
    },
}

impl ScraperError {
    /// Returns `true` when the error means the whole upstream is unusable
    /// rather than one entity's response being bad.
    ///
    /// Source-level: refused connections and DNS failures, HTTP 401/403, and
    /// [`ScraperError::SourceUnavailable`]. Everything else is local to the
    /// request. reqwest flags a connect timeout as both a connect and a
    /// timeout error; it counts as a timeout here.
    #[must_use]
    pub fn is_source_level(&self) -> bool {
        match self {
            ScraperError::Http(e) => e.is_connect() && !e.is_timeout(),
            ScraperError::UnexpectedStatus { status, .. } => matches!(status, 401 | 403),
            ScraperError::SourceUnavailable { .. } => true,
            ScraperError::Deserialize { .. }
            | ScraperError::Api { .. }
            | ScraperError::Malformed { .. }
            | ScraperError::InvalidBaseUrl { .. } => false,
        }
    }
}
