use thiserror::Error;

/// Configuration validation failures. Always fatal: they are detected
/// before the watch loop starts and abort startup with a nonzero exit.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid GEO_LOCATION '{code}'. Must be one of: {known:?}")]
    UnknownGeoLocation {
        code: String,
        known: Vec<&'static str>,
    },

    #[error("Invalid {var} value '{value}': {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Outbound traffic-management API failures, as seen after the retry
/// envelope has done its work.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transient failures (timeouts, 429/5xx) that survived every
    /// retry attempt. Carries the last status and body for logging.
    #[error("Request failed after {attempts} attempts (last status: {status:?}): {body}")]
    RetryExhausted {
        attempts: u32,
        status: Option<u16>,
        body: String,
    },

    /// Non-retryable 4xx response; failed immediately.
    #[error("API rejected request with status {status}: {body}")]
    Permanent { status: u16, body: String },

    /// HTTP 2xx but the response envelope reported `success: false`.
    #[error("API reported failure: {messages}")]
    Unsuccessful { messages: String },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A watch stream failure that cannot be recovered by reconnecting:
/// configuration-level rejections (bad selector syntax, bad
/// credentials). Everything else stays inside the reconnect cycle.
#[derive(Error, Debug)]
#[error("Watch stream cannot recover: {0}")]
pub struct WatchError(#[from] pub kube::Error);
