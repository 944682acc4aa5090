use thiserror::Error;

/// Failure of a single upstream fetch.
///
/// Never retried inside this crate; retry policy belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("upstream request to {url} timed out")]
    UpstreamTimeout { url: String },

    #[error("upstream request to {url} failed with status {status}")]
    UpstreamHttp { url: String, status: u16 },

    #[error("upstream request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("malformed upstream payload for {subject}: {reason}")]
    MalformedUpstreamPayload { subject: String, reason: String },
}

impl FetchError {
    pub fn malformed(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        FetchError::MalformedUpstreamPayload {
            subject: subject.into(),
            reason: reason.into(),
        }
    }
}

/// Cache backend failure. Downgraded to a miss (reads) or dropped (writes).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("cache entry could not be encoded or decoded: {0}")]
    Codec(String),
}

/// Top-level error carrying the process exit code.
///
/// - 2: configuration or usage problem
/// - 4: upstream data problem
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        AppError::new(4, err.to_string())
    }
}
