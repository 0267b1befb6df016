//! LLM error types.
//!
//! Errors never cross the gateway boundary; they are classified here so the
//! log line that replaces them says what actually went wrong.

/// Error from an LLM API call.
#[derive(Debug)]
pub struct LlmError {
    /// The kind of error
    pub kind: LlmErrorKind,
    /// HTTP status code, if applicable
    pub status_code: Option<u16>,
    /// Error message
    pub message: String,
}

impl LlmError {
    /// Create an error from a non-success HTTP status and its body.
    pub fn from_status(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            kind: classify_http_status(status_code),
            status_code: Some(status_code),
            message: body.into(),
        }
    }

    /// Create a network error.
    pub fn network_error(message: String) -> Self {
        Self {
            kind: LlmErrorKind::NetworkError,
            status_code: None,
            message,
        }
    }

    /// Create a parse error.
    pub fn parse_error(message: String) -> Self {
        Self {
            kind: LlmErrorKind::ParseError,
            status_code: None,
            message,
        }
    }

    /// Create an error from a reqwest failure, keeping timeout/connect detail.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::network_error(format!("Request timeout: {}", e))
        } else if e.is_connect() {
            Self::network_error(format!("Connection failed: {}", e))
        } else {
            Self::network_error(format!("Request failed: {}", e))
        }
    }
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} (HTTP {}): {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for LlmError {}

/// Classification of LLM errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Rate limited (429)
    RateLimited,
    /// Server error (500, 502, 503, 504)
    ServerError,
    /// Client error (400, 401, 403, 404)
    ClientError,
    /// Network error (connection failed, timeout)
    NetworkError,
    /// Response or stream payload could not be understood
    ParseError,
}

impl std::fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmErrorKind::RateLimited => write!(f, "Rate limited"),
            LlmErrorKind::ServerError => write!(f, "Server error"),
            LlmErrorKind::ClientError => write!(f, "Client error"),
            LlmErrorKind::NetworkError => write!(f, "Network error"),
            LlmErrorKind::ParseError => write!(f, "Parse error"),
        }
    }
}

/// Parse HTTP status code into error kind.
pub fn classify_http_status(status: u16) -> LlmErrorKind {
    match status {
        429 => LlmErrorKind::RateLimited,
        500 | 502 | 503 | 504 => LlmErrorKind::ServerError,
        400..=499 => LlmErrorKind::ClientError,
        _ => LlmErrorKind::ServerError,
    }
}
