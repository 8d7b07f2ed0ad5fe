/// Failure of the upstream vision call.
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
    #[error("{0}")]
    Request(String),
}

impl VisionError {
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            VisionError::Timeout(e.to_string())
        } else if e.is_connect() {
            VisionError::Connect(e.to_string())
        } else if e.is_decode() {
            VisionError::InvalidResponse(e.to_string())
        } else {
            VisionError::Request(e.to_string())
        }
    }

    /// Short failure category reported to callers as `openai_error: <category>`.
    pub fn category(&self) -> &'static str {
        match self {
            VisionError::Timeout(_) => "APITimeoutError",
            VisionError::Connect(_) => "APIConnectionError",
            VisionError::Status(code) => match code {
                400 => "BadRequestError",
                401 => "AuthenticationError",
                403 => "PermissionDeniedError",
                404 => "NotFoundError",
                409 => "ConflictError",
                422 => "UnprocessableEntityError",
                429 => "RateLimitError",
                500..=599 => "InternalServerError",
                _ => "APIStatusError",
            },
            VisionError::InvalidResponse(_) => "APIResponseValidationError",
            VisionError::Request(_) => "APIError",
        }
    }
}

/// Business-level outcome of a failed check. `Display` is the wire error code.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("no_api_key")]
    NoApiKey,
    #[error("openai_error: {}", .0.category())]
    Upstream(#[from] VisionError),
    #[error("no_number_found")]
    NoNumberFound,
}
