use async_openai::error::OpenAIError;
use thiserror::Error;

/// Custom result type alias for the service
pub type Result<T> = std::result::Result<T, ReviewError>;

/// Errors that can occur while fetching a repository or producing a review
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Missing or incorrect API key on a protected endpoint
    #[error("Not authenticated")]
    Unauthorized,

    /// The request body could not be read as a review request
    #[error("{message}")]
    InvalidRequest {
        /// Status chosen by the body extractor (400, 415 or 422)
        status: u16,
        /// Extractor message
        message: String,
    },

    /// The repository URL does not name an owner and a repository
    #[error("Invalid repository URL: {0}")]
    InvalidRepositoryUrl(String),

    /// The repository tree lists more entries than allowed
    #[error("Exceeded the maximum number of entries: {limit}")]
    TooManyEntries {
        /// Configured entry limit
        limit: usize,
    },

    /// The blobs in the repository tree add up to more bytes than allowed
    #[error("Exceeded the maximum size limit: {} MB", limit_bytes / (1024 * 1024))]
    RepositoryTooLarge {
        /// Configured byte limit
        limit_bytes: u64,
    },

    /// GitHub answered with a non-success status
    #[error("{context}: {body}")]
    GitHubApi {
        /// What was being retrieved
        context: String,
        /// Upstream HTTP status code
        status: u16,
        /// Upstream response body
        body: String,
    },

    /// Transport failure talking to GitHub
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// File content could not be decoded as base64 UTF-8 text
    #[error("Failed to decode content of {path}: {reason}")]
    Decode {
        /// Path of the offending file
        path: String,
        /// Decoder message
        reason: String,
    },

    /// The tree listed the same blob path more than once
    #[error("Duplicate path in repository tree: {0}")]
    DuplicatePath(String),

    /// The completion API returned an error
    #[error("OpenAI error: {0}")]
    OpenAI(#[from] OpenAIError),

    /// The completion API answered without the expected fields
    #[error("Unexpected response format from OpenAI API: {0}")]
    UnexpectedResponse(String),

    /// Any other failure while requesting a review
    #[error("An unexpected error occurred: {0}")]
    Review(String),

    /// Cache store errors
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// JSON parsing/serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReviewError {
    /// HTTP status equivalent of this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized => 403,
            Self::InvalidRequest { status, .. } => *status,
            Self::TooManyEntries { .. } | Self::RepositoryTooLarge { .. } => 403,
            Self::GitHubApi { status, .. } if (400..600).contains(status) => *status,
            Self::GitHubApi { .. } | Self::Network(_) => 502,
            Self::InvalidRepositoryUrl(_) => 400,
            Self::Decode { .. }
            | Self::DuplicatePath(_)
            | Self::OpenAI(_)
            | Self::UnexpectedResponse(_)
            | Self::Review(_)
            | Self::Cache(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::Io(_) => 500,
        }
    }

    /// Name of the error family, used in logs
    pub fn category(&self) -> &'static str {
        match self {
            Self::Unauthorized => "AuthError",
            Self::InvalidRequest { .. } => "ValidationError",
            Self::InvalidRepositoryUrl(_)
            | Self::TooManyEntries { .. }
            | Self::RepositoryTooLarge { .. }
            | Self::GitHubApi { .. }
            | Self::Network(_)
            | Self::DuplicatePath(_) => "RetrievalError",
            Self::Decode { .. } => "DecodeError",
            Self::OpenAI(_) | Self::UnexpectedResponse(_) | Self::Review(_) => "ReviewServiceError",
            Self::Cache(_) | Self::Json(_) | Self::Config(_) | Self::Io(_) => "InternalError",
        }
    }

    /// Builds a decode error for `path`
    pub fn decode(path: &str, reason: impl ToString) -> Self {
        Self::Decode {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}
