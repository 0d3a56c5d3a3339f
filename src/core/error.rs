use thiserror::Error;

/// Local input problems caught before any remote call is issued.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field '{0}' is required")]
    Required(&'static str),

    #[error("Field '{field}' is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Remote store unreachable: {0}")]
    Unreachable(String),

    #[error("Remote store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("No row in '{collection}' matches {filter}")]
    NotFound { collection: String, filter: String },

    #[error("Malformed remote payload: {0}")]
    Decode(String),

    #[error("Not signed in")]
    Unauthenticated,

    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(String),
}

impl StoreError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(collection: &str, filter: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            filter: filter.into(),
        }
    }

    /// True for failures produced by the remote side (network, permission,
    /// rejected payload). Local validation and config problems return false.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Unreachable(_)
                | Self::Rejected { .. }
                | Self::NotFound { .. }
                | Self::Decode(_)
                | Self::InvalidCredentials
        )
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        match err.status() {
            Some(status) => Self::rejected(status.as_u16(), err.to_string()),
            None => Self::Unreachable(err.to_string()),
        }
    }
}
