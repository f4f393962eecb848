use std::fmt;
use thiserror::Error;

use domain::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorCode {
    InvalidEmail,
    WrongPassword,
    InvalidCredentials,
    UserNotFound,
    UserDisabled,
    EmailAlreadyInUse,
    WeakPassword,
    MissingCredentials,
    TooManyRequests,
    SessionExpired,
    Other(String),
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthErrorCode::InvalidEmail => f.write_str("invalid_email"),
            AuthErrorCode::WrongPassword => f.write_str("wrong_password"),
            AuthErrorCode::InvalidCredentials => f.write_str("invalid_credentials"),
            AuthErrorCode::UserNotFound => f.write_str("user_not_found"),
            AuthErrorCode::UserDisabled => f.write_str("user_disabled"),
            AuthErrorCode::EmailAlreadyInUse => f.write_str("email_already_in_use"),
            AuthErrorCode::WeakPassword => f.write_str("weak_password"),
            AuthErrorCode::MissingCredentials => f.write_str("missing_credentials"),
            AuthErrorCode::TooManyRequests => f.write_str("too_many_requests"),
            AuthErrorCode::SessionExpired => f.write_str("session_expired"),
            AuthErrorCode::Other(code) => write!(f, "other({code})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileStoreCode {
    NotFound,
    PermissionDenied,
    Unauthenticated,
    Unavailable,
    DeadlineExceeded,
    ResourceExhausted,
    Internal,
    Other(String),
}

impl ProfileStoreCode {
    pub fn from_status(status: &str) -> Self {
        match status {
            "NOT_FOUND" => ProfileStoreCode::NotFound,
            "PERMISSION_DENIED" => ProfileStoreCode::PermissionDenied,
            "UNAUTHENTICATED" => ProfileStoreCode::Unauthenticated,
            "UNAVAILABLE" => ProfileStoreCode::Unavailable,
            "DEADLINE_EXCEEDED" => ProfileStoreCode::DeadlineExceeded,
            "RESOURCE_EXHAUSTED" => ProfileStoreCode::ResourceExhausted,
            "INTERNAL" => ProfileStoreCode::Internal,
            other => ProfileStoreCode::Other(other.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{message}")]
    Auth { code: AuthErrorCode, message: String },

    #[error("User profile not found in database.")]
    ProfileNotFound,

    #[error("Profile store error: {message}")]
    ProfileStore {
        code: ProfileStoreCode,
        message: String,
    },

    #[error("User not signed in")]
    NotSignedIn,

    #[error("Cannot update profile for a different user")]
    UserMismatch,

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("{message}")]
    Unsupported { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn auth(code: AuthErrorCode, message: impl Into<String>) -> Self {
        AppError::Auth {
            code,
            message: message.into(),
        }
    }

    pub fn auth_code(&self) -> Option<&AuthErrorCode> {
        match self {
            AppError::Auth { code, .. } => Some(code),
            _ => None,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
