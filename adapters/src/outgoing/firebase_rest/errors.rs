use reqwest::StatusCode;
use serde::Deserialize;

use rooster_application::error::{AppError, AuthErrorCode, ProfileStoreCode};

#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

fn parse_google_error(body: &str) -> Option<GoogleError> {
    serde_json::from_str::<GoogleErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error)
}

/// Identity Toolkit and Secure Token errors carry the code in `message`,
/// optionally followed by ` : <detail>`.
pub fn identity_error(status: StatusCode, body: &str) -> AppError {
    let Some(error) = parse_google_error(body) else {
        return AppError::Backend {
            status: status.as_u16(),
            message: body.to_string(),
        };
    };

    let (code, detail) = match error.message.split_once(" : ") {
        Some((code, detail)) => (code.trim(), detail.trim()),
        None => (error.message.trim(), ""),
    };

    let message = if detail.is_empty() { code } else { detail };
    AppError::auth(auth_code(code), message)
}

fn auth_code(code: &str) -> AuthErrorCode {
    match code {
        "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => AuthErrorCode::UserNotFound,
        "INVALID_PASSWORD" => AuthErrorCode::WrongPassword,
        "INVALID_LOGIN_CREDENTIALS" => AuthErrorCode::InvalidCredentials,
        "USER_DISABLED" => AuthErrorCode::UserDisabled,
        "EMAIL_EXISTS" => AuthErrorCode::EmailAlreadyInUse,
        "WEAK_PASSWORD" => AuthErrorCode::WeakPassword,
        "INVALID_EMAIL" => AuthErrorCode::InvalidEmail,
        "MISSING_EMAIL" | "MISSING_PASSWORD" => AuthErrorCode::MissingCredentials,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthErrorCode::TooManyRequests,
        "TOKEN_EXPIRED"
        | "INVALID_ID_TOKEN"
        | "INVALID_REFRESH_TOKEN"
        | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => AuthErrorCode::SessionExpired,
        other => AuthErrorCode::Other(other.to_string()),
    }
}

pub fn firestore_error(status: StatusCode, body: &str) -> AppError {
    match parse_google_error(body) {
        Some(error) => AppError::ProfileStore {
            code: error
                .status
                .as_deref()
                .map_or_else(|| status_code_fallback(status), ProfileStoreCode::from_status),
            message: error.message,
        },
        None => AppError::Backend {
            status: status.as_u16(),
            message: body.to_string(),
        },
    }
}

fn status_code_fallback(status: StatusCode) -> ProfileStoreCode {
    match status {
        StatusCode::NOT_FOUND => ProfileStoreCode::NotFound,
        StatusCode::FORBIDDEN => ProfileStoreCode::PermissionDenied,
        StatusCode::UNAUTHORIZED => ProfileStoreCode::Unauthenticated,
        StatusCode::TOO_MANY_REQUESTS => ProfileStoreCode::ResourceExhausted,
        StatusCode::SERVICE_UNAVAILABLE => ProfileStoreCode::Unavailable,
        StatusCode::GATEWAY_TIMEOUT => ProfileStoreCode::DeadlineExceeded,
        other => ProfileStoreCode::Other(other.as_u16().to_string()),
    }
}
