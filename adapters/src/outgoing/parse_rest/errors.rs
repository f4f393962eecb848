use reqwest::StatusCode;
use serde::Deserialize;

use rooster_application::error::{AppError, AuthErrorCode};

#[derive(Debug, Deserialize)]
struct ParseErrorBody {
    code: i64,
    #[serde(default)]
    error: String,
}

pub fn parse_error(status: StatusCode, body: &str) -> AppError {
    let Ok(error) = serde_json::from_str::<ParseErrorBody>(body) else {
        return AppError::Backend {
            status: status.as_u16(),
            message: body.to_string(),
        };
    };

    let code = match error.code {
        100 => {
            return AppError::Network {
                message: error.error,
            };
        }
        124 => return AppError::Timeout,
        206 => return AppError::NotSignedIn,
        101 => AuthErrorCode::InvalidCredentials,
        125 => AuthErrorCode::InvalidEmail,
        200 | 201 | 204 => AuthErrorCode::MissingCredentials,
        202 | 203 => AuthErrorCode::EmailAlreadyInUse,
        205 => AuthErrorCode::UserNotFound,
        209 => AuthErrorCode::SessionExpired,
        155 => AuthErrorCode::TooManyRequests,
        _ if status.is_server_error() => {
            return AppError::Backend {
                status: status.as_u16(),
                message: error.error,
            };
        }
        other => AuthErrorCode::Other(other.to_string()),
    };

    AppError::auth(code, error.error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_login_maps_to_invalid_credentials() {
        let error = parse_error(
            StatusCode::NOT_FOUND,
            r#"{"code":101,"error":"Invalid username/password."}"#,
        );
        assert_eq!(error.auth_code(), Some(&AuthErrorCode::InvalidCredentials));
        assert_eq!(error.to_string(), "Invalid username/password.");
    }

    #[test]
    fn taken_username_and_email_are_the_same_failure() {
        for code in [202, 203] {
            let body = format!(r#"{{"code":{code},"error":"Account already exists."}}"#);
            let error = parse_error(StatusCode::BAD_REQUEST, &body);
            assert_eq!(error.auth_code(), Some(&AuthErrorCode::EmailAlreadyInUse));
        }
    }

    #[test]
    fn invalid_session_token_is_session_expired() {
        let error = parse_error(
            StatusCode::BAD_REQUEST,
            r#"{"code":209,"error":"Invalid session token"}"#,
        );
        assert_eq!(error.auth_code(), Some(&AuthErrorCode::SessionExpired));
    }

    #[test]
    fn non_auth_codes() {
        assert!(matches!(
            parse_error(StatusCode::BAD_REQUEST, r#"{"code":100,"error":"down"}"#),
            AppError::Network { .. }
        ));
        assert!(matches!(
            parse_error(StatusCode::INTERNAL_SERVER_ERROR, r#"{"code":1,"error":"boom"}"#),
            AppError::Backend { status: 500, .. }
        ));
        assert!(matches!(
            parse_error(StatusCode::BAD_GATEWAY, "upstream unavailable"),
            AppError::Backend { status: 502, .. }
        ));
    }
}
