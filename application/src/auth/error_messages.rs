use crate::error::{AppError, AuthErrorCode, ProfileStoreCode};

pub fn user_message(error: &AppError) -> String {
    match error {
        AppError::Auth { code, message } => auth_message(code, message),
        AppError::ProfileStore { code, .. } => profile_store_message(code).to_string(),
        AppError::ProfileNotFound => "Your profile could not be found. Please sign in again.".to_string(),
        AppError::NotSignedIn => "Please sign in to continue.".to_string(),
        AppError::UserMismatch => "You can only edit your own profile.".to_string(),
        AppError::Network { .. } => {
            "No internet connection. Please check your network and try again.".to_string()
        }
        AppError::Timeout => "The request timed out. Please try again.".to_string(),
        AppError::Backend { status, .. } if *status >= 500 => {
            "The server is having trouble right now. Please try again later.".to_string()
        }
        AppError::Unsupported { message } => message.clone(),
        AppError::Domain(e) => e.to_string(),
        AppError::Backend { .. }
        | AppError::JsonError(_)
        | AppError::ConfigError { .. }
        | AppError::Internal { .. } => "Something went wrong. Please try again.".to_string(),
    }
}

fn auth_message(code: &AuthErrorCode, fallback: &str) -> String {
    let message = match code {
        AuthErrorCode::InvalidEmail => "Invalid email format.",
        AuthErrorCode::WrongPassword => "Incorrect password.",
        AuthErrorCode::InvalidCredentials => "Incorrect email or password.",
        AuthErrorCode::UserNotFound => "No account found with this email.",
        AuthErrorCode::UserDisabled => "This account has been disabled.",
        AuthErrorCode::EmailAlreadyInUse => "This email is already registered.",
        AuthErrorCode::WeakPassword => "Password is too weak. Please use a stronger password.",
        AuthErrorCode::MissingCredentials => "Please enter your email and password.",
        AuthErrorCode::TooManyRequests => "Too many attempts. Please try again later.",
        AuthErrorCode::SessionExpired => "Your session has expired. Please sign in again.",
        AuthErrorCode::Other(_) if fallback.is_empty() => {
            "An unknown authentication error occurred."
        }
        AuthErrorCode::Other(_) => fallback,
    };
    message.to_string()
}

fn profile_store_message(code: &ProfileStoreCode) -> &'static str {
    match code {
        ProfileStoreCode::NotFound => "The requested record was not found.",
        ProfileStoreCode::PermissionDenied => "You do not have permission to do that.",
        ProfileStoreCode::Unauthenticated => "Your session has expired. Please sign in again.",
        ProfileStoreCode::Unavailable | ProfileStoreCode::DeadlineExceeded => {
            "The service is temporarily unavailable. Please try again."
        }
        ProfileStoreCode::ResourceExhausted => "Too many requests. Please try again later.",
        ProfileStoreCode::Internal | ProfileStoreCode::Other(_) => {
            "Something went wrong. Please try again."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_codes_map_to_friendly_strings() {
        let error = AppError::auth(AuthErrorCode::WrongPassword, "INVALID_PASSWORD");
        assert_eq!(user_message(&error), "Incorrect password.");

        let error = AppError::auth(AuthErrorCode::EmailAlreadyInUse, "EMAIL_EXISTS");
        assert_eq!(user_message(&error), "This email is already registered.");
    }

    #[test]
    fn unknown_auth_codes_keep_backend_message() {
        let error = AppError::auth(
            AuthErrorCode::Other("OPERATION_NOT_ALLOWED".to_string()),
            "Password sign-in is disabled for this project.",
        );
        assert_eq!(
            user_message(&error),
            "Password sign-in is disabled for this project."
        );

        let error = AppError::auth(AuthErrorCode::Other(String::new()), "");
        assert_eq!(
            user_message(&error),
            "An unknown authentication error occurred."
        );
    }

    #[test]
    fn transport_and_store_errors_are_generic() {
        let network = AppError::Network {
            message: "dns error".to_string(),
        };
        assert!(user_message(&network).starts_with("No internet connection"));

        let unavailable = AppError::ProfileStore {
            code: ProfileStoreCode::Unavailable,
            message: "backend down".to_string(),
        };
        assert!(user_message(&unavailable).contains("temporarily unavailable"));

        let server = AppError::Backend {
            status: 503,
            message: "upstream".to_string(),
        };
        assert!(user_message(&server).contains("server is having trouble"));

        let client = AppError::Backend {
            status: 418,
            message: "teapot".to_string(),
        };
        assert_eq!(user_message(&client), "Something went wrong. Please try again.");
    }
}
