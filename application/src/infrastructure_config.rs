use secrecy::{ExposeSecret, SecretString};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use url::Url;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendKind,
    pub firebase: FirebaseConfig,
    pub parse: ParseConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
    pub environment: EnvironmentConfig,
    pub shell: ShellConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    #[serde(rename = "firebase")]
    Firebase,
    #[serde(rename = "parse")]
    Parse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseConfig {
    #[serde(serialize_with = "redacted", deserialize_with = "secret")]
    pub api_key: SecretString,
    pub project_id: String,
    pub users_collection: String,
    pub auth_base_url: String,
    pub token_base_url: String,
    pub firestore_base_url: String,
    /// Seconds before ID token expiry at which it is refreshed.
    pub token_refresh_margin_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseConfig {
    pub server_url: String,
    pub application_id: String,
    #[serde(serialize_with = "redacted", deserialize_with = "secret")]
    pub rest_api_key: SecretString,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub include_location: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogFormat {
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "pretty")]
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub env: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShellConfig {
    pub sign_in_email: Option<String>,
    #[serde(
        default,
        serialize_with = "redacted_opt",
        deserialize_with = "secret_opt"
    )]
    pub sign_in_password: Option<SecretString>,
}

// Empty secrets stay empty so that defaults round-trip through figment and
// validation still sees a missing key.
fn redacted<S>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if secret.expose_secret().is_empty() {
        serializer.serialize_str("")
    } else {
        serializer.serialize_str("[REDACTED]")
    }
}

fn redacted_opt<S>(secret: &Option<SecretString>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match secret {
        Some(secret) => redacted(secret, serializer),
        None => serializer.serialize_none(),
    }
}

// Layered providers parse all-digit values as numbers.
struct SecretText(String);

impl<'de> Deserialize<'de> for SecretText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(SecretTextVisitor).map(SecretText)
    }
}

struct SecretTextVisitor;

impl Visitor<'_> for SecretTextVisitor {
    type Value = String;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a string or a number")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<String, E> {
        Ok(value)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_u128<E: de::Error>(self, value: u128) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_i128<E: de::Error>(self, value: i128) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<String, E> {
        Ok(value.to_string())
    }
}

fn secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    SecretText::deserialize(deserializer).map(|text| SecretString::from(text.0))
}

fn secret_opt<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<SecretText>::deserialize(deserializer)?.map(|text| SecretString::from(text.0)))
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            api_key: SecretString::from(""),
            project_id: String::new(),
            users_collection: "users".to_string(),
            auth_base_url: "https://identitytoolkit.googleapis.com".to_string(),
            token_base_url: "https://securetoken.googleapis.com".to_string(),
            firestore_base_url: "https://firestore.googleapis.com".to_string(),
            token_refresh_margin_secs: 60,
        }
    }
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            server_url: "https://parseapi.back4app.com".to_string(),
            application_id: String::new(),
            rest_api_key: SecretString::from(""),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Firebase,
            firebase: FirebaseConfig::default(),
            parse: ParseConfig::default(),
            http: HttpConfig {
                request_timeout_secs: 30,
                user_agent: concat!("rooster/", env!("CARGO_PKG_VERSION")).to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Pretty,
                include_location: false,
            },
            environment: EnvironmentConfig {
                env: "development".to_string(),
            },
            shell: ShellConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> AppResult<()> {
        if self.http.request_timeout_secs == 0 {
            return Err(AppError::ConfigError {
                message: "http.request_timeout_secs must be > 0".to_string(),
            });
        }

        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::ConfigError {
                message: "http.user_agent cannot be empty".to_string(),
            });
        }

        if self.logging.level.trim().is_empty() {
            return Err(AppError::ConfigError {
                message: "logging.level cannot be empty".to_string(),
            });
        }

        match self.backend {
            BackendKind::Firebase => self.firebase.validate()?,
            BackendKind::Parse => self.parse.validate()?,
        }

        if self.shell.sign_in_email.is_some() != self.shell.sign_in_password.is_some() {
            return Err(AppError::ConfigError {
                message: "shell.sign_in_email and shell.sign_in_password must be set together"
                    .to_string(),
            });
        }

        Ok(())
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            BackendKind::Firebase => "firebase",
            BackendKind::Parse => "parse",
        }
    }
}

impl FirebaseConfig {
    fn validate(&self) -> AppResult<()> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(AppError::ConfigError {
                message: "firebase.api_key is required for the firebase backend".to_string(),
            });
        }

        if self.project_id.trim().is_empty() {
            return Err(AppError::ConfigError {
                message: "firebase.project_id is required for the firebase backend".to_string(),
            });
        }

        if self.users_collection.trim().is_empty() || self.users_collection.contains('/') {
            return Err(AppError::ConfigError {
                message: "firebase.users_collection must be a single collection id".to_string(),
            });
        }

        if self.token_refresh_margin_secs < 0 {
            return Err(AppError::ConfigError {
                message: "firebase.token_refresh_margin_secs cannot be negative".to_string(),
            });
        }

        validate_url("firebase.auth_base_url", &self.auth_base_url)?;
        validate_url("firebase.token_base_url", &self.token_base_url)?;
        validate_url("firebase.firestore_base_url", &self.firestore_base_url)
    }
}

impl ParseConfig {
    fn validate(&self) -> AppResult<()> {
        if self.application_id.trim().is_empty() {
            return Err(AppError::ConfigError {
                message: "parse.application_id is required for the parse backend".to_string(),
            });
        }

        if self.rest_api_key.expose_secret().trim().is_empty() {
            return Err(AppError::ConfigError {
                message: "parse.rest_api_key is required for the parse backend".to_string(),
            });
        }

        validate_url("parse.server_url", &self.server_url)
    }
}

fn validate_url(field: &str, value: &str) -> AppResult<()> {
    let url = Url::parse(value).map_err(|e| AppError::ConfigError {
        message: format!("{field} is not a valid URL: {e}"),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(AppError::ConfigError {
            message: format!("{field} must use http or https, got '{other}'"),
        }),
    }
}
