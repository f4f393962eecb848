use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use domain::auth::{User, UserId, UserRole};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseUser {
    pub object_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Plain URL or a Parse `File` pointer.
    #[serde(default)]
    pub profile_picture_url: Option<Value>,
    #[serde(default)]
    pub role: Option<String>,
    /// Legacy role column written by older app builds, e.g. `farmer`.
    #[serde(default)]
    pub user_role: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub phone_verified: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
}

impl ParseUser {
    pub fn into_user(self) -> User {
        let created_at =
            parse_date(self.created_at.as_deref()).unwrap_or(OffsetDateTime::UNIX_EPOCH);
        let updated_at = parse_date(self.updated_at.as_deref()).unwrap_or(created_at);
        let email = self.email.or_else(|| self.username.clone()).unwrap_or_default();
        let display_name = self
            .display_name
            .filter(|name| !name.trim().is_empty())
            .or(self.username)
            .unwrap_or_default();

        User {
            id: UserId::new(self.object_id),
            email,
            display_name,
            phone_number: self.phone.unwrap_or_default(),
            profile_image_url: self.profile_picture_url.as_ref().and_then(picture_url),
            role: [self.role, self.user_role]
                .into_iter()
                .flatten()
                .find_map(|role| role.parse::<UserRole>().ok())
                .unwrap_or_default(),
            is_email_verified: self.email_verified.unwrap_or(false),
            is_phone_verified: self.phone_verified.unwrap_or(false),
            is_active: self.is_active.unwrap_or(true),
            created_at,
            updated_at,
        }
    }
}

fn picture_url(value: &Value) -> Option<String> {
    match value {
        Value::String(url) if !url.is_empty() => Some(url.clone()),
        Value::Object(file) => file
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

pub fn parse_date(value: Option<&str>) -> Option<OffsetDateTime> {
    value.and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpBody<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub email: &'a str,
    pub display_name: &'a str,
    pub role: &'a str,
    pub user_role: String,
    pub phone: &'a str,
    pub phone_verified: bool,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    pub object_id: String,
    pub session_token: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginBody<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct EmailBody<'a> {
    pub email: &'a str,
}

/// Writable profile columns. `email` and `username` are left to the
/// account flows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateBody<'a> {
    pub display_name: &'a str,
    pub phone: &'a str,
    pub profile_picture_url: Option<&'a str>,
    pub role: &'a str,
    pub user_role: String,
    pub phone_verified: bool,
    pub is_active: bool,
}

impl<'a> From<&'a User> for ProfileUpdateBody<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            display_name: &user.display_name,
            phone: &user.phone_number,
            profile_picture_url: user.profile_image_url.as_deref(),
            role: user.role.as_str(),
            user_role: legacy_role(user.role),
            phone_verified: user.is_phone_verified,
            is_active: user.is_active,
        }
    }
}

pub fn legacy_role(role: UserRole) -> String {
    role.as_str().to_ascii_lowercase()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    #[serde(default)]
    pub updated_at: Option<String>,
}
