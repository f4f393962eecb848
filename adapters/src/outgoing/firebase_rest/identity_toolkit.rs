use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::errors::identity_error;
use crate::outgoing::http::{join_url, map_transport_error, read_empty, read_json};
use rooster_application::error::{AppError, AppResult, AuthErrorCode};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResponse {
    pub local_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OobRequest<'a> {
    request_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id_token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdTokenRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub local_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: String,
    pub user_id: String,
}

pub struct IdentityToolkitClient {
    http: Client,
    auth_base_url: String,
    token_base_url: String,
    api_key: SecretString,
}

impl IdentityToolkitClient {
    pub fn new(
        http: Client,
        auth_base_url: String,
        token_base_url: String,
        api_key: SecretString,
    ) -> Self {
        Self {
            http,
            auth_base_url,
            token_base_url,
            api_key,
        }
    }

    fn accounts_url(&self, method: &str) -> String {
        join_url(&self.auth_base_url, &format!("v1/accounts:{method}"))
    }

    async fn post_accounts<B: Serialize + Sync>(
        &self,
        method: &str,
        body: &B,
    ) -> AppResult<reqwest::Response> {
        self.http
            .post(self.accounts_url(method))
            .query(&[("key", self.api_key.expose_secret())])
            .json(body)
            .send()
            .await
            .map_err(|e| map_transport_error(&e))
    }

    #[instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> AppResult<PasswordResponse> {
        let body = PasswordRequest {
            email,
            password: password.expose_secret(),
            display_name: None,
            return_secure_token: true,
        };
        let response = self.post_accounts("signInWithPassword", &body).await?;
        read_json(response, identity_error).await
    }

    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
        display_name: &str,
    ) -> AppResult<PasswordResponse> {
        let body = PasswordRequest {
            email,
            password: password.expose_secret(),
            display_name: Some(display_name),
            return_secure_token: true,
        };
        let response = self.post_accounts("signUp", &body).await?;
        read_json(response, identity_error).await
    }

    #[instrument(skip(self))]
    pub async fn send_password_reset(&self, email: &str) -> AppResult<()> {
        let body = OobRequest {
            request_type: "PASSWORD_RESET",
            email: Some(email),
            id_token: None,
        };
        let response = self.post_accounts("sendOobCode", &body).await?;
        read_empty(response, identity_error).await
    }

    #[instrument(skip_all)]
    pub async fn send_email_verification(&self, id_token: &SecretString) -> AppResult<()> {
        let body = OobRequest {
            request_type: "VERIFY_EMAIL",
            email: None,
            id_token: Some(id_token.expose_secret()),
        };
        let response = self.post_accounts("sendOobCode", &body).await?;
        read_empty(response, identity_error).await
    }

    #[instrument(skip_all)]
    pub async fn lookup(&self, id_token: &SecretString) -> AppResult<AccountInfo> {
        let body = IdTokenRequest {
            id_token: id_token.expose_secret(),
        };
        let response = self.post_accounts("lookup", &body).await?;
        let lookup: LookupResponse = read_json(response, identity_error).await?;
        lookup
            .users
            .into_iter()
            .next()
            .ok_or_else(|| AppError::auth(AuthErrorCode::UserNotFound, "USER_NOT_FOUND"))
    }

    #[instrument(skip(self, id_token))]
    pub async fn update_display_name(
        &self,
        id_token: &SecretString,
        display_name: &str,
    ) -> AppResult<()> {
        let body = UpdateRequest {
            id_token: id_token.expose_secret(),
            display_name,
            return_secure_token: false,
        };
        let response = self.post_accounts("update", &body).await?;
        read_empty(response, identity_error).await
    }

    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &SecretString) -> AppResult<RefreshResponse> {
        let response = self
            .http
            .post(join_url(&self.token_base_url, "v1/token"))
            .query(&[("key", self.api_key.expose_secret())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;
        read_json(response, identity_error).await
    }
}

const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;
const MAX_TOKEN_LIFETIME_SECS: i64 = 86_400;

/// `expiresIn` is a decimal string of seconds, bounded to one day.
pub fn parse_expires_in(expires_in: &str) -> i64 {
    expires_in
        .trim()
        .parse::<i64>()
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
        .clamp(0, MAX_TOKEN_LIFETIME_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_lifetime_is_bounded() {
        assert_eq!(parse_expires_in("3600"), 3600);
        assert_eq!(parse_expires_in(" 120 "), 120);
        assert_eq!(parse_expires_in("soon"), DEFAULT_TOKEN_LIFETIME_SECS);
        assert_eq!(parse_expires_in("-5"), 0);
        assert_eq!(
            parse_expires_in("9223372036854775807"),
            MAX_TOKEN_LIFETIME_SECS
        );
        assert_eq!(
            parse_expires_in("99999999999999999999999"),
            DEFAULT_TOKEN_LIFETIME_SECS
        );
    }
}
