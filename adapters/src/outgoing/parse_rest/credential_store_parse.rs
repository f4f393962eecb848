use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{
    EmailBody, LoginBody, ParseUser, ProfileUpdateBody, SignUpBody, SignUpResponse,
    UpdateResponse, legacy_role, parse_date,
};
use super::errors::parse_error;
use crate::outgoing::http::{join_url, map_transport_error, read_empty, read_json};
use crate::outgoing::session_cell::SessionCell;
use domain::auth::{SignUpProfile, User, UserId};
use rooster_application::error::{AppError, AppResult, AuthErrorCode};
use rooster_application::infrastructure_config::ParseConfig;
use rooster_application::ports::outgoing::credential_store::CredentialStorePort;

#[derive(Clone)]
struct ParseSession {
    object_id: String,
    email: String,
    session_token: SecretString,
}

pub struct ParseCredentialStore {
    http: Client,
    server_url: String,
    application_id: String,
    rest_api_key: SecretString,
    installation_id: String,
    session: SessionCell<ParseSession>,
}

impl ParseCredentialStore {
    pub fn new(config: &ParseConfig, http: Client) -> Self {
        Self {
            http,
            server_url: config.server_url.clone(),
            application_id: config.application_id.clone(),
            rest_api_key: config.rest_api_key.clone(),
            installation_id: Uuid::new_v4().to_string(),
            session: SessionCell::new(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, join_url(&self.server_url, path))
            .header("X-Parse-Application-Id", &self.application_id)
            .header("X-Parse-REST-API-Key", self.rest_api_key.expose_secret())
            .header("X-Parse-Installation-Id", &self.installation_id)
            .header("X-Parse-Revocable-Session", "1")
    }

    fn authed(&self, method: Method, path: &str, session: &ParseSession) -> RequestBuilder {
        self.request(method, path)
            .header("X-Parse-Session-Token", session.session_token.expose_secret())
    }

    async fn active_session(&self) -> AppResult<ParseSession> {
        self.session.current().await.ok_or(AppError::NotSignedIn)
    }

    async fn fetch_me(&self, session: &ParseSession) -> AppResult<User> {
        let response = self
            .authed(Method::GET, "users/me", session)
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;
        let me: ParseUser = read_json(response, parse_error).await?;
        Ok(me.into_user())
    }
}

#[async_trait]
impl CredentialStorePort for ParseCredentialStore {
    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &SecretString) -> AppResult<User> {
        let response = self
            .request(Method::POST, "login")
            .json(&LoginBody {
                username: email,
                password: password.expose_secret(),
            })
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;
        let mut logged_in: ParseUser = read_json(response, parse_error).await?;

        let session_token = logged_in.session_token.take().ok_or_else(|| AppError::Internal {
            message: "Login response carried no session token".to_string(),
        })?;
        let user = logged_in.into_user();
        let session = ParseSession {
            object_id: user.id.to_string(),
            email: user.email.clone(),
            session_token: SecretString::from(session_token),
        };

        self.session.establish(session, &user).await;
        info!("Signed in {} as {}", user.id, user.role);
        Ok(user)
    }

    #[instrument(skip(self, profile, password), fields(email = %profile.email, role = %profile.role))]
    async fn sign_up(&self, profile: SignUpProfile, password: &SecretString) -> AppResult<User> {
        let phone = profile.phone_number.clone().unwrap_or_default();
        let response = self
            .request(Method::POST, "users")
            .json(&SignUpBody {
                username: &profile.email,
                password: password.expose_secret(),
                email: &profile.email,
                display_name: &profile.display_name,
                role: profile.role.as_str(),
                user_role: legacy_role(profile.role),
                phone: &phone,
                phone_verified: false,
                is_active: true,
            })
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;
        let created: SignUpResponse = read_json(response, parse_error).await?;

        // Verification mail is sent server-side when verifyUserEmails is on.
        let created_at =
            parse_date(created.created_at.as_deref()).unwrap_or_else(OffsetDateTime::now_utc);
        let user = User::new_profile(
            UserId::new(created.object_id),
            profile.email,
            profile.display_name,
            profile.role,
            created_at,
        )
        .with_phone_number(profile.phone_number);
        let session = ParseSession {
            object_id: user.id.to_string(),
            email: user.email.clone(),
            session_token: SecretString::from(created.session_token),
        };

        self.session.establish(session, &user).await;
        info!("Created account {} as {}", user.id, user.role);
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> AppResult<()> {
        let Some(session) = self.session.clear().await else {
            return Ok(());
        };

        let response = self
            .authed(Method::POST, "logout", &session)
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;
        match read_empty(response, parse_error).await {
            Ok(()) => {
                info!("Signed out {}", session.object_id);
                Ok(())
            }
            // Server already dropped the session.
            Err(e) if e.auth_code() == Some(&AuthErrorCode::SessionExpired) => Ok(()),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    async fn reset_password(&self, email: &str) -> AppResult<()> {
        let response = self
            .request(Method::POST, "requestPasswordReset")
            .json(&EmailBody { email })
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;
        read_empty(response, parse_error).await
    }

    #[instrument(skip(self))]
    async fn send_current_user_email_verification(&self) -> AppResult<()> {
        let session = self.active_session().await?;
        let response = self
            .request(Method::POST, "verificationEmailRequest")
            .json(&EmailBody {
                email: &session.email,
            })
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;
        read_empty(response, parse_error).await
    }

    #[instrument(skip(self, user), fields(uid = %user.id))]
    async fn update_profile(&self, user: &User) -> AppResult<User> {
        let session = self.active_session().await?;
        if user.id.as_str() != session.object_id {
            return Err(AppError::UserMismatch);
        }

        let response = self
            .authed(
                Method::PUT,
                &format!("users/{}", session.object_id),
                &session,
            )
            .json(&ProfileUpdateBody::from(user))
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;
        let updated: UpdateResponse = read_json(response, parse_error).await?;

        let updated_at =
            parse_date(updated.updated_at.as_deref()).unwrap_or_else(OffsetDateTime::now_utc);
        let updated = user.clone().touched(updated_at);

        self.session.publish(Some(updated.clone()));
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn reload_current_user(&self) -> AppResult<Option<User>> {
        let Some(session) = self.session.current().await else {
            return Ok(None);
        };

        match self.fetch_me(&session).await {
            Ok(user) => {
                self.session
                    .replace(ParseSession {
                        email: user.email.clone(),
                        ..session
                    })
                    .await;
                self.session.publish(Some(user.clone()));
                Ok(Some(user))
            }
            Err(e) if e.auth_code() == Some(&AuthErrorCode::SessionExpired) => {
                warn!("Session token rejected, signing out: {}", e);
                self.session.clear().await;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn is_user_signed_in(&self) -> bool {
        self.session.is_active().await
    }

    fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.session.subscribe()
    }
}
