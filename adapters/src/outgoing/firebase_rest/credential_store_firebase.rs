use async_trait::async_trait;
use reqwest::Client;
use secrecy::SecretString;
use time::{Duration, OffsetDateTime};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use super::firestore::FirestoreClient;
use super::identity_toolkit::{AccountInfo, IdentityToolkitClient, parse_expires_in};
use crate::outgoing::session_cell::SessionCell;
use domain::auth::{SignUpProfile, User, UserId, UserRole};
use rooster_application::error::{AppError, AppResult, AuthErrorCode};
use rooster_application::infrastructure_config::FirebaseConfig;
use rooster_application::ports::outgoing::credential_store::CredentialStorePort;

#[derive(Clone)]
struct FirebaseSession {
    uid: String,
    id_token: SecretString,
    refresh_token: SecretString,
    expires_at: OffsetDateTime,
}

impl FirebaseSession {
    fn new(uid: String, id_token: String, refresh_token: String, expires_in: &str) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            uid,
            id_token: SecretString::from(id_token),
            refresh_token: SecretString::from(refresh_token),
            expires_at: now
                .checked_add(Duration::seconds(parse_expires_in(expires_in)))
                .unwrap_or(now),
        }
    }
}

pub struct FirebaseCredentialStore {
    identity: IdentityToolkitClient,
    firestore: FirestoreClient,
    session: SessionCell<FirebaseSession>,
    refresh_margin: Duration,
}

impl FirebaseCredentialStore {
    pub fn new(config: &FirebaseConfig, http: Client) -> Self {
        Self {
            identity: IdentityToolkitClient::new(
                http.clone(),
                config.auth_base_url.clone(),
                config.token_base_url.clone(),
                config.api_key.clone(),
            ),
            firestore: FirestoreClient::new(
                http,
                config.firestore_base_url.clone(),
                config.project_id.clone(),
                config.users_collection.clone(),
            ),
            session: SessionCell::new(),
            refresh_margin: Duration::seconds(config.token_refresh_margin_secs),
        }
    }

    // ID token stays valid past the refresh margin.
    async fn fresh_session(&self) -> AppResult<FirebaseSession> {
        let session = self.session.current().await.ok_or(AppError::NotSignedIn)?;
        if session.expires_at - self.refresh_margin > OffsetDateTime::now_utc() {
            return Ok(session);
        }

        match self.identity.refresh(&session.refresh_token).await {
            Ok(refreshed) => {
                let session = FirebaseSession::new(
                    refreshed.user_id,
                    refreshed.id_token,
                    refreshed.refresh_token,
                    &refreshed.expires_in,
                );
                self.session.replace(session.clone()).await;
                info!("Refreshed ID token for {}", session.uid);
                Ok(session)
            }
            Err(e) => {
                if is_revoked(&e) {
                    warn!("Refresh token rejected, dropping session: {}", e);
                    self.session.clear().await;
                }
                Err(e)
            }
        }
    }

    async fn load_profile(
        &self,
        session: &FirebaseSession,
        account: &AccountInfo,
    ) -> AppResult<User> {
        let user = match self.firestore.get_user(&session.uid, &session.id_token).await? {
            Some(user) => user,
            None => {
                warn!(
                    "Profile document missing for {}, creating a basic profile",
                    session.uid
                );
                let profile = User::new_profile(
                    UserId::new(&session.uid),
                    account.email.clone().unwrap_or_default(),
                    account.display_name.clone().unwrap_or_default(),
                    UserRole::Farmer,
                    OffsetDateTime::now_utc(),
                );
                self.firestore.create_user(&profile, &session.id_token).await?
            }
        };

        Ok(User {
            is_email_verified: account.email_verified,
            phone_number: account
                .phone_number
                .clone()
                .unwrap_or_else(|| user.phone_number.clone()),
            ..user
        })
    }
}

fn is_revoked(error: &AppError) -> bool {
    matches!(
        error.auth_code(),
        Some(
            AuthErrorCode::SessionExpired
                | AuthErrorCode::UserNotFound
                | AuthErrorCode::UserDisabled
        )
    )
}

#[async_trait]
impl CredentialStorePort for FirebaseCredentialStore {
    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &SecretString) -> AppResult<User> {
        let signed_in = self.identity.sign_in_with_password(email, password).await?;
        let session = FirebaseSession::new(
            signed_in.local_id,
            signed_in.id_token,
            signed_in.refresh_token,
            &signed_in.expires_in,
        );

        let account = self.identity.lookup(&session.id_token).await?;
        let user = self.load_profile(&session, &account).await?;

        self.session.establish(session, &user).await;
        info!("Signed in {} as {}", user.id, user.role);
        Ok(user)
    }

    #[instrument(skip(self, profile, password), fields(email = %profile.email, role = %profile.role))]
    async fn sign_up(&self, profile: SignUpProfile, password: &SecretString) -> AppResult<User> {
        let created = self
            .identity
            .sign_up(&profile.email, password, &profile.display_name)
            .await?;
        let session = FirebaseSession::new(
            created.local_id,
            created.id_token,
            created.refresh_token,
            &created.expires_in,
        );

        let user = User::new_profile(
            UserId::new(&session.uid),
            profile.email,
            profile.display_name,
            profile.role,
            OffsetDateTime::now_utc(),
        )
        .with_phone_number(profile.phone_number);
        let user = self.firestore.create_user(&user, &session.id_token).await?;

        if let Err(e) = self.identity.send_email_verification(&session.id_token).await {
            warn!("Failed to send verification email to {}: {}", user.email, e);
        }

        self.session.establish(session, &user).await;
        info!("Created account {} as {}", user.id, user.role);
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> AppResult<()> {
        if let Some(session) = self.session.clear().await {
            info!("Signed out {}", session.uid);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn reset_password(&self, email: &str) -> AppResult<()> {
        self.identity.send_password_reset(email).await
    }

    #[instrument(skip(self))]
    async fn send_current_user_email_verification(&self) -> AppResult<()> {
        let session = self.fresh_session().await?;
        self.identity.send_email_verification(&session.id_token).await
    }

    #[instrument(skip(self, user), fields(uid = %user.id))]
    async fn update_profile(&self, user: &User) -> AppResult<User> {
        let session = self.fresh_session().await?;
        if user.id.as_str() != session.uid {
            return Err(AppError::UserMismatch);
        }

        let previous_name = self
            .session
            .subscribe()
            .borrow()
            .as_ref()
            .map(|current| current.display_name.clone());

        let updated = user.clone().touched(OffsetDateTime::now_utc());
        let updated = self.firestore.update_user(&updated, &session.id_token).await?;

        // The profile document is authoritative for the display name.
        if previous_name.as_deref() != Some(updated.display_name.as_str()) {
            let renamed = self
                .identity
                .update_display_name(&session.id_token, &updated.display_name)
                .await;
            if let Err(e) = renamed {
                warn!("Profile saved but auth display name not updated: {}", e);
            }
        }

        self.session.publish(Some(updated.clone()));
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn reload_current_user(&self) -> AppResult<Option<User>> {
        if !self.session.is_active().await {
            return Ok(None);
        }

        let loaded = async {
            let session = self.fresh_session().await?;
            let account = self.identity.lookup(&session.id_token).await?;
            if account.disabled {
                return Err(AppError::auth(AuthErrorCode::UserDisabled, "USER_DISABLED"));
            }
            self.load_profile(&session, &account).await
        }
        .await;

        match loaded {
            Ok(user) => {
                self.session.publish(Some(user.clone()));
                Ok(Some(user))
            }
            Err(e) if is_revoked(&e) => {
                warn!("Credential no longer valid, signing out: {}", e);
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
