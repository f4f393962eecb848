use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::watch;

use crate::error::AppResult;
use domain::auth::{SignUpProfile, User};

/// Identity provider plus its profile document. Implementations own the
/// session token and publish every change of the signed-in account on
/// `subscribe`.
#[async_trait::async_trait]
pub trait CredentialStorePort: Send + Sync {
    async fn sign_in(&self, email: &str, password: &SecretString) -> AppResult<User>;

    /// Creates the credential, writes the default profile and sends the
    /// verification email on a best-effort basis.
    async fn sign_up(&self, profile: SignUpProfile, password: &SecretString) -> AppResult<User>;

    async fn sign_out(&self) -> AppResult<()>;

    async fn reset_password(&self, email: &str) -> AppResult<()>;

    async fn send_current_user_email_verification(&self) -> AppResult<()>;

    async fn update_profile(&self, user: &User) -> AppResult<User>;

    /// `Ok(None)` when no session is held.
    async fn reload_current_user(&self) -> AppResult<Option<User>>;

    async fn is_user_signed_in(&self) -> bool;

    fn subscribe(&self) -> watch::Receiver<Option<User>>;
}

pub type DynCredentialStorePort = Arc<dyn CredentialStorePort>;
