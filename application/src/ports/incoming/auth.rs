use secrecy::SecretString;
use tokio::sync::watch;

use crate::error::AppResult;
use domain::auth::{AuthState, User, UserRole};

#[async_trait::async_trait]
pub trait AuthUseCase: Send + Sync {
    async fn sign_in_with_email(&self, email: &str, password: &SecretString) -> AppResult<User>;
    async fn sign_up_with_email(
        &self,
        email: &str,
        password: &SecretString,
        display_name: &str,
        role: UserRole,
        phone_number: Option<String>,
    ) -> AppResult<User>;
    async fn sign_in_with_phone(&self, phone_number: &str, verification_code: &str)
    -> AppResult<User>;
    async fn sign_out(&self) -> AppResult<()>;
    async fn update_user_profile(&self, user: User) -> AppResult<User>;
    async fn send_password_reset_email(&self, email: &str) -> AppResult<()>;
    async fn send_email_verification(&self) -> AppResult<()>;
    async fn reload_current_user(&self) -> AppResult<Option<User>>;

    fn auth_state(&self) -> AuthState;
    fn current_user(&self) -> Option<User>;
    fn subscribe(&self) -> watch::Receiver<AuthState>;
    fn subscribe_user(&self) -> watch::Receiver<Option<User>>;

    fn has_role(&self, role: UserRole) -> bool;
    fn has_any_role(&self, roles: &[UserRole]) -> bool;

    fn is_admin(&self) -> bool {
        self.has_role(UserRole::Admin)
    }

    fn is_farmer(&self) -> bool {
        self.has_role(UserRole::Farmer)
    }

    fn is_buyer(&self) -> bool {
        self.has_role(UserRole::Buyer)
    }

    fn is_expert(&self) -> bool {
        self.has_role(UserRole::Expert)
    }

    fn is_veterinarian(&self) -> bool {
        self.has_role(UserRole::Veterinarian)
    }
}
