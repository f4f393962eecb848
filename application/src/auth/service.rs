use std::sync::{Arc, Weak};

use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{AppError, AppResult};
use crate::ports::incoming::auth::AuthUseCase;
use crate::ports::outgoing::credential_store::DynCredentialStorePort;
use crate::ports::outgoing::task_spawn::DynTaskSpawnPort;
use domain::auth::{AuthState, SignUpProfile, User, UserRole};

// Only writer of `auth_state` and `current_user`.
pub struct AuthService {
    credential_store: DynCredentialStorePort,
    auth_state: watch::Sender<AuthState>,
    current_user: watch::Sender<Option<User>>,
}

impl AuthService {
    pub fn new(credential_store: DynCredentialStorePort, task_spawn: &DynTaskSpawnPort) -> Arc<Self> {
        let (auth_state, _) = watch::channel(AuthState::Loading);
        let (current_user, _) = watch::channel(None);

        let mut changes = credential_store.subscribe();
        let service = Arc::new(Self {
            credential_store,
            auth_state,
            current_user,
        });

        // Settle on the store's current session before any call can set an
        // error, so the observer only ever applies newer changes.
        service.apply_store_change(changes.borrow_and_update().clone());

        debug!("Observing credential store");
        task_spawn.spawn(Box::pin(observe_credential_store(
            Arc::downgrade(&service),
            changes,
        )));

        service
    }

    fn set_user(&self, user: Option<User>) {
        self.current_user.send_replace(user.clone());
        self.auth_state.send_replace(AuthState::from_user(user));
    }

    fn set_loading(&self) {
        self.auth_state.send_replace(AuthState::Loading);
    }

    fn set_error(&self, message: String) {
        self.auth_state.send_replace(AuthState::Error(message));
    }

    fn apply_store_change(&self, user: Option<User>) {
        debug!(
            email = user.as_ref().map_or("null", |u| u.email.as_str()),
            "Current user updated"
        );
        self.set_user(user);
    }

    fn record_store_closed(&self) {
        error!("Credential store change channel closed");
        self.current_user.send_replace(None);
        self.set_error("Failed to observe auth state: credential store closed".to_string());
    }
}

async fn observe_credential_store(
    service: Weak<AuthService>,
    mut changes: watch::Receiver<Option<User>>,
) {
    while changes.changed().await.is_ok() {
        let Some(service) = service.upgrade() else {
            return;
        };
        // Applied while the receiver still holds the value, so a newer store
        // change cannot land before this one is published.
        {
            let user = changes.borrow_and_update();
            service.apply_store_change(user.clone());
        }
    }

    if let Some(service) = service.upgrade() {
        service.record_store_closed();
    }
}

#[async_trait::async_trait]
impl AuthUseCase for AuthService {
    #[instrument(skip(self, password))]
    async fn sign_in_with_email(&self, email: &str, password: &SecretString) -> AppResult<User> {
        self.set_loading();

        match self.credential_store.sign_in(email, password).await {
            Ok(user) => {
                info!(user_id = %user.id, role = %user.role, "Signed in");
                self.set_user(Some(user.clone()));
                Ok(user)
            }
            Err(e) => {
                warn!("Sign in failed: {}", e);
                self.set_error(e.to_string());
                Err(e)
            }
        }
    }

    #[instrument(skip(self, password, phone_number))]
    async fn sign_up_with_email(
        &self,
        email: &str,
        password: &SecretString,
        display_name: &str,
        role: UserRole,
        phone_number: Option<String>,
    ) -> AppResult<User> {
        self.set_loading();

        let profile = SignUpProfile {
            email: email.to_string(),
            display_name: display_name.to_string(),
            role,
            phone_number,
        };

        match self.credential_store.sign_up(profile, password).await {
            Ok(user) => {
                info!(user_id = %user.id, "Signed up");
                self.set_user(Some(user.clone()));
                Ok(user)
            }
            Err(e) => {
                warn!("Sign up failed: {}", e);
                self.set_error(e.to_string());
                Err(e)
            }
        }
    }

    async fn sign_in_with_phone(
        &self,
        _phone_number: &str,
        _verification_code: &str,
    ) -> AppResult<User> {
        warn!("Phone sign-in requested but not supported");
        Err(AppError::Unsupported {
            message: "Phone authentication not implemented yet.".to_string(),
        })
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> AppResult<()> {
        self.set_user(None);

        if let Err(e) = self.credential_store.sign_out().await {
            warn!("Credential store sign out failed: {}", e);
        }

        // A change queued by the store before its session was cleared may have
        // been applied while the call was in flight.
        self.set_user(None);
        info!("Signed out");
        Ok(())
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn update_user_profile(&self, user: User) -> AppResult<User> {
        let updated = self.credential_store.update_profile(&user).await?;
        self.set_user(Some(updated.clone()));
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn send_password_reset_email(&self, email: &str) -> AppResult<()> {
        self.credential_store.reset_password(email).await
    }

    #[instrument(skip(self))]
    async fn send_email_verification(&self) -> AppResult<()> {
        self.credential_store
            .send_current_user_email_verification()
            .await
    }

    #[instrument(skip(self))]
    async fn reload_current_user(&self) -> AppResult<Option<User>> {
        self.credential_store.reload_current_user().await
    }

    fn auth_state(&self) -> AuthState {
        self.auth_state.borrow().clone()
    }

    fn current_user(&self) -> Option<User> {
        self.current_user.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.auth_state.subscribe()
    }

    fn subscribe_user(&self) -> watch::Receiver<Option<User>> {
        self.current_user.subscribe()
    }

    fn has_role(&self, role: UserRole) -> bool {
        self.current_user
            .borrow()
            .as_ref()
            .is_some_and(|user| user.role == role)
    }

    fn has_any_role(&self, roles: &[UserRole]) -> bool {
        self.current_user
            .borrow()
            .as_ref()
            .is_some_and(|user| roles.contains(&user.role))
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::error::AuthErrorCode;
    use crate::ports::outgoing::credential_store::CredentialStorePort;
    use crate::ports::outgoing::task_spawn::TaskSpawnPort;
    use domain::auth::UserId;
    use time::OffsetDateTime;

    struct TokioSpawner;

    impl TaskSpawnPort for TokioSpawner {
        fn spawn(&self, future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>) {
            tokio::spawn(future);
        }
    }

    // `sign_in` results are scripted; the change channel is driven by the test.
    struct FakeCredentialStore {
        changes: Mutex<Option<watch::Sender<Option<User>>>>,
        receiver: watch::Receiver<Option<User>>,
        sign_in_result: Mutex<Option<AppResult<User>>>,
        sign_out_calls: Mutex<u32>,
        publish_on_sign_out: bool,
    }

    impl FakeCredentialStore {
        fn new(initial: Option<User>) -> Arc<Self> {
            Self::build(initial, true)
        }

        fn build(initial: Option<User>, publish_on_sign_out: bool) -> Arc<Self> {
            let (tx, rx) = watch::channel(initial);
            Arc::new(Self {
                changes: Mutex::new(Some(tx)),
                receiver: rx,
                sign_in_result: Mutex::new(None),
                sign_out_calls: Mutex::new(0),
                publish_on_sign_out,
            })
        }

        fn script_sign_in(&self, result: AppResult<User>) {
            *self.sign_in_result.lock().unwrap() = Some(result);
        }

        fn emit(&self, user: Option<User>) {
            if let Some(tx) = self.changes.lock().unwrap().as_ref() {
                tx.send_replace(user);
            }
        }

        fn close(&self) {
            self.changes.lock().unwrap().take();
        }
    }

    #[async_trait::async_trait]
    impl CredentialStorePort for FakeCredentialStore {
        async fn sign_in(&self, _email: &str, _password: &SecretString) -> AppResult<User> {
            let result = self
                .sign_in_result
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(AppError::Internal {
                    message: "unscripted".to_string(),
                }));
            if let Ok(user) = &result {
                self.emit(Some(user.clone()));
            }
            result
        }

        async fn sign_up(
            &self,
            profile: SignUpProfile,
            _password: &SecretString,
        ) -> AppResult<User> {
            if profile.email == "taken@example.com" {
                return Err(AppError::auth(
                    AuthErrorCode::EmailAlreadyInUse,
                    "Sign up failed",
                ));
            }
            let user = User::new_profile(
                UserId::new("new-uid"),
                profile.email,
                profile.display_name,
                profile.role,
                OffsetDateTime::UNIX_EPOCH,
            )
            .with_phone_number(profile.phone_number);
            self.emit(Some(user.clone()));
            Ok(user)
        }

        async fn sign_out(&self) -> AppResult<()> {
            *self.sign_out_calls.lock().unwrap() += 1;
            if self.publish_on_sign_out {
                self.emit(None);
            }
            Ok(())
        }

        async fn reset_password(&self, email: &str) -> AppResult<()> {
            if email.contains('@') {
                Ok(())
            } else {
                Err(AppError::auth(AuthErrorCode::InvalidEmail, "INVALID_EMAIL"))
            }
        }

        async fn send_current_user_email_verification(&self) -> AppResult<()> {
            if self.receiver.borrow().is_some() {
                Ok(())
            } else {
                Err(AppError::NotSignedIn)
            }
        }

        async fn update_profile(&self, user: &User) -> AppResult<User> {
            let current = self.receiver.borrow().clone();
            match current {
                None => Err(AppError::NotSignedIn),
                Some(current) if current.id != user.id => Err(AppError::UserMismatch),
                Some(_) => {
                    let updated = user.clone().touched(OffsetDateTime::UNIX_EPOCH);
                    self.emit(Some(updated.clone()));
                    Ok(updated)
                }
            }
        }

        async fn reload_current_user(&self) -> AppResult<Option<User>> {
            Ok(self.receiver.borrow().clone())
        }

        async fn is_user_signed_in(&self) -> bool {
            self.receiver.borrow().is_some()
        }

        fn subscribe(&self) -> watch::Receiver<Option<User>> {
            self.receiver.clone()
        }
    }

    fn farmer() -> User {
        User::new_profile(
            UserId::new("uid1"),
            "test@example.com",
            "Test User",
            UserRole::Farmer,
            OffsetDateTime::UNIX_EPOCH,
        )
    }

    fn password() -> SecretString {
        SecretString::from("password")
    }

    fn service_for(store: &Arc<FakeCredentialStore>) -> Arc<AuthService> {
        let spawner: DynTaskSpawnPort = Arc::new(TokioSpawner);
        let port: DynCredentialStorePort = Arc::clone(store) as DynCredentialStorePort;
        AuthService::new(port, &spawner)
    }

    async fn wait_for(
        service: &AuthService,
        predicate: impl Fn(&AuthState) -> bool,
    ) -> AuthState {
        let mut rx = service.subscribe();
        let state = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| predicate(s)))
            .await
            .expect("state change in time")
            .expect("auth state sender alive")
            .clone();
        state
    }

    #[tokio::test]
    async fn starts_loading_then_follows_store_to_unauthenticated() {
        let store = FakeCredentialStore::new(None);
        let service = service_for(&store);

        let state = wait_for(&service, |s| *s != AuthState::Loading).await;
        assert_eq!(state, AuthState::Unauthenticated);
        assert!(service.current_user().is_none());
    }

    #[tokio::test]
    async fn store_emitting_user_authenticates() {
        let store = FakeCredentialStore::new(None);
        let service = service_for(&store);
        wait_for(&service, |s| *s == AuthState::Unauthenticated).await;

        store.emit(Some(farmer()));

        let state = wait_for(&service, AuthState::is_authenticated).await;
        assert_eq!(state.user(), Some(&farmer()));
        assert_eq!(service.current_user(), Some(farmer()));
    }

    #[tokio::test]
    async fn sign_in_success_holds_the_store_profile() {
        let store = FakeCredentialStore::new(None);
        let service = service_for(&store);
        store.script_sign_in(Ok(farmer()));

        let user = service
            .sign_in_with_email("test@example.com", &password())
            .await
            .unwrap();

        assert_eq!(user, farmer());
        assert_eq!(service.current_user(), Some(farmer()));
        assert_eq!(service.auth_state(), AuthState::Authenticated(farmer()));
        assert!(service.is_farmer());
        assert!(!service.is_admin());
    }

    #[tokio::test]
    async fn user_subscribers_see_sign_in_and_sign_out() {
        let store = FakeCredentialStore::new(None);
        let service = service_for(&store);
        let users = service.subscribe_user();
        store.script_sign_in(Ok(farmer()));

        service
            .sign_in_with_email("test@example.com", &password())
            .await
            .unwrap();
        assert_eq!(users.borrow().as_ref(), Some(&farmer()));

        service.sign_out().await.unwrap();
        assert!(users.borrow().is_none());
    }

    #[tokio::test]
    async fn sign_in_failure_records_underlying_message() {
        let store = FakeCredentialStore::new(None);
        let service = service_for(&store);
        wait_for(&service, |s| *s == AuthState::Unauthenticated).await;
        store.script_sign_in(Err(AppError::auth(
            AuthErrorCode::WrongPassword,
            "Sign in failed",
        )));

        let result = service
            .sign_in_with_email("test@example.com", &password())
            .await;

        assert!(matches!(
            result,
            Err(AppError::Auth {
                code: AuthErrorCode::WrongPassword,
                ..
            })
        ));
        assert_eq!(
            service.auth_state(),
            AuthState::Error("Sign in failed".to_string())
        );
    }

    #[tokio::test]
    async fn construction_settles_on_the_store_session() {
        let store = FakeCredentialStore::new(Some(farmer()));
        let service = service_for(&store);

        assert_eq!(service.auth_state(), AuthState::Authenticated(farmer()));
        assert_eq!(service.current_user(), Some(farmer()));
    }

    #[tokio::test]
    async fn early_sign_in_error_is_kept_once_observer_runs() {
        let store = FakeCredentialStore::new(None);
        let service = service_for(&store);
        store.script_sign_in(Err(AppError::auth(
            AuthErrorCode::WrongPassword,
            "Sign in failed",
        )));

        assert!(service.sign_in_with_email("a@b.c", &password()).await.is_err());
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        assert_eq!(
            service.auth_state(),
            AuthState::Error("Sign in failed".to_string())
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn sign_out_is_never_overtaken_by_an_earlier_sign_in() {
        let store = FakeCredentialStore::new(None);
        let service = service_for(&store);

        for _ in 0..200 {
            store.script_sign_in(Ok(farmer()));
            service.sign_in_with_email("a@b.c", &password()).await.unwrap();
            service.sign_out().await.unwrap();

            assert_eq!(service.auth_state(), AuthState::Unauthenticated);
            assert!(service.current_user().is_none());
        }
    }

    #[tokio::test]
    async fn error_is_not_terminal() {
        let store = FakeCredentialStore::new(None);
        let service = service_for(&store);
        store.script_sign_in(Err(AppError::Network {
            message: "offline".to_string(),
        }));
        assert!(service.sign_in_with_email("a@b.c", &password()).await.is_err());
        assert!(matches!(service.auth_state(), AuthState::Error(_)));

        store.script_sign_in(Ok(farmer()));
        service.sign_in_with_email("a@b.c", &password()).await.unwrap();
        assert!(service.auth_state().is_authenticated());
    }

    #[tokio::test]
    async fn sign_up_authenticates_with_new_profile() {
        let store = FakeCredentialStore::new(None);
        let service = service_for(&store);

        let user = service
            .sign_up_with_email(
                "new@example.com",
                &password(),
                "New User",
                UserRole::Buyer,
                Some("+919999999999".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(user.role, UserRole::Buyer);
        assert_eq!(user.phone_number, "+919999999999");
        assert!(service.is_buyer());
        assert_eq!(service.auth_state(), AuthState::Authenticated(user));
    }

    #[tokio::test]
    async fn sign_up_failure_records_error() {
        let store = FakeCredentialStore::new(None);
        let service = service_for(&store);

        let result = service
            .sign_up_with_email(
                "taken@example.com",
                &password(),
                "Dup",
                UserRole::Farmer,
                None,
            )
            .await;

        assert!(result.is_err());
        assert_eq!(
            service.auth_state(),
            AuthState::Error("Sign up failed".to_string())
        );
    }

    #[tokio::test]
    async fn sign_out_is_unauthenticated_on_return() {
        let store = FakeCredentialStore::build(Some(farmer()), false);
        let service = service_for(&store);
        wait_for(&service, AuthState::is_authenticated).await;

        service.sign_out().await.unwrap();

        assert_eq!(service.auth_state(), AuthState::Unauthenticated);
        assert!(service.current_user().is_none());
        assert_eq!(*store.sign_out_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn store_emitting_none_after_sign_out_stays_unauthenticated() {
        let store = FakeCredentialStore::new(Some(farmer()));
        let service = service_for(&store);
        wait_for(&service, AuthState::is_authenticated).await;

        service.sign_out().await.unwrap();
        tokio::task::yield_now().await;

        let state = wait_for(&service, |s| *s == AuthState::Unauthenticated).await;
        assert_eq!(state, AuthState::Unauthenticated);
        assert!(!service.has_role(UserRole::Farmer));
    }

    #[tokio::test]
    async fn roles_reflect_held_user_only() {
        let store = FakeCredentialStore::new(None);
        let service = service_for(&store);
        wait_for(&service, |s| *s == AuthState::Unauthenticated).await;

        assert!(!service.has_role(UserRole::Farmer));
        assert!(!service.has_any_role(&UserRole::ALL));

        store.emit(Some(farmer()));
        wait_for(&service, AuthState::is_authenticated).await;

        assert!(service.has_any_role(&[UserRole::Buyer, UserRole::Farmer]));
        assert!(!service.has_any_role(&[UserRole::Buyer, UserRole::Admin]));
        assert!(!service.has_any_role(&[]));
        assert!(!service.is_veterinarian());
        assert!(!service.is_expert());
    }

    #[tokio::test]
    async fn profile_update_refreshes_current_user() {
        let store = FakeCredentialStore::new(Some(farmer()));
        let service = service_for(&store);
        wait_for(&service, AuthState::is_authenticated).await;

        let mut edited = farmer();
        edited.display_name = "Renamed".to_string();
        let updated = service.update_user_profile(edited).await.unwrap();

        assert_eq!(updated.display_name, "Renamed");
        assert_eq!(
            service.current_user().map(|u| u.display_name),
            Some("Renamed".to_string())
        );
    }

    #[tokio::test]
    async fn profile_update_for_other_user_is_rejected() {
        let store = FakeCredentialStore::new(Some(farmer()));
        let service = service_for(&store);
        wait_for(&service, AuthState::is_authenticated).await;

        let mut other = farmer();
        other.id = UserId::new("someone-else");

        let result = service.update_user_profile(other).await;
        assert!(matches!(result, Err(AppError::UserMismatch)));
        assert_eq!(service.current_user(), Some(farmer()));
    }

    #[tokio::test]
    async fn pass_through_calls_propagate_results() {
        let store = FakeCredentialStore::new(None);
        let service = service_for(&store);

        assert!(service.send_password_reset_email("a@b.c").await.is_ok());
        assert!(matches!(
            service.send_password_reset_email("nope").await,
            Err(AppError::Auth {
                code: AuthErrorCode::InvalidEmail,
                ..
            })
        ));
        assert!(matches!(
            service.send_email_verification().await,
            Err(AppError::NotSignedIn)
        ));
        assert_eq!(service.reload_current_user().await.unwrap(), None);
    }

    #[tokio::test]
    async fn phone_sign_in_is_unsupported_and_leaves_state() {
        let store = FakeCredentialStore::new(None);
        let service = service_for(&store);
        let before = wait_for(&service, |s| *s == AuthState::Unauthenticated).await;

        let result = service.sign_in_with_phone("+910000000000", "123456").await;

        assert!(matches!(result, Err(AppError::Unsupported { .. })));
        assert_eq!(service.auth_state(), before);
    }

    #[tokio::test]
    async fn closed_store_channel_surfaces_error() {
        let store = FakeCredentialStore::new(Some(farmer()));
        let service = service_for(&store);
        wait_for(&service, AuthState::is_authenticated).await;

        store.close();

        let state = wait_for(&service, |s| matches!(s, AuthState::Error(_))).await;
        assert_eq!(
            state,
            AuthState::Error("Failed to observe auth state: credential store closed".to_string())
        );
        assert!(service.current_user().is_none());
    }
}
