use reqwest::Client;
use std::sync::Arc;

use rooster_adapters::outgoing::{
    firebase_rest::credential_store_firebase::FirebaseCredentialStore, http::build_client,
    parse_rest::credential_store_parse::ParseCredentialStore, tokio_spawn::TokioTaskSpawnAdapter,
};
use rooster_application::auth::service::AuthService;
use rooster_application::error::AppError;
use rooster_application::infrastructure_config::{BackendKind, Config};
use rooster_application::ports::incoming::auth::AuthUseCase;
use rooster_application::ports::outgoing::{
    credential_store::DynCredentialStorePort, task_spawn::DynTaskSpawnPort,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth_service: Arc<dyn AuthUseCase>,
}

impl AppState {
    // Must be called inside a Tokio runtime.
    pub fn new(config: Config) -> Result<Self, AppError> {
        let config = Arc::new(config);

        let http = build_client(&config.http)?;
        let credential_store = Self::create_credential_store(&config, http);
        let task_spawn: DynTaskSpawnPort = Arc::new(TokioTaskSpawnAdapter::new());

        let auth_service: Arc<dyn AuthUseCase> = AuthService::new(credential_store, &task_spawn);

        Ok(Self {
            config,
            auth_service,
        })
    }

    fn create_credential_store(config: &Config, http: Client) -> DynCredentialStorePort {
        match config.backend {
            BackendKind::Firebase => {
                Arc::new(FirebaseCredentialStore::new(&config.firebase, http))
            }
            BackendKind::Parse => Arc::new(ParseCredentialStore::new(&config.parse, http)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::auth::AuthState;
    use secrecy::SecretString;

    #[tokio::test]
    async fn fresh_state_settles_unauthenticated() {
        let mut config = Config {
            backend: BackendKind::Parse,
            ..Config::default()
        };
        config.parse.application_id = "rooster-app".to_string();
        config.parse.rest_api_key = SecretString::from("rest-key");

        let state = AppState::new(config).unwrap();
        let mut rx = state.auth_service.subscribe();
        let settled = rx
            .wait_for(|state| !matches!(state, AuthState::Loading))
            .await
            .unwrap()
            .clone();

        assert_eq!(settled, AuthState::Unauthenticated);
        assert!(state.auth_service.current_user().is_none());
    }
}
