use std::error::Error;

use tokio::signal;
use tracing::{error, info, warn};

use rooster_application::auth::error_messages::user_message;
use rooster_shell::bootstrap::state::AppState;
use rooster_shell::config_loader;
use rooster_shell::observability;
use rooster_shell::session_watch::watch_navigation;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = config_loader::load_config()?;

    observability::tracing::setup_logging(&config)?;

    info!("Starting Rooster session shell");
    info!("Configuration loaded successfully");
    info!("Credential store: {}", config.backend_name());
    observability::startup_info::print_startup_info(&config);

    let state = AppState::new(config.clone())?;
    tokio::spawn(watch_navigation(state.auth_service.subscribe()));

    if let (Some(email), Some(password)) = (
        config.shell.sign_in_email.as_deref(),
        config.shell.sign_in_password.as_ref(),
    ) {
        match state.auth_service.sign_in_with_email(email, password).await {
            Ok(user) => info!(
                "Signed in as {} ({})",
                user.display_name,
                user.role.display_name()
            ),
            Err(e) => error!("Sign-in failed: {}", user_message(&e)),
        }
    }

    shutdown_signal().await;

    if let Err(e) = state.auth_service.sign_out().await {
        warn!("Sign-out during shutdown failed: {}", e);
    }

    info!("Shutdown completed");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
            }
        }
    };

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down...");
        },
        () = terminate => {
            info!("Received terminate signal, shutting down...");
        },
    }
}
