use rooster_application::infrastructure_config::{
    BackendKind, Config, FirebaseConfig, HttpConfig, ParseConfig,
};
use tracing::info;

pub fn print_startup_info(config: &Config) {
    info!("⚙️  Configuration:");
    info!("  🌍 Environment: {}", config.environment.env);
    print_backend_info(config);
    print_http_info(&config.http);
    print_shell_info(config);
}

fn print_backend_info(config: &Config) {
    match config.backend {
        BackendKind::Firebase => print_firebase_info(&config.firebase),
        BackendKind::Parse => print_parse_info(&config.parse),
    }
}

fn print_firebase_info(firebase: &FirebaseConfig) {
    info!("  🔥 Backend: Firebase (project {})", firebase.project_id);
    info!("    • Identity Toolkit: {}", firebase.auth_base_url);
    info!(
        "    • Firestore: {} (collection '{}')",
        firebase.firestore_base_url, firebase.users_collection
    );
    info!(
        "    • Token refresh margin: {}s",
        firebase.token_refresh_margin_secs
    );
}

fn print_parse_info(parse: &ParseConfig) {
    info!("  🅿️  Backend: Parse Server");
    info!("    • Server: {}", parse.server_url);
    info!("    • Application: {}", parse.application_id);
}

fn print_http_info(http: &HttpConfig) {
    info!(
        "  🌐 HTTP: timeout {}s, user agent '{}'",
        http.request_timeout_secs, http.user_agent
    );
}

fn print_shell_info(config: &Config) {
    match &config.shell.sign_in_email {
        Some(email) => info!("  🔑 Startup sign-in: {}", email),
        None => info!("  🔑 Startup sign-in: disabled"),
    }
}
