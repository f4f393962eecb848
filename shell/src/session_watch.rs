use tokio::sync::watch;
use tracing::{info, warn};

use domain::auth::AuthState;
use domain::navigation::{Route, bottom_navigation, start_destination};

#[derive(Debug, Default)]
pub struct NavigationTracker {
    current: Option<Route>,
}

impl NavigationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, state: &AuthState) -> Option<Route> {
        let route = start_destination(state);
        if self.current == Some(route) {
            return None;
        }
        self.current = Some(route);
        Some(route)
    }
}

/// Logs every session state change and the destination it leads to. Ends
/// when the service is dropped.
pub async fn watch_navigation(mut states: watch::Receiver<AuthState>) {
    let mut tracker = NavigationTracker::new();

    loop {
        let state = states.borrow_and_update().clone();
        let route = tracker.observe(&state);
        log_state(&state, route);

        if states.changed().await.is_err() {
            break;
        }
    }
}

fn log_state(state: &AuthState, route: Option<Route>) {
    let destination = route.map_or("unchanged", Route::path);
    match state {
        AuthState::Authenticated(user) => {
            let tabs: Vec<&str> = bottom_navigation(user.role)
                .iter()
                .map(|item| item.label)
                .collect();
            info!(
                user_id = %user.id,
                role = %user.role,
                destination,
                tabs = ?tabs,
                "Session authenticated"
            );
        }
        AuthState::Error(message) => {
            warn!(destination, "Session error: {}", message);
        }
        other => {
            info!(destination, "Session {}", other.label());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::auth::{User, UserId, UserRole};
    use time::OffsetDateTime;

    fn buyer() -> User {
        User::new_profile(
            UserId::new("b1"),
            "b@example.com",
            "B",
            UserRole::Buyer,
            OffsetDateTime::UNIX_EPOCH,
        )
    }

    #[test]
    fn reports_only_route_changes() {
        let mut tracker = NavigationTracker::new();

        assert_eq!(tracker.observe(&AuthState::Loading), Some(Route::Splash));
        assert_eq!(tracker.observe(&AuthState::Loading), None);
        assert_eq!(
            tracker.observe(&AuthState::Unauthenticated),
            Some(Route::Login)
        );
        assert_eq!(tracker.observe(&AuthState::Error("x".into())), None);
        assert_eq!(
            tracker.observe(&AuthState::Authenticated(buyer())),
            Some(Route::Marketplace)
        );
    }

    #[tokio::test]
    async fn watcher_stops_when_sender_drops() {
        let (tx, rx) = watch::channel(AuthState::Loading);
        let handle = tokio::spawn(watch_navigation(rx));

        tx.send_replace(AuthState::Authenticated(buyer()));
        drop(tx);

        handle.await.unwrap();
    }
}
