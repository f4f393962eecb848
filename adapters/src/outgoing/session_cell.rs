use tokio::sync::{RwLock, watch};

use domain::auth::User;

// Token refreshes go through `replace` and publish nothing.
pub struct SessionCell<S> {
    session: RwLock<Option<S>>,
    changes: watch::Sender<Option<User>>,
}

impl<S: Clone + Send + Sync> SessionCell<S> {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            session: RwLock::new(None),
            changes,
        }
    }

    pub async fn current(&self) -> Option<S> {
        self.session.read().await.clone()
    }

    pub async fn is_active(&self) -> bool {
        self.session.read().await.is_some()
    }

    pub async fn establish(&self, session: S, user: &User) {
        *self.session.write().await = Some(session);
        self.publish(Some(user.clone()));
    }

    pub async fn replace(&self, session: S) {
        *self.session.write().await = Some(session);
    }

    pub async fn clear(&self) -> Option<S> {
        let previous = self.session.write().await.take();
        self.publish(None);
        previous
    }

    pub fn publish(&self, user: Option<User>) {
        self.changes.send_replace(user);
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.changes.subscribe()
    }
}

impl<S: Clone + Send + Sync> Default for SessionCell<S> {
    fn default() -> Self {
        Self::new()
    }
}
