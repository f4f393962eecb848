use std::future::Future;
use std::pin::Pin;

use tracing::Instrument;

use rooster_application::ports::outgoing::task_spawn::TaskSpawnPort;

#[derive(Default)]
pub struct TokioTaskSpawnAdapter;

impl TokioTaskSpawnAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl TaskSpawnPort for TokioTaskSpawnAdapter {
    fn spawn(&self, future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>) {
        tokio::spawn(future.in_current_span());
    }
}
