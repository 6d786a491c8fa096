use std::time::Duration;

use futures::future::LocalBoxFuture;
use tracing::debug;

/// Pending network call. Callers may await it or drop its result.
pub type NetworkFuture = LocalBoxFuture<'static, anyhow::Result<()>>;

/// The game server's mutation API as seen from the client.
///
/// The server owns persisted state; these calls only mirror changes the
/// client already made locally.
pub trait NetworkClient {
    fn put_state(&self, key: &str, value: &str) -> NetworkFuture;

    fn remove_state(&self, key: &str) -> NetworkFuture;

    fn remove_item(&self, item: &str) -> NetworkFuture;
}

/// Client for sessions without a server: every call succeeds after `latency`
#[derive(Debug, Clone, Default)]
pub struct OfflineClient {
    latency: Duration,
}

impl OfflineClient {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    fn respond(&self, call: String) -> NetworkFuture {
        let latency = self.latency;
        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            debug!(target: "network", "{} acknowledged", call);
            Ok(())
        })
    }
}

impl NetworkClient for OfflineClient {
    fn put_state(&self, key: &str, value: &str) -> NetworkFuture {
        self.respond(format!("putState({key}, {value})"))
    }

    fn remove_state(&self, key: &str) -> NetworkFuture {
        self.respond(format!("removeState({key})"))
    }

    fn remove_item(&self, item: &str) -> NetworkFuture {
        self.respond(format!("removeItem({item})"))
    }
}
