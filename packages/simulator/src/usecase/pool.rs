//! Registry of active connections of one command family.

use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;

use crate::domain::{ConnectionHandle, RealtimeTransport};

use super::liveness::LivenessMonitor;

/// Delay between detaching a connection and closing its transport
pub const STOP_GRACE_DELAY: Duration = Duration::from_secs(1);

/// Insertion-ordered registry of live connections.
///
/// Handles are only ever appended or cleared all at once by
/// [`ConnectionPool::stop_all`].
#[derive(Debug)]
pub struct ConnectionPool {
    connections: Mutex<Vec<ConnectionHandle>>,
    grace_delay: Duration,
}

impl Default for ConnectionPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self::with_grace_delay(STOP_GRACE_DELAY)
    }

    pub fn with_grace_delay(grace_delay: Duration) -> Self {
        Self {
            connections: Mutex::new(Vec::new()),
            grace_delay,
        }
    }

    /// Delay before transports are closed by [`ConnectionPool::stop_all`]
    pub fn grace_delay(&self) -> Duration {
        self.grace_delay
    }

    /// Register a fully constructed connection
    pub async fn append(&self, handle: ConnectionHandle) {
        let mut connections = self.connections.lock().await;
        tracing::debug!(
            user_index = handle.user_index(),
            connection_id = %handle.connection_id(),
            "Connection registered"
        );
        connections.push(handle);
    }

    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.lock().await.is_empty()
    }

    /// User indices in registration order
    pub async fn user_indices(&self) -> Vec<usize> {
        self.connections
            .lock()
            .await
            .iter()
            .map(ConnectionHandle::user_index)
            .collect()
    }

    /// Tear down every registered connection.
    ///
    /// Monitors and orchestrators stop immediately; transports are closed
    /// after the grace delay in a background task. The registry is empty
    /// when this returns.
    ///
    /// # Returns
    ///
    /// The number of connections registered at call time
    pub async fn stop_all(&self) -> usize {
        let handles = std::mem::take(&mut *self.connections.lock().await);
        let count = handles.len();

        let transports: Vec<Arc<dyn RealtimeTransport>> = handles
            .into_iter()
            .map(|mut handle| {
                LivenessMonitor::detach(&mut handle);
                handle.stop_orchestrator();
                handle.transport().clone()
            })
            .collect();

        if !transports.is_empty() {
            let grace_delay = self.grace_delay;
            tokio::spawn(async move {
                tokio::time::sleep(grace_delay).await;
                for transport in transports {
                    transport.terminate();
                }
                tracing::debug!("Transports terminated");
            });
        }

        tracing::info!("Stopped {} connection(s)", count);
        count
    }
}
