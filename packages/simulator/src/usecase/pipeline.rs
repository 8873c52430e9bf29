//! Per-user setup pipeline: handshake, connection, join orchestration and
//! liveness monitoring.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::{
    connection::ConnectionFactory,
    domain::{ConnectionHandle, ConnectionId, JoinConfirmer, JoinRequest},
    error::SetupError,
    handshake::SessionAcquirer,
    report::{Reporter, user_label},
    resolver::derive_realtime_endpoint,
    transport::current_user_subscription,
};

use super::{join_orchestrator::JoinOrchestrator, liveness::LivenessMonitor};

/// Brings one simulated user from a join request to a live connection
#[async_trait]
pub trait SessionPipeline: Send + Sync {
    /// Run the setup sequence for `request`.
    ///
    /// On success the returned handle owns a constructed transport, a running
    /// join orchestrator and an attached liveness monitor.
    async fn establish(&self, request: &JoinRequest) -> Result<ConnectionHandle, SetupError>;
}

/// Pipeline against a real conferencing server
pub struct LiveSessionPipeline {
    acquirer: SessionAcquirer,
    factory: ConnectionFactory,
    monitor: LivenessMonitor,
    reporter: Arc<dyn Reporter>,
    endpoint_override: Option<Url>,
}

impl LiveSessionPipeline {
    pub fn new(
        acquirer: SessionAcquirer,
        factory: ConnectionFactory,
        monitor: LivenessMonitor,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            acquirer,
            factory,
            monitor,
            reporter,
            endpoint_override: None,
        }
    }

    /// Connect to `endpoint` instead of the one derived from the join URL
    pub fn with_endpoint_override(mut self, endpoint: Url) -> Self {
        self.endpoint_override = Some(endpoint);
        self
    }

    fn realtime_endpoint(&self, join_url: &Url) -> Result<Url, SetupError> {
        match &self.endpoint_override {
            Some(endpoint) => Ok(endpoint.clone()),
            None => derive_realtime_endpoint(join_url.as_str())
                .ok_or_else(|| SetupError::Endpoint(join_url.to_string())),
        }
    }
}

#[async_trait]
impl SessionPipeline for LiveSessionPipeline {
    async fn establish(&self, request: &JoinRequest) -> Result<ConnectionHandle, SetupError> {
        let user_index = request.user_index();
        self.reporter.progress(&format!(
            "{} ({}) requesting session",
            user_label(user_index),
            request.display_name()
        ));

        let grant = self.acquirer.acquire(request).await?;
        tracing::debug!(user_index, "Session token acquired");

        let endpoint = self.realtime_endpoint(&grant.join_url)?;
        let (mut handle, client) = self.factory.open(
            endpoint,
            &grant.token,
            ConnectionId::generate(),
            user_index,
            request.display_name().to_string(),
        )?;

        // Subscribe before any join mutation can be issued.
        let subscription = client.subscribe(current_user_subscription())?;
        let confirmer: Arc<dyn JoinConfirmer> = client;
        let orchestrator = JoinOrchestrator::new(
            user_index,
            handle.join_gate().clone(),
            confirmer,
            self.reporter.clone(),
        );
        handle.set_orchestrator(tokio::spawn(orchestrator.run(subscription)));

        let reporter = self.reporter.clone();
        self.monitor.attach(&mut handle, move |user_index| {
            tracing::warn!(user_index, "Connection appears stale");
            reporter.progress(&format!("{} connection appears stale", user_label(user_index)));
        });

        Ok(handle)
    }
}
