//! Live session of one simulated participant.

use std::{fmt, sync::Arc};

use tokio::task::JoinHandle;

use super::{ActivityTracker, ConnectionId, JoinGate, RealtimeTransport};

/// One simulated participant's live session.
///
/// Owns its transport, its liveness monitor task and its join-orchestration
/// task. Only created once the transport has been constructed, so a handle is
/// never partially initialized.
pub struct ConnectionHandle {
    user_index: usize,
    connection_id: ConnectionId,
    display_name: String,
    activity: Arc<ActivityTracker>,
    join_gate: Arc<JoinGate>,
    transport: Arc<dyn RealtimeTransport>,
    monitor: Option<JoinHandle<()>>,
    orchestrator: Option<JoinHandle<()>>,
}

impl ConnectionHandle {
    pub fn new(
        user_index: usize,
        connection_id: ConnectionId,
        display_name: String,
        activity: Arc<ActivityTracker>,
        transport: Arc<dyn RealtimeTransport>,
    ) -> Self {
        Self {
            user_index,
            connection_id,
            display_name,
            activity,
            join_gate: Arc::new(JoinGate::new()),
            transport,
            monitor: None,
            orchestrator: None,
        }
    }

    pub fn user_index(&self) -> usize {
        self.user_index
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn activity(&self) -> &Arc<ActivityTracker> {
        &self.activity
    }

    pub fn join_gate(&self) -> &Arc<JoinGate> {
        &self.join_gate
    }

    pub fn transport(&self) -> &Arc<dyn RealtimeTransport> {
        &self.transport
    }

    /// Install the liveness monitor task, replacing (and cancelling) any previous one
    pub fn set_monitor(&mut self, monitor: JoinHandle<()>) {
        self.detach_monitor();
        self.monitor = Some(monitor);
    }

    /// Cancel the liveness monitor. Idempotent.
    ///
    /// # Returns
    ///
    /// `true` if a running monitor was cancelled by this call
    pub fn detach_monitor(&mut self) -> bool {
        match self.monitor.take() {
            Some(monitor) => {
                monitor.abort();
                true
            }
            None => false,
        }
    }

    pub fn has_monitor(&self) -> bool {
        self.monitor.is_some()
    }

    /// Install the task consuming the current-user subscription
    pub fn set_orchestrator(&mut self, orchestrator: JoinHandle<()>) {
        if let Some(previous) = self.orchestrator.replace(orchestrator) {
            previous.abort();
        }
    }

    /// Stop the current-user subscription consumer. Idempotent.
    pub fn stop_orchestrator(&mut self) {
        if let Some(orchestrator) = self.orchestrator.take() {
            orchestrator.abort();
        }
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("user_index", &self.user_index)
            .field("connection_id", &self.connection_id)
            .field("display_name", &self.display_name)
            .field("join_state", &self.join_gate.state())
            .field("monitoring", &self.monitor.is_some())
            .finish()
    }
}
