//! Connection factory: one authenticated real-time connection per simulated user.

use std::sync::Arc;

use nigiwai_shared::time::Clock;
use serde_json::{Value, json};
use url::Url;

use crate::{
    domain::{ActivityTracker, ConnectionHandle, ConnectionId, SessionToken},
    error::TransportError,
    report::{Reporter, user_label},
    transport::{CLIENT_TYPE, GraphqlWsClient, ServerMessage, TransportListener, TransportOptions},
};

/// `connection_init` payload identifying one simulated client
pub fn connection_params(token: &SessionToken, connection_id: ConnectionId) -> Value {
    json!({
        "headers": {
            "X-Session-Token": token.as_str(),
            "X-ClientSessionUUID": connection_id.to_string(),
            "X-ClientType": CLIENT_TYPE,
            "X-ClientIsMobile": "false",
        }
    })
}

/// Routes transport lifecycle events of one connection to its activity
/// tracker, the log and the reporter.
struct ConnectionListener {
    user_index: usize,
    connection_id: ConnectionId,
    activity: Arc<ActivityTracker>,
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn Reporter>,
}

impl TransportListener for ConnectionListener {
    fn on_connecting(&self) {
        tracing::debug!(
            user_index = self.user_index,
            connection_id = %self.connection_id,
            "Connecting"
        );
    }

    fn on_connected(&self) {
        tracing::info!(
            user_index = self.user_index,
            connection_id = %self.connection_id,
            "Connected"
        );
        self.reporter
            .progress(&format!("{} connected", user_label(self.user_index)));
    }

    fn on_message(&self, message: &ServerMessage) {
        self.activity
            .record_message(self.clock.now_millis(), message.is_ping());
    }

    fn on_error(&self, error: &TransportError) {
        tracing::error!(
            user_index = self.user_index,
            connection_id = %self.connection_id,
            "Connection error: {}",
            error
        );
        self.reporter
            .progress(&format!(
            "{} connection error: {}",
            user_label(self.user_index),
            error
        ));
    }

    fn on_closed(&self, code: Option<u16>, reason: &str) {
        tracing::info!(
            user_index = self.user_index,
            connection_id = %self.connection_id,
            code = ?code,
            "Connection closed: {}",
            reason
        );
    }
}

/// Opens real-time connections
#[derive(Clone)]
pub struct ConnectionFactory {
    options: TransportOptions,
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn Reporter>,
}

impl ConnectionFactory {
    pub fn new(options: TransportOptions, clock: Arc<dyn Clock>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            options,
            clock,
            reporter,
        }
    }

    /// Open a connection for one simulated user.
    ///
    /// The transport starts connecting immediately in the background; this
    /// call does not wait for the handshake.
    ///
    /// # Returns
    ///
    /// The new handle (join gate `AwaitingToken`, zeroed timestamps) and the
    /// client it owns, for issuing operations.
    ///
    /// # Errors
    ///
    /// `TransportError::InvalidRequest` if the transport cannot be
    /// constructed for `endpoint`; no handle is created in that case.
    pub fn open(
        &self,
        endpoint: Url,
        token: &SessionToken,
        connection_id: ConnectionId,
        user_index: usize,
        display_name: String,
    ) -> Result<(ConnectionHandle, Arc<GraphqlWsClient>), TransportError> {
        let activity = Arc::new(ActivityTracker::new());
        let listener = Arc::new(ConnectionListener {
            user_index,
            connection_id,
            activity: activity.clone(),
            clock: self.clock.clone(),
            reporter: self.reporter.clone(),
        });

        let client = Arc::new(GraphqlWsClient::connect(
            endpoint,
            connection_params(token, connection_id),
            self.options.clone(),
            listener,
        )?);

        let handle = ConnectionHandle::new(
            user_index,
            connection_id,
            display_name,
            activity,
            client.clone(),
        );
        Ok((handle, client))
    }
}
