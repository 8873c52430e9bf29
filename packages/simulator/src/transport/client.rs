//! graphql-transport-ws client.
//!
//! A [`GraphqlWsClient`] owns one background driver task. The driver connects
//! eagerly, performs the `connection_init` / `connection_ack` handshake,
//! multiplexes operations over the socket, keeps the connection alive with
//! pings and reconnects (re-subscribing every active operation) until the
//! retry budget is spent. Lifecycle events are reported to a
//! [`TransportListener`].

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use serde_json::Value;
use tokio::{
    net::TcpStream,
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{Instant, interval_at},
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        self,
        client::IntoClientRequest,
        http::{HeaderValue, header::SEC_WEBSOCKET_PROTOCOL},
        protocol::{CloseFrame, Message, frame::coding::CloseCode},
    },
};
use url::Url;

use crate::error::TransportError;

use super::protocol::{ClientMessage, OperationPayload, SUBPROTOCOL, ServerMessage};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection behavior of a [`GraphqlWsClient`]
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Reconnect attempts after a failure before giving up
    pub retry_attempts: u32,
    /// Delay before the first retry; doubled on every further retry
    pub retry_base_delay: Duration,
    /// Upper bound of the random delay added to every retry
    pub retry_max_jitter: Duration,
    /// Interval of client-initiated pings once acknowledged
    pub keep_alive: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_base_delay: Duration::from_secs(1),
            retry_max_jitter: Duration::from_millis(3000),
            keep_alive: Duration::from_secs(30),
        }
    }
}

impl TransportOptions {
    /// Wait before retry number `retries` (0-based)
    fn retry_delay(&self, retries: u32) -> Duration {
        let base = self.retry_base_delay * 2u32.saturating_pow(retries);
        let jitter_ms = rand::rng().random_range(0..=self.retry_max_jitter.as_millis() as u64);
        base + Duration::from_millis(jitter_ms)
    }
}

/// Lifecycle callbacks of a connection. Every method defaults to a no-op.
pub trait TransportListener: Send + Sync {
    /// A connection attempt is starting
    fn on_connecting(&self) {}
    /// The server acknowledged `connection_init`
    fn on_connected(&self) {}
    /// A valid graphql-transport-ws frame arrived
    fn on_message(&self, _message: &ServerMessage) {}
    /// A connection attempt or an established connection failed
    fn on_error(&self, _error: &TransportError) {}
    /// The socket closed
    fn on_closed(&self, _code: Option<u16>, _reason: &str) {}
}

/// Failure of one operation
#[derive(Debug, Clone, PartialEq)]
pub enum OperationError {
    /// The server answered with an `error` frame (list of GraphQL errors)
    GraphQl(Value),
    /// The connection failed before the operation finished
    Transport(TransportError),
}

impl OperationError {
    /// Human-readable summary (GraphQL error messages joined with `; `)
    pub fn message(&self) -> String {
        match self {
            OperationError::GraphQl(errors) => errors
                .as_array()
                .map(|errors| {
                    errors
                        .iter()
                        .map(|e| {
                            e.get("message")
                                .and_then(Value::as_str)
                                .map(str::to_string)
                                .unwrap_or_else(|| e.to_string())
                        })
                        .collect::<Vec<_>>()
                        .join("; ")
                })
                .unwrap_or_else(|| errors.to_string()),
            OperationError::Transport(e) => e.to_string(),
        }
    }
}

/// Event delivered to the consumer of an operation
#[derive(Debug, Clone, PartialEq)]
pub enum OperationEvent {
    /// One execution result (`{ "data": ..., "errors": ... }`)
    Next(Value),
    /// The operation failed; no further events follow
    Error(OperationError),
    /// The operation finished; no further events follow
    Complete,
}

/// Stream of events of one operation
#[derive(Debug)]
pub struct Subscription {
    id: String,
    events: mpsc::UnboundedReceiver<OperationEvent>,
}

impl Subscription {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Next event, or `None` once the client is gone
    pub async fn next(&mut self) -> Option<OperationEvent> {
        self.events.recv().await
    }
}

enum Command {
    Subscribe {
        id: String,
        payload: OperationPayload,
        events: mpsc::UnboundedSender<OperationEvent>,
    },
    Unsubscribe {
        id: String,
    },
}

/// Handle to a graphql-transport-ws connection
pub struct GraphqlWsClient {
    commands: mpsc::UnboundedSender<Command>,
    shutdown: watch::Sender<bool>,
    next_id: AtomicU64,
    driver: JoinHandle<()>,
}

impl GraphqlWsClient {
    /// Construct the client and start connecting immediately.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - `ws://` or `wss://` URL of the GraphQL endpoint
    /// * `connection_params` - Payload of the `connection_init` frame
    /// * `options` - Retry and keep-alive behavior
    /// * `listener` - Receives lifecycle events
    ///
    /// # Errors
    ///
    /// `TransportError::InvalidRequest` if no WebSocket request can be built
    /// for `endpoint`. Connection failures are reported to the listener
    /// instead, since they are retried in the background.
    pub fn connect(
        endpoint: Url,
        connection_params: Value,
        options: TransportOptions,
        listener: Arc<dyn TransportListener>,
    ) -> Result<Self, TransportError> {
        build_request(&endpoint)?;

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let driver = Driver {
            endpoint,
            connection_params,
            options,
            listener,
            commands: commands_rx,
            shutdown: shutdown_rx,
            operations: HashMap::new(),
        };
        let driver = tokio::spawn(driver.run());

        Ok(Self {
            commands: commands_tx,
            shutdown: shutdown_tx,
            next_id: AtomicU64::new(1),
            driver,
        })
    }

    /// Start an operation and receive its events.
    ///
    /// The operation is sent as soon as the connection is acknowledged and
    /// re-sent after every reconnect until it completes.
    pub fn subscribe(&self, payload: OperationPayload) -> Result<Subscription, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        self.commands
            .send(Command::Subscribe {
                id: id.clone(),
                payload,
                events: events_tx,
            })
            .map_err(|_| TransportError::Closed)?;
        Ok(Subscription {
            id,
            events: events_rx,
        })
    }

    /// Stop an operation started with [`GraphqlWsClient::subscribe`].
    pub fn unsubscribe(&self, subscription: &Subscription) {
        let _ = self.commands.send(Command::Unsubscribe {
            id: subscription.id.clone(),
        });
    }

    /// Run a single-result operation (query or mutation).
    ///
    /// Resolves with the first `next` payload.
    pub async fn execute(&self, payload: OperationPayload) -> Result<Value, OperationError> {
        let mut subscription = self.subscribe(payload).map_err(OperationError::Transport)?;
        let result = match subscription.next().await {
            Some(OperationEvent::Next(value)) => Ok(value),
            Some(OperationEvent::Complete) => Ok(Value::Null),
            Some(OperationEvent::Error(e)) => Err(e),
            None => Err(OperationError::Transport(TransportError::Closed)),
        };
        self.unsubscribe(&subscription);
        result
    }

    /// Close the socket and stop reconnecting. Idempotent.
    pub fn terminate(&self) {
        self.shutdown.send_replace(true);
    }

    /// Whether the driver task has exited
    pub fn is_closed(&self) -> bool {
        self.driver.is_finished()
    }
}

impl Drop for GraphqlWsClient {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Build the WebSocket upgrade request for `endpoint`.
fn build_request(endpoint: &Url) -> Result<tungstenite::handshake::client::Request, TransportError> {
    if !matches!(endpoint.scheme(), "ws" | "wss") {
        return Err(TransportError::InvalidRequest(format!(
            "unsupported scheme '{}' in {}",
            endpoint.scheme(),
            endpoint
        )));
    }
    let mut request = endpoint
        .as_str()
        .into_client_request()
        .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
    request
        .headers_mut()
        .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(SUBPROTOCOL));
    Ok(request)
}

async fn open(endpoint: &Url) -> Result<WsStream, TransportError> {
    let request = build_request(endpoint)?;
    let (ws, _response) = connect_async(request)
        .await
        .map_err(|e| TransportError::Connect(e.to_string()))?;
    Ok(ws)
}

/// Why a connected session ended
enum SessionEnd {
    Terminated,
    Lost(TransportError),
}

struct ActiveOperation {
    payload: OperationPayload,
    events: mpsc::UnboundedSender<OperationEvent>,
}

struct Driver {
    endpoint: Url,
    connection_params: Value,
    options: TransportOptions,
    listener: Arc<dyn TransportListener>,
    commands: mpsc::UnboundedReceiver<Command>,
    shutdown: watch::Receiver<bool>,
    operations: HashMap<String, ActiveOperation>,
}

impl Driver {
    async fn run(mut self) {
        let mut retries: u32 = 0;

        loop {
            self.listener.on_connecting();

            let attempt = tokio::select! {
                _ = wait_for_shutdown(&mut self.shutdown) => break,
                attempt = open(&self.endpoint) => attempt,
            };

            match attempt {
                Ok(ws) => match self.run_session(ws, &mut retries).await {
                    SessionEnd::Terminated => break,
                    SessionEnd::Lost(error) => self.listener.on_error(&error),
                },
                Err(error) => self.listener.on_error(&error),
            }

            if retries >= self.options.retry_attempts {
                let error = TransportError::RetriesExhausted(retries);
                tracing::warn!(endpoint = %self.endpoint, "{}", error);
                self.listener.on_error(&error);
                self.fail_operations(error);
                return;
            }

            let delay = self.options.retry_delay(retries);
            retries += 1;
            tracing::debug!(
                endpoint = %self.endpoint,
                "Reconnecting in {:?} (attempt {}/{})",
                delay,
                retries,
                self.options.retry_attempts
            );

            tokio::select! {
                _ = wait_for_shutdown(&mut self.shutdown) => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.fail_operations(TransportError::Terminated);
    }

    async fn run_session(&mut self, ws: WsStream, retries: &mut u32) -> SessionEnd {
        let (mut write, mut read) = ws.split();
        let mut acknowledged = false;

        let init = ClientMessage::ConnectionInit {
            payload: Some(self.connection_params.clone()),
        };
        if let Err(e) = send_frame(&mut write, &init).await {
            return SessionEnd::Lost(e);
        }

        let period = self.options.keep_alive;
        let mut keep_alive = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = wait_for_shutdown(&mut self.shutdown) => {
                    let close = Message::Close(Some(CloseFrame {
                        code: CloseCode::Normal,
                        reason: "Normal Closure".into(),
                    }));
                    let _ = write.send(close).await;
                    self.listener.on_closed(Some(1000), "Normal Closure");
                    return SessionEnd::Terminated;
                }
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        let _ = write.send(Message::Close(None)).await;
                        self.listener.on_closed(Some(1000), "Client dropped");
                        return SessionEnd::Terminated;
                    };
                    let frame = self.apply_command(command, acknowledged);
                    if let Some(frame) = frame
                        && let Err(e) = send_frame(&mut write, &frame).await
                    {
                        return SessionEnd::Lost(e);
                    }
                }
                _ = keep_alive.tick(), if acknowledged => {
                    if let Err(e) = send_frame(&mut write, &ClientMessage::Ping { payload: None }).await {
                        return SessionEnd::Lost(e);
                    }
                }
                frame = read.next() => {
                    let text = match frame {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(close))) => {
                            let (code, reason) = close
                                .map(|f| (Some(u16::from(f.code)), f.reason.as_str().to_string()))
                                .unwrap_or((None, String::new()));
                            self.listener.on_closed(code, &reason);
                            return SessionEnd::Lost(TransportError::Closed);
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            self.listener.on_closed(None, "");
                            return SessionEnd::Lost(TransportError::Connect(e.to_string()));
                        }
                        None => {
                            self.listener.on_closed(None, "");
                            return SessionEnd::Lost(TransportError::Closed);
                        }
                    };

                    let message = match serde_json::from_str::<ServerMessage>(text.as_str()) {
                        Ok(message) => message,
                        Err(e) => {
                            let _ = write.send(Message::Close(Some(CloseFrame {
                                code: CloseCode::Library(4400),
                                reason: "Invalid message received".into(),
                            }))).await;
                            self.listener.on_closed(Some(4400), "Invalid message received");
                            return SessionEnd::Lost(TransportError::Protocol(e.to_string()));
                        }
                    };
                    self.listener.on_message(&message);

                    let replies = match self.handle_message(message, &mut acknowledged, retries) {
                        Ok(replies) => replies,
                        Err(e) => return SessionEnd::Lost(e),
                    };
                    for reply in replies {
                        if let Err(e) = send_frame(&mut write, &reply).await {
                            return SessionEnd::Lost(e);
                        }
                    }
                }
            }
        }
    }

    /// Register or drop an operation; returns the frame to send, if any.
    fn apply_command(&mut self, command: Command, acknowledged: bool) -> Option<ClientMessage> {
        match command {
            Command::Subscribe {
                id,
                payload,
                events,
            } => {
                let frame = acknowledged.then(|| ClientMessage::Subscribe {
                    id: id.clone(),
                    payload: payload.clone(),
                });
                self.operations
                    .insert(id, ActiveOperation { payload, events });
                frame
            }
            Command::Unsubscribe { id } => self
                .operations
                .remove(&id)
                .and_then(|_| acknowledged.then_some(ClientMessage::Complete { id })),
        }
    }

    /// React to a server frame; returns the frames to send back.
    fn handle_message(
        &mut self,
        message: ServerMessage,
        acknowledged: &mut bool,
        retries: &mut u32,
    ) -> Result<Vec<ClientMessage>, TransportError> {
        match message {
            ServerMessage::ConnectionAck { .. } => {
                *acknowledged = true;
                *retries = 0;
                self.listener.on_connected();
                Ok(self
                    .operations
                    .iter()
                    .map(|(id, op)| ClientMessage::Subscribe {
                        id: id.clone(),
                        payload: op.payload.clone(),
                    })
                    .collect())
            }
            ServerMessage::Ping { .. } => Ok(vec![ClientMessage::Pong { payload: None }]),
            ServerMessage::Pong { .. } => Ok(Vec::new()),
            message if !*acknowledged => Err(TransportError::Protocol(format!(
                "unexpected {:?} before connection_ack",
                message
            ))),
            ServerMessage::Next { id, payload } => {
                let delivered = self
                    .operations
                    .get(&id)
                    .map(|op| op.events.send(OperationEvent::Next(payload)).is_ok());
                match delivered {
                    // Consumer went away: stop the operation on the server too.
                    Some(false) => {
                        self.operations.remove(&id);
                        Ok(vec![ClientMessage::Complete { id }])
                    }
                    _ => Ok(Vec::new()),
                }
            }
            ServerMessage::Error { id, payload } => {
                if let Some(op) = self.operations.remove(&id) {
                    let _ = op
                        .events
                        .send(OperationEvent::Error(OperationError::GraphQl(payload)));
                }
                Ok(Vec::new())
            }
            ServerMessage::Complete { id } => {
                if let Some(op) = self.operations.remove(&id) {
                    let _ = op.events.send(OperationEvent::Complete);
                }
                Ok(Vec::new())
            }
        }
    }

    fn fail_operations(&mut self, error: TransportError) {
        // Operations requested while no session was up are still queued.
        while let Ok(command) = self.commands.try_recv() {
            self.apply_command(command, false);
        }
        self.commands.close();
        for (_, op) in self.operations.drain() {
            let _ = op
                .events
                .send(OperationEvent::Error(OperationError::Transport(error.clone())));
        }
    }
}

async fn send_frame<S>(write: &mut S, frame: &ClientMessage) -> Result<(), TransportError>
where
    S: futures_util::Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let json = serde_json::to_string(frame).map_err(|e| TransportError::Protocol(e.to_string()))?;
    write
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| TransportError::Connect(e.to_string()))
}

/// Resolves once termination is requested or the client handle is dropped.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use axum::{
        Router,
        extract::{
            State,
            ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        },
        response::Response,
        routing::get,
    };
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct RecordingListener {
        errors: Mutex<Vec<TransportError>>,
    }

    impl TransportListener for RecordingListener {
        fn on_error(&self, error: &TransportError) {
            self.errors.lock().unwrap().push(error.clone());
        }
    }

    /// graphql-transport-ws server that drops the first `drop_first` sockets
    /// as soon as it has acknowledged them and received a subscription.
    /// Later sockets ping the client and answer subscriptions with their
    /// 0-based socket number.
    #[derive(Default)]
    struct FlakyServer {
        drop_first: usize,
        sockets: AtomicUsize,
        subscribed_ids: Mutex<Vec<String>>,
        pongs: AtomicUsize,
    }

    async fn spawn_flaky_server(drop_first: usize) -> (Arc<FlakyServer>, Url) {
        let state = Arc::new(FlakyServer {
            drop_first,
            ..FlakyServer::default()
        });
        let app = Router::new()
            .route("/graphql", get(flaky_handler))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let endpoint = Url::parse(&format!("ws://{}/graphql", addr)).unwrap();
        (state, endpoint)
    }

    async fn flaky_handler(State(state): State<Arc<FlakyServer>>, ws: WebSocketUpgrade) -> Response {
        ws.protocols([SUBPROTOCOL])
            .on_upgrade(move |socket| serve_flaky(socket, state))
    }

    async fn send_server_frame(socket: &mut WebSocket, frame: &ServerMessage) -> bool {
        let text = serde_json::to_string(frame).unwrap();
        socket.send(WsMessage::Text(text.into())).await.is_ok()
    }

    async fn serve_flaky(mut socket: WebSocket, state: Arc<FlakyServer>) {
        let number = state.sockets.fetch_add(1, Ordering::SeqCst);
        let dropping = number < state.drop_first;

        while let Some(Ok(message)) = socket.recv().await {
            let WsMessage::Text(text) = message else {
                continue;
            };
            let frame: ClientMessage = serde_json::from_str(text.as_str()).unwrap();
            match frame {
                ClientMessage::ConnectionInit { .. } => {
                    let ack = ServerMessage::ConnectionAck { payload: None };
                    if !send_server_frame(&mut socket, &ack).await {
                        return;
                    }
                    let ping = ServerMessage::Ping { payload: None };
                    if !dropping && !send_server_frame(&mut socket, &ping).await {
                        return;
                    }
                }
                ClientMessage::Subscribe { id, .. } => {
                    state.subscribed_ids.lock().unwrap().push(id.clone());
                    if dropping {
                        return;
                    }
                    let next = ServerMessage::Next {
                        id,
                        payload: json!({ "data": { "socket": number } }),
                    };
                    if !send_server_frame(&mut socket, &next).await {
                        return;
                    }
                }
                ClientMessage::Pong { .. } => {
                    state.pongs.fetch_add(1, Ordering::SeqCst);
                }
                _ => {}
            }
        }
    }

    fn fast_options(retry_attempts: u32) -> TransportOptions {
        TransportOptions {
            retry_attempts,
            retry_base_delay: Duration::from_millis(1),
            retry_max_jitter: Duration::ZERO,
            keep_alive: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_default_options() {
        // テスト項目: デフォルト設定はリトライ 3 回・キープアライブ 30 秒
        // given (前提条件):

        // when (操作):
        let options = TransportOptions::default();

        // then (期待する結果):
        assert_eq!(options.retry_attempts, 3);
        assert_eq!(options.keep_alive, Duration::from_secs(30));
    }

    #[test]
    fn test_retry_delay_grows_exponentially() {
        // テスト項目: リトライ待ち時間は指数的に増加する
        // given (前提条件):
        let options = TransportOptions {
            retry_base_delay: Duration::from_secs(1),
            retry_max_jitter: Duration::ZERO,
            ..TransportOptions::default()
        };

        // when (操作):
        let delays: Vec<Duration> = (0..3).map(|r| options.retry_delay(r)).collect();

        // then (期待する結果):
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
    }

    #[test]
    fn test_build_request_rejects_http_scheme() {
        // テスト項目: ws / wss 以外のスキームではリクエストを構築できない
        // given (前提条件):
        let endpoint = Url::parse("https://bbb.example.com/graphql").unwrap();

        // when (操作):
        let result = build_request(&endpoint);

        // then (期待する結果):
        assert!(matches!(result, Err(TransportError::InvalidRequest(_))));
    }

    #[test]
    fn test_build_request_sets_subprotocol() {
        // テスト項目: リクエストに graphql-transport-ws サブプロトコルが設定される
        // given (前提条件):
        let endpoint = Url::parse("wss://bbb.example.com/graphql").unwrap();

        // when (操作):
        let request = build_request(&endpoint).unwrap();

        // then (期待する結果):
        assert_eq!(
            request.headers().get(SEC_WEBSOCKET_PROTOCOL).unwrap(),
            "graphql-transport-ws"
        );
    }

    #[test]
    fn test_operation_error_message_joins_graphql_errors() {
        // テスト項目: GraphQL エラーのメッセージが連結される
        // given (前提条件):
        let error = OperationError::GraphQl(json!([
            { "message": "invalid token" },
            { "message": "not allowed" }
        ]));

        // when (操作):
        let message = error.message();

        // then (期待する結果):
        assert_eq!(message, "invalid token; not allowed");
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_endpoint() {
        // テスト項目: 不正なエンドポイントではクライアントの構築自体が失敗する
        // given (前提条件):
        let endpoint = Url::parse("http://bbb.example.com/graphql").unwrap();
        let listener = Arc::new(RecordingListener::default());

        // when (操作):
        let result = GraphqlWsClient::connect(endpoint, json!({}), fast_options(0), listener);

        // then (期待する結果):
        assert!(matches!(result, Err(TransportError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_retries_exhausted_fails_pending_operations() {
        // テスト項目: 接続できないままリトライを使い切ると保留中の操作が失敗する
        // given (前提条件): 何も待ち受けていないポート
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let endpoint = Url::parse(&format!("ws://127.0.0.1:{}/graphql", port)).unwrap();
        let events = Arc::new(RecordingListener::default());
        let client =
            GraphqlWsClient::connect(endpoint, json!({}), fast_options(2), events.clone()).unwrap();

        // when (操作):
        let result = client
            .execute(OperationPayload::new("mutation { noop }"))
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(OperationError::Transport(TransportError::RetriesExhausted(2)))
        );
        let errors = events.errors.lock().unwrap();
        assert_eq!(
            errors
                .iter()
                .filter(|e| matches!(e, TransportError::Connect(_)))
                .count(),
            3
        );
        assert_eq!(errors.last(), Some(&TransportError::RetriesExhausted(2)));
        drop(errors);
        let stopped = tokio::time::timeout(Duration::from_secs(1), async {
            while !client.is_closed() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(stopped.is_ok());
    }

    #[tokio::test]
    async fn test_subscription_resumes_after_reconnect() {
        // テスト項目: 接続が切れても再接続後に購読が再送され、結果を受け取れる
        // given (前提条件): 最初のソケットは購読を受け取った直後に切断される
        let (server, endpoint) = spawn_flaky_server(1).await;
        let events = Arc::new(RecordingListener::default());
        let client =
            GraphqlWsClient::connect(endpoint, json!({}), fast_options(1), events.clone()).unwrap();

        // when (操作):
        let mut subscription = client
            .subscribe(OperationPayload::new("subscription { socket }"))
            .unwrap();
        let event = tokio::time::timeout(Duration::from_secs(5), subscription.next())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            event,
            Some(OperationEvent::Next(json!({ "data": { "socket": 1 } })))
        );
        assert_eq!(server.sockets.load(Ordering::SeqCst), 2);
        let id = subscription.id().to_string();
        assert_eq!(*server.subscribed_ids.lock().unwrap(), vec![id.clone(), id]);
        client.terminate();
    }

    #[tokio::test]
    async fn test_server_ping_is_answered_with_pong() {
        // テスト項目: サーバーからの ping に pong で応答する
        // given (前提条件): 接続確立直後にサーバーが ping を送る
        let (server, endpoint) = spawn_flaky_server(0).await;
        let listener = Arc::new(RecordingListener::default());
        let client = GraphqlWsClient::connect(endpoint, json!({}), fast_options(1), listener).unwrap();

        // when (操作):
        let answered = tokio::time::timeout(Duration::from_secs(5), async {
            while server.pongs.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;

        // then (期待する結果):
        assert!(answered.is_ok());
        assert_eq!(server.pongs.load(Ordering::SeqCst), 1);
        client.terminate();
    }

    #[tokio::test]
    async fn test_acknowledged_connection_resets_retry_budget() {
        // テスト項目: connection_ack を受け取るたびにリトライ回数がリセットされる
        // given (前提条件): リトライ 1 回で、確立済みの接続が 2 回続けて切断される
        let (server, endpoint) = spawn_flaky_server(2).await;
        let events = Arc::new(RecordingListener::default());
        let client =
            GraphqlWsClient::connect(endpoint, json!({}), fast_options(1), events.clone()).unwrap();

        // when (操作):
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            client.execute(OperationPayload::new("subscription { socket }")),
        )
        .await
        .unwrap();

        // then (期待する結果):
        assert_eq!(result, Ok(json!({ "data": { "socket": 2 } })));
        assert_eq!(server.sockets.load(Ordering::SeqCst), 3);
        assert!(
            !events
                .errors
                .lock()
                .unwrap()
                .iter()
                .any(|e| matches!(e, TransportError::RetriesExhausted(_)))
        );
        client.terminate();
    }
}
