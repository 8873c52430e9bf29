//! graphql-transport-ws frames.
//!
//! Every frame is a JSON text message tagged by its `type` field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// WebSocket subprotocol negotiated with the server
pub const SUBPROTOCOL: &str = "graphql-transport-ws";

/// Payload of a `subscribe` frame (queries, mutations and subscriptions alike)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationPayload {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
    #[serde(
        default,
        rename = "operationName",
        skip_serializing_if = "Option::is_none"
    )]
    pub operation_name: Option<String>,
}

impl OperationPayload {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: None,
            operation_name: None,
        }
    }

    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }
}

/// Frames sent by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    ConnectionInit {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    Ping {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    Pong {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    Subscribe {
        id: String,
        payload: OperationPayload,
    },
    Complete {
        id: String,
    },
}

/// Frames sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    ConnectionAck {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    Ping {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    Pong {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    /// One execution result of operation `id`
    Next { id: String, payload: Value },
    /// Operation `id` failed; `payload` is a list of GraphQL errors
    Error { id: String, payload: Value },
    /// Operation `id` finished
    Complete { id: String },
}

impl ServerMessage {
    /// Whether this is a protocol-level keep-alive ping
    pub fn is_ping(&self) -> bool {
        matches!(self, ServerMessage::Ping { .. })
    }

    /// Operation id the frame refers to, if any
    pub fn operation_id(&self) -> Option<&str> {
        match self {
            ServerMessage::Next { id, .. }
            | ServerMessage::Error { id, .. }
            | ServerMessage::Complete { id } => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_connection_init_serialization() {
        // テスト項目: connection_init がヘッダ付きペイロードとしてシリアライズされる
        // given (前提条件):
        let msg = ClientMessage::ConnectionInit {
            payload: Some(json!({ "headers": { "X-ClientType": "HTML5" } })),
        };

        // when (操作):
        let value = serde_json::to_value(&msg).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            json!({
                "type": "connection_init",
                "payload": { "headers": { "X-ClientType": "HTML5" } }
            })
        );
    }

    #[test]
    fn test_subscribe_serialization() {
        // テスト項目: subscribe が id と operationName を含めてシリアライズされる
        // given (前提条件):
        let mut payload = OperationPayload::new("mutation { x }").with_variables(json!({ "a": 1 }));
        payload.operation_name = Some("X".to_string());
        let msg = ClientMessage::Subscribe {
            id: "1".to_string(),
            payload,
        };

        // when (操作):
        let value = serde_json::to_value(&msg).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            json!({
                "type": "subscribe",
                "id": "1",
                "payload": {
                    "query": "mutation { x }",
                    "variables": { "a": 1 },
                    "operationName": "X"
                }
            })
        );
    }

    #[test]
    fn test_ping_without_payload_omits_field() {
        // テスト項目: ペイロードのない ping は type のみになる
        // given (前提条件):
        let msg = ClientMessage::Ping { payload: None };

        // when (操作):
        let text = serde_json::to_string(&msg).unwrap();

        // then (期待する結果):
        assert_eq!(text, r#"{"type":"ping"}"#);
    }

    #[test]
    fn test_server_messages_deserialize() {
        // テスト項目: サーバから届く各フレームがデシリアライズできる
        // given (前提条件):
        let frames = [
            r#"{"type":"connection_ack"}"#,
            r#"{"type":"ping"}"#,
            r#"{"type":"pong","payload":{"ts":1}}"#,
            r#"{"type":"next","id":"1","payload":{"data":{}}}"#,
            r#"{"type":"error","id":"2","payload":[{"message":"boom"}]}"#,
            r#"{"type":"complete","id":"3"}"#,
        ];

        // when (操作):
        let parsed: Vec<ServerMessage> = frames
            .iter()
            .map(|f| serde_json::from_str(f).unwrap())
            .collect();

        // then (期待する結果):
        assert_eq!(parsed[0], ServerMessage::ConnectionAck { payload: None });
        assert!(parsed[1].is_ping());
        assert!(!parsed[2].is_ping());
        assert_eq!(parsed[3].operation_id(), Some("1"));
        assert_eq!(parsed[4].operation_id(), Some("2"));
        assert_eq!(parsed[5], ServerMessage::Complete { id: "3".to_string() });
    }

    #[test]
    fn test_unknown_frame_is_rejected() {
        // テスト項目: 未知の type を持つフレームはエラーになる
        // given (前提条件):
        let frame = r#"{"type":"ka"}"#;

        // when (操作):
        let result = serde_json::from_str::<ServerMessage>(frame);

        // then (期待する結果):
        assert!(result.is_err());
    }
}
