//! Real-time transport: a `graphql-transport-ws` client over tokio-tungstenite.

mod client;
mod operations;
pub mod protocol;

pub use client::{
    GraphqlWsClient, OperationError, OperationEvent, Subscription, TransportListener,
    TransportOptions,
};
pub use operations::{
    CLIENT_TYPE, CURRENT_USER_SUBSCRIPTION, CurrentUser, USER_JOIN_MUTATION,
    current_user_subscription, user_join_mutation,
};
pub use protocol::{ClientMessage, OperationPayload, ServerMessage};
