//! Error types for the load simulator.
//!
//! Each stage of a participant's setup pipeline has its own error type.
//! Only `ValidationError` aborts a run; every other error is scoped to one
//! simulated user and never affects its siblings.

use thiserror::Error;

/// Bad command arguments, detected before any pipeline starts
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The join URL is not an absolute http(s) URL
    #[error("Invalid join URL '{0}': must be a valid HTTP/HTTPS URL")]
    InvalidJoinUrl(String),

    /// The participant count is not a positive integer
    #[error("Invalid number of users '{0}': it must be a positive integer")]
    InvalidParticipantCount(String),

    /// A required self-signed join parameter was not given
    #[error("Missing required parameter: --{0}")]
    MissingParameter(&'static str),
}

/// Failure of the HTTP join handshake for one simulated user
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The join URL could not be built or parsed
    #[error("Invalid join URL: {0}")]
    InvalidJoinUrl(String),

    /// The HTTP request itself failed
    #[error("Join request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("Join request failed with status {0}")]
    Status(u16),

    /// The redirect chain ended on a URL without a session token
    #[error("No session token found in final URL after redirect")]
    MissingSessionToken,
}

/// Failure reported by the real-time transport
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The connection request could not be constructed
    #[error("Invalid connection request: {0}")]
    InvalidRequest(String),

    /// Connecting to the endpoint failed
    #[error("Connection error: {0}")]
    Connect(String),

    /// The server violated the graphql-transport-ws protocol
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Every retry attempt failed
    #[error("Connection failed after {0} retry attempts")]
    RetriesExhausted(u32),

    /// The connection closed while an operation was in flight
    #[error("Connection closed")]
    Closed,

    /// The connection was terminated locally
    #[error("Connection terminated")]
    Terminated,
}

/// Failure of the join-confirmation mutation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JoinConfirmationError {
    /// The mutation could not be delivered or its result never arrived
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server rejected the mutation
    #[error("Join mutation rejected: {0}")]
    Rejected(String),
}

/// Failure while setting up one simulated user's connection
#[derive(Debug, Error)]
pub enum SetupError {
    /// The real-time endpoint could not be derived from the join URL
    #[error("Failed to extract GraphQL WebSocket URL from '{0}'")]
    Endpoint(String),

    /// The HTTP handshake failed
    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    /// The transport could not be constructed
    #[error(transparent)]
    Transport(#[from] TransportError),
}
