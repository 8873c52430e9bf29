//! Traits at the boundary between the use cases and the real-time transport.
//!
//! The use cases depend on these traits only; `crate::transport` provides the
//! graphql-transport-ws implementation.

use async_trait::async_trait;

use crate::error::JoinConfirmationError;

/// Owned connection that can be torn down
pub trait RealtimeTransport: Send + Sync {
    /// Close the connection and stop every background task it runs.
    ///
    /// Must be safe to call more than once.
    fn terminate(&self);
}

/// Issues the join-confirmation mutation for one connection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JoinConfirmer: Send + Sync {
    /// Confirm that the participant owning `auth_token` joined the meeting
    async fn confirm_join(&self, auth_token: &str) -> Result<(), JoinConfirmationError>;
}
