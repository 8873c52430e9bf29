//! Domain model of the load simulator.
//!
//! Value objects, per-connection state and the traits the use cases depend
//! on. Concrete transports live in `crate::transport`.

mod activity;
mod display_name;
mod handle;
mod join_gate;
mod join_request;
mod transport;
mod value_object;

pub use activity::ActivityTracker;
pub use display_name::generate_display_name;
pub use handle::ConnectionHandle;
pub use join_gate::{JoinGate, JoinState};
pub use join_request::{JoinMode, JoinRequest, SelfSignedJoin};
pub use transport::{JoinConfirmer, RealtimeTransport};
pub use value_object::{ConnectionId, SessionToken};

#[cfg(test)]
pub use transport::MockJoinConfirmer;
