//! Load simulator for BigBlueButton-style conferencing servers.
//!
//! Joins many simulated participants to one meeting, keeps their GraphQL
//! WebSocket connections alive and tears them all down on demand.

// layers
pub mod domain;
pub mod usecase;

// adapters
pub mod connection;
pub mod handshake;
pub mod resolver;
pub mod transport;

pub mod error;
pub mod report;
pub mod runner;
pub mod signal;
