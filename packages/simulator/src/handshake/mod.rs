//! HTTP join handshake.
//!
//! - `signing`: canonical query string and checksum of self-signed join URLs
//! - `acquirer`: fetches the session token by following the join redirects

mod acquirer;
pub mod signing;

pub use acquirer::{SESSION_TOKEN_PARAM, SessionAcquirer, SessionGrant, session_token_from_url};
