//! Join requests: one per simulated user.

use std::collections::BTreeMap;

use url::Url;

use super::display_name::generate_display_name;

/// Parameters of a self-signed join (the join URL is built and signed locally)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfSignedJoin {
    /// Base URL of the conferencing server (e.g. `https://bbb.example.com`)
    pub host: Url,
    pub meeting_id: String,
    pub password: String,
    /// Shared secret of the server's API
    pub secret: String,
    /// Extra query parameters flattened into the join call
    pub extra_attributes: BTreeMap<String, String>,
}

/// How the join URL of a request is obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinMode {
    /// An already valid join URL supplied from outside
    ExternalUrl(Url),
    /// A join URL constructed and signed from raw credentials
    SelfSigned(SelfSignedJoin),
}

/// Join request of one simulated user. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    user_index: usize,
    display_name: String,
    mode: JoinMode,
}

impl JoinRequest {
    /// Create a request with a freshly generated display name
    pub fn new(user_index: usize, mode: JoinMode) -> Self {
        let display_name = generate_display_name(&mut rand::rng());
        Self::with_display_name(user_index, display_name, mode)
    }

    /// Create a request with a caller-supplied display name
    pub fn with_display_name(user_index: usize, display_name: String, mode: JoinMode) -> Self {
        Self {
            user_index,
            display_name,
            mode,
        }
    }

    /// Build `count` requests sharing the same mode, indexed from 0
    pub fn batch(count: usize, mode: &JoinMode) -> Vec<Self> {
        (0..count).map(|i| Self::new(i, mode.clone())).collect()
    }

    pub fn user_index(&self) -> usize {
        self.user_index
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn mode(&self) -> &JoinMode {
        &self.mode
    }
}
