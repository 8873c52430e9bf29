//! Session token acquisition over HTTP.

use url::Url;

use crate::{
    domain::{JoinMode, JoinRequest, SessionToken},
    error::HandshakeError,
};

use super::signing::{join_params, signed_join_url};

/// Query parameter carrying the session token on the final redirected URL
pub const SESSION_TOKEN_PARAM: &str = "sessionToken";

/// Result of a successful handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    /// Join URL the handshake started from
    pub join_url: Url,
    /// Token extracted from the final URL
    pub token: SessionToken,
}

/// Performs the HTTP join handshake for both join modes.
///
/// Self-signed requests are turned into a signed join URL first; from then on
/// both modes share the same fetch path.
#[derive(Debug, Clone, Default)]
pub struct SessionAcquirer {
    http: reqwest::Client,
}

impl SessionAcquirer {
    /// Create an acquirer with a default HTTP client (follows up to 10 redirects)
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the join URL of a request, signing it in self-signed mode.
    pub fn join_url(request: &JoinRequest) -> Result<Url, HandshakeError> {
        match request.mode() {
            JoinMode::ExternalUrl(url) => Ok(url.clone()),
            JoinMode::SelfSigned(join) => {
                let params = join_params(
                    request.display_name(),
                    &join.meeting_id,
                    &join.password,
                    &join.extra_attributes,
                );
                signed_join_url(&join.host, &params, &join.secret)
            }
        }
    }

    /// Run the handshake for one simulated user.
    ///
    /// # Errors
    ///
    /// * `HandshakeError::Status` - the server answered with a non-success status
    /// * `HandshakeError::MissingSessionToken` - the final URL has no session token
    /// * `HandshakeError::Request` - the request failed at the HTTP level
    pub async fn acquire(&self, request: &JoinRequest) -> Result<SessionGrant, HandshakeError> {
        let join_url = Self::join_url(request)?;
        let token = self.fetch_session_token(&join_url).await?;
        Ok(SessionGrant { join_url, token })
    }

    /// GET the join URL following redirects and read the token off the final URL.
    pub async fn fetch_session_token(&self, join_url: &Url) -> Result<SessionToken, HandshakeError> {
        let response = self.http.get(join_url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HandshakeError::Status(status.as_u16()));
        }

        tracing::debug!(final_url = %response.url(), "Join redirects followed");
        session_token_from_url(response.url()).ok_or(HandshakeError::MissingSessionToken)
    }
}

/// Extract the session token from a URL's query parameters.
pub fn session_token_from_url(url: &Url) -> Option<SessionToken> {
    url.query_pairs()
        .find(|(key, _)| key == SESSION_TOKEN_PARAM)
        .and_then(|(_, value)| SessionToken::new(value.into_owned()))
}
