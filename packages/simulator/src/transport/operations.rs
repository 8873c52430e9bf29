//! GraphQL operations the simulator issues.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    domain::{JoinConfirmer, RealtimeTransport},
    error::JoinConfirmationError,
};

use super::{
    client::{GraphqlWsClient, OperationError},
    protocol::OperationPayload,
};

/// Client type announced in the connection headers and the join mutation
pub const CLIENT_TYPE: &str = "HTML5";

pub const CURRENT_USER_SUBSCRIPTION: &str = r#"subscription userCurrentSubscription {
  user_current {
    authToken
    userId
    name
    role
    joined
  }
}"#;

pub const USER_JOIN_MUTATION: &str = r#"mutation UserJoin($authToken: String!, $clientType: String!, $clientIsMobile: Boolean!) {
  userJoinMeeting(
    authToken: $authToken,
    clientType: $clientType,
    clientIsMobile: $clientIsMobile
  )
}"#;

/// Subscribe payload of the current-user stream
pub fn current_user_subscription() -> OperationPayload {
    OperationPayload::new(CURRENT_USER_SUBSCRIPTION)
}

/// Subscribe payload of the join-confirmation mutation
pub fn user_join_mutation(auth_token: &str) -> OperationPayload {
    OperationPayload::new(USER_JOIN_MUTATION).with_variables(json!({
        "authToken": auth_token,
        "clientType": CLIENT_TYPE,
        "clientIsMobile": false,
    }))
}

/// One row of `user_current`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub joined: Option<bool>,
}

impl CurrentUser {
    /// Read `data.user_current[0]` from a `next` payload.
    pub fn from_result(result: &Value) -> Option<Self> {
        let row = result.get("data")?.get("user_current")?.get(0)?;
        serde_json::from_value(row.clone()).ok()
    }

    /// The auth token, if present and non-empty
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref().filter(|t| !t.is_empty())
    }
}

impl RealtimeTransport for GraphqlWsClient {
    fn terminate(&self) {
        GraphqlWsClient::terminate(self);
    }
}

#[async_trait]
impl JoinConfirmer for GraphqlWsClient {
    async fn confirm_join(&self, auth_token: &str) -> Result<(), JoinConfirmationError> {
        match self.execute(user_join_mutation(auth_token)).await {
            Ok(result) => match result.get("errors") {
                Some(errors) if !errors.is_null() => Err(JoinConfirmationError::Rejected(
                    OperationError::GraphQl(errors.clone()).message(),
                )),
                _ => Ok(()),
            },
            Err(OperationError::GraphQl(errors)) => Err(JoinConfirmationError::Rejected(
                OperationError::GraphQl(errors).message(),
            )),
            Err(OperationError::Transport(e)) => Err(e.into()),
        }
    }
}
