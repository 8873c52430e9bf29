//! UseCase: 参加確定 (current-user ストリームを購読し、参加ミューテーションを 1 回だけ発行する)
//!
//! ### どのような状況を想定しているか
//! - 正常系：authToken を受信して参加確定に成功
//! - 異常系：参加ミューテーションの失敗（ゲートは戻さない）
//! - エッジケース：authToken なし・空、2 回目以降の authToken

use std::sync::Arc;

use serde_json::Value;

use crate::{
    domain::{JoinConfirmer, JoinGate},
    error::JoinConfirmationError,
    report::{Reporter, user_label},
    transport::{CurrentUser, OperationEvent, Subscription},
};

/// Result of handling one current-user result
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    /// No usable token, or the gate was already confirmed
    Ignored,
    /// The join mutation succeeded
    Confirmed(CurrentUser),
    /// The join mutation failed; the gate stays confirmed
    Failed(JoinConfirmationError),
}

/// 参加確定のユースケース (接続ごとに 1 つ)
pub struct JoinOrchestrator {
    user_index: usize,
    gate: Arc<JoinGate>,
    confirmer: Arc<dyn JoinConfirmer>,
    reporter: Arc<dyn Reporter>,
}

impl JoinOrchestrator {
    pub fn new(
        user_index: usize,
        gate: Arc<JoinGate>,
        confirmer: Arc<dyn JoinConfirmer>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            user_index,
            gate,
            confirmer,
            reporter,
        }
    }

    /// current-user ストリームの 1 件を処理する
    ///
    /// # Arguments
    ///
    /// * `result` - `next` フレームのペイロード (`{ "data": { "user_current": [...] } }`)
    pub async fn handle_result(&self, result: &Value) -> JoinOutcome {
        let Some(user) = CurrentUser::from_result(result) else {
            return JoinOutcome::Ignored;
        };
        let Some(auth_token) = user.auth_token() else {
            return JoinOutcome::Ignored;
        };
        if !self.gate.try_confirm() {
            return JoinOutcome::Ignored;
        }

        tracing::debug!(user_index = self.user_index, "Auth token received, joining");

        match self.confirmer.confirm_join(auth_token).await {
            Ok(()) => {
                tracing::info!(
                    user_index = self.user_index,
                    user_id = ?user.user_id,
                    "Joined meeting"
                );
                self.reporter.progress(&format!(
                    "{} joined: {} ({}) as {}",
                    user_label(self.user_index),
                    user.name.as_deref().unwrap_or("-"),
                    user.user_id.as_deref().unwrap_or("-"),
                    user.role.as_deref().unwrap_or("-"),
                ));
                JoinOutcome::Confirmed(user)
            }
            Err(e) => {
                tracing::error!(user_index = self.user_index, "Join failed: {}", e);
                self.reporter
                    .progress(&format!("{} join failed: {}", user_label(self.user_index), e));
                JoinOutcome::Failed(e)
            }
        }
    }

    /// Consume the current-user subscription until it ends.
    pub async fn run(self, mut subscription: Subscription) {
        while let Some(event) = subscription.next().await {
            match event {
                OperationEvent::Next(result) => {
                    self.handle_result(&result).await;
                }
                OperationEvent::Error(e) => {
                    tracing::error!(
                        user_index = self.user_index,
                        "Current-user subscription failed: {}",
                        e.message()
                    );
                    self.reporter.progress(&format!(
                        "{} subscription error: {}",
                        user_label(self.user_index),
                        e.message()
                    ));
                    break;
                }
                OperationEvent::Complete => break,
            }
        }
    }
}
