//! Exactly-once guard for the join confirmation.

use std::sync::atomic::{AtomicBool, Ordering};

/// State of a connection's join sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinState {
    /// No auth token has been consumed yet
    AwaitingToken,
    /// An auth token was consumed and the join mutation was issued
    Confirmed,
}

/// Two-state machine `AwaitingToken -> Confirmed`.
///
/// The transition happens at most once per gate and is never reversed, even
/// when the join mutation that follows it fails.
#[derive(Debug, Default)]
pub struct JoinGate {
    confirmed: AtomicBool,
}

impl JoinGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt the `AwaitingToken -> Confirmed` transition.
    ///
    /// # Returns
    ///
    /// `true` only for the single caller that performed the transition
    pub fn try_confirm(&self) -> bool {
        self.confirmed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn state(&self) -> JoinState {
        if self.confirmed.load(Ordering::Acquire) {
            JoinState::Confirmed
        } else {
            JoinState::AwaitingToken
        }
    }
}
