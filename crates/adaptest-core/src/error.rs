//! Engine error types.
//!
//! Every failure the CAT core can produce is a synchronous, non-retryable
//! validation error. Operations are all-or-nothing: when one of these is
//! returned, session state is unchanged. Numerical edge cases (zero
//! information, near-zero curvature) are handled by fallback branches in
//! the estimator and never surface as errors.

use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the adaptest core and its orchestrating layers.
#[derive(Debug, Error)]
pub enum CatError {
    /// A bank file carried an unknown item-model tag. Cannot occur for
    /// items from a validated bank; checked at every parse dispatch point.
    #[error("unsupported item model: {0}")]
    UnsupportedModel(String),

    /// The answer payload was malformed or did not match the item's model.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A mutating call was made on a finished session.
    #[error("test is already finished")]
    TestAlreadyFinished,

    /// Unknown session identifier. Raised by the session store in the
    /// orchestrator layer, never by the core itself.
    #[error("session not found: {0}")]
    SessionNotFound(Uuid),

    /// `record_play` was called for an item whose domain has no replays.
    #[error("item '{0}' does not support replays")]
    ReplayNotSupported(String),

    /// The replay cap for an item was already reached.
    #[error("max plays reached for item '{item_id}' (limit {max_plays})")]
    PlayLimitExceeded { item_id: String, max_plays: u32 },

    /// A report was requested before the session finished.
    #[error("report requested before the test finished")]
    ReportNotReady,
}

impl CatError {
    /// Returns `true` if this error reflects session lifecycle state
    /// rather than a bad payload (useful for HTTP status mapping in an
    /// orchestrator).
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            CatError::TestAlreadyFinished | CatError::ReportNotReady
        )
    }
}
