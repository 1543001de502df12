//! Bracket engine error taxonomy.

use super::models::{MatchId, TournamentId, TournamentStatus};
use crate::store::StoreError;
use thiserror::Error;

/// Errors surfaced by bracket engine operations
#[derive(Debug, Error)]
pub enum BracketError {
    #[error("tournament is {actual}, expected {expected}")]
    InvalidState {
        expected: TournamentStatus,
        actual: TournamentStatus,
    },

    #[error("insufficient participants: need {needed}, have {current}")]
    InsufficientParticipants { needed: usize, current: usize },

    /// Result submitted for a match whose slots are unresolved, or one that
    /// is already completed.
    #[error("match is not ready for a result")]
    MatchNotReady,

    #[error("drawn result not permitted: scores must differ")]
    AmbiguousResult,

    #[error("bracket already started: a result has been recorded")]
    BracketAlreadyStarted,

    /// Lock acquisition timed out; the operation is safe to retry.
    #[error("timed out waiting for tournament {0} lock")]
    ConcurrencyTimeout(TournamentId),

    #[error("tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("no bracket generated for tournament {0}")]
    BracketNotFound(TournamentId),

    /// Transient storage failure that persisted through the retry budget.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] StoreError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

pub type BracketResult<T> = Result<T, BracketError>;
