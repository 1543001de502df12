//! Persistence behind the bracket engine.
//!
//! The engine talks to a [`BracketStore`] trait object so the same logic
//! runs against the in-memory store (tests, local development) and the
//! Postgres store (production).

use async_trait::async_trait;
use thiserror::Error;

use crate::engine::models::{
    Bracket, MatchId, Participant, ParticipantId, Tournament, TournamentId, TournamentStatus,
};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgBracketStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("tournament not found")]
    TournamentNotFound,
    #[error("bracket version conflict: expected {expected:?}, found {found:?}")]
    VersionConflict {
        expected: Option<u64>,
        found: Option<u64>,
    },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt stored value: {0}")]
    Decode(String),
}

impl StoreError {
    /// Transient failures are worth retrying; logic errors are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Database(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage operations the engine and roster manager need.
///
/// `publish_bracket` must be atomic: readers see either the previous
/// revision or the new one in full, never a partial write. The
/// `expected_version` guard rejects publishes racing a newer revision.
#[async_trait]
pub trait BracketStore: Send + Sync {
    async fn insert_tournament(&self, tournament: &Tournament) -> StoreResult<()>;

    async fn get_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>>;

    /// Rewrite a tournament's fields. Status changes go through
    /// [`BracketStore::update_tournament_status`] or
    /// [`BracketStore::publish_bracket`].
    async fn update_tournament(&self, tournament: &Tournament) -> StoreResult<()>;

    /// Remove a tournament along with its participants and bracket.
    async fn delete_tournament(&self, id: TournamentId) -> StoreResult<()>;

    async fn list_tournaments(
        &self,
        status: Option<TournamentStatus>,
    ) -> StoreResult<Vec<Tournament>>;

    async fn update_tournament_status(
        &self,
        id: TournamentId,
        status: TournamentStatus,
    ) -> StoreResult<()>;

    async fn add_participant(&self, participant: &Participant) -> StoreResult<()>;

    async fn remove_participant(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
    ) -> StoreResult<()>;

    /// Rewrite seeds after a withdrawal so they stay contiguous.
    async fn update_seeds(
        &self,
        tournament_id: TournamentId,
        seeds: &[(ParticipantId, u32)],
    ) -> StoreResult<()>;

    /// Participants ordered by seed.
    async fn participants(&self, tournament_id: TournamentId) -> StoreResult<Vec<Participant>>;

    async fn get_bracket(&self, tournament_id: TournamentId) -> StoreResult<Option<Bracket>>;

    /// Atomically replace the stored bracket and the tournament status.
    ///
    /// `expected_version` is the version currently stored (`None` when no
    /// bracket exists yet); a mismatch fails with
    /// [`StoreError::VersionConflict`] and leaves everything untouched.
    async fn publish_bracket(
        &self,
        bracket: &Bracket,
        expected_version: Option<u64>,
        status: TournamentStatus,
    ) -> StoreResult<()>;

    /// Resolve which tournament a match belongs to.
    async fn find_tournament_by_match(
        &self,
        match_id: MatchId,
    ) -> StoreResult<Option<TournamentId>>;
}
