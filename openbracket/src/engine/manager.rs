//! Bracket engine: the public operations over tournaments and brackets.
//!
//! Mutating operations serialize per tournament through a keyed mutex with
//! a bounded acquisition timeout. Each publish builds the next bracket
//! revision as a value and swaps it into storage atomically, so readers
//! never observe a half-written bracket.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedMutexGuard, broadcast};
use tokio::time::sleep;

use crate::store::{BracketStore, StoreError};

use super::builder::{build_bracket, propagate_completion};
use super::errors::{BracketError, BracketResult};
use super::events::{BracketEvent, EVENT_CHANNEL_CAPACITY};
use super::locks::{DEFAULT_LOCK_TIMEOUT, TournamentLocks};
use super::models::{
    Bracket, MatchId, MatchStatus, Score, Tournament, TournamentFormat, TournamentId,
    TournamentStatus,
};

/// Retry budget for transient storage failures on publish.
const PUBLISH_RETRIES: u32 = 3;
const PUBLISH_BACKOFF: Duration = Duration::from_millis(50);

pub struct BracketEngine {
    store: Arc<dyn BracketStore>,
    locks: Arc<TournamentLocks>,
    events: broadcast::Sender<BracketEvent>,
}

impl BracketEngine {
    pub fn new(store: Arc<dyn BracketStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            locks: Arc::new(TournamentLocks::new(DEFAULT_LOCK_TIMEOUT)),
            events,
        }
    }

    /// Serialize through a shared lock registry. The roster manager must
    /// use the same registry so roster changes and bracket publishes on one
    /// tournament never interleave.
    pub fn with_locks(mut self, locks: Arc<TournamentLocks>) -> Self {
        self.locks = locks;
        self
    }

    /// Subscribe to engine events. Slow receivers lag; they never block the
    /// engine.
    pub fn subscribe(&self) -> broadcast::Receiver<BracketEvent> {
        self.events.subscribe()
    }

    pub fn store(&self) -> &Arc<dyn BracketStore> {
        &self.store
    }

    async fn lock_tournament(&self, id: TournamentId) -> BracketResult<OwnedMutexGuard<()>> {
        self.locks
            .acquire(id)
            .await
            .ok_or(BracketError::ConcurrencyTimeout(id))
    }

    fn emit(&self, event: BracketEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    async fn require_tournament(&self, id: TournamentId) -> BracketResult<Tournament> {
        self.store
            .get_tournament(id)
            .await?
            .ok_or(BracketError::TournamentNotFound(id))
    }

    /// Store the bracket revision, retrying transient failures with
    /// exponential backoff before giving up as unavailable.
    async fn publish_with_retry(
        &self,
        bracket: &Bracket,
        expected_version: Option<u64>,
        status: TournamentStatus,
    ) -> BracketResult<()> {
        let mut backoff = PUBLISH_BACKOFF;
        let mut attempt = 0;
        loop {
            match self
                .store
                .publish_bracket(bracket, expected_version, status)
                .await
            {
                Ok(()) => {
                    self.emit(BracketEvent::BracketPublished {
                        tournament_id: bracket.tournament_id,
                        version: bracket.version,
                    });
                    self.emit(BracketEvent::StatusChanged {
                        tournament_id: bracket.tournament_id,
                        status,
                    });
                    return Ok(());
                }
                Err(err) if err.is_transient() && attempt < PUBLISH_RETRIES => {
                    attempt += 1;
                    log::warn!(
                        "publish for tournament {} failed (attempt {attempt}): {err}",
                        bracket.tournament_id
                    );
                    sleep(backoff).await;
                    backoff *= 2;
                }
                Err(err) if err.is_transient() => {
                    return Err(BracketError::StorageUnavailable(err));
                }
                Err(err) => return Err(BracketError::Store(err)),
            }
        }
    }

    /// Generate the bracket for a tournament in registration, freezing the
    /// roster and locking the tournament.
    pub async fn generate(&self, tournament_id: TournamentId) -> BracketResult<Bracket> {
        let _guard = self.lock_tournament(tournament_id).await?;

        let tournament = self.require_tournament(tournament_id).await?;
        if tournament.status != TournamentStatus::Registration {
            return Err(BracketError::InvalidState {
                expected: TournamentStatus::Registration,
                actual: tournament.status,
            });
        }

        self.build_and_publish(&tournament).await
    }

    /// Rebuild the bracket from the current roster. Permitted until the
    /// first decisive result is recorded.
    pub async fn regenerate(&self, tournament_id: TournamentId) -> BracketResult<Bracket> {
        let _guard = self.lock_tournament(tournament_id).await?;

        let tournament = self.require_tournament(tournament_id).await?;
        match tournament.status {
            TournamentStatus::Registration | TournamentStatus::Locked => {}
            actual => {
                return Err(BracketError::InvalidState {
                    expected: TournamentStatus::Locked,
                    actual,
                });
            }
        }
        if let Some(existing) = self.store.get_bracket(tournament_id).await? {
            if existing.has_reported_results() {
                return Err(BracketError::BracketAlreadyStarted);
            }
        }

        self.build_and_publish(&tournament).await
    }

    async fn build_and_publish(&self, tournament: &Tournament) -> BracketResult<Bracket> {
        let participants = self.store.participants(tournament.id).await?;
        let mut bracket = build_bracket(tournament, &participants)?;

        let expected = self
            .store
            .get_bracket(tournament.id)
            .await?
            .map(|b| b.version);
        bracket.version = expected.unwrap_or(0) + 1;

        self.publish_with_retry(&bracket, expected, TournamentStatus::Locked)
            .await?;
        log::info!(
            "tournament {}: published bracket v{} ({} participants, {})",
            tournament.id,
            bracket.version,
            participants.len(),
            tournament.format
        );
        Ok(bracket)
    }

    /// Record the score of a match, advance the winner (and loser, in
    /// double elimination) and publish the next bracket revision.
    pub async fn record_result(
        &self,
        match_id: MatchId,
        score1: Score,
        score2: Score,
    ) -> BracketResult<Bracket> {
        let tournament_id = self
            .store
            .find_tournament_by_match(match_id)
            .await?
            .ok_or(BracketError::MatchNotFound(match_id))?;

        let guard = self.lock_tournament(tournament_id).await?;

        let tournament = self.require_tournament(tournament_id).await?;
        match tournament.status {
            TournamentStatus::Locked | TournamentStatus::InProgress => {}
            actual => {
                return Err(BracketError::InvalidState {
                    expected: TournamentStatus::InProgress,
                    actual,
                });
            }
        }

        let mut bracket = self
            .store
            .get_bracket(tournament_id)
            .await?
            .ok_or(BracketError::BracketNotFound(tournament_id))?;
        let expected = bracket.version;

        let allow_draws =
            tournament.allow_draws && tournament.format == TournamentFormat::RoundRobin;
        let (stage, round_number, match_number, winner) = {
            let m = bracket
                .find_match_mut(match_id)
                .ok_or(BracketError::MatchNotFound(match_id))?;
            if !m.status.accepts_result() || !m.slots_resolved() {
                return Err(BracketError::MatchNotReady);
            }
            if score1 == score2 && !allow_draws {
                return Err(BracketError::AmbiguousResult);
            }
            m.score1 = Some(score1);
            m.score2 = Some(score2);
            m.winner = match score1.cmp(&score2) {
                std::cmp::Ordering::Greater => m.participant1,
                std::cmp::Ordering::Less => m.participant2,
                std::cmp::Ordering::Equal => None,
            };
            m.status = MatchStatus::Completed;
            (m.stage, m.round_number, m.match_number, m.winner)
        };

        propagate_completion(&mut bracket, stage, round_number, match_number);

        let next_status = if bracket.is_complete() {
            TournamentStatus::Completed
        } else {
            TournamentStatus::InProgress
        };

        bracket.version = expected + 1;
        self.publish_with_retry(&bracket, Some(expected), next_status)
            .await?;
        self.emit(BracketEvent::MatchCompleted {
            tournament_id,
            match_id,
            winner,
        });
        log::debug!(
            "tournament {tournament_id}: match {match_id} recorded {score1}-{score2}, bracket v{}",
            bracket.version
        );

        if next_status == TournamentStatus::Completed {
            drop(guard);
            self.locks.evict(tournament_id).await;
        }
        Ok(bracket)
    }

    /// Read the current bracket. Takes no lock; publishes are atomic so a
    /// read always sees a complete revision.
    pub async fn get_bracket(&self, tournament_id: TournamentId) -> BracketResult<Bracket> {
        match self.store.get_bracket(tournament_id).await {
            Ok(Some(bracket)) => Ok(bracket),
            Ok(None) => Err(BracketError::BracketNotFound(tournament_id)),
            Err(StoreError::TournamentNotFound) => {
                Err(BracketError::TournamentNotFound(tournament_id))
            }
            Err(err) => Err(err.into()),
        }
    }
}
