//! Tournament lifecycle and registration management.
//!
//! Everything that happens before (and around) the bracket itself: creating
//! tournaments, opening registration, entrants joining and leaving, and
//! cancellation. Seeds follow registration order and stay contiguous when
//! someone withdraws.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use crate::engine::models::{
    Participant, ParticipantId, ParticipantRef, TeamSize, Tournament, TournamentFormat,
    TournamentId, TournamentStatus,
};
use crate::engine::{DEFAULT_LOCK_TIMEOUT, TournamentLocks};
use crate::store::{BracketStore, StoreError};

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("registration is not open (tournament is {0})")]
    RegistrationClosed(TournamentStatus),

    #[error("tournament is full ({max} participants)")]
    TournamentFull { max: u32 },

    #[error("already registered in this tournament")]
    AlreadyRegistered,

    #[error("not registered in this tournament")]
    NotRegistered,

    #[error("cannot move tournament from {from} to {to}")]
    InvalidTransition {
        from: TournamentStatus,
        to: TournamentStatus,
    },

    #[error("max participants must be at least 2 and cover the current roster")]
    CapacityTooSmall,

    #[error("tournament is {0}, no longer editable")]
    NotEditable(TournamentStatus),

    /// Lock acquisition timed out; the operation is safe to retry.
    #[error("timed out waiting for tournament {0} lock")]
    ConcurrencyTimeout(TournamentId),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

pub type RosterResult<T> = Result<T, RosterError>;

/// Inputs for creating a tournament. Everything else is derived.
#[derive(Debug, Clone)]
pub struct NewTournament {
    pub name: String,
    pub description: Option<String>,
    pub game: Option<String>,
    pub format: TournamentFormat,
    pub team_size: TeamSize,
    pub max_participants: u32,
    pub allow_draws: bool,
    pub prize_pool: Option<String>,
}

/// Field updates for an existing tournament; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateTournament {
    pub name: Option<String>,
    pub description: Option<String>,
    pub game: Option<String>,
    pub format: Option<TournamentFormat>,
    pub team_size: Option<TeamSize>,
    pub max_participants: Option<u32>,
    pub allow_draws: Option<bool>,
    pub prize_pool: Option<String>,
}

pub struct RosterManager {
    store: Arc<dyn BracketStore>,
    locks: Arc<TournamentLocks>,
}

impl RosterManager {
    pub fn new(store: Arc<dyn BracketStore>) -> Self {
        Self {
            store,
            locks: Arc::new(TournamentLocks::new(DEFAULT_LOCK_TIMEOUT)),
        }
    }

    /// Serialize through a shared lock registry. Pass the bracket engine's
    /// registry so joins cannot interleave with bracket generation.
    pub fn with_locks(mut self, locks: Arc<TournamentLocks>) -> Self {
        self.locks = locks;
        self
    }

    async fn lock_tournament(&self, id: TournamentId) -> RosterResult<OwnedMutexGuard<()>> {
        self.locks
            .acquire(id)
            .await
            .ok_or(RosterError::ConcurrencyTimeout(id))
    }

    async fn require_tournament(&self, id: TournamentId) -> RosterResult<Tournament> {
        self.store
            .get_tournament(id)
            .await?
            .ok_or(RosterError::TournamentNotFound(id))
    }

    async fn transition(
        &self,
        tournament: &Tournament,
        to: TournamentStatus,
    ) -> RosterResult<()> {
        if !tournament.status.can_transition_to(to) {
            return Err(RosterError::InvalidTransition {
                from: tournament.status,
                to,
            });
        }
        self.store.update_tournament_status(tournament.id, to).await?;
        Ok(())
    }

    /// Create a tournament in draft.
    pub async fn create_tournament(&self, new: NewTournament) -> RosterResult<Tournament> {
        if new.max_participants < 2 {
            return Err(RosterError::CapacityTooSmall);
        }
        let now = Utc::now();
        let tournament = Tournament {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            game: new.game,
            format: new.format,
            team_size: new.team_size,
            max_participants: new.max_participants,
            allow_draws: new.allow_draws,
            status: TournamentStatus::Draft,
            prize_pool: new.prize_pool,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_tournament(&tournament).await?;
        log::info!("created tournament {} ({})", tournament.id, tournament.name);
        Ok(tournament)
    }

    pub async fn open_registration(&self, id: TournamentId) -> RosterResult<Tournament> {
        let _guard = self.lock_tournament(id).await?;
        let tournament = self.require_tournament(id).await?;
        self.transition(&tournament, TournamentStatus::Registration)
            .await?;
        self.require_tournament(id).await
    }

    pub async fn cancel(&self, id: TournamentId) -> RosterResult<Tournament> {
        let guard = self.lock_tournament(id).await?;
        let tournament = self.require_tournament(id).await?;
        self.transition(&tournament, TournamentStatus::Canceled)
            .await?;
        log::info!("canceled tournament {id}");
        let tournament = self.require_tournament(id).await?;

        drop(guard);
        self.locks.evict(id).await;
        Ok(tournament)
    }

    /// Edit tournament fields. Permitted until the bracket is generated.
    pub async fn update_tournament(
        &self,
        id: TournamentId,
        update: UpdateTournament,
    ) -> RosterResult<Tournament> {
        let _guard = self.lock_tournament(id).await?;
        let mut tournament = self.require_tournament(id).await?;
        match tournament.status {
            TournamentStatus::Draft | TournamentStatus::Registration => {}
            status => return Err(RosterError::NotEditable(status)),
        }

        if let Some(max) = update.max_participants {
            let registered = self.store.participants(id).await?.len() as u32;
            if max < 2 || max < registered {
                return Err(RosterError::CapacityTooSmall);
            }
            tournament.max_participants = max;
        }
        if let Some(name) = update.name {
            tournament.name = name;
        }
        if let Some(description) = update.description {
            tournament.description = Some(description);
        }
        if let Some(game) = update.game {
            tournament.game = Some(game);
        }
        if let Some(format) = update.format {
            tournament.format = format;
        }
        if let Some(team_size) = update.team_size {
            tournament.team_size = team_size;
        }
        if let Some(allow_draws) = update.allow_draws {
            tournament.allow_draws = allow_draws;
        }
        if let Some(prize_pool) = update.prize_pool {
            tournament.prize_pool = Some(prize_pool);
        }
        tournament.updated_at = Utc::now();

        self.store.update_tournament(&tournament).await?;
        Ok(tournament)
    }

    /// Delete a tournament along with its roster and bracket.
    pub async fn delete(&self, id: TournamentId) -> RosterResult<()> {
        let guard = self.lock_tournament(id).await?;
        self.require_tournament(id).await?;
        self.store.delete_tournament(id).await?;
        log::info!("deleted tournament {id}");

        drop(guard);
        self.locks.evict(id).await;
        Ok(())
    }

    /// Register an entrant. Seeds follow registration order.
    pub async fn join(
        &self,
        id: TournamentId,
        reference: ParticipantRef,
        display_name: String,
    ) -> RosterResult<Participant> {
        let _guard = self.lock_tournament(id).await?;
        let tournament = self.require_tournament(id).await?;
        if tournament.status != TournamentStatus::Registration {
            return Err(RosterError::RegistrationClosed(tournament.status));
        }

        let existing = self.store.participants(id).await?;
        if existing.len() as u32 >= tournament.max_participants {
            return Err(RosterError::TournamentFull {
                max: tournament.max_participants,
            });
        }
        if existing.iter().any(|p| p.reference == reference) {
            return Err(RosterError::AlreadyRegistered);
        }

        let participant = Participant {
            id: Uuid::new_v4(),
            tournament_id: id,
            reference,
            display_name,
            seed: existing.len() as u32 + 1,
            registered_at: Utc::now(),
        };
        self.store.add_participant(&participant).await?;
        Ok(participant)
    }

    /// Withdraw an entrant and close the seed gap.
    pub async fn leave(&self, id: TournamentId, participant_id: ParticipantId) -> RosterResult<()> {
        let _guard = self.lock_tournament(id).await?;
        let tournament = self.require_tournament(id).await?;
        if tournament.status != TournamentStatus::Registration {
            return Err(RosterError::RegistrationClosed(tournament.status));
        }

        let existing = self.store.participants(id).await?;
        if !existing.iter().any(|p| p.id == participant_id) {
            return Err(RosterError::NotRegistered);
        }
        self.store.remove_participant(id, participant_id).await?;

        let reseeded: Vec<(ParticipantId, u32)> = existing
            .iter()
            .filter(|p| p.id != participant_id)
            .enumerate()
            .map(|(i, p)| (p.id, i as u32 + 1))
            .collect();
        self.store.update_seeds(id, &reseeded).await?;
        Ok(())
    }

    pub async fn get(&self, id: TournamentId) -> RosterResult<Tournament> {
        self.require_tournament(id).await
    }

    pub async fn list(&self, status: Option<TournamentStatus>) -> RosterResult<Vec<Tournament>> {
        Ok(self.store.list_tournaments(status).await?)
    }

    pub async fn participants(&self, id: TournamentId) -> RosterResult<Vec<Participant>> {
        Ok(self.store.participants(id).await?)
    }
}
