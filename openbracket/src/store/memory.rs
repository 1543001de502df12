//! In-memory store used by tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::engine::models::{
    Bracket, MatchId, Participant, ParticipantId, Tournament, TournamentId, TournamentStatus,
};

use super::{BracketStore, StoreError, StoreResult};

#[derive(Default)]
struct Inner {
    tournaments: HashMap<TournamentId, Tournament>,
    participants: HashMap<TournamentId, Vec<Participant>>,
    brackets: HashMap<TournamentId, Bracket>,
    match_index: HashMap<MatchId, TournamentId>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BracketStore for MemoryStore {
    async fn insert_tournament(&self, tournament: &Tournament) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.tournaments.insert(tournament.id, tournament.clone());
        inner.participants.entry(tournament.id).or_default();
        Ok(())
    }

    async fn get_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        Ok(self.inner.read().await.tournaments.get(&id).cloned())
    }

    async fn update_tournament(&self, tournament: &Tournament) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .tournaments
            .get_mut(&tournament.id)
            .ok_or(StoreError::TournamentNotFound)?;
        *entry = tournament.clone();
        Ok(())
    }

    async fn delete_tournament(&self, id: TournamentId) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.tournaments.remove(&id).is_none() {
            return Err(StoreError::TournamentNotFound);
        }
        inner.participants.remove(&id);
        if let Some(bracket) = inner.brackets.remove(&id) {
            let stale: Vec<MatchId> = bracket.matches().map(|m| m.id).collect();
            for match_id in stale {
                inner.match_index.remove(&match_id);
            }
        }
        Ok(())
    }

    async fn list_tournaments(
        &self,
        status: Option<TournamentStatus>,
    ) -> StoreResult<Vec<Tournament>> {
        let inner = self.inner.read().await;
        let mut out: Vec<Tournament> = inner
            .tournaments
            .values()
            .filter(|t| status.is_none_or(|s| t.status == s))
            .cloned()
            .collect();
        out.sort_by_key(|t| t.created_at);
        Ok(out)
    }

    async fn update_tournament_status(
        &self,
        id: TournamentId,
        status: TournamentStatus,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let tournament = inner
            .tournaments
            .get_mut(&id)
            .ok_or(StoreError::TournamentNotFound)?;
        tournament.status = status;
        tournament.updated_at = Utc::now();
        Ok(())
    }

    async fn add_participant(&self, participant: &Participant) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.tournaments.contains_key(&participant.tournament_id) {
            return Err(StoreError::TournamentNotFound);
        }
        inner
            .participants
            .entry(participant.tournament_id)
            .or_default()
            .push(participant.clone());
        Ok(())
    }

    async fn remove_participant(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let list = inner
            .participants
            .get_mut(&tournament_id)
            .ok_or(StoreError::TournamentNotFound)?;
        list.retain(|p| p.id != participant_id);
        Ok(())
    }

    async fn update_seeds(
        &self,
        tournament_id: TournamentId,
        seeds: &[(ParticipantId, u32)],
    ) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let list = inner
            .participants
            .get_mut(&tournament_id)
            .ok_or(StoreError::TournamentNotFound)?;
        for (id, seed) in seeds {
            if let Some(p) = list.iter_mut().find(|p| p.id == *id) {
                p.seed = *seed;
            }
        }
        list.sort_by_key(|p| p.seed);
        Ok(())
    }

    async fn participants(&self, tournament_id: TournamentId) -> StoreResult<Vec<Participant>> {
        let inner = self.inner.read().await;
        let mut list = inner
            .participants
            .get(&tournament_id)
            .ok_or(StoreError::TournamentNotFound)?
            .clone();
        list.sort_by_key(|p| p.seed);
        Ok(list)
    }

    async fn get_bracket(&self, tournament_id: TournamentId) -> StoreResult<Option<Bracket>> {
        let inner = self.inner.read().await;
        if !inner.tournaments.contains_key(&tournament_id) {
            return Err(StoreError::TournamentNotFound);
        }
        Ok(inner.brackets.get(&tournament_id).cloned())
    }

    async fn publish_bracket(
        &self,
        bracket: &Bracket,
        expected_version: Option<u64>,
        status: TournamentStatus,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.tournaments.contains_key(&bracket.tournament_id) {
            return Err(StoreError::TournamentNotFound);
        }
        let found = inner
            .brackets
            .get(&bracket.tournament_id)
            .map(|b| b.version);
        if found != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                found,
            });
        }

        if let Some(old) = inner.brackets.get(&bracket.tournament_id) {
            let stale: Vec<MatchId> = old.matches().map(|m| m.id).collect();
            for id in stale {
                inner.match_index.remove(&id);
            }
        }
        for m in bracket.matches() {
            inner.match_index.insert(m.id, bracket.tournament_id);
        }
        inner.brackets.insert(bracket.tournament_id, bracket.clone());

        let tournament = inner
            .tournaments
            .get_mut(&bracket.tournament_id)
            .ok_or(StoreError::TournamentNotFound)?;
        tournament.status = status;
        tournament.updated_at = Utc::now();
        Ok(())
    }

    async fn find_tournament_by_match(
        &self,
        match_id: MatchId,
    ) -> StoreResult<Option<TournamentId>> {
        Ok(self.inner.read().await.match_index.get(&match_id).copied())
    }
}
