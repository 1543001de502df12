//! PostgreSQL-backed store.
//!
//! Enum fields are persisted as their wire strings. The bracket itself is
//! stored as flat match rows plus a `bracket_version` column on the
//! tournament; `publish_bracket` swaps the whole set inside one transaction
//! with the version row locked.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::engine::models::{
    Bracket, Match, MatchId, MatchStatus, Participant, ParticipantId, ParticipantRef, Stage,
    TeamSize, Tournament, TournamentFormat, TournamentId, TournamentStatus,
};

use super::{BracketStore, StoreError, StoreResult};

pub struct PgBracketStore {
    pool: PgPool,
}

impl PgBracketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn decode_tournament(row: &PgRow) -> StoreResult<Tournament> {
    let format: String = row.get("format");
    let team_size: String = row.get("team_size");
    let status: String = row.get("status");
    Ok(Tournament {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        game: row.get("game"),
        format: TournamentFormat::parse(&format)
            .ok_or_else(|| StoreError::Decode(format!("tournament format {format:?}")))?,
        team_size: TeamSize::parse(&team_size)
            .ok_or_else(|| StoreError::Decode(format!("team size {team_size:?}")))?,
        max_participants: row.get::<i32, _>("max_participants") as u32,
        allow_draws: row.get("allow_draws"),
        status: TournamentStatus::parse(&status)
            .ok_or_else(|| StoreError::Decode(format!("tournament status {status:?}")))?,
        prize_pool: row.get("prize_pool"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    })
}

fn decode_participant(row: &PgRow) -> StoreResult<Participant> {
    let kind: String = row.get("kind");
    let reference_id: Uuid = row.get("reference_id");
    let reference = match kind.as_str() {
        "user" => ParticipantRef::User(reference_id),
        "team" => ParticipantRef::Team(reference_id),
        other => return Err(StoreError::Decode(format!("participant kind {other:?}"))),
    };
    Ok(Participant {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        reference,
        display_name: row.get("display_name"),
        seed: row.get::<i32, _>("seed") as u32,
        registered_at: row.get::<DateTime<Utc>, _>("registered_at"),
    })
}

fn decode_match(row: &PgRow) -> StoreResult<Match> {
    let stage: String = row.get("stage");
    let status: String = row.get("status");
    Ok(Match {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        stage: Stage::parse(&stage)
            .ok_or_else(|| StoreError::Decode(format!("match stage {stage:?}")))?,
        round_number: row.get::<i32, _>("round_number") as u32,
        match_number: row.get::<i32, _>("match_number") as u32,
        participant1: row.get("participant1_id"),
        participant2: row.get("participant2_id"),
        score1: row.get("score1"),
        score2: row.get("score2"),
        winner: row.get("winner_id"),
        status: MatchStatus::parse(&status)
            .ok_or_else(|| StoreError::Decode(format!("match status {status:?}")))?,
        scheduled_time: row.get::<Option<DateTime<Utc>>, _>("scheduled_time"),
    })
}

const TOURNAMENT_COLUMNS: &str = "id, name, description, game, format, team_size, \
     max_participants, allow_draws, status, prize_pool, created_at, updated_at";

const MATCH_COLUMNS: &str = "id, tournament_id, stage, round_number, match_number, \
     participant1_id, participant2_id, score1, score2, winner_id, status, scheduled_time";

#[async_trait]
impl BracketStore for PgBracketStore {
    async fn insert_tournament(&self, tournament: &Tournament) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO tournaments
                 (id, name, description, game, format, team_size, max_participants,
                  allow_draws, status, prize_pool, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(tournament.id)
        .bind(&tournament.name)
        .bind(&tournament.description)
        .bind(&tournament.game)
        .bind(tournament.format.as_str())
        .bind(tournament.team_size.as_str())
        .bind(tournament.max_participants as i32)
        .bind(tournament.allow_draws)
        .bind(tournament.status.as_str())
        .bind(&tournament.prize_pool)
        .bind(tournament.created_at)
        .bind(tournament.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        let row = sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(decode_tournament).transpose()
    }

    async fn update_tournament(&self, tournament: &Tournament) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE tournaments
             SET name = $2, description = $3, game = $4, format = $5, team_size = $6,
                 max_participants = $7, allow_draws = $8, prize_pool = $9, updated_at = $10
             WHERE id = $1",
        )
        .bind(tournament.id)
        .bind(&tournament.name)
        .bind(&tournament.description)
        .bind(&tournament.game)
        .bind(tournament.format.as_str())
        .bind(tournament.team_size.as_str())
        .bind(tournament.max_participants as i32)
        .bind(tournament.allow_draws)
        .bind(&tournament.prize_pool)
        .bind(tournament.updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::TournamentNotFound);
        }
        Ok(())
    }

    async fn delete_tournament(&self, id: TournamentId) -> StoreResult<()> {
        // Participants and matches go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM tournaments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::TournamentNotFound);
        }
        Ok(())
    }

    async fn list_tournaments(
        &self,
        status: Option<TournamentStatus>,
    ) -> StoreResult<Vec<Tournament>> {
        let rows = sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments
             WHERE $1::text IS NULL OR status = $1
             ORDER BY created_at",
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(decode_tournament).collect()
    }

    async fn update_tournament_status(
        &self,
        id: TournamentId,
        status: TournamentStatus,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE tournaments SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::TournamentNotFound);
        }
        Ok(())
    }

    async fn add_participant(&self, participant: &Participant) -> StoreResult<()> {
        let (kind, reference_id) = match participant.reference {
            ParticipantRef::User(id) => ("user", id),
            ParticipantRef::Team(id) => ("team", id),
        };
        sqlx::query(
            "INSERT INTO participants
                 (id, tournament_id, kind, reference_id, display_name, seed, registered_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(participant.id)
        .bind(participant.tournament_id)
        .bind(kind)
        .bind(reference_id)
        .bind(&participant.display_name)
        .bind(participant.seed as i32)
        .bind(participant.registered_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_participant(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
    ) -> StoreResult<()> {
        sqlx::query("DELETE FROM participants WHERE tournament_id = $1 AND id = $2")
            .bind(tournament_id)
            .bind(participant_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_seeds(
        &self,
        tournament_id: TournamentId,
        seeds: &[(ParticipantId, u32)],
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for (id, seed) in seeds {
            sqlx::query("UPDATE participants SET seed = $3 WHERE tournament_id = $1 AND id = $2")
                .bind(tournament_id)
                .bind(id)
                .bind(*seed as i32)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn participants(&self, tournament_id: TournamentId) -> StoreResult<Vec<Participant>> {
        let rows = sqlx::query(
            "SELECT id, tournament_id, kind, reference_id, display_name, seed, registered_at
             FROM participants WHERE tournament_id = $1 ORDER BY seed",
        )
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(decode_participant).collect()
    }

    async fn get_bracket(&self, tournament_id: TournamentId) -> StoreResult<Option<Bracket>> {
        let row = sqlx::query("SELECT format, bracket_version FROM tournaments WHERE id = $1")
            .bind(tournament_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Err(StoreError::TournamentNotFound);
        };
        let Some(version) = row.get::<Option<i64>, _>("bracket_version") else {
            return Ok(None);
        };
        let format: String = row.get("format");
        let format = TournamentFormat::parse(&format)
            .ok_or_else(|| StoreError::Decode(format!("tournament format {format:?}")))?;

        let rows = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE tournament_id = $1"
        ))
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;
        let matches = rows.iter().map(decode_match).collect::<StoreResult<Vec<_>>>()?;
        Ok(Some(Bracket::from_matches(
            tournament_id,
            format,
            version as u64,
            matches,
        )))
    }

    async fn publish_bracket(
        &self,
        bracket: &Bracket,
        expected_version: Option<u64>,
        status: TournamentStatus,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT bracket_version FROM tournaments WHERE id = $1 FOR UPDATE")
            .bind(bracket.tournament_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Err(StoreError::TournamentNotFound);
        };
        let found = row.get::<Option<i64>, _>("bracket_version").map(|v| v as u64);
        if found != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                found,
            });
        }

        sqlx::query("DELETE FROM matches WHERE tournament_id = $1")
            .bind(bracket.tournament_id)
            .execute(&mut *tx)
            .await?;

        for m in bracket.matches() {
            sqlx::query(
                "INSERT INTO matches
                     (id, tournament_id, stage, round_number, match_number,
                      participant1_id, participant2_id, score1, score2, winner_id,
                      status, scheduled_time)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            )
            .bind(m.id)
            .bind(m.tournament_id)
            .bind(m.stage.as_str())
            .bind(m.round_number as i32)
            .bind(m.match_number as i32)
            .bind(m.participant1)
            .bind(m.participant2)
            .bind(m.score1)
            .bind(m.score2)
            .bind(m.winner)
            .bind(m.status.as_str())
            .bind(m.scheduled_time)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE tournaments SET status = $2, bracket_version = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(bracket.tournament_id)
        .bind(status.as_str())
        .bind(bracket.version as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_tournament_by_match(
        &self,
        match_id: MatchId,
    ) -> StoreResult<Option<TournamentId>> {
        let row = sqlx::query("SELECT tournament_id FROM matches WHERE id = $1")
            .bind(match_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("tournament_id")))
    }
}
