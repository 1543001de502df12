//! Tournament and bracket data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Tournament ID type
pub type TournamentId = Uuid;
/// Match ID type
pub type MatchId = Uuid;
/// Participant ID type
pub type ParticipantId = Uuid;
/// Match score type
pub type Score = i32;

/// Tournament lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Being set up, not yet visible for sign-ups
    Draft,
    /// Accepting participant registrations
    Registration,
    /// Roster frozen, bracket generated
    Locked,
    /// At least one result has been recorded
    InProgress,
    /// Final match (or every round-robin match) resolved
    Completed,
    /// Abandoned before completion
    Canceled,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::Draft => "draft",
            TournamentStatus::Registration => "registration",
            TournamentStatus::Locked => "locked",
            TournamentStatus::InProgress => "in_progress",
            TournamentStatus::Completed => "completed",
            TournamentStatus::Canceled => "canceled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(TournamentStatus::Draft),
            "registration" => Some(TournamentStatus::Registration),
            "locked" => Some(TournamentStatus::Locked),
            "in_progress" => Some(TournamentStatus::InProgress),
            "completed" => Some(TournamentStatus::Completed),
            "canceled" => Some(TournamentStatus::Canceled),
            _ => None,
        }
    }

    /// Whether the lifecycle state machine permits moving to `next`.
    ///
    /// `draft → registration → locked → in_progress → completed`, with
    /// `registration → canceled` and `locked → canceled` as escape hatches.
    pub fn can_transition_to(self, next: Self) -> bool {
        use TournamentStatus::*;
        matches!(
            (self, next),
            (Draft, Registration)
                | (Registration, Locked)
                | (Locked, InProgress)
                | (Locked, Locked)
                | (InProgress, Completed)
                | (Locked, Completed)
                | (Registration, Canceled)
                | (Locked, Canceled)
        )
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bracket format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    SingleElimination,
    DoubleElimination,
    RoundRobin,
}

impl TournamentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentFormat::SingleElimination => "single_elimination",
            TournamentFormat::DoubleElimination => "double_elimination",
            TournamentFormat::RoundRobin => "round_robin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "single_elimination" => Some(TournamentFormat::SingleElimination),
            "double_elimination" => Some(TournamentFormat::DoubleElimination),
            "round_robin" => Some(TournamentFormat::RoundRobin),
            _ => None,
        }
    }

    /// Elimination formats propagate winners between rounds; round robin does not.
    pub fn is_elimination(&self) -> bool {
        !matches!(self, TournamentFormat::RoundRobin)
    }
}

impl fmt::Display for TournamentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Team size per side. Informational only; does not affect bracket shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamSize {
    #[serde(rename = "1x1")]
    Solo,
    #[serde(rename = "2x2")]
    Duo,
    #[serde(rename = "3x3")]
    Trio,
    #[serde(rename = "4x4")]
    Quad,
    #[serde(rename = "5x5")]
    FiveOnFive,
}

impl TeamSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamSize::Solo => "1x1",
            TeamSize::Duo => "2x2",
            TeamSize::Trio => "3x3",
            TeamSize::Quad => "4x4",
            TeamSize::FiveOnFive => "5x5",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1x1" => Some(TeamSize::Solo),
            "2x2" => Some(TeamSize::Duo),
            "3x3" => Some(TeamSize::Trio),
            "4x4" => Some(TeamSize::Quad),
            "5x5" => Some(TeamSize::FiveOnFive),
            _ => None,
        }
    }

    pub fn players_per_side(&self) -> u8 {
        match self {
            TeamSize::Solo => 1,
            TeamSize::Duo => 2,
            TeamSize::Trio => 3,
            TeamSize::Quad => 4,
            TeamSize::FiveOnFive => 5,
        }
    }
}

impl fmt::Display for TeamSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tournament entrant is either a solo player or a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ParticipantRef {
    User(Uuid),
    Team(Uuid),
}

impl ParticipantRef {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            ParticipantRef::User(id) => Some(*id),
            ParticipantRef::Team(_) => None,
        }
    }

    pub fn team_id(&self) -> Option<Uuid> {
        match self {
            ParticipantRef::User(_) => None,
            ParticipantRef::Team(id) => Some(*id),
        }
    }
}

/// A registered tournament entrant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub tournament_id: TournamentId,
    pub reference: ParticipantRef,
    pub display_name: String,
    /// Bracket placement rank, unique and contiguous within a tournament
    pub seed: u32,
    pub registered_at: DateTime<Utc>,
}

/// Tournament entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub description: Option<String>,
    pub game: Option<String>,
    pub format: TournamentFormat,
    pub team_size: TeamSize,
    pub max_participants: u32,
    /// Permit drawn results. Honored for round robin only; elimination
    /// formats always require a decisive score.
    pub allow_draws: bool,
    pub status: TournamentStatus,
    pub prize_pool: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Bracket section a match belongs to. Single elimination and round robin
/// use only `Winners`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Winners,
    Losers,
    GrandFinal,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Winners => "winners",
            Stage::Losers => "losers",
            Stage::GrandFinal => "grand_final",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "winners" => Some(Stage::Winners),
            "losers" => Some(Stage::Losers),
            "grand_final" => Some(Stage::GrandFinal),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Match lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Waiting on one or both participant slots
    Pending,
    /// Both slots resolved, playable
    Scheduled,
    InProgress,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::InProgress => "in_progress",
            MatchStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(MatchStatus::Pending),
            "scheduled" => Some(MatchStatus::Scheduled),
            "in_progress" => Some(MatchStatus::InProgress),
            "completed" => Some(MatchStatus::Completed),
            _ => None,
        }
    }

    /// Whether a result may still be recorded for a match in this status.
    pub fn accepts_result(&self) -> bool {
        !matches!(self, MatchStatus::Completed)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One of the two participant positions in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    First,
    Second,
}

/// A single bracket match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    #[serde(default = "default_stage")]
    pub stage: Stage,
    pub round_number: u32,
    pub match_number: u32,
    #[serde(rename = "participant1_id")]
    pub participant1: Option<ParticipantId>,
    #[serde(rename = "participant2_id")]
    pub participant2: Option<ParticipantId>,
    pub score1: Option<Score>,
    pub score2: Option<Score>,
    #[serde(rename = "winner_id")]
    pub winner: Option<ParticipantId>,
    pub status: MatchStatus,
    pub scheduled_time: Option<DateTime<Utc>>,
}

fn default_stage() -> Stage {
    Stage::Winners
}

impl Match {
    /// New empty pending match slot.
    pub fn new(
        tournament_id: TournamentId,
        stage: Stage,
        round_number: u32,
        match_number: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            stage,
            round_number,
            match_number,
            participant1: None,
            participant2: None,
            score1: None,
            score2: None,
            winner: None,
            status: MatchStatus::Pending,
            scheduled_time: None,
        }
    }

    pub fn slot(&self, slot: Slot) -> Option<ParticipantId> {
        match slot {
            Slot::First => self.participant1,
            Slot::Second => self.participant2,
        }
    }

    pub fn set_slot(&mut self, slot: Slot, participant: ParticipantId) {
        match slot {
            Slot::First => self.participant1 = Some(participant),
            Slot::Second => self.participant2 = Some(participant),
        }
    }

    pub fn slots_resolved(&self) -> bool {
        self.participant1.is_some() && self.participant2.is_some()
    }

    /// A bye resolves immediately at generation time: completed, a winner,
    /// exactly one participant and no scores.
    pub fn is_bye(&self) -> bool {
        self.status == MatchStatus::Completed
            && self.winner.is_some()
            && self.score1.is_none()
            && self.score2.is_none()
            && (self.participant1.is_some() ^ self.participant2.is_some())
    }

    /// A void match never receives any participant (possible in the losers
    /// bracket when both of its feeder matches were byes).
    pub fn is_void(&self) -> bool {
        self.status == MatchStatus::Completed
            && self.winner.is_none()
            && self.participant1.is_none()
            && self.participant2.is_none()
    }

    /// A decisive match is one that was, or will be, actually played.
    pub fn is_decisive(&self) -> bool {
        !self.is_bye() && !self.is_void()
    }

    pub fn loser(&self) -> Option<ParticipantId> {
        match self.winner {
            Some(w) if self.participant1 == Some(w) => self.participant2,
            Some(w) if self.participant2 == Some(w) => self.participant1,
            _ => None,
        }
    }

    /// Resolve as a bye for the single present participant.
    pub(crate) fn complete_as_bye(&mut self) {
        debug_assert!(self.participant1.is_some() ^ self.participant2.is_some());
        self.winner = self.participant1.or(self.participant2);
        self.status = MatchStatus::Completed;
    }

    /// Resolve as void: no participants will ever arrive.
    pub(crate) fn complete_as_void(&mut self) {
        debug_assert!(self.participant1.is_none() && self.participant2.is_none());
        self.winner = None;
        self.status = MatchStatus::Completed;
    }
}

/// An ordered set of match slots played at the same depth of the bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    #[serde(default = "default_stage")]
    pub stage: Stage,
    pub round_number: u32,
    pub matches: Vec<Match>,
}

/// The full set of rounds/matches for a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub tournament_id: TournamentId,
    pub format: TournamentFormat,
    /// Bumped on every publish; used for optimistic concurrency in storage.
    pub version: u64,
    pub rounds: Vec<Round>,
}

impl Bracket {
    pub fn new(tournament_id: TournamentId, format: TournamentFormat) -> Self {
        Self {
            tournament_id,
            format,
            version: 0,
            rounds: Vec::new(),
        }
    }

    /// Rebuild a bracket from a flat match list (storage order does not
    /// matter; rounds come out ordered by stage, then round number).
    pub fn from_matches(
        tournament_id: TournamentId,
        format: TournamentFormat,
        version: u64,
        mut matches: Vec<Match>,
    ) -> Self {
        matches.sort_by_key(|m| (m.stage, m.round_number, m.match_number));
        let mut rounds: Vec<Round> = Vec::new();
        for m in matches {
            match rounds.last_mut() {
                Some(r) if r.stage == m.stage && r.round_number == m.round_number => {
                    r.matches.push(m);
                }
                _ => rounds.push(Round {
                    stage: m.stage,
                    round_number: m.round_number,
                    matches: vec![m],
                }),
            }
        }
        Self {
            tournament_id,
            format,
            version,
            rounds,
        }
    }

    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.rounds.iter().flat_map(|r| r.matches.iter())
    }

    pub fn find_match(&self, id: MatchId) -> Option<&Match> {
        self.matches().find(|m| m.id == id)
    }

    pub fn find_match_mut(&mut self, id: MatchId) -> Option<&mut Match> {
        self.rounds
            .iter_mut()
            .flat_map(|r| r.matches.iter_mut())
            .find(|m| m.id == id)
    }

    pub fn round(&self, stage: Stage, round_number: u32) -> Option<&Round> {
        self.rounds
            .iter()
            .find(|r| r.stage == stage && r.round_number == round_number)
    }

    pub fn match_at(&self, stage: Stage, round_number: u32, match_number: u32) -> Option<&Match> {
        self.round(stage, round_number)?
            .matches
            .iter()
            .find(|m| m.match_number == match_number)
    }

    pub fn match_at_mut(
        &mut self,
        stage: Stage,
        round_number: u32,
        match_number: u32,
    ) -> Option<&mut Match> {
        self.rounds
            .iter_mut()
            .find(|r| r.stage == stage && r.round_number == round_number)?
            .matches
            .iter_mut()
            .find(|m| m.match_number == match_number)
    }

    /// Matches that are, or will be, actually played (byes and voids excluded).
    pub fn decisive_match_count(&self) -> usize {
        self.matches().filter(|m| m.is_decisive()).count()
    }

    /// Whether any decisive match already has a recorded result.
    pub fn has_reported_results(&self) -> bool {
        self.matches()
            .any(|m| m.status == MatchStatus::Completed && m.is_decisive())
    }

    /// The match deciding the tournament: grand final for double elimination,
    /// last winners-bracket match for single elimination, none for round robin.
    pub fn final_match(&self) -> Option<&Match> {
        match self.format {
            TournamentFormat::DoubleElimination => self
                .rounds
                .iter()
                .find(|r| r.stage == Stage::GrandFinal)?
                .matches
                .first(),
            TournamentFormat::SingleElimination => self
                .rounds
                .iter()
                .filter(|r| r.stage == Stage::Winners)
                .next_back()?
                .matches
                .first(),
            TournamentFormat::RoundRobin => None,
        }
    }

    /// Resolved once the final match completes (elimination) or every match
    /// completes (round robin).
    pub fn is_complete(&self) -> bool {
        match self.format {
            TournamentFormat::RoundRobin => self
                .matches()
                .all(|m| m.status == MatchStatus::Completed),
            _ => self
                .final_match()
                .is_some_and(|m| m.status == MatchStatus::Completed),
        }
    }
}
