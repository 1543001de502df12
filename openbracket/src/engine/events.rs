//! Engine event notifications, broadcast to any interested subscriber
//! (the server logs them; future consumers might push them over a socket).

use super::models::{MatchId, ParticipantId, TournamentId, TournamentStatus};

/// Channel capacity for engine events. Slow subscribers lag rather than
/// block the engine.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BracketEvent {
    /// A new bracket revision became visible to readers.
    BracketPublished {
        tournament_id: TournamentId,
        version: u64,
    },
    /// A match result was recorded and its winner advanced.
    MatchCompleted {
        tournament_id: TournamentId,
        match_id: MatchId,
        winner: Option<ParticipantId>,
    },
    /// The tournament moved to a new lifecycle status.
    StatusChanged {
        tournament_id: TournamentId,
        status: TournamentStatus,
    },
}
