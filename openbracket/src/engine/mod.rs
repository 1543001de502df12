//! Tournament bracket engine.
//!
//! Bracket generation and result propagation for single elimination,
//! double elimination and round robin, over a pluggable store. See
//! [`BracketEngine`] for the operation surface.

mod builder;
mod errors;
mod events;
mod locks;
mod manager;
pub mod models;
pub mod seeding;

pub use builder::build_bracket;
pub use errors::{BracketError, BracketResult};
pub use events::BracketEvent;
pub use locks::{DEFAULT_LOCK_TIMEOUT, TournamentLocks};
pub use manager::BracketEngine;
