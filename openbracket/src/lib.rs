//! Tournament bracket engine.
//!
//! `openbracket` generates and advances tournament brackets for single
//! elimination, double elimination and round robin formats, on top of a
//! pluggable storage backend (in-memory or PostgreSQL).
//!
//! The two entry points are [`BracketEngine`] (bracket generation, result
//! recording, winner advancement) and [`RosterManager`] (tournament
//! lifecycle and registration). Both share a [`store::BracketStore`] and,
//! when deployed together, one [`TournamentLocks`] registry so roster
//! changes and bracket publishes on a tournament never interleave.
//!
//! ```no_run
//! use std::sync::Arc;
//! use openbracket::{
//!     BracketEngine, DEFAULT_LOCK_TIMEOUT, RosterManager, TournamentLocks,
//!     store::MemoryStore,
//! };
//!
//! let store = Arc::new(MemoryStore::new());
//! let locks = Arc::new(TournamentLocks::new(DEFAULT_LOCK_TIMEOUT));
//! let roster = RosterManager::new(store.clone()).with_locks(locks.clone());
//! let engine = BracketEngine::new(store).with_locks(locks);
//! # let _ = (roster, engine);
//! ```

pub mod db;
pub mod engine;
pub mod roster;
pub mod store;

pub use engine::{
    BracketEngine, BracketError, BracketEvent, BracketResult, DEFAULT_LOCK_TIMEOUT,
    TournamentLocks,
};
pub use roster::{NewTournament, RosterError, RosterManager, RosterResult, UpdateTournament};
pub use store::{BracketStore, MemoryStore, PgBracketStore, StoreError};
