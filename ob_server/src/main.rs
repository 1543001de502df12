//! Tournament bracket server.
//!
//! Serves the REST API over either a PostgreSQL-backed store or, when no
//! database is configured, an in-memory store for local development.

use std::sync::Arc;

use anyhow::Error;
use ctrlc::set_handler;
use tracing::{info, warn};

use ob_server::api::{self, AppState};
use ob_server::config::ServerConfig;
use ob_server::{logging, metrics};
use openbracket::{
    BracketEngine, BracketEvent, BracketStore, RosterManager, TournamentLocks,
    db::{Database, DatabaseConfig},
    store::{MemoryStore, PgBracketStore},
};
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists.
    let _ = dotenvy::dotenv();

    let config = ServerConfig::load()?;

    set_handler(|| std::process::exit(0))?;
    logging::init();
    info!("starting tournament server at {}", config.bind);

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(Error::msg)?;
        info!("metrics exporter listening on {addr}");
    }

    let (store, pool): (Arc<dyn BracketStore>, _) = match &config.database_url {
        Some(url) => {
            info!("connecting to database");
            let db = Database::connect(&DatabaseConfig::with_url(url.clone()))
                .await
                .map_err(|e| anyhow::anyhow!("failed to connect to database: {e}"))?;
            db.run_migrations()
                .await
                .map_err(|e| anyhow::anyhow!("failed to run migrations: {e}"))?;
            let pool = db.pool().clone();
            (Arc::new(PgBracketStore::new(pool.clone())), Some(pool))
        }
        None => {
            warn!("no DATABASE_URL configured, using in-memory store; state is lost on restart");
            (Arc::new(MemoryStore::new()), None)
        }
    };

    // One lock registry for both: roster changes must not interleave with
    // bracket publishes on the same tournament.
    let locks = Arc::new(TournamentLocks::new(config.lock_timeout));
    let engine = Arc::new(BracketEngine::new(store.clone()).with_locks(locks.clone()));
    let roster = Arc::new(RosterManager::new(store).with_locks(locks));

    // Log engine events as they happen.
    let mut events = engine.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(BracketEvent::BracketPublished {
                    tournament_id,
                    version,
                }) => info!(%tournament_id, version, "bracket published"),
                Ok(BracketEvent::MatchCompleted {
                    tournament_id,
                    match_id,
                    winner,
                }) => info!(%tournament_id, %match_id, ?winner, "match completed"),
                Ok(BracketEvent::StatusChanged {
                    tournament_id,
                    status,
                }) => info!(%tournament_id, %status, "tournament status changed"),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event logger lagged behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let state = AppState {
        engine,
        roster,
        pool,
    };
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind to {}: {e}", config.bind))?;
    info!(
        "server is running at http://{}; press Ctrl+C to stop",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))?;

    info!("shutting down server");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
}
