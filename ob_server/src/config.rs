//! Server configuration from CLI flags and environment variables.
//!
//! CLI flags win over environment variables; environment variables win over
//! defaults. `.env` files are loaded by `main` before this runs.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Error;
use pico_args::Arguments;

pub const HELP: &str = "\
Run a tournament bracket server

USAGE:
  ob_server [OPTIONS]

OPTIONS:
  --bind             IP:PORT  Server socket bind address     [default: env SERVER_BIND or 127.0.0.1:3000]
  --db-url           URL      PostgreSQL connection string   [default: env DATABASE_URL, or in-memory store]
  --metrics-bind     IP:PORT  Prometheus exporter address    [default: env METRICS_BIND, or disabled]
  --lock-timeout-ms  MS       Per-tournament lock timeout    [default: env LOCK_TIMEOUT_MS or 5000]

FLAGS:
  -h, --help                  Print help information

ENVIRONMENT:
  SERVER_BIND                 Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL                PostgreSQL connection string
  METRICS_BIND                Prometheus exporter bind address
  LOCK_TIMEOUT_MS             Per-tournament lock timeout in milliseconds
  RUST_LOG                    Log filter (e.g., info,openbracket=debug)
";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// When absent the server falls back to the in-memory store.
    pub database_url: Option<String>,
    pub metrics_bind: Option<SocketAddr>,
    pub lock_timeout: Duration,
}

impl ServerConfig {
    /// Parse CLI arguments and environment. Prints help and exits on
    /// `-h`/`--help`.
    pub fn load() -> Result<Self, Error> {
        let mut pargs = Arguments::from_env();

        if pargs.contains(["-h", "--help"]) {
            print!("{HELP}");
            std::process::exit(0);
        }

        let bind = match pargs.opt_value_from_str::<_, SocketAddr>("--bind")? {
            Some(bind) => bind,
            None => std::env::var("SERVER_BIND")
                .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
                .parse()?,
        };
        let database_url = pargs
            .opt_value_from_str::<_, String>("--db-url")?
            .or_else(|| std::env::var("DATABASE_URL").ok());
        let metrics_bind = match pargs.opt_value_from_str::<_, SocketAddr>("--metrics-bind")? {
            Some(addr) => Some(addr),
            None => std::env::var("METRICS_BIND")
                .ok()
                .map(|v| v.parse())
                .transpose()?,
        };
        let lock_timeout_ms = match pargs.opt_value_from_str::<_, u64>("--lock-timeout-ms")? {
            Some(ms) => ms,
            None => std::env::var("LOCK_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5_000),
        };

        Ok(Self {
            bind,
            database_url,
            metrics_bind,
            lock_timeout: Duration::from_millis(lock_timeout_ms),
        })
    }
}
