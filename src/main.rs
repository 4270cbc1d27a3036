//! golemd - Golem MUD server core
//!
//! Accepts telnet connections, walks each one through login or character
//! creation, and routes commands for players in the world.

mod config;
mod db;
mod dispatcher;
mod error;
mod handlers;
mod http;
mod metrics;
mod network;
mod security;
mod state;
mod telemetry;

use crate::config::{Config, Texts};
use crate::db::Database;
use crate::dispatcher::{Dispatcher, InboundEvent};
use crate::network::Gateway;
use crate::security::Credentials;
use crate::state::{ChoiceTable, Tables, World};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = config::validation::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "configuration has {} error(s), see above",
            errors.len()
        ));
    }

    info!(
        server = %config.server.name,
        world = %config.server.world_name,
        "Starting golemd"
    );

    // Initialize database and the static world tables
    let db = Database::new(&config.database.path).await?;
    let repo = db.world();
    let rooms = repo.load_rooms().await?;
    let races = repo.load_races().await?;
    let classes = repo.load_classes().await?;

    let Some(start_room) = rooms.iter().map(|r| r.id).min() else {
        return Err(anyhow::anyhow!("the rooms table is empty"));
    };
    let tables = Tables {
        races: ChoiceTable::new(races),
        classes: ChoiceTable::new(classes),
        start_room,
    };
    if tables.races.playable_count() == 0 || tables.classes.playable_count() == 0 {
        warn!("No playable races or classes; character creation cannot complete");
    }
    info!(
        rooms = rooms.len(),
        races = tables.races.playable_count(),
        classes = tables.classes.playable_count(),
        "Loaded world tables"
    );
    let world = World::new(rooms, start_room);

    let texts = Texts::load(&config.server);
    let credentials = Credentials::new(&config.security)?;

    // Metrics always register; the HTTP endpoint is optional.
    // Convention: metrics_port = 0 disables it (used by tests).
    metrics::init();
    let metrics_port = config.server.metrics_port;
    if metrics_port == 0 {
        info!("Metrics endpoint disabled");
    } else {
        tokio::spawn(async move {
            http::run_http_server(metrics_port).await;
        });
    }

    let (dispatcher, events) = Dispatcher::new(
        config.limits.clone(),
        config.timers.output_flush(),
        world,
        tables,
        texts,
        db,
        credentials,
    );
    let dispatcher_task = tokio::spawn(dispatcher.run());

    let gateway = Gateway::bind(config.listen.address, events.clone(), config.limits.max_line_len).await?;

    tokio::select! {
        result = gateway.run() => {
            if let Err(e) = result {
                error!(error = %e, "Gateway stopped");
            }
        }
        result = tokio::signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Interrupt received, shutting down"),
                Err(e) => error!(error = %e, "Failed to listen for interrupt, shutting down"),
            }
        }
    }

    if events.send(InboundEvent::Shutdown).await.is_err() {
        warn!("Dispatcher already stopped");
    }
    if let Err(e) = dispatcher_task.await {
        error!(error = %e, "Dispatcher task failed");
    }
    info!("Shutdown complete");

    Ok(())
}

/// Human-readable logs by default; `GOLEMD_LOG_FORMAT=json` for JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("GOLEMD_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
