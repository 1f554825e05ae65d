//! Simulated server - a few staff members running commands across servers.
//!
//! This demo wires a full service against an in-memory permission store:
//! - A temporary data directory with `config.toml`, `commandPermissions.toml`
//!   and `messages.toml`
//! - `InMemoryAuthority` with a default group, a helper group and a moderator
//!   group inheriting from it
//! - `ChannelAlertSink` so alerts can be printed as they arrive
//!
//! ## Run
//! ```sh
//! RUST_LOG=staff_warn=debug cargo run -p demos --example simulated_server
//! ```

use std::fs;
use std::sync::Arc;

use staff_warn::config::{COMMANDS_FILE, CONFIG_FILE, MESSAGES_FILE};
use staff_warn::prelude::*;
use tokio_stream::StreamExt;

#[tokio::main]
async fn main() -> Result<(), WarnError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staff_warn=info".parse().unwrap()),
        )
        .init();

    println!("=== Simulated Server ===\n");

    // --- Data directory ---
    let data_dir = tempfile::tempdir()?;
    fs::write(
        data_dir.path().join(CONFIG_FILE),
        r#"
defaultGroups = ["default"]
excludedServers = ["lobby"]

[debug]
verbose = true
"#,
    )?;
    fs::write(
        data_dir.path().join(COMMANDS_FILE),
        r#"
ban = "server.ban"
kick = "server.kick"
spawn = "server.spawn"
fly = "server.fly"
"#,
    )?;
    fs::write(
        data_dir.path().join(MESSAGES_FILE),
        "alert = \"[StaffWarn] %command% needs %permission% (from %origin%)\"\n",
    )?;

    // --- Permission store ---
    let authority = Arc::new(InMemoryAuthority::new());
    authority
        .grant_group("default", "server.spawn", ContextSet::empty())
        .grant_group("default", "server.fly", ContextSet::server("creative"))
        .grant_group("helper", "server.kick", ContextSet::empty())
        .grant_group("moderator", "server.ban", ContextSet::empty())
        .add_group_parent("moderator", "helper", ContextSet::empty());

    let alice = SnapshotPlayer::new("Alice")
        .with_permission("server.ban")
        .with_permission("server.kick")
        .with_permission("server.spawn");
    authority
        .add_player_group(alice.id(), "default", ContextSet::empty())
        .add_player_group(alice.id(), "moderator", ContextSet::empty());

    let bob = SnapshotPlayer::new("Bob")
        .with_permission("server.fly")
        .with_permission("server.spawn");
    authority
        .add_player_group(bob.id(), "default", ContextSet::empty())
        .grant_player(bob.id(), "server.fly", ContextSet::empty());

    // --- Service ---
    let (sink, mut alerts) = ChannelAlertSink::new();
    let mut service = StaffWarn::load(data_dir.path(), authority.clone(), Arc::new(sink))?;
    service.start();

    println!("Tracking {} commands\n", service.catalog().len());

    let events: Vec<(Arc<dyn Player>, &str)> = vec![
        (on(&alice, "lobby"), "/ban Griefer"),
        (on(&alice, "survival"), "/ban Griefer"),
        (on(&alice, "survival"), "/kick Spammer"),
        (on(&alice, "survival"), "/spawn"),
        (on(&alice, "survival"), "/help"),
        (on(&bob, "creative"), "/fly"),
        (on(&bob, "survival"), "/fly"),
    ];

    for (player, command) in events {
        let server = player.current_context().unwrap_or_default();
        print!("{:<6} on {:<9} {:<15} -> ", player.name(), server, command);
        match service.on_command(player, command) {
            None => println!("filtered"),
            Some(pending) => match pending.await {
                Ok(Some(alert)) => println!("alert (origin: {})", alert.origin),
                Ok(None) => println!("no alert"),
                Err(e) => println!("task failed: {}", e),
            },
        }
    }

    // --- Delivered messages ---
    println!("\n--- Delivered ---\n");
    service.shutdown();
    drop(service);

    while let Some(alert) = alerts.next().await {
        println!("to {}: {}", alert.player_name, alert.message);
    }

    println!("\nAuthority queries: {}", authority.query_count());
    Ok(())
}

/// `player` standing on `server`.
fn on(player: &SnapshotPlayer, server: &str) -> Arc<dyn Player> {
    Arc::new(player.clone().on_server(server))
}
