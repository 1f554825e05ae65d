//! Custom authority - plug a rank ladder into the resolver.
//!
//! This demo implements the two extension points a host provides:
//! - `PermissionAuthority` over a fixed rank ladder, where each rank inherits
//!   everything below it
//! - `AlertSink` that prints to stdout instead of messaging a player
//!
//! It also shows what happens while the backend is down: commands still
//! pass through, but nothing alerts and nothing is cached.
//!
//! ## Run
//! ```sh
//! cargo run -p demos --example custom_authority
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use staff_warn::prelude::*;
use uuid::Uuid;

// --- 1. Authority ---

/// Ranks from lowest to highest. A rank holds its own permissions plus every
/// lower rank's.
struct RankLadder {
    ranks: Vec<(&'static str, Vec<&'static str>)>,
    members: HashMap<Uuid, usize>,
    online: AtomicBool,
}

impl RankLadder {
    fn position(&self, group: &str) -> Option<usize> {
        self.ranks.iter().position(|(name, _)| *name == group)
    }

    fn check_online(&self) -> Result<(), AuthorityError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AuthorityError::Unavailable("rank database offline".to_string()))
        }
    }
}

impl PermissionAuthority for RankLadder {
    fn group_has_permission(
        &self,
        group: &str,
        permission: &str,
        _context: &ContextSet,
    ) -> Result<bool, AuthorityError> {
        self.check_online()?;
        let top = self
            .position(group)
            .ok_or_else(|| AuthorityError::UnknownGroup(group.to_string()))?;
        Ok(self.ranks[..=top]
            .iter()
            .any(|(_, perms)| perms.iter().any(|p| *p == permission)))
    }

    fn inherited_nodes(
        &self,
        player: Uuid,
        _context: &ContextSet,
    ) -> Result<Vec<InheritedNode>, AuthorityError> {
        self.check_online()?;
        let top = *self
            .members
            .get(&player)
            .ok_or(AuthorityError::UnknownPlayer(player))?;

        // Highest rank first.
        Ok(self.ranks[..=top]
            .iter()
            .rev()
            .flat_map(|(rank, perms)| {
                perms
                    .iter()
                    .map(move |perm| InheritedNode::from_group(*perm, true, *rank))
            })
            .collect())
    }
}

// --- 2. Sink ---

struct StdoutSink;

#[async_trait]
impl AlertSink for StdoutSink {
    async fn deliver(&self, alert: &Alert) -> Result<(), WarnError> {
        println!("  [to {}] {}", alert.player_name, alert.message);
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staff_warn=warn".parse().unwrap()),
        )
        .init();

    println!("=== Custom Authority ===\n");

    let jeb = SnapshotPlayer::new("Jeb")
        .on_server("survival")
        .with_permission("server.kick")
        .with_permission("server.mute")
        .with_permission("server.home");

    let ladder = Arc::new(RankLadder {
        ranks: vec![
            ("member", vec!["server.home"]),
            ("trusted", vec!["server.mute"]),
            ("mod", vec!["server.kick"]),
        ],
        members: HashMap::from([(jeb.id(), 2)]),
        online: AtomicBool::new(true),
    });

    let resolver = Arc::new(
        OriginResolver::builder(ladder.clone())
            .default_groups(vec!["member".to_string()])
            .build(),
    );
    let catalog = Arc::new(CommandCatalog::new([
        ("home", "server.home"),
        ("mute", "server.mute"),
        ("kick", "server.kick"),
    ]));
    let monitor = CommandMonitor::new(
        resolver.clone(),
        catalog,
        AlertTemplate::new("%command% uses %permission%, granted by rank %origin%"),
        Arc::new(StdoutSink),
    );

    let jeb: Arc<dyn Player> = Arc::new(jeb);

    println!("--- Backend online ---\n");
    for command in ["/home", "/mute Dinnerbone", "/kick Dinnerbone"] {
        println!("{}", command);
        if let Some(pending) = monitor.on_command(jeb.clone(), command) {
            let _ = pending.await;
        }
    }

    println!("\n--- Backend offline ---\n");
    ladder.online.store(false, Ordering::SeqCst);
    // A server nothing has been cached for yet.
    let fresh = Arc::new(
        SnapshotPlayer::new("Grumm")
            .on_server("creative")
            .with_permission("server.kick"),
    );
    match monitor.on_command(fresh, "/kick Dinnerbone") {
        Some(pending) => match pending.await {
            Ok(None) => println!("/kick Dinnerbone: no alert while the backend is down"),
            Ok(Some(alert)) => println!("unexpected alert: {}", alert.message),
            Err(e) => println!("task failed: {}", e),
        },
        None => println!("filtered"),
    }

    let sizes = resolver.cache_sizes();
    println!(
        "\nCache: {} coverage entries, {} origin entries",
        sizes.coverage, sizes.origins
    );
}
