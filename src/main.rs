//! Aviator headless runner
//!
//! Plays a number of rounds against the round engine and logs each outcome.

use aviator::{config::StorageBackend, ConfigLoader, Player, RoundDriver, RoundStatus};
use clap::Parser;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "aviator")]
#[command(about = "Aviator crash-game round engine", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<String>,

    /// Player name shown on the leaderboard
    #[arg(long, default_value = "pilot")]
    username: String,

    /// Wager per round
    #[arg(long, default_value = "100")]
    wager: f64,

    /// Auto cash-out multiplier
    #[arg(long, default_value = "2.0")]
    auto_cashout: f64,

    /// Number of rounds to play
    #[arg(long, default_value = "3")]
    rounds: u32,

    /// Admin secret; required together with --crash-point
    #[arg(long)]
    admin_secret: Option<String>,

    /// Fixed crash point for every round (admin only)
    #[arg(long)]
    crash_point: Option<f64>,

    /// Keep history and leaderboard in memory only
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loader = match args.config {
        Some(ref path) => ConfigLoader::new().with_path(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load()?;
    if args.memory {
        config.storage.backend = StorageBackend::Memory;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("aviator={}", config.logging.level).into()),
        )
        .init();

    let player = Player::register(&args.username, "headless")?;
    let driver = RoundDriver::open(&config, player)?;

    if let (Some(secret), Some(point)) = (args.admin_secret.as_deref(), args.crash_point) {
        driver.set_admin_override(secret, point).await?;
    }

    let mut updates = driver.subscribe();
    for round in 1..=args.rounds {
        if let Err(e) = driver.start_round(args.wager, args.auto_cashout).await {
            warn!(round, error = %e, "Round rejected");
            break;
        }

        while updates.changed().await.is_ok() {
            let status = updates.borrow_and_update().status;
            if status != RoundStatus::Running {
                break;
            }
        }

        let snapshot = driver.snapshot().await;
        info!(
            round,
            status = %snapshot.status,
            multiplier = snapshot.multiplier,
            crash_point = ?snapshot.crash_point,
            win = snapshot.last_win,
            balance = snapshot.balance,
            "Round settled"
        );
    }

    for entry in driver.history().await {
        info!(crash_point = entry.crash_point, at = %entry.timestamp, "History");
    }
    for entry in driver.leaderboard().await {
        info!(
            username = %entry.username,
            cashout = entry.cashout_multiplier,
            win = entry.win_amount,
            "Leaderboard"
        );
    }

    driver.shutdown();
    Ok(())
}
