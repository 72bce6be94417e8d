//! Timer-driven round progression
//!
//! The driver owns the single ticking task. Starting a round replaces the task,
//! manual cash-out and shutdown abort it, and the task ends on its own when a
//! tick crashes or auto cashes out. Every tick is addressed to the round id it
//! was spawned for, so a tick that slips past an abort is discarded by the
//! engine instead of mutating a settled round.

use crate::config::GameConfig;
use crate::errors::{AviatorResult, RoundError};
use crate::game::engine::RoundEngine;
use crate::game::types::{
    CashOutReceipt, HistoryEntry, LeaderboardEntry, Player, RoundSnapshot, RoundStatus,
    TickOutcome,
};
use crate::storage;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct RoundDriver<R = StdRng> {
    engine: Arc<Mutex<RoundEngine<R>>>,
    ticker: std::sync::Mutex<Option<JoinHandle<()>>>,
    tick_interval: Duration,
    auto_restart: Option<Duration>,
    updates: Arc<watch::Sender<RoundSnapshot>>,
}

impl RoundDriver<StdRng> {
    /// Open the configured store and build an entropy-seeded engine for `player`
    pub fn open(config: &GameConfig, player: Player) -> AviatorResult<Self> {
        let store = storage::open_store(&config.storage)?;
        let engine = RoundEngine::new(config, player, store);
        Ok(Self::new(engine, config))
    }
}

impl<R: Rng + Send + 'static> RoundDriver<R> {
    pub fn new(engine: RoundEngine<R>, config: &GameConfig) -> Self {
        let (updates, _) = watch::channel(engine.snapshot());
        Self {
            engine: Arc::new(Mutex::new(engine)),
            ticker: std::sync::Mutex::new(None),
            tick_interval: config.tick_interval(),
            auto_restart: config.auto_restart_delay(),
            updates: Arc::new(updates),
        }
    }

    /// Start a round and begin ticking it
    pub async fn start_round(&self, wager: f64, auto_cashout: f64) -> Result<Uuid, RoundError> {
        let round_id = {
            let mut engine = self.engine.lock().await;
            let round_id = engine.start_round(wager, auto_cashout)?;
            self.updates.send_replace(engine.snapshot());
            round_id
        };

        let task = tokio::spawn(run_ticks(
            self.engine.clone(),
            self.updates.clone(),
            round_id,
            self.tick_interval,
            self.auto_restart,
        ));
        self.replace_ticker(Some(task));

        Ok(round_id)
    }

    /// Cash out at the current multiplier and stop the timer
    pub async fn cash_out(&self) -> Result<CashOutReceipt, RoundError> {
        let receipt = {
            let mut engine = self.engine.lock().await;
            let receipt = engine.cash_out()?;
            self.updates.send_replace(engine.snapshot());
            receipt
        };
        self.replace_ticker(None);
        Ok(receipt)
    }

    pub async fn set_admin_override(&self, password: &str, crash_point: f64) -> Result<(), RoundError> {
        let mut engine = self.engine.lock().await;
        engine.set_admin_override(password, crash_point)?;
        self.updates.send_replace(engine.snapshot());
        Ok(())
    }

    pub async fn unlock_admin(&self, password: &str) -> Result<(), RoundError> {
        let mut engine = self.engine.lock().await;
        engine.unlock_admin(password)?;
        self.updates.send_replace(engine.snapshot());
        Ok(())
    }

    pub async fn set_manual_crash_point(&self, crash_point: f64) -> Result<(), RoundError> {
        self.engine.lock().await.set_manual_crash_point(crash_point)
    }

    pub async fn deposit(&self, amount: f64) -> Result<f64, RoundError> {
        let mut engine = self.engine.lock().await;
        let balance = engine.deposit(amount)?;
        self.updates.send_replace(engine.snapshot());
        Ok(balance)
    }

    pub async fn snapshot(&self) -> RoundSnapshot {
        self.engine.lock().await.snapshot()
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.engine.lock().await.history().to_vec()
    }

    pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.engine.lock().await.leaderboard().to_vec()
    }

    /// Receive a snapshot after every transition and tick
    pub fn subscribe(&self) -> watch::Receiver<RoundSnapshot> {
        self.updates.subscribe()
    }

    /// Whether a ticking task is still alive
    pub fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .map(|guard| guard.as_ref().is_some_and(|task| !task.is_finished()))
            .unwrap_or(false)
    }

    /// Stop the timer. The round, if running, stays frozen at its multiplier.
    pub fn shutdown(&self) {
        self.replace_ticker(None);
    }

    fn replace_ticker(&self, task: Option<JoinHandle<()>>) {
        let previous = match self.ticker.lock() {
            Ok(mut guard) => std::mem::replace(&mut *guard, task),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), task),
        };
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

impl<R> Drop for RoundDriver<R> {
    fn drop(&mut self) {
        let task = match self.ticker.get_mut() {
            Ok(slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(task) = task {
            task.abort();
        }
    }
}

async fn run_ticks<R: Rng + Send + 'static>(
    engine: Arc<Mutex<RoundEngine<R>>>,
    updates: Arc<watch::Sender<RoundSnapshot>>,
    mut round_id: Uuid,
    tick_interval: Duration,
    auto_restart: Option<Duration>,
) {
    loop {
        let outcome = tick_until_settled(&engine, &updates, round_id, tick_interval).await;

        let delay = match (outcome, auto_restart) {
            (TickOutcome::Crashed { .. }, Some(delay)) => delay,
            _ => return,
        };

        tokio::time::sleep(delay).await;

        let mut guard = engine.lock().await;
        // The player may have started a round by hand while we waited
        if guard.round_id() != Some(round_id) || guard.status() != RoundStatus::Crashed {
            debug!(round_id = %round_id, "Auto-restart skipped");
            return;
        }
        match guard.restart_last() {
            Ok(next) => {
                info!(previous = %round_id, round_id = %next, "Auto-restarted round");
                updates.send_replace(guard.snapshot());
                round_id = next;
            }
            Err(e) => {
                warn!(error = %e, "Auto-restart rejected");
                updates.send_replace(guard.snapshot());
                return;
            }
        }
    }
}

async fn tick_until_settled<R: Rng + Send + 'static>(
    engine: &Mutex<RoundEngine<R>>,
    updates: &watch::Sender<RoundSnapshot>,
    round_id: Uuid,
    tick_interval: Duration,
) -> TickOutcome {
    let mut ticks = interval_at(Instant::now() + tick_interval, tick_interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticks.tick().await;

        let mut guard = engine.lock().await;
        let outcome = match guard.tick_round(round_id, Utc::now()) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(round_id = %round_id, error = %e, "Tick failed, stopping round timer");
                return TickOutcome::Ignored;
            }
        };

        match outcome {
            TickOutcome::Climbing { .. } => {
                updates.send_replace(guard.snapshot());
            }
            TickOutcome::Ignored => return outcome,
            _ => {
                updates.send_replace(guard.snapshot());
                return outcome;
            }
        }
    }
}
