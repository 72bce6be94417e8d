//! Round state machine
//!
//! `RoundEngine` owns the balance, the crash generator and both ledgers, and
//! applies every transition synchronously. Timing lives in
//! [`RoundDriver`](crate::game::driver::RoundDriver); this type only reacts to
//! calls, which keeps it deterministic under a seeded generator.

use crate::config::GameConfig;
use crate::errors::RoundError;
use crate::game::account::BalanceAccount;
use crate::game::crash_generator::RandomCrashGenerator;
use crate::game::history::HistoryLedger;
use crate::game::leaderboard::Leaderboard;
use crate::game::types::{
    round2, CashOutReceipt, HistoryEntry, LeaderboardEntry, Player, RoundParams, RoundSnapshot,
    RoundStatus, TickOutcome,
};
use crate::storage::{self, KeyValueStore, HISTORY_KEY, LEADERBOARD_KEY};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Round {
    id: Uuid,
    multiplier: f64,
    crash_point: f64,
    status: RoundStatus,
    wager: f64,
    auto_cashout: f64,
}

#[derive(Debug, Clone, Default)]
struct AdminOverride {
    access: bool,
    manual_crash_point: f64,
}

impl AdminOverride {
    fn crash_point(&self) -> Option<f64> {
        (self.access && self.manual_crash_point > 1.0).then_some(self.manual_crash_point)
    }
}

#[derive(Debug, Clone, Default)]
struct SessionStats {
    rounds_played: u64,
    cashouts: u64,
    last_win: f64,
}

pub struct RoundEngine<R = StdRng> {
    player: Player,
    account: BalanceAccount,
    generator: RandomCrashGenerator<R>,
    history: HistoryLedger,
    leaderboard: Leaderboard,
    store: Arc<dyn KeyValueStore>,
    round: Option<Round>,
    last_params: Option<RoundParams>,
    admin: AdminOverride,
    stats: SessionStats,
    step: f64,
    admin_secret: String,
    allow_deposits: bool,
}

impl RoundEngine<StdRng> {
    /// Engine with an entropy-seeded crash generator
    pub fn new(config: &GameConfig, player: Player, store: Arc<dyn KeyValueStore>) -> Self {
        let generator = RandomCrashGenerator::from_entropy(
            config.engine.crash_bound_min,
            config.engine.crash_bound_max,
        );
        Self::with_generator(config, player, store, generator)
    }
}

impl<R: Rng> RoundEngine<R> {
    /// Build an engine around a specific generator, restoring persisted ledgers
    pub fn with_generator(
        config: &GameConfig,
        player: Player,
        store: Arc<dyn KeyValueStore>,
        generator: RandomCrashGenerator<R>,
    ) -> Self {
        let history = HistoryLedger::with_entries(
            storage::load_collection(store.as_ref(), HISTORY_KEY),
            config.history_window(),
            config.ledger.history_capacity,
            Utc::now(),
        );
        let leaderboard = Leaderboard::with_entries(
            storage::load_collection(store.as_ref(), LEADERBOARD_KEY),
            config.ledger.leaderboard_capacity,
        );

        debug!(
            player = player.username(),
            history = history.len(),
            leaderboard = leaderboard.len(),
            "Restored persisted ledgers"
        );

        Self {
            player,
            account: BalanceAccount::new(config.account.starting_balance),
            generator,
            history,
            leaderboard,
            store,
            round: None,
            last_params: None,
            admin: AdminOverride::default(),
            stats: SessionStats::default(),
            step: config.engine.multiplier_step,
            admin_secret: config.admin.secret.clone(),
            allow_deposits: config.engine.allow_deposits,
        }
    }

    /// Debit the wager, fix the crash point and enter `Running`
    pub fn start_round(&mut self, wager: f64, auto_cashout: f64) -> Result<Uuid, RoundError> {
        let status = self.status();
        if !status.accepts_start() {
            return Err(RoundError::InvalidState {
                operation: "start a round",
                status,
            });
        }

        let balance = self.account.balance();
        if !(wager.is_finite() && wager > 0.0 && wager <= balance) {
            return Err(RoundError::InvalidWager { wager, balance });
        }
        // Infinity is accepted and means "never auto cash out"
        if !(auto_cashout >= 1.0) {
            return Err(RoundError::InvalidAutoCashout(auto_cashout));
        }

        // Any cash-out happens below the crash point, so this bounds the payout
        let crash_point = self.generator.generate(self.admin.crash_point());
        if !(balance - wager + round2(wager * crash_point)).is_finite() {
            return Err(RoundError::InvalidWager { wager, balance });
        }

        self.account.debit(wager)?;
        let id = Uuid::new_v4();

        self.round = Some(Round {
            id,
            multiplier: 1.0,
            crash_point,
            status: RoundStatus::Running,
            wager,
            auto_cashout,
        });
        self.last_params = Some(RoundParams {
            wager,
            auto_cashout,
        });
        self.stats.rounds_played += 1;
        self.stats.last_win = 0.0;

        info!(
            round_id = %id,
            player = self.player.username(),
            wager,
            auto_cashout,
            admin = self.admin.crash_point().is_some(),
            "Round started"
        );
        Ok(id)
    }

    /// Start again with the parameters of the previous round
    pub fn restart_last(&mut self) -> Result<Uuid, RoundError> {
        match self.last_params {
            Some(params) => self.start_round(params.wager, params.auto_cashout),
            None => Err(RoundError::InvalidState {
                operation: "restart",
                status: self.status(),
            }),
        }
    }

    /// Advance whichever round is live
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> Result<TickOutcome, RoundError> {
        match self.live_round_id() {
            Some(id) => self.tick_round(id, now),
            None => Ok(TickOutcome::Ignored),
        }
    }

    pub fn tick(&mut self) -> Result<TickOutcome, RoundError> {
        self.tick_at(Utc::now())
    }

    /// Advance round `round_id` by one step.
    ///
    /// Ticks addressed to a round that has already settled, or been replaced,
    /// are ignored. Crash is checked before auto cash-out.
    pub fn tick_round(&mut self, round_id: Uuid, now: DateTime<Utc>) -> Result<TickOutcome, RoundError> {
        let (next, crash_point, auto_cashout) = match &self.round {
            Some(round) if round.id == round_id && round.status == RoundStatus::Running => (
                round2(round.multiplier + self.step),
                round.crash_point,
                round.auto_cashout,
            ),
            _ => return Ok(TickOutcome::Ignored),
        };

        if next >= crash_point {
            self.crash(next, now);
            return Ok(TickOutcome::Crashed {
                crash_point,
                multiplier: next,
            });
        }

        if next >= auto_cashout {
            let receipt = self.settle_cash_out(next)?;
            return Ok(TickOutcome::CashedOut(receipt));
        }

        if let Some(round) = self.round.as_mut() {
            round.multiplier = next;
        }
        debug!(round_id = %round_id, multiplier = next, "Tick");
        Ok(TickOutcome::Climbing { multiplier: next })
    }

    /// Settle the live round at its current multiplier
    pub fn cash_out(&mut self) -> Result<CashOutReceipt, RoundError> {
        match &self.round {
            Some(round) if round.status == RoundStatus::Running => {
                let multiplier = round.multiplier;
                self.settle_cash_out(multiplier)
            }
            _ => Err(RoundError::InvalidState {
                operation: "cash out",
                status: self.status(),
            }),
        }
    }

    fn settle_cash_out(&mut self, multiplier: f64) -> Result<CashOutReceipt, RoundError> {
        let Some(round) = self.round.as_mut() else {
            return Err(RoundError::InvalidState {
                operation: "cash out",
                status: RoundStatus::Idle,
            });
        };

        let win_amount = round2(round.wager * multiplier);
        let balance = self.account.credit(win_amount)?;

        round.multiplier = multiplier;
        round.status = RoundStatus::CashedOut;
        let round_id = round.id;
        let wager = round.wager;

        self.stats.cashouts += 1;
        self.stats.last_win = win_amount;
        self.leaderboard.record(LeaderboardEntry {
            username: self.player.username().to_string(),
            wager,
            cashout_multiplier: multiplier,
            win_amount,
        });
        self.persist_leaderboard();

        info!(
            round_id = %round_id,
            multiplier,
            win_amount,
            balance,
            "Cashed out"
        );

        Ok(CashOutReceipt {
            round_id,
            multiplier,
            win_amount,
            balance,
        })
    }

    fn crash(&mut self, multiplier: f64, now: DateTime<Utc>) {
        let Some(round) = self.round.as_mut() else {
            return;
        };
        round.multiplier = multiplier;
        round.status = RoundStatus::Crashed;
        let (round_id, crash_point, wager) = (round.id, round.crash_point, round.wager);

        self.history.record(crash_point, now);
        self.persist_history();

        info!(round_id = %round_id, crash_point, lost = wager, "Crashed");
    }

    /// Grant admin access if `password` matches the shared secret
    pub fn unlock_admin(&mut self, password: &str) -> Result<(), RoundError> {
        if password != self.admin_secret {
            warn!(player = self.player.username(), "Rejected admin unlock");
            return Err(RoundError::InvalidAdminSecret);
        }
        self.admin.access = true;
        info!(player = self.player.username(), "Admin access granted");
        Ok(())
    }

    /// Crash point used for subsequent rounds. Values at or below 1.0 fall back to random.
    pub fn set_manual_crash_point(&mut self, crash_point: f64) -> Result<(), RoundError> {
        if !self.admin.access {
            return Err(RoundError::AdminAccessRequired);
        }
        if !crash_point.is_finite() {
            return Err(RoundError::InvalidAmount(crash_point));
        }
        self.admin.manual_crash_point = crash_point;
        Ok(())
    }

    pub fn set_admin_override(&mut self, password: &str, crash_point: f64) -> Result<(), RoundError> {
        self.unlock_admin(password)?;
        self.set_manual_crash_point(crash_point)
    }

    pub fn deposit(&mut self, amount: f64) -> Result<f64, RoundError> {
        if !self.allow_deposits {
            return Err(RoundError::DepositsDisabled);
        }
        if !(amount.is_finite() && amount > 0.0) {
            return Err(RoundError::InvalidAmount(amount));
        }
        let balance = self.account.credit(amount)?;
        info!(player = self.player.username(), amount, balance, "Deposit");
        Ok(balance)
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        let round = self.round.as_ref();
        RoundSnapshot {
            round_id: round.map(|r| r.id),
            status: self.status(),
            multiplier: round.map_or(1.0, |r| r.multiplier),
            balance: self.account.balance(),
            wager: round.map_or(0.0, |r| r.wager),
            auto_cashout: round.map_or(0.0, |r| r.auto_cashout),
            crash_point: round
                .filter(|r| r.status == RoundStatus::Crashed)
                .map(|r| r.crash_point),
            last_win: self.stats.last_win,
            rounds_played: self.stats.rounds_played,
            cashouts: self.stats.cashouts,
            admin: self.admin.access,
        }
    }

    pub fn status(&self) -> RoundStatus {
        self.round.as_ref().map_or(RoundStatus::Idle, |r| r.status)
    }

    pub fn multiplier(&self) -> f64 {
        self.round.as_ref().map_or(1.0, |r| r.multiplier)
    }

    pub fn balance(&self) -> f64 {
        self.account.balance()
    }

    /// Id of the current round, settled or not
    pub fn round_id(&self) -> Option<Uuid> {
        self.round.as_ref().map(|r| r.id)
    }

    fn live_round_id(&self) -> Option<Uuid> {
        self.round
            .as_ref()
            .filter(|r| r.status == RoundStatus::Running)
            .map(|r| r.id)
    }

    pub fn last_params(&self) -> Option<RoundParams> {
        self.last_params
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.history.snapshot()
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        self.leaderboard.snapshot()
    }

    fn persist_history(&self) {
        if let Err(e) = storage::store_collection(self.store.as_ref(), HISTORY_KEY, self.history.snapshot()) {
            warn!(error = %e, "Failed to persist crash history");
        }
    }

    fn persist_leaderboard(&self) {
        if let Err(e) =
            storage::store_collection(self.store.as_ref(), LEADERBOARD_KEY, self.leaderboard.snapshot())
        {
            warn!(error = %e, "Failed to persist leaderboard");
        }
    }
}
