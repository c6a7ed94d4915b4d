//! Savings engine.
//!
//! The [`Engine`] owns the application record (settings, transaction log,
//! piggy bank and rollover watermark) and is the only place where it changes.
//! Every change is applied to a copy, saved through the [`StateStore`] and
//! only then made visible, so a failed save leaves the previous state intact.
//!
//! The host calls [`Engine::reconcile`] at startup and after each command: it
//! banks the savings of every full day elapsed since the last run.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use chrono::{Local, NaiveDate, Utc};
use tokio::{sync::Mutex, task::JoinSet};
use tracing::{debug, info, warn};

pub use budget::{daily_allowance, days_in_month, variable_spend};
pub use error::EngineError;
pub use mirror::{NoopMirror, RemoteFilter, RemoteMirror};
pub use money::Money;
pub use piggy_bank::{PiggyBank, TIERS, next_tier};
pub use rollover::{Rollover, RolloverOutcome, rollover};
pub use settings::{FixedExpense, Settings};
pub use state::AppState;
pub use store::{JsonFileStore, MemoryStore, StateStore};
pub use summary::{DailyStats, DayView, MonthSummary};
pub use transactions::{DATE_FORMAT, Tag, Transaction, format_date, parse_date};

mod budget;
mod error;
mod mirror;
mod money;
mod piggy_bank;
mod rollover;
mod settings;
mod state;
mod store;
mod summary;
mod transactions;

pub type ResultEngine<T> = Result<T, EngineError>;

/// Result of [`Engine::reconcile`].
#[derive(Clone, Debug, PartialEq)]
pub enum Reconciliation {
    /// Another reconciliation is running; this call did nothing.
    InProgress,
    NotOnboarded,
    UpToDate,
    Applied(Rollover),
}

impl From<RolloverOutcome> for Reconciliation {
    fn from(value: RolloverOutcome) -> Self {
        match value {
            RolloverOutcome::NotOnboarded => Self::NotOnboarded,
            RolloverOutcome::UpToDate => Self::UpToDate,
            RolloverOutcome::Applied(rollover) => Self::Applied(rollover),
        }
    }
}

/// A transaction as entered by the user.
#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub amount: Money,
    pub tags: Vec<Tag>,
    pub note: Option<String>,
}

/// Clears the in-progress flag when the reconciliation ends, error or not.
struct ReconcileGuard<'a>(&'a AtomicBool);

impl<'a> ReconcileGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ReconcileGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct Engine {
    state: Arc<Mutex<AppState>>,
    store: Arc<dyn StateStore>,
    mirror: Arc<dyn RemoteMirror>,
    reconciling: Arc<AtomicBool>,
    pending_mirror: Arc<Mutex<JoinSet<()>>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("store", &self.store)
            .field("mirror_enabled", &self.mirror.is_enabled())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Copy of the current record.
    pub async fn snapshot(&self) -> AppState {
        self.state.lock().await.clone()
    }

    /// Banks the savings of every full day between the watermark and `today`.
    ///
    /// Safe to call any number of times: days up to the watermark are never
    /// replayed. On error nothing is saved and the state is unchanged.
    pub async fn reconcile(&self, today: NaiveDate) -> ResultEngine<Reconciliation> {
        let Some(_guard) = ReconcileGuard::acquire(&self.reconciling) else {
            debug!("reconciliation already in progress, skipping");
            return Ok(Reconciliation::InProgress);
        };

        let mut state = self.state.lock().await;
        let outcome = rollover::rollover(
            &state.settings,
            &state.transactions,
            &state.piggy_bank,
            &state.last_processed_date,
            today,
        )?;

        let rollover = match outcome {
            RolloverOutcome::Applied(rollover) => rollover,
            skipped => {
                debug!("nothing to reconcile: {skipped:?}");
                return Ok(skipped.into());
            }
        };

        let mut next = state.clone();
        next.piggy_bank = rollover.piggy_bank.clone();
        next.last_processed_date = rollover.last_processed_date.clone();
        self.store.save(&next)?;
        *state = next;

        info!(
            "reconciled {} day(s) through {}, banked {}",
            rollover.days.len(),
            rollover.last_processed_date,
            rollover.banked()
        );
        Ok(Reconciliation::Applied(rollover))
    }

    /// Appends a transaction to the log and mirrors it remotely when a remote
    /// environment is configured.
    pub async fn add_transaction(&self, new: NewTransaction) -> ResultEngine<Transaction> {
        let tx = Transaction::new(
            new.date,
            new.amount,
            new.tags,
            new.note.as_deref(),
            Utc::now(),
        )?;

        let stored = tx.clone();
        let env_id = self
            .commit(move |state| {
                state.transactions.push(stored);
                Ok(state.settings.cloud_env().map(ToString::to_string))
            })
            .await?;
        info!("added transaction {} of {} on {}", tx.id, tx.amount, tx.date);

        if let Some(env_id) = env_id
            && self.mirror.is_enabled()
        {
            let mirror = Arc::clone(&self.mirror);
            let mirrored = tx.clone();
            let mut pending = self.pending_mirror.lock().await;
            // Reap appends that already finished so the set stays small.
            while pending.try_join_next().is_some() {}
            pending.spawn(async move {
                match mirror.append(&env_id, &mirrored).await {
                    Ok(()) => debug!("mirrored transaction {}", mirrored.id),
                    Err(err) => warn!("failed to mirror transaction {}: {err}", mirrored.id),
                }
            });
        }

        Ok(tx)
    }

    /// Waits for the remote appends still running.
    pub async fn flush_mirror(&self) {
        let mut pending = self.pending_mirror.lock().await;
        while pending.join_next().await.is_some() {}
    }

    /// Reads the remote transactions. Nothing is merged into the local log.
    pub async fn pull_remote(&self, filter: RemoteFilter) -> ResultEngine<Vec<Transaction>> {
        let env_id = {
            let state = self.state.lock().await;
            state.settings.cloud_env().map(ToString::to_string)
        };
        let Some(env_id) = env_id.filter(|_| self.mirror.is_enabled()) else {
            debug!("remote mirror disabled, nothing to pull");
            return Ok(Vec::new());
        };
        let remote = self.mirror.fetch(&env_id, filter).await?;
        info!("fetched {} remote transaction(s)", remote.len());
        Ok(remote)
    }

    /// Applies `f` to the settings, marks them updated and saves.
    pub async fn update_settings<F, T>(&self, f: F) -> ResultEngine<T>
    where
        F: FnOnce(&mut Settings) -> ResultEngine<T>,
    {
        self.commit(|state| {
            let value = f(&mut state.settings)?;
            state.settings.updated_at = Utc::now();
            Ok(value)
        })
        .await
    }

    /// Sets the monthly budget and completes onboarding.
    pub async fn set_monthly_budget(&self, amount: Money) -> ResultEngine<()> {
        self.update_settings(|settings| {
            settings.monthly_budget = amount;
            settings.is_onboarded = true;
            Ok(())
        })
        .await?;
        info!("monthly budget set to {amount}");
        Ok(())
    }

    pub async fn add_fixed_expense(&self, label: &str, amount: Money) -> ResultEngine<FixedExpense> {
        let expense = FixedExpense::new(label, amount)?;
        let stored = expense.clone();
        self.update_settings(move |settings| {
            settings.fixed_expenses.push(stored);
            Ok(())
        })
        .await?;
        info!("added fixed expense '{}' of {}", expense.label, expense.amount);
        Ok(expense)
    }

    pub async fn remove_fixed_expense(&self, id: &str) -> ResultEngine<FixedExpense> {
        self.update_settings(|settings| {
            let index = settings
                .fixed_expenses
                .iter()
                .position(|e| e.id == id)
                .ok_or_else(|| EngineError::KeyNotFound(id.to_string()))?;
            Ok(settings.fixed_expenses.remove(index))
        })
        .await
    }

    /// Enables (`Some`) or disables (`None`) remote mirroring.
    pub async fn set_cloud_env(&self, env_id: Option<String>) -> ResultEngine<()> {
        self.update_settings(|settings| {
            settings.cloud_env_id = env_id
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            Ok(())
        })
        .await
    }

    pub async fn month_summary(&self, reference: NaiveDate) -> ResultEngine<MonthSummary> {
        let state = self.state.lock().await;
        summary::month_summary(&state.settings, &state.transactions, reference)
    }

    pub async fn day_view(&self, date: NaiveDate) -> DayView {
        let state = self.state.lock().await;
        summary::day_view(&state.settings, &state.transactions, date)
    }

    pub async fn calendar(&self, reference: NaiveDate) -> Vec<DailyStats> {
        let state = self.state.lock().await;
        summary::calendar(&state.settings, &state.transactions, reference)
    }

    /// Restores a fresh record with the watermark at `today`.
    pub async fn reset(&self, today: NaiveDate) -> ResultEngine<()> {
        self.commit(|state| {
            *state = AppState::new(today, Utc::now());
            Ok(())
        })
        .await?;
        warn!("application state reset");
        Ok(())
    }

    /// Runs `f` on a copy of the record, validates and saves the copy, then
    /// publishes it. Any error leaves the current record untouched.
    async fn commit<F, T>(&self, f: F) -> ResultEngine<T>
    where
        F: FnOnce(&mut AppState) -> ResultEngine<T>,
    {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let value = f(&mut next)?;
        next.validate()?;
        self.store.save(&next)?;
        *state = next;
        Ok(value)
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Arc<dyn StateStore>>,
    mirror: Option<Arc<dyn RemoteMirror>>,
    today: Option<NaiveDate>,
}

impl EngineBuilder {
    /// Pass the store holding the record. Defaults to a [`MemoryStore`].
    pub fn store(mut self, store: Arc<dyn StateStore>) -> EngineBuilder {
        self.store = Some(store);
        self
    }

    /// Pass the remote mirror. Defaults to [`NoopMirror`].
    pub fn mirror(mut self, mirror: Arc<dyn RemoteMirror>) -> EngineBuilder {
        self.mirror = Some(mirror);
        self
    }

    /// Day used as watermark when the store is empty. Defaults to the local
    /// date.
    pub fn today(mut self, today: NaiveDate) -> EngineBuilder {
        self.today = Some(today);
        self
    }

    /// Construct `Engine`, loading the stored record or creating a fresh one.
    pub fn build(self) -> ResultEngine<Engine> {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let mirror = self.mirror.unwrap_or_else(|| Arc::new(NoopMirror));

        let state = match store.load()? {
            Some(state) => {
                state.validate()?;
                debug!(
                    "loaded state with {} transaction(s), watermark {}",
                    state.transactions.len(),
                    state.last_processed_date
                );
                state
            }
            None => {
                let today = self.today.unwrap_or_else(|| Local::now().date_naive());
                let state = AppState::new(today, Utc::now());
                store.save(&state)?;
                info!("created new state with watermark {}", state.last_processed_date);
                state
            }
        };

        Ok(Engine {
            state: Arc::new(Mutex::new(state)),
            store,
            mirror,
            reconciling: Arc::new(AtomicBool::new(false)),
            pending_mirror: Arc::new(Mutex::new(JoinSet::new())),
        })
    }
}
