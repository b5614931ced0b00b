use crate::backend::AccountBackend;
use crate::config::CONFIG;
use crate::service::coordinator::RefreshCoordinator;
use crate::service::evaluator::{self, MissingExpiry};
use crate::types::account::AccountStatus;
use crate::types::job::RefreshOutcome;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Which kind of sweep is running. A cold-start sweep stays cheap by leaving
/// never-evaluated accounts alone; the periodic sweep pulls them in so every
/// account eventually gets a real expiry timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepKind {
    Startup,
    Periodic,
}

impl SweepKind {
    fn missing_expiry(self) -> MissingExpiry {
        match self {
            SweepKind::Startup => MissingExpiry::Skip,
            SweepKind::Periodic => MissingExpiry::RefreshNow,
        }
    }
}

/// Owns the periodic sweep timer. `start` and `stop` may be called any number
/// of times, in any order; at most one timer runs at once. Stopping cancels
/// future ticks only: a sweep already running keeps its renewals alive because
/// each sweep runs as its own detached task.
pub struct RefreshScheduler {
    backend: Arc<dyn AccountBackend>,
    coordinator: RefreshCoordinator,
    timer: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    pub fn new(backend: Arc<dyn AccountBackend>) -> Self {
        let coordinator = RefreshCoordinator::new(backend.clone());
        Self {
            backend,
            coordinator,
            timer: None,
        }
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub fn is_running(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Start (or restart) the timer with the given cadence. One cold-start
    /// sweep runs right away; periodic sweeps follow every interval.
    pub fn start(&mut self, interval: Duration) {
        self.stop();
        let coordinator = self.coordinator.clone();
        let backend = self.backend.clone();
        info!(interval_secs = interval.as_secs(), "refresh timer started");
        {
            let coordinator = coordinator.clone();
            let backend = backend.clone();
            tokio::spawn(async move {
                run_sweep(&backend, &coordinator, SweepKind::Startup).await;
            });
        }
        self.timer = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let coordinator = coordinator.clone();
                let backend = backend.clone();
                // detached so an aborted timer never cancels in-flight work
                tokio::spawn(async move {
                    run_sweep(&backend, &coordinator, SweepKind::Periodic).await;
                });
            }
        }));
    }

    /// Cancel the timer if one is running. In-flight sweeps are unaffected.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            info!("refresh timer stopped");
        }
    }

    /// Re-read settings and restart the timer with the current cadence. The
    /// restart is unconditional, and the timer keeps ticking even with auto
    /// refresh disabled (each sweep re-checks the flag and no-ops), which
    /// keeps restart logic independent of which setting flipped. Unreadable
    /// settings fall back to the default cadence rather than killing the
    /// timer.
    pub async fn apply_settings(&mut self) {
        let settings = match self.backend.get_settings().await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "settings unavailable, keeping default cadence");
                Default::default()
            }
        };
        self.start(settings.refresh_interval());
    }

    /// Run one sweep immediately, outside the timer.
    pub async fn sweep_now(&self, kind: SweepKind) {
        run_sweep(&self.backend, &self.coordinator, kind).await;
    }

    /// Renew every account regardless of expiry, skipping only suspended
    /// ones. Manual "refresh all" entry point.
    pub async fn refresh_all(&self) -> Vec<RefreshOutcome> {
        let accounts = match self.backend.list_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                warn!(error = %e, "cannot list accounts for refresh-all");
                return Vec::new();
            }
        };
        let targets: Vec<_> = accounts
            .into_iter()
            .filter(|a| a.status != AccountStatus::Banned)
            .collect();
        self.coordinator.refresh_batch(targets).await
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One sweep: evaluate every account against the expiry threshold and renew
/// the due ones concurrently. Every failure mode short-circuits to a no-op;
/// the next tick gets another chance.
async fn run_sweep(
    backend: &Arc<dyn AccountBackend>,
    coordinator: &RefreshCoordinator,
    kind: SweepKind,
) {
    let settings = match backend.get_settings().await {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "sweep skipped: settings unavailable");
            return;
        }
    };
    if !settings.auto_refresh {
        debug!("sweep skipped: auto refresh disabled");
        return;
    }
    let accounts = match backend.list_accounts().await {
        Ok(accounts) => accounts,
        Err(e) => {
            warn!(error = %e, "sweep skipped: cannot list accounts");
            return;
        }
    };

    let now = Utc::now();
    let threshold = CONFIG.expiry_threshold();
    let due: Vec<_> = accounts
        .into_iter()
        .filter(|a| evaluator::needs_refresh(a, threshold, now, kind.missing_expiry()))
        .collect();
    if due.is_empty() {
        debug!("sweep found no tokens due for renewal");
        return;
    }

    info!(due = due.len(), kind = ?kind, "sweep renewing due tokens");
    let outcomes = coordinator.refresh_batch(due).await;
    let failed = outcomes.iter().filter(|o| !o.succeeded).count();
    info!(
        renewed = outcomes.len() - failed,
        failed, "sweep finished"
    );
}

/// Drive the scheduler: arm the timer from current settings (which runs the
/// cold-start sweep), then rearm on every settings-changed notification.
pub async fn run(mut scheduler: RefreshScheduler, mut settings_events: broadcast::Receiver<()>) {
    scheduler.apply_settings().await;
    loop {
        match settings_events.recv().await {
            Ok(()) => scheduler.apply_settings().await,
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                debug!(missed, "settings events lagged, reapplying");
                scheduler.apply_settings().await;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
