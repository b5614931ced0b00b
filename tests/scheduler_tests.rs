mod common;

use common::{account_expiring_in, account_without_expiry, MockBackend};
use kiro_keeper::service::scheduler::{self, SweepKind};
use kiro_keeper::service::RefreshScheduler;
use kiro_keeper::types::account::AccountStatus;
use kiro_keeper::types::settings::AppSettings;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

fn minutes(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}

#[tokio::test(start_paused = true)]
async fn restart_replaces_the_previous_timer() {
    let backend = Arc::new(MockBackend::new());
    backend.add_account(account_expiring_in("a@example.com", 60));

    let mut sched = RefreshScheduler::new(backend.clone());
    // cold-start sweep plus ticks at 5 and 10 minutes
    sched.start(minutes(5));
    tokio::time::sleep(minutes(11)).await;
    assert_eq!(backend.list_calls(), 3);

    // restarting runs its own cold-start sweep, then the old cadence must be
    // gone: a five-minute timer would fire six more times in half an hour
    sched.start(minutes(60));
    tokio::time::sleep(minutes(30)).await;
    assert_eq!(backend.list_calls(), 4, "old cadence kept firing after restart");
}

#[tokio::test(start_paused = true)]
async fn stop_halts_future_sweeps() {
    let backend = Arc::new(MockBackend::new());
    backend.add_account(account_expiring_in("a@example.com", 60));

    let mut sched = RefreshScheduler::new(backend.clone());
    sched.start(Duration::from_secs(60));
    tokio::time::sleep(Duration::from_secs(150)).await;
    assert_eq!(backend.list_calls(), 3);

    sched.stop();
    assert!(!sched.is_running());
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(backend.list_calls(), 3);
}

#[tokio::test]
async fn disabled_auto_refresh_makes_sweeps_a_no_op() {
    let backend = Arc::new(MockBackend::new());
    backend.add_account(account_expiring_in("a@example.com", -5));
    backend.set_settings(AppSettings {
        auto_refresh: false,
        ..AppSettings::default()
    });

    let sched = RefreshScheduler::new(backend.clone());
    sched.sweep_now(SweepKind::Periodic).await;

    assert_eq!(backend.settings_calls(), 1, "settings must still be consulted");
    assert_eq!(backend.list_calls(), 0);
    assert!(backend.renewed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn timer_keeps_ticking_while_auto_refresh_is_disabled() {
    let backend = Arc::new(MockBackend::new());
    backend.add_account(account_expiring_in("a@example.com", -5));
    backend.set_settings(AppSettings {
        auto_refresh: false,
        auto_refresh_interval: 1,
        ..AppSettings::default()
    });

    let mut sched = RefreshScheduler::new(backend.clone());
    sched.apply_settings().await;
    assert!(sched.is_running(), "restart is unconditional");

    tokio::time::sleep(Duration::from_secs(210)).await;
    // cold-start sweep plus three ticks, all of them no-ops
    assert_eq!(backend.settings_calls(), 5);
    assert_eq!(backend.list_calls(), 0);
    assert!(backend.renewed().is_empty());
}

#[tokio::test]
async fn startup_sweep_skips_accounts_without_expiry() {
    let backend = Arc::new(MockBackend::new());
    let due = account_expiring_in("due@example.com", 3);
    let fresh = account_expiring_in("fresh@example.com", 120);
    let mut banned = account_expiring_in("banned@example.com", -10);
    banned.status = AccountStatus::Banned;
    let unknown = account_without_expiry("unknown@example.com");
    backend.add_account(due.clone());
    backend.add_account(fresh.clone());
    backend.add_account(banned.clone());
    backend.add_account(unknown.clone());

    let sched = RefreshScheduler::new(backend.clone());
    sched.sweep_now(SweepKind::Startup).await;
    assert_eq!(backend.renewed(), vec![due.id.clone()]);

    // the periodic sweep pulls never-evaluated accounts in
    sched.sweep_now(SweepKind::Periodic).await;
    let renewed = backend.renewed();
    assert_eq!(renewed.len(), 2);
    assert!(renewed.contains(&unknown.id));
}

#[tokio::test(start_paused = true)]
async fn stopping_the_timer_never_cancels_in_flight_renewals() {
    let backend = Arc::new(MockBackend::new());
    backend.add_account(account_expiring_in("a@example.com", 1));
    backend.set_renew_delay(Duration::from_secs(30));

    let mut sched = RefreshScheduler::new(backend.clone());
    sched.start(Duration::from_secs(60));
    // the cold-start sweep begins a renewal that runs until t=30
    tokio::time::sleep(Duration::from_secs(5)).await;
    sched.stop();
    assert!(backend.renewed().is_empty(), "renewal should still be in flight");

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(backend.renewed().len(), 1, "in-flight renewal was cancelled");
}

#[tokio::test]
async fn refresh_all_skips_only_suspended_accounts() {
    let backend = Arc::new(MockBackend::new());
    let fresh = account_expiring_in("fresh@example.com", 120);
    let expired = account_expiring_in("expired@example.com", -5);
    let mut banned = account_expiring_in("banned@example.com", -5);
    banned.status = AccountStatus::Banned;
    backend.add_account(fresh.clone());
    backend.add_account(expired.clone());
    backend.add_account(banned.clone());

    let sched = RefreshScheduler::new(backend.clone());
    let outcomes = sched.refresh_all().await;

    assert_eq!(outcomes.len(), 2, "refresh-all ignores expiry, not suspension");
    let renewed = backend.renewed();
    assert!(renewed.contains(&fresh.id));
    assert!(renewed.contains(&expired.id));
    assert!(!renewed.contains(&banned.id));
}

#[tokio::test(start_paused = true)]
async fn settings_event_restarts_the_timer() {
    let backend = Arc::new(MockBackend::new());
    backend.add_account(account_expiring_in("a@example.com", 60));
    backend.set_settings(AppSettings {
        auto_refresh_interval: 1,
        ..AppSettings::default()
    });

    let (tx, rx) = broadcast::channel(4);
    let sched = RefreshScheduler::new(backend.clone());
    let driver = tokio::spawn(scheduler::run(sched, rx));

    // cold-start sweep only; the first periodic tick is a minute out
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(backend.list_calls(), 1);

    // disabling auto refresh restarts the timer; further ticks are no-ops
    backend.set_settings(AppSettings {
        auto_refresh: false,
        ..AppSettings::default()
    });
    tx.send(()).expect("scheduler driver dropped its receiver");

    tokio::time::sleep(minutes(10)).await;
    assert_eq!(backend.list_calls(), 1, "disabled sweeps still listed accounts");

    driver.abort();
}
