use crate::backend::AccountBackend;
use crate::error::KeeperError;
use crate::types::account::{Account, AccountStatus};
use crate::types::job::RefreshOutcome;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

/// Fans a batch of renewals out across one task per account and fans the
/// per-account outcomes back in. One account failing never aborts the rest.
///
/// An in-flight set keyed by account id makes renewals idempotent across
/// overlapping sweeps: a sweep that finds an account already being renewed
/// skips it instead of racing it.
#[derive(Clone)]
pub struct RefreshCoordinator {
    backend: Arc<dyn AccountBackend>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl RefreshCoordinator {
    pub fn new(backend: Arc<dyn AccountBackend>) -> Self {
        Self {
            backend,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn claim(&self, id: &str) -> bool {
        self.in_flight.lock().expect("in-flight set poisoned").insert(id.to_string())
    }

    fn release(&self, id: &str) {
        self.in_flight.lock().expect("in-flight set poisoned").remove(id);
    }

    /// Renew every account in `accounts` concurrently, yielding outcomes as
    /// they complete. Accounts already being renewed elsewhere are skipped
    /// silently.
    pub fn refresh_stream(
        &self,
        accounts: Vec<Account>,
    ) -> ReceiverStream<RefreshOutcome> {
        let (tx, rx) = mpsc::channel(accounts.len().max(1));
        for account in accounts {
            if !self.claim(&account.id) {
                debug!(email = %account.email, "renewal already in flight, skipping");
                continue;
            }
            let this = self.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = match this.backend.renew_token(&account.id).await {
                    Ok(renewed) => {
                        info!(email = %renewed.email, "token renewed");
                        RefreshOutcome::success(&renewed)
                    }
                    Err(e) => {
                        warn!(email = %account.email, error = %e, "token renewal failed");
                        RefreshOutcome::failure(&account, &e)
                    }
                };
                this.release(&account.id);
                // receiver may have been dropped; nothing left to do then
                let _ = tx.send(outcome).await;
            });
        }
        // remaining senders live in the spawned tasks; the stream ends when
        // the last one finishes
        drop(tx);
        ReceiverStream::new(rx)
    }

    /// Renew a batch and wait for every outcome.
    pub async fn refresh_batch(&self, accounts: Vec<Account>) -> Vec<RefreshOutcome> {
        use futures::StreamExt;
        let mut stream = self.refresh_stream(accounts);
        let mut outcomes = Vec::new();
        while let Some(outcome) = stream.next().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Full manual sync of one account: renew, refresh usage, re-derive
    /// status. Failures are recorded on the account before propagating.
    pub async fn sync_one(&self, account_id: &str) -> Result<Account, KeeperError> {
        if !self.claim(account_id) {
            return Err(KeeperError::RenewalInFlight(account_id.to_string()));
        }
        let result = self.backend.sync_account(account_id).await;
        self.release(account_id);
        match result {
            Ok(account) => Ok(account),
            Err(e) => {
                let status = if e.is_token_invalid() {
                    AccountStatus::TokenInvalid
                } else {
                    AccountStatus::RefreshFailed
                };
                if let Err(mark_err) = self.backend.mark_status(account_id, status).await {
                    warn!(error = %mark_err, "failed to record sync failure status");
                }
                Err(e)
            }
        }
    }
}
