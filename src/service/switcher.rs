use crate::backend::AccountBackend;
use crate::error::KeeperError;
use crate::types::account::Account;
use crate::types::job::SwitchParams;
use crate::types::settings::AppSettings;
use crate::types::usage::QuotaSummary;
use std::sync::Arc;
use tracing::{info, warn};

/// How the machine identity is handled during a switch, derived from the
/// operator's settings before any side effect happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityStrategy {
    /// Apply the account's bound identity, creating the binding on first use.
    UseBound,
    /// Generate a throwaway identity; optionally record it as the binding.
    GenerateFresh { maintain_binding: bool },
    /// Leave the machine identity untouched.
    NoChange,
}

/// Collapse the three identity flags into one decision. Binding is only in
/// play when identity rotation is enabled at all.
pub fn decide_identity_strategy(settings: &AppSettings) -> IdentityStrategy {
    if !settings.auto_change_machine_id {
        return IdentityStrategy::NoChange;
    }
    if settings.bind_machine_id_to_account && settings.use_bound_machine_id {
        IdentityStrategy::UseBound
    } else {
        IdentityStrategy::GenerateFresh {
            maintain_binding: settings.bind_machine_id_to_account,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchSummary {
    pub email: String,
    pub provider: String,
    pub quota: QuotaSummary,
}

/// Lifecycle of one switch attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SwitchPhase {
    AwaitingConfirmation,
    RebindingIdentity,
    Switching,
    Succeeded(SwitchSummary),
    Failed(String),
}

/// A pending switch: created by `request`, resolved by `confirm` or dropped
/// by `cancel`.
pub struct SwitchRequest {
    pub account: Account,
    pub phase: SwitchPhase,
}

impl SwitchRequest {
    /// Abandon the request. No backend call has happened yet, so there is
    /// nothing to undo.
    pub fn cancel(self) {
        info!(email = %self.account.email, "switch cancelled");
    }
}

pub struct SwitchOrchestrator {
    backend: Arc<dyn AccountBackend>,
}

impl SwitchOrchestrator {
    pub fn new(backend: Arc<dyn AccountBackend>) -> Self {
        Self { backend }
    }

    /// Stage a switch to `account`. Accounts that cannot become active land
    /// directly in the failed phase, before any backend call.
    pub fn request(&self, account: Account) -> SwitchRequest {
        let phase = if account.has_auth_tokens() {
            SwitchPhase::AwaitingConfirmation
        } else {
            SwitchPhase::Failed(KeeperError::MissingTokens.to_string())
        };
        SwitchRequest { account, phase }
    }

    /// Execute a staged switch. The terminal phase is always reached:
    /// `Succeeded` with a quota summary, or `Failed` with a message.
    pub async fn confirm(&self, request: &mut SwitchRequest) {
        if request.phase != SwitchPhase::AwaitingConfirmation {
            return;
        }

        let settings = match self.backend.get_settings().await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "settings unavailable for switch, using defaults");
                AppSettings::default()
            }
        };
        let strategy = decide_identity_strategy(&settings);

        request.phase = SwitchPhase::RebindingIdentity;
        let applied_bound = self.rebind_identity(&request.account, strategy).await;

        // rotate only when no bound identity was just applied
        let reset_machine_id = match strategy {
            IdentityStrategy::GenerateFresh { .. } => true,
            IdentityStrategy::UseBound => !applied_bound,
            IdentityStrategy::NoChange => false,
        };

        request.phase = SwitchPhase::Switching;
        let params = match SwitchParams::from_account(&request.account, reset_machine_id) {
            Ok(p) => p,
            Err(e) => {
                request.phase = SwitchPhase::Failed(e.to_string());
                return;
            }
        };
        match self.backend.switch_active(&params).await {
            Ok(()) => {
                let quota = request
                    .account
                    .usage_data
                    .as_ref()
                    .map(|u| u.quota_summary())
                    .unwrap_or_default();
                info!(email = %request.account.email, "switch complete");
                request.phase = SwitchPhase::Succeeded(SwitchSummary {
                    email: request.account.email.clone(),
                    provider: request.account.provider.as_str().to_string(),
                    quota,
                });
            }
            Err(e) => {
                warn!(email = %request.account.email, error = %e, "switch failed");
                request.phase = SwitchPhase::Failed(e.to_string());
            }
        }
    }

    /// Carry out the identity strategy. Returns whether a bound identity was
    /// actually applied. Binding bookkeeping failures degrade to a warning:
    /// they must never block the switch itself.
    async fn rebind_identity(&self, account: &Account, strategy: IdentityStrategy) -> bool {
        match strategy {
            IdentityStrategy::NoChange => false,
            IdentityStrategy::GenerateFresh { maintain_binding } => {
                // ensure a binding exists without applying it; an account
                // that is already bound keeps its identity value
                if maintain_binding {
                    match self.backend.bound_machine_id(&account.id).await {
                        Ok(Some(_)) => {}
                        Ok(None) => {
                            let fresh = self.backend.generate_machine_id();
                            if let Err(e) = self.backend.bind_machine_id(&account.id, &fresh).await
                            {
                                warn!(email = %account.email, error = %e, "creating machine binding failed");
                            }
                        }
                        Err(e) => {
                            warn!(email = %account.email, error = %e, "machine binding lookup failed");
                        }
                    }
                }
                false
            }
            IdentityStrategy::UseBound => {
                let bound = match self.backend.bound_machine_id(&account.id).await {
                    Ok(Some(id)) => Some(id),
                    Ok(None) => {
                        // first use: mint and record the binding
                        let fresh = self.backend.generate_machine_id();
                        match self.backend.bind_machine_id(&account.id, &fresh).await {
                            Ok(()) => Some(fresh),
                            Err(e) => {
                                warn!(email = %account.email, error = %e, "creating machine binding failed");
                                None
                            }
                        }
                    }
                    Err(e) => {
                        warn!(email = %account.email, error = %e, "machine binding lookup failed");
                        None
                    }
                };
                match bound {
                    Some(id) => match self.backend.apply_machine_id(&id).await {
                        Ok(()) => true,
                        Err(e) => {
                            warn!(email = %account.email, error = %e, "applying bound machine id failed");
                            false
                        }
                    },
                    None => false,
                }
            }
        }
    }
}
