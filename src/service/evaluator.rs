use crate::types::account::{Account, AccountStatus};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;

/// Policy for accounts whose expiry timestamp was never recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingExpiry {
    /// Leave the account alone this sweep.
    Skip,
    /// Treat it as due now, so the sweep establishes a real timestamp.
    RefreshNow,
}

/// Decide whether an account's token is due for renewal: it expires within
/// `threshold` of `now`, or has already expired. Suspended accounts are never
/// due.
pub fn needs_refresh(
    account: &Account,
    threshold: Duration,
    now: DateTime<Utc>,
    missing: MissingExpiry,
) -> bool {
    if account.status == AccountStatus::Banned {
        return false;
    }
    let Some(expires_at) = account.expires_at else {
        return missing == MissingExpiry::RefreshNow;
    };
    let threshold = ChronoDuration::from_std(threshold).unwrap_or(ChronoDuration::zero());
    expires_at - now < threshold
}
