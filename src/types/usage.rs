//! Canonical quota/usage schema.
//!
//! The usage API has shipped both camelCase and snake_case spellings of the
//! same payload. Normalization happens here, once, at the decode boundary via
//! serde aliases; nothing downstream branches on field naming.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UsageData {
    #[serde(default, alias = "usage_breakdown_list")]
    pub usage_breakdown_list: Vec<UsageBreakdown>,
    #[serde(default, alias = "subscription_info")]
    pub subscription_info: Option<SubscriptionInfo>,
    #[serde(default, alias = "days_until_reset")]
    pub days_until_reset: Option<i32>,
    #[serde(default, alias = "next_date_reset")]
    pub next_date_reset: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UsageBreakdown {
    #[serde(default, alias = "usage_limit")]
    pub usage_limit: Option<f64>,
    #[serde(default, alias = "current_usage")]
    pub current_usage: Option<f64>,
    #[serde(default, alias = "next_date_reset")]
    pub next_date_reset: Option<f64>,
    #[serde(default, alias = "free_trial_info")]
    pub free_trial_info: Option<FreeTrialInfo>,
    #[serde(default)]
    pub bonuses: Vec<BonusInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FreeTrialInfo {
    #[serde(default, alias = "usage_limit")]
    pub usage_limit: Option<f64>,
    #[serde(default, alias = "current_usage")]
    pub current_usage: Option<f64>,
    #[serde(default, alias = "free_trial_expiry")]
    pub free_trial_expiry: Option<f64>,
    #[serde(default, alias = "free_trial_status")]
    pub free_trial_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BonusInfo {
    #[serde(default, alias = "display_name")]
    pub display_name: Option<String>,
    #[serde(default, alias = "usage_limit")]
    pub usage_limit: Option<f64>,
    #[serde(default, alias = "current_usage")]
    pub current_usage: Option<f64>,
    #[serde(default, alias = "expires_at")]
    pub expires_at: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionInfo {
    #[serde(default, alias = "subscription_title")]
    pub subscription_title: Option<String>,
    #[serde(default, rename = "type")]
    pub subscription_type: Option<String>,
}

/// Human-facing used/limit pair shown after a successful switch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotaSummary {
    pub used: f64,
    pub limit: f64,
}

impl Default for QuotaSummary {
    fn default() -> Self {
        // Matches the fallback the account table shows for accounts that have
        // never synced usage.
        Self {
            used: 0.0,
            limit: 50.0,
        }
    }
}

impl QuotaSummary {
    pub fn remaining(&self) -> f64 {
        self.limit - self.used
    }
}

impl UsageData {
    /// Summary of the main allowance, from the first breakdown entry.
    pub fn quota_summary(&self) -> QuotaSummary {
        let breakdown = self.usage_breakdown_list.first();
        QuotaSummary {
            used: breakdown.and_then(|b| b.current_usage).unwrap_or(0.0),
            limit: breakdown.and_then(|b| b.usage_limit).unwrap_or(50.0),
        }
    }
}
