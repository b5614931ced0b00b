pub mod account;
pub mod job;
pub mod settings;
pub mod usage;

pub use account::{Account, AccountStatus, Provider};
pub use job::{RefreshOutcome, SwitchParams};
pub use settings::{AppSettings, SettingsPatch};
pub use usage::{QuotaSummary, UsageData};
