//! Plan quota and plan changes

pub mod manager;
pub mod quota;

pub use manager::{apply_downgrade, apply_upgrade, SubscriptionManager};
pub use quota::{can_generate, evaluate, refresh_cycle, QuotaDecision};
