//! Domain model
//!
//! Plain Rust types for users, children, stories and the plan catalog.
//! These carry no serde naming concerns: persisted rows are mapped in
//! [`crate::storage::records`] and API payloads in [`crate::server::dto`].

pub mod customization;
mod keyword;
pub mod plan;
pub mod story;
pub mod user;

pub use customization::{
    AdventureType, ArtStyle, Customization, Mood, RawCustomization, ReadingLevel, StoryLength,
};
pub use plan::{catalog, find_plan, PlanTier, StoryAllowance, SubscriptionPlan};
pub use story::{ContentOrigin, NewStory, PromptInputs, Story};
pub use user::{
    billing_cycle, Child, NewChild, NewUser, Subscription, SubscriptionStatus, User,
    BILLING_CYCLE_DAYS,
};
