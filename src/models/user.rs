//! Parent accounts and child profiles

use super::customization::ReadingLevel;
use super::keyword::keyword_enum;
use super::plan::PlanTier;
use chrono::{DateTime, Duration, Utc};

/// Length of one billing cycle
pub const BILLING_CYCLE_DAYS: i64 = 30;

/// One billing cycle as a duration
pub fn billing_cycle() -> Duration {
    Duration::days(BILLING_CYCLE_DAYS)
}

keyword_enum! {
    /// Subscription lifecycle status
    pub enum SubscriptionStatus {
        Active => "active",
        Inactive => "inactive",
    }
}

/// Per-user subscription state
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub plan: PlanTier,
    pub status: SubscriptionStatus,
    /// Stories generated in the current cycle
    pub stories_this_month: u32,
    /// When the current cycle ends
    pub reset_date: DateTime<Utc>,
}

impl Subscription {
    /// Active subscription on `plan` with a zeroed counter and a full cycle ahead
    pub fn fresh(plan: PlanTier, now: DateTime<Utc>) -> Self {
        Self {
            plan,
            status: SubscriptionStatus::Active,
            stories_this_month: 0,
            reset_date: now + billing_cycle(),
        }
    }
}

/// A registered parent
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub parent_name: String,
    pub email: String,
    pub password_hash: String,
    pub subscription: Subscription,
    /// Child profiles in creation order
    pub children: Vec<Child>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// First child profile whose name matches (case-insensitive)
    pub fn child_named(&self, name: &str) -> Option<&Child> {
        let name = name.trim();
        self.children
            .iter()
            .find(|c| c.name.trim().eq_ignore_ascii_case(name))
    }
}

/// A child profile owned by one user
#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub reading_level: ReadingLevel,
    /// Distinct titles, in the order first given
    pub favorite_books: Vec<String>,
    pub interests: String,
    pub stories_generated: u32,
}

/// Registration input
#[derive(Debug, Clone)]
pub struct NewUser {
    pub parent_name: String,
    pub email: String,
    pub password_hash: String,
}

/// Add-child input
#[derive(Debug, Clone)]
pub struct NewChild {
    pub name: String,
    pub age: u32,
    pub reading_level: ReadingLevel,
    pub favorite_books: Vec<String>,
    pub interests: String,
}

impl NewChild {
    /// Build a child profile input, trimming titles and dropping blanks and duplicates
    pub fn new(
        name: impl Into<String>,
        age: u32,
        reading_level: ReadingLevel,
        favorite_books: Vec<String>,
        interests: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            age,
            reading_level,
            favorite_books: distinct_titles(favorite_books),
            interests: interests.into(),
        }
    }
}

/// Trim, drop empty entries and remove duplicates while keeping first-seen order
pub fn distinct_titles(titles: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    titles
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect()
}
