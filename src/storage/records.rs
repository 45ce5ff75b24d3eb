//! Database row shapes
//!
//! The hosted database uses snake_case columns. Every conversion between a
//! row and a domain type happens here, so nothing else in the crate knows
//! column names.

use crate::models::{
    billing_cycle, Child, ContentOrigin, NewChild, NewStory, NewUser, PlanTier, PromptInputs,
    RawCustomization, ReadingLevel, Story, Subscription, SubscriptionStatus, User,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Accept either a numeric or textual primary key
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Int(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Text(String),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Int(n) => n.to_string(),
        RawId::Text(s) => s,
    }))
}

fn reading_level_or_default(raw: Option<&str>) -> ReadingLevel {
    raw.and_then(|r| r.parse().ok()).unwrap_or_default()
}

/// `users` row, optionally with embedded `children`
#[derive(Debug, Clone, Deserialize)]
pub struct UserRow {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub parent_name: String,
    pub email: String,
    #[serde(default)]
    pub password_hash: String,
    #[serde(default)]
    pub subscription_plan: Option<String>,
    #[serde(default)]
    pub subscription_status: Option<String>,
    #[serde(default)]
    pub stories_this_month: Option<u32>,
    #[serde(default)]
    pub subscription_reset_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub children: Vec<ChildRow>,
}

impl UserRow {
    /// Convert to the domain type
    ///
    /// A missing reset date is taken as one cycle after account creation,
    /// or one cycle after `now` when that is unknown too.
    pub fn into_user(self, now: DateTime<Utc>) -> User {
        let created_at = self.created_at.unwrap_or(now);
        let subscription = Subscription {
            plan: PlanTier::parse_or_free(self.subscription_plan.as_deref().unwrap_or("free")),
            status: self
                .subscription_status
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(SubscriptionStatus::Active),
            stories_this_month: self.stories_this_month.unwrap_or(0),
            reset_date: self
                .subscription_reset_date
                .unwrap_or(created_at + billing_cycle()),
        };

        User {
            id: self.id,
            parent_name: self.parent_name,
            email: self.email,
            password_hash: self.password_hash,
            subscription,
            children: self.children.into_iter().map(ChildRow::into_child).collect(),
            created_at,
        }
    }
}

/// `children` row
#[derive(Debug, Clone, Deserialize)]
pub struct ChildRow {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub reading_level: Option<String>,
    #[serde(default)]
    pub favorite_books: Option<Vec<String>>,
    #[serde(default)]
    pub interests: Option<String>,
    #[serde(default)]
    pub stories_generated: Option<u32>,
}

impl ChildRow {
    pub fn into_child(self) -> Child {
        Child {
            id: self.id,
            name: self.name,
            age: self.age,
            reading_level: reading_level_or_default(self.reading_level.as_deref()),
            favorite_books: self.favorite_books.unwrap_or_default(),
            interests: self.interests.unwrap_or_default(),
            stories_generated: self.stories_generated.unwrap_or(0),
        }
    }
}

/// `stories` row
#[derive(Debug, Clone, Deserialize)]
pub struct StoryRow {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub user_id: String,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub child_id: Option<String>,
    #[serde(default)]
    pub child_name: String,
    #[serde(default)]
    pub story_content: String,
    #[serde(default)]
    pub favorite_books: Option<Vec<String>>,
    #[serde(default)]
    pub imagination_prompt: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub reading_level: Option<String>,
    #[serde(default)]
    pub customization: Option<RawCustomization>,
    #[serde(default)]
    pub subscription_plan: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl StoryRow {
    /// Convert to the domain type; rows written before `origin` existed
    /// count as generated
    pub fn into_story(self, now: DateTime<Utc>) -> Story {
        Story {
            id: self.id,
            user_id: self.user_id,
            child_id: self.child_id,
            child_name: self.child_name,
            content: self.story_content,
            inputs: PromptInputs {
                favorite_books: self.favorite_books.unwrap_or_default(),
                imagination: self.imagination_prompt,
                age: self.age,
                reading_level: self.reading_level.as_deref().and_then(|r| r.parse().ok()),
                customization: self.customization.unwrap_or_default(),
                subscription_plan: PlanTier::parse_or_free(
                    self.subscription_plan.as_deref().unwrap_or("free"),
                ),
            },
            origin: self
                .origin
                .as_deref()
                .and_then(|o| o.parse().ok())
                .unwrap_or(ContentOrigin::Generated),
            created_at: self.created_at.unwrap_or(now),
        }
    }
}

/// Insert payload for `users`
#[derive(Debug, Serialize)]
pub struct UserInsert<'a> {
    pub parent_name: &'a str,
    pub email: String,
    pub password_hash: &'a str,
    pub subscription_plan: &'static str,
    pub subscription_status: &'static str,
    pub stories_this_month: u32,
    pub subscription_reset_date: DateTime<Utc>,
}

impl<'a> UserInsert<'a> {
    pub fn new(user: &'a NewUser, email: String, now: DateTime<Utc>) -> Self {
        let subscription = Subscription::fresh(PlanTier::Free, now);
        Self {
            parent_name: &user.parent_name,
            email,
            password_hash: &user.password_hash,
            subscription_plan: subscription.plan.as_str(),
            subscription_status: subscription.status.as_str(),
            stories_this_month: subscription.stories_this_month,
            subscription_reset_date: subscription.reset_date,
        }
    }
}

/// Insert payload for `children`
#[derive(Debug, Serialize)]
pub struct ChildInsert<'a> {
    pub user_id: &'a str,
    pub name: &'a str,
    pub age: u32,
    pub reading_level: &'static str,
    pub favorite_books: &'a [String],
    pub interests: &'a str,
    pub stories_generated: u32,
}

impl<'a> ChildInsert<'a> {
    pub fn new(user_id: &'a str, child: &'a NewChild) -> Self {
        Self {
            user_id,
            name: &child.name,
            age: child.age,
            reading_level: child.reading_level.as_str(),
            favorite_books: &child.favorite_books,
            interests: &child.interests,
            stories_generated: 0,
        }
    }
}

/// Insert payload for `stories`
#[derive(Debug, Serialize)]
pub struct StoryInsert<'a> {
    pub user_id: &'a str,
    pub child_id: Option<&'a str>,
    pub child_name: &'a str,
    pub story_content: &'a str,
    pub favorite_books: &'a [String],
    pub imagination_prompt: Option<&'a str>,
    pub age: Option<u32>,
    pub reading_level: Option<&'static str>,
    pub customization: &'a RawCustomization,
    pub subscription_plan: &'static str,
    pub origin: &'static str,
}

impl<'a> From<&'a NewStory> for StoryInsert<'a> {
    fn from(story: &'a NewStory) -> Self {
        Self {
            user_id: &story.user_id,
            child_id: story.child_id.as_deref(),
            child_name: &story.child_name,
            story_content: &story.content,
            favorite_books: &story.inputs.favorite_books,
            imagination_prompt: story.inputs.imagination.as_deref(),
            age: story.inputs.age,
            reading_level: story.inputs.reading_level.map(|r| r.as_str()),
            customization: &story.inputs.customization,
            subscription_plan: story.inputs.subscription_plan.as_str(),
            origin: story.origin.as_str(),
        }
    }
}

/// Update payload for the subscription columns of `users`
#[derive(Debug, Serialize)]
pub struct SubscriptionUpdate {
    pub subscription_plan: &'static str,
    pub subscription_status: &'static str,
    pub stories_this_month: u32,
    pub subscription_reset_date: DateTime<Utc>,
}

impl From<&Subscription> for SubscriptionUpdate {
    fn from(subscription: &Subscription) -> Self {
        Self {
            subscription_plan: subscription.plan.as_str(),
            subscription_status: subscription.status.as_str(),
            stories_this_month: subscription.stories_this_month,
            subscription_reset_date: subscription.reset_date,
        }
    }
}
