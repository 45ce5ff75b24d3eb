//! Stored stories

use super::customization::{RawCustomization, ReadingLevel};
use super::keyword::keyword_enum;
use super::plan::PlanTier;
use chrono::{DateTime, Utc};

keyword_enum! {
    /// Whether a saved story came from the model or the template
    pub enum ContentOrigin {
        Generated => "generated",
        Fallback => "fallback",
    }
}

/// Inputs the story was generated from
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PromptInputs {
    pub favorite_books: Vec<String>,
    pub imagination: Option<String>,
    pub age: Option<u32>,
    pub reading_level: Option<ReadingLevel>,
    /// Customization as the client sent it
    pub customization: RawCustomization,
    /// Plan the user was on at generation time
    pub subscription_plan: PlanTier,
}

/// A saved story; never modified after creation
#[derive(Debug, Clone, PartialEq)]
pub struct Story {
    pub id: String,
    pub user_id: String,
    /// Set when the story's child name matched one of the user's profiles
    pub child_id: Option<String>,
    pub child_name: String,
    pub content: String,
    pub inputs: PromptInputs,
    pub origin: ContentOrigin,
    pub created_at: DateTime<Utc>,
}

/// Save-story input
#[derive(Debug, Clone)]
pub struct NewStory {
    pub user_id: String,
    pub child_id: Option<String>,
    pub child_name: String,
    pub content: String,
    pub inputs: PromptInputs,
    pub origin: ContentOrigin,
}
