//! End-to-end story request handling
//!
//! Ties the quota check, text generation, illustrations and persistence
//! together for one generate-story request.

use super::pages::{paginate, PARAGRAPHS_PER_PAGE};
use super::{ChildProfile, StoryGenerator, StoryOrigin};
use crate::error::{Result, StoryMagicError};
use crate::illustrations::Illustrator;
use crate::metrics::GenerationMetrics;
use crate::models::{Customization, NewStory, PromptInputs, RawCustomization, ReadingLevel, Story};
use crate::storage::StoryStore;
use crate::subscription::{evaluate, QuotaDecision};
use chrono::Utc;
use std::sync::Arc;

/// A request for one story
#[derive(Debug, Clone, Default)]
pub struct StoryRequest {
    pub child_name: String,
    pub favorite_books: Vec<String>,
    pub imagination: Option<String>,
    pub age: Option<u32>,
    pub reading_level: Option<ReadingLevel>,
    /// Account to charge; anonymous requests are generated but not saved
    pub parent_email: Option<String>,
    pub customization: RawCustomization,
}

/// Everything the reader needs to show a story
#[derive(Debug, Clone)]
pub struct StoryResult {
    pub story: String,
    pub images: Vec<String>,
    /// Customization echoed as received
    pub customization: RawCustomization,
    pub pages: Vec<String>,
    pub origin: StoryOrigin,
    /// The persisted record, when the request belonged to a known user
    pub saved: Option<Story>,
    /// Quota state before this story was counted
    pub quota: Option<QuotaDecision>,
}

/// Quota-checked story generation with persistence
#[derive(Clone)]
pub struct StoryWorkflow {
    store: Arc<dyn StoryStore>,
    generator: StoryGenerator,
    illustrator: Illustrator,
}

impl StoryWorkflow {
    pub fn new(
        store: Arc<dyn StoryStore>,
        generator: StoryGenerator,
        illustrator: Illustrator,
    ) -> Self {
        Self {
            store,
            generator,
            illustrator,
        }
    }

    /// Generate, illustrate and (for known users) save one story
    ///
    /// # Errors
    ///
    /// Returns `Validation` without a child name, `QuotaExceeded` when the
    /// user's plan allowance is used up, and storage errors from the save
    /// path. Provider failures never surface: the templated story is used.
    pub async fn run(&self, request: StoryRequest) -> Result<StoryResult> {
        let child_name = request.child_name.trim().to_string();
        if child_name.is_empty() {
            return Err(StoryMagicError::Validation("Child name is required".to_string()).into());
        }

        let metrics = GenerationMetrics::start();
        let now = Utc::now();

        let user = match request.parent_email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => {
                let user = self.store.get_user_by_email(email).await?;
                if user.is_none() {
                    tracing::info!("No account for {}, story will not be saved", email);
                }
                user
            }
            _ => None,
        };

        let mut quota = None;
        if let Some(user) = &user {
            let mut subscription = user.subscription.clone();
            let decision = evaluate(&mut subscription, now);
            if decision.reset {
                self.store
                    .update_subscription(&user.id, &subscription)
                    .await?;
            }
            if !decision.allowed {
                tracing::info!(
                    plan = %decision.plan,
                    used = decision.used,
                    "Story quota exhausted for {}",
                    user.email
                );
                metrics.record_denied(decision.plan.as_str());
            }
            quota = Some(decision.ensure_allowed()?);
        }

        let matched_child = user.as_ref().and_then(|u| u.child_named(&child_name));

        // Saved profile fills whatever the request left out
        let favorite_books = if request.favorite_books.is_empty() {
            matched_child
                .map(|c| c.favorite_books.clone())
                .unwrap_or_default()
        } else {
            request.favorite_books.clone()
        };
        let profile = ChildProfile {
            name: child_name.clone(),
            age: request.age.or(matched_child.map(|c| c.age)),
            favorite_books,
            interests: request.imagination.clone().filter(|s| !s.trim().is_empty()),
            reading_level: request
                .reading_level
                .or(matched_child.map(|c| c.reading_level)),
        };

        let customization = Customization::from_raw(&request.customization);
        let generated = self.generator.generate(&profile, &customization).await;
        let images = self
            .illustrator
            .illustrate(&child_name, &generated.text, &customization)
            .await;

        let mut saved = None;
        if let (Some(user), Some(decision)) = (&user, quota) {
            let child_id = matched_child.map(|c| c.id.clone());
            let story = self
                .store
                .save_story(NewStory {
                    user_id: user.id.clone(),
                    child_id: child_id.clone(),
                    child_name: child_name.clone(),
                    content: generated.text.clone(),
                    inputs: PromptInputs {
                        favorite_books: profile.books(),
                        imagination: profile.interests.clone(),
                        age: profile.age,
                        reading_level: profile.reading_level,
                        customization: request.customization.clone(),
                        subscription_plan: decision.plan,
                    },
                    origin: generated.origin.kind(),
                })
                .await?;

            let used = self.store.increment_user_story_count(&user.id).await?;
            if let Some(child_id) = child_id {
                self.store.increment_child_story_count(&child_id).await?;
            }

            tracing::info!(
                origin = generated.origin.label(),
                stories_this_month = used,
                "Saved story {} for {}",
                story.id,
                user.email
            );
            saved = Some(story);
        }

        metrics.record_story(generated.origin.label());

        Ok(StoryResult {
            pages: paginate(&generated.text, PARAGRAPHS_PER_PAGE),
            story: generated.text,
            images,
            customization: request.customization,
            origin: generated.origin,
            saved,
            quota,
        })
    }
}
