//! Story generation
//!
//! [`StoryGenerator`] composes the prompt, calls the text provider and
//! fails open to a templated story. [`workflow::StoryWorkflow`] wraps it
//! with the quota check, illustrations and persistence.

pub mod fallback;
pub mod pages;
pub mod prompt;
pub mod workflow;

pub use workflow::{StoryRequest, StoryResult, StoryWorkflow};

use crate::config::StoryConfig;
use crate::models::{ContentOrigin, Customization, ReadingLevel};
use crate::providers::{Provider, TokenUsage};
use std::fmt;
use std::sync::Arc;

/// Favorite-books entry used when a child has none
pub const GENERAL_ADVENTURE: &str = "General Adventure Stories";

/// The child a story is written for
#[derive(Debug, Clone, PartialEq)]
pub struct ChildProfile {
    pub name: String,
    pub age: Option<u32>,
    pub favorite_books: Vec<String>,
    pub interests: Option<String>,
    pub reading_level: Option<ReadingLevel>,
}

impl ChildProfile {
    /// Age used for tiering and token budget
    pub fn age_or_default(&self) -> u32 {
        self.age.unwrap_or(prompt::DEFAULT_AGE)
    }

    /// Favorite books, or the general-adventure sentinel when empty
    pub fn books(&self) -> Vec<String> {
        let books: Vec<String> = self
            .favorite_books
            .iter()
            .map(|b| b.trim())
            .filter(|b| !b.is_empty())
            .map(str::to_string)
            .collect();
        if books.is_empty() {
            vec![GENERAL_ADVENTURE.to_string()]
        } else {
            books
        }
    }
}

/// Why the templated story was used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The provider call failed (transport, status, parse, empty content)
    ProviderError(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::ProviderError(msg) => write!(f, "provider error: {}", msg),
        }
    }
}

/// How the story text was produced
#[derive(Debug, Clone, PartialEq)]
pub enum StoryOrigin {
    Generated {
        model: String,
        usage: Option<TokenUsage>,
    },
    Fallback {
        reason: FallbackReason,
    },
}

impl StoryOrigin {
    /// Short label for metrics and API responses (`model` or `fallback`)
    pub fn label(&self) -> &'static str {
        match self {
            StoryOrigin::Generated { .. } => "model",
            StoryOrigin::Fallback { .. } => "fallback",
        }
    }

    /// Origin as recorded on the saved story
    pub fn kind(&self) -> ContentOrigin {
        match self {
            StoryOrigin::Generated { .. } => ContentOrigin::Generated,
            StoryOrigin::Fallback { .. } => ContentOrigin::Fallback,
        }
    }
}

/// Story text plus its provenance
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedStory {
    pub text: String,
    pub origin: StoryOrigin,
}

/// Writes stories through a text provider
#[derive(Clone)]
pub struct StoryGenerator {
    provider: Arc<dyn Provider>,
    settings: StoryConfig,
}

impl StoryGenerator {
    pub fn new(provider: Arc<dyn Provider>, settings: StoryConfig) -> Self {
        Self { provider, settings }
    }

    /// Generate a story; never fails
    ///
    /// Any provider failure yields the templated story with
    /// [`StoryOrigin::Fallback`].
    pub async fn generate(&self, child: &ChildProfile, customization: &Customization) -> GeneratedStory {
        let messages = prompt::build_messages(child, customization);
        let options = prompt::completion_options(child.age_or_default(), &self.settings);

        tracing::debug!(
            provider = self.provider.name(),
            max_tokens = options.max_tokens,
            "Requesting story for {}",
            child.name
        );

        match self.provider.complete(&messages, &options).await {
            Ok(response) => GeneratedStory {
                text: response.content().trim().to_string(),
                origin: StoryOrigin::Generated {
                    model: response.model,
                    usage: response.usage,
                },
            },
            Err(e) => {
                tracing::warn!("Story provider failed, using fallback story: {}", e);
                GeneratedStory {
                    text: fallback::fallback_story(child),
                    origin: StoryOrigin::Fallback {
                        reason: FallbackReason::ProviderError(e.to_string()),
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FailingProvider, StaticProvider};

    fn emma() -> ChildProfile {
        ChildProfile {
            name: "Emma".to_string(),
            age: Some(7),
            favorite_books: vec![" ".to_string(), "Matilda".to_string()],
            interests: None,
            reading_level: None,
        }
    }

    #[test]
    fn test_books_falls_back_to_sentinel() {
        let mut child = emma();
        assert_eq!(child.books(), vec!["Matilda"]);
        child.favorite_books.clear();
        assert_eq!(child.books(), vec![GENERAL_ADVENTURE]);
    }

    #[tokio::test]
    async fn test_generate_uses_provider_text() {
        let provider = Arc::new(StaticProvider::new("  A story.  "));
        let generator = StoryGenerator::new(provider.clone(), StoryConfig::default());

        let story = generator.generate(&emma(), &Customization::default()).await;
        assert_eq!(story.text, "A story.");
        assert_eq!(story.origin.label(), "model");

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].max_tokens, 1200);
    }

    #[tokio::test]
    async fn test_generate_fails_open() {
        let generator = StoryGenerator::new(Arc::new(FailingProvider), StoryConfig::default());

        let story = generator.generate(&emma(), &Customization::default()).await;
        assert_eq!(story.origin.label(), "fallback");
        assert!(story.text.contains("who loved reading Matilda"));
        match story.origin {
            StoryOrigin::Fallback { reason } => assert!(reason.to_string().contains("provider")),
            other => panic!("unexpected origin: {:?}", other),
        }
    }
}
