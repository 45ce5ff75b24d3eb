//! Test utilities for StoryMagic
//!
//! Scripted providers, a seeded store and assertion helpers shared by the
//! unit tests.

use crate::error::{Result, StoryMagicError};
use crate::providers::{CompletionOptions, CompletionResponse, Message, Provider, TokenUsage};
use crate::storage::{MemoryStore, StoryStore};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Provider that always answers with the same text and records each call
#[derive(Debug, Default)]
pub struct StaticProvider {
    text: String,
    calls: Mutex<Vec<CompletionOptions>>,
    prompts: Mutex<Vec<Vec<Message>>>,
}

impl StaticProvider {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Options of every call made so far
    pub fn calls(&self) -> Vec<CompletionOptions> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Messages of every call made so far
    pub fn prompts(&self) -> Vec<Vec<Message>> {
        self.prompts.lock().expect("prompts lock").clone()
    }
}

#[async_trait]
impl Provider for StaticProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    fn model(&self) -> String {
        "static-model".to_string()
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        self.calls.lock().expect("calls lock").push(*options);
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(messages.to_vec());
        Ok(
            CompletionResponse::new(Message::assistant(self.text.clone()), self.model())
                .with_usage(TokenUsage::new(10, 20)),
        )
    }
}

/// Provider that fails every call
#[derive(Debug, Default)]
pub struct FailingProvider;

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn model(&self) -> String {
        "failing-model".to_string()
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        Err(StoryMagicError::Provider("connection refused".to_string()).into())
    }
}

/// Memory store seeded with the demo account, as a trait object
pub fn demo_store() -> (Arc<dyn StoryStore>, MemoryStore) {
    let memory = MemoryStore::with_demo_data().expect("seed demo data");
    (Arc::new(memory.clone()), memory)
}

/// Assert that an error is a `StoryMagicError` whose message contains `expected`
///
/// # Panics
///
/// Panics if the error is of another type or the message does not match
pub fn assert_error_contains(err: &anyhow::Error, expected: &str) {
    let inner = err
        .downcast_ref::<StoryMagicError>()
        .unwrap_or_else(|| panic!("expected StoryMagicError, got {:?}", err));
    let message = inner.to_string();
    assert!(
        message.contains(expected),
        "Error message '{}' does not contain '{}'",
        message,
        expected
    );
}
