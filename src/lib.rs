//! StoryMagic - personalized children's story service library
//!
//! This library provides the core functionality for StoryMagic: parent
//! accounts and child profiles, LLM-backed story generation with a
//! templated fallback, plan-based monthly quotas, and the HTTP API.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `models`: Domain types (users, children, stories, plan catalog)
//! - `story`: Prompt composition, generation with fallback, pagination
//! - `illustrations`: SVG illustrations and themed placeholders
//! - `subscription`: Quota evaluation and simulated plan changes
//! - `storage`: Remote and in-memory persistence behind `StoryStore`
//! - `providers`: Text provider abstraction (OpenAI-compatible, Ollama)
//! - `server`: axum router, handlers and error mapping
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use storymagic::{AppState, Config, MemoryStore};
//! use storymagic::providers::create_provider;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let store = Arc::new(MemoryStore::with_demo_data()?);
//!     let provider = create_provider(&config.provider)?;
//!     let state = Arc::new(AppState::new(store, provider, &config)?);
//!     storymagic::server::serve(&config, state).await
//! }
//! ```

pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod illustrations;
pub mod metrics;
pub mod models;
pub mod providers;
pub mod server;
pub mod storage;
pub mod story;
pub mod subscription;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, StoryMagicError};
pub use server::AppState;
pub use storage::{FallbackStore, MemoryStore, RemoteStore, StoryStore};
pub use story::{StoryGenerator, StoryWorkflow};

#[cfg(test)]
pub mod test_utils;
