//! Persistence for users, children and stories
//!
//! [`StoryStore`] is the seam between request handling and the database.
//! [`RemoteStore`] talks to the hosted PostgREST API, [`MemoryStore`] keeps
//! everything in process memory, and [`FallbackStore`] tries the former and
//! degrades to the latter whenever the remote is unavailable.

use crate::error::Result;
use crate::models::{Child, NewChild, NewStory, NewUser, Story, Subscription, User};
use async_trait::async_trait;

pub mod fallback;
pub mod memory;
pub mod records;
pub mod remote;

pub use fallback::FallbackStore;
pub use memory::MemoryStore;
pub use remote::RemoteStore;

/// Storage backend for the story service
///
/// Lookups that find nothing return `Ok(None)`. Writes that target a
/// missing user or child fail with `StoryMagicError::NotFound`; creating a
/// user with a taken email fails with `StoryMagicError::Conflict`.
#[async_trait]
pub trait StoryStore: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Fetch a user, with children, by email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Register a user on the free plan
    async fn create_user(&self, new_user: NewUser) -> Result<User>;

    /// Attach a child profile to a user
    async fn add_child(&self, user_id: &str, new_child: NewChild) -> Result<Child>;

    /// Persist a generated story
    async fn save_story(&self, new_story: NewStory) -> Result<Story>;

    /// Bump `stories_this_month`, returning the new value
    async fn increment_user_story_count(&self, user_id: &str) -> Result<u32>;

    /// Bump a child's `stories_generated`, returning the new value
    async fn increment_child_story_count(&self, child_id: &str) -> Result<u32>;

    /// Overwrite the user's subscription state
    async fn update_subscription(&self, user_id: &str, subscription: &Subscription)
        -> Result<()>;

    /// A user's stories, newest first
    async fn list_stories(&self, user_id: &str) -> Result<Vec<Story>>;
}

/// Canonical form used for email keys and lookups
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Fresh record identifier
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Pat@Example.COM "), "pat@example.com");
    }

    #[test]
    fn test_new_id_is_unique() {
        assert_ne!(new_id(), new_id());
    }
}
