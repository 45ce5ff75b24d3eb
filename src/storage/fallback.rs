//! Remote-first store with an in-memory fallback
//!
//! Every operation goes to the remote store when one is configured. If the
//! remote is unreachable or answers with a server error, the operation is
//! served from memory instead. Answers that carry meaning (duplicate email,
//! missing record, bad input) are returned as-is.
//!
//! Users read from the remote are mirrored into memory so that a later
//! write that degrades still finds its user and children.

use super::{MemoryStore, RemoteStore, StoryStore};
use crate::error::{Result, StoryMagicError};
use crate::metrics::record_storage_fallback;
use crate::models::{Child, NewChild, NewStory, NewUser, Story, Subscription, User};
use async_trait::async_trait;

/// [`StoryStore`] that degrades from [`RemoteStore`] to [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct FallbackStore {
    remote: Option<RemoteStore>,
    memory: MemoryStore,
}

/// Run `$call` against the remote store, or against memory when the remote
/// is absent or unavailable
macro_rules! remote_first {
    ($self:ident, $op:literal, |$store:ident| $call:expr) => {{
        match &$self.remote {
            Some($store) => match $call.await {
                Err(e) if is_unavailable(&e) => {
                    tracing::warn!(
                        operation = $op,
                        "Remote store unavailable, using in-memory store: {}",
                        e
                    );
                    record_storage_fallback($op);
                    let $store = &$self.memory;
                    $call.await
                }
                other => other,
            },
            None => {
                let $store = &$self.memory;
                $call.await
            }
        }
    }};
}

/// Errors that mean the remote could not answer, as opposed to answering no
fn is_unavailable(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<StoryMagicError>() {
        Some(StoryMagicError::Conflict(_))
        | Some(StoryMagicError::NotFound(_))
        | Some(StoryMagicError::Validation(_))
        | Some(StoryMagicError::InvalidPlan(_)) => false,
        _ => true,
    }
}

impl FallbackStore {
    /// Create a store; with `remote` set to `None` only memory is used
    pub fn new(remote: Option<RemoteStore>, memory: MemoryStore) -> Self {
        match &remote {
            Some(_) => tracing::info!("Using remote store with in-memory fallback"),
            None => tracing::warn!("No database configured, using in-memory store only"),
        }
        Self { remote, memory }
    }

    /// Whether a remote store is configured
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// The in-memory side of the store
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }
}

#[async_trait]
impl StoryStore for FallbackStore {
    fn name(&self) -> &'static str {
        if self.remote.is_some() {
            "remote+memory"
        } else {
            "memory"
        }
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = remote_first!(self, "get_user_by_email", |store| store
            .get_user_by_email(email))?;
        if let (Some(_), Some(user)) = (&self.remote, &user) {
            self.memory.remember_user(user)?;
        }
        Ok(user)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        remote_first!(self, "create_user", |store| store.create_user(new_user.clone()))
    }

    async fn add_child(&self, user_id: &str, new_child: NewChild) -> Result<Child> {
        remote_first!(self, "add_child", |store| store
            .add_child(user_id, new_child.clone()))
    }

    async fn save_story(&self, new_story: NewStory) -> Result<Story> {
        remote_first!(self, "save_story", |store| store.save_story(new_story.clone()))
    }

    async fn increment_user_story_count(&self, user_id: &str) -> Result<u32> {
        remote_first!(self, "increment_user_story_count", |store| store
            .increment_user_story_count(user_id))
    }

    async fn increment_child_story_count(&self, child_id: &str) -> Result<u32> {
        remote_first!(self, "increment_child_story_count", |store| store
            .increment_child_story_count(child_id))
    }

    async fn update_subscription(
        &self,
        user_id: &str,
        subscription: &Subscription,
    ) -> Result<()> {
        remote_first!(self, "update_subscription", |store| store
            .update_subscription(user_id, subscription))
    }

    async fn list_stories(&self, user_id: &str) -> Result<Vec<Story>> {
        remote_first!(self, "list_stories", |store| store.list_stories(user_id))
    }
}
