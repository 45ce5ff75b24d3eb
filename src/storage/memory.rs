//! In-process repository
//!
//! Used when no database is configured and as the degrade target of
//! [`super::FallbackStore`]. State lives for the life of the process and is
//! lost on restart.

use super::{new_id, normalize_email, StoryStore};
use crate::credentials::hash_password;
use crate::error::{Result, StoryMagicError};
use crate::models::{
    Child, NewChild, NewStory, NewUser, PlanTier, ReadingLevel, Story, Subscription, User,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Email of the seeded demo account
pub const DEMO_EMAIL: &str = "test@example.com";
/// Password of the seeded demo account
pub const DEMO_PASSWORD: &str = "test123";

#[derive(Debug, Default)]
struct MemoryState {
    /// Users keyed by id
    users: HashMap<String, User>,
    /// Normalized email -> user id
    emails: HashMap<String, String>,
    /// Child id -> owning user id
    child_owners: HashMap<String, String>,
    stories: Vec<Story>,
}

/// Mutex-guarded in-memory [`StoryStore`]
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the demo parent and child
    ///
    /// # Errors
    ///
    /// Returns error if hashing the demo password fails
    pub fn with_demo_data() -> Result<Self> {
        let store = Self::new();
        let now = Utc::now();
        let mut subscription = Subscription::fresh(PlanTier::Free, now);
        subscription.stories_this_month = 1;

        let user = User {
            id: "test123".to_string(),
            parent_name: "Test Parent".to_string(),
            email: DEMO_EMAIL.to_string(),
            password_hash: hash_password(DEMO_PASSWORD)?,
            subscription,
            children: vec![Child {
                id: "child1".to_string(),
                name: "Emma".to_string(),
                age: 7,
                reading_level: ReadingLevel::Intermediate,
                favorite_books: vec!["Harry Potter".to_string(), "The Cat in the Hat".to_string()],
                interests: "unicorns, rainbows, and magical adventures".to_string(),
                stories_generated: 3,
            }],
            created_at: now,
        };

        store.lock()?.insert_user(user);
        tracing::info!("Seeded in-memory store with demo account {}", DEMO_EMAIL);
        Ok(store)
    }

    /// Insert or refresh a user read from another store
    ///
    /// Keeps writes that later degrade to memory pointed at a known user
    /// and children.
    pub fn remember_user(&self, user: &User) -> Result<()> {
        let mut state = self.lock()?;
        if let Some(previous) = state.users.get(&user.id) {
            let stale: Vec<String> = previous.children.iter().map(|c| c.id.clone()).collect();
            for child_id in stale {
                state.child_owners.remove(&child_id);
            }
        }
        state.insert_user(user.clone());
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| StoryMagicError::Storage("In-memory store lock poisoned".to_string()).into())
    }
}

impl MemoryState {
    fn insert_user(&mut self, user: User) {
        for child in &user.children {
            self.child_owners.insert(child.id.clone(), user.id.clone());
        }
        self.emails
            .insert(normalize_email(&user.email), user.id.clone());
        self.users.insert(user.id.clone(), user);
    }

    fn user_mut(&mut self, user_id: &str) -> Result<&mut User> {
        self.users
            .get_mut(user_id)
            .ok_or_else(|| StoryMagicError::NotFound("User".to_string()).into())
    }
}

#[async_trait]
impl StoryStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.lock()?;
        Ok(state
            .emails
            .get(&normalize_email(email))
            .and_then(|id| state.users.get(id))
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let mut state = self.lock()?;
        let key = normalize_email(&new_user.email);
        if state.emails.contains_key(&key) {
            return Err(StoryMagicError::Conflict("Email already registered".to_string()).into());
        }

        let now = Utc::now();
        let user = User {
            id: new_id(),
            parent_name: new_user.parent_name,
            email: key,
            password_hash: new_user.password_hash,
            subscription: Subscription::fresh(PlanTier::Free, now),
            children: Vec::new(),
            created_at: now,
        };
        state.insert_user(user.clone());
        tracing::debug!(user_id = %user.id, "Created user in memory");
        Ok(user)
    }

    async fn add_child(&self, user_id: &str, new_child: NewChild) -> Result<Child> {
        let mut state = self.lock()?;
        let child = Child {
            id: new_id(),
            name: new_child.name,
            age: new_child.age,
            reading_level: new_child.reading_level,
            favorite_books: new_child.favorite_books,
            interests: new_child.interests,
            stories_generated: 0,
        };

        state.user_mut(user_id)?.children.push(child.clone());
        state
            .child_owners
            .insert(child.id.clone(), user_id.to_string());
        tracing::debug!(user_id, child_id = %child.id, "Added child in memory");
        Ok(child)
    }

    async fn save_story(&self, new_story: NewStory) -> Result<Story> {
        let mut state = self.lock()?;
        if !state.users.contains_key(&new_story.user_id) {
            return Err(StoryMagicError::NotFound("User".to_string()).into());
        }

        let story = Story {
            id: new_id(),
            user_id: new_story.user_id,
            child_id: new_story.child_id,
            child_name: new_story.child_name,
            content: new_story.content,
            inputs: new_story.inputs,
            origin: new_story.origin,
            created_at: Utc::now(),
        };
        state.stories.push(story.clone());
        Ok(story)
    }

    async fn increment_user_story_count(&self, user_id: &str) -> Result<u32> {
        let mut state = self.lock()?;
        let subscription = &mut state.user_mut(user_id)?.subscription;
        subscription.stories_this_month = subscription.stories_this_month.saturating_add(1);
        Ok(subscription.stories_this_month)
    }

    async fn increment_child_story_count(&self, child_id: &str) -> Result<u32> {
        let mut state = self.lock()?;
        let owner = state
            .child_owners
            .get(child_id)
            .cloned()
            .ok_or_else(|| StoryMagicError::NotFound("Child".to_string()))?;

        let child = state
            .user_mut(&owner)?
            .children
            .iter_mut()
            .find(|c| c.id == child_id)
            .ok_or_else(|| StoryMagicError::NotFound("Child".to_string()))?;
        child.stories_generated = child.stories_generated.saturating_add(1);
        Ok(child.stories_generated)
    }

    async fn update_subscription(
        &self,
        user_id: &str,
        subscription: &Subscription,
    ) -> Result<()> {
        let mut state = self.lock()?;
        state.user_mut(user_id)?.subscription = subscription.clone();
        Ok(())
    }

    async fn list_stories(&self, user_id: &str) -> Result<Vec<Story>> {
        let state = self.lock()?;
        let mut stories: Vec<Story> = state
            .stories
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        stories.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(stories)
    }
}
