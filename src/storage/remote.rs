//! Hosted database backend
//!
//! Talks to a PostgREST endpoint (`{url}/rest/v1/{table}`) with the
//! project's anon key sent both as `apikey` and as a bearer token.

use super::records::{
    ChildInsert, ChildRow, StoryInsert, StoryRow, SubscriptionUpdate, UserInsert, UserRow,
};
use super::{normalize_email, StoryStore};
use crate::config::DatabaseConfig;
use crate::error::{Result, StoryMagicError};
use crate::models::{Child, NewChild, NewStory, NewUser, Story, Subscription, User};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// PostgREST error code for a unique-constraint violation
const UNIQUE_VIOLATION: &str = "23505";

/// PostgREST-backed [`StoryStore`]
#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StoryCount {
    stories_this_month: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChildCount {
    stories_generated: Option<u32>,
}

#[derive(Debug, Serialize)]
struct UserCountUpdate {
    stories_this_month: u32,
}

#[derive(Debug, Serialize)]
struct ChildCountUpdate {
    stories_generated: u32,
}

impl RemoteStore {
    /// Create a store for the project at `url`
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("storymagic/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoryMagicError::Storage(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized remote store: url={}", url);

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Build a store from configuration, or `None` when it is incomplete
    pub fn from_config(config: &DatabaseConfig) -> Result<Option<Self>> {
        match (config.url.as_deref(), config.api_key.as_deref()) {
            (Some(url), Some(key)) if !url.trim().is_empty() && !key.trim().is_empty() => {
                Self::new(url, key, Duration::from_secs(config.timeout_seconds)).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
    }

    async fn send(&self, request: RequestBuilder, operation: &str) -> Result<Response> {
        let response = self.authorize(request).send().await.map_err(|e| {
            tracing::error!("Remote store {} failed: {}", operation, e);
            StoryMagicError::Storage(format!("Remote store {} failed: {}", operation, e))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail: Option<PostgrestError> = serde_json::from_str(&body).ok();
        let unique_violation = detail
            .as_ref()
            .and_then(|d| d.code.as_deref())
            .map_or(false, |code| code == UNIQUE_VIOLATION);

        if status == StatusCode::CONFLICT || unique_violation {
            return Err(StoryMagicError::Conflict("Email already registered".to_string()).into());
        }

        let message = detail.and_then(|d| d.message).unwrap_or(body);
        tracing::error!("Remote store {} returned {}: {}", operation, status, message);
        Err(StoryMagicError::Storage(format!(
            "Remote store {} returned {}: {}",
            operation, status, message
        ))
        .into())
    }

    async fn rows<T: DeserializeOwned>(response: Response, operation: &str) -> Result<Vec<T>> {
        response.json().await.map_err(|e| {
            StoryMagicError::Storage(format!(
                "Failed to parse remote store {} response: {}",
                operation, e
            ))
            .into()
        })
    }

    /// First returned row of a `return=representation` write
    async fn single<T: DeserializeOwned>(response: Response, operation: &str) -> Result<T> {
        Self::rows(response, operation)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                StoryMagicError::Storage(format!("Remote store {} returned no rows", operation))
                    .into()
            })
    }

    async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
        operation: &str,
    ) -> Result<T> {
        let request = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(body);
        let response = self.send(request, operation).await?;
        Self::single(response, operation).await
    }

    async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
        body: &B,
        operation: &str,
    ) -> Result<Vec<T>> {
        let request = self
            .client
            .patch(self.table_url(table))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(body);
        let response = self.send(request, operation).await?;
        Self::rows(response, operation).await
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
        operation: &str,
    ) -> Result<Vec<T>> {
        let request = self.client.get(self.table_url(table)).query(query);
        let response = self.send(request, operation).await?;
        Self::rows(response, operation).await
    }
}

#[async_trait]
impl StoryStore for RemoteStore {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let rows: Vec<UserRow> = self
            .select(
                "users",
                &[
                    ("select", "*,children(*)".to_string()),
                    ("email", format!("eq.{}", normalize_email(email))),
                    ("limit", "1".to_string()),
                ],
                "get user",
            )
            .await?;
        let now = Utc::now();
        Ok(rows.into_iter().next().map(|row| row.into_user(now)))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let now = Utc::now();
        let body = [UserInsert::new(&new_user, normalize_email(&new_user.email), now)];
        let row: UserRow = self.insert("users", &body, "create user").await?;
        tracing::debug!(user_id = %row.id, "Created user in remote store");
        Ok(row.into_user(now))
    }

    async fn add_child(&self, user_id: &str, new_child: NewChild) -> Result<Child> {
        let body = [ChildInsert::new(user_id, &new_child)];
        let row: ChildRow = self.insert("children", &body, "add child").await?;
        Ok(row.into_child())
    }

    async fn save_story(&self, new_story: NewStory) -> Result<Story> {
        let body = [StoryInsert::from(&new_story)];
        let row: StoryRow = self.insert("stories", &body, "save story").await?;
        Ok(row.into_story(Utc::now()))
    }

    async fn increment_user_story_count(&self, user_id: &str) -> Result<u32> {
        let current: Vec<StoryCount> = self
            .select(
                "users",
                &[
                    ("select", "stories_this_month".to_string()),
                    ("id", format!("eq.{}", user_id)),
                ],
                "read story count",
            )
            .await?;
        let current = current
            .into_iter()
            .next()
            .ok_or_else(|| StoryMagicError::NotFound("User".to_string()))?;

        let next = current.stories_this_month.unwrap_or(0).saturating_add(1);
        let updated: Vec<StoryCount> = self
            .update(
                "users",
                user_id,
                &UserCountUpdate {
                    stories_this_month: next,
                },
                "increment story count",
            )
            .await?;
        Ok(updated
            .into_iter()
            .next()
            .and_then(|row| row.stories_this_month)
            .unwrap_or(next))
    }

    async fn increment_child_story_count(&self, child_id: &str) -> Result<u32> {
        let current: Vec<ChildCount> = self
            .select(
                "children",
                &[
                    ("select", "stories_generated".to_string()),
                    ("id", format!("eq.{}", child_id)),
                ],
                "read child count",
            )
            .await?;
        let current = current
            .into_iter()
            .next()
            .ok_or_else(|| StoryMagicError::NotFound("Child".to_string()))?;

        let next = current.stories_generated.unwrap_or(0).saturating_add(1);
        let updated: Vec<ChildCount> = self
            .update(
                "children",
                child_id,
                &ChildCountUpdate {
                    stories_generated: next,
                },
                "increment child count",
            )
            .await?;
        Ok(updated
            .into_iter()
            .next()
            .and_then(|row| row.stories_generated)
            .unwrap_or(next))
    }

    async fn update_subscription(
        &self,
        user_id: &str,
        subscription: &Subscription,
    ) -> Result<()> {
        let updated: Vec<serde_json::Value> = self
            .update(
                "users",
                user_id,
                &SubscriptionUpdate::from(subscription),
                "update subscription",
            )
            .await?;
        if updated.is_empty() {
            return Err(StoryMagicError::NotFound("User".to_string()).into());
        }
        Ok(())
    }

    async fn list_stories(&self, user_id: &str) -> Result<Vec<Story>> {
        let rows: Vec<StoryRow> = self
            .select(
                "stories",
                &[
                    ("select", "*".to_string()),
                    ("user_id", format!("eq.{}", user_id)),
                    ("order", "created_at.desc".to_string()),
                ],
                "list stories",
            )
            .await?;
        let now = Utc::now();
        Ok(rows.into_iter().map(|row| row.into_story(now)).collect())
    }
}
