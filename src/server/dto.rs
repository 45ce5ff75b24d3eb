//! API request and response bodies
//!
//! All payloads are camelCase JSON. Request fields are optional at the
//! serde level so a missing field produces the endpoint's own validation
//! message instead of a generic body rejection.

use crate::error::{Result, StoryMagicError};
use crate::models::{
    Child, ContentOrigin, NewChild, PlanTier, RawCustomization, ReadingLevel, Story,
    SubscriptionPlan, User,
};
use crate::story::StoryRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Read an age sent as a number or a numeric string
///
/// Fractions are truncated; anything else (including zero) is `None`.
pub fn parse_age(value: Option<&Value>) -> Option<u32> {
    let age = match value? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))?,
        Value::String(s) => {
            let s = s.trim();
            let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u64>().ok()?
        }
        _ => return None,
    };
    u32::try_from(age).ok().filter(|a| *a > 0)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_reading_level(raw: Option<&str>) -> Option<ReadingLevel> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(level) => Some(level),
        Err(_) => {
            tracing::debug!("Ignoring unknown reading level '{}'", raw);
            None
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub parent_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl RegisterRequest {
    /// Name, email and password, all non-blank
    pub fn into_fields(self) -> Result<(String, String, String)> {
        match (
            non_blank(self.parent_name),
            non_blank(self.email),
            self.password.filter(|p| !p.is_empty()),
        ) {
            (Some(name), Some(email), Some(password)) => Ok((name, email, password)),
            _ => Err(StoryMagicError::Validation("All fields are required".to_string()).into()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn into_fields(self) -> Result<(String, String)> {
        match (non_blank(self.email), self.password.filter(|p| !p.is_empty())) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(
                StoryMagicError::Validation("Email and password are required".to_string()).into(),
            ),
        }
    }
}

/// Register and login reply
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub user_id: String,
    pub parent_name: String,
}

impl From<&User> for AuthResponse {
    fn from(user: &User) -> Self {
        Self {
            success: true,
            user_id: user.id.clone(),
            parent_name: user.parent_name.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChildRequest {
    pub parent_email: Option<String>,
    pub child_name: Option<String>,
    pub age: Option<Value>,
    #[serde(default)]
    pub favorite_books: Vec<String>,
    pub interests: Option<String>,
    pub reading_level: Option<String>,
}

impl AddChildRequest {
    /// Parent email (possibly blank) and the child to create
    pub fn into_parts(self) -> Result<(String, NewChild)> {
        let (Some(name), Some(age)) = (non_blank(self.child_name), parse_age(self.age.as_ref()))
        else {
            return Err(
                StoryMagicError::Validation("Child name and age are required".to_string()).into(),
            );
        };

        let child = NewChild::new(
            name,
            age,
            parse_reading_level(self.reading_level.as_deref()).unwrap_or_default(),
            self.favorite_books,
            self.interests.unwrap_or_default(),
        );
        Ok((self.parent_email.unwrap_or_default(), child))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildDto {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub reading_level: ReadingLevel,
    pub favorite_books: Vec<String>,
    pub interests: String,
    pub stories_generated: u32,
}

impl From<&Child> for ChildDto {
    fn from(child: &Child) -> Self {
        Self {
            id: child.id.clone(),
            name: child.name.clone(),
            age: child.age,
            reading_level: child.reading_level,
            favorite_books: child.favorite_books.clone(),
            interests: child.interests.clone(),
            stories_generated: child.stories_generated,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddChildResponse {
    pub success: bool,
    pub child: ChildDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDto {
    pub plan: PlanTier,
    pub status: String,
    pub stories_this_month: u32,
    pub reset_date: DateTime<Utc>,
}

/// Account view returned by `GET /api/user/:email`; never includes the password hash
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub parent_name: String,
    pub email: String,
    pub subscription: SubscriptionDto,
    pub children: Vec<ChildDto>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            parent_name: user.parent_name.clone(),
            email: user.email.clone(),
            subscription: SubscriptionDto {
                plan: user.subscription.plan,
                status: user.subscription.status.to_string(),
                stories_this_month: user.subscription.stories_this_month,
                reset_date: user.subscription.reset_date,
            },
            children: user.children.iter().map(ChildDto::from).collect(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateStoryRequest {
    pub child_name: Option<String>,
    #[serde(default)]
    pub favorite_books: Vec<String>,
    pub imagination: Option<String>,
    pub age: Option<Value>,
    pub reading_level: Option<String>,
    pub parent_email: Option<String>,
    #[serde(default)]
    pub customization: RawCustomization,
}

impl GenerateStoryRequest {
    pub fn into_request(self) -> Result<StoryRequest> {
        let child_name = non_blank(self.child_name)
            .ok_or_else(|| StoryMagicError::Validation("Child name is required".to_string()))?;
        Ok(StoryRequest {
            child_name,
            favorite_books: self.favorite_books,
            imagination: self.imagination,
            age: parse_age(self.age.as_ref()),
            reading_level: parse_reading_level(self.reading_level.as_deref()),
            parent_email: non_blank(self.parent_email),
            customization: self.customization,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateStoryResponse {
    pub story: String,
    pub images: Vec<String>,
    pub customization: RawCustomization,
    pub pages: Vec<String>,
    /// `model` or `fallback`
    pub origin: &'static str,
}

/// Plan catalog keyed by plan id
pub fn plan_catalog(plans: &'static [SubscriptionPlan]) -> BTreeMap<&'static str, &'static SubscriptionPlan> {
    plans.iter().map(|p| (p.id.as_str(), p)).collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequest {
    pub user_email: Option<String>,
    pub plan_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DowngradeRequest {
    pub user_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlanChangeResponse {
    pub success: bool,
    pub plan: String,
}

/// A saved story as listed by `GET /api/stories/:email`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDto {
    pub id: String,
    pub user_id: String,
    pub child_id: Option<String>,
    pub child_name: String,
    pub story: String,
    pub favorite_books: Vec<String>,
    pub imagination: Option<String>,
    pub age: Option<u32>,
    pub reading_level: Option<ReadingLevel>,
    pub customization: RawCustomization,
    pub subscription_plan: PlanTier,
    pub origin: ContentOrigin,
    pub created_at: DateTime<Utc>,
}

impl From<Story> for StoryDto {
    fn from(story: Story) -> Self {
        Self {
            id: story.id,
            user_id: story.user_id,
            child_id: story.child_id,
            child_name: story.child_name,
            story: story.content,
            favorite_books: story.inputs.favorite_books,
            imagination: story.inputs.imagination,
            age: story.inputs.age,
            reading_level: story.inputs.reading_level,
            customization: story.inputs.customization,
            subscription_plan: story.inputs.subscription_plan,
            origin: story.origin,
            created_at: story.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog;
    use crate::test_utils::assert_error_contains;
    use serde_json::json;

    #[test]
    fn test_parse_age_accepts_numbers_and_strings() {
        assert_eq!(parse_age(Some(&json!(7))), Some(7));
        assert_eq!(parse_age(Some(&json!(7.9))), Some(7));
        assert_eq!(parse_age(Some(&json!("9"))), Some(9));
        assert_eq!(parse_age(Some(&json!(" 10 years"))), Some(10));
    }

    #[test]
    fn test_parse_age_rejects_garbage() {
        assert_eq!(parse_age(None), None);
        assert_eq!(parse_age(Some(&json!("seven"))), None);
        assert_eq!(parse_age(Some(&json!(0))), None);
        assert_eq!(parse_age(Some(&json!(-3))), None);
        assert_eq!(parse_age(Some(&json!(null))), None);
        assert_eq!(parse_age(Some(&json!([7]))), None);
    }

    #[test]
    fn test_register_requires_all_fields() {
        let req: RegisterRequest =
            serde_json::from_value(json!({"parentName": "Pat", "email": " "})).unwrap();
        assert_error_contains(&req.into_fields().unwrap_err(), "All fields are required");
    }

    #[test]
    fn test_add_child_defaults() {
        let req: AddChildRequest = serde_json::from_value(json!({
            "parentEmail": "pat@example.com",
            "childName": "Liam",
            "age": "6",
            "readingLevel": "expert",
        }))
        .unwrap();
        let (email, child) = req.into_parts().unwrap();
        assert_eq!(email, "pat@example.com");
        assert_eq!(child.age, 6);
        assert_eq!(child.reading_level, ReadingLevel::Intermediate);
        assert!(child.favorite_books.is_empty());
        assert_eq!(child.interests, "");
    }

    #[test]
    fn test_add_child_requires_age() {
        let req: AddChildRequest =
            serde_json::from_value(json!({"childName": "Liam", "age": "abc"})).unwrap();
        assert_error_contains(&req.into_parts().unwrap_err(), "Child name and age are required");
    }

    #[test]
    fn test_generate_request_tolerates_bad_age() {
        let req: GenerateStoryRequest = serde_json::from_value(json!({
            "childName": "Emma",
            "age": "unknown",
            "readingLevel": "Advanced",
            "parentEmail": "",
        }))
        .unwrap();
        let request = req.into_request().unwrap();
        assert_eq!(request.age, None);
        assert_eq!(request.reading_level, Some(ReadingLevel::Advanced));
        assert_eq!(request.parent_email, None);
    }

    #[test]
    fn test_catalog_uses_unlimited_sentinel() {
        let value = serde_json::to_value(plan_catalog(catalog())).unwrap();
        assert_eq!(value["free"]["storiesPerMonth"], 3);
        assert_eq!(value["premium"]["storiesPerMonth"], -1);
        assert_eq!(value["basic"]["id"], "basic");
    }
}
