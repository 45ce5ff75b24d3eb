//! Route handlers

use super::dto::{
    plan_catalog, AddChildRequest, AddChildResponse, AuthResponse, ChildDto, DowngradeRequest,
    GenerateStoryRequest, GenerateStoryResponse, LoginRequest, PlanChangeResponse,
    RegisterRequest, StoryDto, UpgradeRequest, UserDto,
};
use super::error::{ApiError, OrFail};
use super::AppState;
use crate::credentials::{hash_password, verify_password};
use crate::error::StoryMagicError;
use crate::models::{catalog, NewUser, User};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;

type Shared = State<Arc<AppState>>;

async fn find_user(state: &AppState, email: &str, missing: &str) -> crate::error::Result<User> {
    state
        .store
        .get_user_by_email(email)
        .await?
        .ok_or_else(|| StoryMagicError::NotFound(missing.to_string()).into())
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// `POST /api/register`
pub async fn register(
    State(state): Shared,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    const FAILURE: &str = "Registration failed";
    let Json(payload) = payload?;
    let (parent_name, email, password) = payload.into_fields().or_fail(FAILURE)?;

    let password_hash = hash_password(&password).or_fail(FAILURE)?;
    let user = state
        .store
        .create_user(NewUser {
            parent_name,
            email,
            password_hash,
        })
        .await
        .or_fail(FAILURE)?;

    tracing::info!(user_id = %user.id, "Registered {}", user.email);
    Ok(Json(AuthResponse::from(&user)))
}

/// `POST /api/login`
pub async fn login(
    State(state): Shared,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    const FAILURE: &str = "Login failed";
    let Json(payload) = payload?;
    let (email, password) = payload.into_fields().or_fail(FAILURE)?;

    let user = state
        .store
        .get_user_by_email(&email)
        .await
        .or_fail(FAILURE)?;

    match user {
        Some(user) if verify_password(&password, &user.password_hash) => {
            tracing::info!(user_id = %user.id, "Login for {}", user.email);
            Ok(Json(AuthResponse::from(&user)))
        }
        _ => {
            tracing::info!("Rejected login for {}", email);
            Err(ApiError::from_error(
                StoryMagicError::InvalidCredentials.into(),
                FAILURE,
            ))
        }
    }
}

/// `POST /api/add-child`
pub async fn add_child(
    State(state): Shared,
    payload: Result<Json<AddChildRequest>, JsonRejection>,
) -> Result<Json<AddChildResponse>, ApiError> {
    const FAILURE: &str = "Failed to add child";
    let Json(payload) = payload?;
    let (parent_email, new_child) = payload.into_parts().or_fail(FAILURE)?;

    let user = find_user(&state, &parent_email, "Parent")
        .await
        .or_fail(FAILURE)?;
    let child = state
        .store
        .add_child(&user.id, new_child)
        .await
        .or_fail(FAILURE)?;

    tracing::info!(user_id = %user.id, child_id = %child.id, "Added child {}", child.name);
    Ok(Json(AddChildResponse {
        success: true,
        child: ChildDto::from(&child),
    }))
}

/// `GET /api/user/:email`
pub async fn get_user(
    State(state): Shared,
    Path(email): Path<String>,
) -> Result<Json<UserDto>, ApiError> {
    let user = find_user(&state, &email, "User")
        .await
        .or_fail("Failed to get user data")?;
    Ok(Json(UserDto::from(&user)))
}

/// `POST /api/generate-story`
pub async fn generate_story(
    State(state): Shared,
    payload: Result<Json<GenerateStoryRequest>, JsonRejection>,
) -> Result<Json<GenerateStoryResponse>, ApiError> {
    const FAILURE: &str = "Failed to generate story. Please try again!";
    let Json(payload) = payload?;
    let request = payload.into_request().or_fail(FAILURE)?;

    let result = state.workflow.run(request).await.or_fail(FAILURE)?;
    Ok(Json(GenerateStoryResponse {
        origin: result.origin.label(),
        story: result.story,
        images: result.images,
        customization: result.customization,
        pages: result.pages,
    }))
}

/// `GET /api/subscription-plans`
pub async fn subscription_plans() -> Json<Value> {
    Json(json!(plan_catalog(catalog())))
}

/// `POST /api/upgrade-subscription`
pub async fn upgrade_subscription(
    State(state): Shared,
    payload: Result<Json<UpgradeRequest>, JsonRejection>,
) -> Result<Json<PlanChangeResponse>, ApiError> {
    const FAILURE: &str = "Failed to upgrade subscription";
    let Json(payload) = payload?;

    let (plan, _) = state
        .subscriptions
        .upgrade(
            payload.user_email.as_deref().unwrap_or_default(),
            payload.plan_id.as_deref().unwrap_or_default(),
        )
        .await
        .or_fail(FAILURE)?;

    Ok(Json(PlanChangeResponse {
        success: true,
        plan: plan.name.to_string(),
    }))
}

/// `POST /api/downgrade-subscription`
pub async fn downgrade_subscription(
    State(state): Shared,
    payload: Result<Json<DowngradeRequest>, JsonRejection>,
) -> Result<Json<PlanChangeResponse>, ApiError> {
    let Json(payload) = payload?;

    let (plan, _) = state
        .subscriptions
        .downgrade(payload.user_email.as_deref().unwrap_or_default())
        .await
        .or_fail("Failed to downgrade subscription")?;

    Ok(Json(PlanChangeResponse {
        success: true,
        plan: plan.id.to_string(),
    }))
}

/// `GET /api/stories/:email`
pub async fn list_stories(
    State(state): Shared,
    Path(email): Path<String>,
) -> Result<Json<Vec<StoryDto>>, ApiError> {
    const FAILURE: &str = "Failed to get stories";
    let user = find_user(&state, &email, "User").await.or_fail(FAILURE)?;
    let stories = state.store.list_stories(&user.id).await.or_fail(FAILURE)?;
    Ok(Json(stories.into_iter().map(StoryDto::from).collect()))
}
