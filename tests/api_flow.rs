//! End-to-end tests for the HTTP API over the in-memory store
//!
//! Covers:
//! - Registration, duplicate email rejection and login
//! - Child profiles and the user view
//! - Story generation with fail-open fallback and the free-plan quota
//! - Simulated upgrade and downgrade
//! - Story listing and static/utility routes

mod common;

use axum::http::StatusCode;
use common::{demo_app, send, DownProvider, ScriptedProvider};
use serde_json::json;
use std::sync::Arc;
use storymagic::StoryStore;

const DEMO_EMAIL: &str = "test@example.com";

fn scripted() -> Arc<ScriptedProvider> {
    Arc::new(ScriptedProvider(
        "Emma found a map.\n\nShe followed it.\n\nThe End!".to_string(),
    ))
}

#[tokio::test]
async fn test_register_then_login() {
    let (app, memory, _public) = demo_app(scripted());

    let body = json!({"parentName": "Pat", "email": "Pat@Example.com", "password": "pw1"});
    let (status, reply) = send(&app, "POST", "/api/register", Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["success"], true);
    assert_eq!(reply["parentName"], "Pat");
    let user_id = reply["userId"].as_str().unwrap().to_string();

    let (status, reply) = send(&app, "POST", "/api/register", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["error"], "Email already registered");

    let user = memory
        .get_user_by_email("pat@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.id, user_id);

    let (status, reply) = send(
        &app,
        "POST",
        "/api/login",
        Some(json!({"email": "pat@example.com", "password": "pw1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["userId"], user_id.as_str());

    let (status, reply) = send(
        &app,
        "POST",
        "/api/login",
        Some(json!({"email": "pat@example.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_register_and_login_validation() {
    let (app, _, _public) = demo_app(scripted());

    let (status, reply) = send(&app, "POST", "/api/register", Some(json!({"email": "a@b.c"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["error"], "All fields are required");

    let (status, reply) = send(&app, "POST", "/api/login", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["error"], "Email and password are required");

    let (status, _) = send(&app, "POST", "/api/login", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_demo_login_and_user_view() {
    let (app, _, _public) = demo_app(scripted());

    let (status, reply) = send(
        &app,
        "POST",
        "/api/login",
        Some(json!({"email": DEMO_EMAIL, "password": "test123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["parentName"], "Test Parent");

    let (status, user) = send(&app, "GET", "/api/user/test@example.com", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["subscription"]["plan"], "free");
    assert_eq!(user["subscription"]["storiesThisMonth"], 1);
    assert_eq!(user["children"][0]["name"], "Emma");
    assert_eq!(user["children"][0]["readingLevel"], "intermediate");
    assert!(user.get("passwordHash").is_none());

    let (status, reply) = send(&app, "GET", "/api/user/nobody@example.com", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(reply["error"], "User not found");
}

#[tokio::test]
async fn test_add_child() {
    let (app, _, _public) = demo_app(scripted());

    let (status, reply) = send(
        &app,
        "POST",
        "/api/add-child",
        Some(json!({
            "parentEmail": DEMO_EMAIL,
            "childName": "Liam",
            "age": "5",
            "favoriteBooks": ["Gruffalo", "gruffalo "],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["child"]["age"], 5);
    assert_eq!(reply["child"]["readingLevel"], "intermediate");
    assert_eq!(reply["child"]["favoriteBooks"], json!(["Gruffalo"]));
    assert_eq!(reply["child"]["storiesGenerated"], 0);

    let (_, user) = send(&app, "GET", "/api/user/test@example.com", None).await;
    assert_eq!(user["children"].as_array().unwrap().len(), 2);

    let (status, reply) = send(
        &app,
        "POST",
        "/api/add-child",
        Some(json!({"parentEmail": DEMO_EMAIL, "childName": "Liam"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["error"], "Child name and age are required");

    let (status, reply) = send(
        &app,
        "POST",
        "/api/add-child",
        Some(json!({"parentEmail": "ghost@example.com", "childName": "Liam", "age": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(reply["error"], "Parent not found");
}

#[tokio::test]
async fn test_generate_story_and_free_quota() {
    let (app, memory, _public) = demo_app(scripted());
    let request = json!({
        "childName": "Emma",
        "age": 7,
        "parentEmail": DEMO_EMAIL,
        "customization": {"length": "short", "mood": "calm", "includePictures": false},
    });

    // Demo user starts with 1 of 3 free stories used
    for _ in 0..2 {
        let (status, reply) = send(&app, "POST", "/api/generate-story", Some(request.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["origin"], "model");
        assert_eq!(reply["pages"].as_array().unwrap().len(), 2);
        assert_eq!(reply["images"], json!([]));
        assert_eq!(reply["customization"]["mood"], "calm");
    }

    let (status, reply) = send(&app, "POST", "/api/generate-story", Some(request)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(reply["needsUpgrade"], true);
    assert_eq!(reply["plan"], "free");
    assert_eq!(reply["storiesThisMonth"], 3);
    assert_eq!(reply["limit"], 3);

    let user = memory.get_user_by_email(DEMO_EMAIL).await.unwrap().unwrap();
    assert_eq!(user.subscription.stories_this_month, 3);
    assert_eq!(user.children[0].stories_generated, 5);
}

#[tokio::test]
async fn test_generate_story_fails_open() {
    let (app, _, _public) = demo_app(Arc::new(DownProvider));

    let (status, reply) = send(
        &app,
        "POST",
        "/api/generate-story",
        Some(json!({"childName": "Zoe", "favoriteBooks": ["Matilda"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["origin"], "fallback");
    let story = reply["story"].as_str().unwrap();
    assert!(story.contains("Zoe"));
    assert!(story.contains("Matilda"));
}

#[tokio::test]
async fn test_generate_story_requires_child_name() {
    let (app, _, _public) = demo_app(scripted());
    let (status, reply) = send(&app, "POST", "/api/generate-story", Some(json!({"age": 7}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["error"], "Child name is required");
}

#[tokio::test]
async fn test_generate_story_with_placeholder_pictures() {
    let (app, _, _public) = demo_app(scripted());
    let (status, reply) = send(
        &app,
        "POST",
        "/api/generate-story",
        Some(json!({
            "childName": "Emma",
            "customization": {"includePictures": true, "adventureType": "space"},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let images = reply["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert!(images[0]
        .as_str()
        .unwrap()
        .starts_with("data:image/svg+xml;base64,"));
}

#[tokio::test]
async fn test_upgrade_lifts_quota_and_downgrade_resets() {
    let (app, memory, _public) = demo_app(scripted());

    let (status, reply) = send(
        &app,
        "POST",
        "/api/upgrade-subscription",
        Some(json!({"userEmail": DEMO_EMAIL, "planId": "free"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["error"], "Invalid plan");

    let (status, reply) = send(
        &app,
        "POST",
        "/api/upgrade-subscription",
        Some(json!({"userEmail": "ghost@example.com", "planId": "basic"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(reply["error"], "User not found");

    let (status, reply) = send(
        &app,
        "POST",
        "/api/upgrade-subscription",
        Some(json!({"userEmail": DEMO_EMAIL, "planId": "premium"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply, json!({"success": true, "plan": "Premium"}));

    let request = json!({"childName": "Emma", "parentEmail": DEMO_EMAIL});
    for _ in 0..5 {
        let (status, _) = send(&app, "POST", "/api/generate-story", Some(request.clone())).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, reply) = send(
        &app,
        "POST",
        "/api/downgrade-subscription",
        Some(json!({"userEmail": DEMO_EMAIL})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply, json!({"success": true, "plan": "free"}));

    let user = memory.get_user_by_email(DEMO_EMAIL).await.unwrap().unwrap();
    assert_eq!(user.subscription.stories_this_month, 0);
    assert_eq!(user.subscription.plan.as_str(), "free");

    let (status, _) = send(
        &app,
        "POST",
        "/api/downgrade-subscription",
        Some(json!({"userEmail": "ghost@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stories_listed_newest_first() {
    let (app, _, _public) = demo_app(scripted());

    let (status, reply) = send(&app, "GET", "/api/stories/test@example.com", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply, json!([]));

    for name in ["Emma", "Liam"] {
        let request = json!({"childName": name, "parentEmail": DEMO_EMAIL});
        let (status, _) = send(&app, "POST", "/api/generate-story", Some(request)).await;
        assert_eq!(status, StatusCode::OK);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let (_, reply) = send(&app, "GET", "/api/stories/test@example.com", None).await;
    let stories = reply.as_array().unwrap();
    assert_eq!(stories.len(), 2);
    assert_eq!(stories[0]["childName"], "Liam");
    assert_eq!(stories[0]["childId"], serde_json::Value::Null);
    assert_eq!(stories[0]["origin"], "generated");
    assert_eq!(stories[0]["favoriteBooks"], json!(["General Adventure Stories"]));
    assert_eq!(stories[0]["customization"]["includePictures"], false);
    assert_eq!(stories[1]["childName"], "Emma");
    assert_eq!(stories[1]["childId"], "child1");

    let (status, _) = send(&app, "GET", "/api/stories/ghost@example.com", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalog_health_and_static_routes() {
    let (app, _, _public) = demo_app(scripted());

    let (status, plans) = send(&app, "GET", "/api/subscription-plans", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plans["basic"]["storiesPerMonth"], 25);
    assert_eq!(plans["premium"]["storiesPerMonth"], -1);

    let (status, reply) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["status"], "ok");

    let (status, _) = send(&app, "GET", "/favicon.ico", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, page) = send(&app, "GET", "/index.html", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.as_str().unwrap().contains("StoryMagic"));
}
