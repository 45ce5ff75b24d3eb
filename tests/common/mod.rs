use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use storymagic::config::Config;
use storymagic::providers::{CompletionOptions, CompletionResponse, Message, Provider};
use storymagic::server::{router, AppState};
use storymagic::{MemoryStore, StoryMagicError, StoryStore};
use tempfile::TempDir;
use tower::ServiceExt;

/// Provider that always answers with the same text
#[allow(dead_code)]
pub struct ScriptedProvider(pub String);

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> String {
        "scripted-model".to_string()
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _options: &CompletionOptions,
    ) -> storymagic::Result<CompletionResponse> {
        Ok(CompletionResponse::new(
            Message::assistant(self.0.clone()),
            self.model(),
        ))
    }
}

/// Provider whose every call fails
#[allow(dead_code)]
pub struct DownProvider;

#[async_trait]
impl Provider for DownProvider {
    fn name(&self) -> &'static str {
        "down"
    }

    fn model(&self) -> String {
        "down-model".to_string()
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _options: &CompletionOptions,
    ) -> storymagic::Result<CompletionResponse> {
        Err(StoryMagicError::Provider("connection refused".to_string()).into())
    }
}

/// Router over a demo-seeded memory store; returns the store for inspection
#[allow(dead_code)]
pub fn demo_app(provider: Arc<dyn Provider>) -> (Router, MemoryStore, TempDir) {
    let memory = MemoryStore::with_demo_data().expect("seed demo data");
    let public = TempDir::new().expect("failed to create tempdir");
    fs::write(public.path().join("index.html"), "<h1>StoryMagic</h1>")
        .expect("failed to write index");

    let store: Arc<dyn StoryStore> = Arc::new(memory.clone());
    let state = AppState::new(store, provider, &Config::default()).expect("build state");
    (router(Arc::new(state), public.path()), memory, public)
}

/// Send one request and decode the JSON reply (Null for empty bodies)
#[allow(dead_code)]
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let response = app.clone().oneshot(request).await.expect("router response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
