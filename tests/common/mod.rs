#![allow(dead_code)]

use base64::Engine;
use codereview_service::api::{self, ApiKeyAuth, AppState};
use codereview_service::{Config, MemoryCache, ReviewService};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub mod test_helpers {
    use super::*;

    pub const API_KEY: &str = "test-api-key";
    pub const API_KEY_NAME: &str = "X-API-Key";
    pub const GITHUB_TOKEN: &str = "ghp_test";

    /// Configuration pointing both upstreams at `server`
    pub fn create_test_config(server: &MockServer, extra: &[(&str, &str)]) -> Config {
        let mut vars: HashMap<String, String> = HashMap::from([
            ("API_KEY".to_string(), API_KEY.to_string()),
            ("API_KEY_NAME".to_string(), API_KEY_NAME.to_string()),
            ("API_TOKEN_GITHUB".to_string(), GITHUB_TOKEN.to_string()),
            ("OPENAI_KEY".to_string(), "sk-test".to_string()),
            ("GITHUB_API_BASE_URL".to_string(), server.uri()),
            ("OPENAI_API_BASE".to_string(), server.uri()),
        ]);
        for (key, value) in extra {
            vars.insert(key.to_string(), value.to_string());
        }
        Config::from_lookup(move |key: &str| vars.get(key).cloned(), None).expect("test config")
    }

    /// Router backed by an in-memory cache
    pub fn create_test_app(config: &Config) -> axum::Router {
        create_test_app_with_cache(config, Arc::new(MemoryCache::new()))
    }

    /// Router backed by `cache`, so tests can inspect what was stored
    pub fn create_test_app_with_cache(config: &Config, cache: Arc<MemoryCache>) -> axum::Router {
        let service = ReviewService::from_config(config, cache).expect("service");
        let auth = ApiKeyAuth::new(&config.credentials.api_key_header, config.credentials.api_key.clone())
            .expect("auth");
        api::router(AppState::new(service, auth))
    }

    pub fn encode(content: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(content)
    }

    pub fn tree_body(entries: Value) -> Value {
        json!({ "sha": "abc123", "url": "https://api.github.com/tree", "tree": entries, "truncated": false })
    }

    pub async fn mount_tree(server: &MockServer, owner: &str, repo: &str, entries: Value, expected: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/{}/{}/git/trees/main", owner, repo)))
            .and(query_param("recursive", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tree_body(entries)))
            .expect(expected)
            .mount(server)
            .await;
    }

    pub async fn mount_file(server: &MockServer, owner: &str, repo: &str, file: &str, content: &str, expected: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/{}/{}/contents/{}", owner, repo, file)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "file",
                "encoding": "base64",
                "path": file,
                "content": encode(content),
            })))
            .expect(expected)
            .mount(server)
            .await;
    }

    pub fn completion_body(text: &str) -> Value {
        json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4-turbo",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": text },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
        })
    }

    pub async fn mount_completion(server: &MockServer, text: &str, expected: u64) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(text)))
            .expect(expected)
            .mount(server)
            .await;
    }
}
