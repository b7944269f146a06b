use codereview_service::github::{EntryKind, FetchLimits, GitHubClient, RepositoryReference};
use codereview_service::{RepositoryAggregator, ReviewError};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::test_helpers::*;

fn github(server: &MockServer, limits: FetchLimits) -> GitHubClient {
    GitHubClient::new(GITHUB_TOKEN, &server.uri(), limits, None).unwrap()
}

fn repo() -> RepositoryReference {
    RepositoryReference::new("sample", "repo")
}

#[tokio::test]
async fn test_tree_request_is_authenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/sample/repo/git/trees/main"))
        .and(query_param("recursive", "1"))
        .and(header("authorization", "Bearer ghp_test"))
        .and(header("accept", "application/vnd.github+json"))
        .and(header("x-github-api-version", "2022-11-28"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tree_body(json!([
            {"path": "src", "mode": "040000", "type": "tree", "sha": "1"},
            {"path": "src/main.rs", "mode": "100644", "type": "blob", "sha": "2", "size": 12}
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let tree = github(&server, FetchLimits::default())
        .get_tree(&repo(), "main")
        .await
        .unwrap();

    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].kind, EntryKind::Tree);
    assert_eq!(tree[1].path, "src/main.rs");
    assert_eq!(tree[1].size, Some(12));
}

#[tokio::test]
async fn test_upstream_error_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/sample/repo/git/trees/main"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message": "Not Found"}"#))
        .mount(&server)
        .await;

    let err = github(&server, FetchLimits::default())
        .get_tree(&repo(), "main")
        .await
        .unwrap_err();

    match err {
        ReviewError::GitHubApi { status, ref body, ref context } => {
            assert_eq!(status, 404);
            assert_eq!(body, r#"{"message": "Not Found"}"#);
            assert_eq!(context, "Failed to retrieve tree");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_entry_limit_boundary() {
    let server = MockServer::start().await;
    mount_tree(
        &server,
        "sample",
        "repo",
        json!([
            {"path": "a", "type": "blob", "size": 1},
            {"path": "b", "type": "blob", "size": 1},
            {"path": "c", "type": "tree"}
        ]),
        2,
    )
    .await;

    let at_limit = FetchLimits {
        max_entries: 3,
        ..FetchLimits::default()
    };
    assert!(github(&server, at_limit).get_tree(&repo(), "main").await.is_ok());

    let below = FetchLimits {
        max_entries: 2,
        ..FetchLimits::default()
    };
    let err = github(&server, below).get_tree(&repo(), "main").await.unwrap_err();
    assert!(matches!(err, ReviewError::TooManyEntries { limit: 2 }));
    assert_eq!(err.status_code(), 403);
}

#[tokio::test]
async fn test_oversized_repository_fetches_no_content() {
    let server = MockServer::start().await;
    mount_tree(
        &server,
        "sample",
        "repo",
        json!([
            {"path": "big.bin", "type": "blob", "size": 7 * 1024 * 1024},
            {"path": "small.txt", "type": "blob", "size": 1}
        ]),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/repos/sample/repo/contents/.*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let aggregator = RepositoryAggregator::new(Arc::new(github(&server, FetchLimits::default())), "main");
    let err = aggregator.aggregate(&repo()).await.unwrap_err();

    assert!(matches!(err, ReviewError::RepositoryTooLarge { .. }));
    assert_eq!(err.to_string(), "Exceeded the maximum size limit: 7 MB");
}

#[tokio::test]
async fn test_file_content_is_decoded() {
    let server = MockServer::start().await;
    mount_file(&server, "sample", "repo", "README.md", "hi\nthere\n", 1).await;

    let content = github(&server, FetchLimits::default())
        .get_file_content(&repo(), "README.md")
        .await
        .unwrap();
    assert_eq!(content, "hi\nthere\n");
}

#[tokio::test]
async fn test_nested_path_with_space() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/sample/repo/contents/docs/read%20me.md"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": encode("notes") })))
        .expect(1)
        .mount(&server)
        .await;

    let content = github(&server, FetchLimits::default())
        .get_file_content(&repo(), "docs/read me.md")
        .await
        .unwrap();
    assert_eq!(content, "notes");
}

#[tokio::test]
async fn test_missing_file_reports_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/sample/repo/contents/gone.py"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let err = github(&server, FetchLimits::default())
        .get_file_content(&repo(), "gone.py")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
    assert_eq!(err.to_string(), "Failed to retrieve file content for gone.py: Not Found");
}

#[tokio::test]
async fn test_non_utf8_content_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/sample/repo/contents/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": "iVBORw0KGgo=" })))
        .mount(&server)
        .await;

    let err = github(&server, FetchLimits::default())
        .get_file_content(&repo(), "logo.png")
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::Decode { ref path, .. } if path == "logo.png"));
}

#[tokio::test]
async fn test_aggregate_against_github() {
    let server = MockServer::start().await;
    mount_tree(
        &server,
        "sample",
        "repo",
        json!([
            {"path": "a.py", "type": "blob", "size": 5},
            {"path": "dir", "type": "tree"},
            {"path": "dir/b.py", "type": "blob", "size": 5}
        ]),
        1,
    )
    .await;
    mount_file(&server, "sample", "repo", "a.py", "print('a')", 1).await;
    mount_file(&server, "sample", "repo", "dir/b.py", "print('b')", 1).await;

    let aggregator = RepositoryAggregator::new(Arc::new(github(&server, FetchLimits::default())), "main")
        .with_max_concurrent(2);
    let snapshot = aggregator
        .aggregate_url("https://github.com/sample/repo")
        .await
        .unwrap();

    assert_eq!(snapshot.file_list, "a.py\ndir/b.py");
    assert_eq!(
        snapshot.file_contents,
        "Content of a.py:\nprint('a')\nContent of dir/b.py:\nprint('b')"
    );
}
