//! GitHub platform client against a local mock server.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use syncdoctor::platform::github::GitHubPlatform;
use syncdoctor::platform::{Platform, PlatformError};
use syncdoctor::secrets::StaticCredentials;

fn platform(server: &MockServer, token: Option<&str>) -> GitHubPlatform {
    let creds = match token {
        Some(t) => StaticCredentials::new(t),
        None => StaticCredentials::none(),
    };
    GitHubPlatform::with_api_base(Arc::new(creds), "acme", "widgets", server.uri())
}

#[tokio::test]
async fn default_branch_and_admin_from_repository() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .and(header("authorization", "Bearer tok"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "default_branch": "trunk",
            "permissions": { "admin": true, "push": true, "pull": true }
        })))
        .mount(&server)
        .await;

    let platform = platform(&server, Some("tok"));
    assert_eq!(platform.default_branch().await.unwrap(), "trunk");
    assert!(platform.can_admin().await.unwrap());
}

#[tokio::test]
async fn branch_protection_flag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/branches/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "main",
            "protected": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/branches/dev"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "dev",
            "protected": false
        })))
        .mount(&server)
        .await;

    let platform = platform(&server, None);
    assert!(platform.is_branch_protected("main").await.unwrap());
    assert!(!platform.is_branch_protected("dev").await.unwrap());
}

#[tokio::test]
async fn anonymous_admin_query_is_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "default_branch": "main"
        })))
        .mount(&server)
        .await;

    let platform = platform(&server, None);
    assert_eq!(platform.default_branch().await.unwrap(), "main");
    assert!(matches!(
        platform.can_admin().await,
        Err(PlatformError::AuthFailed(_))
    ));
}

#[tokio::test]
async fn status_codes_map_to_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .and(header_exists("authorization"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/branches/gone"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Branch not found" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/branches/boom"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let platform = platform(&server, Some("expired"));
    assert!(matches!(
        platform.default_branch().await,
        Err(PlatformError::AuthFailed(_))
    ));
    assert_eq!(
        platform.is_branch_protected("gone").await,
        Err(PlatformError::NotFound("Branch not found".into()))
    );
    assert!(matches!(
        platform.is_branch_protected("boom").await,
        Err(PlatformError::Api { status: 502, .. })
    ));
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let platform =
        GitHubPlatform::with_api_base(Arc::new(StaticCredentials::none()), "acme", "widgets", uri);
    assert!(matches!(
        platform.default_branch().await,
        Err(PlatformError::Network(_))
    ));
}
