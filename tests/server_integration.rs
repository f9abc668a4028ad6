//! Integration tests for the HTTP routes.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`, and
//! the upstream GitHub API is a wiremock server.

use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use repo_info_proxy::core::config::Settings;
use repo_info_proxy::forge::github::GitHubHost;
use repo_info_proxy::forge::Credential;
use repo_info_proxy::server::{self, downstream, AppState};

// =============================================================================
// Helpers
// =============================================================================

fn repo_json(owner: &str, name: &str) -> Value {
    json!({
        "name": name,
        "full_name": format!("{}/{}", owner, name),
        "description": format!("{} description", name),
        "html_url": format!("https://github.com/{}/{}", owner, name),
        "stargazers_count": 123,
        "forks_count": 45,
        "updated_at": "2024-01-01T00:00:00Z",
        "default_branch": "main",
        "owner": {
            "login": owner,
            "avatar_url": format!("https://avatars.githubusercontent.com/{}", owner),
            "html_url": format!("https://github.com/{}", owner),
        }
    })
}

fn commit_json(owner: &str, name: &str, message: &str, date: &str) -> Value {
    json!({
        "sha": "deadbeef",
        "html_url": format!("https://github.com/{}/{}/commit/deadbeef", owner, name),
        "commit": {
            "message": message,
            "committer": {"name": "Mona", "date": date}
        }
    })
}

/// Mount metadata plus a one-commit list for `owner/name`.
async fn mount_repo(server: &MockServer, owner: &str, name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/{}", owner, name)))
        .respond_with(ResponseTemplate::new(200).set_body_json(repo_json(owner, name)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/{}/commits", owner, name)))
        .and(query_param("sha", "main"))
        .and(query_param("per_page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([commit_json(
            owner,
            name,
            "Latest change",
            "2024-06-15T08:30:00Z"
        )])))
        .mount(server)
        .await;
}

fn settings_for(server: &MockServer) -> Settings {
    Settings {
        api_base: server.uri(),
        ..Default::default()
    }
}

fn app_with(settings: Settings) -> Router {
    let host = GitHubHost::from_settings(&settings).unwrap();
    server::router(AppState::new(Arc::new(settings), Arc::new(host)))
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn assert_json_error(response: &Response, status: StatusCode) {
    assert_eq!(response.status(), status);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());
}

// =============================================================================
// Batch Route
// =============================================================================

mod bulk_route {
    use super::*;

    #[tokio::test]
    async fn one_failure_does_not_fail_batch() {
        let upstream = MockServer::start().await;
        mount_repo(&upstream, "a", "b").await;
        // c/d is not mounted: wiremock answers 404

        let response = app_with(settings_for(&upstream))
            .oneshot(post_json("/api/repos-info", r#"{"repos": ["a/b", "c/d"]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=3600"
        );
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = body_json(response).await;
        let map = body.as_object().unwrap();
        assert_eq!(map.len(), 2);

        let ok = &map["a/b"];
        assert_eq!(ok["name"], "b");
        assert_eq!(ok["full_name"], "a/b");
        assert_eq!(ok["description"], "b description");
        assert_eq!(ok["url"], "https://github.com/a/b");
        assert_eq!(ok["stars"], 123);
        assert_eq!(ok["forks"], 45);
        assert_eq!(ok["last_updated"], "2024-06-15T08:30:00Z");
        assert_eq!(ok["last_commit_message"], "Latest change");
        assert_eq!(
            ok["last_commit_url"],
            "https://github.com/a/b/commit/deadbeef"
        );
        assert_eq!(ok["owner"]["login"], "a");
        assert_eq!(ok["owner"]["url"], "https://github.com/a");

        assert_eq!(
            map["c/d"],
            json!({"name": "c/d", "error": "GitHub API error: 404", "last_updated": null})
        );
    }

    #[tokio::test]
    async fn keys_are_exact_inputs() {
        let upstream = MockServer::start().await;
        mount_repo(&upstream, "octocat", "hello").await;

        let response = app_with(settings_for(&upstream))
            .oneshot(post_json(
                "/api/repos-info",
                r#"{"repos": [
                    "https://github.com/octocat/hello.git",
                    "https://github.com/octocat/hello/tree/main",
                    "octocat/hello"
                ]}"#,
            ))
            .await
            .unwrap();

        let body = body_json(response).await;
        let map = body.as_object().unwrap();
        assert_eq!(map.len(), 3);
        for key in [
            "https://github.com/octocat/hello.git",
            "https://github.com/octocat/hello/tree/main",
            "octocat/hello",
        ] {
            assert_eq!(map[key]["full_name"], "octocat/hello", "key {}", key);
        }
    }

    #[tokio::test]
    async fn empty_commit_list_falls_back() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/a/empty"))
            .respond_with(ResponseTemplate::new(200).set_body_json(repo_json("a", "empty")))
            .mount(&upstream)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/a/empty/commits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&upstream)
            .await;

        let response = app_with(settings_for(&upstream))
            .oneshot(post_json("/api/repos-info", r#"{"repos": ["a/empty"]}"#))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["a/empty"]["last_updated"], "2024-01-01T00:00:00Z");
        assert_eq!(body["a/empty"]["last_commit_message"], "");
        assert_eq!(body["a/empty"]["last_commit_url"], "");
    }

    #[tokio::test]
    async fn commit_failure_is_degraded() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/a/b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(repo_json("a", "b")))
            .mount(&upstream)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/a/b/commits"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&upstream)
            .await;

        let response = app_with(settings_for(&upstream))
            .oneshot(post_json("/api/repos-info", r#"{"repos": ["a/b"]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body["a/b"]["error"],
            "GitHub API error fetching commits: 409"
        );
    }

    #[tokio::test]
    async fn repos_not_an_array_is_400() {
        let upstream = MockServer::start().await;

        let response = app_with(settings_for(&upstream))
            .oneshot(post_json("/api/repos-info", r#"{"repos": "not-an-array"}"#))
            .await
            .unwrap();

        assert_json_error(&response, StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("repos"));
    }

    #[tokio::test]
    async fn missing_repos_is_400() {
        let upstream = MockServer::start().await;

        let response = app_with(settings_for(&upstream))
            .oneshot(post_json("/api/repos-info", r#"{"repositories": []}"#))
            .await
            .unwrap();

        assert_json_error(&response, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_500() {
        let upstream = MockServer::start().await;

        let response = app_with(settings_for(&upstream))
            .oneshot(post_json("/api/repos-info", "{repos: ["))
            .await
            .unwrap();

        assert_json_error(&response, StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn oversized_body_is_json_413() {
        let upstream = MockServer::start().await;
        let padding = "x".repeat(3 * 1024 * 1024);
        let body = format!(r#"{{"repos": ["a/b"], "padding": "{}"}}"#, padding);

        let response = app_with(settings_for(&upstream))
            .oneshot(post_json("/api/repos-info", &body))
            .await
            .unwrap();

        assert_json_error(&response, StatusCode::PAYLOAD_TOO_LARGE);
        let body = body_json(response).await;
        assert!(body["error"].is_string());
        assert!(upstream.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_is_405_with_allow() {
        let upstream = MockServer::start().await;

        let response = app_with(settings_for(&upstream))
            .oneshot(get("/api/repos-info"))
            .await
            .unwrap();

        assert_json_error(&response, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "POST");
        let body = body_json(response).await;
        assert_eq!(body, json!({"error": "Method not allowed"}));
    }

    #[tokio::test]
    async fn empty_list_is_empty_map() {
        let upstream = MockServer::start().await;

        let response = app_with(settings_for(&upstream))
            .oneshot(post_json("/api/repos-info", r#"{"repos": []}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({}));
        assert!(upstream.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn configured_max_age() {
        let upstream = MockServer::start().await;
        let settings = Settings {
            cache_max_age_secs: 60,
            ..settings_for(&upstream)
        };

        let response = app_with(settings)
            .oneshot(post_json("/api/repos-info", r#"{"repos": []}"#))
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=60"
        );
    }
}

// =============================================================================
// Single Route
// =============================================================================

mod single_route {
    use super::*;

    #[tokio::test]
    async fn url_reference_succeeds() {
        let upstream = MockServer::start().await;
        mount_repo(&upstream, "octocat", "hello").await;

        let response = app_with(settings_for(&upstream))
            .oneshot(get(
                "/api/repo-info?repo=https%3A%2F%2Fgithub.com%2Foctocat%2Fhello.git",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=3600"
        );
        let body = body_json(response).await;
        assert_eq!(body["full_name"], "octocat/hello");
        assert_eq!(body["last_updated"], "2024-06-15T08:30:00Z");
    }

    #[tokio::test]
    async fn missing_repo_is_400() {
        let upstream = MockServer::start().await;

        let response = app_with(settings_for(&upstream))
            .oneshot(get("/api/repo-info"))
            .await
            .unwrap();

        assert_json_error(&response, StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("repo"));
    }

    #[tokio::test]
    async fn empty_repo_is_400() {
        let upstream = MockServer::start().await;

        let response = app_with(settings_for(&upstream))
            .oneshot(get("/api/repo-info?repo="))
            .await
            .unwrap();

        assert_json_error(&response, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upstream_404_is_degraded_200() {
        let upstream = MockServer::start().await;

        let response = app_with(settings_for(&upstream))
            .oneshot(get("/api/repo-info?repo=nobody/nothing"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"name": "nobody/nothing", "error": "GitHub API error: 404", "last_updated": null})
        );
    }

    #[tokio::test]
    async fn post_is_405() {
        let upstream = MockServer::start().await;

        let response = app_with(settings_for(&upstream))
            .oneshot(post_json("/api/repo-info?repo=a/b", "{}"))
            .await
            .unwrap();

        assert_json_error(&response, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET");
    }
}

// =============================================================================
// Credential Forwarding
// =============================================================================

mod credentials {
    use super::*;

    async fn authorization_headers(server: &MockServer) -> Vec<Option<String>> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| {
                r.headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            })
            .collect()
    }

    #[tokio::test]
    async fn both_routes_forward_by_default() {
        let upstream = MockServer::start().await;
        mount_repo(&upstream, "a", "b").await;
        let settings = Settings {
            credential: Some(Credential::new("ghp_route")),
            ..settings_for(&upstream)
        };
        let app = app_with(settings);

        app.clone()
            .oneshot(post_json("/api/repos-info", r#"{"repos": ["a/b"]}"#))
            .await
            .unwrap();
        app.oneshot(get("/api/repo-info?repo=a/b")).await.unwrap();

        let headers = authorization_headers(&upstream).await;
        assert_eq!(headers.len(), 4);
        assert!(headers
            .iter()
            .all(|h| h.as_deref() == Some("Bearer ghp_route")));
    }

    #[tokio::test]
    async fn single_route_can_be_unauthenticated() {
        let upstream = MockServer::start().await;
        mount_repo(&upstream, "a", "b").await;
        let settings = Settings {
            credential: Some(Credential::new("ghp_route")),
            single_credential: false,
            ..settings_for(&upstream)
        };

        app_with(settings)
            .oneshot(get("/api/repo-info?repo=a/b"))
            .await
            .unwrap();

        let headers = authorization_headers(&upstream).await;
        assert_eq!(headers.len(), 2);
        assert!(headers.iter().all(Option::is_none));
    }
}

// =============================================================================
// Downstream Fallback
// =============================================================================

mod downstream_fallback {
    use super::*;

    type Seen = Arc<Mutex<Vec<(Method, String, Bytes)>>>;

    fn recording_app(upstream: &MockServer, seen: Seen) -> Router {
        let settings = settings_for(upstream);
        let host = GitHubHost::from_settings(&settings).unwrap();
        let downstream = tower::service_fn(move |req: Request<Body>| {
            let seen = Arc::clone(&seen);
            async move {
                let (parts, body) = req.into_parts();
                let bytes = to_bytes(body, usize::MAX).await.unwrap();
                seen.lock()
                    .unwrap()
                    .push((parts.method, parts.uri.to_string(), bytes));
                Ok::<_, Infallible>((StatusCode::IM_A_TEAPOT, "from downstream").into_response())
            }
        });
        server::router_with_downstream(
            AppState::new(Arc::new(settings), Arc::new(host)),
            downstream,
        )
    }

    #[tokio::test]
    async fn unmatched_path_is_forwarded_verbatim() {
        let upstream = MockServer::start().await;
        let seen: Seen = Arc::default();

        let response = recording_app(&upstream, Arc::clone(&seen))
            .oneshot(get("/static/logo.png?v=2"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"from downstream");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, Method::GET);
        assert_eq!(seen[0].1, "/static/logo.png?v=2");
        assert!(upstream.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn forwarded_body_is_untouched() {
        let upstream = MockServer::start().await;
        let seen: Seen = Arc::default();

        recording_app(&upstream, Arc::clone(&seen))
            .oneshot(post_json("/api/other", r#"{"repos": 1}"#))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, Method::POST);
        assert_eq!(seen[0].1, "/api/other");
        assert_eq!(&seen[0].2[..], br#"{"repos": 1}"#);
    }

    #[tokio::test]
    async fn default_downstream_is_404() {
        let upstream = MockServer::start().await;

        let response = app_with(settings_for(&upstream))
            .oneshot(get("/index.html"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn forwards_to_origin() {
        let upstream = MockServer::start().await;
        let origin = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/static/logo.png"))
            .and(query_param("v", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-origin", "site")
                    .set_body_bytes(b"PNG".to_vec()),
            )
            .expect(1)
            .mount(&origin)
            .await;

        let settings = settings_for(&upstream);
        let host = GitHubHost::from_settings(&settings).unwrap();
        let forwarder = downstream::forward_to(&origin.uri(), reqwest::Client::new()).unwrap();
        let app = server::router_with_downstream(
            AppState::new(Arc::new(settings), Arc::new(host)),
            forwarder,
        );

        let response = app.oneshot(get("/static/logo.png?v=2")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-origin").unwrap(), "site");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"PNG");
    }

    #[tokio::test]
    async fn redirects_are_passed_through() {
        let upstream = MockServer::start().await;
        let origin = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/new"))
            .expect(1)
            .mount(&origin)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("followed"))
            .expect(0)
            .mount(&origin)
            .await;

        let settings = settings_for(&upstream);
        let host = GitHubHost::from_settings(&settings).unwrap();
        let client = downstream::forwarding_client(&settings.user_agent).unwrap();
        let forwarder = downstream::forward_to(&origin.uri(), client).unwrap();
        let app = server::router_with_downstream(
            AppState::new(Arc::new(settings), Arc::new(host)),
            forwarder,
        );

        let response = app.oneshot(get("/old")).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/new");
    }

    #[tokio::test]
    async fn unreachable_origin_is_502() {
        let upstream = MockServer::start().await;
        let settings = settings_for(&upstream);
        let host = GitHubHost::from_settings(&settings).unwrap();
        let forwarder =
            downstream::forward_to("http://127.0.0.1:9", reqwest::Client::new()).unwrap();
        let app = server::router_with_downstream(
            AppState::new(Arc::new(settings), Arc::new(host)),
            forwarder,
        );

        let response = app.oneshot(get("/anything")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
