use std::net::SocketAddr;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
    response::Response,
    routing::get,
};
use serde_json::Value;
use slidecast_relay::{RelayState, router};
use tower::ServiceExt;

const PIXELS: &[u8] = b"\x89PNG\r\n\x1a\nnot really pixels";

async fn spawn_upstream() -> SocketAddr {
    let upstream = Router::new()
        .route(
            "/img.png",
            get(|| async {
                (
                    [
                        (header::CONTENT_TYPE, "image/png"),
                        (header::CACHE_CONTROL, "public, max-age=600"),
                        (header::ETAG, "\"abc123\""),
                        (header::LAST_MODIFIED, "Tue, 01 Sep 2026 10:00:00 GMT"),
                        (header::SET_COOKIE, "session=secret"),
                    ],
                    PIXELS,
                )
            }),
        )
        .route(
            "/gone.png",
            get(|| async { (StatusCode::NOT_FOUND, "gone") }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, upstream).await.unwrap();
    });
    addr
}

fn app() -> Router {
    router(RelayState::new(reqwest::Client::new()))
}

fn relay_uri(target: &str) -> String {
    let encoded: String =
        url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
    format!("/relay?url={encoded}")
}

async fn get_relay(uri: &str) -> Response {
    app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn assert_cors(response: &Response) {
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, OPTIONS");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "*");
}

#[tokio::test]
async fn missing_url_is_a_bad_request() {
    for uri in ["/relay", "/relay?url="] {
        let response = get_relay(uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_cors(&response);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Missing url parameter");
    }
}

#[tokio::test]
async fn non_http_scheme_is_rejected() {
    let response = get_relay(&relay_uri("ftp://files.example/a.png")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Invalid protocol");
}

#[tokio::test]
async fn unparseable_url_is_an_internal_error() {
    let response = get_relay(&relay_uri("not a url")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Failed to relay media");
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn unreachable_upstream_is_an_internal_error() {
    // Bind then drop to get a port nothing listens on.
    let closed = {
        let listener =
            tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let response =
        get_relay(&relay_uri(&format!("http://{closed}/img.png"))).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&response);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Failed to relay media");
}

#[tokio::test]
async fn relays_body_and_mirrors_selected_headers() {
    let addr = spawn_upstream().await;

    let response =
        get_relay(&relay_uri(&format!("http://{addr}/img.png"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);

    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=600");
    assert_eq!(headers[header::ETAG], "\"abc123\"");
    assert_eq!(
        headers[header::LAST_MODIFIED],
        "Tue, 01 Sep 2026 10:00:00 GMT"
    );
    assert_eq!(
        headers[header::CONTENT_LENGTH],
        PIXELS.len().to_string().as_str()
    );
    assert!(headers.get(header::SET_COOKIE).is_none());

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], PIXELS);
}

#[tokio::test]
async fn upstream_status_is_passed_through() {
    let addr = spawn_upstream().await;

    let response =
        get_relay(&relay_uri(&format!("http://{addr}/gone.png"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_cors(&response);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"gone");
}

#[tokio::test]
async fn preflight_returns_no_content() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/relay")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_cors(&response);
}

#[tokio::test]
async fn unknown_paths_are_not_relayed() {
    let response = get_relay("/elsewhere").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
