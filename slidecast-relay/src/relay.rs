//! `GET /relay?url=` handler.
//!
//! The relay is a pure pass-through: the upstream status, a fixed set of
//! cache-relevant headers and the body stream are handed back unchanged,
//! with permissive CORS headers added. Nothing is cached or scheduled here.

use axum::{
    Router,
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};
use url::Url;

use crate::config::RelayConfig;
use crate::errors::{RelayError, RelayResult};

/// Upstream headers copied onto the relayed response.
pub const MIRRORED_HEADERS: [header::HeaderName; 5] = [
    header::CONTENT_TYPE,
    header::CACHE_CONTROL,
    header::ETAG,
    header::LAST_MODIFIED,
    header::CONTENT_LENGTH,
];

#[derive(Debug, Clone)]
pub struct RelayState {
    client: reqwest::Client,
}

impl RelayState {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &RelayConfig) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout())
            .build()?;
        Ok(Self::new(client))
    }
}

#[derive(Debug, Deserialize)]
pub struct RelayQuery {
    pub url: Option<String>,
}

pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/relay", get(relay_media).options(preflight))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `Access-Control-Allow-*` headers attached to every relay response.
pub fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("*"),
    );
    headers
}

/// Parse the `url` parameter. Only absolute http(s) URLs are relayed.
pub fn parse_target(raw: &str) -> RelayResult<Url> {
    let target = Url::parse(raw).map_err(RelayError::upstream)?;
    match target.scheme() {
        "http" | "https" => Ok(target),
        other => Err(RelayError::InvalidProtocol {
            scheme: other.to_string(),
        }),
    }
}

async fn relay_media(
    State(state): State<RelayState>,
    Query(query): Query<RelayQuery>,
) -> RelayResult<Response> {
    let raw = query
        .url
        .filter(|url| !url.is_empty())
        .ok_or(RelayError::MissingUrl)?;
    let target = parse_target(&raw)?;

    let upstream = state.client.get(target.clone()).send().await.map_err(
        |err| {
            warn!(url = %target, error = %err, "relay request failed");
            RelayError::upstream(err)
        },
    )?;

    let status = upstream.status();
    let mut headers = cors_headers();
    for name in MIRRORED_HEADERS {
        if let Some(value) = upstream.headers().get(&name) {
            headers.insert(name, value.clone());
        }
    }
    debug!(url = %target, status = status.as_u16(), "relaying media");

    let body = Body::from_stream(upstream.bytes_stream());
    Ok((status, headers, body).into_response())
}

async fn preflight() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, cors_headers())
}
