//! Gated, response-cached client for the remote content API.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use slidecast_model::{Post, QueryKey, ResourceKind, SiteInfo, TagSummary};
use tracing::{debug, warn};
use url::Url;

use crate::admission::AdmissionGate;
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::response_cache::{CacheLookup, ResponseCache};

#[derive(Debug, Clone)]
pub struct ContentApi {
    client: reqwest::Client,
    base_url: Url,
    namespace: String,
    gate: Arc<AdmissionGate>,
    cache: Arc<ResponseCache>,
}

impl ContentApi {
    pub fn new(
        config: &ApiConfig,
        client: reqwest::Client,
        gate: Arc<AdmissionGate>,
        cache: Arc<ResponseCache>,
    ) -> ApiResult<Self> {
        // Request paths are appended to the base as segments.
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase.into());
        }
        Ok(Self {
            client,
            base_url,
            namespace: config.namespace.clone(),
            gate,
            cache,
        })
    }

    /// Build a client with its own reqwest client from `config`.
    pub fn from_config(
        config: &ApiConfig,
        gate: Arc<AdmissionGate>,
        cache: Arc<ResponseCache>,
    ) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()?;
        Self::new(config, client, gate, cache)
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn gate(&self) -> &Arc<AdmissionGate> {
        &self.gate
    }

    /// One page of posts matching `tags`.
    pub async fn posts(
        &self,
        tags: &str,
        page: u32,
        limit: u32,
    ) -> ApiResult<Vec<Post>> {
        let key = QueryKey::new(&self.namespace, ResourceKind::Posts)
            .with_param("tags", tags)
            .with_param("page", page)
            .with_param("limit", limit);
        self.cached(key, &["posts.json"]).await
    }

    /// Tags starting with `prefix`.
    pub async fn search_tags(&self, prefix: &str) -> ApiResult<Vec<TagSummary>> {
        let key = QueryKey::new(&self.namespace, ResourceKind::Search)
            .with_param("search", prefix);
        self.cached(key, &["tags.json"]).await
    }

    pub async fn post(&self, id: &str) -> ApiResult<Post> {
        let key = QueryKey::new(&self.namespace, ResourceKind::Entity).with_id(id);
        // The id is one path segment; `/` and `..` inside it stay literal.
        let file = format!("{id}.json");
        self.cached(key, &["posts", &file]).await
    }

    pub async fn site_info(&self) -> ApiResult<SiteInfo> {
        let key = QueryKey::new(&self.namespace, ResourceKind::SiteInfo);
        self.cached(key, &["site.json"]).await
    }

    /// Serve from cache when fresh. Stale entries are refreshed, falling
    /// back to the stale value if the refresh fails.
    async fn cached<T: DeserializeOwned>(
        &self,
        key: QueryKey,
        segments: &[&str],
    ) -> ApiResult<T> {
        let stale = match self.cache.lookup(&key) {
            CacheLookup::Fresh(value) => {
                debug!(key = %key, "response cache hit");
                return Ok(serde_json::from_value(value)?);
            }
            CacheLookup::Stale(value) => Some(value),
            CacheLookup::Miss => None,
        };

        match self.fetch(segments, &key).await {
            Ok(value) => {
                let parsed = serde_json::from_value(value.clone())?;
                self.cache.insert(key, value);
                Ok(parsed)
            }
            Err(err) => match stale {
                Some(value) => {
                    warn!(key = %key, error = %err, "refresh failed, serving stale response");
                    Ok(serde_json::from_value(value)?)
                }
                None => Err(err),
            },
        }
    }

    async fn fetch(&self, segments: &[&str], key: &QueryKey) -> ApiResult<Value> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        if !key.params.is_empty() {
            url.query_pairs_mut().extend_pairs(key.params.iter());
        }

        self.gate.await_admission().await;
        debug!(url = %url, "content API request");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
