//! Media acquisition behind the prefetch pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::RANGE;
use tracing::trace;

use super::{Lane, PrefetchCandidate};
use crate::admission::AdmissionGate;
use crate::cache_key::cache_key;
use crate::config::PrefetchConfig;
use crate::error::PrefetchError;

/// Loads one candidate into whatever cache the viewer renders from.
#[async_trait]
pub trait MediaFetcher: Send + Sync + 'static {
    async fn acquire(
        &self,
        candidate: &PrefetchCandidate,
    ) -> Result<(), PrefetchError>;
}

/// reqwest-backed fetcher.
///
/// Every request first waits on the shared admission gate. Images are
/// downloaded in full and, unless disabled, decoded to catch formats the
/// viewer cannot show. Videos only fetch their leading bytes so the
/// container metadata is warm.
#[derive(Debug, Clone)]
pub struct HttpMediaFetcher {
    client: reqwest::Client,
    gate: Arc<AdmissionGate>,
    config: PrefetchConfig,
}

impl HttpMediaFetcher {
    pub fn new(
        client: reqwest::Client,
        gate: Arc<AdmissionGate>,
        config: PrefetchConfig,
    ) -> Self {
        Self {
            client,
            gate,
            config,
        }
    }

    async fn acquire_image(
        &self,
        candidate: &PrefetchCandidate,
    ) -> Result<(), PrefetchError> {
        let response = self.client.get(&candidate.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PrefetchError::Status {
                status: status.as_u16(),
                url: candidate.url.clone(),
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(PrefetchError::EmptyBody(candidate.url.clone()));
        }

        if self.config.decode_images {
            let decoded = tokio::task::spawn_blocking(move || {
                image::load_from_memory(&bytes)
                    .map(|img| (img.width(), img.height()))
            })
            .await
            .map_err(|err| PrefetchError::Task(err.to_string()))?
            .map_err(|err| PrefetchError::Decode(err.to_string()))?;
            trace!(
                url = %candidate.url,
                key = %cache_key(&candidate.url),
                width = decoded.0,
                height = decoded.1,
                "image decoded"
            );
        }
        Ok(())
    }

    async fn acquire_video(
        &self,
        candidate: &PrefetchCandidate,
    ) -> Result<(), PrefetchError> {
        let probe = self.config.video_probe_bytes.max(1);
        let mut response = self
            .client
            .get(&candidate.url)
            .header(RANGE, format!("bytes=0-{}", probe - 1))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PrefetchError::Status {
                status: status.as_u16(),
                url: candidate.url.clone(),
            });
        }

        // Servers that ignore Range send the whole file; stop reading once
        // the probe is satisfied.
        let mut received: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            received += chunk.len() as u64;
            if received >= probe {
                break;
            }
        }
        if received == 0 {
            return Err(PrefetchError::EmptyBody(candidate.url.clone()));
        }
        trace!(
            url = %candidate.url,
            key = %cache_key(&candidate.url),
            received,
            "video metadata warmed"
        );
        Ok(())
    }
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    async fn acquire(
        &self,
        candidate: &PrefetchCandidate,
    ) -> Result<(), PrefetchError> {
        self.gate.await_admission().await;
        match Lane::of(candidate.kind) {
            Lane::Image => self.acquire_image(candidate).await,
            Lane::Video => self.acquire_video(candidate).await,
        }
    }
}
