//! # Slidecast Core
//!
//! Media acquisition and prefetch pipeline for the Slidecast slideshow
//! viewer.
//!
//! ## Overview
//!
//! - **Admission gate** ([`admission`]): sliding-window limit on outbound
//!   requests, shared by every caller that talks to the remote API.
//! - **Resource tracking** ([`tracker`]): bounded, insertion-ordered sets of
//!   media that is already resident.
//! - **Prefetching** ([`prefetch`]): cyclic lookahead planning and a
//!   pipeline actor that dispatches loads concurrently and records results.
//! - **Cache keys** ([`cache_key`]): URL normalization and the rolling-hash
//!   keys used for dedup and response caching.
//! - **Response cache** ([`response_cache`]) and the content API client
//!   ([`api`]) built on top of it.
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use slidecast_core::{
//!     admission::AdmissionGate,
//!     config::ConfigLoader,
//!     prefetch::{HttpMediaFetcher, SlideshowSettings, SlideshowSnapshot, start_pipeline},
//! };
//!
//! async fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().load()?.config;
//!     let gate = Arc::new(AdmissionGate::new(&config.gate));
//!     let fetcher = HttpMediaFetcher::new(
//!         reqwest::Client::new(),
//!         Arc::clone(&gate),
//!         config.prefetch,
//!     );
//!     let (pipeline, _task) = start_pipeline(config.trackers, Arc::new(fetcher));
//!
//!     pipeline.schedule(SlideshowSnapshot::new(
//!         Vec::<slidecast_model::Post>::new(),
//!         0,
//!         SlideshowSettings::from(&config.prefetch),
//!     ));
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Sliding-window admission gate for outbound requests
pub mod admission;

/// Gated, cached content API client
pub mod api;

/// URL normalization and cache key derivation
pub mod cache_key;

/// Millisecond clocks
pub mod clock;

/// Configuration models and loading
pub mod config;

/// Error types
pub mod error;

/// Lookahead prefetch planning, scheduling and dispatch
pub mod prefetch;

/// TTL cache for API responses
pub mod response_cache;

/// Bounded trackers for acquired media
pub mod tracker;

pub use admission::AdmissionGate;
pub use error::{ApiError, ConfigError, PrefetchError};
pub use tracker::ResourceTracker;
