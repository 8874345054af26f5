//! Core data model definitions shared across Slidecast crates.
#![allow(missing_docs)]

pub mod media;
pub mod query;
pub mod site;

// Intentionally curated re-exports for downstream consumers.
pub use media::{MediaKind, Post, PostId};
pub use query::{QueryKey, ResourceKind};
pub use site::{SiteInfo, TagSummary};
