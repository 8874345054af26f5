//! # Slidecast Relay
//!
//! Pass-through byte relay for slideshow media hosted behind restrictive
//! CORS policies. `GET /relay?url=<http(s) url>` streams the upstream
//! response back with its status, cache headers and permissive CORS
//! headers.

pub mod config;
pub mod errors;
pub mod relay;

pub use config::{RelayConfig, RelayConfigLoad, load_relay_config};
pub use errors::{RelayError, RelayResult};
pub use relay::{RelayState, router};
