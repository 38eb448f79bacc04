//! AreaLocator - service-area resolution for user-entered addresses
//!
//! This library resolves a free-text address to geographic coordinates via
//! an external geocoding backend (with fallback across an ordered list of
//! provider instances), classifies the resolved point against a static
//! GeoJSON district dataset, and memoizes results in a bounded,
//! time-expiring cache.
//!
//! # Architecture
//!
//! ```text
//! HTTP route ──► Locator ──► ResultCache (hit? return)
//!                  │
//!                  ├──► ProviderChain ──► GeocodingProvider ──► HTTP GET
//!                  │
//!                  └──► DistrictIndex (point-in-polygon)
//! ```

pub mod cache;
pub mod config;
pub mod district;
pub mod geocode;
pub mod locator;
pub mod server;

pub use config::Config;
pub use locator::{LocateResult, LocateStatus, Locator};
