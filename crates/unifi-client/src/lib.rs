#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! UniFi Controller Client
//!
//! Talks to a UniFi Network controller over HTTPS: login and session
//! handling for classic and UniFi OS controllers, V1/V2 path resolution,
//! response envelope unwrapping, and a short-lived response cache.
//!
//! Higher layers depend on the [`ControllerApi`] trait, so tests can swap
//! [`HttpController`] for [`MockController`].

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod mock;

// Re-exports
pub use api::{ApiRequest, ApiVersion, ControllerApi, HttpMethod};
pub use cache::ResponseCache;
pub use client::HttpController;
pub use config::ControllerConfig;
pub use connection::{Connection, into_list};
pub use error::{Error, Result};
pub use mock::MockController;
