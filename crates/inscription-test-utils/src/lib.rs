#![deny(unsafe_code)]

//! Shared test utilities for the inscription workspace.
//!
//! Provides a temporary catalog/registration-log fixture, a config builder,
//! an in-process server, and tracing helpers so that individual crate tests
//! stay concise and consistent.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! inscription-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod fixtures;
pub mod server;
pub mod tracing_setup;

pub use config::TestConfigBuilder;
pub use fixtures::{CatalogFixture, SAMPLE_CATALOG};
pub use server::TestServer;
