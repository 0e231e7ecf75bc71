//! Test utilities shared by the unit and integration suites.
//!
//! [`config`] builds the standard [`SharedConfig`](kumiki::config::SharedConfig)
//! and file references used across tests; [`manifest`] writes YAML manifests
//! into temporary directories for CLI tests.

pub mod config;
pub mod manifest;

pub use config::{sample_config, sample_vars};
pub use manifest::{manifest_yaml, write_manifest};
