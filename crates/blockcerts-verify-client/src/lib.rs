//! Blockcerts verify client library
//!
//! Command implementations behind the `blockcerts-verify-client` binary: offline planning
//! of the verification steps of a credential and full verification against the explorers.

pub mod config;
pub mod format;
pub mod plan;
pub mod verify;

pub use config::{load_config, parse_explorer_api, read_credential};
