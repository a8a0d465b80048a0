//! # medir Common Library
//!
//! Shared code for the medical practice directory:
//! - Entity Store schema and operations (doctors, insurances, specialties and their links)
//! - Directory Snapshot document storage and import
//! - Query Service over the Directory Snapshot
//! - Session Gate (shared-password sessions)
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod query;
pub mod registry;
pub mod session;
pub mod snapshot;

pub use error::{Error, Result};
