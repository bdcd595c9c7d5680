//! Shared types, error model, term arithmetic and configuration for regfetch.
//!
//! This crate is the foundation depended on by all other regfetch crates.
//! It provides:
//! - [`RegfetchError`]: the unified error type
//! - Domain types ([`StudentRecord`], [`DepartmentTask`], [`SessionCredential`])
//! - [`term`]: academic term identifiers and calendar arithmetic
//! - Configuration ([`AppConfig`], [`FetchConfig`], config loading)

pub mod config;
pub mod error;
pub mod term;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, EndpointsConfig, FetchConfig, HttpConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{ExtractFailure, RegfetchError, Result};
pub use term::{Quarter, Term};
pub use types::{
    CodedLabel, DepartmentOptions, DepartmentTask, ProgramAttributes, SessionCredential,
    StudentId, StudentRecord,
};
