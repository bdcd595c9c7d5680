//! Data-acquisition workflows for regfetch.
//!
//! This crate ties the client, extractor and cache tree together:
//! - [`audit`]: the three-stage degree-audit retrieval
//! - [`enumerate`]: expanding a batch request into department tasks
//! - [`scheduler`]: driving tasks through the registrar at a fixed rate

pub mod audit;
pub mod enumerate;
pub mod scheduler;

pub use audit::{AuditDocument, AuditPipeline, AuditRequest};
pub use enumerate::{BatchKind, BatchRequest, Enumeration, FetchCategory, FetchPlan, enumerate};
pub use scheduler::{BatchScheduler, BatchSummary, ProgressReporter, SilentProgress};
