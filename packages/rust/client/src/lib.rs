//! HTTP access to the academic-records service.
//!
//! This crate provides:
//! - [`SessionClient`]: cookie-forwarding transport returning status, headers and body
//! - [`FormBody`]: ordered form bodies with the label escaping rule
//! - [`Registrar`]: department lookups and page fetches for catalogue,
//!   prerequisites and schedules

pub mod form;
pub mod options;
pub mod registrar;
pub mod session;

pub use form::{FormBody, encode_label, html_unescape};
pub use registrar::{PrerequisiteListing, Registrar, ScheduleListing};
pub use session::{RemoteResponse, SessionClient};
