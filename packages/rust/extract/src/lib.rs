//! Pattern-based field extraction from raw HTML/text responses.
//!
//! The remote academic-records service has no machine-readable contract, so
//! every value the audit pipeline needs is pulled out of markup:
//! - [`FieldPattern`]: a named regex whose named groups are mandatory fields
//! - [`section`]: the sub-document between a pair of markers
//! - [`LookupTables`]: picklist tables parsed once for code → label resolution

mod field;
mod lookup;

pub use field::{FieldPattern, Fields, section};
pub use lookup::{LookupTable, LookupTables};
