//! Filter Module
//!
//! Pure search/type/date filtering and pagination over audit records, as
//! used by the list screens.

mod pipeline;
mod records;

pub use pipeline::{filter, paginate, unique_types, FilterCriteria, Page};
pub use records::{ActivityEditRecord, AuditRecord, TimestampRecord};
