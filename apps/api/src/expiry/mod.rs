// Expiry classification core: date parsing, status classification, alert aggregation.
// Pure and synchronous. Nothing here performs I/O or keeps state between calls.

pub mod alerts;
pub mod dates;
pub mod record;
pub mod settings;
pub mod status;

pub use alerts::{badge_table, build_report, AlertReport, BadgeTable};
pub use record::{CellValue, KindSchema, Record, RecordKind, RecordSchemas};
pub use settings::{DateFormats, ExpirySettings};
