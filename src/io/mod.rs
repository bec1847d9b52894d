//! Input/output: centerline geometry reading and result export.

pub mod centerline;
pub mod export;

pub use centerline::CenterlineReader;
pub use export::CsvExporter;
