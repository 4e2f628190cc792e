pub mod assembler;
pub mod formatter;

pub use assembler::{write_report, ReportPaths};
pub use formatter::{attach_verdicts, format_report, group_by_severity, ReportEntry};
