//! Report generation modules.

pub mod cohort;
pub mod formatter;
pub mod generator;

pub use cohort::{
    build_cohort_report, build_export, render_cohort_markdown, render_cohort_text, render_export,
};
pub use formatter::ProfileDigest;
pub use generator::{build_report, render_markdown, render_text, FormattedReport};
