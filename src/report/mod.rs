//! Human-readable output: configuration summaries, script previews, run reports.

pub mod format;

pub use format::*;
