//! Presentation helpers for the UI: value formatting and expression highlighting.

mod formatter;
mod highlight;

pub use formatter::{ValueFormatter, format_value_for_display};
pub use highlight::{HighlightCategory, HighlightSpan, highlight};
