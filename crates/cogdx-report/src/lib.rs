//! Human-readable renderings of a diagnostic result and its remediation plan.

pub mod html;
pub mod markdown;

pub use html::{generate_html, write_html_report};
pub use markdown::{generate_markdown, write_markdown_report};
