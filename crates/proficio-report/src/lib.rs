//! Rendering for proficio reports.
//!
//! Turns evidence reports and course forests into human-readable output:
//! Markdown for terminals and docs, self-contained HTML for sharing.

pub mod html;
pub mod markdown;
