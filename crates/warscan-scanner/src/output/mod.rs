//! Output formatters for scan reports

pub mod json;
pub mod markdown;

pub use json::to_json;
pub use markdown::to_markdown;
