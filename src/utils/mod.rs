//! Shared helpers:
//! - `html`: fragment tokenizer used to rewrite `<img>` tags and attribute values
//! - `date`: timestamp parsing and table formatting
//! - `logger`: component-scoped logging on the `log` facade

pub mod date;
pub mod html;
pub mod logger;

pub use date::format_date;
