//! Content core for the blog admin dashboard: category tree flattening,
//! embedded image extraction and placeholder resolution, plus the form,
//! listing and preference helpers around them.

pub mod admins;
pub mod blog_form;
pub mod category_tree;
pub mod commands;
pub mod content_images;
pub mod error;
pub mod pagination;
pub mod preferences;
pub mod utils;

#[doc(hidden)]
pub use log as __log;

pub use category_tree::{Category, CategoryId, ExpansionState, FlattenedRow, flatten, is_visible, toggle_expansion};
pub use content_images::{ExtractedContent, MediaMap, extract_images, resolve_placeholders};
pub use error::{AppError, AppResult};
pub use preferences::Preferences;
