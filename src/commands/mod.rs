//! Host-facing operations organized by domain.
//!
//! Every operation returns `Result<T, String>` with a message fit for display:
//! - `category_ops`: category listing rows, expansion and parent picker
//! - `content_ops`: embedded image extraction and placeholder resolution
//! - `blog_ops`: blog form checks and multipart assembly
//! - `admin_ops`: admin table labels and the add-admin form
//! - `preference_ops`: reading and writing the preferences file

pub mod admin_ops;
pub mod blog_ops;
pub mod category_ops;
pub mod content_ops;
pub mod preference_ops;

pub use admin_ops::*;
pub use blog_ops::*;
pub use category_ops::*;
pub use content_ops::*;
pub use preference_ops::*;
