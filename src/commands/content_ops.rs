//! Content operations: pull embedded images out before saving, put hosted
//! URLs back when displaying.

use crate::content_images::{self, ExtractedContent, MediaMap};
use crate::utils::logger::Logger;

const LOG: Logger = Logger::new("content_ops");

pub fn prepare_content(html_content: &str) -> ExtractedContent {
    let extracted = LOG.time("extract content images", || content_images::extract_images(html_content));
    LOG.debug(format!("extracted {} embedded images", extracted.images.len()));
    extracted
}

/// Content ready for display. Placeholders without a URL are reported at
/// warn level and left in place.
pub fn render_content(html_content: &str, media: Option<&MediaMap>) -> String {
    let missing = content_images::unresolved_placeholders(html_content, media);
    if !missing.is_empty() {
        LOG.warn(format!("no media url for placeholders {:?}", missing));
    }
    LOG.time("resolve placeholders", || content_images::resolve_placeholders(html_content, media))
}

/// Read the `media` object of a stored post. Absent or null means no media.
pub fn parse_media_map(value: Option<serde_json::Value>) -> Result<Option<MediaMap>, String> {
    match value {
        | None | Some(serde_json::Value::Null) => Ok(None),
        | Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| crate::error::AppError::from(e).to_frontend_message()),
    }
}
