//! Embedded image handling for rich-text blog content.
//!
//! The editor stores pasted images inline as base64 data URIs. Before a post
//! is submitted each one is pulled out into its own binary part and the
//! `<img>` is pointed at a numbered placeholder. Once the server has stored
//! the files it returns a media map, and the placeholders are swapped back
//! for the public URLs when the post is displayed.

use crate::error::{AppError, AppResult};
use crate::log_warn;
use crate::utils::html::Fragment;
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

const COMPONENT: &str = "content_images";

pub const PLACEHOLDER_PREFIX: &str = "{{IMAGE_ID:";
pub const IMAGE_ID_ATTRIBUTE: &str = "data-image-id";

// Decodes whatever a browser's data URI decoder accepts: padding optional,
// non-zero trailing bits ignored.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

static DATA_URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^data:image/([^;]+);base64,(.+)$").expect("valid data uri pattern"));

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{IMAGE_ID:(\d+)\}\}").expect("valid placeholder pattern"));

/// The placeholder token standing in for image `index`.
pub fn placeholder(index: u32) -> String {
    format!("{}{}}}}}", PLACEHOLDER_PREFIX, index)
}

/// An in-memory file ready to be attached to a multipart request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryFile {
    pub name: String,
    pub mime_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl BinaryFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Extracted images keyed by their 1-based position in the document.
pub type ImageMap = BTreeMap<u32, BinaryFile>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub processed_content: String,
    pub images: ImageMap,
}

/// Media locations returned by the server for a stored post.
///
/// Keys look like `"{index}_{timestamp}{filename}"`; the index before the
/// first `_` ties a URL back to its placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMap {
    #[serde(default)]
    pub images: BTreeMap<String, String>,
}

impl MediaMap {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MediaMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            images: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Decode `src` when it is a base64 image data URI. `None` means the source
/// is something else (hosted URL, relative path) and should be left alone.
fn decode_data_uri(src: &str, index: u32) -> Option<AppResult<BinaryFile>> {
    let caps = DATA_URI.captures(src)?;
    let subtype = caps.get(1)?.as_str();
    let payload: String = caps.get(2)?.as_str().chars().filter(|c| !c.is_ascii_whitespace()).collect();

    let decoded = LENIENT_BASE64
        .decode(payload.as_bytes())
        .map(|bytes| BinaryFile::new(format!("image-{}.{}", index, subtype), format!("image/{}", subtype), bytes))
        .map_err(|source| AppError::ImageDecode { index, source });

    Some(decoded)
}

/// Pull every base64 `<img>` out of `html_content`.
///
/// Images are numbered from 1 in document order. Each extracted `<img>` gets
/// `src="{{IMAGE_ID:n}}"` and `data-image-id="n"`. Images that already point
/// at a URL are untouched and take no number; an image whose payload fails to
/// decode is logged and left as it was.
pub fn extract_images(html_content: &str) -> ExtractedContent {
    let mut fragment = Fragment::parse(html_content);
    let mut images = ImageMap::new();
    let mut next_index: u32 = 1;

    fragment.edit_elements("img", |img| {
        let Some(decoded) = img.get("src").and_then(|src| decode_data_uri(src, next_index)) else {
            return;
        };

        match decoded {
            | Ok(file) => {
                img.set("src", &placeholder(next_index));
                img.set(IMAGE_ID_ATTRIBUTE, &next_index.to_string());
                images.insert(next_index, file);
                next_index += 1;
            },
            | Err(err) => {
                log_warn!(COMPONENT, "leaving embedded image in place: {}", err);
            },
        }
    });

    let processed_content = if fragment.is_modified() {
        fragment.to_html()
    } else {
        html_content.to_string()
    };

    ExtractedContent {
        processed_content,
        images,
    }
}

/// Numeric prefix of a media key, read the way the dashboard always has:
/// leading digits before the first `_`, anything after them ignored.
fn media_key_index(key: &str) -> Option<u32> {
    let head = key.split('_').next().unwrap_or("").trim_start();
    let digits_end = head.find(|c: char| !c.is_ascii_digit()).unwrap_or(head.len());
    head[..digits_end].parse::<u32>().ok().filter(|n| *n > 0)
}

/// Index -> URL table built from a media map; unusable keys are dropped.
///
/// Keys are visited in sorted order, so when two keys share an index the one
/// that sorts last wins, whatever order the server listed them in.
pub fn media_index(media: &MediaMap) -> BTreeMap<u32, &str> {
    media
        .images
        .iter()
        .filter_map(|(key, url)| media_key_index(key).map(|n| (n, url.as_str())))
        .collect()
}

fn substitute<'s>(input: &'s str, urls: &BTreeMap<u32, &str>) -> Cow<'s, str> {
    if !input.contains(PLACEHOLDER_PREFIX) {
        return Cow::Borrowed(input);
    }

    let replaced = PLACEHOLDER.replace_all(input, |caps: &Captures| {
        caps.get(1)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .and_then(|n| urls.get(&n))
            .map(|url| url.to_string())
            .unwrap_or_else(|| caps.get(0).map(|m| m.as_str()).unwrap_or("").to_string())
    });

    match replaced {
        | Cow::Owned(s) if s == input => Cow::Borrowed(input),
        | other => other,
    }
}

/// Swap `{{IMAGE_ID:n}}` placeholders for the URLs in `media`.
///
/// Placeholders are replaced wherever they appear: in `<img src>`, in any
/// other attribute value and in plain text. Both are matched after character
/// references are decoded, so an escaped placeholder still resolves. Comments
/// and `<script>`/`<style>` bodies are left alone. Indices missing from
/// `media` stay as literal placeholders.
/// Without a media map (or with an empty one) the input is returned as is.
pub fn resolve_placeholders(html_content: &str, media: Option<&MediaMap>) -> String {
    let Some(media) = media.filter(|m| !m.is_empty()) else {
        return html_content.to_string();
    };

    let urls = media_index(media);
    if urls.is_empty() {
        return html_content.to_string();
    }

    let resolve = |value: &str| match substitute(value, &urls) {
        | Cow::Owned(resolved) => Some(resolved),
        | Cow::Borrowed(_) => None,
    };

    let mut fragment = Fragment::parse(html_content);
    fragment.rewrite_text(resolve);
    fragment.edit_all_elements(|element| element.rewrite_values(|_, value| resolve(value)));

    if fragment.is_modified() {
        fragment.to_html()
    } else {
        html_content.to_string()
    }
}

/// Every placeholder index referenced in `html_content`, text or attributes.
///
/// Reads the same decoded text and attribute values `resolve_placeholders`
/// rewrites, so anything reported here is something it would resolve.
pub fn placeholder_indices(html_content: &str) -> BTreeSet<u32> {
    let fragment = Fragment::parse(html_content);
    fragment
        .texts()
        .chain(fragment.attribute_values())
        .flat_map(|value| PLACEHOLDER.captures_iter(value))
        .filter_map(|caps| caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()))
        .collect()
}

/// Placeholder indices in `html_content` that `media` has no URL for.
///
/// The dashboard renders these as broken images; callers that would rather
/// warn the editor can check this first.
pub fn unresolved_placeholders(html_content: &str, media: Option<&MediaMap>) -> BTreeSet<u32> {
    let known: BTreeSet<u32> = media.map(|m| media_index(m).into_keys().collect()).unwrap_or_default();
    placeholder_indices(html_content)
        .into_iter()
        .filter(|n| !known.contains(n))
        .collect()
}
