//! Create/edit blog post form: validation rules and multipart assembly.

use crate::category_tree::CategoryId;
use crate::content_images::{self, BinaryFile};
use crate::error::{AppResult, ValidationErrors};
use crate::preferences::BlogLimits;
use crate::utils::date;
use crate::utils::logger::Logger;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

const LOG: Logger = Logger::new("blog_form");

static SLUG_STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s-]").expect("valid slug strip pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));
static DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("valid dash pattern"));
static SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug pattern"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlogStatus {
    #[default]
    Draft,
    Published,
    Scheduled,
}

impl BlogStatus {
    /// Value the API expects in the `status` part.
    pub fn wire_value(self) -> &'static str {
        match self {
            | BlogStatus::Draft => "draft",
            | BlogStatus::Published => "published",
            | BlogStatus::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for BlogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            | BlogStatus::Draft => "Draft",
            | BlogStatus::Published => "Published",
            | BlogStatus::Scheduled => "Scheduled",
        };
        f.write_str(label)
    }
}

/// Slug suggested from a title as it is typed.
pub fn generate_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = SLUG_STRIP.replace_all(lowered.trim(), "");
    let dashed = WHITESPACE.replace_all(&stripped, "-");
    DASHES.replace_all(&dashed, "-").into_owned()
}

/// Comma separated tag input, trimmed, blanks dropped.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// True when the editor HTML has no visible text.
pub fn content_is_empty(html: &str) -> bool {
    TAG.replace_all(html, "").replace("&nbsp;", "").trim().is_empty()
}

/// Raw form values as the editor holds them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlogDraft {
    pub title: String,
    pub subheading: String,
    pub slug: String,
    pub category: String,
    pub category_ids: Vec<CategoryId>,
    pub status: BlogStatus,
    pub excerpt: String,
    pub content: String,
    pub tags_input: String,
    #[serde(skip)]
    pub cover_image: Option<BinaryFile>,
    #[serde(skip)]
    pub gallery_images: Vec<BinaryFile>,
    pub is_featured: bool,
    pub reading_time: String,
    pub published_at: String,
}

enum ReadingTime {
    Missing,
    Minutes(f64),
    NotANumber,
}

fn reading_time(input: &str) -> ReadingTime {
    let input = input.trim();
    if input.is_empty() {
        return ReadingTime::Missing;
    }
    match input.parse::<f64>() {
        | Ok(minutes) if minutes.is_finite() => ReadingTime::Minutes(minutes),
        | _ => ReadingTime::NotANumber,
    }
}

fn size_label(bytes: usize) -> String {
    const MB: usize = 1024 * 1024;
    if bytes < MB {
        return format!("{}KB", bytes / 1024);
    }
    if bytes % MB == 0 { format!("{}MB", bytes / MB) } else { format!("{:.1}MB", bytes as f64 / MB as f64) }
}

/// Declared type must be allowed and agree with what the bytes actually are.
fn is_supported_image(file: &BinaryFile, limits: &BlogLimits) -> bool {
    if !limits.supported_image_types.iter().any(|t| t == &file.mime_type) {
        return false;
    }
    match image::guess_format(&file.bytes) {
        | Ok(format) => format.to_mime_type() == file.mime_type,
        | Err(_) => false,
    }
}

fn check_length(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    max: usize,
    message: impl FnOnce(usize) -> String,
) {
    if value.chars().count() > max {
        errors.add(field, message(max));
    }
}

impl BlogDraft {
    pub fn tags(&self) -> Vec<String> {
        parse_tags(&self.tags_input)
    }

    pub fn validate(&self, limits: &BlogLimits) -> AppResult<()> {
        let mut errors = ValidationErrors::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", "Title is required");
        }
        check_length(&mut errors, "title", title, limits.title_max, |max| {
            format!("Title should not exceed {} characters", max)
        });

        check_length(&mut errors, "subheading", self.subheading.trim(), limits.subheading_max, |max| {
            format!("Subheading should not exceed {} characters", max)
        });

        let slug = self.slug.trim();
        if slug.is_empty() {
            errors.add("slug", "Slug is required");
        } else if !SLUG.is_match(slug) {
            errors.add("slug", "Use lowercase letters, numbers, and hyphens only");
        }

        let category = self.category.trim();
        if category.is_empty() {
            errors.add("category", "Category is required");
        }
        check_length(&mut errors, "category", category, limits.category_max, |max| {
            format!("Category should not exceed {} characters", max)
        });

        let excerpt = self.excerpt.trim();
        if excerpt.is_empty() {
            errors.add("excerpt", "Excerpt is required");
        }
        check_length(&mut errors, "excerpt", excerpt, limits.excerpt_max, |max| {
            format!("Keep the excerpt within {} characters", max)
        });

        if content_is_empty(&self.content) {
            errors.add("content", "Content is required");
        }

        let tags = self.tags();
        if tags.len() > limits.max_tags {
            errors.add("tagsInput", format!("Maximum of {} tags allowed", limits.max_tags));
        }
        if tags.iter().any(|tag| tag.chars().count() > limits.tag_max) {
            errors.add("tagsInput", format!("Each tag should be {} characters or less", limits.tag_max));
        }

        let size_limit = size_label(limits.max_image_bytes);
        if let Some(cover) = &self.cover_image {
            if cover.size() > limits.max_image_bytes {
                errors.add("coverImage", format!("Image should be less than {}", size_limit));
            }
            if !is_supported_image(cover, limits) {
                errors.add("coverImage", "Unsupported file format");
            }
        }

        if self.gallery_images.iter().any(|f| f.size() > limits.max_image_bytes) {
            errors.add("galleryImages", format!("Each gallery image should be less than {}", size_limit));
        }
        if !self.gallery_images.iter().all(|f| is_supported_image(f, limits)) {
            errors.add("galleryImages", "Unsupported file format in gallery");
        }
        if self.gallery_images.len() > limits.max_gallery_images {
            errors.add(
                "galleryImages",
                format!("You can upload up to {} gallery images", limits.max_gallery_images),
            );
        }

        match reading_time(&self.reading_time) {
            | ReadingTime::Missing => {}
            | ReadingTime::NotANumber => errors.add("readingTime", "Use numbers only"),
            | ReadingTime::Minutes(m) if m < 0.0 => errors.add("readingTime", "Reading time cannot be negative"),
            | ReadingTime::Minutes(m) if m > f64::from(limits.reading_time_max) => {
                errors.add("readingTime", "Reading time looks too high")
            }
            | ReadingTime::Minutes(_) => {}
        }

        let published_at = self.published_at.trim();
        if published_at.is_empty() {
            if self.status == BlogStatus::Scheduled {
                errors.add("publishedAt", "Publish date is required for scheduled posts");
            }
        } else if date::parse_timestamp(published_at).is_none() {
            errors.add("publishedAt", "Publish date is not a valid date");
        }

        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PartValue {
    Text(String),
    File(BinaryFile),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormPart {
    pub name: String,
    pub value: PartValue,
}

/// Ordered multipart body for the create and update endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogSubmission {
    pub parts: Vec<FormPart>,
    pub content_image_count: usize,
}

impl BlogSubmission {
    fn text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parts.push(FormPart { name: name.into(), value: PartValue::Text(value.into()) });
    }

    fn file(&mut self, name: impl Into<String>, file: BinaryFile) {
        self.parts.push(FormPart { name: name.into(), value: PartValue::File(file) });
    }

    /// First text value sent under `name`.
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match &part.value {
            | PartValue::Text(value) if part.name == name => Some(value.as_str()),
            | _ => None,
        })
    }

    pub fn values<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s PartValue> + 's {
        self.parts.iter().filter(move |part| part.name == name).map(|part| &part.value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|part| part.name.as_str())
    }
}

fn numeric_category_id(id: &CategoryId) -> Option<i64> {
    match id {
        | CategoryId::Number(n) => Some(*n),
        | CategoryId::Text(s) => s.trim().parse().ok(),
    }
}

/// Validate `draft` and lay out its multipart parts.
///
/// Embedded base64 images are pulled out of the content and sent as parts
/// named `"1"`, `"2"`, ... matching the placeholders left in `content`. Tags
/// are not sent; the API does not accept them yet. `id` is appended last
/// when updating an existing post.
pub fn build_submission(draft: &BlogDraft, limits: &BlogLimits, id: Option<&str>) -> AppResult<BlogSubmission> {
    draft.validate(limits)?;

    let extracted = content_images::extract_images(&draft.content);
    let mut submission = BlogSubmission::default();

    submission.text("title", draft.title.trim());
    submission.text("slug", draft.slug.trim());
    submission.text("status", draft.status.wire_value());
    submission.text("excerpt", draft.excerpt.trim());
    submission.text("content", extracted.processed_content);

    let subheading = draft.subheading.trim();
    if !subheading.is_empty() {
        submission.text("subheading", subheading);
    }

    for category_id in draft.category_ids.iter().filter_map(numeric_category_id) {
        submission.text("categoryIds", category_id.to_string());
    }

    submission.text("isFeatured", draft.is_featured.to_string());

    if let ReadingTime::Minutes(minutes) = reading_time(&draft.reading_time) {
        submission.text("readingTime", minutes.to_string());
    }

    let published_at = draft.published_at.trim();
    if !published_at.is_empty() {
        submission.text("publishedAt", published_at);
    }

    if let Some(cover) = &draft.cover_image {
        submission.file("coverImage", cover.clone());
    }

    for image in &draft.gallery_images {
        submission.file("galleryImages[]", image.clone());
    }

    submission.content_image_count = extracted.images.len();
    for (index, image) in extracted.images {
        submission.file(index.to_string(), image);
    }

    if let Some(id) = id {
        submission.text("id", id);
    }

    LOG.debug(format!(
        "assembled {} parts ({} content images) for '{}'",
        submission.parts.len(),
        submission.content_image_count,
        draft.slug.trim()
    ));
    Ok(submission)
}
