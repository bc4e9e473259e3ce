use crate::error::{AppError, AppResult, ResultExt};
use crate::utils::logger::Logger;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const LOG: Logger = Logger::new("preferences");

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub blog: BlogLimits,
    #[serde(default)]
    pub pagination: PaginationDefaults,
    /// Expand every category with children when the listing first loads.
    #[serde(default = "default_true")]
    pub auto_expand_categories: bool,
}

/// Limits enforced by the blog form.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlogLimits {
    #[serde(default = "default_title_max")]
    pub title_max: usize,
    #[serde(default = "default_subheading_max")]
    pub subheading_max: usize,
    #[serde(default = "default_category_max")]
    pub category_max: usize,
    #[serde(default = "default_excerpt_max")]
    pub excerpt_max: usize,
    #[serde(default = "default_max_tags")]
    pub max_tags: usize,
    #[serde(default = "default_tag_max")]
    pub tag_max: usize,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
    #[serde(default = "default_max_gallery_images")]
    pub max_gallery_images: usize,
    #[serde(default = "default_reading_time_max")]
    pub reading_time_max: u32,
    #[serde(default = "default_supported_image_types")]
    pub supported_image_types: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDefaults {
    #[serde(default = "default_rows_per_page")]
    pub rows_per_page: usize,
    #[serde(default = "default_rows_per_page_options")]
    pub rows_per_page_options: Vec<usize>,
}

fn default_true() -> bool {
    true
}

fn default_title_max() -> usize {
    120
}

fn default_subheading_max() -> usize {
    180
}

fn default_category_max() -> usize {
    60
}

fn default_excerpt_max() -> usize {
    260
}

fn default_max_tags() -> usize {
    10
}

fn default_tag_max() -> usize {
    24
}

fn default_max_image_bytes() -> usize {
    4 * 1024 * 1024
}

fn default_max_gallery_images() -> usize {
    10
}

fn default_reading_time_max() -> u32 {
    240
}

fn default_supported_image_types() -> Vec<String> {
    vec!["image/jpeg".to_string(), "image/png".to_string(), "image/webp".to_string()]
}

fn default_rows_per_page() -> usize {
    10
}

fn default_rows_per_page_options() -> Vec<usize> {
    vec![5, 10, 25, 50]
}

impl Default for BlogLimits {
    fn default() -> Self {
        Self {
            title_max: default_title_max(),
            subheading_max: default_subheading_max(),
            category_max: default_category_max(),
            excerpt_max: default_excerpt_max(),
            max_tags: default_max_tags(),
            tag_max: default_tag_max(),
            max_image_bytes: default_max_image_bytes(),
            max_gallery_images: default_max_gallery_images(),
            reading_time_max: default_reading_time_max(),
            supported_image_types: default_supported_image_types(),
        }
    }
}

impl Default for PaginationDefaults {
    fn default() -> Self {
        Self {
            rows_per_page: default_rows_per_page(),
            rows_per_page_options: default_rows_per_page_options(),
        }
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            blog: BlogLimits::default(),
            pagination: PaginationDefaults::default(),
            auto_expand_categories: true,
        }
    }
}

impl Preferences {
    /// Reject values that would make forms or tables unusable.
    pub fn validate(&self) -> AppResult<()> {
        let blog = &self.blog;
        let limits = [
            ("blog.titleMax", blog.title_max),
            ("blog.subheadingMax", blog.subheading_max),
            ("blog.categoryMax", blog.category_max),
            ("blog.excerptMax", blog.excerpt_max),
            ("blog.tagMax", blog.tag_max),
            ("blog.maxImageBytes", blog.max_image_bytes),
        ];
        if let Some((name, _)) = limits.iter().find(|(_, v)| *v == 0) {
            return Err(AppError::InvalidPreference(format!("{} must be greater than zero", name)));
        }

        if let Some(bad) = blog.supported_image_types.iter().find(|t| !t.starts_with("image/")) {
            return Err(AppError::InvalidPreference(format!("'{}' is not an image MIME type", bad)));
        }

        let pagination = &self.pagination;
        if pagination.rows_per_page == 0 {
            return Err(AppError::InvalidPreference("pagination.rowsPerPage must be greater than zero".into()));
        }
        if pagination.rows_per_page_options.contains(&0) {
            return Err(AppError::InvalidPreference(
                "pagination.rowsPerPageOptions must not contain zero".into(),
            ));
        }

        Ok(())
    }
}

/// Load preferences from `path`, writing the defaults out if the file does
/// not exist yet.
pub fn load_preferences(path: &Path) -> AppResult<Preferences> {
    if !path.exists() {
        let defaults = Preferences::default();
        save_preferences(path, &defaults)?;
        LOG.info(format!("created default preferences at {}", path.display()));
        return Ok(defaults);
    }

    let content = fs::read_to_string(path).with_file_context(path.to_path_buf(), "read")?;
    let parsed: Preferences = serde_json::from_str(&content)
        .map_err(|e| AppError::PreferencesLoad(format!("{}: {}", path.display(), e)))?;
    parsed.validate()?;

    LOG.debug(format!("loaded preferences from {}", path.display()));
    Ok(parsed)
}

pub fn save_preferences(path: &Path, preferences: &Preferences) -> AppResult<()> {
    preferences.validate()?;

    let json = serde_json::to_string_pretty(preferences)
        .map_err(|e| AppError::PreferencesSave(format!("Failed to serialize preferences: {}", e)))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_file_context(parent.to_path_buf(), "write")?;
    }
    fs::write(path, json).with_file_context(path.to_path_buf(), "write")?;
    Ok(())
}
