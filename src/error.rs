//! Custom error types for better error handling and user feedback.
//!
//! This module defines the crate's error type and the field-level
//! validation report returned by form checks.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main application error type with specific variants for different failure scenarios.
#[derive(Error, Debug)]
pub enum AppError {
    /// Category tree errors
    #[error("Invalid category tree: {0}")]
    InvalidCategoryTree(String),

    #[error("Duplicate category id '{0}' in tree")]
    DuplicateCategoryId(String),

    /// Form validation errors
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Image processing errors
    #[error("Failed to decode embedded image {index}: {source}")]
    ImageDecode {
        index: u32,
        #[source]
        source: base64::DecodeError,
    },

    /// Preferences errors
    #[error("Failed to load preferences: {0}")]
    PreferencesLoad(String),

    #[error("Failed to save preferences: {0}")]
    PreferencesSave(String),

    #[error("Invalid preference value: {0}")]
    InvalidPreference(String),

    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Serialization errors
    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic IO errors
    #[error("IO operation failed: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Convert AppError to a user-friendly error message string.
    /// This is used by the host-facing operations that return Result<T, String>.
    pub fn to_frontend_message(&self) -> String {
        match self {
            AppError::InvalidCategoryTree(_) | AppError::DuplicateCategoryId(_) => {
                "Categories could not be displayed: the category tree is invalid.".to_string()
            }
            AppError::Validation(errors) => errors
                .first_message()
                .unwrap_or("Please check the form and try again.")
                .to_string(),
            AppError::FileRead { path, .. } => {
                format!("Failed to read file: {}", path.display())
            }
            AppError::FileWrite { path, .. } => {
                format!("Failed to write file: {}", path.display())
            }
            _ => self.to_string(),
        }
    }
}

/// Field-level validation messages, keyed by form field name.
///
/// Only the first failing rule per field is kept, which is what the form
/// shows under each input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field` unless one is already present.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn first_message(&self) -> Option<&str> {
        self.fields.values().next().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded, otherwise `AppError::Validation`.
    pub fn into_result(self) -> AppResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Helper trait for adding context to Results
pub trait ResultExt<T> {
    /// Add file path context to an IO error
    fn with_file_context(self, path: PathBuf, operation: &str) -> AppResult<T>;
}

impl<T> ResultExt<T> for Result<T, io::Error> {
    fn with_file_context(self, path: PathBuf, operation: &str) -> AppResult<T> {
        self.map_err(|source| match operation {
            "read" => AppError::FileRead { path, source },
            "write" => AppError::FileWrite { path, source },
            _ => AppError::Io(source),
        })
    }
}
