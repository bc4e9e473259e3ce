//! Preference operations for the host settings screen.

use crate::preferences::{self, Preferences};
use std::path::Path;

pub fn get_preferences(path: &Path) -> Result<Preferences, String> {
    preferences::load_preferences(path).map_err(|e| e.to_frontend_message())
}

pub fn set_preferences(path: &Path, preferences: &Preferences) -> Result<(), String> {
    preferences::save_preferences(path, preferences).map_err(|e| e.to_frontend_message())
}
