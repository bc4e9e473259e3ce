//! Category listing operations: rows for the table, expansion, parent picker.

use crate::category_tree::{
    self, Category, CategoryId, CategoryListResponse, CategoryPayload, ExpansionState, FlattenedRow, ParentOption,
};
use crate::log_debug;
use crate::preferences::Preferences;
use crate::utils::logger::Logger;

const COMPONENT: &str = "category_ops";
const LOG: Logger = Logger::new(COMPONENT);

/// Normalise a raw category listing response from the API.
pub fn load_categories(payload: serde_json::Value) -> Result<CategoryListResponse, String> {
    let response = category_tree::normalize_category_response(payload).map_err(|e| {
        LOG.error_with_context("unreadable category listing", &e);
        e.to_frontend_message()
    })?;
    log_debug!(COMPONENT, "loaded {} of {} categories", response.categories.len(), response.count);
    Ok(response)
}

/// Every row of the tree in display order.
pub fn category_rows(categories: &[Category]) -> Result<Vec<FlattenedRow<'_>>, String> {
    LOG.time("flatten categories", || category_tree::flatten(categories)).map_err(|e| {
        LOG.error_with_context("failed to flatten categories", &e);
        e.to_frontend_message()
    })
}

/// Expansion state for a freshly loaded listing.
pub fn initial_expansion(categories: &[Category], preferences: &Preferences) -> Result<ExpansionState, String> {
    if !preferences.auto_expand_categories {
        return Ok(ExpansionState::new());
    }
    let rows = category_rows(categories)?;
    Ok(ExpansionState::auto_expand(&rows))
}

/// Rows the table should currently draw.
pub fn visible_category_rows<'a>(
    categories: &'a [Category],
    expanded: &ExpansionState,
) -> Result<Vec<FlattenedRow<'a>>, String> {
    let rows = category_rows(categories)?;
    let visible: Vec<FlattenedRow<'a>> = category_tree::visible_rows(&rows, expanded).into_iter().cloned().collect();
    log_debug!(COMPONENT, "{} of {} rows visible", visible.len(), rows.len());
    Ok(visible)
}

pub fn toggle_category(id: &CategoryId, expanded: ExpansionState) -> ExpansionState {
    category_tree::toggle_expansion(id, expanded)
}

/// Options for the parent selector; `editing` and its subtree are left out.
pub fn category_parent_options(
    categories: &[Category],
    editing: Option<&CategoryId>,
) -> Result<Vec<ParentOption>, String> {
    let rows = category_rows(categories)?;
    Ok(category_tree::parent_options(&rows, editing))
}

pub fn validate_category(payload: &CategoryPayload) -> Result<(), String> {
    payload.validate().map_err(|e| e.to_frontend_message())
}
