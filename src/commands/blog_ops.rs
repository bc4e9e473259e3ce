//! Blog form operations.

use crate::blog_form::{self, BlogDraft, BlogSubmission};
use crate::preferences::Preferences;
use crate::utils::logger::Logger;

const LOG: Logger = Logger::new("blog_ops");

pub fn suggest_slug(title: &str) -> String {
    blog_form::generate_slug(title)
}

/// Field messages for the form, empty when the draft is acceptable.
pub fn check_blog_draft(draft: &BlogDraft, preferences: &Preferences) -> Vec<(String, String)> {
    match draft.validate(&preferences.blog) {
        | Ok(()) => Vec::new(),
        | Err(crate::error::AppError::Validation(errors)) => errors
            .fields()
            .map(|(field, message)| (field.to_string(), message.to_string()))
            .collect(),
        | Err(other) => vec![("form".to_string(), other.to_frontend_message())],
    }
}

/// Build the multipart body for creating a post, or updating one when `id`
/// is given.
pub fn submit_blog(draft: &BlogDraft, preferences: &Preferences, id: Option<&str>) -> Result<BlogSubmission, String> {
    let operation = if id.is_some() { "build blog update" } else { "build blog create" };
    LOG.time(operation, || blog_form::build_submission(draft, &preferences.blog, id)).map_err(|e| {
        LOG.warn(format!("blog submission rejected: {}", e));
        e.to_frontend_message()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> BlogDraft {
        BlogDraft {
            title: "Async in practice".into(),
            slug: suggest_slug("Async in practice"),
            category: "Rust".into(),
            excerpt: "Notes".into(),
            content: "<p>Body</p>".into(),
            ..BlogDraft::default()
        }
    }

    #[test]
    fn valid_draft_submits() {
        let submission = submit_blog(&draft(), &Preferences::default(), None).unwrap();
        assert_eq!(submission.text_value("slug"), Some("async-in-practice"));
        assert!(submission.text_value("id").is_none());
        assert!(check_blog_draft(&draft(), &Preferences::default()).is_empty());
    }

    #[test]
    fn invalid_draft_reports_first_message() {
        let bad = BlogDraft { title: String::new(), ..draft() };
        assert_eq!(submit_blog(&bad, &Preferences::default(), Some("9")).unwrap_err(), "Title is required");

        let fields = check_blog_draft(&bad, &Preferences::default());
        assert_eq!(fields, vec![("title".to_string(), "Title is required".to_string())]);
    }
}
