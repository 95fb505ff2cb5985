//! Slug derivation for question titles.

use serde_json::json;
use slug::slugify;

use crate::error::AppError;

/// Derives the URL-safe slug of a title.
///
/// `"How To Sort Fast"` becomes `"how-to-sort-fast"`.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the title has no character that
/// survives slugification.
pub fn slug_from_title(title: &str) -> Result<String, AppError> {
    let slug = slugify(title);

    if slug.is_empty() {
        return Err(AppError::bad_request(
            "Title must contain letters or digits",
            json!({ "title": title }),
        ));
    }

    Ok(slug)
}
