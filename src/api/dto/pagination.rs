//! Pagination query parameters.

use serde::Deserialize;
use serde_json::json;
use serde_with::{DisplayFromStr, serde_as};

use crate::error::AppError;

/// Pagination query parameters of the question listing.
///
/// Uses `serde_with` to parse page numbers from query strings as integers.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,
}

impl PageParams {
    /// Requested page, defaulting to 1.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the page is 0.
    pub fn page(&self) -> Result<u32, AppError> {
        match self.page.unwrap_or(1) {
            0 => Err(AppError::bad_request(
                "Page must be greater than 0",
                json!({ "page": 0 }),
            )),
            page => Ok(page),
        }
    }
}
