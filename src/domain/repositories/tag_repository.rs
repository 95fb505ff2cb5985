//! Repository trait for question tags.

use crate::domain::entities::Tag;
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for tag associations.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgTagRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Tags attached to a question, in the order they were given.
    async fn for_question(&self, question_id: i64) -> Result<Vec<Tag>, AppError>;

    /// Makes `names` the exact tag list of a question.
    ///
    /// Missing tags are created; associations not named are removed.
    /// Returns the resulting tags in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn sync(&self, question_id: i64, names: &[String]) -> Result<Vec<Tag>, AppError>;
}
