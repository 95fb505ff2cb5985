//! Repository trait for question data access.

use crate::domain::entities::{NewQuestion, Question, QuestionDetail, QuestionPage, QuestionUpdate};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for questions.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgQuestionRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Finds the live question record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<Question>, AppError>;

    /// Loads one page of the listing.
    ///
    /// Each summary carries its owner, tags, answer count and vote total.
    /// Questions are ordered newest first.
    ///
    /// # Arguments
    ///
    /// - `page` - Page number (1-indexed)
    /// - `per_page` - Number of items per page
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_page(&self, page: u32, per_page: u32) -> Result<QuestionPage, AppError>;

    /// Loads a question with owner, tags and vote total.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_detail(&self, id: i64) -> Result<Option<QuestionDetail>, AppError>;

    /// Inserts a question.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_question: NewQuestion) -> Result<Question, AppError>;

    /// Replaces title, slug and body of a question and bumps `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no question has this id.
    /// Returns [`AppError::Internal`] on database errors.
    async fn update(&self, id: i64, update: QuestionUpdate) -> Result<Question, AppError>;

    /// Deletes a question and its tag associations in one transaction.
    ///
    /// Returns how many tag associations were removed, or `Ok(None)` if the
    /// question did not exist. On error nothing is removed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if a tag was attached concurrently.
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete(&self, id: i64) -> Result<Option<u64>, AppError>;

    /// Counts all questions.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count(&self) -> Result<i64, AppError>;
}
