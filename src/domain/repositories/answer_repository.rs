//! Repository trait for answers.

use crate::domain::entities::Answer;
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for reading answers.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgAnswerRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// Answers of a question with owner and vote total, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_for_question(&self, question_id: i64) -> Result<Vec<Answer>, AppError>;
}
