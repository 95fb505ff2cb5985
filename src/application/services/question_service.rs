//! Question creation, update and deletion with their side effects.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::domain::entities::{Answer, NewQuestion, Question, QuestionUpdate, Tag};
use crate::domain::repositories::{AnswerRepository, QuestionRepository, TagRepository};
use crate::error::AppError;
use crate::utils::slug::slug_from_title;
use crate::utils::tags::normalize_tags;

/// Validated user input for creating or updating a question.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionFields {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

/// Service owning the write side of questions.
///
/// Besides the field writes it assigns the slug from the title and keeps tag
/// associations in sync. It does not touch the cache; callers invalidate
/// through [`super::QuestionCache`] after a successful mutation.
pub struct QuestionService {
    questions: Arc<dyn QuestionRepository>,
    tags: Arc<dyn TagRepository>,
    answers: Arc<dyn AnswerRepository>,
}

impl QuestionService {
    /// Creates a new question service.
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        tags: Arc<dyn TagRepository>,
        answers: Arc<dyn AnswerRepository>,
    ) -> Self {
        Self {
            questions,
            tags,
            answers,
        }
    }

    /// Retrieves the live question record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no question has this id.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn find_question(&self, id: i64) -> Result<Question, AppError> {
        self.questions
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Question not found", json!({ "id": id })))
    }

    /// Creates a question owned by `user_id` and attaches its tags.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the title yields an empty slug.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn create_question(
        &self,
        user_id: i64,
        fields: QuestionFields,
    ) -> Result<Question, AppError> {
        let slug = slug_from_title(&fields.title)?;
        let tags = normalize_tags(&fields.tags);

        let question = self
            .questions
            .create(NewQuestion {
                user_id,
                title: fields.title,
                slug,
                body: fields.body,
            })
            .await?;

        self.tags.sync(question.id, &tags).await?;

        info!(id = question.id, user_id, slug = %question.slug, "Question created");
        Ok(question)
    }

    /// Rewrites title, slug and body of question `id` and replaces its tags.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the title yields an empty slug.
    /// Returns [`AppError::NotFound`] if no question has this id.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn update_question(
        &self,
        fields: QuestionFields,
        id: i64,
    ) -> Result<Question, AppError> {
        let slug = slug_from_title(&fields.title)?;
        let tags = normalize_tags(&fields.tags);

        let question = self
            .questions
            .update(
                id,
                QuestionUpdate {
                    title: fields.title,
                    slug,
                    body: fields.body,
                },
            )
            .await?;

        self.tags.sync(question.id, &tags).await?;

        info!(id, slug = %question.slug, "Question updated");
        Ok(question)
    }

    /// Deletes question `id` along with its tag associations.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no question has this id.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn delete_question(&self, id: i64) -> Result<(), AppError> {
        let Some(detached) = self.questions.delete(id).await? else {
            return Err(AppError::not_found("Question not found", json!({ "id": id })));
        };

        info!(id, detached, "Question deleted");
        Ok(())
    }

    /// Tags currently attached to a question.
    pub async fn tags_for(&self, question_id: i64) -> Result<Vec<Tag>, AppError> {
        self.tags.for_question(question_id).await
    }

    /// Formats a question's tags for the edit form's single text field.
    pub fn edit_question_tag(&self, current_tags: &[Tag]) -> String {
        current_tags
            .iter()
            .map(|tag| tag.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Answers of a question, read live with owner and vote total.
    pub async fn answers_for(&self, question_id: i64) -> Result<Vec<Answer>, AppError> {
        self.answers.list_for_question(question_id).await
    }

    /// Cheap store round-trip for health checks.
    pub async fn ping(&self) -> Result<i64, AppError> {
        self.questions.count().await
    }
}
