//! DTOs for question endpoints.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::application::services::QuestionFields;
use crate::domain::entities::{Answer, Question, QuestionDetail, QuestionPage, QuestionSummary};
use crate::utils::slug::slug_from_title;
use crate::utils::tags::{is_valid_tag, normalize_tags};

/// Longest accepted tag name, in characters.
const MAX_TAG_LEN: usize = 30;

/// Most tags a question may carry, counted after normalization.
const MAX_TAGS: usize = 5;

/// Request body for `POST /questions` and `PUT /questions/{id}`.
///
/// Tags are free text; they are trimmed, lower-cased and deduplicated before
/// being counted, checked and stored.
#[derive(Debug, Deserialize, Validate)]
pub struct QuestionRequest {
    #[validate(length(min = 3, max = 255, message = "Title must be 3 to 255 characters"))]
    #[validate(custom(function = "validate_title"))]
    pub title: String,

    #[validate(length(min = 10, message = "Body must be at least 10 characters"))]
    pub body: String,

    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    slug_from_title(title).map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("empty_slug");
        err.message = Some("Title must contain letters or digits".into());
        err
    })
}

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    let tags = normalize_tags(tags);
    if tags.len() > MAX_TAGS {
        let mut err = ValidationError::new("too_many_tags");
        err.message = Some(format!("At most {} tags are allowed", MAX_TAGS).into());
        return Err(err);
    }

    for tag in tags {
        if tag.chars().count() > MAX_TAG_LEN || !is_valid_tag(&tag) {
            let mut err = ValidationError::new("invalid_tag");
            err.message = Some(format!("Invalid tag '{}'", tag).into());
            return Err(err);
        }
    }
    Ok(())
}

impl From<QuestionRequest> for QuestionFields {
    fn from(req: QuestionRequest) -> Self {
        QuestionFields {
            title: req.title,
            body: req.body,
            tags: req.tags,
        }
    }
}

/// One page of the question listing.
#[derive(Debug, Serialize)]
pub struct QuestionListResponse {
    pub items: Vec<QuestionSummary>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub last_page: u32,
}

impl From<QuestionPage> for QuestionListResponse {
    fn from(page: QuestionPage) -> Self {
        let last_page = page.last_page();
        Self {
            items: page.items,
            page: page.page,
            per_page: page.per_page,
            total: page.total,
            last_page,
        }
    }
}

/// A question page: the (possibly cached) detail plus live answers.
#[derive(Debug, Serialize)]
pub struct QuestionShowResponse {
    pub question: QuestionDetail,
    pub answers: Vec<Answer>,
}

/// Data for the edit form.
#[derive(Debug, Serialize)]
pub struct EditQuestionResponse {
    pub question: Question,
    /// Tag names joined into the form's single text field.
    pub tags: String,
}

/// Result of a create or update: the record and its canonical URL.
#[derive(Debug, Serialize)]
pub struct QuestionMutationResponse {
    pub url: String,
    pub question: Question,
}

impl From<Question> for QuestionMutationResponse {
    fn from(question: Question) -> Self {
        Self {
            url: question.path(),
            question,
        }
    }
}
