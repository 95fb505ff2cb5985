//! Handlers for question endpoints.
//!
//! Reads go through [`crate::application::services::QuestionCache`]. Every
//! mutation checks the authorization gate against the live record first, then
//! writes through [`crate::application::services::QuestionService`] inside
//! [`crate::application::services::QuestionCache::write_through`], which drops
//! the affected cache entries before the write and again once it ends.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::pagination::PageParams;
use crate::api::dto::question::{
    EditQuestionResponse, QuestionListResponse, QuestionMutationResponse, QuestionRequest,
    QuestionShowResponse,
};
use crate::domain::authorization::{Actor, Capability, authorize};
use crate::error::AppError;
use crate::state::AppState;

/// Lists questions, newest first.
///
/// # Endpoint
///
/// `GET /questions?page=N`
///
/// # Errors
///
/// Returns 400 Bad Request if `page` is 0 or not a number.
pub async fn index_handler(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<QuestionListResponse>, AppError> {
    let page = params.page()?;
    let questions = state.question_cache.question_list(page).await?;
    Ok(Json(questions.into()))
}

/// Shows a question with its answers.
///
/// # Endpoint
///
/// `GET /questions/{id}/{slug}`
///
/// # Errors
///
/// Returns 404 Not Found if the question does not exist or `slug` is not its
/// current slug.
pub async fn show_handler(
    State(state): State<AppState>,
    Path((id, slug)): Path<(i64, String)>,
) -> Result<Json<QuestionShowResponse>, AppError> {
    let question = state.question_cache.question_detail(id, &slug).await?;
    let answers = state.question_service.answers_for(id).await?;

    Ok(Json(QuestionShowResponse { question, answers }))
}

/// Creates a question owned by the authenticated user.
///
/// # Endpoint
///
/// `POST /questions`
///
/// # Request Body
///
/// ```json
/// {
///   "title": "How to sort a Vec of structs?",
///   "body": "I have a Vec<Person> and want it sorted by age.",
///   "tags": ["rust", "sorting"]
/// }
/// ```
///
/// # Cache
///
/// Drops the cached listing before the insert and again after it, whether
/// or not the insert succeeded.
pub async fn store_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<QuestionRequest>,
) -> Result<(StatusCode, Json<QuestionMutationResponse>), AppError> {
    payload.validate()?;

    let question = state
        .question_cache
        .write_through(
            None,
            state
                .question_service
                .create_question(actor.user_id, payload.into()),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(question.into())))
}

/// Returns the data of the edit form.
///
/// # Endpoint
///
/// `GET /questions/{id}/{slug}/edit`
///
/// The gate is checked before the slug, so a non-owner gets 403 even for a
/// stale slug.
pub async fn edit_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((id, slug)): Path<(i64, String)>,
) -> Result<Json<EditQuestionResponse>, AppError> {
    let question = state.question_service.find_question(id).await?;

    authorize(
        state.gate.as_ref(),
        Capability::ModifyQuestion,
        actor,
        question.user_id,
    )?;

    if !question.has_slug(&slug) {
        return Err(AppError::not_found(
            "Question not found",
            json!({ "id": id }),
        ));
    }

    let current_tags = state.question_service.tags_for(id).await?;
    let tags = state.question_service.edit_question_tag(&current_tags);

    Ok(Json(EditQuestionResponse { question, tags }))
}

/// Updates title, body and tags of a question.
///
/// # Endpoint
///
/// `PUT /questions/{id}`
///
/// # Cache
///
/// Drops the cached listing and this question's cached detail before the
/// update and again after it. A failed update still gets the second round,
/// since the record may have changed before its tags failed to sync. Nothing
/// is dropped when the request is refused or invalid.
pub async fn update_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(payload): Json<QuestionRequest>,
) -> Result<Json<QuestionMutationResponse>, AppError> {
    let question = state.question_service.find_question(id).await?;

    authorize(
        state.gate.as_ref(),
        Capability::ModifyQuestion,
        actor,
        question.user_id,
    )?;

    payload.validate()?;

    let updated = state
        .question_cache
        .write_through(
            Some(id),
            state.question_service.update_question(payload.into(), id),
        )
        .await?;

    Ok(Json(updated.into()))
}

/// Deletes a question together with its tag associations.
///
/// Invalidation brackets the delete the same way as [`update_handler`].
///
/// # Endpoint
///
/// `DELETE /questions/{id}`
///
/// # Response Codes
///
/// - **204 No Content**: Deleted
/// - **403 Forbidden**: The actor may not modify this question
/// - **404 Not Found**: No such question
pub async fn destroy_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let question = state.question_service.find_question(id).await?;

    authorize(
        state.gate.as_ref(),
        Capability::ModifyQuestion,
        actor,
        question.user_id,
    )?;

    state
        .question_cache
        .write_through(Some(id), state.question_service.delete_question(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
