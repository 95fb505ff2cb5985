//! PostgreSQL implementation of the question repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::entities::{
    NewQuestion, Question, QuestionDetail, QuestionPage, QuestionSummary, QuestionUpdate, Tag,
    UserRef,
};
use crate::domain::repositories::QuestionRepository;
use crate::error::AppError;
use crate::utils::db_error::is_dangling_tag_association;

const QUESTION_COLUMNS: &str = "id, user_id, title, slug, body, created_at, updated_at";

#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    user_id: i64,
    title: String,
    slug: String,
    body: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<QuestionRow> for Question {
    fn from(r: QuestionRow) -> Self {
        Question {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            slug: r.slug,
            body: r.body,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(FromRow)]
struct SummaryRow {
    id: i64,
    title: String,
    slug: String,
    created_at: DateTime<Utc>,
    user_id: i64,
    user_name: String,
    answers_count: i64,
    votes: i64,
}

#[derive(FromRow)]
struct DetailRow {
    id: i64,
    title: String,
    slug: String,
    body: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user_id: i64,
    user_name: String,
    votes: i64,
}

#[derive(FromRow)]
struct QuestionTagRow {
    question_id: i64,
    id: i64,
    name: String,
}

/// PostgreSQL repository for questions.
pub struct PgQuestionRepository {
    pool: Arc<PgPool>,
}

impl PgQuestionRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Loads the tags of several questions, keyed by question id.
    async fn tags_by_question(&self, ids: &[i64]) -> Result<HashMap<i64, Vec<Tag>>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, QuestionTagRow>(
            r#"
            SELECT qt.question_id, t.id, t.name
            FROM question_tag qt
            JOIN tags t ON t.id = qt.tag_id
            WHERE qt.question_id = ANY($1)
            ORDER BY qt.question_id, qt.position
            "#,
        )
        .bind(ids)
        .fetch_all(self.pool.as_ref())
        .await?;

        let mut grouped: HashMap<i64, Vec<Tag>> = HashMap::new();
        for row in rows {
            grouped.entry(row.question_id).or_default().push(Tag {
                id: row.id,
                name: row.name,
            });
        }

        Ok(grouped)
    }
}

#[async_trait]
impl QuestionRepository for PgQuestionRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Question>, AppError> {
        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {} FROM questions WHERE id = $1",
            QUESTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Question::from))
    }

    async fn list_page(&self, page: u32, per_page: u32) -> Result<QuestionPage, AppError> {
        let limit = i64::from(per_page);
        let offset = i64::from(page.saturating_sub(1)) * limit;

        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT
                q.id,
                q.title,
                q.slug,
                q.created_at,
                u.id AS user_id,
                u.name AS user_name,
                (SELECT COUNT(*) FROM answers a WHERE a.question_id = q.id) AS answers_count,
                COALESCE(
                    (SELECT SUM(v.value) FROM question_votes v WHERE v.question_id = q.id),
                    0
                )::BIGINT AS votes
            FROM questions q
            JOIN users u ON u.id = q.user_id
            ORDER BY q.created_at DESC, q.id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(self.pool.as_ref())
            .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut tags = self.tags_by_question(&ids).await?;

        let items = rows
            .into_iter()
            .map(|r| QuestionSummary {
                tags: tags.remove(&r.id).unwrap_or_default(),
                id: r.id,
                title: r.title,
                slug: r.slug,
                user: UserRef {
                    id: r.user_id,
                    name: r.user_name,
                },
                answers_count: r.answers_count,
                votes: r.votes,
                created_at: r.created_at,
            })
            .collect();

        Ok(QuestionPage {
            items,
            page,
            per_page,
            total,
        })
    }

    async fn find_detail(&self, id: i64) -> Result<Option<QuestionDetail>, AppError> {
        let row = sqlx::query_as::<_, DetailRow>(
            r#"
            SELECT
                q.id,
                q.title,
                q.slug,
                q.body,
                q.created_at,
                q.updated_at,
                u.id AS user_id,
                u.name AS user_name,
                COALESCE(
                    (SELECT SUM(v.value) FROM question_votes v WHERE v.question_id = q.id),
                    0
                )::BIGINT AS votes
            FROM questions q
            JOIN users u ON u.id = q.user_id
            WHERE q.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        let tags = self
            .tags_by_question(&[r.id])
            .await?
            .remove(&r.id)
            .unwrap_or_default();

        Ok(Some(QuestionDetail {
            id: r.id,
            title: r.title,
            slug: r.slug,
            body: r.body,
            user: UserRef {
                id: r.user_id,
                name: r.user_name,
            },
            tags,
            votes: r.votes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }))
    }

    async fn create(&self, new_question: NewQuestion) -> Result<Question, AppError> {
        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            r#"
            INSERT INTO questions (user_id, title, slug, body)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            QUESTION_COLUMNS
        ))
        .bind(new_question.user_id)
        .bind(new_question.title)
        .bind(new_question.slug)
        .bind(new_question.body)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn update(&self, id: i64, update: QuestionUpdate) -> Result<Question, AppError> {
        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            r#"
            UPDATE questions
            SET title = $2, slug = $3, body = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            QUESTION_COLUMNS
        ))
        .bind(id)
        .bind(update.title)
        .bind(update.slug)
        .bind(update.body)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Question::from)
            .ok_or_else(|| AppError::not_found("Question not found", json!({ "id": id })))
    }

    async fn delete(&self, id: i64) -> Result<Option<u64>, AppError> {
        let mut tx = self.pool.begin().await?;

        let detached = sqlx::query("DELETE FROM question_tag WHERE question_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let deleted = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_dangling_tag_association(&e) {
                    AppError::conflict("Question gained tags while deleting", json!({ "id": id }))
                } else {
                    e.into()
                }
            })?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;

        Ok(Some(detached))
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }
}
