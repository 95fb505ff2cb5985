//! PostgreSQL implementation of the answer repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{Answer, UserRef};
use crate::domain::repositories::AnswerRepository;
use crate::error::AppError;

#[derive(FromRow)]
struct AnswerRow {
    id: i64,
    question_id: i64,
    body: String,
    created_at: DateTime<Utc>,
    user_id: i64,
    user_name: String,
    votes: i64,
}

/// PostgreSQL repository for answers.
pub struct PgAnswerRepository {
    pool: Arc<PgPool>,
}

impl PgAnswerRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnswerRepository for PgAnswerRepository {
    async fn list_for_question(&self, question_id: i64) -> Result<Vec<Answer>, AppError> {
        let rows = sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT
                a.id,
                a.question_id,
                a.body,
                a.created_at,
                u.id AS user_id,
                u.name AS user_name,
                COALESCE(
                    (SELECT SUM(v.value) FROM answer_votes v WHERE v.answer_id = a.id),
                    0
                )::BIGINT AS votes
            FROM answers a
            JOIN users u ON u.id = a.user_id
            WHERE a.question_id = $1
            ORDER BY a.created_at, a.id
            "#,
        )
        .bind(question_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Answer {
                id: r.id,
                question_id: r.question_id,
                body: r.body,
                user: UserRef {
                    id: r.user_id,
                    name: r.user_name,
                },
                votes: r.votes,
                created_at: r.created_at,
            })
            .collect())
    }
}
