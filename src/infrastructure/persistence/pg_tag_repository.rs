//! PostgreSQL implementation of the tag repository.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::Tag;
use crate::domain::repositories::TagRepository;
use crate::error::AppError;

#[derive(FromRow)]
struct TagRow {
    id: i64,
    name: String,
}

impl From<TagRow> for Tag {
    fn from(r: TagRow) -> Self {
        Tag {
            id: r.id,
            name: r.name,
        }
    }
}

/// PostgreSQL repository for tags and their question associations.
pub struct PgTagRepository {
    pool: Arc<PgPool>,
}

impl PgTagRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn for_question(&self, question_id: i64) -> Result<Vec<Tag>, AppError> {
        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT t.id, t.name
            FROM question_tag qt
            JOIN tags t ON t.id = qt.tag_id
            WHERE qt.question_id = $1
            ORDER BY qt.position
            "#,
        )
        .bind(question_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Tag::from).collect())
    }

    async fn sync(&self, question_id: i64, names: &[String]) -> Result<Vec<Tag>, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM question_tag WHERE question_id = $1")
            .bind(question_id)
            .execute(&mut *tx)
            .await?;

        let mut tags = Vec::with_capacity(names.len());

        for (position, name) in names.iter().enumerate() {
            // DO UPDATE instead of DO NOTHING so RETURNING yields existing rows too.
            let tag: Tag = sqlx::query_as::<_, TagRow>(
                r#"
                INSERT INTO tags (name)
                VALUES ($1)
                ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                RETURNING id, name
                "#,
            )
            .bind(name)
            .fetch_one(&mut *tx)
            .await?
            .into();

            sqlx::query(
                "INSERT INTO question_tag (question_id, tag_id, position) VALUES ($1, $2, $3)",
            )
            .bind(question_id)
            .bind(tag.id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;

            tags.push(tag);
        }

        tx.commit().await?;

        Ok(tags)
    }
}
