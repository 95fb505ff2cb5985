//! PostgreSQL implementation of token repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{ApiToken, TokenRef, UserRef};
use crate::domain::repositories::TokenRepository;
use crate::error::AppError;
use crate::utils::db_error::is_unknown_token_owner;

/// Token listing joined with the owner's name. Expects the token table
/// aliased as `t`.
const TOKEN_SELECT: &str = r#"
    SELECT t.id, t.user_id, u.name AS user_name, t.name,
           t.created_at, t.last_used_at, t.revoked_at
    FROM api_tokens t
    JOIN users u ON u.id = t.user_id
"#;

#[derive(FromRow)]
struct TokenRow {
    id: i64,
    user_id: i64,
    user_name: String,
    name: String,
    created_at: DateTime<Utc>,
    last_used_at: Option<DateTime<Utc>>,
    revoked_at: Option<DateTime<Utc>>,
}

impl From<TokenRow> for ApiToken {
    fn from(r: TokenRow) -> Self {
        ApiToken {
            id: r.id,
            owner: UserRef {
                id: r.user_id,
                name: r.user_name,
            },
            name: r.name,
            created_at: r.created_at,
            last_used_at: r.last_used_at,
            revoked_at: r.revoked_at,
        }
    }
}

/// Token store backed by the `api_tokens` table.
pub struct PgTokenRepository {
    pool: Arc<PgPool>,
}

impl PgTokenRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn find_active_user(&self, token_hash: &str) -> Result<Option<i64>, AppError> {
        let user_id: Option<i64> = sqlx::query_scalar(
            "SELECT user_id FROM api_tokens WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(token_hash)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user_id)
    }

    async fn touch(&self, token_hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE api_tokens SET last_used_at = NOW() WHERE token_hash = $1")
            .bind(token_hash)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn insert(
        &self,
        user_id: i64,
        name: &str,
        token_hash: &str,
    ) -> Result<ApiToken, AppError> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            WITH t AS (
                INSERT INTO api_tokens (user_id, name, token_hash)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT t.id, t.user_id, u.name AS user_name, t.name,
                   t.created_at, t.last_used_at, t.revoked_at
            FROM t
            JOIN users u ON u.id = t.user_id
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(token_hash)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| {
            if is_unknown_token_owner(&e) {
                AppError::not_found("User not found", json!({ "user_id": user_id }))
            } else {
                e.into()
            }
        })?;

        Ok(row.into())
    }

    async fn list(&self) -> Result<Vec<ApiToken>, AppError> {
        let rows = sqlx::query_as::<_, TokenRow>(&format!(
            "{TOKEN_SELECT} ORDER BY t.created_at DESC, t.id DESC"
        ))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(ApiToken::from).collect())
    }

    async fn find(&self, token: &TokenRef) -> Result<Option<ApiToken>, AppError> {
        let row = match token {
            TokenRef::Id(id) => {
                sqlx::query_as::<_, TokenRow>(&format!("{TOKEN_SELECT} WHERE t.id = $1"))
                    .bind(*id)
                    .fetch_optional(self.pool.as_ref())
                    .await?
            }
            TokenRef::Name(name) => {
                sqlx::query_as::<_, TokenRow>(&format!("{TOKEN_SELECT} WHERE t.name = $1"))
                    .bind(name)
                    .fetch_optional(self.pool.as_ref())
                    .await?
            }
        };

        Ok(row.map(ApiToken::from))
    }

    async fn revoke(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE api_tokens SET revoked_at = COALESCE(revoked_at, NOW()) WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Token not found", json!({ "id": id })));
        }

        Ok(())
    }
}
