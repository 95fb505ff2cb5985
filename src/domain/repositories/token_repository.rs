use crate::domain::entities::{ApiToken, TokenRef};
use crate::error::AppError;
use async_trait::async_trait;

/// Storage of hashed API tokens.
///
/// Only the request path ([`find_active_user`](Self::find_active_user) and
/// [`touch`](Self::touch)) runs per request; the rest backs the admin CLI.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Id of the user owning an unrevoked token with this hash.
    async fn find_active_user(&self, token_hash: &str) -> Result<Option<i64>, AppError>;

    /// Stamps `last_used_at` on the token with this hash.
    async fn touch(&self, token_hash: &str) -> Result<(), AppError>;

    /// Stores a token hash for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the name or hash is already taken.
    /// Returns [`AppError::NotFound`] if the user does not exist.
    async fn insert(&self, user_id: i64, name: &str, token_hash: &str)
    -> Result<ApiToken, AppError>;

    /// All tokens, newest first.
    async fn list(&self) -> Result<Vec<ApiToken>, AppError>;

    async fn find(&self, token: &TokenRef) -> Result<Option<ApiToken>, AppError>;

    /// Marks a token revoked. Revoking twice keeps the first timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no token has this id.
    async fn revoke(&self, id: i64) -> Result<(), AppError>;
}
