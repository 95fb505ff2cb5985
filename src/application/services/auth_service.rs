//! API tokens: resolving them to the acting user, and issuing them.

use hmac::{Hmac, Mac};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde_json::json;
use sha2::Sha256;
use std::sync::Arc;

use crate::domain::authorization::Actor;
use crate::domain::entities::{ApiToken, TokenRef};
use crate::domain::repositories::TokenRepository;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const GENERATED_TOKEN_LEN: usize = 48;

/// Hex HMAC-SHA256 of `token` keyed by `signing_secret`.
pub fn hash_token(signing_secret: &str, token: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
    mac.update(token.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Random alphanumeric token, about 285 bits of entropy.
pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// A freshly stored token together with the raw value, which is shown once.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: ApiToken,
    pub raw: String,
}

/// Identifies the user behind a Bearer token.
///
/// Lookups go by HMAC hash, so stored hashes are useless without the
/// server-side secret.
pub struct AuthService {
    repository: Arc<dyn TokenRepository>,
    signing_secret: String,
}

impl AuthService {
    /// `signing_secret` must match the one tokens were issued with.
    pub fn new(repository: Arc<dyn TokenRepository>, signing_secret: String) -> Self {
        Self {
            repository,
            signing_secret,
        }
    }

    /// Resolves a raw token to the acting user and records the use.
    ///
    /// A failure to record the use is logged and does not reject the request.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token is unknown or revoked.
    pub async fn authenticate(&self, token: &str) -> Result<Actor, AppError> {
        let token_hash = hash_token(&self.signing_secret, token);

        let user_id = self
            .repository
            .find_active_user(&token_hash)
            .await?
            .ok_or_else(|| {
                AppError::unauthorized("Unauthorized", json!({"reason": "Invalid or revoked token"}))
            })?;

        if let Err(e) = self.repository.touch(&token_hash).await {
            tracing::warn!(error = %e, user_id, "Failed to record token usage");
        }

        Ok(Actor { user_id })
    }

    /// Stores a token for `user_id`, generating the raw value unless given.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a blank name or raw value.
    /// Returns [`AppError::Conflict`] if the name or value is already in use.
    /// Returns [`AppError::NotFound`] if the user does not exist.
    pub async fn issue_token(
        &self,
        user_id: i64,
        name: &str,
        raw: Option<String>,
    ) -> Result<IssuedToken, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request(
                "Token name must not be empty",
                json!({ "field": "name" }),
            ));
        }

        let raw = raw.unwrap_or_else(generate_token);
        if raw.trim().is_empty() {
            return Err(AppError::bad_request(
                "Token value must not be empty",
                json!({ "field": "token" }),
            ));
        }

        let token = self
            .repository
            .insert(user_id, name, &hash_token(&self.signing_secret, &raw))
            .await?;

        tracing::info!(token_id = token.id, user_id, "API token issued");
        Ok(IssuedToken { token, raw })
    }

    pub async fn list_tokens(&self) -> Result<Vec<ApiToken>, AppError> {
        self.repository.list().await
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no token matches.
    pub async fn find_token(&self, reference: &TokenRef) -> Result<ApiToken, AppError> {
        self.repository.find(reference).await?.ok_or_else(|| {
            AppError::not_found("Token not found", json!({ "token": format!("{reference:?}") }))
        })
    }

    /// Revokes a token. Requests carrying it are rejected from then on.
    pub async fn revoke_token(&self, id: i64) -> Result<(), AppError> {
        self.repository.revoke(id).await?;
        tracing::info!(token_id = id, "API token revoked");
        Ok(())
    }
}
