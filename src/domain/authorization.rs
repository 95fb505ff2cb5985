//! Authorization gate for question mutations.

use serde::Serialize;
use serde_json::json;

use crate::error::AppError;

/// Capabilities the gate can be asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Edit, update or delete a question.
    ModifyQuestion,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ModifyQuestion => "modify-question",
        }
    }
}

/// The authenticated user performing a request.
///
/// Inserted into request extensions by [`crate::api::middleware::auth::layer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub user_id: i64,
}

/// Answers "may this actor do this to a resource owned by that user?".
#[cfg_attr(test, mockall::automock)]
pub trait AuthorizationGate: Send + Sync {
    fn is_allowed(&self, capability: Capability, actor_id: i64, owner_id: i64) -> bool;
}

/// Gate granting modification rights to the owner only.
#[derive(Debug, Default, Clone, Copy)]
pub struct OwnershipGate;

impl AuthorizationGate for OwnershipGate {
    fn is_allowed(&self, capability: Capability, actor_id: i64, owner_id: i64) -> bool {
        match capability {
            Capability::ModifyQuestion => actor_id == owner_id,
        }
    }
}

/// Checks the gate and turns a denial into [`AppError::Forbidden`].
///
/// # Errors
///
/// Returns [`AppError::Forbidden`] when the gate denies `capability`.
pub fn authorize(
    gate: &dyn AuthorizationGate,
    capability: Capability,
    actor: Actor,
    owner_id: i64,
) -> Result<(), AppError> {
    if gate.is_allowed(capability, actor.user_id, owner_id) {
        return Ok(());
    }

    tracing::info!(
        capability = capability.as_str(),
        actor_id = actor.user_id,
        owner_id,
        "Gate denied"
    );

    Err(AppError::forbidden(
        "This action is unauthorized",
        json!({ "capability": capability.as_str() }),
    ))
}
