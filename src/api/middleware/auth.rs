//! Resolves the acting user for protected question routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use serde_json::json;

use crate::{api::middleware::tracing::record_actor, error::AppError, state::AppState};

/// Turns `Authorization: Bearer <token>` into an [`Actor`] extension.
///
/// Handlers behind this layer extract the actor with
/// `Extension<Actor>` and hand it to the authorization gate. A missing or
/// malformed header, or a token that is unknown or revoked, ends the request
/// with `401` before any handler runs.
///
/// [`Actor`]: crate::domain::authorization::Actor
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "Authorization header is missing or invalid" }),
            )
        })?;

    let actor = st.auth_service.authenticate(&token).await?;
    record_actor(actor.user_id);
    parts.extensions.insert(actor);

    Ok(next.run(Request::from_parts(parts, body)).await)
}
