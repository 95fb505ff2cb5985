//! API route configuration.
//!
//! Reads are public. Mutations and the edit form require Bearer token
//! authentication via [`crate::api::middleware::auth`], which provides the
//! [`crate::domain::authorization::Actor`] the handlers check the gate with.

use crate::api::handlers::{
    destroy_handler, edit_handler, index_handler, show_handler, store_handler, update_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

/// Public question routes.
///
/// # Endpoints
///
/// - `GET /questions`              - Paginated listing, newest first
/// - `GET /questions/{id}/{slug}`  - Question detail with answers
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/questions", get(index_handler))
        .route("/questions/{id}/{slug}", get(show_handler))
}

/// Question routes that act on behalf of an authenticated user.
///
/// # Endpoints
///
/// - `POST   /questions`                   - Create a question
/// - `GET    /questions/{id}/{slug}/edit`  - Edit form data (owner only)
/// - `PUT    /questions/{id}`              - Update a question (owner only)
/// - `DELETE /questions/{id}`              - Delete a question (owner only)
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/questions", post(store_handler))
        .route("/questions/{id}/{slug}/edit", get(edit_handler))
        .route("/questions/{id}", put(update_handler).delete(destroy_handler))
}
