//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::{AuthService, QuestionCache, QuestionService};
use crate::domain::authorization::AuthorizationGate;
use crate::infrastructure::cache::CacheService;

/// Services and collaborators shared across requests.
///
/// Cloning is cheap: every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub question_service: Arc<QuestionService>,
    pub question_cache: Arc<QuestionCache>,
    pub auth_service: Arc<AuthService>,
    pub gate: Arc<dyn AuthorizationGate>,
    /// Backend behind `question_cache`, kept for health checks.
    pub cache: Arc<dyn CacheService>,
}

impl AppState {
    pub fn new(
        question_service: Arc<QuestionService>,
        question_cache: Arc<QuestionCache>,
        auth_service: Arc<AuthService>,
        gate: Arc<dyn AuthorizationGate>,
        cache: Arc<dyn CacheService>,
    ) -> Self {
        Self {
            question_service,
            question_cache,
            auth_service,
            gate,
            cache,
        }
    }
}
