//! Business logic services for the application layer.

pub mod auth_service;
pub mod question_cache;
pub mod question_service;

pub use auth_service::AuthService;
pub use question_cache::QuestionCache;
pub use question_service::{QuestionFields, QuestionService};
