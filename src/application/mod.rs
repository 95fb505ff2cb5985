//! Application layer services implementing business logic.
//!
//! Services consume repository traits and the cache abstraction and give HTTP
//! handlers a typed API.
//!
//! # Available Services
//!
//! - [`services::question_cache::QuestionCache`] - Read-through cache for the listing and question pages
//! - [`services::question_service::QuestionService`] - Question writes, tags and answers
//! - [`services::auth_service::AuthService`] - API token to actor resolution

pub mod services;
