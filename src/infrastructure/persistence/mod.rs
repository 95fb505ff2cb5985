//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx. Rows are
//! decoded through private `FromRow` structs and mapped into domain entities.
//!
//! # Repositories
//!
//! - [`PgQuestionRepository`] - Questions, listing and detail projections
//! - [`PgTagRepository`] - Tag associations
//! - [`PgAnswerRepository`] - Answers with vote totals
//! - [`PgTokenRepository`] - API token storage and lookup

pub mod pg_answer_repository;
pub mod pg_question_repository;
pub mod pg_tag_repository;
pub mod pg_token_repository;

pub use pg_answer_repository::PgAnswerRepository;
pub use pg_question_repository::PgQuestionRepository;
pub use pg_tag_repository::PgTagRepository;
pub use pg_token_repository::PgTokenRepository;
