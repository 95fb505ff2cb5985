//! Repository trait definitions for the domain layer.
//!
//! Together these traits make up the question store the service reads and
//! writes. Implementations live in `crate::infrastructure::persistence`; mock
//! implementations are generated via `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`QuestionRepository`] - Questions, the listing and the detail projection
//! - [`TagRepository`] - Tag associations of a question
//! - [`AnswerRepository`] - Answers of a question with vote totals
//! - [`TokenRepository`] - API tokens identifying the acting user

pub mod answer_repository;
pub mod question_repository;
pub mod tag_repository;
pub mod token_repository;

pub use answer_repository::AnswerRepository;
pub use question_repository::QuestionRepository;
pub use tag_repository::TagRepository;
pub use token_repository::TokenRepository;

#[cfg(test)]
pub use answer_repository::MockAnswerRepository;
#[cfg(test)]
pub use question_repository::MockQuestionRepository;
#[cfg(test)]
pub use tag_repository::MockTagRepository;
#[cfg(test)]
pub use token_repository::MockTokenRepository;
