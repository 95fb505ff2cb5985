//! Core domain entities of the question board.
//!
//! # Entity Types
//!
//! - [`Question`] - The live question record, as stored
//! - [`QuestionSummary`] / [`QuestionPage`] - Listing projection (cached)
//! - [`QuestionDetail`] - Detail projection (cached)
//! - [`Answer`] - An answer with its owner and vote total (never cached)
//! - [`Tag`], [`UserRef`] - Relations embedded in the projections
//! - [`ApiToken`], [`TokenRef`] - Stored API tokens and how operators name them
//!
//! Creation and update inputs are separate structs ([`NewQuestion`],
//! [`QuestionUpdate`]).

pub mod answer;
pub mod question;
pub mod tag;
pub mod user;

pub use answer::Answer;
pub use question::{
    NewQuestion, Question, QuestionDetail, QuestionPage, QuestionSummary, QuestionUpdate,
};
pub use tag::Tag;
pub use user::{ApiToken, TokenRef, UserRef};
