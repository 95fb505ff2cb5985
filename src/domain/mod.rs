//! Domain layer containing business entities and contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Questions, answers, tags and their read projections
//! - [`repositories`] - Data access trait definitions (the question store)
//! - [`authorization`] - The gate deciding who may modify a question
//!
//! The domain layer has no dependencies on infrastructure or presentation
//! layers. Business logic lives in [`crate::application::services`].

pub mod authorization;
pub mod entities;
pub mod repositories;
