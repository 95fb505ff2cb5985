//! Helpers shared across layers.
//!
//! - [`slug`] - URL-safe slugs derived from question titles
//! - [`tags`] - Normalization of user-supplied tag names
//! - [`db_error`] - Classification of database errors

pub mod db_error;
pub mod slug;
pub mod tags;
