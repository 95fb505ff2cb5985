//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod health;
pub mod questions;

pub use health::health_handler;
pub use questions::{
    destroy_handler, edit_handler, index_handler, show_handler, store_handler, update_handler,
};
