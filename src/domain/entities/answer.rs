//! Answer entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserRef;

/// An answer to a question, with its owner and vote total.
///
/// Answers are read live on every detail request and are never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,
    pub body: String,
    pub user: UserRef,
    pub votes: i64,
    pub created_at: DateTime<Utc>,
}
