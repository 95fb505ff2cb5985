//! Question entity and its read projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Tag, UserRef};

/// A question as stored, without relations.
///
/// This is the live record used for slug checks and ownership decisions; it
/// is always read from the store, never from the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Question {
    /// Returns true if `slug` is the canonical slug of this question.
    pub fn has_slug(&self, slug: &str) -> bool {
        self.slug == slug
    }

    /// Canonical path of the question's detail page.
    pub fn path(&self) -> String {
        format!("/questions/{}/{}", self.id, self.slug)
    }
}

/// One row of the question listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub user: UserRef,
    pub tags: Vec<Tag>,
    pub answers_count: i64,
    pub votes: i64,
    pub created_at: DateTime<Utc>,
}

/// A page of the listing, newest question first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPage {
    pub items: Vec<QuestionSummary>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

impl QuestionPage {
    /// Index of the last page (at least 1, even for an empty listing).
    pub fn last_page(&self) -> u32 {
        if self.per_page == 0 || self.total <= 0 {
            return 1;
        }
        let per_page = i64::from(self.per_page);
        u32::try_from((self.total + per_page - 1) / per_page).unwrap_or(u32::MAX)
    }
}

/// A question with owner, tags and vote total, as shown on its page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDetail {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub user: UserRef,
    pub tags: Vec<Tag>,
    pub votes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input data for creating a question.
///
/// Tag associations are written separately, see
/// [`crate::domain::repositories::TagRepository::sync`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub user_id: i64,
    pub title: String,
    pub slug: String,
    pub body: String,
}

/// Replacement values for the stored fields of an existing question.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionUpdate {
    pub title: String,
    pub slug: String,
    pub body: String,
}
