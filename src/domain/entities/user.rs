//! Users and the API tokens that act on their behalf.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Owning user as embedded in questions, answers and tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
    pub name: String,
}

/// Stored API token metadata. The raw token is never kept, only its hash.
#[derive(Debug, Clone)]
pub struct ApiToken {
    pub id: i64,
    pub owner: UserRef,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl ApiToken {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// How an operator names a token: numeric input is an id, anything else a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRef {
    Id(i64),
    Name(String),
}

impl TokenRef {
    pub fn parse(input: &str) -> Self {
        match input.trim().parse::<i64>() {
            Ok(id) => TokenRef::Id(id),
            Err(_) => TokenRef::Name(input.trim().to_string()),
        }
    }
}
