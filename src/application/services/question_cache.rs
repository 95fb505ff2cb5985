//! Read-through cache for the question listing and question pages.
//!
//! Two kinds of entries are kept, both for the same TTL:
//!
//! - the first page of the listing under [`QUESTION_LIST_KEY`]
//! - each question's detail under [`question_detail_key`]
//!
//! Only the first listing page is cached. The list key is a single literal, so
//! caching any other page under it would hand that page's contents to every
//! page request; later pages are always read from the store instead.
//!
//! Population is not locked: two concurrent misses on one key both load and
//! both write, and the last write wins. A reader that loaded before a mutation
//! can also write its result after the mutating request invalidated the key;
//! that entry then lives until its TTL runs out.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::entities::{QuestionDetail, QuestionPage};
use crate::domain::repositories::QuestionRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;

/// Cache key of the first listing page.
pub const QUESTION_LIST_KEY: &str = "questions";

/// Prefix of per-question detail keys.
pub const QUESTION_DETAIL_KEY_PREFIX: &str = "question-";

/// Lifetime of a cached entry: ten minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Questions per listing page.
pub const DEFAULT_PER_PAGE: u32 = 15;

/// Cache key of a question's detail entry.
pub fn question_detail_key(id: i64) -> String {
    format!("{}{}", QUESTION_DETAIL_KEY_PREFIX, id)
}

/// Read-through cache in front of the question store.
pub struct QuestionCache {
    cache: Arc<dyn CacheService>,
    questions: Arc<dyn QuestionRepository>,
    ttl: Duration,
    per_page: u32,
}

impl QuestionCache {
    /// Creates a question cache over a cache backend and the question store.
    pub fn new(
        cache: Arc<dyn CacheService>,
        questions: Arc<dyn QuestionRepository>,
        ttl: Duration,
        per_page: u32,
    ) -> Self {
        Self {
            cache,
            questions,
            ttl,
            per_page,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Returns a page of the listing, newest question first.
    ///
    /// Page 1 is served from the cache when present and cached on miss.
    /// Other pages are loaded from the store on every call.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `page` is 0.
    /// Returns [`AppError::Internal`] on store or cache failures.
    pub async fn question_list(&self, page: u32) -> Result<QuestionPage, AppError> {
        if page == 0 {
            return Err(AppError::bad_request(
                "Page must be greater than 0",
                json!({ "page": page }),
            ));
        }

        if page > 1 {
            debug!(page, "Listing page not cached, reading store");
            return self.questions.list_page(page, self.per_page).await;
        }

        self.remember(QUESTION_LIST_KEY, "list", || {
            self.questions.list_page(1, self.per_page)
        })
        .await
    }

    /// Returns the detail of question `id` if `expected_slug` is its slug.
    ///
    /// The slug is compared against the live record before the cache is
    /// consulted, so a renamed question is never served under its old slug,
    /// whatever the cache holds.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the question does not exist or its
    /// slug differs from `expected_slug`.
    /// Returns [`AppError::Internal`] on store or cache failures.
    pub async fn question_detail(
        &self,
        id: i64,
        expected_slug: &str,
    ) -> Result<QuestionDetail, AppError> {
        let question = self
            .questions
            .find_by_id(id)
            .await?
            .ok_or_else(|| question_not_found(id))?;

        if !question.has_slug(expected_slug) {
            debug!(id, expected_slug, slug = %question.slug, "Slug mismatch");
            return Err(question_not_found(id));
        }

        self.remember(&question_detail_key(id), "detail", || async move {
            self.questions
                .find_detail(id)
                .await?
                .ok_or_else(|| question_not_found(id))
        })
        .await
    }

    /// Drops the cached listing.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the cache backend fails.
    pub async fn invalidate_list(&self) -> Result<(), AppError> {
        self.cache.delete(QUESTION_LIST_KEY).await?;
        debug!(key = QUESTION_LIST_KEY, "Cache INVALIDATE");
        Ok(())
    }

    /// Drops the cached detail of question `id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the cache backend fails.
    pub async fn invalidate_detail(&self, id: i64) -> Result<(), AppError> {
        let key = question_detail_key(id);
        self.cache.delete(&key).await?;
        debug!(key, "Cache INVALIDATE");
        Ok(())
    }

    /// Drops the cached listing and, for `Some(id)`, that question's detail.
    ///
    /// Both deletes are attempted even when the first one fails; the first
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the cache backend fails.
    pub async fn invalidate_views(&self, question: Option<i64>) -> Result<(), AppError> {
        let list = self.invalidate_list().await;
        let detail = match question {
            Some(id) => self.invalidate_detail(id).await,
            None => Ok(()),
        };
        list.and(detail)
    }

    /// Runs a question write between two rounds of invalidation.
    ///
    /// The first round runs before `write` starts; if it fails the write is
    /// never attempted. The second round runs however `write` ends, since a
    /// failed write may still have committed part of its changes. The write's
    /// own error takes precedence over a failed second round.
    ///
    /// # Errors
    ///
    /// Returns the error of `write`, or [`AppError::Internal`] if the cache
    /// backend fails.
    pub async fn write_through<T, Fut>(
        &self,
        question: Option<i64>,
        write: Fut,
    ) -> Result<T, AppError>
    where
        Fut: Future<Output = Result<T, AppError>>,
    {
        self.invalidate_views(question).await?;

        let outcome = write.await;
        let invalidated = self.invalidate_views(question).await;

        match (outcome, invalidated) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(cache_err)) => {
                warn!(?question, error = %cache_err, "Invalidation after failed write also failed");
                Err(e)
            }
        }
    }

    /// Returns the value cached under `key`, or loads, stores and returns it.
    ///
    /// An entry that no longer decodes is treated as a miss and overwritten.
    async fn remember<T, F, Fut>(
        &self,
        key: &str,
        view: &'static str,
        load: F,
    ) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        if let Some(raw) = self.cache.get(key).await? {
            match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    debug!(key, "Cache HIT");
                    metrics::counter!("question_cache_requests_total", "view" => view, "result" => "hit")
                        .increment(1);
                    return Ok(value);
                }
                Err(e) => warn!(key, error = %e, "Discarding undecodable cache entry"),
            }
        }

        debug!(key, "Cache MISS");
        metrics::counter!("question_cache_requests_total", "view" => view, "result" => "miss")
            .increment(1);

        let value = load().await?;

        let raw = serde_json::to_string(&value).map_err(|e| {
            AppError::internal("Failed to serialize cache entry", json!({ "reason": e.to_string() }))
        })?;
        self.cache.set(key, &raw, self.ttl).await?;

        Ok(value)
    }
}

fn question_not_found(id: i64) -> AppError {
    AppError::not_found("Question not found", json!({ "id": id }))
}
