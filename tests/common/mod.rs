#![allow(dead_code)]

//! In-memory doubles and a test server wired like the real router, minus
//! rate limiting (which needs peer addresses).

use async_trait::async_trait;
use axum::{Router, middleware, routing::get};
use axum_test::TestServer;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use question_board::api::handlers::health_handler;
use question_board::api::middleware::auth;
use question_board::api::routes::{protected_routes, public_routes};
use question_board::application::services::auth_service::hash_token;
use question_board::application::services::{AuthService, QuestionCache, QuestionService};
use question_board::domain::authorization::OwnershipGate;
use question_board::domain::entities::{
    Answer, ApiToken, NewQuestion, Question, QuestionDetail, QuestionPage, QuestionSummary,
    QuestionUpdate, Tag, TokenRef, UserRef,
};
use question_board::domain::repositories::{
    AnswerRepository, QuestionRepository, TagRepository, TokenRepository,
};
use question_board::error::AppError;
use question_board::infrastructure::cache::{CacheError, CacheResult, CacheService, MemoryCache};
use question_board::state::AppState;

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const ALICE: i64 = 1;
pub const BOB: i64 = 2;
pub const ALICE_TOKEN: &str = "alice-token";
pub const BOB_TOKEN: &str = "bob-token";
pub const PER_PAGE: u32 = 15;

// ─── QUESTION STORE ──────────────────────────────────────────────────────────

#[derive(Default)]
struct Tables {
    users: HashMap<i64, String>,
    questions: BTreeMap<i64, Question>,
    tags: Vec<Tag>,
    question_tags: HashMap<i64, Vec<i64>>,
    answers: Vec<Answer>,
    votes: HashMap<i64, i64>,
    next_question_id: i64,
}

/// Question, tag and answer tables behind the repository traits.
///
/// Counts listing and detail reads so tests can tell cache hits from store
/// reads. [`InMemoryStore::break_tag_sync`] makes every later tag sync fail
/// after the question row itself was written.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    list_reads: AtomicUsize,
    detail_reads: AtomicUsize,
    tag_sync_broken: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        let store = Self::default();
        {
            let mut t = store.tables.lock().unwrap();
            t.users.insert(ALICE, "alice".to_string());
            t.users.insert(BOB, "bob".to_string());
            t.next_question_id = 100;
        }
        store
    }

    pub fn list_reads(&self) -> usize {
        self.list_reads.load(Ordering::SeqCst)
    }

    pub fn detail_reads(&self) -> usize {
        self.detail_reads.load(Ordering::SeqCst)
    }

    pub fn break_tag_sync(&self) {
        self.tag_sync_broken.store(true, Ordering::SeqCst);
    }

    /// Inserts a question created `age_minutes` ago with the given tags.
    pub fn seed_question(
        &self,
        id: i64,
        user_id: i64,
        title: &str,
        slug: &str,
        tags: &[&str],
        age_minutes: i64,
    ) {
        let created_at = Utc::now() - ChronoDuration::minutes(age_minutes);
        let mut t = self.tables.lock().unwrap();
        t.questions.insert(
            id,
            Question {
                id,
                user_id,
                title: title.to_string(),
                slug: slug.to_string(),
                body: format!("Body of {}", title),
                created_at,
                updated_at: created_at,
            },
        );
        let names: Vec<String> = tags.iter().map(|s| s.to_string()).collect();
        attach(&mut t, id, &names);
    }

    pub fn seed_answer(&self, id: i64, question_id: i64, user_id: i64, body: &str, votes: i64) {
        let mut t = self.tables.lock().unwrap();
        let user = user_ref(&t, user_id);
        t.answers.push(Answer {
            id,
            question_id,
            body: body.to_string(),
            user,
            votes,
            created_at: Utc::now(),
        });
    }

    pub fn seed_votes(&self, question_id: i64, votes: i64) {
        self.tables.lock().unwrap().votes.insert(question_id, votes);
    }

    pub fn question(&self, id: i64) -> Option<Question> {
        self.tables.lock().unwrap().questions.get(&id).cloned()
    }

    pub fn tag_names(&self, question_id: i64) -> Vec<String> {
        let t = self.tables.lock().unwrap();
        tags_of(&t, question_id).into_iter().map(|t| t.name).collect()
    }

    pub fn has_tag_rows(&self, question_id: i64) -> bool {
        self.tables
            .lock()
            .unwrap()
            .question_tags
            .get(&question_id)
            .is_some_and(|ids| !ids.is_empty())
    }
}

fn user_ref(t: &Tables, user_id: i64) -> UserRef {
    UserRef {
        id: user_id,
        name: t.users.get(&user_id).cloned().unwrap_or_default(),
    }
}

fn tags_of(t: &Tables, question_id: i64) -> Vec<Tag> {
    t.question_tags
        .get(&question_id)
        .map(|ids| {
            ids.iter()
                .filter_map(|id| t.tags.iter().find(|tag| tag.id == *id).cloned())
                .collect()
        })
        .unwrap_or_default()
}

fn attach(t: &mut Tables, question_id: i64, names: &[String]) -> Vec<Tag> {
    let mut attached = Vec::new();
    for name in names {
        let tag = match t.tags.iter().find(|tag| &tag.name == name) {
            Some(tag) => tag.clone(),
            None => {
                let tag = Tag {
                    id: t.tags.len() as i64 + 1,
                    name: name.clone(),
                };
                t.tags.push(tag.clone());
                tag
            }
        };
        attached.push(tag);
    }
    t.question_tags
        .insert(question_id, attached.iter().map(|tag| tag.id).collect());
    attached
}

#[async_trait]
impl QuestionRepository for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Question>, AppError> {
        Ok(self.question(id))
    }

    async fn list_page(&self, page: u32, per_page: u32) -> Result<QuestionPage, AppError> {
        self.list_reads.fetch_add(1, Ordering::SeqCst);
        let t = self.tables.lock().unwrap();

        let mut ordered: Vec<&Question> = t.questions.values().collect();
        ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let items = ordered
            .into_iter()
            .skip(((page - 1) * per_page) as usize)
            .take(per_page as usize)
            .map(|q| QuestionSummary {
                id: q.id,
                title: q.title.clone(),
                slug: q.slug.clone(),
                user: user_ref(&t, q.user_id),
                tags: tags_of(&t, q.id),
                answers_count: t.answers.iter().filter(|a| a.question_id == q.id).count() as i64,
                votes: t.votes.get(&q.id).copied().unwrap_or(0),
                created_at: q.created_at,
            })
            .collect();

        Ok(QuestionPage {
            items,
            page,
            per_page,
            total: t.questions.len() as i64,
        })
    }

    async fn find_detail(&self, id: i64) -> Result<Option<QuestionDetail>, AppError> {
        self.detail_reads.fetch_add(1, Ordering::SeqCst);
        let t = self.tables.lock().unwrap();

        Ok(t.questions.get(&id).map(|q| QuestionDetail {
            id: q.id,
            title: q.title.clone(),
            slug: q.slug.clone(),
            body: q.body.clone(),
            user: user_ref(&t, q.user_id),
            tags: tags_of(&t, q.id),
            votes: t.votes.get(&q.id).copied().unwrap_or(0),
            created_at: q.created_at,
            updated_at: q.updated_at,
        }))
    }

    async fn create(&self, new_question: NewQuestion) -> Result<Question, AppError> {
        let mut t = self.tables.lock().unwrap();
        t.next_question_id += 1;
        let now: DateTime<Utc> = Utc::now();
        let question = Question {
            id: t.next_question_id,
            user_id: new_question.user_id,
            title: new_question.title,
            slug: new_question.slug,
            body: new_question.body,
            created_at: now,
            updated_at: now,
        };
        t.questions.insert(question.id, question.clone());
        Ok(question)
    }

    async fn update(&self, id: i64, update: QuestionUpdate) -> Result<Question, AppError> {
        let mut t = self.tables.lock().unwrap();
        let question = t
            .questions
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Question not found", json!({ "id": id })))?;
        question.title = update.title;
        question.slug = update.slug;
        question.body = update.body;
        question.updated_at = Utc::now();
        Ok(question.clone())
    }

    async fn delete(&self, id: i64) -> Result<Option<u64>, AppError> {
        let mut t = self.tables.lock().unwrap();
        if t.questions.remove(&id).is_none() {
            return Ok(None);
        }
        let detached = t.question_tags.remove(&id).map(|ids| ids.len() as u64);
        Ok(Some(detached.unwrap_or(0)))
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.tables.lock().unwrap().questions.len() as i64)
    }
}

#[async_trait]
impl TagRepository for InMemoryStore {
    async fn for_question(&self, question_id: i64) -> Result<Vec<Tag>, AppError> {
        Ok(tags_of(&self.tables.lock().unwrap(), question_id))
    }

    async fn sync(&self, question_id: i64, names: &[String]) -> Result<Vec<Tag>, AppError> {
        if self.tag_sync_broken.load(Ordering::SeqCst) {
            return Err(AppError::internal(
                "Database error",
                json!({ "reason": "deadlock detected" }),
            ));
        }
        Ok(attach(&mut self.tables.lock().unwrap(), question_id, names))
    }
}

#[async_trait]
impl AnswerRepository for InMemoryStore {
    async fn list_for_question(&self, question_id: i64) -> Result<Vec<Answer>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.answers
            .iter()
            .filter(|a| a.question_id == question_id)
            .cloned()
            .collect())
    }
}

// ─── TOKENS ──────────────────────────────────────────────────────────────────

/// Token store keyed by hash, holding the owning user id.
#[derive(Default)]
pub struct InMemoryTokens {
    active: Mutex<HashMap<String, i64>>,
    touched: Mutex<Vec<String>>,
}

impl InMemoryTokens {
    pub fn with_defaults() -> Self {
        let tokens = Self::default();
        tokens.issue(ALICE_TOKEN, ALICE);
        tokens.issue(BOB_TOKEN, BOB);
        tokens
    }

    pub fn issue(&self, raw: &str, user_id: i64) {
        self.active
            .lock()
            .unwrap()
            .insert(hash_token(SIGNING_SECRET, raw), user_id);
    }

    pub fn revoke(&self, raw: &str) {
        self.active
            .lock()
            .unwrap()
            .remove(&hash_token(SIGNING_SECRET, raw));
    }

    pub fn touched(&self) -> Vec<String> {
        self.touched.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokens {
    async fn find_active_user(&self, token_hash: &str) -> Result<Option<i64>, AppError> {
        Ok(self.active.lock().unwrap().get(token_hash).copied())
    }

    async fn touch(&self, token_hash: &str) -> Result<(), AppError> {
        self.touched.lock().unwrap().push(token_hash.to_string());
        Ok(())
    }

    async fn insert(
        &self,
        user_id: i64,
        name: &str,
        token_hash: &str,
    ) -> Result<ApiToken, AppError> {
        self.active
            .lock()
            .unwrap()
            .insert(token_hash.to_string(), user_id);
        Ok(ApiToken {
            id: 1,
            owner: UserRef {
                id: user_id,
                name: format!("user-{user_id}"),
            },
            name: name.to_string(),
            created_at: Utc::now(),
            last_used_at: None,
            revoked_at: None,
        })
    }

    async fn list(&self) -> Result<Vec<ApiToken>, AppError> {
        Ok(vec![])
    }

    async fn find(&self, _token: &TokenRef) -> Result<Option<ApiToken>, AppError> {
        Ok(None)
    }

    async fn revoke(&self, _id: i64) -> Result<(), AppError> {
        Ok(())
    }
}

// ─── CACHES ──────────────────────────────────────────────────────────────────

/// Memory cache that remembers which keys were deleted.
#[derive(Default)]
pub struct RecordingCache {
    inner: MemoryCache,
    deleted: Mutex<Vec<String>>,
}

impl RecordingCache {
    pub fn deleted_keys(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub async fn contains(&self, key: &str) -> bool {
        matches!(self.inner.get(key).await, Ok(Some(_)))
    }
}

#[async_trait]
impl CacheService for RecordingCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.deleted.lock().unwrap().push(key.to_string());
        self.inner.delete(key).await
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Cache backend whose every operation fails.
pub struct BrokenCache;

#[async_trait]
impl CacheService for BrokenCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::ConnectionError("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::ConnectionError("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Err(CacheError::ConnectionError("connection refused".to_string()))
    }

    async fn health_check(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

/// Memory cache whose deletes start failing after a set number of calls.
pub struct FlakyDeleteCache {
    inner: MemoryCache,
    deletes_left: AtomicUsize,
}

impl FlakyDeleteCache {
    pub fn failing_after(deletes: usize) -> Self {
        Self {
            inner: MemoryCache::new(),
            deletes_left: AtomicUsize::new(deletes),
        }
    }
}

#[async_trait]
impl CacheService for FlakyDeleteCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let allowed = self
            .deletes_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !allowed {
            return Err(CacheError::OperationError("READONLY".to_string()));
        }
        self.inner.delete(key).await
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

// ─── APP ─────────────────────────────────────────────────────────────────────

pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<InMemoryStore>,
    pub tokens: Arc<InMemoryTokens>,
    pub cache: Arc<RecordingCache>,
}

/// Store seeded with two questions by alice (5 older, 7 newer) and one
/// answer on question 5.
pub fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.seed_question(
        5,
        ALICE,
        "How to sort",
        "how-to-sort",
        &["rust", "sorting"],
        60,
    );
    store.seed_question(
        7,
        ALICE,
        "Why is my borrow rejected",
        "why-is-my-borrow-rejected",
        &["rust"],
        30,
    );
    store.seed_answer(1, 5, BOB, "Use sort_by_key.", 3);
    store.seed_votes(5, 2);
    store
}

pub fn test_app() -> TestApp {
    let store = Arc::new(seeded_store());
    let tokens = Arc::new(InMemoryTokens::with_defaults());
    let cache = Arc::new(RecordingCache::default());

    let server = server_with(store.clone(), tokens.clone(), cache.clone());

    TestApp {
        server,
        store,
        tokens,
        cache,
    }
}

pub fn server_with(
    store: Arc<InMemoryStore>,
    tokens: Arc<InMemoryTokens>,
    cache: Arc<dyn CacheService>,
) -> TestServer {
    let state = build_state(store, tokens, cache);

    let router = Router::new()
        .route("/health", get(health_handler))
        .merge(public_routes())
        .merge(
            protected_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer)),
        )
        .with_state(state);

    TestServer::new(router).unwrap()
}

pub fn build_state(
    store: Arc<InMemoryStore>,
    tokens: Arc<InMemoryTokens>,
    cache: Arc<dyn CacheService>,
) -> AppState {
    let question_cache = Arc::new(QuestionCache::new(
        cache.clone(),
        store.clone(),
        Duration::from_secs(600),
        PER_PAGE,
    ));
    let question_service = Arc::new(QuestionService::new(
        store.clone(),
        store.clone(),
        store,
    ));
    let auth_service = Arc::new(AuthService::new(tokens, SIGNING_SECRET.to_string()));

    AppState::new(
        question_service,
        question_cache,
        auth_service,
        Arc::new(OwnershipGate),
        cache,
    )
}
