#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};

use kbfacets::app::AppState;
use kbfacets::cache::store::{ManualClock, MemoryCache};
use kbfacets::config::FacetsSettings;
use kbfacets::db::memory::MemoryStore;
use kbfacets::db::models::{
    Document, DocumentId, HelpfulVote, Product, ProductId, Revision, Topic, TopicId,
};
use kbfacets::facets::service::FacetsService;

pub const DEFAULT_LOCALE: &str = "en-US";

/// Fixed "now" shared by the clock and the fixtures.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// In-memory store, cache and clock plus the Axum router wired to them.
pub struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryCache>,
    pub clock: Arc<ManualClock>,
    pub state: AppState,
    pub router: Router,
    next_vote_id: std::sync::atomic::AtomicI64,
}

impl TestEnv {
    /// Environment with the demo login routes enabled.
    pub fn new() -> Self {
        Self::build(true)
    }

    /// Environment as deployed by default: no demo routes, every caller anonymous.
    pub fn without_demo_mode() -> Self {
        Self::build(false)
    }

    fn build(demo_mode: bool) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let cache = Arc::new(MemoryCache::new(clock.clone()));
        let state = AppState::in_memory(
            store.clone(),
            cache.clone(),
            clock.clone(),
            FacetsSettings::default(),
        )
        .with_demo_mode(demo_mode);
        let router = kbfacets::app::router(state.clone());

        Self {
            store,
            cache,
            clock,
            state,
            router,
            next_vote_id: std::sync::atomic::AtomicI64::new(1),
        }
    }

    pub fn facets(&self) -> &FacetsService {
        &self.state.facets
    }

    /// Build an `axum_test::TestServer` from this environment's router.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .save_cookies()
            .expect_success_by_default()
            .try_build(self.router.clone())
            .expect("Failed to build TestServer")
    }

    /// Build a `TestServer` that does NOT expect success by default (for error tests).
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .save_cookies()
            .try_build(self.router.clone())
            .expect("Failed to build TestServer")
    }

    pub fn product(&self, id: ProductId, slug: &str, title: &str) -> Product {
        let product = Product {
            id,
            slug: slug.to_string(),
            title: title.to_string(),
            is_archived: false,
            display_order: id as i32,
        };
        self.store.add_product(product.clone());
        product
    }

    pub fn topic(
        &self,
        id: TopicId,
        slug: &str,
        parent_id: Option<TopicId>,
        product_ids: &[ProductId],
    ) -> Topic {
        let topic = Topic {
            id,
            slug: slug.to_string(),
            title: slug.replace('-', " "),
            parent_id,
            product_ids: product_ids.to_vec(),
            visible: true,
            is_archived: false,
            display_order: id as i32,
        };
        self.store.add_topic(topic.clone());
        topic
    }

    /// Insert a listable default-locale article with a current revision
    /// whose id equals `id * 10`.
    pub fn article(
        &self,
        id: DocumentId,
        products: &[ProductId],
        topics: &[TopicId],
        display_order: i32,
    ) -> Document {
        let doc = Document {
            id,
            locale: DEFAULT_LOCALE.to_string(),
            title: format!("Article {id}"),
            slug: format!("article-{id}"),
            parent_id: None,
            product_ids: products.to_vec(),
            topic_ids: topics.to_vec(),
            category: 10,
            is_archived: false,
            is_template: false,
            current_revision_id: Some(id * 10),
            display_order,
            restricted_to_groups: Vec::new(),
            html: format!("<p>Article {id}</p>"),
        };
        self.store.add_revision(Revision {
            id: id * 10,
            document_id: id,
            created: start_time() - Duration::days(3),
            summary: format!("Summary of article {id}"),
        });
        self.store.add_document(doc.clone());
        doc
    }

    /// Insert a translation of `parent` into `locale`.
    pub fn translation(&self, id: DocumentId, parent: &Document, locale: &str) -> Document {
        let doc = Document {
            id,
            locale: locale.to_string(),
            title: format!("{} ({locale})", parent.title),
            slug: format!("{}-{locale}", parent.slug),
            parent_id: Some(parent.id),
            product_ids: Vec::new(),
            topic_ids: Vec::new(),
            category: parent.category,
            is_archived: false,
            is_template: false,
            current_revision_id: Some(id * 10),
            display_order: 0,
            restricted_to_groups: Vec::new(),
            html: String::new(),
        };
        self.store.add_revision(Revision {
            id: id * 10,
            document_id: id,
            created: start_time() - Duration::days(1),
            summary: format!("Translated summary {id}"),
        });
        self.store.add_document(doc.clone());
        doc
    }

    /// Record `count` helpful votes on the current revision of `doc`, cast
    /// `days_ago` days before the start time.
    pub fn helpful_votes(&self, doc: &Document, count: usize, days_ago: i64) {
        let Some(revision_id) = doc.current_revision_id else {
            return;
        };
        for _ in 0..count {
            let id = self
                .next_vote_id
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.store.add_vote(HelpfulVote {
                id,
                revision_id,
                helpful: true,
                created: start_time() - Duration::days(days_ago),
            });
        }
    }

    /// Log in as one of the demo users on `server`.
    pub async fn login(&self, server: &axum_test::TestServer, username: &str) {
        server
            .post("/api/auth/login")
            .json(&serde_json::json!({
                "username": username,
                "password": username
            }))
            .await;
    }
}

/// Ids of a listing, in order.
pub fn ids(listing: &serde_json::Value) -> Vec<i64> {
    listing
        .as_array()
        .map(|items| items.iter().filter_map(|d| d["id"].as_i64()).collect())
        .unwrap_or_default()
}
