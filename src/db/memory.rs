use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::auth::models::User;
use crate::db::catalog_repository::CatalogRepository;
use crate::db::models::{
    Document, DocumentId, HelpfulVote, Product, ProductId, ResolvedDocument, Revision,
    RevisionId, Topic, TopicId,
};
use crate::db::repository::{resolve_documents, DocumentFilter, DocumentRepository};
use crate::db::vote_repository::{tally_helpful, VoteRepository};
use crate::error::AppError;

#[derive(Default)]
struct Tables {
    products: Vec<Product>,
    topics: Vec<Topic>,
    documents: Vec<Document>,
    revisions: Vec<Revision>,
    votes: Vec<HelpfulVote>,
}

/// In-process store backing all three repositories.
///
/// Rows keep insertion order. Used by tests, the demo seeder and the
/// `--in-memory` server mode.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    document_queries: AtomicUsize,
    vote_queries: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `visible_documents` has run.
    pub fn document_queries(&self) -> usize {
        self.document_queries.load(Ordering::SeqCst)
    }

    /// How many times `helpful_counts` has run.
    pub fn vote_queries(&self) -> usize {
        self.vote_queries.load(Ordering::SeqCst)
    }

    pub fn add_product(&self, product: Product) {
        self.write(|t| upsert(&mut t.products, product, |p| p.id));
    }

    pub fn add_topic(&self, topic: Topic) {
        self.write(|t| upsert(&mut t.topics, topic, |x| x.id));
    }

    pub fn add_document(&self, document: Document) {
        self.write(|t| upsert(&mut t.documents, document, |d| d.id));
    }

    pub fn add_revision(&self, revision: Revision) {
        self.write(|t| upsert(&mut t.revisions, revision, |r| r.id));
    }

    pub fn add_vote(&self, vote: HelpfulVote) {
        self.write(|t| upsert(&mut t.votes, vote, |v| v.id));
    }

    fn write<F: FnOnce(&mut Tables)>(&self, f: F) {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        f(&mut tables);
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, AppError> {
        self.tables
            .read()
            .map_err(|_| AppError::Database("memory store lock poisoned".into()))
    }

    fn resolve(tables: &Tables, docs: Vec<Document>) -> Vec<ResolvedDocument> {
        let parents: HashMap<DocumentId, Document> =
            tables.documents.iter().map(|d| (d.id, d.clone())).collect();
        let revisions: HashMap<RevisionId, Revision> =
            tables.revisions.iter().map(|r| (r.id, r.clone())).collect();
        let products: HashMap<ProductId, Product> =
            tables.products.iter().map(|p| (p.id, p.clone())).collect();

        resolve_documents(docs, &parents, &revisions, &products)
    }
}

fn upsert<T, F: Fn(&T) -> i64>(rows: &mut Vec<T>, row: T, key: F) {
    match rows.iter().position(|r| key(r) == key(&row)) {
        Some(i) => rows[i] = row,
        None => rows.push(row),
    }
}

#[async_trait]
impl DocumentRepository for MemoryStore {
    async fn visible_documents(
        &self,
        user: &User,
        filter: &DocumentFilter,
    ) -> Result<Vec<ResolvedDocument>, AppError> {
        self.document_queries.fetch_add(1, Ordering::SeqCst);

        let tables = self.read()?;
        let docs = tables
            .documents
            .iter()
            .filter(|d| filter.matches(d) && user.can_view(d))
            .cloned()
            .collect();

        Ok(Self::resolve(&tables, docs)
            .into_iter()
            .filter(|d| filter.matches_membership(d))
            .collect())
    }

    async fn find_by_id(&self, id: DocumentId) -> Result<Option<ResolvedDocument>, AppError> {
        let tables = self.read()?;
        let docs: Vec<Document> = tables
            .documents
            .iter()
            .filter(|d| d.id == id)
            .cloned()
            .collect();

        Ok(Self::resolve(&tables, docs).pop())
    }

    async fn find_by_slug(
        &self,
        locale: &str,
        slug: &str,
    ) -> Result<Option<ResolvedDocument>, AppError> {
        let tables = self.read()?;
        let docs: Vec<Document> = tables
            .documents
            .iter()
            .filter(|d| d.locale == locale && d.slug == slug)
            .cloned()
            .collect();

        Ok(Self::resolve(&tables, docs).pop())
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn find_product(&self, slug: &str) -> Result<Option<Product>, AppError> {
        Ok(self.read()?.products.iter().find(|p| p.slug == slug).cloned())
    }

    async fn find_topic(
        &self,
        product_id: ProductId,
        slug: &str,
    ) -> Result<Option<Topic>, AppError> {
        Ok(self
            .read()?
            .topics
            .iter()
            .find(|t| t.slug == slug && t.product_ids.contains(&product_id))
            .cloned())
    }

    async fn topic_by_id(&self, id: TopicId) -> Result<Option<Topic>, AppError> {
        Ok(self.read()?.topics.iter().find(|t| t.id == id).cloned())
    }

    async fn active_products(&self) -> Result<Vec<Product>, AppError> {
        let mut products: Vec<Product> = self
            .read()?
            .products
            .iter()
            .filter(|p| p.is_active())
            .cloned()
            .collect();
        products.sort_by_key(|p| (p.display_order, p.id));
        Ok(products)
    }

    async fn active_topics_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Topic>, AppError> {
        let mut topics: Vec<Topic> = self
            .read()?
            .topics
            .iter()
            .filter(|t| t.is_active() && t.product_ids.contains(&product_id))
            .cloned()
            .collect();
        topics.sort_by_key(|t| (t.display_order, t.id));
        Ok(topics)
    }
}

#[async_trait]
impl VoteRepository for MemoryStore {
    async fn helpful_counts(
        &self,
        revision_ids: &[RevisionId],
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<HashMap<RevisionId, u64>, AppError> {
        self.vote_queries.fetch_add(1, Ordering::SeqCst);

        Ok(tally_helpful(&self.read()?.votes, revision_ids, since, until))
    }
}
