use std::collections::HashMap;

use async_trait::async_trait;

use crate::auth::models::User;
use crate::db::models::{
    Document, DocumentId, Product, ProductId, ResolvedDocument, Revision, RevisionId, TopicId,
};
use crate::error::AppError;
use crate::facets::effective::effective_product_ids;

/// Document query: every set field must match.
///
/// `products` and `topics` test effective membership, so a translation is
/// matched on its parent's products and topics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    pub locale: Option<String>,
    pub is_archived: Option<bool>,
    pub is_template: Option<bool>,
    /// Only documents with a current revision.
    pub require_current_revision: bool,
    /// Allowed content categories. `None` allows any.
    pub categories: Option<Vec<i32>>,
    /// Products a document must all belong to. Empty allows any.
    pub products: Vec<ProductId>,
    /// Topics of which a document needs at least one. Empty allows any.
    pub topics: Vec<TopicId>,
}

impl DocumentFilter {
    /// Filter used by the facets: one locale, not archived, with a current
    /// revision, in the given categories.
    pub fn listable(locale: &str, categories: &[i32]) -> Self {
        Self {
            locale: Some(locale.to_string()),
            is_archived: Some(false),
            is_template: None,
            require_current_revision: true,
            categories: Some(categories.to_vec()),
            products: Vec::new(),
            topics: Vec::new(),
        }
    }

    /// Restrict to documents filed under all of `products` and any of `topics`.
    pub fn with_membership(mut self, topics: &[TopicId], products: &[ProductId]) -> Self {
        self.topics = topics.to_vec();
        self.products = products.to_vec();
        self
    }

    pub fn has_membership(&self) -> bool {
        !self.topics.is_empty() || !self.products.is_empty()
    }

    /// Effective topic and product test, on a document with its parent loaded.
    pub fn matches_membership(&self, doc: &ResolvedDocument) -> bool {
        doc.has_any_topic(&self.topics) && doc.has_all_products(&self.products)
    }

    /// Row-level test. Membership is checked by [`Self::matches_membership`].
    pub fn matches(&self, doc: &Document) -> bool {
        self.locale.as_ref().map_or(true, |l| &doc.locale == l)
            && self.is_archived.map_or(true, |a| doc.is_archived == a)
            && self.is_template.map_or(true, |t| doc.is_template == t)
            && (!self.require_current_revision || doc.current_revision_id.is_some())
            && self
                .categories
                .as_ref()
                .map_or(true, |c| c.contains(&doc.category))
    }
}

/// Repository trait for reading knowledge-base documents.
///
/// This trait allows mocking the database layer in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Documents matching `filter` that `user` is allowed to see, with parent,
    /// current revision and effective products loaded.
    async fn visible_documents(
        &self,
        user: &User,
        filter: &DocumentFilter,
    ) -> Result<Vec<ResolvedDocument>, AppError>;

    /// Find a document by id, regardless of visibility.
    async fn find_by_id(&self, id: DocumentId) -> Result<Option<ResolvedDocument>, AppError>;

    /// Find a document by locale and slug, regardless of visibility.
    async fn find_by_slug(
        &self,
        locale: &str,
        slug: &str,
    ) -> Result<Option<ResolvedDocument>, AppError>;
}

/// Attach parents, current revisions and effective products to `docs`.
///
/// Lookups that miss leave the relation empty; a translation whose parent is
/// missing therefore has no effective products.
pub fn resolve_documents(
    docs: Vec<Document>,
    parents: &HashMap<DocumentId, Document>,
    revisions: &HashMap<RevisionId, Revision>,
    products: &HashMap<ProductId, Product>,
) -> Vec<ResolvedDocument> {
    docs.into_iter()
        .map(|document| {
            let parent = document.parent_id.and_then(|id| parents.get(&id)).cloned();
            let current_revision = document
                .current_revision_id
                .and_then(|id| revisions.get(&id))
                .cloned();
            let effective = effective_product_ids(&document, parent.as_ref())
                .iter()
                .filter_map(|id| products.get(id))
                .cloned()
                .collect();

            ResolvedDocument {
                document,
                parent,
                current_revision,
                products: effective,
            }
        })
        .collect()
}

/// MongoDB implementation of the DocumentRepository.
///
/// This is only available when the `server` feature is enabled.
#[cfg(feature = "server")]
pub struct MongoDocumentRepository {
    documents: mongodb::Collection<Document>,
    revisions: mongodb::Collection<Revision>,
    products: mongodb::Collection<Product>,
}

#[cfg(feature = "server")]
impl MongoDocumentRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            documents: db.collection("documents"),
            revisions: db.collection("revisions"),
            products: db.collection("products"),
        }
    }

    /// Insert or replace a document (matched by id).
    pub async fn upsert_document(&self, doc: &Document) -> Result<(), AppError> {
        use mongodb::bson::doc;
        use mongodb::options::ReplaceOptions;

        let options = ReplaceOptions::builder().upsert(true).build();
        self.documents
            .replace_one(doc! { "_id": doc.id }, doc)
            .with_options(options)
            .await?;
        Ok(())
    }

    /// Insert or replace a revision (matched by id).
    pub async fn upsert_revision(&self, revision: &Revision) -> Result<(), AppError> {
        use mongodb::bson::doc;
        use mongodb::options::ReplaceOptions;

        let options = ReplaceOptions::builder().upsert(true).build();
        self.revisions
            .replace_one(doc! { "_id": revision.id }, revision)
            .with_options(options)
            .await?;
        Ok(())
    }

    async fn resolve(&self, docs: Vec<Document>) -> Result<Vec<ResolvedDocument>, AppError> {
        use mongodb::bson::doc;

        let mut parent_ids: Vec<DocumentId> = docs.iter().filter_map(|d| d.parent_id).collect();
        parent_ids.sort_unstable();
        parent_ids.dedup();

        let parents: HashMap<DocumentId, Document> = if parent_ids.is_empty() {
            HashMap::new()
        } else {
            let cursor = self
                .documents
                .find(doc! { "_id": { "$in": parent_ids } })
                .await?;
            collect_cursor(cursor).await?.into_iter().map(|d| (d.id, d)).collect()
        };

        let revision_ids: Vec<RevisionId> =
            docs.iter().filter_map(|d| d.current_revision_id).collect();
        let revisions: HashMap<RevisionId, Revision> = if revision_ids.is_empty() {
            HashMap::new()
        } else {
            let cursor = self
                .revisions
                .find(doc! { "_id": { "$in": revision_ids } })
                .await?;
            collect_cursor(cursor).await?.into_iter().map(|r| (r.id, r)).collect()
        };

        let mut product_ids: Vec<ProductId> = docs
            .iter()
            .flat_map(|d| {
                effective_product_ids(d, d.parent_id.and_then(|id| parents.get(&id))).to_vec()
            })
            .collect();
        product_ids.sort_unstable();
        product_ids.dedup();

        let products: HashMap<ProductId, Product> = if product_ids.is_empty() {
            HashMap::new()
        } else {
            let cursor = self
                .products
                .find(doc! { "_id": { "$in": product_ids } })
                .await?;
            collect_cursor(cursor).await?.into_iter().map(|p| (p.id, p)).collect()
        };

        Ok(resolve_documents(docs, &parents, &revisions, &products))
    }
}

/// Drain a cursor into a vector.
#[cfg(feature = "server")]
pub(crate) async fn collect_cursor<T>(cursor: mongodb::Cursor<T>) -> Result<Vec<T>, AppError>
where
    T: serde::de::DeserializeOwned + Unpin + Send + Sync,
{
    use futures::TryStreamExt;

    cursor
        .try_collect()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

#[cfg(feature = "server")]
fn to_bson_filter(filter: &DocumentFilter) -> mongodb::bson::Document {
    use mongodb::bson::doc;

    let mut query = mongodb::bson::Document::new();
    if let Some(locale) = &filter.locale {
        query.insert("locale", locale.as_str());
    }
    if let Some(archived) = filter.is_archived {
        query.insert("is_archived", archived);
    }
    if let Some(template) = filter.is_template {
        query.insert("is_template", template);
    }
    if filter.require_current_revision {
        query.insert("current_revision_id", doc! { "$ne": null });
    }
    if let Some(categories) = &filter.categories {
        query.insert("category", doc! { "$in": categories.clone() });
    }
    query
}

/// Own membership test, only meaningful on originals.
#[cfg(feature = "server")]
fn membership_clause(filter: &DocumentFilter) -> mongodb::bson::Document {
    use mongodb::bson::doc;

    let mut clause = doc! { "parent_id": null };
    if !filter.products.is_empty() {
        clause.insert("product_ids", doc! { "$all": filter.products.clone() });
    }
    if !filter.topics.is_empty() {
        clause.insert("topic_ids", doc! { "$in": filter.topics.clone() });
    }
    clause
}

/// Restricted-group test for `user`. `None` when every document is visible.
#[cfg(feature = "server")]
fn visibility_clause(user: &User) -> Option<mongodb::bson::Document> {
    use mongodb::bson::doc;

    let unrestricted = doc! { "restricted_to_groups.0": { "$exists": false } };
    match user {
        User::Anonymous => Some(unrestricted),
        User::Authenticated(u) if u.is_superuser => None,
        User::Authenticated(u) => Some(doc! {
            "$or": [
                unrestricted,
                { "restricted_to_groups": { "$in": u.groups.clone() } },
            ]
        }),
    }
}

#[cfg(feature = "server")]
#[async_trait]
impl DocumentRepository for MongoDocumentRepository {
    async fn visible_documents(
        &self,
        user: &User,
        filter: &DocumentFilter,
    ) -> Result<Vec<ResolvedDocument>, AppError> {
        use mongodb::bson::{doc, Bson};

        let mut query = to_bson_filter(filter);
        let mut clauses: Vec<mongodb::bson::Document> = Vec::new();

        if filter.has_membership() {
            // Translations take their membership from the parent, so look up
            // the matching originals first.
            let membership = membership_clause(filter);
            let originals: Vec<DocumentId> = self
                .documents
                .distinct("_id", membership.clone())
                .await?
                .iter()
                .filter_map(Bson::as_i64)
                .collect();
            if originals.is_empty() {
                return Ok(Vec::new());
            }
            clauses.push(doc! {
                "$or": [
                    membership,
                    { "parent_id": { "$in": originals } },
                ]
            });
        }
        if let Some(visibility) = visibility_clause(user) {
            clauses.push(visibility);
        }
        if !clauses.is_empty() {
            query.insert("$and", clauses);
        }

        let cursor = self.documents.find(query).await?;
        let docs: Vec<Document> = collect_cursor(cursor)
            .await?
            .into_iter()
            .filter(|d| user.can_view(d))
            .collect();

        tracing::debug!(count = docs.len(), "Loaded visible documents");

        Ok(self
            .resolve(docs)
            .await?
            .into_iter()
            .filter(|d| filter.matches_membership(d))
            .collect())
    }

    async fn find_by_id(&self, id: DocumentId) -> Result<Option<ResolvedDocument>, AppError> {
        use mongodb::bson::doc;

        match self.documents.find_one(doc! { "_id": id }).await? {
            Some(found) => Ok(self.resolve(vec![found]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_by_slug(
        &self,
        locale: &str,
        slug: &str,
    ) -> Result<Option<ResolvedDocument>, AppError> {
        use mongodb::bson::doc;

        match self
            .documents
            .find_one(doc! { "locale": locale, "slug": slug })
            .await?
        {
            Some(found) => Ok(self.resolve(vec![found]).await?.pop()),
            None => Ok(None),
        }
    }
}
