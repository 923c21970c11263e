use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::auth::models::User;
use crate::cache::store::{CacheStore, Clock};
use crate::config::FacetsSettings;
use crate::db::models::{
    Document, DocumentId, Product, ProductId, ResolvedDocument, RevisionId, Topic, TopicId,
};
use crate::db::repository::{DocumentFilter, DocumentRepository};
use crate::db::vote_repository::VoteRepository;
use crate::error::AppError;
use crate::facets::cache_key::{documents_key, fingerprint, votes_key};

/// One ranked entry of an article listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub document_title: String,
    pub url: String,
    pub document_parent_id: Option<DocumentId>,
    /// Creation time of the current revision.
    pub created: DateTime<Utc>,
    /// Effective product titles, alphabetical, joined with `", "`.
    pub product_titles: String,
    pub document_summary: String,
    /// Display order of the root document of the translation chain.
    pub display_order: i32,
    /// Helpful votes on the current revision inside the vote window.
    pub helpful_votes: u64,
}

/// Result of [`DocumentSelector::documents_for`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetDocuments {
    /// Ranked documents in the requested locale.
    pub documents: Vec<DocumentSummary>,
    /// Default-locale documents without a translation among `documents`.
    /// `None` when the requested locale is the default one.
    pub fallback_documents: Option<Vec<DocumentSummary>>,
}

/// Builds ranked article listings, reading through the shared cache.
pub struct DocumentSelector<'a> {
    pub documents: &'a dyn DocumentRepository,
    pub votes: &'a dyn VoteRepository,
    pub cache: &'a dyn CacheStore,
    pub clock: &'a dyn Clock,
    pub settings: &'a FacetsSettings,
}

impl<'a> DocumentSelector<'a> {
    /// Documents of `locale` filed under any of `topics` and all of
    /// `products`, plus default-locale fallbacks for untranslated articles.
    ///
    /// `current_document`, when given, is left out of the listing if it is in
    /// `locale`, and its default-locale original is left out of the
    /// fallbacks.
    pub async fn documents_for(
        &self,
        user: &User,
        locale: &str,
        topics: &[Topic],
        products: &[Product],
        current_document: Option<&Document>,
    ) -> Result<FacetDocuments, AppError> {
        let mut documents = self.select(user, locale, topics, products).await?;

        if let Some(current) = current_document {
            if current.locale == locale {
                documents.retain(|d| d.id != current.id);
            }
        }

        if locale == self.settings.default_locale {
            return Ok(FacetDocuments {
                documents,
                fallback_documents: None,
            });
        }

        let default_documents = self
            .select(user, &self.settings.default_locale, topics, products)
            .await?;

        let mut translated: HashSet<DocumentId> =
            documents.iter().filter_map(|d| d.document_parent_id).collect();
        if let Some(current) = current_document {
            translated.insert(current.parent_id.unwrap_or(current.id));
        }

        let fallback_documents = default_documents
            .into_iter()
            .filter(|d| !translated.contains(&d.id))
            .collect();

        Ok(FacetDocuments {
            documents,
            fallback_documents: Some(fallback_documents),
        })
    }

    /// Ranked listing for one locale.
    ///
    /// Anonymous callers share a cached copy of the whole list; everyone
    /// else gets a fresh query because visibility depends on who is asking.
    async fn select(
        &self,
        user: &User,
        locale: &str,
        topics: &[Topic],
        products: &[Product],
    ) -> Result<Vec<DocumentSummary>, AppError> {
        let fp = fingerprint(locale, topics, products);
        let anonymous = !user.is_authenticated();
        let list_key = documents_key(&fp);

        if anonymous {
            if let Some(cached) = self.cache_get::<Vec<DocumentSummary>>(&list_key).await? {
                tracing::debug!(locale, key = %list_key, "Document list cache hit");
                return Ok(cached);
            }
        }

        let topic_ids: Vec<TopicId> = topics.iter().map(|t| t.id).collect();
        let product_ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();
        let filter = DocumentFilter::listable(locale, &self.settings.default_categories)
            .with_membership(&topic_ids, &product_ids);

        let matched: Vec<ResolvedDocument> = self
            .documents
            .visible_documents(user, &filter)
            .await?
            .into_iter()
            .filter(|d| filter.matches_membership(d))
            .collect();

        let votes = self.helpful_votes(&fp, &matched).await?;

        let mut summaries: Vec<DocumentSummary> = matched
            .iter()
            .filter_map(|d| summarize(d, &votes))
            .collect();
        sort_by_rank(&mut summaries);

        tracing::debug!(
            locale,
            count = summaries.len(),
            authenticated = !anonymous,
            "Computed document list"
        );

        if anonymous {
            self.cache_set(&list_key, &summaries, self.settings.default_timeout())
                .await?;
        }

        Ok(summaries)
    }

    /// Helpful votes per current revision, cached per fingerprint regardless
    /// of who is asking.
    async fn helpful_votes(
        &self,
        fp: &str,
        matched: &[ResolvedDocument],
    ) -> Result<HashMap<RevisionId, u64>, AppError> {
        let key = votes_key(fp);
        if let Some(cached) = self.cache_get::<HashMap<RevisionId, u64>>(&key).await? {
            tracing::debug!(key = %key, "Vote aggregate cache hit");
            return Ok(cached);
        }

        let revision_ids: Vec<RevisionId> = matched
            .iter()
            .filter_map(|d| d.document.current_revision_id)
            .collect();
        let until = self.clock.now();
        let since = until - chrono::Duration::days(self.settings.vote_window_days);

        let counts = self.votes.helpful_counts(&revision_ids, since, until).await?;
        self.cache_set(&key, &counts, self.settings.long_timeout())
            .await?;

        Ok(counts)
    }

    async fn cache_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        let Some(bytes) = self.cache.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, "Discarding undecodable cache entry: {e}");
                Ok(None)
            }
        }
    }

    async fn cache_set<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        timeout: Duration,
    ) -> Result<(), AppError> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| AppError::Internal(format!("Failed to encode cache entry: {e}")))?;
        self.cache.set(key, bytes, timeout).await
    }
}

/// Listing entry for `doc`, or `None` when its current revision is missing.
fn summarize(doc: &ResolvedDocument, votes: &HashMap<RevisionId, u64>) -> Option<DocumentSummary> {
    let revision = doc.current_revision.as_ref()?;

    Some(DocumentSummary {
        id: doc.document.id,
        document_title: doc.document.title.clone(),
        url: doc.document.url(),
        document_parent_id: doc.document.parent_id,
        created: revision.created,
        product_titles: doc.product_titles(),
        document_summary: revision.summary.clone(),
        display_order: doc.display_order(),
        helpful_votes: votes.get(&revision.id).copied().unwrap_or(0),
    })
}

/// Ascending display order, then descending helpful votes. Stable.
pub fn sort_by_rank(summaries: &mut [DocumentSummary]) {
    summaries.sort_by_key(|d| (d.display_order, Reverse(d.helpful_votes)));
}
