use std::sync::Arc;

use crate::auth::models::User;
use crate::cache::store::{CacheStore, Clock};
use crate::config::FacetsSettings;
use crate::db::catalog_repository::CatalogRepository;
use crate::db::models::{Document, Product, Topic};
use crate::db::repository::DocumentRepository;
use crate::db::vote_repository::VoteRepository;
use crate::error::AppError;
use crate::facets::documents::{DocumentSelector, FacetDocuments};
use crate::facets::topics::{topics_for, ParentFilter, TopicWithCount};

/// Owns the collaborators of the facets and exposes both operations.
#[derive(Clone)]
pub struct FacetsService {
    pub documents: Arc<dyn DocumentRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub votes: Arc<dyn VoteRepository>,
    pub cache: Arc<dyn CacheStore>,
    pub clock: Arc<dyn Clock>,
    pub settings: FacetsSettings,
}

impl FacetsService {
    pub async fn topics_for(
        &self,
        user: &User,
        product: &Product,
        parent: ParentFilter,
    ) -> Result<Vec<TopicWithCount>, AppError> {
        topics_for(
            self.documents.as_ref(),
            self.catalog.as_ref(),
            &self.settings,
            user,
            product,
            parent,
        )
        .await
    }

    pub async fn documents_for(
        &self,
        user: &User,
        locale: &str,
        topics: &[Topic],
        products: &[Product],
        current_document: Option<&Document>,
    ) -> Result<FacetDocuments, AppError> {
        self.selector()
            .documents_for(user, locale, topics, products, current_document)
            .await
    }

    fn selector(&self) -> DocumentSelector<'_> {
        DocumentSelector {
            documents: self.documents.as_ref(),
            votes: self.votes.as_ref(),
            cache: self.cache.as_ref(),
            clock: self.clock.as_ref(),
            settings: &self.settings,
        }
    }
}
