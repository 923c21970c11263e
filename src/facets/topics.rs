use std::collections::HashMap;

use crate::auth::models::User;
use crate::config::FacetsSettings;
use crate::db::catalog_repository::CatalogRepository;
use crate::db::models::{Product, Topic, TopicId};
use crate::db::repository::{DocumentFilter, DocumentRepository};
use crate::error::AppError;

/// Which level of the topic tree to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParentFilter {
    /// No restriction on the parent.
    #[default]
    Any,
    /// Only root topics.
    Root,
    /// Only direct children of the given topic.
    Child(TopicId),
}

impl ParentFilter {
    pub fn admits(&self, topic: &Topic) -> bool {
        match self {
            ParentFilter::Any => true,
            ParentFilter::Root => topic.parent_id.is_none(),
            ParentFilter::Child(parent) => topic.parent_id == Some(*parent),
        }
    }
}

/// A topic with the number of listable documents filed under it.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicWithCount {
    pub topic: Topic,
    pub num_docs: u64,
}

/// Topics of `product` that have at least one document `user` can see.
///
/// Counts cover default-locale, non-archived documents with a current
/// revision in the default categories. Topics come back in catalog order.
pub async fn topics_for(
    documents: &dyn DocumentRepository,
    catalog: &dyn CatalogRepository,
    settings: &FacetsSettings,
    user: &User,
    product: &Product,
    parent: ParentFilter,
) -> Result<Vec<TopicWithCount>, AppError> {
    if !product.is_active() {
        tracing::debug!(product = %product.slug, "Inactive product has no topics");
        return Ok(Vec::new());
    }

    let filter = DocumentFilter::listable(&settings.default_locale, &settings.default_categories)
        .with_membership(&[], &[product.id]);
    let docs = documents.visible_documents(user, &filter).await?;

    let mut counts: HashMap<TopicId, u64> = HashMap::new();
    for doc in docs
        .iter()
        .map(|d| &d.document)
        .filter(|d| d.product_ids.contains(&product.id))
    {
        let mut topic_ids = doc.topic_ids.clone();
        topic_ids.sort_unstable();
        topic_ids.dedup();
        for id in topic_ids {
            *counts.entry(id).or_insert(0) += 1;
        }
    }

    let topics = catalog
        .active_topics_for_product(product.id)
        .await?
        .into_iter()
        .filter(|t| t.visible && parent.admits(t))
        .filter_map(|topic| {
            counts
                .get(&topic.id)
                .copied()
                .filter(|n| *n > 0)
                .map(|num_docs| TopicWithCount { topic, num_docs })
        })
        .collect();

    Ok(topics)
}
