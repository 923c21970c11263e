//! Membership rules for translated documents.
//!
//! A translation is filed under its original: its products, topics and
//! display order are always read from the parent, whatever is attached to
//! the translation row itself.

use crate::db::models::{Document, ProductId, ResolvedDocument, TopicId};

/// Products used for filtering `doc`.
///
/// A translation whose parent is unknown has no effective products.
pub fn effective_product_ids<'a>(doc: &'a Document, parent: Option<&'a Document>) -> &'a [ProductId] {
    match (doc.parent_id, parent) {
        (None, _) => &doc.product_ids,
        (Some(_), Some(parent)) => &parent.product_ids,
        (Some(_), None) => &[],
    }
}

/// Topics used for filtering `doc`.
pub fn effective_topic_ids<'a>(doc: &'a Document, parent: Option<&'a Document>) -> &'a [TopicId] {
    match (doc.parent_id, parent) {
        (None, _) => &doc.topic_ids,
        (Some(_), Some(parent)) => &parent.topic_ids,
        (Some(_), None) => &[],
    }
}

/// Display order of the root of the translation chain.
pub fn root_display_order(doc: &Document, parent: Option<&Document>) -> i32 {
    match parent {
        Some(parent) if doc.parent_id.is_some() => parent.display_order,
        _ => doc.display_order,
    }
}

impl ResolvedDocument {
    pub fn effective_product_ids(&self) -> &[ProductId] {
        effective_product_ids(&self.document, self.parent.as_ref())
    }

    pub fn effective_topic_ids(&self) -> &[TopicId] {
        effective_topic_ids(&self.document, self.parent.as_ref())
    }

    pub fn display_order(&self) -> i32 {
        root_display_order(&self.document, self.parent.as_ref())
    }

    /// Effective product titles, sorted and joined with `", "`.
    pub fn product_titles(&self) -> String {
        let mut titles: Vec<&str> = self.products.iter().map(|p| p.title.as_str()).collect();
        titles.sort_unstable();
        titles.join(", ")
    }

    /// True when the effective topics include at least one of `topic_ids`.
    /// An empty `topic_ids` matches everything.
    pub fn has_any_topic(&self, topic_ids: &[TopicId]) -> bool {
        topic_ids.is_empty()
            || self
                .effective_topic_ids()
                .iter()
                .any(|id| topic_ids.contains(id))
    }

    /// True when the effective products include every one of `product_ids`.
    pub fn has_all_products(&self, product_ids: &[ProductId]) -> bool {
        let effective = self.effective_product_ids();
        product_ids.iter().all(|id| effective.contains(id))
    }
}
