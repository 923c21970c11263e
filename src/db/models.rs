use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type DocumentId = i64;
pub type RevisionId = i64;
pub type TopicId = i64;
pub type ProductId = i64;
pub type VoteId = i64;

/// Leading markup of a document whose body is only a redirect to another page.
pub const REDIRECT_HTML: &str = "<p>REDIRECT <a ";

/// A knowledge-base article in one locale.
///
/// Default-locale originals carry their own products and topics. Translations
/// point at their original through `parent_id`; whatever products or topics
/// are attached to a translation directly are ignored when filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    /// Locale tag, e.g. `en-US` or `de`.
    pub locale: String,
    pub title: String,
    pub slug: String,
    /// The default-locale original, present only on translations.
    #[serde(default)]
    pub parent_id: Option<DocumentId>,
    #[serde(default)]
    pub product_ids: Vec<ProductId>,
    #[serde(default)]
    pub topic_ids: Vec<TopicId>,
    /// Content category (troubleshooting, how-to, ...).
    pub category: i32,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_template: bool,
    /// Latest approved revision. Documents without one are never listed.
    #[serde(default)]
    pub current_revision_id: Option<RevisionId>,
    /// Author-set manual ordering. Lower values come first.
    #[serde(default)]
    pub display_order: i32,
    /// Groups allowed to see this document. Empty means everyone.
    #[serde(default)]
    pub restricted_to_groups: Vec<String>,
    /// Rendered body, only inspected for redirects.
    #[serde(default)]
    pub html: String,
}

impl Document {
    /// Canonical URL of the document.
    pub fn url(&self) -> String {
        format!("/{}/kb/{}", self.locale, self.slug)
    }

    pub fn is_redirect(&self) -> bool {
        self.html.starts_with(REDIRECT_HTML)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    #[serde(rename = "_id")]
    pub id: RevisionId,
    pub document_id: DocumentId,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(rename = "_id")]
    pub id: TopicId,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub parent_id: Option<TopicId>,
    #[serde(default)]
    pub product_ids: Vec<ProductId>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub display_order: i32,
}

impl Topic {
    pub fn is_active(&self) -> bool {
        !self.is_archived
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub display_order: i32,
}

impl Product {
    pub fn is_active(&self) -> bool {
        !self.is_archived
    }

    pub fn url(&self, locale: &str) -> String {
        format!("/{}/products/{}", locale, self.slug)
    }
}

/// A reader's "was this article helpful?" answer for one revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpfulVote {
    #[serde(rename = "_id")]
    pub id: VoteId,
    pub revision_id: RevisionId,
    pub helpful: bool,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created: DateTime<Utc>,
}

/// A document as handed out by the document store, with the relations the
/// facets need already loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDocument {
    pub document: Document,
    /// The default-locale original, for translations.
    pub parent: Option<Document>,
    pub current_revision: Option<Revision>,
    /// Effective products: the parent's for translations, otherwise the
    /// document's own.
    pub products: Vec<Product>,
}

fn default_true() -> bool {
    true
}

/// Slugs from the root of the topic tree down to `topic`.
///
/// `lookup` resolves parent topics; a parent it cannot resolve ends the walk.
pub fn topic_path<'a, F>(topic: &'a Topic, lookup: F) -> Vec<String>
where
    F: Fn(TopicId) -> Option<&'a Topic>,
{
    let mut path = vec![topic.slug.clone()];
    let mut current = topic;
    while let Some(parent) = current.parent_id.and_then(&lookup) {
        // Guard against cycles in malformed data.
        if path.len() > 32 {
            break;
        }
        path.push(parent.slug.clone());
        current = parent;
    }
    path.reverse();
    path
}

/// URL of a topic page, scoped to a product when one is given.
pub fn topic_url(locale: &str, path: &[String], product_slug: Option<&str>) -> String {
    match product_slug {
        Some(product) => format!("/{}/products/{}/{}", locale, product, path.join("/")),
        None => format!(
            "/{}/topics/{}",
            locale,
            path.last().map(String::as_str).unwrap_or_default()
        ),
    }
}
