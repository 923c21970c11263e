use serde::{Deserialize, Serialize};

use crate::auth::models::User;
use crate::db::models::{DocumentId, ResolvedDocument};
use crate::db::repository::DocumentFilter;
use crate::error::AppError;
use crate::facets::service::FacetsService;

/// Query string of `GET /api/v1/documents`.
#[derive(Debug, Default, Deserialize)]
pub struct DocumentListQuery {
    pub locale: Option<String>,
    pub product: Option<String>,
    pub topic: Option<String>,
    pub is_template: Option<String>,
    pub is_archived: Option<String>,
    pub is_redirect: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentShort {
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDetail {
    pub id: DocumentId,
    pub title: String,
    pub slug: String,
    pub url: String,
    pub locale: String,
    pub products: Vec<String>,
    pub topics: Vec<String>,
    pub summary: String,
    pub html: String,
}

/// Boolean query flag: on whenever present with a non-empty value, so
/// `?is_archived=0` selects archived documents.
fn flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

/// Documents of one locale in the default categories.
///
/// Product and topic filters look at the parent for translations.
pub async fn list_documents(
    facets: &FacetsService,
    user: &User,
    query: &DocumentListQuery,
) -> Result<Vec<DocumentShort>, AppError> {
    if query.topic.is_some() && query.product.is_none() {
        return Err(AppError::BadRequest("topic requires product".into()));
    }

    let locale = query
        .locale
        .as_deref()
        .unwrap_or(&facets.settings.default_locale);
    let mut filter = DocumentFilter {
        locale: Some(locale.to_string()),
        is_archived: Some(flag(query.is_archived.as_deref())),
        is_template: Some(flag(query.is_template.as_deref())),
        require_current_revision: false,
        categories: Some(facets.settings.default_categories.clone()),
        products: Vec::new(),
        topics: Vec::new(),
    };
    let is_redirect = flag(query.is_redirect.as_deref());

    if let Some(product_slug) = query.product.as_deref() {
        let Some(product) = facets.catalog.find_product(product_slug).await? else {
            return Ok(Vec::new());
        };
        filter.products = vec![product.id];

        if let Some(topic_slug) = query.topic.as_deref() {
            match facets.catalog.find_topic(product.id, topic_slug).await? {
                Some(topic) => filter.topics = vec![topic.id],
                None => return Ok(Vec::new()),
            }
        }
    }

    let docs: Vec<ResolvedDocument> = facets
        .documents
        .visible_documents(user, &filter)
        .await?
        .into_iter()
        .filter(|d| d.document.is_redirect() == is_redirect)
        .collect();

    Ok(docs
        .into_iter()
        .map(|d| DocumentShort {
            title: d.document.title,
            slug: d.document.slug,
        })
        .collect())
}

/// A single document the caller may see, with product and topic slugs.
pub async fn document_detail(
    facets: &FacetsService,
    user: &User,
    locale: &str,
    slug: &str,
) -> Result<DocumentDetail, AppError> {
    let resolved = facets
        .documents
        .find_by_slug(locale, slug)
        .await?
        .filter(|d| user.can_view(&d.document))
        .ok_or_else(|| AppError::NotFound(format!("Document '{locale}/{slug}' not found")))?;

    let mut topics = Vec::new();
    for id in resolved.effective_topic_ids() {
        if let Some(topic) = facets.catalog.topic_by_id(*id).await? {
            if topic.is_active() {
                topics.push(topic.slug);
            }
        }
    }

    let products = resolved
        .products
        .iter()
        .filter(|p| p.is_active())
        .map(|p| p.slug.clone())
        .collect();
    let summary = resolved
        .current_revision
        .as_ref()
        .map(|r| r.summary.clone())
        .unwrap_or_default();
    let doc = resolved.document;

    Ok(DocumentDetail {
        url: doc.url(),
        id: doc.id,
        title: doc.title,
        slug: doc.slug,
        locale: doc.locale,
        products,
        topics,
        summary,
        html: doc.html,
    })
}

/// `GET /api/v1/documents`
#[cfg(feature = "server")]
pub async fn list_documents_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::extract::Query(query): axum::extract::Query<DocumentListQuery>,
    jar: axum_extra::extract::CookieJar,
) -> Result<axum::Json<Vec<DocumentShort>>, AppError> {
    let user = state.caller(&jar);
    let docs = list_documents(&state.facets, &user, &query).await?;
    Ok(axum::Json(docs))
}

/// `GET /api/v1/documents/{locale}/{slug}`
#[cfg(feature = "server")]
pub async fn document_detail_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::extract::Path((locale, slug)): axum::extract::Path<(String, String)>,
    jar: axum_extra::extract::CookieJar,
) -> Result<axum::Json<DocumentDetail>, AppError> {
    let user = state.caller(&jar);
    let detail = document_detail(&state.facets, &user, &locale, &slug).await?;
    Ok(axum::Json(detail))
}
