use serde::{Deserialize, Serialize};

use crate::auth::models::User;
use crate::db::models::{
    topic_path, topic_url, DocumentId, Product, ProductId, Topic, TopicId,
};
use crate::error::AppError;
use crate::facets::documents::FacetDocuments;
use crate::facets::service::FacetsService;
use crate::facets::topics::ParentFilter;

/// Query string of `GET /api/v1/products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub locale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub slug: String,
    pub title: String,
    pub url: String,
}

/// Query string of `GET /api/v1/products/{product}/topics`.
#[derive(Debug, Default, Deserialize)]
pub struct TopicsQuery {
    /// `root` for top-level topics, a topic slug for its children.
    pub parent: Option<String>,
    pub locale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicResponse {
    pub id: TopicId,
    pub slug: String,
    pub title: String,
    pub parent_id: Option<TopicId>,
    pub num_docs: u64,
    pub url: String,
}

/// Query string of `GET /api/v1/documents/facets`.
#[derive(Debug, Default, Deserialize)]
pub struct FacetsQuery {
    pub locale: Option<String>,
    /// Comma-separated topic slugs.
    pub topics: Option<String>,
    /// Comma-separated product slugs.
    pub products: Option<String>,
    /// Id of the document being viewed, excluded from the listing.
    pub current: Option<DocumentId>,
}

/// Split a comma-separated query value, dropping blanks.
pub fn split_slugs(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Active products in catalog order.
pub async fn list_products(
    facets: &FacetsService,
    query: &ProductsQuery,
) -> Result<Vec<ProductResponse>, AppError> {
    let locale = query
        .locale
        .as_deref()
        .unwrap_or(&facets.settings.default_locale);

    Ok(facets
        .catalog
        .active_products()
        .await?
        .into_iter()
        .map(|p| ProductResponse {
            url: p.url(locale),
            id: p.id,
            slug: p.slug,
            title: p.title,
        })
        .collect())
}

/// Topics of a product with their document counts.
///
/// An unknown or inactive product, or an unknown parent slug, gives an empty
/// list rather than an error.
pub async fn list_product_topics(
    facets: &FacetsService,
    user: &User,
    product_slug: &str,
    query: &TopicsQuery,
) -> Result<Vec<TopicResponse>, AppError> {
    let Some(product) = facets.catalog.find_product(product_slug).await? else {
        return Ok(Vec::new());
    };

    let parent = match query.parent.as_deref() {
        None | Some("") => ParentFilter::Any,
        Some("root") => ParentFilter::Root,
        Some(slug) => match facets.catalog.find_topic(product.id, slug).await? {
            Some(topic) => ParentFilter::Child(topic.id),
            None => return Ok(Vec::new()),
        },
    };

    let topics = facets.topics_for(user, &product, parent).await?;
    if topics.is_empty() {
        return Ok(Vec::new());
    }

    let locale = query
        .locale
        .as_deref()
        .unwrap_or(&facets.settings.default_locale);
    let tree = facets.catalog.active_topics_for_product(product.id).await?;

    Ok(topics
        .into_iter()
        .map(|t| {
            let path = topic_path(&t.topic, |id| tree.iter().find(|x| x.id == id));
            TopicResponse {
                url: topic_url(locale, &path, Some(&product.slug)),
                id: t.topic.id,
                slug: t.topic.slug,
                title: t.topic.title,
                parent_id: t.topic.parent_id,
                num_docs: t.num_docs,
            }
        })
        .collect())
}

/// Ranked documents for a locale and topic/product filters.
///
/// Topics require at least one product. Unknown or inactive products match
/// nothing; unknown topics are dropped, and if none of the requested topics
/// exist nothing matches.
pub async fn facet_documents(
    facets: &FacetsService,
    user: &User,
    query: &FacetsQuery,
) -> Result<FacetDocuments, AppError> {
    let locale = query
        .locale
        .clone()
        .unwrap_or_else(|| facets.settings.default_locale.clone());
    let topic_slugs = split_slugs(query.topics.as_deref());
    let product_slugs = split_slugs(query.products.as_deref());

    if !topic_slugs.is_empty() && product_slugs.is_empty() {
        return Err(AppError::BadRequest("topic requires product".into()));
    }

    let empty = || FacetDocuments {
        documents: Vec::new(),
        fallback_documents: (locale != facets.settings.default_locale).then(Vec::new),
    };

    let mut products: Vec<Product> = Vec::with_capacity(product_slugs.len());
    for slug in &product_slugs {
        match facets.catalog.find_product(slug).await? {
            Some(product) if product.is_active() => products.push(product),
            _ => {
                tracing::debug!(product = %slug, "Unknown or inactive product in facets query");
                return Ok(empty());
            }
        }
    }

    let mut topics: Vec<Topic> = Vec::with_capacity(topic_slugs.len());
    for slug in &topic_slugs {
        for product in &products {
            if let Some(topic) = facets.catalog.find_topic(product.id, slug).await? {
                if topic.is_active() && !topics.iter().any(|t| t.id == topic.id) {
                    topics.push(topic);
                }
                break;
            }
        }
    }
    if !topic_slugs.is_empty() && topics.is_empty() {
        return Ok(empty());
    }

    let current = match query.current {
        Some(id) => facets
            .documents
            .find_by_id(id)
            .await?
            .map(|resolved| resolved.document),
        None => None,
    };

    facets
        .documents_for(user, &locale, &topics, &products, current.as_ref())
        .await
}

/// `GET /api/v1/products`
#[cfg(feature = "server")]
pub async fn list_products_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::extract::Query(query): axum::extract::Query<ProductsQuery>,
) -> Result<axum::Json<Vec<ProductResponse>>, AppError> {
    let products = list_products(&state.facets, &query).await?;
    Ok(axum::Json(products))
}

/// `GET /api/v1/products/{product}/topics`
#[cfg(feature = "server")]
pub async fn product_topics_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::extract::Path(product): axum::extract::Path<String>,
    axum::extract::Query(query): axum::extract::Query<TopicsQuery>,
    jar: axum_extra::extract::CookieJar,
) -> Result<axum::Json<Vec<TopicResponse>>, AppError> {
    let user = state.caller(&jar);
    let topics = list_product_topics(&state.facets, &user, &product, &query).await?;
    Ok(axum::Json(topics))
}

/// `GET /api/v1/documents/facets`
#[cfg(feature = "server")]
pub async fn facet_documents_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::extract::Query(query): axum::extract::Query<FacetsQuery>,
    jar: axum_extra::extract::CookieJar,
) -> Result<axum::Json<FacetDocuments>, AppError> {
    let user = state.caller(&jar);
    let listing = facet_documents(&state.facets, &user, &query).await?;
    Ok(axum::Json(listing))
}
