use async_trait::async_trait;

use crate::db::models::{Product, ProductId, Topic, TopicId};
use crate::error::AppError;

/// Repository trait for products and their topic trees.
///
/// This trait allows mocking the database layer in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Find a product by slug, active or not.
    async fn find_product(&self, slug: &str) -> Result<Option<Product>, AppError>;

    /// Find a topic of `product_id` by slug, active or not.
    async fn find_topic(
        &self,
        product_id: ProductId,
        slug: &str,
    ) -> Result<Option<Topic>, AppError>;

    /// Find a topic by id.
    async fn topic_by_id(&self, id: TopicId) -> Result<Option<Topic>, AppError>;

    /// All active products, by display order.
    async fn active_products(&self) -> Result<Vec<Product>, AppError>;

    /// Active topics attached to `product_id`, by display order then id.
    async fn active_topics_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Topic>, AppError>;
}

/// MongoDB implementation of the CatalogRepository.
#[cfg(feature = "server")]
pub struct MongoCatalogRepository {
    products: mongodb::Collection<Product>,
    topics: mongodb::Collection<Topic>,
}

#[cfg(feature = "server")]
impl MongoCatalogRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            products: db.collection("products"),
            topics: db.collection("topics"),
        }
    }

    /// Insert or replace a product (matched by id).
    pub async fn upsert_product(&self, product: &Product) -> Result<(), AppError> {
        use mongodb::bson::doc;
        use mongodb::options::ReplaceOptions;

        let options = ReplaceOptions::builder().upsert(true).build();
        self.products
            .replace_one(doc! { "_id": product.id }, product)
            .with_options(options)
            .await?;
        Ok(())
    }

    /// Insert or replace a topic (matched by id).
    pub async fn upsert_topic(&self, topic: &Topic) -> Result<(), AppError> {
        use mongodb::bson::doc;
        use mongodb::options::ReplaceOptions;

        let options = ReplaceOptions::builder().upsert(true).build();
        self.topics
            .replace_one(doc! { "_id": topic.id }, topic)
            .with_options(options)
            .await?;
        Ok(())
    }
}

#[cfg(feature = "server")]
#[async_trait]
impl CatalogRepository for MongoCatalogRepository {
    async fn find_product(&self, slug: &str) -> Result<Option<Product>, AppError> {
        use mongodb::bson::doc;

        Ok(self.products.find_one(doc! { "slug": slug }).await?)
    }

    async fn find_topic(
        &self,
        product_id: ProductId,
        slug: &str,
    ) -> Result<Option<Topic>, AppError> {
        use mongodb::bson::doc;

        Ok(self
            .topics
            .find_one(doc! { "slug": slug, "product_ids": product_id })
            .await?)
    }

    async fn topic_by_id(&self, id: TopicId) -> Result<Option<Topic>, AppError> {
        use mongodb::bson::doc;

        Ok(self.topics.find_one(doc! { "_id": id }).await?)
    }

    async fn active_products(&self) -> Result<Vec<Product>, AppError> {
        use mongodb::bson::doc;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder()
            .sort(doc! { "display_order": 1, "_id": 1 })
            .build();

        let cursor = self
            .products
            .find(doc! { "is_archived": { "$ne": true } })
            .with_options(options)
            .await?;

        crate::db::repository::collect_cursor(cursor).await
    }

    async fn active_topics_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Topic>, AppError> {
        use mongodb::bson::doc;
        use mongodb::options::FindOptions;

        // "product_ids" matches array membership.
        let filter = doc! {
            "product_ids": product_id,
            "is_archived": { "$ne": true },
        };
        let options = FindOptions::builder()
            .sort(doc! { "display_order": 1, "_id": 1 })
            .build();

        let cursor = self.topics.find(filter).with_options(options).await?;

        crate::db::repository::collect_cursor(cursor).await
    }
}
