use sha2::{Digest, Sha256};

use crate::db::models::{Product, Topic};

/// Prefix of the cached anonymous result list.
pub const DOCUMENTS_PREFIX: &str = "documents_for_v2";
/// Prefix of the cached helpful-vote aggregate.
pub const VOTES_PREFIX: &str = "votes_for";

/// Stable hash of a facets query: locale plus the sorted topic and product
/// slugs. Argument order does not matter.
pub fn fingerprint(locale: &str, topics: &[Topic], products: &[Product]) -> String {
    let mut topic_slugs: Vec<&str> = topics.iter().map(|t| t.slug.as_str()).collect();
    topic_slugs.sort_unstable();
    let mut product_slugs: Vec<&str> = products.iter().map(|p| p.slug.as_str()).collect();
    product_slugs.sort_unstable();

    let key = format!(
        "{}:{}:{}:new",
        locale,
        topic_slugs.join(","),
        product_slugs.join(",")
    );

    hex::encode(Sha256::digest(key.as_bytes()))
}

pub fn documents_key(fingerprint: &str) -> String {
    format!("{DOCUMENTS_PREFIX}:{fingerprint}")
}

pub fn votes_key(fingerprint: &str) -> String {
    format!("{VOTES_PREFIX}:{fingerprint}")
}
