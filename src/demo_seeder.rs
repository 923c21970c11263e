use chrono::{Duration, Utc};

use crate::db::memory::MemoryStore;
use crate::db::models::{Document, HelpfulVote, Product, Revision, Topic};

/// Fill `store` with a small catalog: two products, a topic tree, English
/// articles with German translations, and some helpful votes.
pub fn seed_demo_data(store: &MemoryStore) {
    tracing::info!("Starting demo data seeding...");

    let products = [(1, "firefox", "Firefox", 1), (2, "mobile", "Firefox for Android", 2)];
    for (id, slug, title, order) in products {
        store.add_product(Product {
            id,
            slug: slug.to_string(),
            title: title.to_string(),
            is_archived: false,
            display_order: order,
        });
    }

    let topics = [
        (10, "get-started", "Get started", None, vec![1, 2]),
        (11, "install", "Install and update", Some(10), vec![1, 2]),
        (20, "privacy", "Privacy and security", None, vec![1]),
        (21, "passwords", "Passwords", Some(20), vec![1]),
    ];
    for (order, (id, slug, title, parent_id, product_ids)) in topics.into_iter().enumerate() {
        store.add_topic(Topic {
            id,
            slug: slug.to_string(),
            title: title.to_string(),
            parent_id,
            product_ids,
            visible: true,
            is_archived: false,
            display_order: order as i32,
        });
    }

    // (id, slug, title, products, topics, display order, restricted groups)
    let articles: [(i64, &str, &str, Vec<i64>, Vec<i64>, i32, &[&str]); 5] = [
        (100, "install-firefox", "Install Firefox", vec![1], vec![10, 11], 1, &[]),
        (101, "update-firefox", "Update Firefox", vec![1, 2], vec![11], 2, &[]),
        (102, "private-browsing", "Private browsing", vec![1], vec![20], 1, &[]),
        (103, "password-manager", "Password manager", vec![1], vec![21], 2, &[]),
        (104, "staff-rollout", "Staff rollout notes", vec![1], vec![10], 3, &["staff"]),
    ];

    let now = Utc::now();
    let mut revision_id = 1000;
    let mut vote_id = 1;

    for (id, slug, title, product_ids, topic_ids, display_order, groups) in articles {
        revision_id += 1;
        store.add_revision(Revision {
            id: revision_id,
            document_id: id,
            created: now - Duration::days(id - 90),
            summary: format!("How to {}.", title.to_lowercase()),
        });
        store.add_document(Document {
            id,
            locale: "en-US".to_string(),
            title: title.to_string(),
            slug: slug.to_string(),
            parent_id: None,
            product_ids,
            topic_ids,
            category: 10,
            is_archived: false,
            is_template: false,
            current_revision_id: Some(revision_id),
            display_order,
            restricted_to_groups: groups.iter().map(|g| g.to_string()).collect(),
            html: format!("<h1>{title}</h1>"),
        });

        for helpful in [true, true, id % 2 == 0] {
            vote_id += 1;
            store.add_vote(HelpfulVote {
                id: vote_id,
                revision_id,
                helpful,
                created: now - Duration::days(1),
            });
        }
    }

    let translations = [
        (200, 100, "firefox-installieren", "Firefox installieren"),
        (201, 102, "privater-modus", "Privater Modus"),
    ];
    for (id, parent_id, slug, title) in translations {
        revision_id += 1;
        store.add_revision(Revision {
            id: revision_id,
            document_id: id,
            created: now - Duration::days(2),
            summary: format!("{title}."),
        });
        store.add_document(Document {
            id,
            locale: "de".to_string(),
            title: title.to_string(),
            slug: slug.to_string(),
            parent_id: Some(parent_id),
            product_ids: Vec::new(),
            topic_ids: Vec::new(),
            category: 10,
            is_archived: false,
            is_template: false,
            current_revision_id: Some(revision_id),
            display_order: 0,
            restricted_to_groups: Vec::new(),
            html: format!("<h1>{title}</h1>"),
        });
    }

    tracing::info!("Demo data seeding completed.");
}
