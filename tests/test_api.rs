mod common;

/// Firefox with topics `get-started > install`, three English articles
/// (one restricted to staff) and a German translation of the first.
fn seed(env: &common::TestEnv) {
    env.product(1, "firefox", "Firefox");
    env.product(2, "mobile", "Android");
    env.topic(10, "get-started", None, &[1, 2]);
    env.topic(11, "install", Some(10), &[1, 2]);

    let first = env.article(1, &[1], &[10], 1);
    let second = env.article(2, &[1, 2], &[11], 1);
    env.helpful_votes(&second, 2, 1);

    let mut internal = env.article(3, &[1], &[11], 2);
    internal.restricted_to_groups = vec!["staff".to_string()];
    env.store.add_document(internal);

    env.translation(100, &first, "de");
}

#[tokio::test]
async fn facets_topic_requires_product() {
    let env = common::TestEnv::new();
    seed(&env);
    let server = env.server_permissive();

    let response = server
        .get("/api/v1/documents/facets")
        .add_query_param("topics", "install")
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"].as_str(), Some("topic requires product"));
}

#[tokio::test]
async fn facets_lists_ranked_documents() {
    let env = common::TestEnv::new();
    seed(&env);
    let server = env.server();

    let response = server
        .get("/api/v1/documents/facets")
        .add_query_param("products", "firefox")
        .await;

    let body: serde_json::Value = response.json();
    assert_eq!(common::ids(&body["documents"]), vec![2, 1]);
    assert_eq!(body["documents"][0]["helpful_votes"].as_u64(), Some(2));
    assert_eq!(body["documents"][0]["product_titles"].as_str(), Some("Android, Firefox"));
    assert!(body["fallback_documents"].is_null());
}

#[tokio::test]
async fn facets_with_topics_and_fallbacks() {
    let env = common::TestEnv::new();
    seed(&env);
    let server = env.server();

    let response = server
        .get("/api/v1/documents/facets")
        .add_query_param("locale", "de")
        .add_query_param("products", "firefox")
        .add_query_param("topics", "get-started,install")
        .await;

    let body: serde_json::Value = response.json();
    assert_eq!(common::ids(&body["documents"]), vec![100]);
    assert_eq!(common::ids(&body["fallback_documents"]), vec![2]);
}

#[tokio::test]
async fn facets_excludes_current_document() {
    let env = common::TestEnv::new();
    seed(&env);
    let server = env.server();

    let response = server
        .get("/api/v1/documents/facets")
        .add_query_param("products", "firefox")
        .add_query_param("current", "2")
        .await;

    let body: serde_json::Value = response.json();
    assert_eq!(common::ids(&body["documents"]), vec![1]);
}

#[tokio::test]
async fn facets_unknown_product_matches_nothing() {
    let env = common::TestEnv::new();
    seed(&env);
    let server = env.server();

    let response = server
        .get("/api/v1/documents/facets")
        .add_query_param("locale", "de")
        .add_query_param("products", "firefox,thunderbird")
        .await;

    let body: serde_json::Value = response.json();
    assert_eq!(body["documents"], serde_json::json!([]));
    assert_eq!(body["fallback_documents"], serde_json::json!([]));
}

#[tokio::test]
async fn facets_staff_sees_restricted_documents() {
    let env = common::TestEnv::new();
    seed(&env);
    let server = env.server();

    env.login(&server, "staff").await;

    let response = server
        .get("/api/v1/documents/facets")
        .add_query_param("products", "firefox")
        .await;

    let body: serde_json::Value = response.json();
    assert_eq!(common::ids(&body["documents"]), vec![2, 1, 3]);
}

#[tokio::test]
async fn product_topics_by_level() {
    let env = common::TestEnv::new();
    seed(&env);
    let server = env.server();

    let roots: serde_json::Value = server
        .get("/api/v1/products/firefox/topics")
        .add_query_param("parent", "root")
        .await
        .json();
    assert_eq!(
        roots,
        serde_json::json!([{
            "id": 10,
            "slug": "get-started",
            "title": "get started",
            "parent_id": null,
            "num_docs": 1,
            "url": "/en-US/products/firefox/get-started"
        }])
    );

    let children: serde_json::Value = server
        .get("/api/v1/products/firefox/topics")
        .add_query_param("parent", "get-started")
        .await
        .json();
    assert_eq!(children[0]["slug"].as_str(), Some("install"));
    assert_eq!(children[0]["num_docs"].as_u64(), Some(1));
    assert_eq!(
        children[0]["url"].as_str(),
        Some("/en-US/products/firefox/get-started/install")
    );
}

#[tokio::test]
async fn product_topics_unknown_product_is_empty() {
    let env = common::TestEnv::new();
    seed(&env);
    let server = env.server();

    let body: serde_json::Value = server.get("/api/v1/products/thunderbird/topics").await.json();
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn document_list_filters() {
    let env = common::TestEnv::new();
    seed(&env);
    let server = env.server();

    let all: serde_json::Value = server.get("/api/v1/documents").await.json();
    let slugs: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["slug"].as_str())
        .collect();
    assert_eq!(slugs, vec!["article-1", "article-2"]);

    let mobile: serde_json::Value = server
        .get("/api/v1/documents")
        .add_query_param("product", "mobile")
        .await
        .json();
    assert_eq!(mobile, serde_json::json!([{ "title": "Article 2", "slug": "article-2" }]));

    let german: serde_json::Value = server
        .get("/api/v1/documents")
        .add_query_param("locale", "de")
        .add_query_param("product", "firefox")
        .add_query_param("topic", "get-started")
        .await
        .json();
    assert_eq!(german[0]["slug"].as_str(), Some("article-1-de"));
}

#[tokio::test]
async fn document_list_redirects_are_separate() {
    let env = common::TestEnv::new();
    seed(&env);
    let mut redirect = env.article(4, &[1], &[10], 3);
    redirect.html = "<p>REDIRECT <a href=\"/en-US/kb/article-1\">Article 1</a></p>".to_string();
    env.store.add_document(redirect);
    let server = env.server();

    let redirects: serde_json::Value = server
        .get("/api/v1/documents")
        .add_query_param("is_redirect", "1")
        .await
        .json();
    assert_eq!(redirects, serde_json::json!([{ "title": "Article 4", "slug": "article-4" }]));

    let regular: serde_json::Value = server.get("/api/v1/documents").await.json();
    assert_eq!(regular.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn document_list_topic_requires_product() {
    let env = common::TestEnv::new();
    let server = env.server_permissive();

    let response = server
        .get("/api/v1/documents")
        .add_query_param("topic", "install")
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn document_detail() {
    let env = common::TestEnv::new();
    seed(&env);
    let server = env.server();

    let detail: serde_json::Value = server.get("/api/v1/documents/de/article-1-de").await.json();
    assert_eq!(detail["id"].as_i64(), Some(100));
    assert_eq!(detail["url"].as_str(), Some("/de/kb/article-1-de"));
    assert_eq!(detail["products"], serde_json::json!(["firefox"]));
    assert_eq!(detail["topics"], serde_json::json!(["get-started"]));
    assert_eq!(detail["summary"].as_str(), Some("Translated summary 100"));
}

#[tokio::test]
async fn document_detail_hides_restricted_documents() {
    let env = common::TestEnv::new();
    seed(&env);
    let server = env.server_permissive();

    server
        .get("/api/v1/documents/en-US/article-3")
        .await
        .assert_status_not_found();
    server
        .get("/api/v1/documents/en-US/missing")
        .await
        .assert_status_not_found();

    env.login(&server, "staff").await;
    server
        .get("/api/v1/documents/en-US/article-3")
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn login_me_logout() {
    let env = common::TestEnv::new();
    let server = env.server_permissive();

    server.get("/api/auth/me").await.assert_status_unauthorized();

    let response = server
        .post("/api/auth/login")
        .json(&serde_json::json!({ "username": "admin", "password": "admin" }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"].as_str(), Some("Login successful"));

    let me: serde_json::Value = server.get("/api/auth/me").await.json();
    assert_eq!(me["user_id"].as_str(), Some("demo-admin"));
    assert_eq!(me["is_superuser"].as_bool(), Some(true));

    server.post("/api/auth/logout").await.assert_status_ok();
    server.get("/api/auth/me").await.assert_status_unauthorized();
}

#[tokio::test]
async fn login_invalid_credentials() {
    let env = common::TestEnv::new();
    let server = env.server_permissive();

    server
        .post("/api/auth/login")
        .json(&serde_json::json!({ "username": "staff", "password": "nope" }))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn forged_session_cookie_stays_anonymous() {
    use axum_extra::extract::cookie::Cookie;
    use kbfacets::auth::demo_auth::SESSION_COOKIE;

    let env = common::TestEnv::new();
    seed(&env);
    let server = env.server_permissive();

    let forged = serde_json::json!({
        "user_id": "x",
        "username": "x",
        "groups": [],
        "is_superuser": true
    })
    .to_string();

    let listing: serde_json::Value = server
        .get("/api/v1/documents/facets")
        .add_query_param("products", "firefox")
        .add_cookie(Cookie::new(SESSION_COOKIE, forged.clone()))
        .await
        .json();
    assert_eq!(common::ids(&listing["documents"]), vec![2, 1]);

    server
        .get("/api/v1/documents/en-US/article-3")
        .add_cookie(Cookie::new(SESSION_COOKIE, forged))
        .await
        .assert_status_not_found();
    server
        .get("/api/auth/me")
        .add_cookie(Cookie::new(SESSION_COOKIE, "nobody"))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn demo_routes_absent_without_demo_mode() {
    use axum_extra::extract::cookie::Cookie;
    use kbfacets::auth::demo_auth::SESSION_COOKIE;

    let env = common::TestEnv::without_demo_mode();
    seed(&env);
    let server = env.server_permissive();

    server
        .post("/api/auth/login")
        .json(&serde_json::json!({ "username": "staff", "password": "staff" }))
        .await
        .assert_status_not_found();

    server
        .get("/api/v1/documents/en-US/article-3")
        .add_cookie(Cookie::new(SESSION_COOKIE, "staff"))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn product_listing() {
    let env = common::TestEnv::new();
    seed(&env);
    let mut archived = env.product(3, "old", "Old product");
    archived.is_archived = true;
    env.store.add_product(archived);
    let server = env.server();

    let body: serde_json::Value = server
        .get("/api/v1/products")
        .add_query_param("locale", "de")
        .await
        .json();
    assert_eq!(
        body,
        serde_json::json!([
            { "id": 1, "slug": "firefox", "title": "Firefox", "url": "/de/products/firefox" },
            { "id": 2, "slug": "mobile", "title": "Android", "url": "/de/products/mobile" }
        ])
    );
}

#[tokio::test]
async fn document_list_flags_are_on_when_present() {
    let env = common::TestEnv::new();
    seed(&env);
    let mut archived = env.article(5, &[1], &[10], 1);
    archived.is_archived = true;
    env.store.add_document(archived);
    let server = env.server();

    let body: serde_json::Value = server
        .get("/api/v1/documents")
        .add_query_param("is_archived", "0")
        .await
        .json();
    assert_eq!(body, serde_json::json!([{ "title": "Article 5", "slug": "article-5" }]));

    let body: serde_json::Value = server
        .get("/api/v1/documents")
        .add_query_param("is_archived", "")
        .await
        .json();
    assert_eq!(body.as_array().map(Vec::len), Some(2));
}
