use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use axum_extra::extract::CookieJar;
use tower_http::trace::TraceLayer;

use crate::auth::models::User;
use crate::cache::store::{CacheStore, Clock};
use crate::config::FacetsSettings;
use crate::db::memory::MemoryStore;
use crate::facets::service::FacetsService;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub facets: FacetsService,
    /// When enabled, the demo login routes are mounted and demo sessions
    /// are honoured. Otherwise every caller is anonymous.
    pub demo_mode: bool,
}

impl AppState {
    /// State backed entirely by one in-memory store.
    pub fn in_memory(
        store: Arc<MemoryStore>,
        cache: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
        settings: FacetsSettings,
    ) -> Self {
        Self {
            facets: FacetsService {
                documents: store.clone(),
                catalog: store.clone(),
                votes: store,
                cache,
                clock,
                settings,
            },
            demo_mode: false,
        }
    }

    pub fn with_demo_mode(mut self, demo_mode: bool) -> Self {
        self.demo_mode = demo_mode;
        self
    }

    /// The caller of a request.
    pub fn caller(&self, jar: &CookieJar) -> User {
        if self.demo_mode {
            crate::auth::demo_auth::current_user(jar)
        } else {
            User::Anonymous
        }
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route(
            "/api/v1/products",
            get(crate::api::facets::list_products_handler),
        )
        .route(
            "/api/v1/products/{product}/topics",
            get(crate::api::facets::product_topics_handler),
        )
        .route(
            "/api/v1/documents/facets",
            get(crate::api::facets::facet_documents_handler),
        )
        .route(
            "/api/v1/documents",
            get(crate::api::documents::list_documents_handler),
        )
        .route(
            "/api/v1/documents/{locale}/{slug}",
            get(crate::api::documents::document_detail_handler),
        );

    if state.demo_mode {
        tracing::warn!("Demo mode enabled: demo accounts can log in");
        router = router
            .route(
                "/api/auth/login",
                post(crate::auth::demo_auth::login_handler),
            )
            .route("/api/auth/me", get(crate::auth::demo_auth::me_handler))
            .route(
                "/api/auth/logout",
                post(crate::auth::demo_auth::logout_handler),
            );
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
