pub mod config;
pub mod error;
pub mod auth {
    pub mod demo_auth;
    pub mod models;
}
pub mod cache {
    pub mod store;
}
pub mod db {
    pub mod catalog_repository;
    pub mod memory;
    pub mod models;
    pub mod repository;
    pub mod vote_repository;
}
pub mod facets {
    pub mod cache_key;
    pub mod documents;
    pub mod effective;
    pub mod service;
    pub mod topics;
}
pub mod api {
    pub mod documents;
    pub mod errors;
    pub mod facets;
}
pub mod demo_seeder;

#[cfg(feature = "server")]
pub mod app;
