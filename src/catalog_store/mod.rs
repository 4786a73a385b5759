mod memory_store;
mod models;
mod schema;
mod seed;
mod sqlite_store;
mod trait_def;
pub mod validation;

pub use memory_store::InMemoryCatalogStore;
pub use models::*;
pub use schema::CATALOG_VERSIONED_SCHEMAS;
pub use seed::{default_models, seed_catalog_if_empty};
pub use sqlite_store::SqliteCatalogStore;
pub use trait_def::CatalogStore;
