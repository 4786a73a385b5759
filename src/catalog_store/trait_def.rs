//! CatalogStore trait definition.
//!
//! The recommendation and badge logic only relies on the read and
//! increment operations; the remaining ones back the admin endpoints and
//! startup seeding.

use super::models::{Model, ModelCategory, NewModel};
use anyhow::Result;

/// Trait for catalog storage backends.
///
/// Implementations are internally synchronized so a single instance can be
/// shared behind an `Arc` across request handlers.
pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Reads
    // =========================================================================

    /// Active models, ascending id.
    fn list_models(&self) -> Result<Vec<Model>>;

    /// Every model including inactive ones, ascending id.
    fn list_all_models(&self) -> Result<Vec<Model>>;

    /// Get a model by id regardless of its active flag.
    fn get_model(&self, id: u64) -> Result<Option<Model>>;

    /// Active models of the given category, ascending id.
    fn get_models_by_category(&self, category: ModelCategory) -> Result<Vec<Model>>;

    fn count_models(&self) -> Result<usize>;

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert a model with rating 0 and usage 0, returning it with its new id.
    fn create_model(&self, model: NewModel) -> Result<Model>;

    /// Insert a model with a preset rating and usage count.
    fn insert_seed_model(&self, model: NewModel, rating: f64, usage_count: u64) -> Result<Model>;

    /// Atomically bump the usage counter, returning the new value.
    /// Returns Ok(None) if the model does not exist.
    fn increment_usage_count(&self, id: u64) -> Result<Option<u64>>;

    /// Toggle the active flag. Returns Ok(None) if the model does not exist.
    fn set_model_active(&self, id: u64, active: bool) -> Result<Option<Model>>;
}
