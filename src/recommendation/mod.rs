//! Ranking of catalog models: personalized scoring, same-category
//! suggestions and audience filters. Every function here is total over its
//! inputs; missing history counts as zero.

mod audience;
mod scorer;
mod similar;

pub use audience::{filter_for_audience, Audience, AudienceMatching};
pub use scorer::{popular, recommend, score_model};
pub use similar::find_similar;

/// Default number of models for general recommendation listings.
pub const DEFAULT_LIMIT: usize = 6;
/// Default number of models for the compact "recommended for you" panel.
pub const PANEL_LIMIT: usize = 4;
pub const SIMILAR_LIMIT: usize = 3;
pub const ACCESSIBLE_LIMIT: usize = 4;

#[cfg(test)]
pub(crate) fn test_model(
    id: u64,
    category: crate::catalog_store::ModelCategory,
    rating: f64,
    usage_count: u64,
) -> crate::catalog_store::Model {
    crate::catalog_store::Model {
        id,
        name: format!("model-{}", id),
        description: String::new(),
        image_url: None,
        category,
        provider: crate::catalog_store::Provider::Gemini,
        provider_model_id: format!("provider-model-{}", id),
        rating,
        usage_count,
        is_active: true,
        capabilities: vec![],
        examples: vec![],
        child_friendly: false,
        elderly_friendly: false,
        complexity: None,
    }
}
