use crate::catalog_store::Model;
use crate::tracking::UserPreference;

const CATEGORY_WEIGHT: f64 = 2.0;
const MODEL_USAGE_WEIGHT: f64 = 1.0;
const RECENT_BONUS: f64 = 3.0;
const POPULARITY_WEIGHT: f64 = 0.1;
const RATING_WEIGHT: f64 = 0.5;

/// Relevance of `model` for a user with the given history.
pub fn score_model(preference: &UserPreference, model: &Model) -> f64 {
    let recent = if preference.was_recently_used(model.id) {
        RECENT_BONUS
    } else {
        0.0
    };
    CATEGORY_WEIGHT * preference.category_score(model.category) as f64
        + MODEL_USAGE_WEIGHT * preference.usage_of(model.id) as f64
        + recent
        + POPULARITY_WEIGHT * model.usage_count as f64
        + RATING_WEIGHT * model.rating
}

/// Global popularity ordering. Ties keep input order.
pub fn popular(models: &[Model], limit: usize) -> Vec<Model> {
    let mut ranked: Vec<&Model> = models.iter().collect();
    ranked.sort_by(|a, b| b.usage_count.cmp(&a.usage_count));
    ranked.into_iter().take(limit).cloned().collect()
}

/// Up to `limit` models, most relevant first.
///
/// Without a preference record this is [`popular`]. A zero limit yields an
/// empty result.
pub fn recommend(preference: Option<&UserPreference>, models: &[Model], limit: usize) -> Vec<Model> {
    let preference = match preference {
        Some(p) => p,
        None => return popular(models, limit),
    };

    let mut scored: Vec<(f64, &Model)> = models
        .iter()
        .map(|model| (score_model(preference, model), model))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, model)| model.clone())
        .collect()
}
