use crate::catalog_store::Model;

/// Other models of the same category, best rated first.
pub fn find_similar(model: &Model, models: &[Model], limit: usize) -> Vec<Model> {
    let mut similar: Vec<&Model> = models
        .iter()
        .filter(|candidate| candidate.id != model.id && candidate.category == model.category)
        .collect();
    similar.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    similar.into_iter().take(limit).cloned().collect()
}
