//! Audience-targeted subsets of the catalog.

use crate::catalog_store::Model;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Elderly,
    Children,
}

impl Audience {
    pub fn from_query(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "elderly" => Some(Audience::Elderly),
            "children" => Some(Audience::Children),
            _ => None,
        }
    }
}

/// How a model is decided to suit an audience.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum AudienceMatching {
    /// Use the `elderlyFriendly` / `childFriendly` flags of the model.
    #[default]
    Tags,
    /// Deprecated substring heuristic over description and provider model id.
    Keywords,
}

const ELDERLY_EXCLUDED_MODEL_ID_MARKER: &str = "complex";
const ELDERLY_EXCLUDED_DESCRIPTION_MARKER: &str = "gelişmiş";
const CHILDREN_DESCRIPTION_MARKERS: [&str; 3] = ["eğitim", "çocuk", "öğrenme"];

/// Lowercases Turkish text. `İ` folds to a plain `i`, where
/// `str::to_lowercase` would leave a combining dot behind.
fn fold_turkish_case(text: &str) -> String {
    text.chars()
        .flat_map(|c| match c {
            'İ' => 'i'.to_lowercase(),
            c => c.to_lowercase(),
        })
        .collect()
}

fn matches_keywords(model: &Model, audience: Audience) -> bool {
    let description = fold_turkish_case(&model.description);
    match audience {
        Audience::Elderly => {
            !model
                .provider_model_id
                .to_lowercase()
                .contains(ELDERLY_EXCLUDED_MODEL_ID_MARKER)
                && !description.contains(ELDERLY_EXCLUDED_DESCRIPTION_MARKER)
        }
        Audience::Children => CHILDREN_DESCRIPTION_MARKERS
            .iter()
            .any(|marker| description.contains(marker)),
    }
}

fn matches_tags(model: &Model, audience: Audience) -> bool {
    match audience {
        Audience::Elderly => model.elderly_friendly,
        Audience::Children => model.child_friendly,
    }
}

/// Models suited to `audience`, best rated first. No match means an empty
/// result, never the unfiltered catalog.
pub fn filter_for_audience(
    models: &[Model],
    audience: Audience,
    limit: usize,
    matching: AudienceMatching,
) -> Vec<Model> {
    let mut selected: Vec<&Model> = models
        .iter()
        .filter(|model| match matching {
            AudienceMatching::Tags => matches_tags(model, audience),
            AudienceMatching::Keywords => matches_keywords(model, audience),
        })
        .collect();
    selected.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    selected.into_iter().take(limit).cloned().collect()
}
