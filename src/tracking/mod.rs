//! Per-user usage tracking.
//!
//! A [`UserPreference`] accumulates what a signed-in user invoked. It feeds
//! the recommendation scorer and, through [`UsageDelta`], badge progress.

use crate::catalog_store::ModelCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How many distinct model ids `recently_used` keeps.
pub const RECENTLY_USED_CAPACITY: usize = 10;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreference {
    /// Invocation count per model id.
    pub model_usage: BTreeMap<u64, u64>,
    /// Accumulated score per category, +1 per invocation.
    pub category_preferences: BTreeMap<ModelCategory, u64>,
    /// Most recent first, distinct, at most [`RECENTLY_USED_CAPACITY`] long.
    pub recently_used: Vec<u64>,
}

/// What a single [`UserPreference::record_usage`] call changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UsageDelta {
    pub model_id: u64,
    pub category: ModelCategory,
    pub first_use_of_model: bool,
    pub first_use_of_category: bool,
    /// Per-model count after the update.
    pub model_usage_count: u64,
}

impl UserPreference {
    pub fn record_usage(&mut self, model_id: u64, category: ModelCategory) -> UsageDelta {
        let usage = self.model_usage.entry(model_id).or_insert(0);
        *usage += 1;
        let model_usage_count = *usage;

        let category_score = self.category_preferences.entry(category).or_insert(0);
        *category_score += 1;
        let first_use_of_category = *category_score == 1;

        self.recently_used.retain(|id| *id != model_id);
        self.recently_used.insert(0, model_id);
        self.recently_used.truncate(RECENTLY_USED_CAPACITY);

        UsageDelta {
            model_id,
            category,
            first_use_of_model: model_usage_count == 1,
            first_use_of_category,
            model_usage_count,
        }
    }

    pub fn usage_of(&self, model_id: u64) -> u64 {
        self.model_usage.get(&model_id).copied().unwrap_or(0)
    }

    pub fn category_score(&self, category: ModelCategory) -> u64 {
        self.category_preferences.get(&category).copied().unwrap_or(0)
    }

    pub fn was_recently_used(&self, model_id: u64) -> bool {
        self.recently_used.contains(&model_id)
    }
}
