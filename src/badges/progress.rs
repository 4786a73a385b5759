use super::requirements::BadgeType;
use crate::catalog_store::ModelCategory;
use crate::tracking::UsageDelta;
use serde::{Deserialize, Serialize};

/// Per-user badge counters. Every mutation is monotonic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgeProgress {
    pub explorer: u64,
    pub learner: u64,
    pub master: u64,
    pub collector: u64,
    pub translator: u64,
}

impl BadgeProgress {
    pub fn get(&self, badge_type: BadgeType) -> u64 {
        match badge_type {
            BadgeType::Explorer => self.explorer,
            BadgeType::Learner => self.learner,
            BadgeType::Master => self.master,
            BadgeType::Collector => self.collector,
            BadgeType::Translator => self.translator,
        }
    }

    fn slot(&mut self, badge_type: BadgeType) -> &mut u64 {
        match badge_type {
            BadgeType::Explorer => &mut self.explorer,
            BadgeType::Learner => &mut self.learner,
            BadgeType::Master => &mut self.master,
            BadgeType::Collector => &mut self.collector,
            BadgeType::Translator => &mut self.translator,
        }
    }

    /// Returns the new value.
    pub fn increment(&mut self, badge_type: BadgeType, by: u64) -> u64 {
        let slot = self.slot(badge_type);
        *slot = slot.saturating_add(by);
        *slot
    }

    /// Raises the counter to `value` if it is lower. Returns the new value.
    pub fn raise_to(&mut self, badge_type: BadgeType, value: u64) -> u64 {
        let slot = self.slot(badge_type);
        *slot = (*slot).max(value);
        *slot
    }

    /// Derives counter changes from a recorded model invocation.
    pub fn apply_usage(&mut self, delta: &UsageDelta) {
        if delta.first_use_of_model {
            self.increment(BadgeType::Explorer, 1);
        }
        if delta.first_use_of_category {
            self.increment(BadgeType::Learner, 1);
        }
        self.raise_to(BadgeType::Master, delta.model_usage_count);
        if delta.category == ModelCategory::Translation {
            self.increment(BadgeType::Translator, 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::UserPreference;

    #[test]
    fn raise_to_never_lowers() {
        let mut progress = BadgeProgress::default();
        assert_eq!(progress.raise_to(BadgeType::Master, 4), 4);
        assert_eq!(progress.raise_to(BadgeType::Master, 2), 4);
    }

    #[test]
    fn usage_drives_explorer_learner_master_and_translator() {
        let mut preference = UserPreference::default();
        let mut progress = BadgeProgress::default();

        for (model_id, category) in [
            (1, ModelCategory::Translation),
            (1, ModelCategory::Translation),
            (2, ModelCategory::Chat),
            (1, ModelCategory::Translation),
        ] {
            let delta = preference.record_usage(model_id, category);
            progress.apply_usage(&delta);
        }

        assert_eq!(progress.explorer, 2);
        assert_eq!(progress.learner, 2);
        assert_eq!(progress.master, 3);
        assert_eq!(progress.translator, 3);
        assert_eq!(progress.collector, 0);
    }

    #[test]
    fn serializes_every_counter() {
        let mut progress = BadgeProgress::default();
        progress.increment(BadgeType::Collector, 2);
        let value = serde_json::to_value(progress).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "explorer": 0, "learner": 0, "master": 0, "collector": 2, "translator": 0
            })
        );
    }
}
