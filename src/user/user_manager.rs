use super::user_models::*;
use super::user_store::{
    FullUserStore, UserBadgeStore, UserFavoritesStore, UserSessionStore, UserStore,
};
use crate::badges::{evaluate, BadgeProgress, BadgeSummary, BadgeType, BADGE_REQUIREMENTS};
use crate::catalog_store::{CatalogStore, Model, ModelCategory};
use crate::recommendation::{self, Audience, AudienceMatching};
use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::debug;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Timestamp `retention_days` before `now`, clamped so it never lands after `now`.
fn retention_cutoff(now: i64, retention_days: u64) -> i64 {
    let window = i64::try_from(retention_days)
        .ok()
        .and_then(|days| days.checked_mul(SECONDS_PER_DAY))
        .unwrap_or(i64::MAX);
    now.saturating_sub(window)
}

/// Result of a recorded model invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct UsageOutcome {
    pub model_id: u64,
    pub category: ModelCategory,
    /// Global usage counter after the increment.
    pub usage_count: u64,
    /// Updated per-user state, `None` for anonymous usage.
    pub activity: Option<UserActivity>,
}

/// Ranked models for a caller.
#[derive(Clone, Debug, PartialEq)]
pub struct Recommendations {
    pub models: Vec<Model>,
    /// False when no preference record existed and popularity was used.
    pub personalized: bool,
}

/// Orchestrates the catalog and user stores for the HTTP layer.
pub struct UserManager {
    catalog_store: Arc<dyn CatalogStore>,
    user_store: Arc<dyn FullUserStore>,
}

fn non_empty(user_id: Option<&str>) -> Option<&str> {
    user_id.filter(|id| !id.is_empty())
}

impl UserManager {
    pub fn new(catalog_store: Arc<dyn CatalogStore>, user_store: Arc<dyn FullUserStore>) -> Self {
        Self {
            catalog_store,
            user_store,
        }
    }

    // =========================================================================
    // Sign-in / sessions
    // =========================================================================

    pub fn sign_in(&self, identity: &UserIdentity) -> Result<(UserProfile, SessionToken)> {
        if identity.id.is_empty() {
            bail!("Identity has an empty user id");
        }
        let now = now_secs();
        let profile = self.user_store.upsert_user(identity, now)?;
        let session = SessionToken::generate(&profile.id, now);
        self.user_store.add_session(session.clone())?;
        debug!("Signed in user {}", profile.id);
        Ok((profile, session))
    }

    /// Deletes the session only. Accumulated counters stay.
    pub fn sign_out(&self, token: &str) -> Result<bool> {
        Ok(self.user_store.delete_session(token)?.is_some())
    }

    /// Looks up a stored session and refreshes its last-used timestamp.
    pub fn resolve_session(&self, token: &str) -> Result<Option<SessionToken>> {
        let session = match self.user_store.get_session(token)? {
            Some(session) => session,
            None => return Ok(None),
        };
        if let Err(e) = self.user_store.touch_session(token, now_secs()) {
            debug!("Failed to update session last_used timestamp: {}", e);
        }
        Ok(Some(session))
    }

    pub fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>> {
        self.user_store.get_user(user_id)
    }

    // =========================================================================
    // Usage tracking and recommendations
    // =========================================================================

    /// Records a completed invocation of an active model. The global counter
    /// always moves; per-user tracking only happens for a non-empty user id.
    /// Returns Ok(None) if the model does not exist or is inactive.
    pub fn record_model_usage(
        &self,
        user_id: Option<&str>,
        model_id: u64,
    ) -> Result<Option<UsageOutcome>> {
        let model = match self.catalog_store.get_model(model_id)? {
            Some(model) if model.is_active => model,
            _ => return Ok(None),
        };
        let usage_count = match self.catalog_store.increment_usage_count(model_id)? {
            Some(count) => count,
            None => return Ok(None),
        };

        let activity = match non_empty(user_id) {
            Some(user_id) => self.user_store.update_user_activity(
                user_id,
                now_secs(),
                &mut |activity| {
                    let delta = activity
                        .preference
                        .get_or_insert_with(Default::default)
                        .record_usage(model.id, model.category);
                    activity.badge_progress.apply_usage(&delta);
                },
            )?,
            None => None,
        };

        Ok(Some(UsageOutcome {
            model_id,
            category: model.category,
            usage_count,
            activity,
        }))
    }

    pub fn recommendations_for(
        &self,
        user_id: Option<&str>,
        limit: usize,
    ) -> Result<Recommendations> {
        let models = self.catalog_store.list_models()?;
        let preference = match non_empty(user_id) {
            Some(user_id) => self
                .user_store
                .get_user_activity(user_id)?
                .and_then(|activity| activity.preference),
            None => None,
        };
        Ok(Recommendations {
            models: recommendation::recommend(preference.as_ref(), &models, limit),
            personalized: preference.is_some(),
        })
    }

    /// Returns Ok(None) if the model does not exist or is inactive.
    pub fn similar_models(&self, model_id: u64, limit: usize) -> Result<Option<Vec<Model>>> {
        let model = match self.catalog_store.get_model(model_id)? {
            Some(model) if model.is_active => model,
            _ => return Ok(None),
        };
        let models = self.catalog_store.list_models()?;
        Ok(Some(recommendation::find_similar(&model, &models, limit)))
    }

    pub fn accessible_models(
        &self,
        audience: Audience,
        limit: usize,
        matching: AudienceMatching,
    ) -> Result<Vec<Model>> {
        let models = self.catalog_store.list_models()?;
        Ok(recommendation::filter_for_audience(
            &models, audience, limit, matching,
        ))
    }

    // =========================================================================
    // Badges
    // =========================================================================

    /// Returns Ok(None) if the user does not exist.
    pub fn badge_progress(&self, user_id: &str) -> Result<Option<BadgeProgress>> {
        Ok(self
            .user_store
            .get_user_activity(user_id)?
            .map(|activity| activity.badge_progress))
    }

    /// Returns Ok(None) if the user does not exist.
    pub fn badge_summary(&self, user_id: &str) -> Result<Option<BadgeSummary>> {
        Ok(self
            .badge_progress(user_id)?
            .map(|progress| evaluate(&progress, &BADGE_REQUIREMENTS)))
    }

    /// Returns Ok(None) if the user does not exist.
    pub fn increment_badge_progress(
        &self,
        user_id: &str,
        badge_type: BadgeType,
        by: u64,
    ) -> Result<Option<BadgeProgress>> {
        Ok(self
            .user_store
            .update_user_activity(user_id, now_secs(), &mut |activity| {
                activity.badge_progress.increment(badge_type, by);
            })?
            .map(|activity| activity.badge_progress))
    }

    /// Idempotent per (user, type, level). Returns Ok(None) if the user does
    /// not exist.
    pub fn earn_badge(
        &self,
        user_id: &str,
        badge_type: BadgeType,
        level: u32,
    ) -> Result<Option<(EarnedBadge, bool)>> {
        if self.user_store.get_user(user_id)?.is_none() {
            return Ok(None);
        }
        Ok(Some(self.user_store.earn_badge(
            user_id,
            badge_type,
            level,
            now_secs(),
        )?))
    }

    /// Returns Ok(None) if the user does not exist.
    pub fn earned_badges(&self, user_id: &str) -> Result<Option<Vec<EarnedBadge>>> {
        if self.user_store.get_user(user_id)?.is_none() {
            return Ok(None);
        }
        Ok(Some(self.user_store.get_earned_badges(user_id)?))
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    /// A newly added favorite counts towards the collector badge. Returns
    /// Ok(None) if the model does not exist.
    pub fn add_favorite(&self, user_id: &str, model_id: u64) -> Result<Option<UserFavorite>> {
        if self.catalog_store.get_model(model_id)?.is_none() {
            return Ok(None);
        }
        let (favorite, newly_added) = self
            .user_store
            .add_favorite(user_id, model_id, now_secs())?;
        if newly_added {
            self.increment_badge_progress(user_id, BadgeType::Collector, 1)?;
        }
        Ok(Some(favorite))
    }

    pub fn remove_favorite(&self, user_id: &str, model_id: u64) -> Result<bool> {
        self.user_store.remove_favorite(user_id, model_id)
    }

    /// Favorite models that still exist in the catalog, in insertion order.
    pub fn favorite_models(&self, user_id: &str) -> Result<Vec<Model>> {
        let mut models = vec![];
        for model_id in self.user_store.get_favorite_model_ids(user_id)? {
            if let Some(model) = self.catalog_store.get_model(model_id)? {
                models.push(model);
            }
        }
        Ok(models)
    }

    // =========================================================================
    // Retention
    // =========================================================================

    /// Clears preferences of users inactive for more than `retention_days`.
    pub fn prune_inactive_preferences(&self, retention_days: u64) -> Result<usize> {
        self.user_store
            .prune_inactive_preferences(retention_cutoff(now_secs(), retention_days))
    }

    /// Deletes sessions unused for more than `retention_days`.
    pub fn prune_unused_sessions(&self, retention_days: u64) -> Result<usize> {
        self.user_store
            .prune_unused_sessions(retention_cutoff(now_secs(), retention_days))
    }
}
