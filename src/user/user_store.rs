use super::user_models::{
    EarnedBadge, SessionToken, UserActivity, UserFavorite, UserIdentity, UserProfile,
};
use crate::badges::BadgeType;
use anyhow::Result;

pub trait UserStore: Send + Sync {
    /// Creates the user on first sign-in, otherwise refreshes the profile
    /// fields and `last_active`. Returns the stored profile.
    fn upsert_user(&self, identity: &UserIdentity, now: i64) -> Result<UserProfile>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user_activity(&self, user_id: &str) -> Result<Option<UserActivity>>;

    /// Applies `update` to the user's activity as one atomic read-modify-write
    /// with respect to other updates of the same user, and touches
    /// `last_active`. Returns the updated activity, or Ok(None) if the user
    /// does not exist.
    fn update_user_activity(
        &self,
        user_id: &str,
        now: i64,
        update: &mut dyn FnMut(&mut UserActivity),
    ) -> Result<Option<UserActivity>>;

    /// Clears the usage preference of every user whose `last_active` is older
    /// than `before`. Badge counters, earned badges and favorites are kept.
    /// Returns how many preferences were cleared.
    fn prune_inactive_preferences(&self, before: i64) -> Result<usize>;
}

pub trait UserBadgeStore: Send + Sync {
    /// Records the badge unless it already exists for (user, type, level).
    /// The flag is true when the badge had already been earned.
    fn earn_badge(
        &self,
        user_id: &str,
        badge_type: BadgeType,
        level: u32,
        now: i64,
    ) -> Result<(EarnedBadge, bool)>;

    fn get_earned_badges(&self, user_id: &str) -> Result<Vec<EarnedBadge>>;
}

pub trait UserFavoritesStore: Send + Sync {
    /// The flag is true when the favorite was newly added.
    fn add_favorite(&self, user_id: &str, model_id: u64, now: i64)
        -> Result<(UserFavorite, bool)>;

    /// Returns whether a favorite was removed.
    fn remove_favorite(&self, user_id: &str, model_id: u64) -> Result<bool>;

    /// Favorite model ids in insertion order.
    fn get_favorite_model_ids(&self, user_id: &str) -> Result<Vec<u64>>;
}

pub trait UserSessionStore: Send + Sync {
    fn add_session(&self, session: SessionToken) -> Result<()>;

    /// Returns Ok(None) if the token is unknown.
    fn get_session(&self, value: &str) -> Result<Option<SessionToken>>;

    /// Returns the deleted session, Ok(None) if it did not exist.
    fn delete_session(&self, value: &str) -> Result<Option<SessionToken>>;

    fn touch_session(&self, value: &str, now: i64) -> Result<()>;

    /// Deletes sessions whose last use is older than `before`.
    /// Returns the number of deleted sessions.
    fn prune_unused_sessions(&self, before: i64) -> Result<usize>;
}

pub trait FullUserStore: UserStore + UserBadgeStore + UserFavoritesStore + UserSessionStore {}

impl<T: UserStore + UserBadgeStore + UserFavoritesStore + UserSessionStore> FullUserStore for T {}
