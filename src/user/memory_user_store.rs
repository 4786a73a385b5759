//! Process-memory user store.
//!
//! Each user record sits behind its own mutex so updates to one user are
//! serialized without blocking others.

use super::user_models::*;
use super::user_store::*;
use crate::badges::BadgeType;
use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

struct UserRecord {
    profile: UserProfile,
    activity: UserActivity,
    earned_badges: Vec<EarnedBadge>,
    favorites: Vec<UserFavorite>,
}

type GuardedUserRecord = Arc<Mutex<UserRecord>>;

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, GuardedUserRecord>>,
    sessions: Mutex<HashMap<String, SessionToken>>,
    next_badge_id: AtomicU64,
    next_favorite_id: AtomicU64,
}

fn lock_record(record: &GuardedUserRecord) -> Result<MutexGuard<'_, UserRecord>> {
    record
        .lock()
        .map_err(|_| anyhow!("User record lock poisoned"))
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, user_id: &str) -> Result<Option<GuardedUserRecord>> {
        let users = self
            .users
            .read()
            .map_err(|_| anyhow!("User map lock poisoned"))?;
        Ok(users.get(user_id).cloned())
    }

    fn existing_record(&self, user_id: &str) -> Result<GuardedUserRecord> {
        match self.record(user_id)? {
            Some(record) => Ok(record),
            None => bail!("User {} does not exist", user_id),
        }
    }

    fn all_records(&self) -> Result<Vec<GuardedUserRecord>> {
        let users = self
            .users
            .read()
            .map_err(|_| anyhow!("User map lock poisoned"))?;
        Ok(users.values().cloned().collect())
    }

    fn sessions(&self) -> Result<MutexGuard<'_, HashMap<String, SessionToken>>> {
        self.sessions
            .lock()
            .map_err(|_| anyhow!("Session map lock poisoned"))
    }
}

impl UserStore for InMemoryUserStore {
    fn upsert_user(&self, identity: &UserIdentity, now: i64) -> Result<UserProfile> {
        if let Some(record) = self.record(&identity.id)? {
            let mut record = lock_record(&record)?;
            record.profile.display_name = identity.display_name.clone();
            record.profile.email = identity.email.clone();
            record.profile.avatar = identity.avatar.clone();
            record.profile.last_active = now;
            return Ok(record.profile.clone());
        }

        let mut users = self
            .users
            .write()
            .map_err(|_| anyhow!("User map lock poisoned"))?;
        let record = users.entry(identity.id.clone()).or_insert_with(|| {
            Arc::new(Mutex::new(UserRecord {
                profile: UserProfile::from_identity(identity, now),
                activity: UserActivity::default(),
                earned_badges: vec![],
                favorites: vec![],
            }))
        });
        let profile = lock_record(record)?.profile.clone();
        Ok(profile)
    }

    fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>> {
        match self.record(user_id)? {
            Some(record) => Ok(Some(lock_record(&record)?.profile.clone())),
            None => Ok(None),
        }
    }

    fn get_user_activity(&self, user_id: &str) -> Result<Option<UserActivity>> {
        match self.record(user_id)? {
            Some(record) => Ok(Some(lock_record(&record)?.activity.clone())),
            None => Ok(None),
        }
    }

    fn update_user_activity(
        &self,
        user_id: &str,
        now: i64,
        update: &mut dyn FnMut(&mut UserActivity),
    ) -> Result<Option<UserActivity>> {
        let record = match self.record(user_id)? {
            Some(record) => record,
            None => return Ok(None),
        };
        let mut record = lock_record(&record)?;
        update(&mut record.activity);
        record.profile.last_active = now;
        Ok(Some(record.activity.clone()))
    }

    fn prune_inactive_preferences(&self, before: i64) -> Result<usize> {
        let mut cleared = 0;
        for record in self.all_records()? {
            let mut record = lock_record(&record)?;
            if record.profile.last_active < before && record.activity.preference.is_some() {
                record.activity.preference = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }
}

impl UserBadgeStore for InMemoryUserStore {
    fn earn_badge(
        &self,
        user_id: &str,
        badge_type: BadgeType,
        level: u32,
        now: i64,
    ) -> Result<(EarnedBadge, bool)> {
        let record = self.existing_record(user_id)?;
        let mut record = lock_record(&record)?;
        if let Some(existing) = record
            .earned_badges
            .iter()
            .find(|b| b.badge_type == badge_type && b.level == level)
        {
            return Ok((existing.clone(), true));
        }

        let badge = EarnedBadge {
            id: self.next_badge_id.fetch_add(1, Ordering::SeqCst) + 1,
            user_id: user_id.to_string(),
            badge_type,
            level,
            earned_at: now,
        };
        record.earned_badges.push(badge.clone());
        Ok((badge, false))
    }

    fn get_earned_badges(&self, user_id: &str) -> Result<Vec<EarnedBadge>> {
        match self.record(user_id)? {
            Some(record) => Ok(lock_record(&record)?.earned_badges.clone()),
            None => Ok(vec![]),
        }
    }
}

impl UserFavoritesStore for InMemoryUserStore {
    fn add_favorite(
        &self,
        user_id: &str,
        model_id: u64,
        now: i64,
    ) -> Result<(UserFavorite, bool)> {
        let record = self.existing_record(user_id)?;
        let mut record = lock_record(&record)?;
        if let Some(existing) = record.favorites.iter().find(|f| f.model_id == model_id) {
            return Ok((existing.clone(), false));
        }

        let favorite = UserFavorite {
            id: self.next_favorite_id.fetch_add(1, Ordering::SeqCst) + 1,
            user_id: user_id.to_string(),
            model_id,
            created_at: now,
        };
        record.favorites.push(favorite.clone());
        Ok((favorite, true))
    }

    fn remove_favorite(&self, user_id: &str, model_id: u64) -> Result<bool> {
        let record = match self.record(user_id)? {
            Some(record) => record,
            None => return Ok(false),
        };
        let mut record = lock_record(&record)?;
        let before = record.favorites.len();
        record.favorites.retain(|f| f.model_id != model_id);
        Ok(record.favorites.len() != before)
    }

    fn get_favorite_model_ids(&self, user_id: &str) -> Result<Vec<u64>> {
        match self.record(user_id)? {
            Some(record) => Ok(lock_record(&record)?
                .favorites
                .iter()
                .map(|f| f.model_id)
                .collect()),
            None => Ok(vec![]),
        }
    }
}

impl UserSessionStore for InMemoryUserStore {
    fn add_session(&self, session: SessionToken) -> Result<()> {
        let mut sessions = self.sessions()?;
        if sessions.contains_key(&session.value) {
            bail!("Session token already exists");
        }
        sessions.insert(session.value.clone(), session);
        Ok(())
    }

    fn get_session(&self, value: &str) -> Result<Option<SessionToken>> {
        Ok(self.sessions()?.get(value).cloned())
    }

    fn delete_session(&self, value: &str) -> Result<Option<SessionToken>> {
        Ok(self.sessions()?.remove(value))
    }

    fn touch_session(&self, value: &str, now: i64) -> Result<()> {
        if let Some(session) = self.sessions()?.get_mut(value) {
            session.last_used = now;
        }
        Ok(())
    }

    fn prune_unused_sessions(&self, before: i64) -> Result<usize> {
        let mut sessions = self.sessions()?;
        let initial = sessions.len();
        sessions.retain(|_, session| session.last_used >= before);
        Ok(initial - sessions.len())
    }
}
