use crate::badges::{BadgeProgress, BadgeType};
use crate::tracking::UserPreference;
use serde::Serialize;

pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Profile fields supplied by the identity provider on sign-in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserIdentity {
    /// Stable opaque identifier assigned by the provider.
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub created_at: i64,
    pub last_active: i64,
}

impl UserProfile {
    pub fn from_identity(identity: &UserIdentity, now: i64) -> Self {
        UserProfile {
            id: identity.id.clone(),
            display_name: identity.display_name.clone(),
            email: identity.email.clone(),
            avatar: identity.avatar.clone(),
            created_at: now,
            last_active: now,
        }
    }
}

/// The per-user state that must be updated atomically as a unit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserActivity {
    /// `None` until the first recorded usage.
    pub preference: Option<UserPreference>,
    pub badge_progress: BadgeProgress,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnedBadge {
    pub id: u64,
    pub user_id: String,
    pub badge_type: BadgeType,
    pub level: u32,
    pub earned_at: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFavorite {
    pub id: u64,
    pub user_id: String,
    pub model_id: u64,
    pub created_at: i64,
}

/// Opaque server-side session handed out on sign-in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionToken {
    pub value: String,
    pub user_id: String,
    pub created: i64,
    pub last_used: i64,
}

impl SessionToken {
    pub fn generate(user_id: &str, now: i64) -> Self {
        SessionToken {
            value: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created: now,
            last_used: now,
        }
    }
}
