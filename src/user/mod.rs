mod memory_user_store;
mod sqlite_user_store;
mod user_manager;
pub mod user_models;
mod user_store;

pub use memory_user_store::InMemoryUserStore;
pub use sqlite_user_store::{SqliteUserStore, USER_VERSIONED_SCHEMAS};
pub use user_manager::{Recommendations, UsageOutcome, UserManager};
pub use user_models::{
    now_secs, EarnedBadge, SessionToken, UserActivity, UserFavorite, UserIdentity, UserProfile,
};
pub use user_store::{
    FullUserStore, UserBadgeStore, UserFavoritesStore, UserSessionStore, UserStore,
};
