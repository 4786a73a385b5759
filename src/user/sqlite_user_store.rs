use super::user_models::*;
use super::user_store::*;
use crate::badges::{BadgeProgress, BadgeType};
use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned_database, Column, ForeignKey, ForeignKeyOnChange, SqlType, Table,
    VersionedSchema,
};
use crate::tracking::UserPreference;
use anyhow::{Context, Result};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// V 1
const USERS_TABLE_V_1: Table = Table {
    name: "users",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("display_name", &SqlType::Text),
        sqlite_column!("email", &SqlType::Text),
        sqlite_column!("avatar", &SqlType::Text),
        // JSON, NULL until the first recorded usage or after pruning
        sqlite_column!("preference", &SqlType::Text),
        sqlite_column!(
            "badge_progress",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'{}'")
        ),
        sqlite_column!("created", &SqlType::Integer, non_null = true),
        sqlite_column!("last_active", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_users_last_active", "last_active")],
    unique_constraints: &[],
};

const USER_FOREIGN_KEY: ForeignKey = ForeignKey {
    foreign_table: "users",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const USER_BADGES_TABLE_V_1: Table = Table {
    name: "user_badges",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "user_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&USER_FOREIGN_KEY)
        ),
        sqlite_column!("badge_type", &SqlType::Text, non_null = true),
        sqlite_column!("level", &SqlType::Integer, non_null = true),
        sqlite_column!("earned_at", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["user_id", "badge_type", "level"]],
};

const USER_FAVORITES_TABLE_V_1: Table = Table {
    name: "user_favorites",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "user_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&USER_FOREIGN_KEY)
        ),
        sqlite_column!("model_id", &SqlType::Integer, non_null = true),
        sqlite_column!("created", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["user_id", "model_id"]],
};

const SESSIONS_TABLE_V_1: Table = Table {
    name: "sessions",
    columns: &[
        sqlite_column!("value", &SqlType::Text, is_primary_key = true),
        sqlite_column!(
            "user_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&USER_FOREIGN_KEY)
        ),
        sqlite_column!("created", &SqlType::Integer, non_null = true),
        sqlite_column!("last_used", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_sessions_user_id", "user_id")],
    unique_constraints: &[],
};

pub const USER_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[
        USERS_TABLE_V_1,
        USER_BADGES_TABLE_V_1,
        USER_FAVORITES_TABLE_V_1,
        SESSIONS_TABLE_V_1,
    ],
    migration: None,
}];

fn json_error(index: usize, err: serde_json::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

fn profile_from_row(row: &Row) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(0)?,
        display_name: row.get(1)?,
        email: row.get(2)?,
        avatar: row.get(3)?,
        created_at: row.get(4)?,
        last_active: row.get(5)?,
    })
}

fn activity_from_row(row: &Row) -> rusqlite::Result<UserActivity> {
    let preference: Option<String> = row.get(0)?;
    let badge_progress: String = row.get(1)?;
    Ok(UserActivity {
        preference: preference
            .map(|p| serde_json::from_str::<UserPreference>(&p))
            .transpose()
            .map_err(|e| json_error(0, e))?,
        badge_progress: serde_json::from_str::<BadgeProgress>(&badge_progress)
            .map_err(|e| json_error(1, e))?,
    })
}

fn badge_from_row(row: &Row) -> rusqlite::Result<EarnedBadge> {
    let badge_type: String = row.get(2)?;
    Ok(EarnedBadge {
        id: row.get::<_, i64>(0)? as u64,
        user_id: row.get(1)?,
        badge_type: BadgeType::from_db_str(&badge_type).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                Type::Text,
                format!("Unknown badge type '{}'", badge_type).into(),
            )
        })?,
        level: row.get(3)?,
        earned_at: row.get(4)?,
    })
}

fn favorite_from_row(row: &Row) -> rusqlite::Result<UserFavorite> {
    Ok(UserFavorite {
        id: row.get::<_, i64>(0)? as u64,
        user_id: row.get(1)?,
        model_id: row.get::<_, i64>(2)? as u64,
        created_at: row.get(3)?,
    })
}

fn session_from_row(row: &Row) -> rusqlite::Result<SessionToken> {
    Ok(SessionToken {
        value: row.get(0)?,
        user_id: row.get(1)?,
        created: row.get(2)?,
        last_used: row.get(3)?,
    })
}

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned_database(db_path.as_ref(), USER_VERSIONED_SCHEMAS, "user")?;
        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl UserStore for SqliteUserStore {
    fn upsert_user(&self, identity: &UserIdentity, now: i64) -> Result<UserProfile> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (id, display_name, email, avatar, created, last_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    display_name = excluded.display_name,
                    email = excluded.email,
                    avatar = excluded.avatar,
                    last_active = excluded.last_active",
                USERS_TABLE_V_1.name
            ),
            params![
                identity.id,
                identity.display_name,
                identity.email,
                identity.avatar,
                now
            ],
        )
        .with_context(|| format!("Failed to upsert user {}", identity.id))?;
        conn.query_row(
            &format!(
                "SELECT id, display_name, email, avatar, created, last_active FROM {} WHERE id = ?1",
                USERS_TABLE_V_1.name
            ),
            params![identity.id],
            profile_from_row,
        )
        .context("Failed to read upserted user")
    }

    fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!(
                "SELECT id, display_name, email, avatar, created, last_active FROM {} WHERE id = ?1",
                USERS_TABLE_V_1.name
            ),
            params![user_id],
            profile_from_row,
        )
        .optional()
        .with_context(|| format!("Failed to read user {}", user_id))
    }

    fn get_user_activity(&self, user_id: &str) -> Result<Option<UserActivity>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!(
                "SELECT preference, badge_progress FROM {} WHERE id = ?1",
                USERS_TABLE_V_1.name
            ),
            params![user_id],
            activity_from_row,
        )
        .optional()
        .with_context(|| format!("Failed to read activity of user {}", user_id))
    }

    fn update_user_activity(
        &self,
        user_id: &str,
        now: i64,
        update: &mut dyn FnMut(&mut UserActivity),
    ) -> Result<Option<UserActivity>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut activity = match tx
            .query_row(
                &format!(
                    "SELECT preference, badge_progress FROM {} WHERE id = ?1",
                    USERS_TABLE_V_1.name
                ),
                params![user_id],
                activity_from_row,
            )
            .optional()?
        {
            Some(activity) => activity,
            None => return Ok(None),
        };

        update(&mut activity);

        let preference = activity
            .preference
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        tx.execute(
            &format!(
                "UPDATE {} SET preference = ?1, badge_progress = ?2, last_active = ?3 WHERE id = ?4",
                USERS_TABLE_V_1.name
            ),
            params![
                preference,
                serde_json::to_string(&activity.badge_progress)?,
                now,
                user_id
            ],
        )?;
        tx.commit()?;
        Ok(Some(activity))
    }

    fn prune_inactive_preferences(&self, before: i64) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let cleared = conn.execute(
            &format!(
                "UPDATE {} SET preference = NULL WHERE last_active < ?1 AND preference IS NOT NULL",
                USERS_TABLE_V_1.name
            ),
            params![before],
        )?;
        debug!("Cleared {} inactive user preferences", cleared);
        Ok(cleared)
    }
}

impl UserBadgeStore for SqliteUserStore {
    fn earn_badge(
        &self,
        user_id: &str,
        badge_type: BadgeType,
        level: u32,
        now: i64,
    ) -> Result<(EarnedBadge, bool)> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let select = format!(
            "SELECT id, user_id, badge_type, level, earned_at FROM {}
             WHERE user_id = ?1 AND badge_type = ?2 AND level = ?3",
            USER_BADGES_TABLE_V_1.name
        );

        if let Some(existing) = tx
            .query_row(
                &select,
                params![user_id, badge_type.to_db_str(), level],
                badge_from_row,
            )
            .optional()?
        {
            return Ok((existing, true));
        }

        tx.execute(
            &format!(
                "INSERT INTO {} (user_id, badge_type, level, earned_at) VALUES (?1, ?2, ?3, ?4)",
                USER_BADGES_TABLE_V_1.name
            ),
            params![user_id, badge_type.to_db_str(), level, now],
        )
        .with_context(|| format!("Failed to record badge {} for user {}", badge_type, user_id))?;
        let badge = EarnedBadge {
            id: tx.last_insert_rowid() as u64,
            user_id: user_id.to_string(),
            badge_type,
            level,
            earned_at: now,
        };
        tx.commit()?;
        Ok((badge, false))
    }

    fn get_earned_badges(&self, user_id: &str) -> Result<Vec<EarnedBadge>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, user_id, badge_type, level, earned_at FROM {} WHERE user_id = ?1 ORDER BY id",
            USER_BADGES_TABLE_V_1.name
        ))?;
        let badges = stmt
            .query_map(params![user_id], badge_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(badges)
    }
}

impl UserFavoritesStore for SqliteUserStore {
    fn add_favorite(
        &self,
        user_id: &str,
        model_id: u64,
        now: i64,
    ) -> Result<(UserFavorite, bool)> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            &format!(
                "INSERT INTO {} (user_id, model_id, created) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id, model_id) DO NOTHING",
                USER_FAVORITES_TABLE_V_1.name
            ),
            params![user_id, model_id as i64, now],
        )
        .with_context(|| format!("Failed to add favorite for user {}", user_id))?;
        let favorite = conn.query_row(
            &format!(
                "SELECT id, user_id, model_id, created FROM {} WHERE user_id = ?1 AND model_id = ?2",
                USER_FAVORITES_TABLE_V_1.name
            ),
            params![user_id, model_id as i64],
            favorite_from_row,
        )?;
        Ok((favorite, inserted > 0))
    }

    fn remove_favorite(&self, user_id: &str, model_id: u64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute(
            &format!(
                "DELETE FROM {} WHERE user_id = ?1 AND model_id = ?2",
                USER_FAVORITES_TABLE_V_1.name
            ),
            params![user_id, model_id as i64],
        )?;
        Ok(removed > 0)
    }

    fn get_favorite_model_ids(&self, user_id: &str) -> Result<Vec<u64>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT model_id FROM {} WHERE user_id = ?1 ORDER BY id",
            USER_FAVORITES_TABLE_V_1.name
        ))?;
        let ids = stmt
            .query_map(params![user_id], |r| r.get::<_, i64>(0))?
            .map(|id| id.map(|id| id as u64))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }
}

impl UserSessionStore for SqliteUserStore {
    fn add_session(&self, session: SessionToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (value, user_id, created, last_used) VALUES (?1, ?2, ?3, ?4)",
                SESSIONS_TABLE_V_1.name
            ),
            params![
                session.value,
                session.user_id,
                session.created,
                session.last_used
            ],
        )
        .with_context(|| format!("Failed to add session for user {}", session.user_id))?;
        Ok(())
    }

    fn get_session(&self, value: &str) -> Result<Option<SessionToken>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!(
                "SELECT value, user_id, created, last_used FROM {} WHERE value = ?1",
                SESSIONS_TABLE_V_1.name
            ),
            params![value],
            session_from_row,
        )
        .optional()
        .context("Failed to read session")
    }

    fn delete_session(&self, value: &str) -> Result<Option<SessionToken>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let session = tx
            .query_row(
                &format!(
                    "SELECT value, user_id, created, last_used FROM {} WHERE value = ?1",
                    SESSIONS_TABLE_V_1.name
                ),
                params![value],
                session_from_row,
            )
            .optional()?;
        if session.is_some() {
            tx.execute(
                &format!("DELETE FROM {} WHERE value = ?1", SESSIONS_TABLE_V_1.name),
                params![value],
            )?;
        }
        tx.commit()?;
        Ok(session)
    }

    fn touch_session(&self, value: &str, now: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "UPDATE {} SET last_used = ?1 WHERE value = ?2",
                SESSIONS_TABLE_V_1.name
            ),
            params![now, value],
        )?;
        Ok(())
    }

    fn prune_unused_sessions(&self, before: i64) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE last_used < ?1", SESSIONS_TABLE_V_1.name),
            params![before],
        )?;
        debug!("Pruned {} unused sessions", deleted);
        Ok(deleted)
    }
}
