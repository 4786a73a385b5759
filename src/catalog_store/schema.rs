//! SQLite schema definitions for the model catalog database.
//!
//! List-valued fields (capabilities, examples) are stored as JSON text.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP};

/// Models table - one row per catalog entry
const MODELS_TABLE_V_1: Table = Table {
    name: "models",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text, non_null = true),
        sqlite_column!("image_url", &SqlType::Text),
        sqlite_column!("category", &SqlType::Text, non_null = true),
        sqlite_column!("provider", &SqlType::Text, non_null = true),
        sqlite_column!("provider_model_id", &SqlType::Text, non_null = true),
        sqlite_column!(
            "rating",
            &SqlType::Real,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "usage_count",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "is_active",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!(
            "capabilities",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
        ),
        sqlite_column!(
            "examples",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
        ),
        sqlite_column!(
            "child_friendly",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "elderly_friendly",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("complexity", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_models_category", "category")],
    unique_constraints: &[],
};

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[MODELS_TABLE_V_1],
    migration: None,
}];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn latest_schema_creates_and_validates() {
        let conn = Connection::open_in_memory().unwrap();
        let schema = CATALOG_VERSIONED_SCHEMAS.last().unwrap();
        schema.create(&conn).unwrap();
        schema.validate(&conn).unwrap();

        conn.execute(
            "INSERT INTO models (name, description, category, provider, provider_model_id)
             VALUES ('m', 'd', 'chat', 'gemini', 'gemini-1.5-pro')",
            [],
        )
        .unwrap();
        let (usage, active, capabilities): (i64, i64, String) = conn
            .query_row(
                "SELECT usage_count, is_active, capabilities FROM models",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!(usage, 0);
        assert_eq!(active, 1);
        assert_eq!(capabilities, "[]");
    }
}
