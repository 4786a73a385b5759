//! SQLite-backed catalog store.

use super::models::*;
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use super::trait_def::CatalogStore;
use super::validation::validate_rating;
use crate::sqlite_persistence::open_versioned_database;
use anyhow::{Context, Result};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

const MODEL_COLUMNS: &str = "id, name, description, image_url, category, provider, \
     provider_model_id, rating, usage_count, is_active, capabilities, examples, \
     child_friendly, elderly_friendly, complexity";

#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

fn conversion_error(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, message.into())
}

fn model_from_row(row: &Row) -> rusqlite::Result<Model> {
    let category: String = row.get(4)?;
    let provider: String = row.get(5)?;
    let capabilities: String = row.get(10)?;
    let examples: String = row.get(11)?;
    let complexity: Option<String> = row.get(14)?;

    Ok(Model {
        id: row.get::<_, i64>(0)? as u64,
        name: row.get(1)?,
        description: row.get(2)?,
        image_url: row.get(3)?,
        category: ModelCategory::from_db_str(&category)
            .ok_or_else(|| conversion_error(4, format!("Unknown category '{}'", category)))?,
        provider: Provider::from_db_str(&provider)
            .ok_or_else(|| conversion_error(5, format!("Unknown provider '{}'", provider)))?,
        provider_model_id: row.get(6)?,
        rating: row.get(7)?,
        usage_count: row.get::<_, i64>(8)? as u64,
        is_active: row.get::<_, i64>(9)? != 0,
        capabilities: serde_json::from_str(&capabilities)
            .map_err(|e| conversion_error(10, e.to_string()))?,
        examples: serde_json::from_str(&examples)
            .map_err(|e| conversion_error(11, e.to_string()))?,
        child_friendly: row.get::<_, i64>(12)? != 0,
        elderly_friendly: row.get::<_, i64>(13)? != 0,
        complexity: complexity.as_deref().and_then(Complexity::from_db_str),
    })
}

impl SqliteCatalogStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned_database(db_path.as_ref(), CATALOG_VERSIONED_SCHEMAS, "catalog")?;
        Ok(SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn query_models(&self, where_clause: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Model>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM models {} ORDER BY id ASC",
            MODEL_COLUMNS, where_clause
        ))?;
        let models = stmt
            .query_map(params, model_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read models")?;
        Ok(models)
    }

    fn insert(&self, model: NewModel, rating: f64, usage_count: u64) -> Result<Model> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO models (name, description, image_url, category, provider, provider_model_id,
                rating, usage_count, is_active, capabilities, examples, child_friendly,
                elderly_friendly, complexity)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                model.name,
                model.description,
                model.image_url,
                model.category.to_db_str(),
                model.provider.to_db_str(),
                model.provider_model_id,
                rating,
                usage_count as i64,
                model.is_active as i64,
                serde_json::to_string(&model.capabilities)?,
                serde_json::to_string(&model.examples)?,
                model.child_friendly as i64,
                model.elderly_friendly as i64,
                model.complexity.as_ref().map(Complexity::to_db_str),
            ],
        )
        .with_context(|| format!("Failed to insert model '{}'", model.name))?;
        let id = conn.last_insert_rowid() as u64;
        Ok(model.into_model(id, rating, usage_count))
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn list_models(&self) -> Result<Vec<Model>> {
        self.query_models("WHERE is_active = 1", &[])
    }

    fn list_all_models(&self) -> Result<Vec<Model>> {
        self.query_models("", &[])
    }

    fn get_model(&self, id: u64) -> Result<Option<Model>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {} FROM models WHERE id = ?1", MODEL_COLUMNS),
            params![id as i64],
            model_from_row,
        )
        .optional()
        .with_context(|| format!("Failed to read model {}", id))
    }

    fn get_models_by_category(&self, category: ModelCategory) -> Result<Vec<Model>> {
        self.query_models(
            "WHERE is_active = 1 AND category = ?1",
            &[&category.to_db_str()],
        )
    }

    fn count_models(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM models", [], |r| r.get(0))?;
        Ok(count as usize)
    }

    fn create_model(&self, model: NewModel) -> Result<Model> {
        self.insert(model, 0.0, 0)
    }

    fn insert_seed_model(&self, model: NewModel, rating: f64, usage_count: u64) -> Result<Model> {
        validate_rating(rating)?;
        self.insert(model, rating, usage_count)
    }

    fn increment_usage_count(&self, id: u64) -> Result<Option<u64>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "UPDATE models SET usage_count = usage_count + 1 WHERE id = ?1 RETURNING usage_count",
            params![id as i64],
            |r| r.get::<_, i64>(0),
        )
        .optional()
        .map(|count| count.map(|c| c as u64))
        .with_context(|| format!("Failed to increment usage count of model {}", id))
    }

    fn set_model_active(&self, id: u64, active: bool) -> Result<Option<Model>> {
        let updated = {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                "UPDATE models SET is_active = ?1 WHERE id = ?2",
                params![active as i64, id as i64],
            )?
        };
        if updated == 0 {
            return Ok(None);
        }
        self.get_model(id)
    }
}
