//! Process-memory catalog store, used when no database directory is
//! configured and throughout the unit tests.

use super::models::{Model, ModelCategory, NewModel};
use super::trait_def::CatalogStore;
use super::validation::validate_rating;
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct CatalogState {
    next_id: u64,
    models: BTreeMap<u64, Model>,
}

#[derive(Default)]
pub struct InMemoryCatalogStore {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CatalogState>> {
        self.state
            .read()
            .map_err(|_| anyhow!("In-memory catalog lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CatalogState>> {
        self.state
            .write()
            .map_err(|_| anyhow!("In-memory catalog lock poisoned"))
    }

    fn insert(&self, model: NewModel, rating: f64, usage_count: u64) -> Result<Model> {
        let mut state = self.write()?;
        state.next_id += 1;
        let model = model.into_model(state.next_id, rating, usage_count);
        state.models.insert(model.id, model.clone());
        Ok(model)
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn list_models(&self) -> Result<Vec<Model>> {
        Ok(self
            .read()?
            .models
            .values()
            .filter(|m| m.is_active)
            .cloned()
            .collect())
    }

    fn list_all_models(&self) -> Result<Vec<Model>> {
        Ok(self.read()?.models.values().cloned().collect())
    }

    fn get_model(&self, id: u64) -> Result<Option<Model>> {
        Ok(self.read()?.models.get(&id).cloned())
    }

    fn get_models_by_category(&self, category: ModelCategory) -> Result<Vec<Model>> {
        Ok(self
            .read()?
            .models
            .values()
            .filter(|m| m.is_active && m.category == category)
            .cloned()
            .collect())
    }

    fn count_models(&self) -> Result<usize> {
        Ok(self.read()?.models.len())
    }

    fn create_model(&self, model: NewModel) -> Result<Model> {
        self.insert(model, 0.0, 0)
    }

    fn insert_seed_model(&self, model: NewModel, rating: f64, usage_count: u64) -> Result<Model> {
        validate_rating(rating)?;
        self.insert(model, rating, usage_count)
    }

    fn increment_usage_count(&self, id: u64) -> Result<Option<u64>> {
        let mut state = self.write()?;
        Ok(state.models.get_mut(&id).map(|model| {
            model.usage_count += 1;
            model.usage_count
        }))
    }

    fn set_model_active(&self, id: u64, active: bool) -> Result<Option<Model>> {
        let mut state = self.write()?;
        Ok(state.models.get_mut(&id).map(|model| {
            model.is_active = active;
            model.clone()
        }))
    }
}
