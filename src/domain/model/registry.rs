//! ModelRegistry for mapping collection names to CollectionModel implementations.

use crate::domain::model::{CollectionModel, HistoryModel, ProgramModel, TraineeModel};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A registry that maps collection names to their CollectionModel implementations.
pub struct ModelRegistry {
    models: BTreeMap<String, Arc<dyn CollectionModel>>,
}

impl ModelRegistry {
    /// Creates a new empty ModelRegistry.
    pub fn new() -> Self {
        Self {
            models: BTreeMap::new(),
        }
    }

    /// The three collections the app serves.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(TraineeModel);
        registry.register(ProgramModel);
        registry.register(HistoryModel);
        registry
    }

    /// Registers a model under its own name, replacing any previous one.
    pub fn register<M: CollectionModel + 'static>(&mut self, model: M) {
        self.models.insert(model.name().to_string(), Arc::new(model));
    }

    /// Returns None if the model is not registered.
    pub fn get(&self, name: &str) -> Option<Arc<dyn CollectionModel>> {
        self.models.get(name).cloned()
    }

    /// Returns all registered model names, sorted.
    pub fn list_models(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    pub fn models(&self) -> impl Iterator<Item = Arc<dyn CollectionModel>> + '_ {
        self.models.values().cloned()
    }
}
