//! The Collection Service.
//!
//! Thin layer between the HTTP handlers and the array file stores. It is
//! responsible for:
//! 1.  Creating the data directory and one `[]` file per collection at startup.
//! 2.  Mapping each request shape onto exactly one store operation.
//! 3.  Refusing operations a collection does not offer (history delete,
//!     trainee scoping).
//!
//! No joins, no referential checks: deleting a trainee leaves its programs
//! and history in place.

use crate::domain::model::{CollectionModel, ModelRegistry};
use crate::storage::{codec, ArrayFileStore, Result, StoreError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// One collection: its model plus the store that owns its file.
pub struct CollectionService {
    model: Arc<dyn CollectionModel>,
    store: ArrayFileStore,
}

impl CollectionService {
    pub fn new(model: Arc<dyn CollectionModel>, data_dir: &Path) -> Self {
        let store = ArrayFileStore::new(data_dir.join(model.file_name()));
        Self { model, store }
    }

    pub fn name(&self) -> &'static str {
        self.model.name()
    }

    pub fn store(&self) -> &ArrayFileStore {
        &self.store
    }

    pub fn list(&self) -> Result<String> {
        self.store.load()
    }

    /// Records whose scope field (`traineeId`) equals `trainee_id`.
    pub fn list_by_trainee(&self, trainee_id: &str) -> Result<String> {
        let field = self.model.scope_field().ok_or(StoreError::Unsupported {
            collection: self.name(),
            operation: "list by trainee",
        })?;
        self.store.filter(field, trainee_id)
    }

    pub fn get(&self, id: &str) -> Result<String> {
        self.store.get(id)?.ok_or_else(|| StoreError::NotFound {
            collection: self.name().to_string(),
            id: id.to_string(),
        })
    }

    /// Stores `record` and returns it with its identifier filled in.
    pub fn create_or_replace(&self, record: &str) -> Result<String> {
        let stored = self.store.upsert(record)?;
        if tracing::enabled!(tracing::Level::DEBUG) {
            let id = codec::extract_id(&stored).unwrap_or_default();
            debug!(collection = self.name(), id = %id, "stored record");
        }
        Ok(stored)
    }

    /// Idempotent; deleting an unknown id succeeds.
    pub fn delete(&self, id: &str) -> Result<()> {
        if !self.model.supports_delete() {
            return Err(StoreError::Unsupported {
                collection: self.name(),
                operation: "delete",
            });
        }
        self.store.delete(id)?;
        debug!(collection = self.name(), id, "deleted record");
        Ok(())
    }
}

/// All collection services of the app, keyed by collection name.
pub struct Collections {
    data_dir: PathBuf,
    services: BTreeMap<&'static str, Arc<CollectionService>>,
}

impl Collections {
    /// Opens every registered collection under `data_dir`, creating missing
    /// files as `[]`.
    pub fn open(data_dir: impl Into<PathBuf>, registry: &ModelRegistry) -> Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;

        let mut services = BTreeMap::new();
        for model in registry.models() {
            let service = CollectionService::new(model, &data_dir);
            if service.store.ensure_initialized()? {
                info!(path = %service.store.path().display(), "created data file");
            }
            services.insert(service.name(), Arc::new(service));
        }
        Ok(Self { data_dir, services })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn get(&self, name: &str) -> Option<Arc<CollectionService>> {
        self.services.get(name).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<CollectionService>> {
        self.services.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open() -> (TempDir, Collections) {
        let dir = TempDir::new().unwrap();
        let collections =
            Collections::open(dir.path().join("data"), &ModelRegistry::with_defaults()).unwrap();
        (dir, collections)
    }

    #[test]
    fn open_creates_one_file_per_collection() {
        let (dir, collections) = open();
        for file in ["trainees.json", "programs.json", "history.json"] {
            let content = std::fs::read_to_string(dir.path().join("data").join(file)).unwrap();
            assert_eq!(content, "[]");
        }
        assert_eq!(collections.iter().count(), 3);
        assert!(collections.get("workouts").is_none());
    }

    #[test]
    fn programs_are_scoped_by_trainee() {
        let (_dir, collections) = open();
        let programs = collections.get("programs").unwrap();
        programs
            .create_or_replace(r#"{"traineeId":7,"title":"Push"}"#)
            .unwrap();
        programs
            .create_or_replace(r#"{"traineeId":8,"title":"Pull"}"#)
            .unwrap();
        let scoped = programs.list_by_trainee("7").unwrap();
        let records = codec::split_into_records(&scoped).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].contains(r#""title":"Push""#));
    }

    #[test]
    fn trainees_have_no_scope_filter() {
        let (_dir, collections) = open();
        let err = collections
            .get("trainees")
            .unwrap()
            .list_by_trainee("1")
            .unwrap_err();
        assert!(matches!(err, StoreError::Unsupported { .. }));
    }

    #[test]
    fn history_refuses_delete() {
        let (_dir, collections) = open();
        let history = collections.get("history").unwrap();
        history
            .create_or_replace(r#"{"id":1,"traineeId":7,"action":"created"}"#)
            .unwrap();
        assert!(matches!(
            history.delete("1"),
            Err(StoreError::Unsupported { .. })
        ));
        assert_eq!(
            history.list().unwrap(),
            r#"[{"id":1,"traineeId":7,"action":"created"}]"#
        );
    }

    #[test]
    fn deleting_trainee_does_not_cascade() {
        let (_dir, collections) = open();
        let trainees = collections.get("trainees").unwrap();
        let programs = collections.get("programs").unwrap();
        trainees.create_or_replace(r#"{"id":5,"name":"Al"}"#).unwrap();
        programs
            .create_or_replace(r#"{"id":9,"traineeId":5}"#)
            .unwrap();
        trainees.delete("5").unwrap();
        trainees.delete("5").unwrap();
        assert_eq!(trainees.list().unwrap(), "[]");
        assert_eq!(programs.list_by_trainee("5").unwrap(), r#"[{"id":9,"traineeId":5}]"#);
    }

    #[test]
    fn get_reports_not_found() {
        let (_dir, collections) = open();
        let trainees = collections.get("trainees").unwrap();
        trainees.create_or_replace(r#"{"id":"x","name":"Al"}"#).unwrap();
        assert_eq!(trainees.get("x").unwrap(), r#"{"id":"x","name":"Al"}"#);
        assert!(matches!(
            trainees.get("y"),
            Err(StoreError::NotFound { .. })
        ));
    }
}
