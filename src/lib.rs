pub mod app;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::collection_service::{CollectionService, Collections};
pub use domain::model::{CollectionModel, HistoryModel, ModelRegistry, ProgramModel, TraineeModel};
pub use storage::{ArrayFileStore, StoreError};
