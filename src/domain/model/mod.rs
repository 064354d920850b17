//! Collection definitions: which file backs an entity type and which
//! operations its service offers.

pub mod collections;
pub mod registry;

pub use collections::{HistoryModel, ProgramModel, TraineeModel};
pub use registry::ModelRegistry;

/// Field that scopes programs and history entries to one trainee.
pub const TRAINEE_ID_FIELD: &str = "traineeId";

/// Contract for a collection backed by one JSON array file.
///
/// The store never looks inside records beyond `id` and the scope field, so a
/// model is only naming and capabilities, not a schema.
pub trait CollectionModel: Send + Sync {
    /// Name used in routes and logs (e.g. `trainees`).
    fn name(&self) -> &'static str;

    /// File name inside the data directory.
    fn file_name(&self) -> &'static str;

    /// Foreign-key-like field that `list_by_trainee` filters on, if any.
    fn scope_field(&self) -> Option<&'static str> {
        None
    }

    fn supports_delete(&self) -> bool {
        true
    }
}
