use super::{CollectionModel, TRAINEE_ID_FIELD};

/// Trainees: list, create-or-replace, delete.
pub struct TraineeModel;

impl CollectionModel for TraineeModel {
    fn name(&self) -> &'static str {
        "trainees"
    }

    fn file_name(&self) -> &'static str {
        "trainees.json"
    }
}

/// Training programs, scoped to a trainee by `traineeId`.
pub struct ProgramModel;

impl CollectionModel for ProgramModel {
    fn name(&self) -> &'static str {
        "programs"
    }

    fn file_name(&self) -> &'static str {
        "programs.json"
    }

    fn scope_field(&self) -> Option<&'static str> {
        Some(TRAINEE_ID_FIELD)
    }
}

/// Audit log of actions taken against trainees and programs. Append-only:
/// entries can be replaced by id but never deleted.
pub struct HistoryModel;

impl CollectionModel for HistoryModel {
    fn name(&self) -> &'static str {
        "history"
    }

    fn file_name(&self) -> &'static str {
        "history.json"
    }

    fn scope_field(&self) -> Option<&'static str> {
        Some(TRAINEE_ID_FIELD)
    }

    fn supports_delete(&self) -> bool {
        false
    }
}
