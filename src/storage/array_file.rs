//! One JSON array in one file, mutated textually under a per-file lock.
//!
//! Every operation is a full cycle: read the whole file, splice text, write
//! the whole file back. Nothing is cached between calls. A write goes to a
//! sibling temp file first, is synced, and is renamed over the original, so
//! a failed write leaves the last committed array body in place.
//!
//! Surrogate ids start from wall-clock milliseconds but are bumped past the
//! last id this store handed out, so under bursts an assigned id can run
//! ahead of the clock. They are unique per store instance, not exact
//! timestamps.

use crate::storage::codec;
use crate::storage::error::{Result, StoreError};
use parking_lot::{Mutex, MutexGuard};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const EMPTY_ARRAY: &str = "[]";

/// Source of surrogate identifiers. Lives inside the store's mutex.
#[derive(Debug, Default)]
struct IdClock {
    last: i64,
}

impl IdClock {
    /// Milliseconds since the epoch, bumped past the previous value when two
    /// inserts land in the same millisecond.
    fn next(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        self.last = now.max(self.last + 1);
        self.last
    }
}

pub struct ArrayFileStore {
    path: PathBuf,
    lock: Mutex<IdClock>,
}

/// Exclusive access to one collection file for the lifetime of the guard.
///
/// The guard is the only way to touch the file; the convenience methods on
/// [`ArrayFileStore`] each take one for a single operation. It is not
/// re-entrant: taking a second guard on the same store from the same thread
/// deadlocks.
pub struct StoreGuard<'a> {
    path: &'a Path,
    clock: MutexGuard<'a, IdClock>,
}

impl ArrayFileStore {
    /// Does not touch the disk; see [`ArrayFileStore::ensure_initialized`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(IdClock::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates parent directories and writes `[]` if the file is absent.
    /// Returns whether the file had to be created.
    pub fn ensure_initialized(&self) -> Result<bool> {
        let _guard = self.lock.lock();
        if self.path.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        write_replacing(&self.path, EMPTY_ARRAY)?;
        Ok(true)
    }

    /// Blocks until the collection lock is free.
    pub fn lock(&self) -> StoreGuard<'_> {
        StoreGuard {
            path: &self.path,
            clock: self.lock.lock(),
        }
    }

    #[cfg(test)]
    fn try_lock(&self) -> Option<StoreGuard<'_>> {
        self.lock.try_lock().map(|clock| StoreGuard {
            path: &self.path,
            clock,
        })
    }

    pub fn load(&self) -> Result<String> {
        self.lock().load()
    }

    pub fn get(&self, id: &str) -> Result<Option<String>> {
        self.lock().get(id)
    }

    pub fn upsert(&self, record: &str) -> Result<String> {
        self.lock().upsert(record)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.lock().delete(id)
    }

    pub fn filter(&self, field: &str, value: &str) -> Result<String> {
        self.lock().filter(field, value)
    }
}

impl StoreGuard<'_> {
    /// Whole file, trimmed. Empty content reads as `[]`.
    pub fn load(&self) -> Result<String> {
        let content = fs::read_to_string(self.path)?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(EMPTY_ARRAY.to_string());
        }
        Ok(trimmed.to_string())
    }

    /// Like `load`, but a body that is not `[...]` is reported as a corrupt
    /// file rather than bad input.
    fn load_array(&self) -> Result<String> {
        let body = self.load()?;
        if let Err(StoreError::MalformedRecord(reason)) = codec::array_inner(&body) {
            return Err(StoreError::CorruptCollection {
                path: self.path.display().to_string(),
                reason,
            });
        }
        Ok(body)
    }

    pub fn get(&self, id: &str) -> Result<Option<String>> {
        let body = self.load()?;
        Ok(codec::locate_record(&body, id).map(|(start, end)| body[start..end].to_string()))
    }

    /// Insert-or-replace. A record with an id replaces any record sharing it
    /// and moves to the end of the array; a record without one gets a fresh
    /// surrogate id appended as its last field. `"id":null` and `"id":""`
    /// count as no id: the token is swapped for a fresh one in place.
    pub fn upsert(&mut self, record: &str) -> Result<String> {
        let record = record.trim();
        if !record.starts_with('{') || !record.ends_with('}') {
            return Err(StoreError::MalformedRecord(
                "record must be a single JSON object".to_string(),
            ));
        }

        let mut body = self.load_array()?;
        let stored = match codec::field_token(record, codec::ID_FIELD) {
            Some(token) if codec::is_unassigned_id(token) => {
                let id = self.clock.next();
                codec::replace_id(record, &id.to_string())?
            }
            Some(_) => {
                let id = codec::extract_id(record)?;
                if let Some(without) = remove_record(&body, &id) {
                    body = without;
                }
                record.to_string()
            }
            None => {
                let id = self.clock.next();
                codec::assign_id(record, &id.to_string())?
            }
        };

        let updated = append_record(&body, &stored)?;
        self.write(&updated)?;
        Ok(stored)
    }

    /// Removes the record with `id`. Missing ids leave the file untouched.
    pub fn delete(&self, id: &str) -> Result<()> {
        let body = self.load_array()?;
        match remove_record(&body, id) {
            Some(updated) => self.write(&updated),
            None => Ok(()),
        }
    }

    /// Records whose `field` token equals `value`, bare or quoted, in file order.
    pub fn filter(&self, field: &str, value: &str) -> Result<String> {
        let body = self.load_array()?;
        let records = codec::split_into_records(&body)?;
        let matching = records.into_iter().filter(|record| {
            codec::field_token(record, field).is_some_and(|token| codec::token_matches(token, value))
        });
        Ok(codec::join_records(matching))
    }

    fn write(&self, body: &str) -> Result<()> {
        write_replacing(self.path, body)
    }
}

/// Splices `record` in before the closing bracket.
fn append_record(body: &str, record: &str) -> Result<String> {
    let inner = codec::array_inner(body)?;
    if inner.trim().is_empty() {
        return Ok(format!("[{}]", record));
    }
    let trimmed = body.trim();
    let close = trimmed.len() - 1;
    Ok(format!("{},{}]", trimmed[..close].trim_end(), record))
}

/// Cuts the record with `id` out of `body` and repairs the commas around the
/// hole. `None` when no record has that id.
fn remove_record(body: &str, id: &str) -> Option<String> {
    let (start, end) = codec::locate_record(body, id)?;
    let mut before = body[..start].trim();
    let mut after = body[end..].trim();

    if before.ends_with(',') && (after.is_empty() || after.starts_with(']')) {
        // last element
        before = &before[..before.len() - 1];
    } else if before.ends_with('[') && after.starts_with(',') {
        // first element
        after = &after[1..];
    } else if before.ends_with(',') && after.starts_with(',') {
        // interior element
        after = &after[1..];
    }

    Some(format!("{}{}", before.trim_end(), after.trim_start()))
}

fn write_replacing(path: &Path, body: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("collection");
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));
    let mut file = fs::File::create(&tmp)?;
    if let Err(e) = file.write_all(body.as_bytes()).and_then(|_| file.sync_all()) {
        drop(file);
        let _ = fs::remove_file(&tmp);
        return Err(StoreError::Io(e));
    }
    drop(file);
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(StoreError::Io(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn setup(initial: Option<&str>) -> (TempDir, ArrayFileStore) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");
        if let Some(content) = initial {
            fs::write(&path, content).unwrap();
        }
        let store = ArrayFileStore::new(path);
        store.ensure_initialized().unwrap();
        (dir, store)
    }

    fn on_disk(store: &ArrayFileStore) -> String {
        fs::read_to_string(store.path()).unwrap()
    }

    #[test]
    fn ensure_initialized_creates_empty_array_once() {
        let dir = TempDir::new().unwrap();
        let store = ArrayFileStore::new(dir.path().join("nested").join("t.json"));
        assert!(store.ensure_initialized().unwrap());
        assert_eq!(on_disk(&store), "[]");
        store.upsert(r#"{"id":1}"#).unwrap();
        assert!(!store.ensure_initialized().unwrap());
        assert_eq!(on_disk(&store), r#"[{"id":1}]"#);
    }

    #[test]
    fn load_treats_blank_file_as_empty_array() {
        let (_dir, store) = setup(Some("  \n"));
        assert_eq!(store.load().unwrap(), "[]");
    }

    #[test]
    fn upsert_replaces_existing_record() {
        let (_dir, store) = setup(Some(r#"[{"id":1,"name":"Al"}]"#));
        let stored = store.upsert(r#"{"id":1,"name":"Ali"}"#).unwrap();
        assert_eq!(stored, r#"{"id":1,"name":"Ali"}"#);
        assert_eq!(store.load().unwrap(), r#"[{"id":1,"name":"Ali"}]"#);
    }

    #[test]
    fn upsert_without_id_assigns_one() {
        let (_dir, store) = setup(None);
        let stored = store.upsert(r#"{"name":"Bo"}"#).unwrap();
        let id = codec::extract_id(&stored).unwrap();
        assert!(id.parse::<i64>().unwrap() > 0);
        assert_eq!(stored, format!(r#"{{"name":"Bo","id":{}}}"#, id));
        assert_eq!(store.load().unwrap(), format!("[{}]", stored));
    }

    #[test]
    fn upsert_moves_replaced_record_to_end() {
        let (_dir, store) = setup(Some(r#"[{"id":1},{"id":2},{"id":3}]"#));
        store.upsert(r#"{"id":1,"v":true}"#).unwrap();
        assert_eq!(
            store.load().unwrap(),
            r#"[{"id":2},{"id":3},{"id":1,"v":true}]"#
        );
    }

    #[test]
    fn upsert_never_duplicates_ids() {
        let (_dir, store) = setup(None);
        for round in 0..3 {
            for id in 1..=4 {
                store
                    .upsert(&format!(r#"{{"id":{},"round":{}}}"#, id, round))
                    .unwrap();
            }
        }
        let body = store.load().unwrap();
        let records = codec::split_into_records(&body).unwrap();
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.contains(r#""round":2"#)));
    }

    #[test]
    fn auto_ids_are_unique_within_one_millisecond() {
        let (_dir, store) = setup(None);
        let ids: Vec<String> = (0..50)
            .map(|_| codec::extract_id(&store.upsert(r#"{"n":1}"#).unwrap()).unwrap())
            .collect();
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[test]
    fn upsert_rejects_non_object_text() {
        let (_dir, store) = setup(None);
        assert!(matches!(
            store.upsert("[1,2]"),
            Err(StoreError::MalformedRecord(_))
        ));
        assert_eq!(on_disk(&store), "[]");
    }

    #[test]
    fn delete_first_interior_last_and_only() {
        let (_dir, store) = setup(Some(r#"[{"id":1},{"id":2},{"id":3},{"id":4}]"#));
        store.delete("2").unwrap();
        assert_eq!(store.load().unwrap(), r#"[{"id":1},{"id":3},{"id":4}]"#);
        store.delete("1").unwrap();
        assert_eq!(store.load().unwrap(), r#"[{"id":3},{"id":4}]"#);
        store.delete("4").unwrap();
        assert_eq!(store.load().unwrap(), r#"[{"id":3}]"#);
        store.delete("3").unwrap();
        assert_eq!(store.load().unwrap(), "[]");
    }

    #[test]
    fn delete_is_idempotent() {
        let (_dir, store) = setup(Some(r#"[{"id":1},{"id":2}]"#));
        store.delete("1").unwrap();
        let first = on_disk(&store);
        store.delete("1").unwrap();
        assert_eq!(on_disk(&store), first);
        assert_eq!(first, r#"[{"id":2}]"#);
    }

    #[test]
    fn delete_handles_pretty_printed_arrays() {
        let (_dir, store) = setup(Some("[\n  {\"id\":1},\n  {\"id\":2}\n]\n"));
        store.delete("2").unwrap();
        assert_eq!(
            codec::split_into_records(&store.load().unwrap()).unwrap(),
            vec![r#"{"id":1}"#]
        );
        store.upsert(r#"{"id":5}"#).unwrap();
        assert_eq!(
            codec::split_into_records(&store.load().unwrap()).unwrap(),
            vec![r#"{"id":1}"#, r#"{"id":5}"#]
        );
    }

    #[test]
    fn get_returns_record_text() {
        let (_dir, store) = setup(Some(r#"[{"id":"a","x":1},{"id":"b","x":2}]"#));
        assert_eq!(store.get("b").unwrap().as_deref(), Some(r#"{"id":"b","x":2}"#));
        assert_eq!(store.get("c").unwrap(), None);
    }

    #[test]
    fn filter_matches_exact_literal_values() {
        let (_dir, store) = setup(Some(
            r#"[{"id":1,"traineeId":7},{"id":2,"traineeId":8},{"id":3,"traineeId":"7"},{"id":4,"traineeId":77}]"#,
        ));
        assert_eq!(
            store.filter("traineeId", "7").unwrap(),
            r#"[{"id":1,"traineeId":7},{"id":3,"traineeId":"7"}]"#
        );
        assert_eq!(store.filter("traineeId", "9").unwrap(), "[]");
    }

    #[test]
    fn filter_on_empty_store() {
        let (_dir, store) = setup(None);
        assert_eq!(store.filter("traineeId", "7").unwrap(), "[]");
    }

    #[test]
    fn filter_rejects_corrupt_file() {
        let (_dir, store) = setup(Some("not json"));
        assert!(matches!(
            store.filter("traineeId", "7"),
            Err(StoreError::CorruptCollection { .. })
        ));
    }

    #[test]
    fn upsert_into_corrupt_file_blames_the_file() {
        let (_dir, store) = setup(Some(r#"{"id":1}"#));
        assert!(matches!(
            store.upsert(r#"{"id":2}"#),
            Err(StoreError::CorruptCollection { .. })
        ));
        assert!(matches!(
            store.delete("1"),
            Err(StoreError::CorruptCollection { .. })
        ));
        assert_eq!(on_disk(&store), r#"{"id":1}"#);
    }

    #[test]
    fn null_or_empty_id_gets_a_fresh_one() {
        let (_dir, store) = setup(None);
        let a = store.upsert(r#"{"id":null,"name":"A"}"#).unwrap();
        let b = store.upsert(r#"{"id":null,"name":"B"}"#).unwrap();
        let c = store.upsert(r#"{"id":"","name":"C"}"#).unwrap();

        let ids: Vec<i64> = [&a, &b, &c]
            .iter()
            .map(|r| codec::extract_id(r).unwrap().parse::<i64>().unwrap())
            .collect();
        assert!(ids[0] < ids[1] && ids[1] < ids[2]);
        assert_eq!(a, format!(r#"{{"id":{},"name":"A"}}"#, ids[0]));
        assert_eq!(c, format!(r#"{{"id":{},"name":"C"}}"#, ids[2]));
        assert_eq!(store.load().unwrap(), format!("[{},{},{}]", a, b, c));
    }

    #[test]
    fn quoted_and_bare_ids_name_the_same_record() {
        let (_dir, store) = setup(Some(r#"[{"id":5,"n":"bare"},{"id":6}]"#));
        store.upsert(r#"{"id":"5","n":"quoted"}"#).unwrap();
        assert_eq!(
            store.load().unwrap(),
            r#"[{"id":6},{"id":"5","n":"quoted"}]"#
        );
    }

    #[test]
    fn failed_write_keeps_last_committed_body() {
        let (dir, store) = setup(Some(r#"[{"id":1}]"#));
        let blocker = dir.path().join(".records.json.tmp");
        fs::create_dir(&blocker).unwrap();

        assert!(matches!(
            store.upsert(r#"{"id":2}"#),
            Err(StoreError::Io(_))
        ));
        assert_eq!(on_disk(&store), r#"[{"id":1}]"#);

        fs::remove_dir(&blocker).unwrap();
        store.upsert(r#"{"id":2}"#).unwrap();
        assert_eq!(store.load().unwrap(), r#"[{"id":1},{"id":2}]"#);
    }

    #[test]
    fn guard_excludes_other_callers() {
        let (_dir, store) = setup(None);
        let guard = store.lock();
        assert!(store.try_lock().is_none());
        drop(guard);
        assert!(store.try_lock().is_some());
    }

    #[test]
    fn guard_spans_multiple_operations() {
        let (_dir, store) = setup(None);
        let mut guard = store.lock();
        guard.upsert(r#"{"id":1}"#).unwrap();
        guard.upsert(r#"{"id":2}"#).unwrap();
        guard.delete("1").unwrap();
        assert_eq!(guard.load().unwrap(), r#"[{"id":2}]"#);
    }

    #[test]
    fn concurrent_upserts_lose_nothing() {
        let (_dir, store) = setup(None);
        let store = Arc::new(store);
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..25 {
                        store
                            .upsert(&format!(r#"{{"id":"{}-{}","traineeId":{}}}"#, t, i, t))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let body = store.load().unwrap();
        assert_eq!(codec::split_into_records(&body).unwrap().len(), 200);
        let for_three = store.filter("traineeId", "3").unwrap();
        assert_eq!(codec::split_into_records(&for_three).unwrap().len(), 25);
    }

    #[test]
    fn no_temp_file_left_behind() {
        let (dir, store) = setup(None);
        store.upsert(r#"{"id":1}"#).unwrap();
        for entry in fs::read_dir(dir.path()).unwrap() {
            let name = entry.unwrap().file_name();
            assert!(!name.to_string_lossy().ends_with(".tmp"));
        }
    }
}
