//! Assessment store: a single JSON array file, rewritten in full on every append.
//!
//! The file is healed rather than rejected when it is empty or unparsable. There is no locking;
//! callers must not run overlapping appends against the same path.

use crate::error::{AssessError, Result};
use crate::model::AssessmentRecord;
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tokio::task;

#[derive(Debug, Clone)]
pub struct AssessmentStore {
    path: PathBuf,
}

impl AssessmentStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Make sure the file exists and holds a JSON array.
    ///
    /// Missing files are created as `[]`; empty or unparsable ones are reset to `[]`.
    pub fn prepare(&self) -> Result<()> {
        let mut file = self.open_rw()?;
        let contents = read_contents(&mut file)?;

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Array(_)) => Ok(()),
            _ => {
                if !contents.is_empty() {
                    log::warn!(
                        "Assessment store {} is not a JSON array, resetting it to []",
                        self.path.display()
                    );
                }
                write_array(&mut file, &[])
            }
        }
    }

    /// Append one record: read the array, push, rewrite it through the same handle.
    pub fn append(&self, record: &AssessmentRecord) -> Result<()> {
        let mut file = self.open_rw()?;
        let contents = read_contents(&mut file)?;

        let mut records = match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                log::warn!(
                    "Assessment store {} held a non-array JSON value, replacing it",
                    self.path.display()
                );
                Vec::new()
            }
            Err(e) => {
                if !contents.trim().is_empty() {
                    log::warn!(
                        "Assessment store {} is corrupt ({}), resetting it to []",
                        self.path.display(),
                        e
                    );
                }
                Vec::new()
            }
        };

        records.push(serde_json::to_value(record)?);
        write_array(&mut file, &records)?;

        log::debug!(
            "Appended record to {} ({} total)",
            self.path.display(),
            records.len()
        );
        Ok(())
    }

    /// Read every record. A missing or empty file yields no records.
    pub fn read_all(&self) -> Result<Vec<AssessmentRecord>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            AssessError::StoreCorruption(format!("{}: {}", self.path.display(), e))
        })
    }

    /// Run a blocking store operation off the async runtime.
    pub async fn with_store<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&AssessmentStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| AssessError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }

    fn open_rw(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        Ok(OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&self.path)?)
    }
}

fn read_contents(file: &mut File) -> Result<String> {
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Overwrite the file from the start and drop any stale trailing bytes.
fn write_array(file: &mut File, records: &[Value]) -> Result<()> {
    let bytes = serde_json::to_vec(records)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&bytes)?;
    file.set_len(bytes.len() as u64)?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{score, Cutoff};
    use crate::model::{AssessmentSide, JudgedSource, RelevanceLabel};
    use tempfile::TempDir;

    fn record(query: &str) -> AssessmentRecord {
        let ratings = vec![
            JudgedSource { source_num: 1, score: RelevanceLabel::NotRelevant },
            JudgedSource { source_num: 2, score: RelevanceLabel::HighlyRelevant },
        ];
        let scores = score(&[RelevanceLabel::NotRelevant, RelevanceLabel::HighlyRelevant], Cutoff::Top(5));
        AssessmentRecord::success(
            query,
            Cutoff::Top(5),
            AssessmentSide {
                relevance_ratings: ratings,
                calculated_scores: scores,
                docs: None,
            },
            None,
            None,
        )
    }

    #[test]
    fn test_append_creates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = AssessmentStore::new(temp_dir.path().join("nested").join("assessment.json"));

        store.append(&record("q1")).unwrap();
        let records = store.read_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].query, "q1");
    }

    #[test]
    fn test_append_to_zero_byte_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("assessment.json");
        fs::write(&path, "").unwrap();
        let store = AssessmentStore::new(&path);

        store.append(&record("q1")).unwrap();
        assert_eq!(store.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_append_heals_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("assessment.json");
        fs::write(&path, "[{\"status\": \"succ").unwrap();
        let store = AssessmentStore::new(&path);

        store.append(&record("q1")).unwrap();
        let records = store.read_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].query, "q1");
    }

    #[test]
    fn test_append_replaces_non_array() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("assessment.json");
        fs::write(&path, "\"\"").unwrap();
        let store = AssessmentStore::new(&path);

        store.append(&record("q1")).unwrap();
        assert_eq!(store.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_appends_preserve_order_and_truncate() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("assessment.json");
        // Long garbage tail that a shorter rewrite must not leave behind
        fs::write(&path, format!("[]{}", " ".repeat(4096))).unwrap();
        let store = AssessmentStore::new(&path);

        for q in ["q1", "q2", "q3"] {
            store.append(&record(q)).unwrap();
        }

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.ends_with(']'));
        let queries: Vec<String> = store.read_all().unwrap().into_iter().map(|r| r.query).collect();
        assert_eq!(queries, vec!["q1", "q2", "q3"]);
    }

    #[test]
    fn test_unknown_fields_survive_rewrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("assessment.json");
        fs::write(&path, r#"[{"status": "error", "query": "old", "note": "kept"}]"#).unwrap();
        let store = AssessmentStore::new(&path);

        store.append(&record("new")).unwrap();
        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[0]["note"], "kept");
        assert_eq!(raw[1]["query"], "new");
    }

    #[test]
    fn test_prepare_resets_corrupt_and_keeps_valid() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("assessment.json");

        let store = AssessmentStore::new(&path);
        store.prepare().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");

        fs::write(&path, "not json").unwrap();
        store.prepare().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");

        store.append(&record("q1")).unwrap();
        store.prepare().unwrap();
        assert_eq!(store.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_read_all_missing_and_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("assessment.json");
        let store = AssessmentStore::new(&path);
        assert!(store.read_all().unwrap().is_empty());

        fs::write(&path, "{oops").unwrap();
        let err = store.read_all().unwrap_err();
        assert!(matches!(err, AssessError::StoreCorruption(_)));
    }

    #[tokio::test]
    async fn test_with_store_runs_blocking() {
        let temp_dir = TempDir::new().unwrap();
        let store = AssessmentStore::new(temp_dir.path().join("assessment.json"));

        let rec = record("async");
        store.with_store(move |s| s.append(&rec)).await.unwrap();
        let records = store.with_store(|s| s.read_all()).await.unwrap();
        assert_eq!(records.len(), 1);
    }
}
