use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use mcqgen_core::{Chunk, GenerationResult};
use tracing::{info, warn};

use crate::error::StoreError;
use crate::record::{McqRecord, QuestionSet, RecordParams, RecordSummary};

/// Directory of question records.
///
/// ```text
/// generated_mcq/
///   mcq_lecture_notes_20250101_120000.json
///   mcq_lecture_notes_20250101_120000_1.json   <- same second, same source
/// ```
///
/// Records are addressed by bare file name (the "key"). Keys containing a
/// path separator or `..` are rejected.
pub struct McqStore {
    base_dir: PathBuf,
}

/// `mcq_{stem}_{YYYYmmdd_HHMMSS}.json`, with spaces and dots in the source
/// stem replaced by `_`.
pub fn record_filename(source_filename: &str, at: DateTime<Local>) -> String {
    let stem = Path::new(source_filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let clean = stem.replace([' ', '.'], "_");
    format!("mcq_{}_{}.json", clean, at.format("%Y%m%d_%H%M%S"))
}

fn check_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

impl McqStore {
    /// Create a store, ensuring the directory exists.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        info!("MCQ storage initialized - Directory: {}", base_dir.display());
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        check_key(key)?;
        Ok(self.base_dir.join(key))
    }

    // ── Writing ─────────────────────────────────────────────────

    /// Persist one document's chunks and results. Returns the new record's key.
    pub fn save(
        &self,
        source_filename: &str,
        chunks: Vec<Chunk>,
        mcq_results: Vec<GenerationResult>,
        params: RecordParams,
    ) -> Result<String, StoreError> {
        let record = McqRecord::new(source_filename, chunks, mcq_results, params);
        self.save_record(&record)
    }

    /// Write an already-built record under a fresh name.
    pub fn save_record(&self, record: &McqRecord) -> Result<String, StoreError> {
        let base = record_filename(&record.metadata.source_filename, Local::now());
        let json = serde_json::to_string_pretty(record)?;

        let stem = base.trim_end_matches(".json");
        let mut attempt = 0usize;
        loop {
            let key = if attempt == 0 {
                base.clone()
            } else {
                format!("{stem}_{attempt}.json")
            };
            let path = self.base_dir.join(&key);
            // create_new refuses to clobber a record written in the same second.
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(file) => {
                    write_or_remove(&path, file, json.as_bytes())?;
                    info!("MCQs saved to: {}", key);
                    info!(
                        "Total questions saved: {}",
                        record.metadata.total_questions
                    );
                    return Ok(key);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    // ── Reading ─────────────────────────────────────────────────

    pub fn load(&self, key: &str) -> Result<McqRecord, StoreError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        let json = fs::read_to_string(&path)?;
        let record: McqRecord = serde_json::from_str(&json)?;
        info!(
            "Loaded {} questions from {}",
            record.metadata.total_questions, key
        );
        Ok(record)
    }

    /// Every question of a record's successful results, plus the stored total.
    pub fn load_questions(&self, key: &str) -> Result<QuestionSet, StoreError> {
        Ok(self.load(key)?.questions())
    }

    /// All records, newest first. Records that cannot be read are still
    /// listed, with `source_filename = "Unknown"` and zero totals, after all
    /// readable ones.
    pub fn list_summaries(&self) -> Result<Vec<RecordSummary>, StoreError> {
        let entries = fs::read_dir(&self.base_dir)?.map(|entry| entry.map(|e| e.path()));
        let summaries = summarize_entries(entries);
        info!("Found {} MCQ files", summaries.len());
        Ok(summaries)
    }

    // ── Deleting ────────────────────────────────────────────────

    /// Remove a record. `Ok(false)` when there was nothing to remove.
    pub fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            warn!("File not found for deletion: {}", key);
            return Ok(false);
        }
        fs::remove_file(&path)?;
        info!("Deleted MCQ file: {}", key);
        Ok(true)
    }
}

fn read_record(path: &Path) -> Result<McqRecord, StoreError> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Write a freshly created record file, removing it again if the write
/// fails so no truncated record is left behind.
fn write_or_remove(path: &Path, mut file: impl Write, bytes: &[u8]) -> io::Result<()> {
    let written = file.write_all(bytes).and_then(|()| file.flush());
    if let Err(e) = written {
        drop(file);
        if let Err(rm) = fs::remove_file(path) {
            warn!("Could not remove partial record {}: {}", path.display(), rm);
        }
        return Err(e);
    }
    Ok(())
}

/// One summary per `.json` entry, newest first. Entries that cannot be read
/// from the directory are skipped; unreadable records get a degraded entry.
fn summarize_entries(
    entries: impl IntoIterator<Item = io::Result<PathBuf>>,
) -> Vec<RecordSummary> {
    let mut summaries = Vec::new();

    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable directory entry: {}", e);
                continue;
            }
        };
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

        let summary = match read_record(&path) {
            Ok(record) => RecordSummary {
                filename,
                filepath: path.display().to_string(),
                source_filename: record.metadata.source_filename,
                generation_timestamp: Some(record.metadata.generation_timestamp),
                total_questions: record.metadata.total_questions,
                file_size,
            },
            Err(e) => {
                warn!("Could not read metadata from {}: {}", path.display(), e);
                RecordSummary {
                    filename,
                    filepath: path.display().to_string(),
                    source_filename: "Unknown".to_string(),
                    generation_timestamp: None,
                    total_questions: 0,
                    file_size,
                }
            }
        };
        summaries.push(summary);
    }

    summaries.sort_by(|a, b| {
        b.generation_timestamp
            .cmp(&a.generation_timestamp)
            .then_with(|| b.filename.cmp(&a.filename))
    });
    summaries
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use mcqgen_core::{FailureKind, Question};

    use super::*;

    fn chunks() -> Vec<Chunk> {
        vec![
            Chunk {
                id: 0,
                text: "Sample text chunk 1".into(),
                token_count: 100,
                start_sentence: 0,
            },
            Chunk {
                id: 1,
                text: "Sample text chunk 2".into(),
                token_count: 150,
                start_sentence: 4,
            },
        ]
    }

    fn results() -> Vec<GenerationResult> {
        vec![
            GenerationResult {
                success: true,
                questions: vec![Question {
                    question: "What is machine learning?".into(),
                    options: [("A", "A type of AI"), ("B", "A language"), ("C", "A database"), ("D", "A framework")]
                        .into_iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                    correct_answer: "A".into(),
                    explanation: "Machine learning is a subset of AI".into(),
                }],
                error: None,
                error_kind: None,
                raw_response: "{...}".into(),
                chunk_id: 0,
                chunk_text: "Sample text chunk 1".into(),
                chunk_tokens: 100,
                filename: "test document.pdf".into(),
            },
            GenerationResult {
                success: false,
                questions: vec![],
                error: Some("Generation error: connection refused".into()),
                error_kind: Some(FailureKind::GenerationFailure),
                raw_response: String::new(),
                chunk_id: 1,
                chunk_text: "Sample text chunk 2".into(),
                chunk_tokens: 150,
                filename: "test document.pdf".into(),
            },
        ]
    }

    fn store() -> (tempfile::TempDir, McqStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = McqStore::new(tmp.path().join("generated_mcq")).unwrap();
        (tmp, store)
    }

    #[test]
    fn filename_cleans_stem() {
        let at = Local.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            record_filename("lecture notes.v2.pdf", at),
            "mcq_lecture_notes_v2_20250309_140507.json"
        );
    }

    #[test]
    fn store_creates_dir() {
        let (_tmp, store) = store();
        assert!(store.base_dir().is_dir());
    }

    #[test]
    fn save_then_load_round_trips() {
        let (_tmp, store) = store();
        let params = RecordParams {
            chunk_size: Some(1000),
            overlap: Some(100),
            questions_per_pdf: Some(10),
            selected_chunks: Some(2),
            file_index: Some(1),
            total_files: Some(1),
        };
        let key = store
            .save("test document.pdf", chunks(), results(), params.clone())
            .unwrap();
        assert!(key.starts_with("mcq_test_document_"));
        assert!(key.ends_with(".json"));

        let record = store.load(&key).unwrap();
        assert_eq!(record.chunks, chunks());
        assert_eq!(record.mcq_results, results());
        assert_eq!(record.metadata.params, params);
        assert_eq!(record.metadata.total_questions, 1);
        assert_eq!(record.metadata.failed_generations, 1);
    }

    #[test]
    fn same_second_saves_do_not_collide() {
        let (_tmp, store) = store();
        let keys: Vec<_> = (0..3)
            .map(|_| {
                store
                    .save("a.pdf", chunks(), results(), RecordParams::default())
                    .unwrap()
            })
            .collect();
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[1], keys[2]);
        assert_eq!(store.list_summaries().unwrap().len(), 3);
    }

    #[test]
    fn load_questions_flattens_successes() {
        let (_tmp, store) = store();
        let key = store
            .save("a.pdf", chunks(), results(), RecordParams::default())
            .unwrap();
        let set = store.load_questions(&key).unwrap();
        assert_eq!(set.total_questions, 1);
        assert_eq!(set.mcq_results[0].question, "What is machine learning?");
    }

    #[test]
    fn missing_record_is_not_found() {
        let (_tmp, store) = store();
        assert!(matches!(store.load("mcq_nope.json"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn keys_cannot_escape_directory() {
        let (_tmp, store) = store();
        for key in ["../secret.json", "a/b.json", "..", "", "x\\y.json"] {
            assert!(matches!(store.load(key), Err(StoreError::InvalidKey(_))), "{key}");
            assert!(matches!(store.delete(key), Err(StoreError::InvalidKey(_))), "{key}");
        }
    }

    #[test]
    fn list_is_newest_first_with_degraded_entries() {
        let (_tmp, store) = store();
        let mut older = McqRecord::new("old.pdf", chunks(), results(), RecordParams::default());
        older.metadata.generation_timestamp = chrono::Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let older_key = store.save_record(&older).unwrap();
        let newer_key = store
            .save("new.pdf", chunks(), results(), RecordParams::default())
            .unwrap();
        fs::write(store.base_dir().join("broken.json"), "{ not json").unwrap();
        fs::write(store.base_dir().join("notes.txt"), "ignored").unwrap();

        let list = store.list_summaries().unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].filename, newer_key);
        assert_eq!(list[1].filename, older_key);
        assert_eq!(list[2].filename, "broken.json");
        assert_eq!(list[2].source_filename, "Unknown");
        assert_eq!(list[2].total_questions, 0);
        assert_eq!(list[2].file_size, 10);
        assert!(list[0].file_size > 0);
    }

    /// Accepts a few bytes, then fails like a full disk.
    struct FailingWriter(usize);

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.0 == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            let n = buf.len().min(self.0);
            self.0 -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_write_leaves_no_partial_record() {
        let (_tmp, store) = store();
        let path = store.base_dir().join("mcq_partial_20250101_000000.json");
        fs::write(&path, "{ \"metadata\"").unwrap();

        let err = write_or_remove(&path, FailingWriter(4), b"{\"metadata\": {}}").unwrap_err();
        assert_eq!(err.to_string(), "disk full");
        assert!(!path.exists());
        assert!(store.list_summaries().unwrap().is_empty());
    }

    #[test]
    fn unreadable_entries_do_not_fail_the_listing() {
        let (_tmp, store) = store();
        let key = store
            .save("a.pdf", chunks(), results(), RecordParams::default())
            .unwrap();
        let entries = vec![
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
            Ok(store.base_dir().join(&key)),
        ];
        let list = summarize_entries(entries);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].filename, key);
        assert_eq!(list[0].source_filename, "a.pdf");
    }

    #[test]
    fn delete_reports_whether_removed() {
        let (_tmp, store) = store();
        let key = store
            .save("a.pdf", chunks(), results(), RecordParams::default())
            .unwrap();
        assert!(store.delete(&key).unwrap());
        assert!(!store.delete(&key).unwrap());
        assert!(store.list_summaries().unwrap().is_empty());
    }
}
