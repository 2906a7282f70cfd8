// Word persistence behind the `WordStore` trait.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::ir::WordRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("word text is empty")]
    EmptyText,
    #[error("i/o error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("word store {} is not a JSON array of words", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("word store unavailable after {attempts} attempts")]
    Unavailable {
        attempts: u32,
        #[source]
        source: Box<StoreError>,
    },
}

/// Ordered word storage consumed by the layout.
pub trait WordStore {
    /// All words, ordered by group rank and then text.
    fn list(&self) -> Result<Vec<WordRecord>, StoreError>;

    /// Stores `text` with `priority` as both its group rank and weight.
    fn insert(&mut self, text: &str, priority: f64) -> Result<WordRecord, StoreError>;

    /// Removes the word with `id`; `false` when no such word exists.
    fn delete(&mut self, id: &str) -> Result<bool, StoreError>;
}

fn new_record(text: &str, priority: f64, id: String) -> Result<WordRecord, StoreError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(StoreError::EmptyText);
    }
    Ok(WordRecord::new(text)
        .with_id(id)
        .with_group(priority)
        .with_weight(priority))
}

fn sort_records(records: &mut [WordRecord]) {
    records.sort_by(|a, b| {
        let ga = a.group_rank.unwrap_or(f64::INFINITY);
        let gb = b.group_rank.unwrap_or(f64::INFINITY);
        ga.total_cmp(&gb).then_with(|| a.text.cmp(&b.text))
    });
}

fn next_id(records: &[WordRecord]) -> String {
    let highest = records
        .iter()
        .filter_map(|r| r.id.as_deref())
        .filter_map(|id| id.strip_prefix('w'))
        .filter_map(|n| n.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("w{}", highest + 1)
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: Vec<WordRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with `records`; records without an id get one.
    pub fn with_records(records: Vec<WordRecord>) -> Self {
        let mut store = Self::default();
        for mut record in records {
            if record.id.is_none() {
                record.id = Some(next_id(&store.records));
            }
            store.records.push(record);
        }
        store
    }
}

impl WordStore for MemoryStore {
    fn list(&self) -> Result<Vec<WordRecord>, StoreError> {
        let mut records = self.records.clone();
        sort_records(&mut records);
        Ok(records)
    }

    fn insert(&mut self, text: &str, priority: f64) -> Result<WordRecord, StoreError> {
        let record = new_record(text, priority, next_id(&self.records))?;
        self.records.push(record.clone());
        Ok(record)
    }

    fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.records.len();
        self.records.retain(|r| r.id.as_deref() != Some(id));
        Ok(self.records.len() != before)
    }
}

/// Words kept in a JSON array on disk. Every call reads the file, so edits
/// made by other processes are picked up.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Opens `path`, creating an empty store when the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self { path: path.into() };
        if !store.path.exists() {
            store.save(&[])?;
        }
        store.load()?;
        Ok(store)
    }

    /// [`JsonFileStore::open`] retried under `policy`.
    pub fn open_with_retry(path: impl AsRef<Path>, policy: &RetryPolicy) -> Result<Self, StoreError> {
        let path = path.as_ref();
        policy.run("open word store", |_| Self::open(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn load(&self) -> Result<Vec<WordRecord>, StoreError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&contents).map_err(|source| StoreError::Format {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, records: &[WordRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records).map_err(|source| StoreError::Format {
            path: self.path.clone(),
            source,
        })?;
        // Write next to the target and rename so readers never see a partial file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }
}

impl WordStore for JsonFileStore {
    fn list(&self) -> Result<Vec<WordRecord>, StoreError> {
        let mut records = self.load()?;
        sort_records(&mut records);
        Ok(records)
    }

    fn insert(&mut self, text: &str, priority: f64) -> Result<WordRecord, StoreError> {
        let mut records = self.load()?;
        let record = new_record(text, priority, next_id(&records))?;
        records.push(record.clone());
        self.save(&records)?;
        tracing::debug!(id = record.id.as_deref(), text = %record.text, "stored word");
        Ok(record)
    }

    fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| r.id.as_deref() != Some(id));
        if records.len() == before {
            return Ok(false);
        }
        self.save(&records)?;
        Ok(true)
    }
}

/// Retry schedule for reaching a store: `max_attempts` tries, waiting
/// `initial_delay` after the first failure and growing by `factor` each time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            initial_delay: Duration::from_millis(2000),
            factor: 1.5,
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `attempt` (zero-based); the first attempt is immediate.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let growth = self.factor.max(1.0).powi(attempt as i32 - 1);
        self.initial_delay.mul_f64(growth)
    }

    /// Runs `op` until it succeeds or the attempts run out. `op` receives the
    /// zero-based attempt number.
    pub fn run<T, F>(&self, what: &str, mut op: F) -> Result<T, StoreError>
    where
        F: FnMut(u32) -> Result<T, StoreError>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    log_failure(what, attempt + 1, attempts, &err);
                    attempt += 1;
                    if attempt >= attempts {
                        return Err(StoreError::Unavailable {
                            attempts,
                            source: Box::new(err),
                        });
                    }
                    std::thread::sleep(self.delay_before(attempt));
                }
            }
        }
    }
}

fn log_failure(what: &str, attempt: u32, attempts: u32, err: &impl Display) {
    if attempt < attempts {
        tracing::warn!(attempt, attempts, error = %err, "{what} failed, retrying");
    } else {
        tracing::error!(attempts, error = %err, "{what} failed, giving up");
    }
}
