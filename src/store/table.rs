//! # Persisted preference table.
//!
//! [`PrefTable`] is a typed key-value table backed by a JSON snapshot file.
//! It is the persistence primitive under the reading cache: writers batch
//! their changes in a [`PrefEdit`] and apply them in one step, so a record
//! is either fully visible or not visible at all.
//!
//! ## Rules
//! - Floating-point data is stored as raw bit patterns
//!   ([`PrefValue::Bits32`]/[`PrefValue::Bits64`]), never as decimal text —
//!   snapshots round-trip floats bit-exactly.
//! - A batch edit is applied under one lock and flushed atomically
//!   (temp file + rename); concurrent readers of the same keys observe all
//!   of the edit or none of it.
//! - A missing or corrupt snapshot loads as an empty table with a warning;
//!   the table stays usable and the next flush rewrites the snapshot.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A single typed table entry.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "t", content = "v")]
pub enum PrefValue {
    /// UTF-8 string.
    Str(String),
    /// Signed integer (timestamps, counters).
    Int(i64),
    /// Raw bit pattern of an `f32`.
    Bits32(u32),
    /// Raw bit pattern of an `f64`.
    Bits64(u64),
}

enum Op {
    Put(String, PrefValue),
    Remove(String),
    RemovePrefix(String),
}

/// Persisted typed key-value table with batched, atomic edits.
pub struct PrefTable {
    path: Option<PathBuf>,
    entries: Mutex<HashMap<String, PrefValue>>,
}

impl PrefTable {
    /// Opens the table backed by the snapshot file at `path`.
    ///
    /// A missing snapshot starts empty; an unreadable one is discarded with
    /// a warning so a damaged file never wedges the table.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, PrefValue>>(&bytes) {
                Ok(map) => map,
                Err(err) => {
                    warn!(path = %path.display(), %err, "discarding corrupt pref snapshot");
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to read pref snapshot");
                HashMap::new()
            }
        };
        Self {
            path: Some(path),
            entries: Mutex::new(entries),
        }
    }

    /// Opens a table with no backing file.
    ///
    /// Useful for contexts without a data directory; contents do not survive
    /// the process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if `key` holds a value.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Reads a string entry.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.lock().get(key) {
            Some(PrefValue::Str(s)) => Some(s.clone()),
            _ => None,
        }
    }

    /// Reads an integer entry.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.lock().get(key) {
            Some(PrefValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Reads an `f32` stored as its bit pattern.
    pub fn get_f32(&self, key: &str) -> Option<f32> {
        match self.lock().get(key) {
            Some(PrefValue::Bits32(bits)) => Some(f32::from_bits(*bits)),
            _ => None,
        }
    }

    /// Reads an `f64` stored as its bit pattern.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.lock().get(key) {
            Some(PrefValue::Bits64(bits)) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }

    /// Starts a batch edit.
    pub fn edit(&self) -> PrefEdit<'_> {
        PrefEdit {
            table: self,
            ops: Vec::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PrefValue>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes the snapshot for the given table state. Called with the entry
    /// lock held so no newer state can be overwritten by an older flush.
    fn flush(&self, entries: &HashMap<String, PrefValue>) {
        let Some(path) = &self.path else {
            return;
        };
        let bytes = match serde_json::to_vec(entries) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to encode pref snapshot");
                return;
            }
        };
        let tmp = path.with_extension("tmp");
        if let Err(err) = fs::write(&tmp, &bytes).and_then(|()| fs::rename(&tmp, path)) {
            warn!(path = %path.display(), %err, "failed to persist pref snapshot");
        } else {
            debug!(path = %path.display(), entries = entries.len(), "pref snapshot persisted");
        }
    }
}

/// A batch of pending table operations.
///
/// Nothing becomes visible until [`apply`](PrefEdit::apply); the whole batch
/// lands under one lock.
///
/// # Example
/// ```
/// use geovisor::PrefTable;
///
/// let table = PrefTable::in_memory();
/// table
///     .edit()
///     .put_str("name", "gps")
///     .put_f64("lat", 37.4219999)
///     .apply();
///
/// assert_eq!(table.get_f64("lat"), Some(37.4219999));
/// ```
pub struct PrefEdit<'a> {
    table: &'a PrefTable,
    ops: Vec<Op>,
}

impl PrefEdit<'_> {
    /// Stages a string write.
    pub fn put_str(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ops
            .push(Op::Put(key.into(), PrefValue::Str(value.into())));
        self
    }

    /// Stages an integer write.
    pub fn put_int(mut self, key: impl Into<String>, value: i64) -> Self {
        self.ops.push(Op::Put(key.into(), PrefValue::Int(value)));
        self
    }

    /// Stages an `f32` write, stored as its bit pattern.
    pub fn put_f32(mut self, key: impl Into<String>, value: f32) -> Self {
        self.ops
            .push(Op::Put(key.into(), PrefValue::Bits32(value.to_bits())));
        self
    }

    /// Stages an `f64` write, stored as its bit pattern.
    pub fn put_f64(mut self, key: impl Into<String>, value: f64) -> Self {
        self.ops
            .push(Op::Put(key.into(), PrefValue::Bits64(value.to_bits())));
        self
    }

    /// Stages a removal. Removing a missing key is a no-op.
    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.ops.push(Op::Remove(key.into()));
        self
    }

    /// Stages removal of every key under the given prefix.
    pub fn remove_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.ops.push(Op::RemovePrefix(prefix.into()));
        self
    }

    /// Applies the whole batch and persists the snapshot.
    pub fn apply(self) {
        let mut entries = self.table.lock();
        for op in self.ops {
            match op {
                Op::Put(key, value) => {
                    entries.insert(key, value);
                }
                Op::Remove(key) => {
                    entries.remove(&key);
                }
                Op::RemovePrefix(prefix) => {
                    entries.retain(|key, _| !key.starts_with(&prefix));
                }
            }
        }
        self.table.flush(&entries);
    }
}
