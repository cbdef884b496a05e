//! # Persisted last-reading cache.
//!
//! [`ReadingStore`] keeps the most recent [`Reading`] per provider identity
//! in the context's [`PrefTable`]. Each reading is exploded into one field
//! per table key, every key namespaced under a fixed prefix plus the
//! caller-supplied id, so multiple provider identities coexist in one table
//! without collision.
//!
//! A record is only surfaced when both coordinate fields are present — a
//! partially written record reads as absent.

use std::sync::Arc;

use crate::reading::Reading;
use crate::store::{PrefTable, Store};

const PREFIX: &str = "geovisor.reading.key";

const FIELD_PROVIDER: &str = "PROVIDER";
const FIELD_LATITUDE: &str = "LATITUDE";
const FIELD_LONGITUDE: &str = "LONGITUDE";
const FIELD_ACCURACY: &str = "ACCURACY";
const FIELD_ALTITUDE: &str = "ALTITUDE";
const FIELD_SPEED: &str = "SPEED";
const FIELD_TIME: &str = "TIME";
const FIELD_BEARING: &str = "BEARING";

/// Source tag reported for records whose provider field is missing.
const STORE_SOURCE: &str = "store";

/// Last-known-reading cache over a shared [`PrefTable`].
pub struct ReadingStore {
    table: Arc<PrefTable>,
}

impl ReadingStore {
    /// Creates a store over the given table.
    ///
    /// Providers sharing one context must share one table instance so their
    /// snapshot flushes do not clobber each other.
    pub fn new(table: Arc<PrefTable>) -> Self {
        Self { table }
    }

    fn field_key(id: &str, field: &str) -> String {
        format!("{PREFIX}_{id}_{field}")
    }

    /// Deletes every cached reading in this table, for all ids.
    ///
    /// Invoked on session teardown; other table namespaces are untouched.
    pub fn clear(&self) {
        self.table.edit().remove_prefix(PREFIX).apply();
    }
}

impl Store<Reading> for ReadingStore {
    fn put(&self, id: &str, reading: &Reading) {
        self.table
            .edit()
            .put_str(Self::field_key(id, FIELD_PROVIDER), reading.source.as_ref())
            .put_f64(Self::field_key(id, FIELD_LATITUDE), reading.latitude)
            .put_f64(Self::field_key(id, FIELD_LONGITUDE), reading.longitude)
            .put_f32(Self::field_key(id, FIELD_ACCURACY), reading.accuracy)
            .put_f64(Self::field_key(id, FIELD_ALTITUDE), reading.altitude)
            .put_f32(Self::field_key(id, FIELD_SPEED), reading.speed)
            .put_int(Self::field_key(id, FIELD_TIME), reading.time)
            .put_f32(Self::field_key(id, FIELD_BEARING), reading.bearing)
            .apply();
    }

    fn get(&self, id: &str) -> Option<Reading> {
        if !self.table.contains(&Self::field_key(id, FIELD_LATITUDE))
            || !self.table.contains(&Self::field_key(id, FIELD_LONGITUDE))
        {
            return None;
        }
        let source = self
            .table
            .get_str(&Self::field_key(id, FIELD_PROVIDER))
            .unwrap_or_else(|| STORE_SOURCE.to_string());
        let mut reading = Reading::new(source);
        reading.latitude = self
            .table
            .get_f64(&Self::field_key(id, FIELD_LATITUDE))
            .unwrap_or(0.0);
        reading.longitude = self
            .table
            .get_f64(&Self::field_key(id, FIELD_LONGITUDE))
            .unwrap_or(0.0);
        reading.accuracy = self
            .table
            .get_f32(&Self::field_key(id, FIELD_ACCURACY))
            .unwrap_or(0.0);
        reading.altitude = self
            .table
            .get_f64(&Self::field_key(id, FIELD_ALTITUDE))
            .unwrap_or(0.0);
        reading.speed = self
            .table
            .get_f32(&Self::field_key(id, FIELD_SPEED))
            .unwrap_or(0.0);
        reading.time = self
            .table
            .get_int(&Self::field_key(id, FIELD_TIME))
            .unwrap_or(0);
        reading.bearing = self
            .table
            .get_f32(&Self::field_key(id, FIELD_BEARING))
            .unwrap_or(0.0);
        Some(reading)
    }

    fn remove(&self, id: &str) {
        self.table
            .edit()
            .remove(Self::field_key(id, FIELD_PROVIDER))
            .remove(Self::field_key(id, FIELD_LATITUDE))
            .remove(Self::field_key(id, FIELD_LONGITUDE))
            .remove(Self::field_key(id, FIELD_ACCURACY))
            .remove(Self::field_key(id, FIELD_ALTITUDE))
            .remove(Self::field_key(id, FIELD_SPEED))
            .remove(Self::field_key(id, FIELD_TIME))
            .remove(Self::field_key(id, FIELD_BEARING))
            .apply();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Reading {
        Reading::new("GMS")
            .with_latitude(37.4219999)
            .with_longitude(-122.0840575)
            .with_accuracy(5.0)
            .with_altitude(12.5)
            .with_speed(1.25)
            .with_bearing(270.5)
            .with_time(1_690_000_000_000)
    }

    #[test]
    fn test_round_trip_is_exact() {
        let store = ReadingStore::new(Arc::new(PrefTable::in_memory()));
        let reading = sample();
        store.put("GMS", &reading);

        let loaded = store.get("GMS").expect("record present");
        assert_eq!(loaded, reading);
        assert_eq!(loaded.latitude.to_bits(), reading.latitude.to_bits());
        assert_eq!(loaded.longitude.to_bits(), reading.longitude.to_bits());
        assert_eq!(loaded.accuracy.to_bits(), reading.accuracy.to_bits());
    }

    #[test]
    fn test_round_trip_survives_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let reading = sample();

        ReadingStore::new(Arc::new(PrefTable::open(&path))).put("GMS", &reading);

        let store = ReadingStore::new(Arc::new(PrefTable::open(&path)));
        assert_eq!(store.get("GMS"), Some(reading));
    }

    #[test]
    fn test_ids_do_not_collide() {
        let store = ReadingStore::new(Arc::new(PrefTable::in_memory()));
        let a = sample();
        let b = Reading::new("sys").with_latitude(1.0).with_longitude(2.0);
        store.put("GMS", &a);
        store.put("SYS", &b);

        assert_eq!(store.get("GMS"), Some(a));
        assert_eq!(store.get("SYS"), Some(b));
    }

    #[test]
    fn test_partial_record_reads_absent() {
        let table = Arc::new(PrefTable::in_memory());
        // Latitude present, longitude missing.
        table
            .edit()
            .put_f64(ReadingStore::field_key("X", FIELD_LATITUDE), 1.0)
            .apply();

        let store = ReadingStore::new(table);
        assert_eq!(store.get("X"), None);
    }

    #[test]
    fn test_remove_then_get_is_absent() {
        let store = ReadingStore::new(Arc::new(PrefTable::in_memory()));
        store.put("GMS", &sample());
        store.remove("GMS");
        assert_eq!(store.get("GMS"), None);

        // Removing again stays a no-op.
        store.remove("GMS");
        assert_eq!(store.get("GMS"), None);
    }

    #[test]
    fn test_clear_removes_every_id() {
        let table = Arc::new(PrefTable::in_memory());
        table.edit().put_int("unrelated", 7).apply();

        let store = ReadingStore::new(table.clone());
        store.put("GMS", &sample());
        store.put("SYS", &sample());
        store.clear();

        assert_eq!(store.get("GMS"), None);
        assert_eq!(store.get("SYS"), None);
        assert_eq!(table.get_int("unrelated"), Some(7));
    }

    #[test]
    fn test_missing_provider_field_defaults() {
        let table = Arc::new(PrefTable::in_memory());
        table
            .edit()
            .put_f64(ReadingStore::field_key("X", FIELD_LATITUDE), 1.5)
            .put_f64(ReadingStore::field_key("X", FIELD_LONGITUDE), 2.5)
            .apply();

        let store = ReadingStore::new(table);
        let loaded = store.get("X").expect("coordinates present");
        assert_eq!(loaded.source.as_ref(), "store");
        assert_eq!(loaded.latitude, 1.5);
        assert_eq!(loaded.time, 0);
    }
}
