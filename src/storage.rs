use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, StoreError};

pub const USERS_KEY: &str = "users";
pub const CURRENT_USER_KEY: &str = "currentUser";
pub const JOBS_KEY: &str = "jobs";
pub const APPLICATIONS_KEY: &str = "applications";

/// Durable string-keyed storage. Each value is a whole JSON document; writes
/// replace the previous value entirely.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StoreError::Serialization {
            key: key.to_string(),
            source,
        })
}

pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Serialization {
        key: key.to_string(),
        source,
    })?;
    tracing::debug!(key, bytes = raw.len(), "writing key");
    store.set(key, &raw)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// HashMap-backed store that records every call, for asserting
    /// write-through and read-once behaviour.
    #[derive(Default)]
    pub struct RecordingStore {
        values: RefCell<HashMap<String, String>>,
        pub reads: RefCell<Vec<String>>,
        pub writes: RefCell<Vec<String>>,
    }

    impl RecordingStore {
        pub fn raw(&self, key: &str) -> Option<String> {
            self.values.borrow().get(key).cloned()
        }

        pub fn put(&self, key: &str, value: &str) {
            self.values.borrow_mut().insert(key.to_string(), value.to_string());
        }
    }

    impl KeyValueStore for RecordingStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.reads.borrow_mut().push(key.to_string());
            Ok(self.values.borrow().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.writes.borrow_mut().push(key.to_string());
            self.put(key, value);
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.writes.borrow_mut().push(key.to_string());
            self.values.borrow_mut().remove(key);
            Ok(())
        }

        fn clear(&self) -> Result<()> {
            self.values.borrow_mut().clear();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingStore;
    use super::*;

    #[test]
    fn test_read_json_missing_key_is_none() {
        let store = RecordingStore::default();
        let value: Option<Vec<String>> = read_json(&store, JOBS_KEY).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_read_json_reports_key_of_corrupt_value() {
        let store = RecordingStore::default();
        store.put(JOBS_KEY, "[{not json");
        let err = read_json::<Vec<String>>(&store, JOBS_KEY).unwrap_err();
        assert!(matches!(err, StoreError::Serialization { ref key, .. } if key == "jobs"));
        assert!(err.to_string().contains("jobs"));
    }

    #[test]
    fn test_write_then_read_json() {
        let store = RecordingStore::default();
        write_json(&store, USERS_KEY, &vec!["a", "b"]).unwrap();
        assert_eq!(store.raw(USERS_KEY).as_deref(), Some(r#"["a","b"]"#));
        let back: Option<Vec<String>> = read_json(&store, USERS_KEY).unwrap();
        assert_eq!(back, Some(vec!["a".to_string(), "b".to_string()]));
    }
}
