//! Flat key-value table.
//!
//! One `HashMap<Bytes, Bytes>` with `&mut self` operations and nothing else:
//! no TTLs, no secondary types, no interior locking. Callers that share a
//! [`Store`] across connections serialize access with one mutex around each
//! command execution; the table itself never synchronizes.
//!
//! Values are raw bytes. INCR reinterprets the stored bytes as a decimal
//! integer on every call rather than keeping a numeric representation, so
//! `SET x 5` followed by `INCR x` yields 6 with `"6"` stored.

use bytes::Bytes;
use std::collections::HashMap;

/// Message for an INCR target that does not parse or does not fit in i64.
const NOT_AN_INTEGER: &str = "value is not an integer or out of range";

/// In-memory string-to-string table, the server's only state.
#[derive(Debug, Default)]
pub struct Store {
    entries: HashMap<Bytes, Bytes>,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Inserts or overwrites a key. Returns `true` when the key was new.
    pub fn set(&mut self, key: Bytes, value: Bytes) -> bool {
        self.entries.insert(key, value).is_none()
    }

    /// Looks up a key. The returned `Bytes` is a cheap refcounted clone.
    pub fn get(&self, key: &Bytes) -> Option<Bytes> {
        self.entries.get(key).cloned()
    }

    /// Removes a key. Returns `true` when it was present.
    pub fn remove(&mut self, key: &Bytes) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Adds one to the integer stored at `key`, treating a missing key as 0,
    /// and stores the result back as its decimal string.
    ///
    /// Fails without writing when the current value does not parse as an
    /// `i64` or when the increment overflows.
    pub fn incr(&mut self, key: &Bytes) -> Result<i64, &'static str> {
        let current: i64 = match self.entries.get(key) {
            Some(value) => std::str::from_utf8(value)
                .map_err(|_| NOT_AN_INTEGER)?
                .parse()
                .map_err(|_| NOT_AN_INTEGER)?,
            None => 0,
        };

        let next = current.checked_add(1).ok_or(NOT_AN_INTEGER)?;
        self.entries
            .insert(key.clone(), Bytes::from(next.to_string()));
        Ok(next)
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Bytes {
        Bytes::from(s.to_string())
    }

    #[test]
    fn test_set_and_get() {
        let mut store = Store::new();

        assert!(store.set(key("name"), Bytes::from("alice")));
        assert_eq!(store.get(&key("name")), Some(Bytes::from("alice")));
    }

    #[test]
    fn test_set_overwrites() {
        let mut store = Store::new();

        assert!(store.set(key("k"), Bytes::from("one")));
        assert!(!store.set(key("k"), Bytes::from("two")));
        assert_eq!(store.get(&key("k")), Some(Bytes::from("two")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let store = Store::new();
        assert_eq!(store.get(&key("missing")), None);
    }

    #[test]
    fn test_remove() {
        let mut store = Store::new();

        store.set(key("k"), Bytes::from("v"));
        assert!(store.remove(&key("k")));
        assert!(!store.remove(&key("k")));
        assert!(store.is_empty());
    }

    #[test]
    fn test_incr_from_missing() {
        let mut store = Store::new();

        assert_eq!(store.incr(&key("counter")), Ok(1));
        assert_eq!(store.incr(&key("counter")), Ok(2));
        assert_eq!(store.get(&key("counter")), Some(Bytes::from("2")));
    }

    #[test]
    fn test_incr_existing_integer() {
        let mut store = Store::new();

        store.set(key("x"), Bytes::from("41"));
        assert_eq!(store.incr(&key("x")), Ok(42));
        assert_eq!(store.get(&key("x")), Some(Bytes::from("42")));
    }

    #[test]
    fn test_incr_negative_value() {
        let mut store = Store::new();

        store.set(key("x"), Bytes::from("-3"));
        assert_eq!(store.incr(&key("x")), Ok(-2));
    }

    #[test]
    fn test_incr_non_integer_fails_without_write() {
        let mut store = Store::new();

        store.set(key("x"), Bytes::from("ten"));
        assert_eq!(store.incr(&key("x")), Err(NOT_AN_INTEGER));
        assert_eq!(store.get(&key("x")), Some(Bytes::from("ten")));
    }

    #[test]
    fn test_incr_overflow_fails_without_write() {
        let mut store = Store::new();

        let max = i64::MAX.to_string();
        store.set(key("x"), Bytes::from(max.clone()));
        assert_eq!(store.incr(&key("x")), Err(NOT_AN_INTEGER));
        assert_eq!(store.get(&key("x")), Some(Bytes::from(max)));
    }

    #[test]
    fn test_binary_keys_and_values() {
        let mut store = Store::new();

        let k = Bytes::from_static(b"k\x00ey");
        let v = Bytes::from_static(b"v\r\nalue");
        store.set(k.clone(), v.clone());
        assert_eq!(store.get(&k), Some(v));
    }
}
