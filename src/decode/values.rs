//! Ordered key → multi-value mapping shared by query, form and route params.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use url::form_urlencoded;

/// Ordered mapping from key to one or more string values.
///
/// Keys keep the order in which they were first added. Adding an existing
/// key appends to its value list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values {
    entries: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` under `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1.push(value),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, vec![value]));
            }
        }
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    /// All values for `key`, empty if the key is absent.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.index
            .get(key)
            .map(|&i| self.entries[i].1.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append every value of `other`, preserving its key order.
    pub fn extend(&mut self, other: Values) {
        for (key, values) in other.entries {
            for value in values {
                self.add(key.clone(), value);
            }
        }
    }

    /// Decode an `application/x-www-form-urlencoded` string.
    ///
    /// Pairs with a malformed escape are dropped; use
    /// [`parse_form`](crate::http::form::parse_form) to reject them instead.
    pub fn parse_lenient(input: &[u8]) -> Self {
        let mut values = Values::new();
        for pair in input.split(|&b| b == b'&') {
            if first_invalid_escape(pair).is_some() {
                continue;
            }
            for (key, value) in form_urlencoded::parse(pair) {
                values.add(key, value);
            }
        }
        values
    }
}

/// Offset of the first `%` not followed by two hex digits.
pub fn first_invalid_escape(input: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i < input.len() {
        if input[i] == b'%' {
            let valid = input.len() > i + 2
                && input[i + 1].is_ascii_hexdigit()
                && input[i + 2].is_ascii_hexdigit();
            if !valid {
                return Some(i);
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    None
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Values {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Values::new();
        for (key, value) in iter {
            values.add(key, value);
        }
        values
    }
}

impl Serialize for Values {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, values) in &self.entries {
            map.serialize_entry(key, values)?;
        }
        map.end()
    }
}
