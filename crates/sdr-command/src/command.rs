//! Ordered key/value command representation
//!
//! A [`Command`] is the atomic unit of control. The dictionary form maps
//! directly onto it; the deprecated positional tuple `(name, value, [chan])`
//! is normalized by [`Command::from_positional`] and never seen again.

use crate::error::CommandError;
use crate::validate::{validate, ValidatedCommand};
use crate::value::Value;

/// An ordered set of command keys and their values
///
/// Keys are case-sensitive and unique; inserting an existing key replaces
/// its value without moving it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Command {
    entries: Vec<(String, Value)>,
}

impl Command {
    /// Create an empty command
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a key, returning the value it replaced
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Remove a key
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Get the value for a key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Check whether a key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the command has no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Normalize a legacy positional tuple `(name, value, [chan])`
    pub fn from_positional(items: Vec<Value>) -> Result<Self, CommandError> {
        if !(2..=3).contains(&items.len()) {
            return Err(CommandError::MalformedTuple(format!(
                "expected 2 or 3 elements, found {}",
                items.len()
            )));
        }

        let mut items = items.into_iter();
        let name = match items.next() {
            Some(Value::Str(name)) => name,
            Some(other) => {
                return Err(CommandError::MalformedTuple(format!(
                    "command name must be a string, found {}",
                    other.kind()
                )))
            }
            None => return Err(CommandError::MalformedTuple("empty tuple".to_string())),
        };

        let mut cmd = Command::new();
        if let Some(value) = items.next() {
            cmd.insert(name, value);
        }
        if let Some(chan) = items.next() {
            cmd.insert("chan", chan);
        }
        Ok(cmd)
    }

    /// Validate this command
    pub fn validate(self) -> Result<ValidatedCommand, CommandError> {
        validate(self)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Command {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut cmd = Command::new();
        for (k, v) in iter {
            cmd.insert(k, v);
        }
        cmd
    }
}
