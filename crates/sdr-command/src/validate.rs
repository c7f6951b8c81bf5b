//! Command validation
//!
//! Validation checks every key against the key table, rejects type
//! mismatches and conflicting tuning groups, and drops unknown keys with a
//! warning. It has no side effects beyond logging.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::command::Command;
use crate::error::CommandError;
use crate::key::{CommandKey, TuneGroup};
use crate::time::TimeSpec;
use crate::tune::Direction;
use crate::value::Value;

/// A command that passed validation
///
/// Entries are keyed by [`CommandKey`] and keep their original order.
/// There is no mutating API.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCommand {
    entries: Vec<(CommandKey, Value)>,
    direction: Option<Direction>,
    ignored: Vec<String>,
}

impl ValidatedCommand {
    /// Get the value for a key
    pub fn get(&self, key: CommandKey) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Check whether a key is present
    pub fn contains(&self, key: CommandKey) -> bool {
        self.get(key).is_some()
    }

    /// Iterate over entries in command order
    pub fn iter(&self) -> impl Iterator<Item = (CommandKey, &Value)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Numeric value for a key
    pub fn float(&self, key: CommandKey) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    /// Channel selector (`-1` means all channels)
    pub fn chan(&self) -> Option<i64> {
        self.get(CommandKey::Chan).and_then(Value::as_i64)
    }

    /// Motherboard selector
    pub fn mboard(&self) -> Option<usize> {
        self.get(CommandKey::Mboard)
            .and_then(Value::as_i64)
            .and_then(|m| usize::try_from(m).ok())
    }

    /// Command time, if any
    pub fn time(&self) -> Option<TimeSpec> {
        match self.get(CommandKey::Time)? {
            Value::Time(ts) => Some(TimeSpec::At(*ts)),
            Value::Clear => Some(TimeSpec::Clear),
            _ => None,
        }
    }

    /// Recognized direction hint
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Unknown keys that were dropped
    pub fn ignored_keys(&self) -> &[String] {
        &self.ignored
    }

    /// Number of recognized keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no recognized keys remain
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Validate a command
pub fn validate(command: Command) -> Result<ValidatedCommand, CommandError> {
    let mut entries = Vec::with_capacity(command.len());
    let mut ignored = Vec::new();
    let mut direction = None;

    for (name, value) in command.iter() {
        let Some(key) = CommandKey::from_name(name) else {
            warn!("Ignoring {}", CommandError::UnknownKey(name.to_string()));
            ignored.push(name.to_string());
            continue;
        };

        let spec = key.spec();
        if !spec.value_type.accepts(value) {
            return Err(CommandError::TypeMismatch {
                key: name.to_string(),
                expected: spec.value_type,
                found: value.kind(),
            });
        }

        match key {
            CommandKey::Chan => {
                if let Some(chan) = value.as_i64().filter(|c| *c < -1) {
                    return Err(CommandError::InvalidSelector {
                        key: "chan",
                        value: chan,
                    });
                }
            }
            CommandKey::Mboard => {
                if let Some(mboard) = value.as_i64().filter(|m| *m < 0) {
                    return Err(CommandError::InvalidSelector {
                        key: "mboard",
                        value: mboard,
                    });
                }
            }
            CommandKey::Direction => {
                direction = value.as_str().and_then(Direction::from_hint);
                if direction.is_none() {
                    debug!("Ignoring unrecognized direction {:?}", value);
                }
                continue;
            }
            _ => {}
        }

        entries.push((key, value.clone()));
    }

    check_tuning_groups(&entries)?;

    Ok(ValidatedCommand {
        entries,
        direction,
        ignored,
    })
}

fn check_tuning_groups(entries: &[(CommandKey, Value)]) -> Result<(), CommandError> {
    let tuning_keys: Vec<CommandKey> = entries
        .iter()
        .map(|(k, _)| *k)
        .filter(CommandKey::is_tuning)
        .collect();

    let groups: BTreeSet<TuneGroup> = tuning_keys
        .iter()
        .filter_map(|k| k.spec().tune_group)
        .collect();

    let names = || -> Vec<String> { tuning_keys.iter().map(|k| k.name().to_string()).collect() };

    if groups.len() > 1 {
        return Err(CommandError::ConflictingKeys {
            keys: names(),
            reason: "only one of freq/lo_offset, tune or lo_freq/dsp_freq may be given",
        });
    }

    let has = |key| tuning_keys.contains(&key);
    if has(CommandKey::LoOffset) && !has(CommandKey::Freq) {
        return Err(CommandError::ConflictingKeys {
            keys: names(),
            reason: "lo_offset requires freq",
        });
    }

    Ok(())
}
