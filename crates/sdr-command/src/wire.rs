//! JSON wire format
//!
//! A JSON object is the dictionary form of a command; a JSON array is the
//! legacy positional tuple. Key names steer how structured values decode:
//!
//! - `time`: `[full_secs, frac_secs]`, a number of seconds, or
//!   `{"full_secs": .., "frac_secs": ..}`; `null` clears
//! - `tune`: `{"target_freq": .., "lo_offset": ..}`
//! - `gpio`: `{"bank": .., "attr": .., "value": .., "mask": .., "mboard": ..}`
//!
//! Numbers with no fractional part decode as integers, so `1.0` is a valid
//! `chan`. Structured values that match no shape are kept as their raw JSON
//! text so validation can report a type mismatch (or drop the key if unknown).

use serde_json::{Map, Number, Value as Json};
use tracing::debug;

use crate::command::Command;
use crate::error::CommandError;
use crate::gpio::GpioDirective;
use crate::key::{CommandKey, ValueType};
use crate::time::Timestamp;
use crate::tune::TuneRequest;
use crate::value::Value;

/// Decode a command from JSON text
pub fn decode_command(text: &str) -> Result<Command, CommandError> {
    let json: Json = serde_json::from_str(text).map_err(|e| CommandError::Wire(e.to_string()))?;
    command_from_json(json)
}

/// Decode a command from a parsed JSON value
pub fn command_from_json(json: Json) -> Result<Command, CommandError> {
    match json {
        Json::Object(map) => {
            let mut cmd = Command::new();
            for (key, value) in map {
                let value = decode_value(&key, value)?;
                cmd.insert(key, value);
            }
            Ok(cmd)
        }
        Json::Array(items) => {
            let name = items
                .first()
                .and_then(Json::as_str)
                .map(str::to_string)
                .unwrap_or_default();
            let mut values = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                let hint = match i {
                    1 => name.as_str(),
                    2 => "chan",
                    _ => "",
                };
                values.push(decode_value(hint, item)?);
            }
            Command::from_positional(values)
        }
        other => Err(CommandError::Wire(format!(
            "expected object or array, found {}",
            other
        ))),
    }
}

/// Decode a single value, using the key to pick structured shapes
pub fn decode_value(key: &str, json: Json) -> Result<Value, CommandError> {
    let hint = CommandKey::from_name(key).map(|k| k.spec().value_type);

    match (hint, json) {
        (_, Json::Null) => Ok(Value::Clear),
        (Some(ValueType::TimeSpec), json) => Ok(decode_time(&json).unwrap_or_else(|| generic(json))),
        (Some(ValueType::TuneRequest), json @ Json::Object(_)) => {
            Ok(decode_object::<TuneRequest>(key, json).map_or_else(generic, Value::Tune))
        }
        (Some(ValueType::Gpio), json @ Json::Object(_)) => {
            Ok(decode_object::<GpioDirective>(key, json).map_or_else(generic, Value::Gpio))
        }
        (_, json) => Ok(generic(json)),
    }
}

/// Decode a structured object, handing it back untouched if its shape is wrong
fn decode_object<T: serde::de::DeserializeOwned>(key: &str, json: Json) -> Result<T, Json> {
    serde_json::from_value(json.clone()).map_err(|e| {
        debug!("`{}` object has the wrong shape: {}", key, e);
        json
    })
}

fn decode_time(json: &Json) -> Option<Value> {
    let ts = match json {
        Json::Array(parts) if parts.len() == 2 => {
            Timestamp::new(whole(&parts[0])?, parts[1].as_f64()?)
        }
        Json::Number(n) => match n.as_i64() {
            Some(secs) => Timestamp::new(secs, 0.0),
            None => Timestamp::from_secs_f64(n.as_f64()?),
        },
        Json::Object(map) => Timestamp::new(
            whole(map.get("full_secs")?)?,
            map.get("frac_secs").map_or(Some(0.0), Json::as_f64)?,
        ),
        _ => return None,
    };
    Some(Value::Time(ts))
}

fn generic(json: Json) -> Value {
    match json {
        Json::Null => Value::Clear,
        Json::Bool(b) => Value::Int(i64::from(b)),
        Json::Number(n) => number(&n),
        Json::String(s) => Value::Str(s),
        other => Value::Str(other.to_string()),
    }
}

/// Integral numbers become `Int` even when written as `1.0`
fn number(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        return Value::Int(i);
    }
    let f = n.as_f64().unwrap_or(f64::NAN);
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Value::Int(f as i64)
    } else {
        Value::Float(f)
    }
}

fn whole(json: &Json) -> Option<i64> {
    match json {
        Json::Number(n) => number(n).as_i64(),
        _ => None,
    }
}

/// Encode a command as a JSON object
pub fn command_to_json(command: &Command) -> Json {
    let mut map = Map::new();
    for (key, value) in command.iter() {
        map.insert(key.to_string(), encode_value(value));
    }
    Json::Object(map)
}

/// Encode a command as JSON text
pub fn encode_command(command: &Command) -> String {
    command_to_json(command).to_string()
}

/// Encode a single value
pub fn encode_value(value: &Value) -> Json {
    match value {
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::Str(s) => Json::String(s.clone()),
        Value::Tune(req) => serde_json::to_value(req).unwrap_or(Json::Null),
        Value::Time(ts) => Json::Array(vec![
            Json::from(ts.full_secs()),
            Number::from_f64(ts.frac_secs()).map_or(Json::Null, Json::Number),
        ]),
        Value::Gpio(gpio) => serde_json::to_value(gpio).unwrap_or(Json::Null),
        Value::Clear => Json::Null,
    }
}
