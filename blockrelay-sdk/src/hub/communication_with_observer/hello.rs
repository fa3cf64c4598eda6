use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};

use super::Error;

/// Greeting the hub sends on connect.
pub const GREETING: &str = "Hi user!";

/// Handshake exchanged when an observer connects. The hub sends one with
/// [`GREETING`]; observers may answer with any payload.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverCommHello {
  pub code: String, // "hello"
  pub payload: Value,
}

impl ObserverCommHello {
  /// Create new `hello` message
  pub fn new_hello(payload: impl Into<Value>) -> Self {
    Self {
      code: "hello".to_string(),
      payload: payload.into(),
    }
  }

  /// Serialize as [`Value`]
  pub fn as_value(&self) -> Value {
    json!([self.code, self.payload])
  }

  /// Deserialize from [`Value`]
  pub fn from_value(msg: Value) -> Result<Self, Error> {
    let v = msg.as_array().ok_or(Error::InvalidData)?;

    // ["hello", <payload>]
    if v.len() != 2 || v[0] != "hello" {
      return Err(Error::InvalidData);
    }

    Ok(Self::new_hello(v[1].clone()))
  }

  /// Get [`ObserverCommHello`] as JSON string
  pub fn as_json(&self) -> String {
    self.as_value().to_string()
  }

  /// Get [`ObserverCommHello`] from JSON string
  pub fn from_json<S>(msg: S) -> Result<Self, Error>
  where
    S: Into<String>,
  {
    let msg: &str = &msg.into();

    if msg.is_empty() {
      return Err(Error::InvalidData);
    }

    let value: Value = serde_json::from_str(msg)?;
    Self::from_value(value)
  }
}

impl Default for ObserverCommHello {
  fn default() -> Self {
    Self::new_hello(GREETING)
  }
}

impl Serialize for ObserverCommHello {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    let json_value: Value = self.as_value();
    json_value.serialize(serializer)
  }
}

impl<'de> Deserialize<'de> for ObserverCommHello {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let json_value: Value = Value::deserialize(deserializer)?;
    ObserverCommHello::from_value(json_value).map_err(serde::de::Error::custom)
  }
}
