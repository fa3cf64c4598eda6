use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Point in time as seconds and nanoseconds since the Unix epoch.
///
/// `seconds` is an `int64` and is therefore written as a string, e.g.
/// `{"seconds": "1472243595", "nanos": 878832249}`. Numbers are accepted too.
///
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
  #[serde(
    default,
    serialize_with = "serialize_int64",
    deserialize_with = "deserialize_int64"
  )]
  pub seconds: i64,
  #[serde(default)]
  pub nanos: i32,
}

impl Timestamp {
  pub fn new(seconds: i64, nanos: i32) -> Self {
    Self { seconds, nanos }
  }
}

fn serialize_int64<S>(value: &i64, serializer: S) -> Result<S::Ok, S::Error>
where
  S: Serializer,
{
  serializer.serialize_str(&value.to_string())
}

fn deserialize_int64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
  D: Deserializer<'de>,
{
  match Value::deserialize(deserializer)? {
    Value::Null => Ok(0),
    Value::Number(number) => number
      .as_i64()
      .ok_or_else(|| de::Error::custom(format!("{number} is not an int64"))),
    Value::String(text) => text
      .parse::<i64>()
      .map_err(|err| de::Error::custom(format!("`{text}` is not an int64: {err}"))),
    other => Err(de::Error::custom(format!("expected int64, found {other}"))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[cfg(test)]
  use pretty_assertions::assert_eq;
  use serde_json::json;

  #[test]
  fn accepts_seconds_as_string_or_number() {
    let from_string: Timestamp =
      serde_json::from_value(json!({"seconds": "1472243595", "nanos": 878832249})).unwrap();
    let from_number: Timestamp =
      serde_json::from_value(json!({"seconds": 1472243595, "nanos": 878832249})).unwrap();

    assert_eq!(from_string, Timestamp::new(1472243595, 878832249));
    assert_eq!(from_string, from_number);
  }

  #[test]
  fn writes_seconds_as_string() {
    let value = serde_json::to_value(Timestamp::new(1472243627, 376272706)).unwrap();
    assert_eq!(value, json!({"seconds": "1472243627", "nanos": 376272706}));
  }

  #[test]
  fn rejects_non_numeric_seconds() {
    assert!(serde_json::from_value::<Timestamp>(json!({"seconds": "soon"})).is_err());
  }
}
