use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::Error;

/// Opaque byte field (hashes, payloads, certificates...).
///
/// Serialized as a standard base64 string. On the way in it also accepts
/// `null`, an empty object `{}` and the `{"type":"Buffer","data":[..]}` shape,
/// since different ledger SDKs render an empty or raw buffer that way.
///
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
  pub fn new(bytes: Vec<u8>) -> Self {
    Self(bytes)
  }

  pub fn as_slice(&self) -> &[u8] {
    &self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn to_base64(&self) -> String {
    BASE64.encode(&self.0)
  }

  pub fn from_base64(encoded: &str) -> Result<Self, Error> {
    Ok(Self(BASE64.decode(encoded)?))
  }

  fn from_value(value: Value) -> Result<Self, Error> {
    match value {
      Value::Null => Ok(Self::default()),
      Value::String(encoded) => Self::from_base64(&encoded),
      Value::Object(map) if map.is_empty() => Ok(Self::default()),
      Value::Object(mut map) => {
        // {"type": "Buffer", "data": [1, 2, 3]}
        if map.get("type").and_then(Value::as_str) != Some("Buffer") {
          return Err(Error::InvalidData);
        }
        let data = map.remove("data").ok_or(Error::InvalidData)?;
        let bytes: Vec<u8> = serde_json::from_value(data)?;
        Ok(Self(bytes))
      }
      _ => Err(Error::InvalidData),
    }
  }
}

impl From<Vec<u8>> for Bytes {
  fn from(bytes: Vec<u8>) -> Self {
    Self(bytes)
  }
}

impl From<&[u8]> for Bytes {
  fn from(bytes: &[u8]) -> Self {
    Self(bytes.to_vec())
  }
}

impl From<&str> for Bytes {
  fn from(text: &str) -> Self {
    Self(text.as_bytes().to_vec())
  }
}

impl Serialize for Bytes {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.serialize_str(&self.to_base64())
  }
}

impl<'de> Deserialize<'de> for Bytes {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let json_value: Value = Value::deserialize(deserializer)?;
    Bytes::from_value(json_value).map_err(de::Error::custom)
  }
}
