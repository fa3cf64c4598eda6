use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::Error;

/// Event categories a subscriber can express interest in.
///
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
  #[default]
  Block,
  Chaincode,
  Rejection,
  Register,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interest {
  pub event_type: EventType,
}

impl Interest {
  pub fn new(event_type: EventType) -> Self {
    Self { event_type }
  }
}

/// First and only message written to a ledger node's event stream.
///
///   ```json
///   {"register": {"events": [{"eventType": "BLOCK"}]}}
///   ```
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRequest {
  pub interests: Vec<Interest>,
}

impl SubscriptionRequest {
  /// Subscription to new block notifications.
  pub fn new_block() -> Self {
    Self {
      interests: vec![Interest::new(EventType::Block)],
    }
  }

  /// Serialize as [`Value`]
  pub fn as_value(&self) -> Value {
    json!({ "register": { "events": self.interests } })
  }

  /// Deserialize from [`Value`]
  pub fn from_value(msg: Value) -> Result<Self, Error> {
    let events = msg
      .get("register")
      .and_then(|register| register.get("events"))
      .ok_or(Error::InvalidData)?;

    let interests: Vec<Interest> = serde_json::from_value(events.clone())?;
    Ok(Self { interests })
  }

  /// Get [`SubscriptionRequest`] as JSON string
  pub fn as_json(&self) -> String {
    self.as_value().to_string()
  }

  /// Get [`SubscriptionRequest`] from JSON string
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

impl Default for SubscriptionRequest {
  fn default() -> Self {
    Self::new_block()
  }
}
