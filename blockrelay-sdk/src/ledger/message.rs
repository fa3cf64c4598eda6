use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{Block, ChaincodeEvent, Error, Interest, Transaction};

/// A transaction the ledger refused, with the reason.
///
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Rejection {
  pub tx: Option<Transaction>,
  #[serde(deserialize_with = "super::null_as_default")]
  pub error_msg: String,
}

/// Interests acknowledged by a `register` or `unregister` message.
///
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Register {
  #[serde(deserialize_with = "super::null_as_default")]
  pub events: Vec<Interest>,
}

/// Wire shape of every inbound message: an object with at most one of these
/// keys populated. Anything else (e.g. the `"Event": "block"` discriminator)
/// is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawEvent {
  block: Option<Block>,
  chaincode_event: Option<ChaincodeEvent>,
  rejection: Option<Rejection>,
  register: Option<Register>,
  unregister: Option<Register>,
}

/// Message received from a ledger node's event stream.
///
/// Decoded once from the wire; the variant is chosen by which key is
/// populated, checked in declaration order.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
  Block(Block),
  ChaincodeEvent(ChaincodeEvent),
  Rejection(Rejection),
  Register(Register),
  Unregister(Register),
  /// No known key was populated
  Unknown,
}

impl InboundMessage {
  /// Name of the populated variant, as used on the wire.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Block(_) => "block",
      Self::ChaincodeEvent(_) => "chaincodeEvent",
      Self::Rejection(_) => "rejection",
      Self::Register(_) => "register",
      Self::Unregister(_) => "unregister",
      Self::Unknown => "unknown",
    }
  }

  /// Serialize as [`Value`]
  pub fn as_value(&self) -> Value {
    match self {
      Self::Block(block) => json!({ "block": block }),
      Self::ChaincodeEvent(event) => json!({ "chaincodeEvent": event }),
      Self::Rejection(rejection) => json!({ "rejection": rejection }),
      Self::Register(register) => json!({ "register": register }),
      Self::Unregister(unregister) => json!({ "unregister": unregister }),
      Self::Unknown => json!({}),
    }
  }

  /// Deserialize from [`Value`]
  pub fn from_value(msg: Value) -> Result<Self, Error> {
    if !msg.is_object() {
      return Err(Error::InvalidData);
    }

    let raw: RawEvent = serde_json::from_value(msg)?;

    let message = if let Some(block) = raw.block {
      Self::Block(block)
    } else if let Some(event) = raw.chaincode_event {
      Self::ChaincodeEvent(event)
    } else if let Some(rejection) = raw.rejection {
      Self::Rejection(rejection)
    } else if let Some(register) = raw.register {
      Self::Register(register)
    } else if let Some(unregister) = raw.unregister {
      Self::Unregister(unregister)
    } else {
      Self::Unknown
    };

    Ok(message)
  }

  /// Get [`InboundMessage`] as JSON string
  pub fn as_json(&self) -> String {
    self.as_value().to_string()
  }

  /// Get [`InboundMessage`] from JSON string
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
