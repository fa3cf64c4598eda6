use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};

use super::Error;
use crate::ledger::{
  Block, Bytes, ChaincodeEvent, ConfidentialityLevel, NonHashData, Timestamp, Transaction,
};

/// A block forwarded to observers, wrapped the way the ledger delivered it:
/// `["chainblock", {"block": <Block>}]`.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverCommChainblock {
  pub code: String, // "chainblock"
  pub block: Block,
}

impl ObserverCommChainblock {
  /// Create new `chainblock` message
  pub fn new_chainblock(block: Block) -> Self {
    Self {
      code: "chainblock".to_string(),
      block,
    }
  }

  /// The sample block sent to freshly connected observers when
  /// [`HubConfig::send_demo_block`](crate::hub::HubConfig) is on.
  pub fn demo() -> Self {
    let transaction = Transaction {
      tx_type: "MY_CHAINCODE_TEST".to_string(),
      txid: "d6b67c6f-5b77-43aa-8aef-9a528c874016".to_string(),
      timestamp: Some(Timestamp::new(1472243595, 878832249)),
      confidentiality_level: ConfidentialityLevel::Public,
      ..Default::default()
    };

    Self::new_chainblock(Block {
      version: 0,
      timestamp: None,
      transactions: vec![transaction],
      state_hash: Bytes::default(),
      previous_block_hash: Bytes::default(),
      consensus_metadata: Bytes::default(),
      non_hash_data: NonHashData {
        local_ledger_commit_timestamp: Some(Timestamp::new(1472243627, 376272706)),
        chaincode_events: vec![ChaincodeEvent::default()],
      },
    })
  }

  /// Serialize as [`Value`]
  pub fn as_value(&self) -> Value {
    json!([self.code, { "block": self.block }])
  }

  /// Deserialize from [`Value`]
  pub fn from_value(msg: Value) -> Result<Self, Error> {
    let v = msg.as_array().ok_or(Error::InvalidData)?;

    // ["chainblock", {"block": <block JSON>}]
    if v.len() != 2 || v[0] != "chainblock" {
      return Err(Error::InvalidData);
    }

    let block = v[1].get("block").ok_or(Error::InvalidData)?;
    let block: Block = serde_json::from_value(block.clone())?;
    Ok(Self::new_chainblock(block))
  }

  /// Get [`ObserverCommChainblock`] as JSON string
  pub fn as_json(&self) -> String {
    self.as_value().to_string()
  }

  /// Get [`ObserverCommChainblock`] from JSON string
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

impl Default for ObserverCommChainblock {
  fn default() -> Self {
    Self::new_chainblock(Block::default())
  }
}

impl Serialize for ObserverCommChainblock {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    let json_value: Value = self.as_value();
    json_value.serialize(serializer)
  }
}

impl<'de> Deserialize<'de> for ObserverCommChainblock {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let json_value: Value = Value::deserialize(deserializer)?;
    ObserverCommChainblock::from_value(json_value).map_err(serde::de::Error::custom)
  }
}
