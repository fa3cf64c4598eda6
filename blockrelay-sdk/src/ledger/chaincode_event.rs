use serde::{Deserialize, Serialize};

use super::Bytes;

/// Application level event emitted by chaincode while executing a
/// transaction. Either embedded in a block's non-hash data or streamed on
/// its own.
///
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChaincodeEvent {
  #[serde(rename = "chaincodeID", deserialize_with = "super::null_as_default")]
  pub chaincode_id: String,
  #[serde(rename = "txID", deserialize_with = "super::null_as_default")]
  pub tx_id: String,
  #[serde(deserialize_with = "super::null_as_default")]
  pub event_name: String,
  pub payload: Bytes,
}
