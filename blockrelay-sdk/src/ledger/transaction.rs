use serde::{Deserialize, Serialize};

use super::{Bytes, Timestamp};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidentialityLevel {
  #[default]
  Public,
  Confidential,
}

/// A transaction committed as part of a [`Block`](super::Block).
///
/// Nonce, certificate and signature are empty when the transaction was not
/// signed.
///
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
  #[serde(rename = "type", deserialize_with = "super::null_as_default")]
  pub tx_type: String,
  #[serde(rename = "chaincodeID")]
  pub chaincode_id: Bytes,
  pub payload: Bytes,
  pub metadata: Bytes,
  #[serde(deserialize_with = "super::null_as_default")]
  pub txid: String,
  pub timestamp: Option<Timestamp>,
  #[serde(deserialize_with = "super::null_as_default")]
  pub confidentiality_level: ConfidentialityLevel,
  #[serde(deserialize_with = "super::null_as_default")]
  pub confidentiality_protocol_version: String,
  pub nonce: Bytes,
  pub to_validators: Bytes,
  pub cert: Bytes,
  pub signature: Bytes,
}

impl Transaction {
  pub fn is_signed(&self) -> bool {
    !self.signature.is_empty()
  }
}
