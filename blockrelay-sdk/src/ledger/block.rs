use serde::{Deserialize, Serialize};

use super::{Bytes, ChaincodeEvent, Timestamp, Transaction};

/// Data attached to a block that is not covered by its hash.
///
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NonHashData {
  pub local_ledger_commit_timestamp: Option<Timestamp>,
  #[serde(deserialize_with = "super::null_as_default")]
  pub chaincode_events: Vec<ChaincodeEvent>,
}

///
/// An ordered batch of committed transactions plus the hashes chaining it to
/// the rest of the ledger.
///
/// Example:
///   ```json
///   {
///     "version": 0,
///     "timestamp": null,
///     "transactions": [{ "type": "CHAINCODE_INVOKE", "txid": "d6b67c6f-5b77-43aa-8aef-9a528c874016" }],
///     "stateHash": "QUJD",
///     "previousBlockHash": "",
///     "consensusMetadata": "",
///     "nonHashData": {
///       "localLedgerCommitTimestamp": { "seconds": "1472243627", "nanos": 376272706 },
///       "chaincodeEvents": []
///     }
///   }
///   ```
///
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Block {
  #[serde(deserialize_with = "super::null_as_default")]
  pub version: u32,
  pub timestamp: Option<Timestamp>,
  #[serde(deserialize_with = "super::null_as_default")]
  pub transactions: Vec<Transaction>,
  pub state_hash: Bytes,
  pub previous_block_hash: Bytes,
  pub consensus_metadata: Bytes,
  #[serde(deserialize_with = "super::null_as_default")]
  pub non_hash_data: NonHashData,
}

impl Block {
  pub fn summary(&self) -> BlockSummary {
    BlockSummary {
      state_hash: self.state_hash.to_base64(),
      previous_block_hash: self.previous_block_hash.to_base64(),
      transactions: self.transactions.len(),
      chaincode_events: self.non_hash_data.chaincode_events.len(),
    }
  }
}

/// The fields of a [`Block`] worth logging.
///
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BlockSummary {
  /// base64 of the state hash
  pub state_hash: String,
  /// base64 of the previous block hash
  pub previous_block_hash: String,
  pub transactions: usize,
  pub chaincode_events: usize,
}

impl std::fmt::Display for BlockSummary {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "stateHash={} previousBlockHash={} transactions={} chaincodeEvents={}",
      self.state_hash, self.previous_block_hash, self.transactions, self.chaincode_events
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[cfg(test)]
  use pretty_assertions::assert_eq;
  use serde_json::json;

  #[test]
  fn deserializes_block_with_non_hash_data() {
    let block: Block = serde_json::from_value(json!({
      "version": 1,
      "timestamp": null,
      "transactions": [{"type": "CHAINCODE_INVOKE", "txid": "tx-1"}],
      "stateHash": "QUJD",
      "previousBlockHash": "WFla",
      "consensusMetadata": {},
      "nonHashData": {
        "localLedgerCommitTimestamp": {"seconds": "1472243627", "nanos": 376272706},
        "chaincodeEvents": [
          {"chaincodeID": "bonds", "txID": "tx-1", "eventName": "bond.created", "payload": "e30="}
        ]
      }
    }))
    .unwrap();

    assert_eq!(block.version, 1);
    assert_eq!(block.timestamp, None);
    assert_eq!(block.state_hash.as_slice(), b"ABC");
    assert_eq!(block.previous_block_hash.as_slice(), b"XYZ");
    assert!(block.consensus_metadata.is_empty());
    assert_eq!(
      block.non_hash_data.local_ledger_commit_timestamp,
      Some(Timestamp::new(1472243627, 376272706))
    );

    let event = &block.non_hash_data.chaincode_events[0];
    assert_eq!(event.chaincode_id, "bonds");
    assert_eq!(event.tx_id, "tx-1");
    assert_eq!(event.event_name, "bond.created");
    assert_eq!(event.payload.as_slice(), b"{}");
  }

  #[test]
  fn explicit_nulls_decode_as_defaults() {
    let block: Block = serde_json::from_value(json!({
      "version": null,
      "timestamp": null,
      "transactions": [{
        "type": null,
        "txid": null,
        "confidentialityLevel": null,
        "confidentialityProtocolVersion": null,
        "nonce": null
      }],
      "stateHash": "QUJD",
      "previousBlockHash": null,
      "consensusMetadata": null,
      "nonHashData": {
        "localLedgerCommitTimestamp": null,
        "chaincodeEvents": [{"chaincodeID": null, "txID": null, "eventName": null, "payload": null}]
      }
    }))
    .unwrap();

    assert_eq!(block.version, 0);
    assert_eq!(block.state_hash.as_slice(), b"ABC");
    assert_eq!(block.transactions, vec![Transaction::default()]);
    assert_eq!(block.non_hash_data.chaincode_events, vec![ChaincodeEvent::default()]);

    let block: Block =
      serde_json::from_value(json!({"stateHash": "QUJD", "nonHashData": {"chaincodeEvents": null}}))
        .unwrap();
    assert_eq!(block.non_hash_data, NonHashData::default());
  }

  #[test]
  fn summary_carries_base64_hashes_and_counts() {
    let block = Block {
      state_hash: Bytes::from("ABC"),
      previous_block_hash: Bytes::from("XYZ"),
      transactions: vec![Transaction::default(), Transaction::default()],
      ..Default::default()
    };

    let summary = block.summary();

    assert_eq!(summary.state_hash, "QUJD");
    assert_eq!(summary.previous_block_hash, "WFla");
    assert_eq!(summary.transactions, 2);
    assert_eq!(summary.chaincode_events, 0);
    assert_eq!(
      summary.to_string(),
      "stateHash=QUJD previousBlockHash=WFla transactions=2 chaincodeEvents=0"
    );
  }
}
