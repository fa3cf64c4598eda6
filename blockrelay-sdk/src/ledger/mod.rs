//! Data model of the ledger's events protocol.
//!
//! Everything here mirrors the JSON mapping a ledger node uses on its event
//! stream: camelCase keys, opaque bytes as base64 strings and `int64` values
//! that may arrive either as strings or as numbers.

pub mod block;
pub mod bytes;
pub mod chaincode_event;
pub mod message;
pub mod subscription;
pub mod timestamp;
pub mod transaction;

use serde::{Deserialize, Deserializer};

pub use self::block::{Block, BlockSummary, NonHashData};
pub use self::bytes::Bytes;
pub use self::chaincode_event::ChaincodeEvent;
pub use self::message::{InboundMessage, Register, Rejection};
pub use self::subscription::{EventType, Interest, SubscriptionRequest};
pub use self::timestamp::Timestamp;
pub use self::transaction::{ConfidentialityLevel, Transaction};

/// [`ledger`](self) error
#[derive(thiserror::Error, Debug)]
pub enum Error {
  /// Error serializing or deserializing JSON data
  #[error(transparent)]
  Json(#[from] serde_json::Error),
  /// Opaque bytes field that is not valid base64
  #[error(transparent)]
  Base64(#[from] base64::DecodeError),
  #[error("Invalid data")]
  InvalidData,
}

/// Reads an explicit `null` as the field's default, the way ledger nodes
/// write unset message fields.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
