//! Frames the hub sends to observers.
//!
//! Every frame is a JSON array whose first element names the event:
//!
//!  - `["hello", payload]`: handshake sent when an observer connects.
//!
//!  - `["chainblock", {"block": block_JSON}]`: a block forwarded from the ledger.
//!
pub mod chainblock;
pub mod hello;

/// [`communication_with_observer`](self) error
#[derive(thiserror::Error, Debug)]
pub enum Error {
  /// Error serializing or deserializing JSON data
  #[error(transparent)]
  Json(#[from] serde_json::Error),
  #[error("Invalid data")]
  InvalidData,
}
