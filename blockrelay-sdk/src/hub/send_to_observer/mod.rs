use log::{debug, warn};
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::tungstenite::Message;

use crate::hub::{Error, ObserverId, Tx};

#[derive(Debug, Clone)]
pub struct OutboundInfo {
  pub observer_id: ObserverId,
  pub tx: Tx,
  pub content: String,
}

/// Queues `content` without waiting: a full queue drops it.
pub fn send_message_to_observer(observer_id: ObserverId, tx: &Tx, content: String) -> Result<(), Error> {
  debug!("[{observer_id}] {content}");
  tx.try_send(Message::Text(content)).map_err(|err| match err {
    TrySendError::Full(_) => Error::QueueFull(observer_id),
    TrySendError::Closed(_) => Error::ObserverGone(observer_id),
  })
}

/// Sends every message, skipping observers that went away in the meantime
/// or are too far behind. Returns how many were handed over.
pub fn broadcast_message_to_observers(outbound_observer_and_message: Vec<OutboundInfo>) -> usize {
  let mut delivered = 0;

  for recp in outbound_observer_and_message {
    match send_message_to_observer(recp.observer_id, &recp.tx, recp.content) {
      Ok(()) => delivered += 1,
      Err(err) => warn!("{err}"),
    }
  }

  delivered
}
