use log::{debug, info};

use crate::ledger::{Block, BlockSummary, ChaincodeEvent, InboundMessage};

/// What the relay makes of one [`InboundMessage`].
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
  /// A new block; the only kind forwarded to observers.
  Block { summary: BlockSummary, block: Block },
  /// Application event emitted by chaincode.
  Application(ChaincodeEvent),
  /// Acks, rejections and empty messages. Never forwarded.
  Unrecognized(InboundMessage),
}

impl Classified {
  pub fn is_block(&self) -> bool {
    matches!(self, Self::Block { .. })
  }
}

/// Dispatches on the populated variant: block first, then chaincode event,
/// everything else is unrecognized.
pub fn classify(message: InboundMessage) -> Classified {
  match message {
    InboundMessage::Block(block) => {
      let summary = block.summary();
      info!("block: {}", summary.state_hash);
      Classified::Block { summary, block }
    }
    InboundMessage::ChaincodeEvent(event) => {
      info!("event: {} (txid {})", event.event_name, event.tx_id);
      Classified::Application(event)
    }
    other => {
      debug!("data: {} message not forwarded", other.kind());
      Classified::Unrecognized(other)
    }
  }
}
