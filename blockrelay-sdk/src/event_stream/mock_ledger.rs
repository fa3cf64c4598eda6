//! In-process ledger node used by the tests: accepts WebSocket connections,
//! records the subscription request of each one and then plays a script.

use std::{
  net::SocketAddr,
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
};

use futures_util::{SinkExt, StreamExt};
use tokio::{
  net::TcpListener,
  sync::mpsc::{unbounded_channel, UnboundedReceiver},
};
use tokio_tungstenite::tungstenite::Message;

use crate::ledger::SubscriptionRequest;

#[derive(Debug, Clone)]
pub(crate) enum Script {
  Send(String),
  SendBinary(Vec<u8>),
  /// Closing handshake, then wait for the peer to go away
  Close,
  /// Drop the socket without a closing handshake
  Drop,
  /// Keep the connection open until the peer leaves
  Hold,
}

pub(crate) struct MockLedger {
  pub addr: SocketAddr,
  pub subscriptions: UnboundedReceiver<SubscriptionRequest>,
  subscription_count: Arc<AtomicUsize>,
  connection_count: Arc<AtomicUsize>,
}

impl MockLedger {
  /// One script per expected connection, in connection order. Once every
  /// script is used up the listener is dropped and further connections are
  /// refused.
  pub async fn start(connections: Vec<Vec<Script>>) -> Self {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (subscriptions_tx, subscriptions) = unbounded_channel();
    let subscription_count = Arc::new(AtomicUsize::new(0));
    let connection_count = Arc::new(AtomicUsize::new(0));

    let subscriptions_seen = Arc::clone(&subscription_count);
    let connections_seen = Arc::clone(&connection_count);
    tokio::spawn(async move {
      for script in connections {
        let Ok((stream, _)) = listener.accept().await else {
          return;
        };
        connections_seen.fetch_add(1, Ordering::SeqCst);
        let subscriptions_tx = subscriptions_tx.clone();
        let subscriptions_seen = Arc::clone(&subscriptions_seen);

        tokio::spawn(async move {
          let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

          if let Some(Ok(Message::Text(text))) = ws.next().await {
            if let Ok(request) = SubscriptionRequest::from_json(text) {
              subscriptions_seen.fetch_add(1, Ordering::SeqCst);
              let _ = subscriptions_tx.send(request);
            }
          }

          for step in script {
            match step {
              Script::Send(text) => {
                if ws.send(Message::Text(text)).await.is_err() {
                  return;
                }
              }
              Script::SendBinary(bytes) => {
                if ws.send(Message::Binary(bytes)).await.is_err() {
                  return;
                }
              }
              Script::Close => {
                let _ = ws.close(None).await;
                while let Some(Ok(_)) = ws.next().await {}
                return;
              }
              Script::Drop => {
                drop(ws);
                return;
              }
              Script::Hold => {
                while let Some(Ok(_)) = ws.next().await {}
                return;
              }
            }
          }
        });
      }
    });

    Self {
      addr,
      subscriptions,
      subscription_count,
      connection_count,
    }
  }

  /// `host:port` of the node.
  pub fn endpoint(&self) -> String {
    self.addr.to_string()
  }

  pub fn subscription_count(&self) -> usize {
    self.subscription_count.load(Ordering::SeqCst)
  }

  pub fn connection_count(&self) -> usize {
    self.connection_count.load(Ordering::SeqCst)
  }
}
