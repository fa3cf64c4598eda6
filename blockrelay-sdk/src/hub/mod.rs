//! Fan-out of forwarded blocks to every connected observer.

pub mod communication_with_observer;
pub mod receive_from_observer;
pub mod send_to_observer;

use std::{
  collections::HashMap,
  net::SocketAddr,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
  time::Duration,
};

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::{
  net::{TcpListener, TcpStream},
  sync::mpsc::{self, Receiver, Sender},
  time::{self, Instant, Interval},
};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
  hub::{
    communication_with_observer::{chainblock::ObserverCommChainblock, hello::ObserverCommHello},
    receive_from_observer::on_observer_message,
    send_to_observer::{broadcast_message_to_observers, send_message_to_observer, OutboundInfo},
  },
  ledger::Block,
};

pub type Tx = Sender<Message>;
pub type ObserverId = Uuid;

/// Frames queued per observer before further ones are dropped.
pub const OBSERVER_QUEUE_CAPACITY: usize = 256;

const ACCEPT_ERROR_DELAY: Duration = Duration::from_millis(100);

/// [`hub`](self) error
#[derive(thiserror::Error, Debug)]
pub enum Error {
  #[error("observer {0} is no longer connected")]
  ObserverGone(ObserverId),
  #[error("queue of observer {0} is full, message dropped")]
  QueueFull(ObserverId),
  #[error("WebSocket handshake failed: {0}")]
  Handshake(#[from] tungstenite::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
  /// Send [`ObserverCommChainblock::demo`] to every new observer, before
  /// the `hello` handshake.
  pub send_demo_block: bool,
  /// Zero disables pings.
  pub ping_interval: Duration,
}

impl Default for HubConfig {
  fn default() -> Self {
    Self {
      send_demo_block: true,
      ping_interval: Duration::from_secs(20),
    }
  }
}

/// Holds information about an observer connection.
///
#[derive(Debug, Clone)]
pub struct ObserverConnectionInfo {
  pub id: ObserverId,
  pub socket_addr: SocketAddr,
  pub tx: Tx,
}

#[derive(Debug, Clone, Default)]
pub struct BroadcastHub {
  observers: Arc<Mutex<HashMap<ObserverId, ObserverConnectionInfo>>>,
  config: HubConfig,
}

impl BroadcastHub {
  pub fn new(config: HubConfig) -> Self {
    Self {
      observers: Arc::new(Mutex::new(HashMap::new())),
      config,
    }
  }

  pub fn config(&self) -> &HubConfig {
    &self.config
  }

  fn observers(&self) -> MutexGuard<'_, HashMap<ObserverId, ObserverConnectionInfo>> {
    self.observers.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Adds an observer and queues its handshake. Everything broadcast from
  /// now on ends up in the returned receiver.
  pub fn register(&self, socket_addr: SocketAddr) -> (ObserverId, Receiver<Message>) {
    let id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(OBSERVER_QUEUE_CAPACITY);

    // rx is alive and empty, these cannot fail
    if self.config.send_demo_block {
      let _ = send_message_to_observer(id, &tx, ObserverCommChainblock::demo().as_json());
    }
    let _ = send_message_to_observer(id, &tx, ObserverCommHello::default().as_json());

    self.observers().insert(
      id,
      ObserverConnectionInfo {
        id,
        socket_addr,
        tx,
      },
    );
    info!("[io] a new user connected: {id} ({socket_addr})");

    (id, rx)
  }

  /// Returns `false` when the observer was not registered.
  pub fn unregister(&self, id: ObserverId) -> bool {
    let removed = self.observers().remove(&id);
    if let Some(observer) = &removed {
      info!("[io] user disconnected: {id} ({})", observer.socket_addr);
    }
    removed.is_some()
  }

  pub fn observer_count(&self) -> usize {
    self.observers().len()
  }

  /// Sends `block` to every observer registered right now and returns how
  /// many of them it reached.
  pub fn broadcast(&self, block: &Block) -> usize {
    let content = ObserverCommChainblock::new_chainblock(block.clone()).as_json();

    let recipients: Vec<OutboundInfo> = self
      .observers()
      .values()
      .map(|observer| OutboundInfo {
        observer_id: observer.id,
        tx: observer.tx.clone(),
        content: content.clone(),
      })
      .collect();

    let delivered = broadcast_message_to_observers(recipients);
    debug!(
      "chainblock {} sent to {delivered} observer(s)",
      block.state_hash.to_base64()
    );
    delivered
  }

  /// Asks every connection to close.
  pub fn close_all(&self) {
    for observer in self.observers().values() {
      if observer.tx.try_send(Message::Close(None)).is_err() {
        warn!("[io] could not ask {} to close", observer.id);
      }
    }
  }

  /// Accepts observers until `cancel` fires.
  pub async fn serve(&self, listener: TcpListener, cancel: CancellationToken) {
    loop {
      let accepted = tokio::select! {
        biased;
        _ = cancel.cancelled() => break,
        accepted = listener.accept() => accepted,
      };

      match accepted {
        Ok((stream, addr)) => {
          let hub = self.clone();
          tokio::spawn(async move {
            if let Err(err) = hub.handle_connection(stream, addr).await {
              warn!("[io] connection with {addr} failed: {err}");
            }
          });
        }
        Err(err) => {
          error!("Error accepting observer connection: {err}");
          if !pause_after_accept_error(&cancel).await {
            break;
          }
        }
      }
    }

    info!("[io] stopped accepting observers");
  }

  async fn handle_connection(self, raw_stream: TcpStream, addr: SocketAddr) -> Result<(), Error> {
    let ws_stream = tokio_tungstenite::accept_async(raw_stream).await?;
    info!("WebSocket connection established: {addr}");

    let (id, mut rx) = self.register(addr);
    let (mut outgoing, mut incoming) = ws_stream.split();

    let mut ping = ping_timer(self.config.ping_interval);

    let to_observer = async {
      loop {
        tokio::select! {
          msg = rx.recv() => {
            let Some(msg) = msg else { break };
            let closing = matches!(msg, Message::Close(_));
            if let Err(err) = outgoing.send(msg).await {
              debug!("Error sending to {addr}: {err}");
              break;
            }
            if closing {
              break;
            }
          }
          _ = next_ping(&mut ping) => {
            if outgoing.send(Message::Ping(vec![])).await.is_err() {
              break;
            }
            debug!("Sent ping to {addr}.");
          }
        }
      }
    };

    let from_observer = async {
      while let Some(frame) = incoming.next().await {
        match frame {
          Ok(Message::Close(_)) => break,
          Ok(msg) => on_observer_message(addr, &msg),
          Err(err) => {
            debug!("[io] {addr}: {err}");
            break;
          }
        }
      }
    };

    // Whichever side finishes first means the connection is gone.
    tokio::select! {
      _ = to_observer => {}
      _ = from_observer => {}
    }

    self.unregister(id);
    Ok(())
  }
}

/// Returns `false` when `cancel` fired during the pause.
async fn pause_after_accept_error(cancel: &CancellationToken) -> bool {
  tokio::select! {
    biased;
    _ = cancel.cancelled() => false,
    _ = time::sleep(ACCEPT_ERROR_DELAY) => true,
  }
}

fn ping_timer(period: Duration) -> Option<Interval> {
  if period.is_zero() {
    return None;
  }
  Some(time::interval_at(Instant::now() + period, period))
}

async fn next_ping(ping: &mut Option<Interval>) {
  match ping {
    Some(interval) => {
      interval.tick().await;
    }
    None => std::future::pending().await,
  }
}
