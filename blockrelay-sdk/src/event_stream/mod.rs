//! One connection to a ledger node's event stream.
//!
//! [`EventStreamClient::open`] connects, writes the new-block subscription and
//! hands back a client whose [`next`](EventStreamClient::next) yields each
//! inbound message already decoded and classified, until the stream ends or
//! fails. Reconnecting is the caller's job (see [`crate::supervisor`]).

use std::time::Duration;

use futures_util::{
  stream::{SplitSink, SplitStream},
  SinkExt, StreamExt,
};
use log::{debug, info};
use tokio::{net::TcpStream, time};
use tokio_tungstenite::{
  connect_async,
  tungstenite::{self, Message},
  MaybeTlsStream, WebSocketStream,
};
use url::Url;

use crate::ledger::{self, InboundMessage, SubscriptionRequest};

pub mod classify;

#[cfg(test)]
pub(crate) mod mock_ledger;

pub use self::classify::{classify, Classified};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why a stream stopped.
#[derive(thiserror::Error, Debug)]
pub enum StreamError {
  /// Connection refused, reset or closed without a closing handshake
  #[error(transparent)]
  Transport(#[from] tungstenite::Error),
  /// A frame that is not a valid inbound message
  #[error("decode error: {0}")]
  Decode(#[from] ledger::Error),
  #[error("timed out after {0:?}")]
  Timeout(Duration),
  #[error("invalid endpoint `{0}`")]
  InvalidEndpoint(String),
}

/// Signal produced by [`EventStreamClient::next`].
#[derive(Debug)]
pub enum StreamSignal {
  Message(Classified),
  /// Peer closed the stream cleanly
  Ended,
  Failed(StreamError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOptions {
  /// Upper bound for the WebSocket handshake.
  pub connect_timeout: Duration,
  /// Longest wait for the next frame. `None` waits forever.
  pub idle_timeout: Option<Duration>,
}

impl Default for StreamOptions {
  fn default() -> Self {
    Self {
      connect_timeout: Duration::from_secs(5),
      idle_timeout: None,
    }
  }
}

/// Turns a `host:port` endpoint into a WebSocket URL. Endpoints that already
/// carry a `ws://` or `wss://` scheme are kept as they are.
pub fn endpoint_url(endpoint: &str) -> Result<Url, StreamError> {
  let endpoint = endpoint.trim();
  let invalid = || StreamError::InvalidEndpoint(endpoint.to_string());

  if endpoint.is_empty() {
    return Err(invalid());
  }

  let url = if endpoint.contains("://") {
    Url::parse(endpoint).map_err(|_| invalid())?
  } else {
    Url::parse(&format!("ws://{endpoint}/")).map_err(|_| invalid())?
  };

  match (url.scheme(), url.host_str()) {
    ("ws" | "wss", Some(host)) if !host.is_empty() => Ok(url),
    _ => Err(invalid()),
  }
}

pub struct EventStreamClient {
  url: Url,
  // Kept so the connection stays open; nothing is written after the
  // subscription request.
  outgoing: SplitSink<WsStream, Message>,
  incoming: SplitStream<WsStream>,
  idle_timeout: Option<Duration>,
  finished: bool,
}

impl std::fmt::Debug for EventStreamClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("EventStreamClient")
      .field("url", &self.url.as_str())
      .field("idle_timeout", &self.idle_timeout)
      .field("finished", &self.finished)
      .finish()
  }
}

impl EventStreamClient {
  /// Connects to `endpoint` and writes the new-block subscription request.
  pub async fn open(endpoint: &str, options: &StreamOptions) -> Result<Self, StreamError> {
    let url = endpoint_url(endpoint)?;
    debug!("❯ Connecting to {url}");

    let (ws_stream, _) = time::timeout(options.connect_timeout, connect_async(url.clone()))
      .await
      .map_err(|_| StreamError::Timeout(options.connect_timeout))??;
    info!("❯ Connected to {url}");

    let (mut outgoing, incoming) = ws_stream.split();

    let subscription = SubscriptionRequest::new_block().as_json();
    outgoing.send(Message::Text(subscription)).await?;
    debug!("Subscription request sent to {url}");

    Ok(Self {
      url,
      outgoing,
      incoming,
      idle_timeout: options.idle_timeout,
      finished: false,
    })
  }

  pub fn url(&self) -> &Url {
    &self.url
  }

  /// Waits for the next inbound message.
  ///
  /// Once [`StreamSignal::Ended`] or [`StreamSignal::Failed`] has been
  /// returned, every further call returns [`StreamSignal::Ended`].
  pub async fn next(&mut self) -> StreamSignal {
    if self.finished {
      return StreamSignal::Ended;
    }

    let signal = self.receive().await;
    if !matches!(signal, StreamSignal::Message(_)) {
      self.finished = true;
    }
    signal
  }

  async fn receive(&mut self) -> StreamSignal {
    loop {
      let frame = match self.idle_timeout {
        Some(limit) => match time::timeout(limit, self.incoming.next()).await {
          Ok(frame) => frame,
          Err(_) => return StreamSignal::Failed(StreamError::Timeout(limit)),
        },
        None => self.incoming.next().await,
      };

      let text = match frame {
        None | Some(Err(tungstenite::Error::ConnectionClosed)) => return StreamSignal::Ended,
        Some(Err(err)) => return StreamSignal::Failed(err.into()),
        Some(Ok(Message::Close(frame))) => {
          debug!("protobuf: stream end from {}: {frame:?}", self.url);
          return StreamSignal::Ended;
        }
        Some(Ok(Message::Text(text))) => text,
        Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
          Ok(text) => text,
          Err(_) => return StreamSignal::Failed(StreamError::Decode(ledger::Error::InvalidData)),
        },
        // ping, pong and raw frames
        Some(Ok(_)) => continue,
      };

      return match InboundMessage::from_json(text) {
        Ok(message) => StreamSignal::Message(classify(message)),
        Err(err) => StreamSignal::Failed(err.into()),
      };
    }
  }

  /// Sends a Close frame. Errors are irrelevant at this point.
  pub async fn close(mut self) {
    let _ = self.outgoing.close().await;
  }
}
