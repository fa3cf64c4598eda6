use futures_util::{SinkExt, StreamExt};
use log::{debug, info};
use serde_json::Value;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use blockrelay_sdk::{
  hub::communication_with_observer::{chainblock::ObserverCommChainblock, hello::ObserverCommHello},
  ledger::Block,
};

#[derive(thiserror::Error, Debug)]
pub enum ObserverError {
  #[error("invalid relay url `{0}`")]
  InvalidUrl(String),
  #[error(transparent)]
  WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// What the relay can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubFrame {
  Hello(Value),
  Chainblock(Block),
  Other(String),
}

/// Helper to parse the frame into `hello` or `chainblock`.
///
pub fn parse_frame(text: &str) -> HubFrame {
  if let Ok(chainblock) = ObserverCommChainblock::from_json(text) {
    return HubFrame::Chainblock(chainblock.block);
  }

  if let Ok(hello) = ObserverCommHello::from_json(text) {
    return HubFrame::Hello(hello.payload);
  }

  HubFrame::Other(text.to_string())
}

#[derive(Debug, Clone)]
pub struct Observer {
  url: Url,
}

impl Observer {
  pub fn new(url: &str) -> Result<Self, ObserverError> {
    let parsed = Url::parse(url).map_err(|_| ObserverError::InvalidUrl(url.to_string()))?;
    match parsed.scheme() {
      "ws" | "wss" => Ok(Self { url: parsed }),
      _ => Err(ObserverError::InvalidUrl(url.to_string())),
    }
  }

  /// Connects, greets the relay and hands every frame to `on_frame` until
  /// the relay closes the connection.
  pub async fn run<F>(&self, mut on_frame: F) -> Result<(), ObserverError>
  where
    F: FnMut(HubFrame),
  {
    let (ws_stream, _) = connect_async(self.url.clone()).await?;
    info!("WebSocket handshake to {} has been successfully completed", self.url);

    let (mut outgoing, mut incoming) = ws_stream.split();
    let hello = ObserverCommHello::new_hello("Hi relay!").as_json();
    outgoing.send(Message::Text(hello)).await?;

    while let Some(msg) = incoming.next().await {
      match msg? {
        Message::Text(text) => on_frame(parse_frame(&text)),
        Message::Close(frame) => {
          debug!("Relay closed the connection: {frame:?}");
          break;
        }
        _ => {}
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;
  use blockrelay_sdk::{
    hub::{BroadcastHub, HubConfig},
    ledger::Bytes,
  };

  #[cfg(test)]
  use pretty_assertions::assert_eq;
  use serde_json::json;
  use tokio::{net::TcpListener, sync::mpsc::unbounded_channel, time};
  use tokio_util::sync::CancellationToken;

  #[test]
  fn parses_hub_frames() {
    assert_eq!(parse_frame(r#"["hello","Hi user!"]"#), HubFrame::Hello(json!("Hi user!")));
    assert_eq!(
      parse_frame(r#"["chainblock",{"block":{"stateHash":"QUJD"}}]"#),
      HubFrame::Chainblock(Block {
        state_hash: Bytes::from("ABC"),
        ..Default::default()
      })
    );
    assert_eq!(parse_frame("potato"), HubFrame::Other("potato".to_string()));
  }

  #[test]
  fn rejects_non_websocket_urls() {
    assert!(Observer::new("http://127.0.0.1:8156/").is_err());
    assert!(Observer::new("nonsense").is_err());
    assert!(Observer::new("ws://127.0.0.1:8156/").is_ok());
  }

  #[tokio::test]
  async fn observes_a_running_hub() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hub = BroadcastHub::new(HubConfig {
      send_demo_block: false,
      ..Default::default()
    });
    let cancel = CancellationToken::new();
    let serving = hub.clone();
    let serve_cancel = cancel.clone();
    tokio::spawn(async move { serving.serve(listener, serve_cancel).await });

    let observer = Observer::new(&format!("ws://{addr}/")).unwrap();
    let (frames_tx, mut frames_rx) = unbounded_channel();
    let watching = tokio::spawn(async move {
      observer
        .run(move |frame| {
          let _ = frames_tx.send(frame);
        })
        .await
    });

    let hello = time::timeout(Duration::from_secs(2), frames_rx.recv()).await.unwrap();
    assert_eq!(hello, Some(HubFrame::Hello(json!("Hi user!"))));

    let block = Block {
      state_hash: Bytes::from("ABC"),
      ..Default::default()
    };
    assert_eq!(hub.broadcast(&block), 1);
    let received = time::timeout(Duration::from_secs(2), frames_rx.recv()).await.unwrap();
    assert_eq!(received, Some(HubFrame::Chainblock(block)));

    hub.close_all();
    let finished = time::timeout(Duration::from_secs(2), watching).await.unwrap().unwrap();
    assert!(finished.is_ok());
    cancel.cancel();
  }
}
