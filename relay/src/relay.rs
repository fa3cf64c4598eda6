use std::io::Error as IoError;

use log::info;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use blockrelay_sdk::{
  config::{ConfigError, RelayConfig},
  hub::BroadcastHub,
  supervisor::{FixedDelay, RelaySupervisor, WebSocketConnector},
};

#[derive(thiserror::Error, Debug)]
pub enum MainError {
  #[error(transparent)]
  IoError(#[from] IoError),
  #[error(transparent)]
  ConfigError(#[from] ConfigError),
}

/// Wires the supervisor to the hub and runs both until the token fires.
pub async fn run_relay(
  config: RelayConfig,
  hub: BroadcastHub,
  listener: TcpListener,
  cancel: CancellationToken,
) {
  let supervisor = RelaySupervisor::with_backoff(
    config.ledger_endpoint.clone(),
    WebSocketConnector::new(config.stream_options()),
    FixedDelay(config.reconnect_delay),
  );

  let server = {
    let hub = hub.clone();
    let cancel = cancel.clone();
    tokio::spawn(async move { hub.serve(listener, cancel).await })
  };

  let tracker = {
    let hub = hub.clone();
    tokio::spawn(async move {
      supervisor
        .run(cancel, move |block| {
          hub.broadcast(&block);
        })
        .await
    })
  };

  let _ = tokio::join!(server, tracker);
}

#[tokio::main]
pub async fn initiate_relay() -> Result<(), MainError> {
  let config = RelayConfig::from_env()?;
  info!("Tracking block changes from {}", config.ledger_endpoint);

  let listener = TcpListener::bind(&config.hub_host).await?;
  info!("[io] Socket Started Listening on: {}", config.hub_host);

  let hub = BroadcastHub::new(config.hub_config());
  let cancel = CancellationToken::new();
  let relay = tokio::spawn(run_relay(config, hub.clone(), listener, cancel.clone()));

  tokio::signal::ctrl_c().await?;
  info!("Ctrl-C received, shutting down");

  // close all open connections with observers
  hub.close_all();
  cancel.cancel();
  let _ = relay.await;

  Ok(())
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use futures_util::StreamExt;
  use tokio::time;
  use tokio_tungstenite::{connect_async, tungstenite::Message};

  use super::*;

  #[cfg(test)]
  use pretty_assertions::assert_eq;

  #[tokio::test]
  async fn relay_stops_once_cancelled() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = RelayConfig {
      // nothing listens here: the supervisor keeps retrying
      ledger_endpoint: "127.0.0.1:9".to_string(),
      send_demo_block: false,
      reconnect_delay: Duration::from_millis(20),
      ..Default::default()
    };
    let hub = BroadcastHub::new(config.hub_config());
    let cancel = CancellationToken::new();
    let relay = tokio::spawn(run_relay(config, hub.clone(), listener, cancel.clone()));

    // observers are served even while the ledger is unreachable
    let (mut observer, _) = connect_async(format!("ws://{addr}/")).await.unwrap();
    let hello = time::timeout(Duration::from_secs(2), observer.next())
      .await
      .unwrap()
      .unwrap()
      .unwrap();
    assert_eq!(hello, Message::Text(r#"["hello","Hi user!"]"#.to_string()));
    assert_eq!(hub.observer_count(), 1);

    cancel.cancel();
    time::timeout(Duration::from_secs(2), relay).await.unwrap().unwrap();

    hub.close_all();
    let closing = time::timeout(Duration::from_secs(2), observer.next()).await.unwrap();
    assert!(matches!(closing, Some(Ok(Message::Close(_)))));
  }
}
