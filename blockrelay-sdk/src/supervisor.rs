//! Keeps one event stream alive per ledger endpoint.
//!
//! ```text
//! CONNECTING -> STREAMING -> (ENDED | FAILED) -> WAITING -> CONNECTING ...
//! ```
//!
//! A failed connection attempt goes straight from `CONNECTING` to `FAILED`.
//! There is no retry limit: the only way out of [`RelaySupervisor::run`] is
//! its cancellation token.

use std::{future::Future, time::Duration};

use log::{debug, info, warn};
use tokio::{sync::watch, time};
use tokio_util::sync::CancellationToken;

use crate::{
  event_stream::{Classified, EventStreamClient, StreamError, StreamOptions, StreamSignal},
  ledger::Block,
};

/// Source of classified messages for one connection attempt.
pub trait BlockSource: Send {
  fn next_signal(&mut self) -> impl Future<Output = StreamSignal> + Send;
}

/// Opens a fresh [`BlockSource`] against an endpoint.
pub trait Connector: Send + Sync {
  type Source: BlockSource;

  fn open(&self, endpoint: &str) -> impl Future<Output = Result<Self::Source, StreamError>> + Send;
}

/// How long to wait before reconnection attempt number `attempt` (0 based,
/// reset every time a stream is established).
pub trait Backoff: Send + Sync {
  fn delay(&self, attempt: u32) -> Duration;
}

/// Same delay for every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay(pub Duration);

impl Default for FixedDelay {
  fn default() -> Self {
    Self(Duration::from_secs(1))
  }
}

impl Backoff for FixedDelay {
  fn delay(&self, _attempt: u32) -> Duration {
    self.0
  }
}

impl BlockSource for EventStreamClient {
  fn next_signal(&mut self) -> impl Future<Output = StreamSignal> + Send {
    self.next()
  }
}

/// [`Connector`] speaking WebSocket to a real ledger node.
#[derive(Debug, Clone, Default)]
pub struct WebSocketConnector {
  options: StreamOptions,
}

impl WebSocketConnector {
  pub fn new(options: StreamOptions) -> Self {
    Self { options }
  }
}

impl Connector for WebSocketConnector {
  type Source = EventStreamClient;

  fn open(&self, endpoint: &str) -> impl Future<Output = Result<Self::Source, StreamError>> + Send {
    let endpoint = endpoint.to_string();
    let options = self.options.clone();
    async move { EventStreamClient::open(&endpoint, &options).await }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
  Connecting,
  Streaming,
  Ended,
  Failed,
  Waiting,
  /// `run` returned after cancellation
  Stopped,
}

enum StreamOutcome {
  Ended,
  Failed(StreamError),
  Cancelled,
}

pub struct RelaySupervisor<C, B = FixedDelay> {
  endpoint: String,
  connector: C,
  backoff: B,
  state: watch::Sender<SupervisorState>,
}

impl<C: Connector> RelaySupervisor<C, FixedDelay> {
  pub fn new(endpoint: impl Into<String>, connector: C) -> Self {
    Self::with_backoff(endpoint, connector, FixedDelay::default())
  }
}

impl<C: Connector, B: Backoff> RelaySupervisor<C, B> {
  pub fn with_backoff(endpoint: impl Into<String>, connector: C, backoff: B) -> Self {
    let (state, _) = watch::channel(SupervisorState::Connecting);
    Self {
      endpoint: endpoint.into(),
      connector,
      backoff,
      state,
    }
  }

  pub fn endpoint(&self) -> &str {
    &self.endpoint
  }

  /// Follows the state machine transitions.
  pub fn subscribe_state(&self) -> watch::Receiver<SupervisorState> {
    self.state.subscribe()
  }

  fn transition(&self, state: SupervisorState) {
    debug!("[supervisor] {}: {state:?}", self.endpoint);
    self.state.send_replace(state);
  }

  /// Streams blocks from the endpoint into `on_block`, reconnecting forever.
  /// Returns only once `cancel` is triggered.
  pub async fn run<F>(&self, cancel: CancellationToken, mut on_block: F)
  where
    F: FnMut(Block) + Send,
  {
    let mut attempt: u32 = 0;

    loop {
      self.transition(SupervisorState::Connecting);

      let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => break,
        opened = self.connector.open(&self.endpoint) => opened,
      };

      match opened {
        Ok(mut source) => {
          self.transition(SupervisorState::Streaming);
          attempt = 0;

          match self.stream(&mut source, &cancel, &mut on_block).await {
            StreamOutcome::Cancelled => break,
            StreamOutcome::Ended => {
              self.transition(SupervisorState::Ended);
              info!("protobuf: stream end: {}", self.endpoint);
            }
            StreamOutcome::Failed(err) => {
              self.transition(SupervisorState::Failed);
              warn!("protobuf: stream error from {}: {err}", self.endpoint);
            }
          }
        }
        Err(err) => {
          self.transition(SupervisorState::Failed);
          warn!("Impossible to connect to {}: {err}", self.endpoint);
        }
      }

      self.transition(SupervisorState::Waiting);
      let delay = self.backoff.delay(attempt);
      attempt = attempt.saturating_add(1);
      info!("Reconnecting to {} in {}ms", self.endpoint, delay.as_millis());

      tokio::select! {
        biased;
        _ = cancel.cancelled() => break,
        _ = time::sleep(delay) => {}
      }
    }

    self.transition(SupervisorState::Stopped);
    info!("[supervisor] {} stopped", self.endpoint);
  }

  async fn stream<F>(
    &self,
    source: &mut C::Source,
    cancel: &CancellationToken,
    on_block: &mut F,
  ) -> StreamOutcome
  where
    F: FnMut(Block) + Send,
  {
    loop {
      let signal = tokio::select! {
        biased;
        _ = cancel.cancelled() => return StreamOutcome::Cancelled,
        signal = source.next_signal() => signal,
      };

      match signal {
        StreamSignal::Message(Classified::Block { summary, block }) => {
          debug!("Forwarding block {summary}");
          on_block(block);
        }
        StreamSignal::Message(_) => {}
        StreamSignal::Ended => return StreamOutcome::Ended,
        StreamSignal::Failed(err) => return StreamOutcome::Failed(err),
      }
    }
  }
}
