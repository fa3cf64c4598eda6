use std::net::SocketAddr;

use log::{debug, info};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

use crate::hub::communication_with_observer::hello::ObserverCommHello;

#[derive(Debug, Clone, PartialEq)]
pub enum ObserverMessage {
  Hello(Value),
  /// Anything else; logged and dropped
  NoOp,
}

/// Helper to parse what an observer sent. Only `hello` means something.
///
pub fn parse_message_received_from_observer(msg: &str) -> ObserverMessage {
  match ObserverCommHello::from_json(msg) {
    Ok(hello) => ObserverMessage::Hello(hello.payload),
    Err(_) => ObserverMessage::NoOp,
  }
}

pub fn on_observer_message(addr: SocketAddr, msg: &Message) {
  let text = match msg {
    Message::Text(text) => text.as_str(),
    Message::Binary(bytes) => match std::str::from_utf8(bytes) {
      Ok(text) => text,
      Err(_) => {
        debug!("[io] {addr} sent {} non UTF-8 bytes", bytes.len());
        return;
      }
    },
    _ => return,
  };

  match parse_message_received_from_observer(text) {
    ObserverMessage::Hello(payload) => info!("[io] client hello from {addr}: {payload}"),
    ObserverMessage::NoOp => debug!("[io] NO-OP from {addr}: {text:?}"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[cfg(test)]
  use pretty_assertions::assert_eq;
  use serde_json::json;

  #[test]
  fn parse_hello_message() {
    let result = parse_message_received_from_observer(r#"["hello","Hi relay!"]"#);

    assert_eq!(result, ObserverMessage::Hello(json!("Hi relay!")));
  }

  #[test]
  fn parse_noop_message() {
    assert_eq!(parse_message_received_from_observer("{}"), ObserverMessage::NoOp);
    assert_eq!(
      parse_message_received_from_observer(r#"["chainblock",{"block":{}}]"#),
      ObserverMessage::NoOp
    );
    assert_eq!(parse_message_received_from_observer("potato"), ObserverMessage::NoOp);
  }
}
