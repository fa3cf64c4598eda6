//! Relay settings, read from the environment (and `.env` through `dotenv` in
//! the binaries).

use std::{env, time::Duration};

use crate::{event_stream::StreamOptions, hub::HubConfig};

pub const LEDGER_ENDPOINT: &str = "LEDGER_ENDPOINT";
pub const HUB_HOST: &str = "HUB_HOST";
pub const RECONNECT_DELAY_MS: &str = "RECONNECT_DELAY_MS";
pub const CONNECT_TIMEOUT_MS: &str = "CONNECT_TIMEOUT_MS";
pub const STREAM_IDLE_TIMEOUT_SECS: &str = "STREAM_IDLE_TIMEOUT_SECS";
pub const PING_INTERVAL_SECS: &str = "PING_INTERVAL_SECS";
pub const SEND_DEMO_BLOCK: &str = "SEND_DEMO_BLOCK";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
  #[error("invalid value `{value}` for {key}")]
  InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
  /// `host:port` of the ledger node's event stream
  pub ledger_endpoint: String,
  /// Address the observer hub listens on
  pub hub_host: String,
  pub reconnect_delay: Duration,
  pub connect_timeout: Duration,
  pub stream_idle_timeout: Option<Duration>,
  pub ping_interval: Duration,
  pub send_demo_block: bool,
}

impl Default for RelayConfig {
  fn default() -> Self {
    Self {
      ledger_endpoint: "localhost:7053".to_string(),
      hub_host: "0.0.0.0:8156".to_string(),
      reconnect_delay: Duration::from_millis(1000),
      connect_timeout: Duration::from_millis(5000),
      stream_idle_timeout: None,
      ping_interval: Duration::from_secs(20),
      send_demo_block: true,
    }
  }
}

impl RelayConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|key| env::var(key).ok())
  }

  /// Builds the config from any key/value source. Unset or blank keys keep
  /// their default.
  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
    let defaults = Self::default();

    let integer = |key: &'static str| -> Result<Option<u64>, ConfigError> {
      lookup(key)
        .map(|value| {
          value
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidValue { key, value })
        })
        .transpose()
    };

    let send_demo_block = match lookup(SEND_DEMO_BLOCK) {
      None => defaults.send_demo_block,
      Some(value) => parse_bool(&value).ok_or(ConfigError::InvalidValue {
        key: SEND_DEMO_BLOCK,
        value,
      })?,
    };

    let ping_interval = match integer(PING_INTERVAL_SECS)? {
      None => defaults.ping_interval,
      Some(0) => {
        return Err(ConfigError::InvalidValue {
          key: PING_INTERVAL_SECS,
          value: lookup(PING_INTERVAL_SECS).unwrap_or_default(),
        })
      }
      Some(secs) => Duration::from_secs(secs),
    };

    Ok(Self {
      ledger_endpoint: lookup(LEDGER_ENDPOINT).unwrap_or(defaults.ledger_endpoint),
      hub_host: lookup(HUB_HOST).unwrap_or(defaults.hub_host),
      reconnect_delay: integer(RECONNECT_DELAY_MS)?
        .map(Duration::from_millis)
        .unwrap_or(defaults.reconnect_delay),
      connect_timeout: integer(CONNECT_TIMEOUT_MS)?
        .map(Duration::from_millis)
        .unwrap_or(defaults.connect_timeout),
      stream_idle_timeout: integer(STREAM_IDLE_TIMEOUT_SECS)?.map(Duration::from_secs),
      ping_interval,
      send_demo_block,
    })
  }

  pub fn stream_options(&self) -> StreamOptions {
    StreamOptions {
      connect_timeout: self.connect_timeout,
      idle_timeout: self.stream_idle_timeout,
    }
  }

  pub fn hub_config(&self) -> HubConfig {
    HubConfig {
      send_demo_block: self.send_demo_block,
      ping_interval: self.ping_interval,
    }
  }
}

fn parse_bool(value: &str) -> Option<bool> {
  match value.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Some(true),
    "0" | "false" | "no" | "off" => Some(false),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;

  #[cfg(test)]
  use pretty_assertions::assert_eq;

  fn config_from(pairs: &[(&str, &str)]) -> Result<RelayConfig, ConfigError> {
    let vars: HashMap<String, String> = pairs
      .iter()
      .map(|(key, value)| (key.to_string(), value.to_string()))
      .collect();
    RelayConfig::from_lookup(|key| vars.get(key).cloned())
  }

  #[test]
  fn empty_environment_gives_defaults() {
    assert_eq!(config_from(&[]).unwrap(), RelayConfig::default());
  }

  #[test]
  fn reads_every_variable() {
    let config = config_from(&[
      (LEDGER_ENDPOINT, "peer0:7053"),
      (HUB_HOST, "127.0.0.1:9000"),
      (RECONNECT_DELAY_MS, "250"),
      (CONNECT_TIMEOUT_MS, "1500"),
      (STREAM_IDLE_TIMEOUT_SECS, "90"),
      (PING_INTERVAL_SECS, "5"),
      (SEND_DEMO_BLOCK, "false"),
    ])
    .unwrap();

    assert_eq!(
      config,
      RelayConfig {
        ledger_endpoint: "peer0:7053".to_string(),
        hub_host: "127.0.0.1:9000".to_string(),
        reconnect_delay: Duration::from_millis(250),
        connect_timeout: Duration::from_millis(1500),
        stream_idle_timeout: Some(Duration::from_secs(90)),
        ping_interval: Duration::from_secs(5),
        send_demo_block: false,
      }
    );
    assert_eq!(
      config.stream_options(),
      StreamOptions {
        connect_timeout: Duration::from_millis(1500),
        idle_timeout: Some(Duration::from_secs(90)),
      }
    );
    assert!(!config.hub_config().send_demo_block);
  }

  #[test]
  fn blank_values_keep_defaults() {
    let config = config_from(&[(LEDGER_ENDPOINT, "  "), (RECONNECT_DELAY_MS, "")]).unwrap();

    assert_eq!(config.ledger_endpoint, "localhost:7053");
    assert_eq!(config.reconnect_delay, Duration::from_secs(1));
  }

  #[test]
  fn invalid_values_are_reported() {
    assert_eq!(
      config_from(&[(RECONNECT_DELAY_MS, "soon")]),
      Err(ConfigError::InvalidValue {
        key: RECONNECT_DELAY_MS,
        value: "soon".to_string()
      })
    );
    assert!(config_from(&[(SEND_DEMO_BLOCK, "maybe")]).is_err());
  }

  #[test]
  fn zero_ping_interval_is_rejected() {
    assert_eq!(
      config_from(&[(PING_INTERVAL_SECS, "0")]),
      Err(ConfigError::InvalidValue {
        key: PING_INTERVAL_SECS,
        value: "0".to_string()
      })
    );
    assert_eq!(
      config_from(&[(PING_INTERVAL_SECS, "1")]).unwrap().ping_interval,
      Duration::from_secs(1)
    );
  }
}
