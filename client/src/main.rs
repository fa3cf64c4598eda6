use std::env;

use client::observer::{HubFrame, Observer};
use env_logger::Env;
use log::{error, info};

#[tokio::main]
async fn main() {
  dotenv::dotenv().ok();
  env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

  let hub_url = env::var("HUB_URL").unwrap_or_else(|_| "ws://127.0.0.1:8156/".to_string());
  let observer = match Observer::new(&hub_url) {
    Ok(observer) => observer,
    Err(err) => {
      error!("{err}");
      std::process::exit(1);
    }
  };

  let watch = observer.run(|frame| match frame {
    HubFrame::Hello(payload) => info!("hello: {payload}"),
    HubFrame::Chainblock(block) => info!("chainblock: {}", block.summary()),
    HubFrame::Other(text) => info!("data: {text}"),
  });

  tokio::select! {
    result = watch => match result {
      Ok(()) => info!("Relay {hub_url} closed the connection"),
      Err(err) => error!("{err}"),
    },
    _ = tokio::signal::ctrl_c() => info!("Ctrl-C received, shutting down"),
  }
}
