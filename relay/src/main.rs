use env_logger::Env;
use log::error;
use relay::relay;

fn main() {
  dotenv::dotenv().ok();
  env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
  if let Err(err) = relay::initiate_relay() {
    error!("Error while running the relay: {err}");
    std::process::exit(1);
  }
}
