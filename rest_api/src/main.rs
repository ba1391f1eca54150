// rest_api/src/main.rs

use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::oneshot;

use rest_api::config::load_config;
use rest_api::{forward_shutdown_signal, start_server};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = load_config(std::env::args().nth(1).map(PathBuf::from))?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(forward_shutdown_signal(tokio::signal::ctrl_c(), shutdown_tx));

    start_server(config, shutdown_rx).await
}
