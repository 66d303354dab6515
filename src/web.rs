#![cfg(not(tarpaulin_include))]

use presences::app;
use presences::config::Config;
use std::env;

/// Main entry point for the web application
///
/// Settings come from the `PRESENCES_*` environment variables; an optional
/// first argument overrides the listen address.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = Config::from_env();
    if let Some(addr) = env::args().nth(1) {
        config.server_addr = addr;
    }

    app::run(config).await
}
