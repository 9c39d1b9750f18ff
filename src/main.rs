//! `relaybot` — standalone binary entry point.

use anyhow::Context;
use clap::Parser;

use relaybot::config::Config;
use relaybot::lifecycle::Lifecycle;
use relaybot::logging::{self, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    logging::init(&config.log_level, LogFormat::parse(&config.log_format))
        .context("failed to initialize logging")?;

    let lifecycle = Lifecycle::build(config)
        .await
        .context("failed to start relaybot")?;

    lifecycle.run().await.context("relaybot exited with an error")?;

    Ok(())
}
