//! Interactive sweets shop client.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io;
use std::sync::Arc;

use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use sweets_client::inbound::{Flow, Shell};
use sweets_client::outbound::{ConsoleNotifier, HistoryLocation};
use sweets_client::{App, ClientSettings};

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ClientSettings::load().map_err(|err| eyre!("failed to load settings: {err}"))?;
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(run(settings))
}

async fn run(settings: ClientSettings) -> Result<()> {
    let app = App::from_settings(
        &settings,
        &DefaultEnv::new(),
        Arc::new(HistoryLocation::default()),
        Arc::new(ConsoleNotifier::stdout()),
    )
    .wrap_err("failed to start the client")?;
    info!("client started");

    let mut shell = Shell::new(app, io::stdout());
    shell.start().await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        shell.prompt()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if shell.execute(&line).await? == Flow::Quit {
            break;
        }
    }
    info!("client stopped");
    Ok(())
}
