//! avs-langsetup - deck language setup for Anki Voice
//!
//! Examples:
//!   avs-langsetup --deck "Spanish 1" --front-lang es-ES --back-lang en-US
//!   avs-langsetup --deck "Spanish 1" --front-lang es-ES --back-lang en-GB --tag-notes
//!   avs-langsetup --deck "Spanish 1" --remove-note-tags
//!   avs-langsetup --deck "Spanish 1" --front-lang es-ES --back-lang en-US --dry-run

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use avs_common::anki::AnkiConnectClient;
use avs_common::config::AnkiConfig;
use avs_langsetup::{run, Args, SetupPlan};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let plan = SetupPlan::from_args(&args)?;

    let defaults = AnkiConfig::default();
    let client = AnkiConnectClient::new(
        args.connect_url.clone(),
        Duration::from_millis(defaults.data_timeout_ms),
        Duration::from_millis(defaults.gui_timeout_ms),
    )
    .context("Failed to create AnkiConnect client")?;

    run(&client, &plan, &mut std::io::stdout())
        .await
        .with_context(|| format!("Deck language setup failed for '{}'", plan.deck))?;
    Ok(())
}
