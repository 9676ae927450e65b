//! Headless frontend for the print destination dialog
//!
//! Replays a JSON scenario against the in-memory registries and logs every UI
//! state transition and dialog signal to stderr. The final dialog snapshot is
//! printed to stdout as JSON.

mod scenario;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use print_destination_app::adapters::{InMemoryDestinationRegistry, InMemoryPrintServerRegistry};
use print_destination_app::{load_config, DialogApp, DialogAppBuilder};
use print_destination_core::types::DialogSignal;
use scenario::{Scenario, ScenarioRunner};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Replay a destination dialog scenario
#[derive(Parser)]
#[command(name = "print-destination-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Scenario file (JSON)
    scenario: PathBuf,
    /// Dialog configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_ansi(false),
        )
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Scenario failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let scenario = Scenario::load(&cli.scenario)?;
    tracing::info!(
        "Loaded scenario with {} step(s), min loading time {} ms",
        scenario.steps.len(),
        config.min_loading_time_ms
    );

    let registry = Arc::new(InMemoryDestinationRegistry::new());
    let servers = Arc::new(InMemoryPrintServerRegistry::new());
    scenario.seed(&registry, &servers).await;

    let app = DialogAppBuilder::new()
        .destination_registry(registry.clone())
        .print_server_registry(servers.clone())
        .config(config)
        .build()?;

    let observer = spawn_observer(&app);
    app.start().await?;

    let outcomes = ScenarioRunner::new(&app, &registry, &servers)
        .run(&scenario.steps)
        .await?;
    tracing::info!("Scenario finished, activation outcomes: {outcomes:?}");

    let snapshot = app.controller.snapshot();
    app.shutdown().await;
    observer.abort();

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// Log snapshot transitions and signals until aborted.
fn spawn_observer(app: &DialogApp) -> JoinHandle<()> {
    let mut snapshots = app.controller.watch_snapshot();
    let mut signals = app.controller.subscribe_signals();

    tokio::spawn(async move {
        let mut last_state = snapshots.borrow_and_update().ui_state;
        tracing::info!("UI state: {last_state:?}");
        loop {
            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = snapshots.borrow_and_update().clone();
                    if snapshot.ui_state != last_state {
                        tracing::info!("UI state: {last_state:?} -> {:?}", snapshot.ui_state);
                        last_state = snapshot.ui_state;
                    }
                    tracing::debug!(
                        "{} destination(s) rendered, loading: {}",
                        snapshot.destinations.len(),
                        snapshot.loading_any
                    );
                }
                signal = signals.recv() => match signal {
                    Ok(signal) => log_signal(&signal),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Dialog signals lagged, {skipped} skipped");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
    })
}

fn log_signal(signal: &DialogSignal) {
    match signal {
        DialogSignal::DestinationSelected(destination) => match &destination.capabilities {
            Some(caps) => tracing::info!(
                "Selected destination {} ({}), color: {}, duplex: {}",
                destination.id,
                destination.display_name,
                caps.has_color(),
                caps.has_duplex()
            ),
            None => tracing::info!(
                "Selected destination {} ({})",
                destination.id,
                destination.display_name
            ),
        },
        DialogSignal::PrinterStatusUpdated {
            destination_key,
            status,
        } if status.is_error() => {
            tracing::warn!("Printer error on {destination_key}: {:?}", status.reason);
        }
        DialogSignal::ShowErrorToast { message } => tracing::warn!("Error toast: {message}"),
        DialogSignal::ConfigurationFailed { destination_key } => {
            tracing::warn!("Configuration failed: {destination_key}");
        }
        other => tracing::info!("Signal: {other:?}"),
    }
}
