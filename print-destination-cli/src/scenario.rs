//! Scenario files and their replay against the in-memory adapters.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use print_destination_app::adapters::{InMemoryDestinationRegistry, InMemoryPrintServerRegistry};
use print_destination_app::DialogApp;
use print_destination_core::types::{
    ActivationOutcome, Destination, PrintServersConfig, PrinterSetupResponse, PrinterStatus,
    PrinterStatusReason, PrinterStatusSeverity,
};

/// A recorded discovery session.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scenario {
    /// Destinations known before the dialog opens
    pub destinations: Vec<Destination>,
    pub search_in_progress: bool,
    pub print_servers: PrintServersConfig,
    /// Setup answers keyed by destination id
    pub setups: HashMap<String, PrinterSetupResponse>,
    /// Provisional grants keyed by destination id
    pub grants: HashMap<String, Destination>,
    pub eulas: HashMap<String, String>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Step {
    Insert { destinations: Vec<Destination> },
    SearchDone,
    #[serde(rename_all = "camelCase")]
    ServerLoading { loading: bool },
    ChooseServer { name: String },
    #[serde(rename_all = "camelCase")]
    StatusUpdate {
        destination_key: String,
        reason: PrinterStatusReason,
        severity: PrinterStatusSeverity,
    },
    /// Click a row of the rendered list
    #[serde(rename_all = "camelCase")]
    Activate { destination_id: String },
    Search { query: Option<String> },
    Wait { ms: u64 },
    Close,
    Show,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse scenario {}", path.display()))
    }

    /// Seed the registries with everything known before the dialog opens.
    pub async fn seed(
        &self,
        registry: &InMemoryDestinationRegistry,
        servers: &InMemoryPrintServerRegistry,
    ) {
        if self.search_in_progress {
            registry.start_search().await;
        }
        registry.insert(self.destinations.clone()).await;
        for (id, response) in &self.setups {
            registry.register_setup(id, response.clone()).await;
        }
        for (id, resolved) in &self.grants {
            registry.register_grant(id, resolved.clone()).await;
        }
        for (id, url) in &self.eulas {
            registry.register_eula(id, url).await;
        }
        servers.set_servers(self.print_servers.clone()).await;
    }
}

/// Replays scenario steps one after another.
pub struct ScenarioRunner<'a> {
    app: &'a DialogApp,
    registry: &'a InMemoryDestinationRegistry,
    servers: &'a InMemoryPrintServerRegistry,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(
        app: &'a DialogApp,
        registry: &'a InMemoryDestinationRegistry,
        servers: &'a InMemoryPrintServerRegistry,
    ) -> Self {
        Self {
            app,
            registry,
            servers,
        }
    }

    /// Run all steps, returning the activation outcomes in order.
    pub async fn run(&self, steps: &[Step]) -> Result<Vec<ActivationOutcome>> {
        let mut outcomes = Vec::new();
        for (index, step) in steps.iter().enumerate() {
            tracing::debug!("Step {}: {step:?}", index + 1);
            if let Some(outcome) = self
                .apply(step)
                .await
                .with_context(|| format!("step {} failed", index + 1))?
            {
                outcomes.push(outcome);
            }
        }
        Ok(outcomes)
    }

    async fn apply(&self, step: &Step) -> Result<Option<ActivationOutcome>> {
        let controller = &self.app.controller;
        match step {
            Step::Insert { destinations } => self.registry.insert(destinations.clone()).await,
            Step::SearchDone => self.registry.finish_search().await,
            Step::ServerLoading { loading } => self.servers.set_loading(*loading),
            Step::ChooseServer { name } => controller.choose_print_server(name).await?,
            Step::StatusUpdate {
                destination_key,
                reason,
                severity,
            } => {
                self.registry
                    .update_status(destination_key, PrinterStatus::new(*reason, *severity))
                    .await?;
            }
            Step::Activate { destination_id } => {
                let destination = controller
                    .snapshot()
                    .destinations
                    .into_iter()
                    .find(|d| d.id == *destination_id)
                    .ok_or_else(|| anyhow!("{destination_id} is not in the rendered list"))?;
                let outcome = controller.activate(&destination).await;
                tracing::info!("Activated {destination_id}: {outcome:?}");
                return Ok(Some(outcome));
            }
            Step::Search { query } => controller.set_search_query(query.clone()).await,
            Step::Wait { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
            Step::Close => controller.close().await,
            Step::Show => controller.show().await?,
        }
        // Give the event pump a turn before the next step
        tokio::task::yield_now().await;
        Ok(None)
    }
}
