//! In-memory destination registry

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use print_destination_core::error::{CoreError, CoreResult};
use print_destination_core::traits::DestinationRegistry;
use print_destination_core::types::{
    Destination, PrinterSetupResponse, PrinterStatus, RegistryEvent,
};

const EVENT_CAPACITY: usize = 64;

/// In-memory destination registry
///
/// Holds destinations in insertion order (deduplicated by key) and answers
/// setup / handshake / EULA requests from pre-registered tables.
pub struct InMemoryDestinationRegistry {
    destinations: RwLock<Vec<Destination>>,
    search_in_progress: RwLock<bool>,
    events: broadcast::Sender<RegistryEvent>,
    setup_responses: RwLock<HashMap<String, PrinterSetupResponse>>,
    provisional_grants: RwLock<HashMap<String, Destination>>,
    eula_urls: RwLock<HashMap<String, String>>,
    selected: RwLock<Option<Destination>>,
}

impl InMemoryDestinationRegistry {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            destinations: RwLock::new(Vec::new()),
            search_in_progress: RwLock::new(false),
            events,
            setup_responses: RwLock::new(HashMap::new()),
            provisional_grants: RwLock::new(HashMap::new()),
            eula_urls: RwLock::new(HashMap::new()),
            selected: RwLock::new(None),
        }
    }

    /// Mark a discovery search as running.
    pub async fn start_search(&self) {
        *self.search_in_progress.write().await = true;
    }

    /// Insert destinations, replacing entries with the same key.
    ///
    /// Announces the insertion when anything changed.
    pub async fn insert(&self, destinations: Vec<Destination>) {
        let changed = {
            let mut store = self.destinations.write().await;
            let mut changed = false;
            for destination in destinations {
                match store.iter_mut().find(|d| d.key == destination.key) {
                    Some(existing) if *existing == destination => {}
                    Some(existing) => {
                        *existing = destination;
                        changed = true;
                    }
                    None => {
                        store.push(destination);
                        changed = true;
                    }
                }
            }
            changed
        };
        if changed {
            self.emit(RegistryEvent::DestinationsInserted);
        }
    }

    /// Finish the running search and announce it.
    pub async fn finish_search(&self) {
        *self.search_in_progress.write().await = false;
        self.emit(RegistryEvent::SearchDone);
    }

    /// Record a printer status and announce it.
    pub async fn update_status(&self, destination_key: &str, status: PrinterStatus) -> CoreResult<()> {
        {
            let mut store = self.destinations.write().await;
            let destination = store
                .iter_mut()
                .find(|d| d.key == destination_key)
                .ok_or_else(|| CoreError::DestinationNotFound(destination_key.to_string()))?;
            destination.status = Some(status.clone());
        }
        self.emit(RegistryEvent::PrinterStatusUpdated {
            destination_key: destination_key.to_string(),
            status,
        });
        Ok(())
    }

    /// Answer for `resolve_local` of the given destination id.
    pub async fn register_setup(&self, destination_id: &str, response: PrinterSetupResponse) {
        self.setup_responses
            .write()
            .await
            .insert(destination_id.to_string(), response);
    }

    /// Concrete destination handed out when the provisional one is resolved.
    pub async fn register_grant(&self, destination_id: &str, resolved: Destination) {
        self.provisional_grants
            .write()
            .await
            .insert(destination_id.to_string(), resolved);
    }

    pub async fn register_eula(&self, destination_id: &str, url: &str) {
        self.eula_urls
            .write()
            .await
            .insert(destination_id.to_string(), url.to_string());
    }

    /// The last destination passed to `select`
    pub async fn selected(&self) -> Option<Destination> {
        self.selected.read().await.clone()
    }

    fn emit(&self, event: RegistryEvent) {
        if self.events.send(event).is_err() {
            log::debug!("Registry event dropped: no subscribers");
        }
    }
}

impl Default for InMemoryDestinationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DestinationRegistry for InMemoryDestinationRegistry {
    async fn destinations(&self) -> Vec<Destination> {
        self.destinations.read().await.clone()
    }

    async fn is_search_in_progress(&self) -> bool {
        *self.search_in_progress.read().await
    }

    fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    async fn resolve_local(&self, destination: &Destination) -> CoreResult<PrinterSetupResponse> {
        self.setup_responses
            .read()
            .await
            .get(&destination.id)
            .cloned()
            .ok_or_else(|| CoreError::ConfigurationFailed {
                destination_id: destination.id.clone(),
                message: "no printer setup available".to_string(),
            })
    }

    async fn resolve_provisional(&self, destination: &Destination) -> CoreResult<Destination> {
        let resolved = self
            .provisional_grants
            .read()
            .await
            .get(&destination.id)
            .cloned()
            .ok_or_else(|| CoreError::ProvisionalResolutionFailed {
                destination_id: destination.id.clone(),
                message: "access not granted".to_string(),
            })?;

        {
            let mut store = self.destinations.write().await;
            store.retain(|d| d.key != destination.key && d.key != resolved.key);
            store.push(resolved.clone());
        }
        self.emit(RegistryEvent::DestinationsInserted);
        Ok(resolved)
    }

    async fn update_destination(&self, destination: &Destination) {
        let mut store = self.destinations.write().await;
        match store.iter_mut().find(|d| d.key == destination.key) {
            Some(existing) => *existing = destination.clone(),
            None => log::warn!("Cannot update unknown destination: {}", destination.key),
        }
    }

    async fn select(&self, destination: &Destination) {
        self.update_destination(destination).await;
        *self.selected.write().await = Some(destination.clone());
        log::info!("Registry selected destination: {}", destination.id);
    }

    async fn fetch_eula_url(&self, destination_id: &str) -> CoreResult<String> {
        self.eula_urls
            .read()
            .await
            .get(destination_id)
            .cloned()
            .ok_or_else(|| CoreError::EulaUnavailable(destination_id.to_string()))
    }
}
