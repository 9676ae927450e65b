//! In-memory print server registry

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use print_destination_core::error::{CoreError, CoreResult};
use print_destination_core::traits::PrintServerRegistry;
use print_destination_core::types::{PrintServerEvent, PrintServersConfig};

const EVENT_CAPACITY: usize = 16;

/// In-memory print server registry
///
/// Choosing a server flips it into the loading state until
/// [`InMemoryPrintServerRegistry::set_loading`] clears it.
pub struct InMemoryPrintServerRegistry {
    config: RwLock<PrintServersConfig>,
    events: broadcast::Sender<PrintServerEvent>,
    chosen: RwLock<Vec<String>>,
}

impl InMemoryPrintServerRegistry {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config: RwLock::new(PrintServersConfig::default()),
            events,
            chosen: RwLock::new(Vec::new()),
        }
    }

    /// Replace the server list and announce it.
    pub async fn set_servers(&self, config: PrintServersConfig) {
        *self.config.write().await = config.clone();
        self.emit(PrintServerEvent::ServersChanged(config));
    }

    /// Report whether server printers are still being fetched.
    ///
    /// `choose_print_server` reports `true` itself; frontends report `false`
    /// once the fetch is over.
    pub fn set_loading(&self, loading: bool) {
        self.emit(PrintServerEvent::ServerPrintersLoading(loading));
    }

    /// Servers chosen so far, oldest first
    pub async fn chosen(&self) -> Vec<String> {
        self.chosen.read().await.clone()
    }

    fn emit(&self, event: PrintServerEvent) {
        if self.events.send(event).is_err() {
            log::debug!("Print server event dropped: no subscribers");
        }
    }
}

impl Default for InMemoryPrintServerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PrintServerRegistry for InMemoryPrintServerRegistry {
    async fn config(&self) -> CoreResult<PrintServersConfig> {
        Ok(self.config.read().await.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<PrintServerEvent> {
        self.events.subscribe()
    }

    async fn choose_print_server(&self, server_name: &str) -> CoreResult<()> {
        let known = self
            .config
            .read()
            .await
            .server_names
            .iter()
            .any(|name| name == server_name);
        if !known {
            return Err(CoreError::PrintServerError(format!(
                "unknown print server: {server_name}"
            )));
        }

        self.chosen.write().await.push(server_name.to_string());
        self.emit(PrintServerEvent::ServerPrintersLoading(true));
        Ok(())
    }
}
