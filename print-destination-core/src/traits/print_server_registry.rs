//! Print server registry abstract Trait

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::CoreResult;
use crate::types::{PrintServerEvent, PrintServersConfig};

/// Print Server Registry Trait
///
/// Owns the selectable print servers and the per-server loading state.
#[async_trait]
pub trait PrintServerRegistry: Send + Sync {
    /// Server names and fetch mode
    async fn config(&self) -> CoreResult<PrintServersConfig>;

    /// Subscribe to server-list and loading-state changes
    fn subscribe(&self) -> broadcast::Receiver<PrintServerEvent>;

    /// Fetch printers from the named server
    async fn choose_print_server(&self, server_name: &str) -> CoreResult<()>;
}
