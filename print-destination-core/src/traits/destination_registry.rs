//! Destination registry abstract Trait

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::CoreResult;
use crate::types::{Destination, PrinterSetupResponse, RegistryEvent};

/// Destination Registry Trait
///
/// Owns the authoritative list of known print destinations. The controller
/// only reads snapshots, asks for resolutions and reports the final pick.
#[async_trait]
pub trait DestinationRegistry: Send + Sync {
    /// Current destination snapshot, in registry order
    async fn destinations(&self) -> Vec<Destination>;

    /// Whether a discovery search is still running
    async fn is_search_in_progress(&self) -> bool;

    /// Subscribe to insertion / search-done / status events
    fn subscribe(&self) -> broadcast::Receiver<RegistryEvent>;

    /// Run local setup for a destination that needs configuration
    ///
    /// # Arguments
    /// * `destination` - Destination to configure
    async fn resolve_local(&self, destination: &Destination) -> CoreResult<PrinterSetupResponse>;

    /// Complete the extra handshake of a provisional destination
    async fn resolve_provisional(&self, destination: &Destination) -> CoreResult<Destination>;

    /// Store a destination whose capabilities were resolved, replacing the
    /// entry with the same key
    async fn update_destination(&self, destination: &Destination);

    /// Record the user's final choice
    async fn select(&self, destination: &Destination);

    /// Look up the EULA URL of a destination
    async fn fetch_eula_url(&self, destination_id: &str) -> CoreResult<String>;
}
