//! Platform-agnostic bootstrap for the print destination dialog.
//!
//! Provides `DialogApp` (controller container), `DialogAppBuilder` (collaborator
//! injection) and `load_config` (dialog configuration from a JSON file).

pub mod adapters;

use std::path::Path;
use std::sync::Arc;

use print_destination_core::error::{CoreError, CoreResult};
use print_destination_core::services::{DestinationDialogController, DialogContext};
use print_destination_core::traits::{DestinationRegistry, PrintServerRegistry, ProvisionalResolver};
use print_destination_core::types::DialogConfig;

/// Platform-agnostic dialog state.
///
/// Every frontend constructs this once via `DialogAppBuilder`.
pub struct DialogApp {
    /// Collaborator context shared with the controller
    pub ctx: Arc<DialogContext>,
    /// Destination dialog controller
    pub controller: Arc<DestinationDialogController>,
}

impl DialogApp {
    /// Wire the registries and open the dialog.
    pub async fn start(&self) -> CoreResult<()> {
        self.controller.connect().await?;
        self.controller.show().await
    }

    /// Close the dialog and drop the registry subscriptions.
    pub async fn shutdown(&self) {
        self.controller.close().await;
        self.controller.disconnect().await;
    }

    #[must_use]
    pub fn config(&self) -> &DialogConfig {
        self.controller.config()
    }
}

/// Builder for constructing `DialogApp` with platform-specific collaborators.
///
/// # Required
/// - `destination_registry`
/// - `print_server_registry`
///
/// # Optional
/// - `provisional_resolver`: defaults to the destination registry's own handshake
/// - `config`: defaults to `DialogConfig::default()`
pub struct DialogAppBuilder {
    destination_registry: Option<Arc<dyn DestinationRegistry>>,
    print_server_registry: Option<Arc<dyn PrintServerRegistry>>,
    provisional_resolver: Option<Arc<dyn ProvisionalResolver>>,
    config: DialogConfig,
}

impl DialogAppBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            destination_registry: None,
            print_server_registry: None,
            provisional_resolver: None,
            config: DialogConfig::default(),
        }
    }

    #[must_use]
    pub fn destination_registry(mut self, registry: Arc<dyn DestinationRegistry>) -> Self {
        self.destination_registry = Some(registry);
        self
    }

    #[must_use]
    pub fn print_server_registry(mut self, registry: Arc<dyn PrintServerRegistry>) -> Self {
        self.print_server_registry = Some(registry);
        self
    }

    #[must_use]
    pub fn provisional_resolver(mut self, resolver: Arc<dyn ProvisionalResolver>) -> Self {
        self.provisional_resolver = Some(resolver);
        self
    }

    #[must_use]
    pub fn config(mut self, config: DialogConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the `DialogApp`.
    ///
    /// # Errors
    /// Returns `CoreError::ValidationError` if a required registry is missing
    /// or the configuration is invalid.
    pub fn build(self) -> CoreResult<DialogApp> {
        let destination_registry = self.destination_registry.ok_or_else(|| {
            CoreError::ValidationError("destination_registry is required".to_string())
        })?;
        let print_server_registry = self.print_server_registry.ok_or_else(|| {
            CoreError::ValidationError("print_server_registry is required".to_string())
        })?;
        self.config.validate()?;

        let ctx = Arc::new(match self.provisional_resolver {
            Some(resolver) => {
                DialogContext::new(destination_registry, print_server_registry, resolver)
            }
            None => DialogContext::with_registry_handshake(destination_registry, print_server_registry),
        });
        let controller = Arc::new(DestinationDialogController::new(
            Arc::clone(&ctx),
            self.config,
        ));

        Ok(DialogApp { ctx, controller })
    }
}

impl Default for DialogAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Load the dialog configuration.
///
/// `None` yields the defaults. Missing keys in the file fall back to their
/// defaults as well.
pub fn load_config(path: Option<&Path>) -> CoreResult<DialogConfig> {
    let Some(path) = path else {
        return Ok(DialogConfig::default());
    };

    let raw = std::fs::read_to_string(path).map_err(|e| {
        CoreError::ValidationError(format!("读取配置文件失败 {}: {e}", path.display()))
    })?;
    let config: DialogConfig = serde_json::from_str(&raw)?;
    config.validate()?;
    log::info!("Loaded dialog config from {}", path.display());
    Ok(config)
}
