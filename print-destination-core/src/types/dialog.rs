//! 目标选择对话框状态、事件与信号

use serde::{Deserialize, Serialize};

use super::{Destination, ManagedPrintOptions, PrinterCapabilities, PrinterStatus};

/// What the destination dialog body shows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiState {
    /// Loading spinner
    Throbber,
    /// The list of discovered destinations
    DestinationList,
    /// Nothing found, offer printer setup help
    PrinterSetupAssistance,
}

/// Inputs of the UI state derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiStateInputs {
    pub min_loading_time_elapsed: bool,
    pub has_real_destination: bool,
    /// Registry search running or any print server still loading printers
    pub loading_any: bool,
}

impl UiStateInputs {
    /// Derive the UI state. First matching rule wins:
    ///
    /// 1. loading gate not elapsed -> `Throbber`
    /// 2. a real destination exists -> `DestinationList`
    /// 3. anything still loading -> `Throbber`
    /// 4. otherwise -> `PrinterSetupAssistance`
    #[must_use]
    pub fn derive(self) -> UiState {
        if !self.min_loading_time_elapsed {
            UiState::Throbber
        } else if self.has_real_destination {
            UiState::DestinationList
        } else if self.loading_any {
            UiState::Throbber
        } else {
            UiState::PrinterSetupAssistance
        }
    }
}

/// `showManagePrintersButton` as a function of the capability and the state.
#[must_use]
pub fn show_manage_printers_button(capability: bool, state: UiState) -> bool {
    capability && state != UiState::PrinterSetupAssistance
}

/// Print server configuration reported by the print server registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PrintServersConfig {
    pub server_names: Vec<String>,
    pub is_single_server_mode: bool,
}

/// Events emitted by the destination registry.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryEvent {
    DestinationsInserted,
    SearchDone,
    PrinterStatusUpdated {
        destination_key: String,
        status: PrinterStatus,
    },
}

/// Events emitted by the print server registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintServerEvent {
    ServersChanged(PrintServersConfig),
    ServerPrintersLoading(bool),
}

/// Result of a local printer setup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PrinterSetupResponse {
    pub capabilities: PrinterCapabilities,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_print_options: Option<ManagedPrintOptions>,
}

/// Observable view state published on every recomputation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogSnapshot {
    pub ui_state: UiState,
    pub show_manage_printers_button: bool,
    /// Rendered list: virtual entries excluded, search filter applied
    pub destinations: Vec<Destination>,
    pub loading_any: bool,
    pub search_query: Option<String>,
    pub print_servers: PrintServersConfig,
}

impl Default for DialogSnapshot {
    fn default() -> Self {
        Self {
            ui_state: UiState::Throbber,
            show_manage_printers_button: false,
            destinations: Vec::new(),
            loading_any: false,
            search_query: None,
            print_servers: PrintServersConfig::default(),
        }
    }
}

/// One-shot notifications for the dialog shell.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogSignal {
    /// The user's pick is final; the dialog should close
    DestinationSelected(Destination),
    Closed,
    ConfigurationStarted { destination_key: String },
    ConfigurationSucceeded { destination_key: String },
    ConfigurationFailed { destination_key: String },
    PrinterStatusUpdated {
        destination_key: String,
        status: PrinterStatus,
    },
    /// Give keyboard focus back to a list row
    RestoreFocus { destination_key: String },
    ShowErrorToast { message: String },
    EulaUrlResolved { destination_id: String, url: String },
    ManagePrintersRequested,
}

/// What happened when the user activated a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    Selected,
    /// Another configuration flow holds the slot
    Ignored,
    ConfigurationFailed,
    ProvisionalFailed,
    /// Finished after the dialog closed; nothing was selected
    Discarded,
}
