//! 类型定义模块

mod capabilities;
mod config;
mod destination;
mod dialog;

pub use capabilities::{
    CapabilityOptions, DuplexMode, ManagedOption, ManagedPrintOptions, PrinterCapabilities,
};
pub use config::{DialogConfig, DEFAULT_EVENT_BUFFER_SIZE, DEFAULT_MIN_LOADING_TIME_MS};
pub use destination::{
    has_real_destination, Destination, DestinationOrigin, DestinationReadiness, PrinterStatus,
    PrinterStatusReason, PrinterStatusSeverity, SAVE_AS_PDF_ID, SAVE_TO_DRIVE_ID,
};
pub use dialog::{
    show_manage_printers_button, ActivationOutcome, DialogSignal, DialogSnapshot,
    PrintServerEvent, PrintServersConfig, PrinterSetupResponse, RegistryEvent, UiState,
    UiStateInputs,
};
