//! Print Destination Core Library
//!
//! Provides the printer-destination discovery and selection controller of a
//! print preview dialog, including:
//! - Loading-Timer Gate (minimum throbber display time)
//! - Destination Dialog Controller (UI state derivation, activation flows)
//! - Provisional Destination Resolver
//!
//! This library is designed to be platform-independent, abstracting the
//! destination and print server registries through traits.

pub mod error;
pub mod services;
pub mod traits;
pub mod types;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use services::{DestinationDialogController, DialogContext};
pub use traits::{DestinationRegistry, PrintServerRegistry, ProvisionalResolver};
