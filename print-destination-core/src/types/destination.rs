//! 打印目标相关类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PrinterCapabilities;

/// Id of the synthetic "Save as PDF" destination.
pub const SAVE_AS_PDF_ID: &str = "Save as PDF";

/// Id of the synthetic "Save to Drive" destination.
pub const SAVE_TO_DRIVE_ID: &str = "Save to Drive CrOS";

/// Where a destination was discovered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DestinationOrigin {
    /// Printer attached to the local print system
    Local,
    /// ChromeOS CUPS printer
    Cros,
    /// Printer exposed by an extension
    Extension,
    /// Zero-config network printer
    Privet,
    /// Synthetic target (PDF, cloud drive)
    Virtual,
}

/// How a destination can be turned into a selection.
///
/// A destination is exactly one of these; the enum makes the
/// "ready and provisional are mutually exclusive" rule unrepresentable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DestinationReadiness {
    /// Capabilities are known, selectable right away
    Ready,
    /// Needs an extra handshake before it becomes concrete
    Provisional,
    /// Needs local setup (capability fetch) before selection
    NeedsConfiguration,
}

/// Printer status reason reported by the backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PrinterStatusReason {
    NoError,
    DeviceError,
    DoorOpen,
    LowOnInk,
    LowOnPaper,
    OutOfInk,
    OutOfPaper,
    PaperJam,
    PrinterQueueFull,
    PrinterUnreachable,
    Stopped,
    Unknown,
}

/// Severity attached to a printer status reason.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PrinterStatusSeverity {
    Unknown,
    Report,
    Warning,
    Error,
}

/// Latest status known for a printer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PrinterStatus {
    pub reason: PrinterStatusReason,
    pub severity: PrinterStatusSeverity,
    pub updated_at: DateTime<Utc>,
}

impl PrinterStatus {
    #[must_use]
    pub fn new(reason: PrinterStatusReason, severity: PrinterStatusSeverity) -> Self {
        Self {
            reason,
            severity,
            updated_at: Utc::now(),
        }
    }

    /// Whether the status should be rendered as an error badge.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.reason != PrinterStatusReason::NoError
            && self.severity == PrinterStatusSeverity::Error
    }
}

/// 打印目标
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    /// Stable identity
    pub id: String,
    /// Dedup/display key (usually `origin/id`)
    pub key: String,
    /// Name shown in the list
    pub display_name: String,
    pub origin: DestinationOrigin,
    pub readiness: DestinationReadiness,
    /// Set once resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<PrinterCapabilities>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PrinterStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eula_url: Option<String>,
}

impl Destination {
    /// Build a destination with a key derived from origin and id.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        origin: DestinationOrigin,
        readiness: DestinationReadiness,
    ) -> Self {
        let id = id.into();
        let key = Self::make_key(origin, &id);
        Self {
            id,
            key,
            display_name: display_name.into(),
            origin,
            readiness,
            capabilities: None,
            status: None,
            eula_url: None,
        }
    }

    /// The synthetic "Save as PDF" target.
    #[must_use]
    pub fn save_as_pdf() -> Self {
        Self::new(
            SAVE_AS_PDF_ID,
            "Save as PDF",
            DestinationOrigin::Virtual,
            DestinationReadiness::Ready,
        )
    }

    /// The synthetic "Save to Drive" target.
    #[must_use]
    pub fn save_to_drive() -> Self {
        Self::new(
            SAVE_TO_DRIVE_ID,
            "Save to Google Drive",
            DestinationOrigin::Virtual,
            DestinationReadiness::Ready,
        )
    }

    fn make_key(origin: DestinationOrigin, id: &str) -> String {
        let origin = match origin {
            DestinationOrigin::Local => "local",
            DestinationOrigin::Cros => "chrome_os",
            DestinationOrigin::Extension => "extension",
            DestinationOrigin::Privet => "privet",
            DestinationOrigin::Virtual => "virtual",
        };
        format!("{origin}/{id}")
    }

    #[must_use]
    pub fn ready_for_selection(&self) -> bool {
        self.readiness == DestinationReadiness::Ready
    }

    #[must_use]
    pub fn is_provisional(&self) -> bool {
        self.readiness == DestinationReadiness::Provisional
    }

    #[must_use]
    pub fn needs_configuration(&self) -> bool {
        self.readiness == DestinationReadiness::NeedsConfiguration
    }

    /// "Save as PDF" / "Save to Drive" entries never count as real printers.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.id == SAVE_AS_PDF_ID || self.id == SAVE_TO_DRIVE_ID
    }

    /// Case-insensitive match against name, id and key.
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        [&self.display_name, &self.id, &self.key]
            .iter()
            .any(|field| field.to_lowercase().contains(&query))
    }

    /// Attach resolved capabilities; the destination becomes directly selectable.
    pub fn attach_capabilities(&mut self, capabilities: PrinterCapabilities) {
        self.capabilities = Some(capabilities);
        self.readiness = DestinationReadiness::Ready;
    }
}

/// True iff at least one non-virtual destination is present.
#[must_use]
pub fn has_real_destination(destinations: &[Destination]) -> bool {
    destinations.iter().any(|d| !d.is_virtual())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cros(id: &str) -> Destination {
        Destination::new(
            id,
            id,
            DestinationOrigin::Cros,
            DestinationReadiness::NeedsConfiguration,
        )
    }

    #[test]
    fn virtual_destinations_do_not_count() {
        assert!(!has_real_destination(&[Destination::save_as_pdf()]));
        assert!(!has_real_destination(&[
            Destination::save_as_pdf(),
            Destination::save_to_drive()
        ]));
        assert!(!has_real_destination(&[]));
    }

    #[test]
    fn one_real_destination_counts() {
        assert!(has_real_destination(&[
            Destination::save_as_pdf(),
            cros("office")
        ]));
    }

    #[test]
    fn readiness_accessors_are_exclusive() {
        let d = cros("a");
        assert!(d.needs_configuration());
        assert!(!d.ready_for_selection());
        assert!(!d.is_provisional());
    }

    #[test]
    fn attach_capabilities_makes_ready() {
        let mut d = cros("a");
        d.attach_capabilities(PrinterCapabilities::default());
        assert!(d.ready_for_selection());
        assert!(d.capabilities.is_some());
    }

    #[test]
    fn key_is_derived_from_origin() {
        assert_eq!(cros("office").key, "chrome_os/office");
        assert_eq!(Destination::save_as_pdf().key, "virtual/Save as PDF");
    }

    #[test]
    fn query_matches_case_insensitively() {
        let mut d = cros("hp-123");
        d.display_name = "Office LaserJet".to_string();
        assert!(d.matches_query("laser"));
        assert!(d.matches_query("HP-1"));
        assert!(d.matches_query("  "));
        assert!(!d.matches_query("canon"));
    }

    #[test]
    fn status_error_badge() {
        let status = PrinterStatus::new(PrinterStatusReason::PaperJam, PrinterStatusSeverity::Error);
        assert!(status.is_error());
        let ok = PrinterStatus::new(PrinterStatusReason::NoError, PrinterStatusSeverity::Error);
        assert!(!ok.is_error());
    }
}
