//! Printer capability description and managed print option merge

use serde::{Deserialize, Serialize};

/// Duplex mode offered by a printer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DuplexMode {
    NoDuplex,
    LongEdge,
    ShortEdge,
}

/// A capability with a list of supported values and a default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityOptions<T> {
    pub options: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<T>,
}

impl<T> Default for CapabilityOptions<T> {
    fn default() -> Self {
        Self {
            options: Vec::new(),
            default: None,
        }
    }
}

impl<T: Clone + PartialEq> CapabilityOptions<T> {
    #[must_use]
    pub fn new(options: Vec<T>, default: Option<T>) -> Self {
        Self { options, default }
    }

    /// Apply a managed policy to this capability.
    ///
    /// `allowed` restricts the options, but never down to nothing: an empty
    /// intersection leaves the capability untouched. `default` only applies
    /// when the (possibly restricted) options contain it.
    fn apply_policy(&mut self, policy: &ManagedOption<T>) {
        if let Some(allowed) = &policy.allowed {
            let restricted: Vec<T> = self
                .options
                .iter()
                .filter(|o| allowed.contains(o))
                .cloned()
                .collect();
            if !restricted.is_empty() {
                self.options = restricted;
                if let Some(current) = &self.default {
                    if !self.options.contains(current) {
                        self.default = self.options.first().cloned();
                    }
                }
            }
        }

        if let Some(default) = &policy.default {
            if self.options.contains(default) {
                self.default = Some(default.clone());
            }
        }
    }
}

/// Resolved printer capabilities.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PrinterCapabilities {
    pub copies: bool,
    pub collate: bool,
    /// `true` = color, `false` = monochrome
    pub color: CapabilityOptions<bool>,
    pub duplex: CapabilityOptions<DuplexMode>,
    /// Media size names, e.g. `ISO_A4`
    pub media_size: CapabilityOptions<String>,
}

impl PrinterCapabilities {
    #[must_use]
    pub fn has_color(&self) -> bool {
        self.color.options.contains(&true)
    }

    #[must_use]
    pub fn has_duplex(&self) -> bool {
        self.duplex
            .options
            .iter()
            .any(|m| matches!(m, DuplexMode::LongEdge | DuplexMode::ShortEdge))
    }

    /// Merge administrator managed print options into these capabilities.
    pub fn apply_managed_print_options(&mut self, managed: &ManagedPrintOptions) {
        if let Some(policy) = &managed.color {
            self.color.apply_policy(policy);
        }
        if let Some(policy) = &managed.duplex {
            self.duplex.apply_policy(policy);
        }
        if let Some(policy) = &managed.media_size {
            self.media_size.apply_policy(policy);
        }
    }
}

/// Allowed and default values for one setting, set by policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedOption<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<T>,
}

/// Managed print options attached to a printer by the administrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedPrintOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ManagedOption<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplex: Option<ManagedOption<DuplexMode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_size: Option<ManagedOption<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps() -> PrinterCapabilities {
        PrinterCapabilities {
            copies: true,
            collate: true,
            color: CapabilityOptions::new(vec![true, false], Some(true)),
            duplex: CapabilityOptions::new(
                vec![DuplexMode::NoDuplex, DuplexMode::LongEdge],
                Some(DuplexMode::NoDuplex),
            ),
            media_size: CapabilityOptions::new(
                vec!["ISO_A4".to_string(), "NA_LETTER".to_string()],
                Some("NA_LETTER".to_string()),
            ),
        }
    }

    #[test]
    fn allowed_restricts_options_and_fixes_default() {
        let mut c = caps();
        c.apply_managed_print_options(&ManagedPrintOptions {
            color: Some(ManagedOption {
                allowed: Some(vec![false]),
                default: None,
            }),
            ..Default::default()
        });
        assert_eq!(c.color.options, vec![false]);
        assert_eq!(c.color.default, Some(false));
        assert!(!c.has_color());
    }

    #[test]
    fn empty_intersection_leaves_capability_untouched() {
        let mut c = caps();
        c.apply_managed_print_options(&ManagedPrintOptions {
            duplex: Some(ManagedOption {
                allowed: Some(vec![DuplexMode::ShortEdge]),
                default: None,
            }),
            ..Default::default()
        });
        assert_eq!(c.duplex, caps().duplex);
    }

    #[test]
    fn default_applies_only_when_supported() {
        let mut c = caps();
        c.apply_managed_print_options(&ManagedPrintOptions {
            media_size: Some(ManagedOption {
                allowed: None,
                default: Some("ISO_A4".to_string()),
            }),
            duplex: Some(ManagedOption {
                allowed: None,
                default: Some(DuplexMode::ShortEdge),
            }),
            ..Default::default()
        });
        assert_eq!(c.media_size.default.as_deref(), Some("ISO_A4"));
        assert_eq!(c.duplex.default, Some(DuplexMode::NoDuplex));
    }

    #[test]
    fn managed_duplex_policy_from_json() {
        let managed: ManagedPrintOptions = serde_json::from_str(
            r#"{"duplex": {"allowed": ["LONG_EDGE"]}, "color": {"default": false}}"#,
        )
        .unwrap();
        let duplex = managed.duplex.as_ref().unwrap();
        assert_eq!(duplex.allowed, Some(vec![DuplexMode::LongEdge]));
        assert_eq!(duplex.default, None);

        let mut c = caps();
        c.apply_managed_print_options(&managed);
        assert_eq!(c.duplex.options, vec![DuplexMode::LongEdge]);
        assert_eq!(c.duplex.default, Some(DuplexMode::LongEdge));
        assert_eq!(c.color.default, Some(false));
    }

    #[test]
    fn capabilities_without_default_from_json() {
        let c: PrinterCapabilities =
            serde_json::from_str(r#"{"duplex": {"options": ["NO_DUPLEX", "SHORT_EDGE"]}}"#)
                .unwrap();
        assert!(c.has_duplex());
        assert_eq!(c.duplex.default, None);
        assert!(!c.copies);
    }

    #[test]
    fn duplex_detection() {
        assert!(caps().has_duplex());
        assert!(!PrinterCapabilities::default().has_duplex());
    }
}
