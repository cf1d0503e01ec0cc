use crate::core::InputError;
use crate::parser::grammar::{self, VendorGrammar};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported configuration dialects. Each one maps to exactly one [`VendorGrammar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Vendor {
    CiscoIos,
    Juniper,
}

impl Vendor {
    pub const ALL: [Vendor; 2] = [Vendor::CiscoIos, Vendor::Juniper];

    pub fn grammar(&self) -> &'static dyn VendorGrammar {
        match self {
            Self::CiscoIos => grammar::cisco_ios(),
            Self::Juniper => grammar::juniper(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CiscoIos => "cisco-ios",
            Self::Juniper => "juniper",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vendor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cisco" | "ios" | "cisco-ios" | "cisco_ios" => Ok(Self::CiscoIos),
            "juniper" | "junos" => Ok(Self::Juniper),
            other => Err(format!("unsupported vendor '{}'", other)),
        }
    }
}

/// Raw configuration as uploaded. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConfig {
    file_name: String,
    vendor: Vendor,
    text: String,
}

impl RawConfig {
    pub fn new(file_name: impl Into<String>, vendor: Vendor, text: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            vendor,
            text: text.into(),
        }
    }

    /// Builds a raw config from file bytes, rejecting content that is not UTF-8 text.
    pub fn from_bytes(
        file_name: impl Into<String>,
        vendor: Vendor,
        bytes: Vec<u8>,
    ) -> Result<Self, InputError> {
        let text = String::from_utf8(bytes)
            .map_err(|e| InputError::NotText(format!("invalid UTF-8 at byte {}", e.utf8_error().valid_up_to())))?;
        Ok(Self::new(file_name, vendor, text))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Rejects input the tokenizer must never see: empty, blank or binary content.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.text.is_empty() {
            return Err(InputError::Empty);
        }
        if self.text.trim().is_empty() {
            return Err(InputError::Blank);
        }
        if self.text.contains('\0') {
            return Err(InputError::NotText("contains NUL bytes".to_string()));
        }

        let total = self.text.chars().count();
        let control = self
            .text
            .chars()
            .filter(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t' | '\u{3}' | '\u{c}'))
            .count();
        if control * 10 > total {
            return Err(InputError::NotText(format!(
                "{} of {} characters are control characters",
                control, total
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_from_str() {
        assert_eq!("Cisco".parse::<Vendor>().unwrap(), Vendor::CiscoIos);
        assert_eq!("junos".parse::<Vendor>().unwrap(), Vendor::Juniper);
        assert!("mikrotik".parse::<Vendor>().is_err());
    }

    #[test]
    fn test_vendor_selects_matching_grammar() {
        for vendor in Vendor::ALL {
            assert_eq!(vendor.grammar().vendor(), vendor);
        }
    }

    #[test]
    fn test_validate_rejects_empty_and_blank() {
        let empty = RawConfig::new("a.cfg", Vendor::CiscoIos, "");
        assert_eq!(empty.validate(), Err(InputError::Empty));

        let blank = RawConfig::new("a.cfg", Vendor::CiscoIos, "  \n\t\n");
        assert_eq!(blank.validate(), Err(InputError::Blank));
    }

    #[test]
    fn test_validate_rejects_binary() {
        let binary = RawConfig::new("a.bin", Vendor::CiscoIos, "ab\0cd");
        assert!(matches!(binary.validate(), Err(InputError::NotText(_))));

        let bytes = vec![0xff, 0xfe, 0x00, 0x41];
        assert!(RawConfig::from_bytes("a.bin", Vendor::Juniper, bytes).is_err());
    }

    #[test]
    fn test_validate_accepts_config_text() {
        let raw = RawConfig::new("a.cfg", Vendor::CiscoIos, "hostname SW1\n!\n");
        assert!(raw.validate().is_ok());
    }
}
