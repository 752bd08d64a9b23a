//! Software package file-name parsing.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Installable package format accepted for upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageFormat {
    /// Android application package.
    Apk,
    /// iOS application archive.
    Ipa,
}

impl PackageFormat {
    /// The format tag as stored and reported.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apk => "apk",
            Self::Ipa => "ipa",
        }
    }

    /// Target platform implied by the format.
    pub fn platform(&self) -> &'static str {
        match self {
            Self::Apk => "android",
            Self::Ipa => "ios",
        }
    }

    /// File-name suffix for this format, including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Apk => ".apk",
            Self::Ipa => ".ipa",
        }
    }

    /// Detect the format from a file name's extension (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let lower = file_name.to_lowercase();
        if lower.ends_with(Self::Apk.extension()) {
            Some(Self::Apk)
        } else if lower.ends_with(Self::Ipa.extension()) {
            Some(Self::Ipa)
        } else {
            None
        }
    }
}

impl fmt::Display for PackageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated software package file name.
///
/// The full file name (extension included) is the package's logical name;
/// name uniqueness is enforced on it independently of the content digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageFileName {
    software_name: String,
    format: PackageFormat,
}

impl PackageFileName {
    /// Parse and validate a package file name.
    pub fn parse(file_name: &str) -> Result<Self> {
        let format = PackageFormat::from_file_name(file_name).ok_or_else(|| {
            Error::UnsupportedFormat(format!(
                "only APK and IPA format files are supported, got {file_name}"
            ))
        })?;
        Ok(Self {
            software_name: file_name.to_string(),
            format,
        })
    }

    /// The package's logical name (the full file name).
    pub fn software_name(&self) -> &str {
        &self.software_name
    }

    /// The package format.
    pub fn format(&self) -> PackageFormat {
        self.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_apk() {
        let parsed = PackageFileName::parse("dialer-3.2.apk").unwrap();
        assert_eq!(parsed.software_name(), "dialer-3.2.apk");
        assert_eq!(parsed.format(), PackageFormat::Apk);
        assert_eq!(parsed.format().platform(), "android");
    }

    #[test]
    fn test_parse_ipa_case_insensitive() {
        let parsed = PackageFileName::parse("Dialer.IPA").unwrap();
        assert_eq!(parsed.format(), PackageFormat::Ipa);
        assert_eq!(parsed.format().platform(), "ios");
    }

    #[test]
    fn test_unsupported_rejected() {
        assert!(matches!(
            PackageFileName::parse("dialer.exe"),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
