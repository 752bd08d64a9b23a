//! Upload file-name parsing and payload validation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Archive container format accepted for case-set uploads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchiveFormat {
    /// ZIP container.
    #[serde(rename = "zip")]
    Zip,
    /// Gzip-compressed TAR container.
    #[serde(rename = "tar.gz")]
    TarGz,
}

impl ArchiveFormat {
    /// The format tag as stored and reported.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
        }
    }

    /// File-name suffix for this format, including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Zip => ".zip",
            Self::TarGz => ".tar.gz",
        }
    }

    /// Parse a format tag ("zip" or "tar.gz", case-insensitive).
    pub fn parse(tag: &str) -> Result<Self> {
        if tag.eq_ignore_ascii_case("zip") {
            Ok(Self::Zip)
        } else if tag.eq_ignore_ascii_case("tar.gz") {
            Ok(Self::TarGz)
        } else {
            Err(Error::UnsupportedFormat(tag.to_string()))
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed case-set upload file name.
///
/// Case-set files are named `<name>_<version>.<ext>` where `<ext>` is `.zip`
/// or `.tar.gz`. The logical name and version split on the last underscore
/// before the extension: `a_b_v2.zip` parses as name `a_b`, version `v2`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFileName {
    name: String,
    version: String,
    format: ArchiveFormat,
}

impl UploadFileName {
    /// Parse an upload file name into its logical name, version, and format.
    pub fn parse(file_name: &str) -> Result<Self> {
        let lower = file_name.to_lowercase();
        let (stem, format) = if lower.ends_with(ArchiveFormat::TarGz.extension()) {
            (
                &file_name[..file_name.len() - ArchiveFormat::TarGz.extension().len()],
                ArchiveFormat::TarGz,
            )
        } else if lower.ends_with(ArchiveFormat::Zip.extension()) {
            (
                &file_name[..file_name.len() - ArchiveFormat::Zip.extension().len()],
                ArchiveFormat::Zip,
            )
        } else {
            return Err(Error::UnsupportedFormat(format!(
                "only ZIP and TAR.GZ uploads are supported, got {file_name}"
            )));
        };

        let sep = stem.rfind('_').ok_or_else(|| {
            Error::InvalidFileName(format!(
                "expected <name>_<version>{}, got {file_name}",
                format.extension()
            ))
        })?;

        let name = &stem[..sep];
        let version = &stem[sep + 1..];
        if name.is_empty() || version.is_empty() {
            return Err(Error::InvalidFileName(format!(
                "name and version must be non-empty in {file_name}"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            version: version.to_string(),
            format,
        })
    }

    /// The logical case-set name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The case-set version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The archive container format.
    pub fn format(&self) -> ArchiveFormat {
        self.format
    }
}

impl fmt::Display for UploadFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}{}",
            self.name,
            self.version,
            self.format.extension()
        )
    }
}

/// Validate an upload payload size against a configured ceiling.
///
/// These are the cheap checks that run strictly before any archive parsing:
/// empty payloads and payloads over the ceiling are rejected outright.
pub fn check_payload_size(size: u64, max: u64) -> Result<()> {
    if size == 0 {
        return Err(Error::EmptyUpload);
    }
    if size > max {
        return Err(Error::UploadTooLarge { size, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_zip() {
        let parsed = UploadFileName::parse("caseset_v1.0.zip").unwrap();
        assert_eq!(parsed.name(), "caseset");
        assert_eq!(parsed.version(), "v1.0");
        assert_eq!(parsed.format(), ArchiveFormat::Zip);
    }

    #[test]
    fn test_parse_tar_gz() {
        let parsed = UploadFileName::parse("voice_tests_2.1.tar.gz").unwrap();
        assert_eq!(parsed.name(), "voice_tests");
        assert_eq!(parsed.version(), "2.1");
        assert_eq!(parsed.format(), ArchiveFormat::TarGz);
    }

    #[test]
    fn test_last_underscore_wins() {
        let parsed = UploadFileName::parse("a_b_v2.zip").unwrap();
        assert_eq!(parsed.name(), "a_b");
        assert_eq!(parsed.version(), "v2");
    }

    #[test]
    fn test_extension_case_insensitive() {
        let parsed = UploadFileName::parse("Caseset_V1.ZIP").unwrap();
        assert_eq!(parsed.name(), "Caseset");
        assert_eq!(parsed.version(), "V1");
        assert_eq!(parsed.format(), ArchiveFormat::Zip);
    }

    #[test]
    fn test_missing_version_rejected() {
        assert!(matches!(
            UploadFileName::parse("noversion.zip"),
            Err(Error::InvalidFileName(_))
        ));
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        assert!(matches!(
            UploadFileName::parse("caseset_v1.rar"),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_empty_name_or_version_rejected() {
        assert!(UploadFileName::parse("_v1.zip").is_err());
        assert!(UploadFileName::parse("caseset_.zip").is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        let parsed = UploadFileName::parse("caseset_v1.0.zip").unwrap();
        assert_eq!(parsed.to_string(), "caseset_v1.0.zip");
    }

    #[test]
    fn test_format_tag_parse() {
        assert_eq!(ArchiveFormat::parse("zip").unwrap(), ArchiveFormat::Zip);
        assert_eq!(
            ArchiveFormat::parse("TAR.GZ").unwrap(),
            ArchiveFormat::TarGz
        );
        assert!(ArchiveFormat::parse("7z").is_err());
    }

    #[test]
    fn test_check_payload_size() {
        assert!(matches!(check_payload_size(0, 100), Err(Error::EmptyUpload)));
        assert!(matches!(
            check_payload_size(101, 100),
            Err(Error::UploadTooLarge { size: 101, max: 100 })
        ));
        assert!(check_payload_size(100, 100).is_ok());
    }
}
