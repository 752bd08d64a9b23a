//! Forward-only archive entry scanning for ZIP and TAR+GZIP containers.

use crate::error::{IngestError, IngestResult};
use dialcenter_core::ArchiveFormat;
use flate2::read::GzDecoder;
use std::io::{Cursor, Read};

/// One entry yielded while scanning an archive.
///
/// An entry is valid only for the duration of the visitor call; its content
/// is read on demand and discarded once the visitor returns. Directories
/// carry no content.
pub struct ArchiveEntry<'a> {
    name: String,
    is_dir: bool,
    size: Option<u64>,
    reader: &'a mut dyn Read,
}

impl ArchiveEntry<'_> {
    /// Full path of the entry within the archive.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Declared content size, when the container records one.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Read the full entry content, looping on partial reads until the
    /// declared size is satisfied or, when unknown, until stream end.
    pub fn read_content(&mut self) -> IngestResult<Vec<u8>> {
        let mut content = Vec::new();
        self.reader
            .read_to_end(&mut content)
            .map_err(|e| IngestError::CorruptArchive(e.to_string()))?;
        Ok(content)
    }
}

/// Whether to keep scanning after visiting an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanControl {
    /// Visit the next entry.
    Continue,
    /// Stop the scan early.
    Stop,
}

/// Scan every entry of an in-memory archive, front to back.
///
/// The scan is single-pass and forward-only; there is no seeking or
/// re-reading of earlier entries. Extractions needing a second pass open a
/// fresh scan over the same byte buffer.
pub fn scan_entries<F>(bytes: &[u8], format: ArchiveFormat, mut visit: F) -> IngestResult<()>
where
    F: FnMut(&mut ArchiveEntry<'_>) -> IngestResult<ScanControl>,
{
    match format {
        ArchiveFormat::Zip => scan_zip(bytes, &mut visit),
        ArchiveFormat::TarGz => scan_tar_gz(bytes, &mut visit),
    }
}

fn scan_zip(
    bytes: &[u8],
    visit: &mut dyn FnMut(&mut ArchiveEntry<'_>) -> IngestResult<ScanControl>,
) -> IngestResult<()> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| IngestError::CorruptArchive(e.to_string()))?;

    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .map_err(|e| IngestError::CorruptArchive(e.to_string()))?;
        let mut entry = ArchiveEntry {
            name: file.name().to_string(),
            is_dir: file.is_dir(),
            size: Some(file.size()),
            reader: &mut file,
        };
        if visit(&mut entry)? == ScanControl::Stop {
            return Ok(());
        }
    }
    Ok(())
}

fn scan_tar_gz(
    bytes: &[u8],
    visit: &mut dyn FnMut(&mut ArchiveEntry<'_>) -> IngestResult<ScanControl>,
) -> IngestResult<()> {
    let decoder = GzDecoder::new(bytes);
    let mut archive = tar::Archive::new(decoder);
    let entries = archive
        .entries()
        .map_err(|e| IngestError::CorruptArchive(e.to_string()))?;

    for entry in entries {
        let mut file = entry.map_err(|e| IngestError::CorruptArchive(e.to_string()))?;
        let name = file
            .path()
            .map_err(|e| IngestError::CorruptArchive(e.to_string()))?
            .to_string_lossy()
            .into_owned();
        let is_dir = file.header().entry_type().is_dir();
        let size = file.header().size().ok();
        let mut entry = ArchiveEntry {
            name,
            is_dir,
            size,
            reader: &mut file,
        };
        if visit(&mut entry)? == ScanControl::Stop {
            return Ok(());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn build_zip(entries: &[(&str, Option<&[u8]>)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, content) in entries {
            match content {
                Some(bytes) => {
                    writer.start_file(*name, options).unwrap();
                    writer.write_all(bytes).unwrap();
                }
                None => {
                    writer.add_directory(*name, options).unwrap();
                }
            }
        }
        writer.finish().unwrap().into_inner()
    }

    fn build_tar_gz(entries: &[(&str, Option<&[u8]>)]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, content) in entries {
            match content {
                Some(bytes) => {
                    let mut header = tar::Header::new_gnu();
                    header.set_size(bytes.len() as u64);
                    header.set_mode(0o644);
                    header.set_cksum();
                    builder.append_data(&mut header, name, *bytes).unwrap();
                }
                None => {
                    let mut header = tar::Header::new_gnu();
                    header.set_entry_type(tar::EntryType::Directory);
                    header.set_size(0);
                    header.set_mode(0o755);
                    header.set_cksum();
                    builder.append_data(&mut header, name, &[][..]).unwrap();
                }
            }
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn collect_names(bytes: &[u8], format: ArchiveFormat) -> Vec<(String, bool)> {
        let mut names = Vec::new();
        scan_entries(bytes, format, |entry| {
            names.push((entry.name().to_string(), entry.is_dir()));
            Ok(ScanControl::Continue)
        })
        .unwrap();
        names
    }

    #[test]
    fn test_zip_scan_yields_entries_in_order() {
        let bytes = build_zip(&[
            ("cases.xlsx", Some(b"workbook".as_slice())),
            ("scripts/", None),
            ("scripts/TC001.py", Some(b"print()".as_slice())),
        ]);
        let names = collect_names(&bytes, ArchiveFormat::Zip);
        assert_eq!(
            names,
            vec![
                ("cases.xlsx".to_string(), false),
                ("scripts/".to_string(), true),
                ("scripts/TC001.py".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_tar_gz_scan_yields_entries_in_order() {
        let bytes = build_tar_gz(&[
            ("cases.xlsx", Some(b"workbook".as_slice())),
            ("scripts/TC001.py", Some(b"print()".as_slice())),
        ]);
        let names = collect_names(&bytes, ArchiveFormat::TarGz);
        assert_eq!(
            names,
            vec![
                ("cases.xlsx".to_string(), false),
                ("scripts/TC001.py".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_entry_content_roundtrip() {
        let bytes = build_zip(&[("cases.xlsx", Some(b"exact bytes".as_slice()))]);
        let mut content = None;
        scan_entries(&bytes, ArchiveFormat::Zip, |entry| {
            content = Some(entry.read_content()?);
            Ok(ScanControl::Stop)
        })
        .unwrap();
        assert_eq!(content.unwrap(), b"exact bytes");
    }

    #[test]
    fn test_stop_halts_scan() {
        let bytes = build_zip(&[
            ("a.txt", Some(b"a".as_slice())),
            ("b.txt", Some(b"b".as_slice())),
        ]);
        let mut visited = 0;
        scan_entries(&bytes, ArchiveFormat::Zip, |_| {
            visited += 1;
            Ok(ScanControl::Stop)
        })
        .unwrap();
        assert_eq!(visited, 1);
    }

    #[test]
    fn test_corrupt_zip_rejected() {
        let result = scan_entries(b"not a zip archive", ArchiveFormat::Zip, |_| {
            Ok(ScanControl::Continue)
        });
        assert!(matches!(result, Err(IngestError::CorruptArchive(_))));
    }

    #[test]
    fn test_corrupt_tar_gz_rejected() {
        let result = scan_entries(b"not gzip data", ArchiveFormat::TarGz, |_| {
            Ok(ScanControl::Continue)
        });
        assert!(matches!(result, Err(IngestError::CorruptArchive(_))));
    }

    #[test]
    fn test_truncated_tar_gz_rejected() {
        let mut bytes = build_tar_gz(&[("cases.xlsx", Some(b"workbook".as_slice()))]);
        bytes.truncate(bytes.len() / 2);
        let mut collected = Vec::new();
        let result = scan_entries(&bytes, ArchiveFormat::TarGz, |entry| {
            collected.push(entry.read_content()?);
            Ok(ScanControl::Continue)
        });
        assert!(result.is_err());
    }
}
