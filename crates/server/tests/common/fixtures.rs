//! Archive fixtures for integration tests.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::{Cursor, Write};

/// Manifest workbook with three valid cases (TC001, TC002, and the numeric
/// 1003) plus two rows the parser drops.
#[allow(dead_code)]
pub const MANIFEST: &[u8] = include_bytes!("../fixtures/cases.xlsx");

/// Build a ZIP archive from (entry name, content) pairs.
#[allow(dead_code)]
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Build a gzip-compressed TAR archive from (entry name, content) pairs.
#[allow(dead_code)]
pub fn build_tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *content).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}
