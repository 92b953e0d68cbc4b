//! Binary LD triplet files.
//!
//! Layout (little-endian, no header beyond the count):
//! `i64 numel`, `numel × i32` first endpoints, `numel × i32` second
//! endpoints, `numel × f32` r² values.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind as IoErrorKind, Read, Write};
use std::path::Path;

use tracing::info;

use super::coo::LdTriplets;
use super::error::{LdMatrixError, Result};

/// Read a triplet file.
pub fn read_ld_triplets<P: AsRef<Path>>(path: P) -> Result<LdTriplets> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);

    let mut header = [0u8; 8];
    read_payload(&mut reader, &mut header, path, 8)?;
    let numel = i64::from_le_bytes(header);
    if numel < 0 {
        return Err(LdMatrixError::InvalidElementCount {
            path: path.to_path_buf(),
            numel,
        });
    }
    let len = numel as usize;
    let expected = (numel as u64)
        .checked_mul(12)
        .ok_or_else(|| LdMatrixError::InvalidElementCount {
            path: path.to_path_buf(),
            numel,
        })?;
    // guard the allocation against a corrupt count
    let file_len = std::fs::metadata(path)?.len();
    if file_len < expected.saturating_add(8) {
        return Err(LdMatrixError::TruncatedFile {
            path: path.to_path_buf(),
            expected,
        });
    }
    info!(path = %path.display(), numel, "reading LD triplets");

    let mut buf = vec![0u8; len * 4];
    read_payload(&mut reader, &mut buf, path, expected)?;
    let snp_index = buf
        .chunks_exact(4)
        .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    read_payload(&mut reader, &mut buf, path, expected)?;
    let other_index = buf
        .chunks_exact(4)
        .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    read_payload(&mut reader, &mut buf, path, expected)?;
    let r2 = buf
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    LdTriplets::from_columns(snp_index, other_index, r2)
}

/// Write a triplet file.
pub fn write_ld_triplets<P: AsRef<Path>>(path: P, triplets: &LdTriplets) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&(triplets.len() as i64).to_le_bytes())?;
    for &v in triplets.snp_index() {
        writer.write_all(&v.to_le_bytes())?;
    }
    for &v in triplets.other_index() {
        writer.write_all(&v.to_le_bytes())?;
    }
    for &v in triplets.r2() {
        writer.write_all(&v.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

fn read_payload<R: Read>(reader: &mut R, buf: &mut [u8], path: &Path, expected: u64) -> Result<()> {
    reader.read_exact(buf).map_err(|err| match err.kind() {
        IoErrorKind::UnexpectedEof => LdMatrixError::TruncatedFile {
            path: path.to_path_buf(),
            expected,
        },
        _ => LdMatrixError::Io(err),
    })
}
