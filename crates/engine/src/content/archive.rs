use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::services::{ResourceStore, ServiceError};

use super::atomic_io::write_bytes_atomic;
use super::hashing::{sha256_bytes, to_hex_lower, SHA256_LEN};

const MAGIC: &[u8; 4] = b"RSCA";
pub const ARCHIVE_FORMAT_VERSION: u16 = 1;
const TABLE_ENTRY_LEN: usize = 10;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to read/write file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("archive at {path} has invalid format: {message}")]
    InvalidFormat { path: PathBuf, message: String },
}

/// Resource blobs addressed by their 16-bit id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceArchive {
    resources: BTreeMap<u16, Vec<u8>>,
}

impl ResourceArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous bytes when `resource_id` was already present.
    pub fn insert(&mut self, resource_id: u16, bytes: Vec<u8>) -> Option<Vec<u8>> {
        self.resources.insert(resource_id, bytes)
    }

    pub fn contains(&self, resource_id: u16) -> bool {
        self.resources.contains_key(&resource_id)
    }

    pub fn get(&self, resource_id: u16) -> Option<&[u8]> {
        self.resources.get(&resource_id).map(Vec::as_slice)
    }

    pub fn ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.resources.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Lowercase hex SHA-256 of the encoded payload section.
    pub fn payload_hash_hex(&self) -> String {
        let payload = self.resources.values().flatten().copied().collect::<Vec<_>>();
        to_hex_lower(&sha256_bytes(&payload))
    }
}

impl ResourceStore for ResourceArchive {
    fn fetch(&self, resource_id: u16) -> Result<Vec<u8>, ServiceError> {
        self.get(resource_id)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| ServiceError::new(format!("resource {resource_id} not in archive")))
    }
}

pub fn write_archive(path: &Path, archive: &ResourceArchive) -> Result<(), ArchiveError> {
    let bytes = encode_archive(archive, path)?;
    write_bytes_atomic(path, &bytes).map_err(|source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = %path.display(),
        resources = archive.len(),
        bytes = bytes.len(),
        "resource_archive_written"
    );
    Ok(())
}

pub fn read_archive(path: &Path) -> Result<ResourceArchive, ArchiveError> {
    let bytes = fs::read(path).map_err(|source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let archive = decode_archive(&bytes, path)?;
    debug!(
        path = %path.display(),
        resources = archive.len(),
        "resource_archive_read"
    );
    Ok(archive)
}

fn encode_archive(archive: &ResourceArchive, path: &Path) -> Result<Vec<u8>, ArchiveError> {
    let count = u32::try_from(archive.len())
        .map_err(|_| invalid_format(path, "too many resources for u32 count"))?;

    let mut table = Vec::<u8>::with_capacity(archive.len() * TABLE_ENTRY_LEN);
    let mut payload = Vec::<u8>::new();
    for (id, bytes) in &archive.resources {
        let offset = u32::try_from(payload.len())
            .map_err(|_| invalid_format(path, "payload exceeds u32 offsets"))?;
        let len = u32::try_from(bytes.len())
            .map_err(|_| invalid_format(path, "resource exceeds u32 length"))?;
        table.extend_from_slice(&id.to_le_bytes());
        table.extend_from_slice(&offset.to_le_bytes());
        table.extend_from_slice(&len.to_le_bytes());
        payload.extend_from_slice(bytes);
    }
    let payload_len = u32::try_from(payload.len())
        .map_err(|_| invalid_format(path, "payload exceeds u32 length"))?;

    let mut out = Vec::<u8>::with_capacity(46 + table.len() + payload.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&ARCHIVE_FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&table);
    out.extend_from_slice(&payload_len.to_le_bytes());
    out.extend_from_slice(&sha256_bytes(&payload));
    out.extend_from_slice(&payload);
    Ok(out)
}

fn decode_archive(bytes: &[u8], path: &Path) -> Result<ResourceArchive, ArchiveError> {
    let mut cursor = 0usize;

    let magic = read_exact(bytes, &mut cursor, MAGIC.len(), path)?;
    if magic != MAGIC {
        return Err(invalid_format(path, "invalid magic"));
    }
    let version = read_u16(bytes, &mut cursor, path)?;
    if version != ARCHIVE_FORMAT_VERSION {
        return Err(invalid_format(
            path,
            &format!("unsupported format version {version}"),
        ));
    }

    let count = read_u32(bytes, &mut cursor, path)? as usize;
    let table_len = count
        .checked_mul(TABLE_ENTRY_LEN)
        .ok_or_else(|| invalid_format(path, "entry count overflows table size"))?;
    let table = read_exact(bytes, &mut cursor, table_len, path)?;
    let payload_len = read_u32(bytes, &mut cursor, path)? as usize;
    let expected_hash = read_exact(bytes, &mut cursor, SHA256_LEN, path)?;
    let payload = read_exact(bytes, &mut cursor, payload_len, path)?;
    if cursor != bytes.len() {
        return Err(invalid_format(path, "unexpected trailing bytes"));
    }
    if expected_hash != sha256_bytes(payload) {
        return Err(invalid_format(path, "payload hash mismatch"));
    }

    let mut archive = ResourceArchive::new();
    let mut table_cursor = 0usize;
    for _ in 0..count {
        let id = read_u16(table, &mut table_cursor, path)?;
        let offset = read_u32(table, &mut table_cursor, path)? as usize;
        let len = read_u32(table, &mut table_cursor, path)? as usize;
        let mut data_cursor = offset;
        let data = read_exact(payload, &mut data_cursor, len, path)
            .map_err(|_| invalid_format(path, &format!("resource {id} lies outside the payload")))?;
        if archive.insert(id, data.to_vec()).is_some() {
            return Err(invalid_format(path, &format!("duplicate resource id {id}")));
        }
    }
    Ok(archive)
}

fn read_u16(bytes: &[u8], cursor: &mut usize, path: &Path) -> Result<u16, ArchiveError> {
    Ok(u16::from_le_bytes(
        read_exact(bytes, cursor, 2, path)?
            .try_into()
            .map_err(|_| invalid_format(path, "invalid u16 encoding"))?,
    ))
}

fn read_u32(bytes: &[u8], cursor: &mut usize, path: &Path) -> Result<u32, ArchiveError> {
    Ok(u32::from_le_bytes(
        read_exact(bytes, cursor, 4, path)?
            .try_into()
            .map_err(|_| invalid_format(path, "invalid u32 encoding"))?,
    ))
}

fn read_exact<'a>(
    bytes: &'a [u8],
    cursor: &mut usize,
    len: usize,
    path: &Path,
) -> Result<&'a [u8], ArchiveError> {
    let end = cursor.saturating_add(len);
    if end > bytes.len() {
        return Err(invalid_format(path, "unexpected end of file"));
    }
    let out = &bytes[*cursor..end];
    *cursor = end;
    Ok(out)
}

fn invalid_format(path: &Path, message: &str) -> ArchiveError {
    ArchiveError::InvalidFormat {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}
