//! Local fallback persistence.
//!
//! A directory of small framed JSON entries, one file per key. The cache
//! holds the last signed-in user (`app_user`) and the last library shown
//! (`app_books`) so a restart can show records before the first snapshot
//! arrives. There is no sync-back: the remote store stays authoritative.

use crate::error::{Result, StoreError};
use crate::types::{Identity, LibraryRecord};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key of the cached identity.
pub const USER_KEY: &str = "app_user";

/// Key of the cached library records.
pub const BOOKS_KEY: &str = "app_books";

/// Magic bytes for cache entries.
const ENTRY_MAGIC: &[u8; 4] = b"RDC\0";

/// Current entry format version.
const ENTRY_VERSION: u8 = 1;

/// Extension of entry files.
const ENTRY_EXT: &str = "entry";

/// Directory-backed key-value cache with exclusive access.
pub struct LocalCache {
    path: PathBuf,
    _lock_file: File,
}

impl LocalCache {
    /// Open (creating if needed) the cache at `path`.
    ///
    /// Fails with [`StoreError::Locked`] if another process holds it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        fs::create_dir_all(&path)?;

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join("LOCK"))?;
        lock_file.try_lock_exclusive().map_err(|_| StoreError::Locked)?;

        Ok(Self {
            path,
            _lock_file: lock_file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let entry_path = self.entry_path(key)?;
        let payload = serde_json::to_vec(value)?;

        let tmp_path = entry_path.with_extension("tmp");
        let mut file = File::create(&tmp_path)?;

        // Write header
        file.write_all(ENTRY_MAGIC)?;
        file.write_all(&[ENTRY_VERSION])?;

        // Write payload
        file.write_all(&(payload.len() as u64).to_le_bytes())?;
        file.write_all(&payload)?;

        // Write checksum
        file.write_all(&crc32fast::hash(&payload).to_le_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &entry_path)?;
        debug!(key, bytes = payload.len(), "cache entry written");
        Ok(())
    }

    /// Load the value under `key`, if any.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let entry_path = self.entry_path(key)?;
        if !entry_path.exists() {
            return Ok(None);
        }

        let mut bytes = Vec::new();
        File::open(&entry_path)?.read_to_end(&mut bytes)?;

        let payload = decode_entry(&bytes)?;
        serde_json::from_slice(payload)
            .map(Some)
            .map_err(|e| StoreError::Deserialization(e.to_string()))
    }

    /// Remove the entry under `key`. Missing entries are not an error.
    pub fn remove(&self, key: &str) -> Result<()> {
        let entry_path = self.entry_path(key)?;
        match fs::remove_file(entry_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_identity(&self, identity: Option<&Identity>) -> Result<()> {
        match identity {
            Some(identity) => self.put(USER_KEY, identity),
            None => self.remove(USER_KEY),
        }
    }

    pub fn load_identity(&self) -> Result<Option<Identity>> {
        self.get(USER_KEY)
    }

    pub fn save_records(&self, records: &[LibraryRecord]) -> Result<()> {
        self.put(BOOKS_KEY, &records)
    }

    pub fn load_records(&self) -> Result<Vec<LibraryRecord>> {
        Ok(self.get(BOOKS_KEY)?.unwrap_or_default())
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidOperation(format!(
                "invalid cache key: {key:?}"
            )));
        }
        Ok(self.path.join(format!("{key}.{ENTRY_EXT}")))
    }
}

/// Validate framing and checksum, returning the JSON payload.
fn decode_entry(bytes: &[u8]) -> Result<&[u8]> {
    const HEADER: usize = 4 + 1 + 8;

    if bytes.len() < HEADER + 4 {
        return Err(StoreError::Corruption("cache entry truncated".into()));
    }
    if &bytes[0..4] != ENTRY_MAGIC {
        return Err(StoreError::Corruption("invalid cache entry magic".into()));
    }
    if bytes[4] != ENTRY_VERSION {
        return Err(StoreError::Corruption(format!(
            "unsupported cache entry version {}",
            bytes[4]
        )));
    }

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&bytes[5..HEADER]);
    let len = usize::try_from(u64::from_le_bytes(len_bytes))
        .map_err(|_| StoreError::Corruption("cache entry length out of range".into()))?;

    if len != bytes.len() - HEADER - 4 {
        return Err(StoreError::Corruption("cache entry length mismatch".into()));
    }

    let payload = &bytes[HEADER..HEADER + len];
    let mut crc_bytes = [0u8; 4];
    crc_bytes.copy_from_slice(&bytes[HEADER + len..]);
    let expected = u32::from_le_bytes(crc_bytes);
    let got = crc32fast::hash(payload);
    if expected != got {
        return Err(StoreError::ChecksumMismatch { expected, got });
    }

    Ok(payload)
}
