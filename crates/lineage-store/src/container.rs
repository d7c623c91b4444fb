//! Container discovery
//!
//! Remote sources sometimes serve content packed in tar+gzip containers
//! instead of one file per key. A container is scanned entry by entry; only
//! the entry whose bytes reproduce the wanted key is kept.

use std::io::{Cursor, Read};

use bytes::Bytes;
use flate2::read::GzDecoder;
use lineage_core::HashKey;
use tar::Archive;
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::store::ContentStore;

/// Leading bytes of every gzip stream
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// True when `data` starts like a gzip stream
pub fn is_gzip(data: &[u8]) -> bool {
    data.starts_with(&GZIP_MAGIC)
}

/// Find the entry of a tar+gzip container whose bytes hash to `key`
///
/// Blocking; call from a blocking task. Keys whose algorithm cannot be
/// computed locally never match. Entries larger than `max_size` are skipped;
/// header sizes are never trusted for allocation.
pub fn find_in_container(
    key: &HashKey,
    container: &[u8],
    max_size: u64,
) -> Result<Option<Vec<u8>>, StoreError> {
    let algorithm = key.algorithm();
    if !algorithm.is_computable() {
        return Ok(None);
    }

    let mut archive = Archive::new(GzDecoder::new(Cursor::new(container)));
    let entries = archive
        .entries()
        .map_err(|e| StoreError::container(format!("failed to read archive: {}", e)))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| StoreError::container(format!("failed to read entry: {}", e)))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        if entry.size() > max_size {
            debug!(size = entry.size(), max = max_size, "Skipping oversized entry");
            continue;
        }

        let mut data = Vec::new();
        (&mut entry)
            .take(max_size.saturating_add(1))
            .read_to_end(&mut data)
            .map_err(|e| StoreError::container(format!("failed to read entry: {}", e)))?;
        if data.len() as u64 > max_size {
            continue;
        }

        if algorithm.compute(&data).as_ref() == Some(key) {
            return Ok(Some(data));
        }
    }

    Ok(None)
}

impl ContentStore {
    /// Scan a tar+gzip container for `key` and store the matching entry
    ///
    /// Returns the stored bytes, or `None` if no entry matches.
    #[instrument(skip(self, container), fields(key = %key.short_digest(), size = container.len()))]
    pub async fn put_from_container(
        &self,
        key: &HashKey,
        container: Bytes,
    ) -> Result<Option<Bytes>, StoreError> {
        let wanted = key.clone();
        let max_size = self.config().max_content_size;
        let found = tokio::task::spawn_blocking(move || {
            find_in_container(&wanted, &container, max_size)
        })
        .await??;

        match found {
            Some(data) => {
                self.put(key, &data).await?;
                debug!(size = data.len(), "Stored content found in container");
                Ok(Some(Bytes::from(data)))
            }
            None => {
                debug!("No matching entry in container");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreConfig;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::TempDir;

    const MAX: u64 = 1024;

    /// Build a tar+gzip container holding the given named files
    fn container(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn test_is_gzip() {
        assert!(is_gzip(&container(&[])));
        assert!(!is_gzip(b"plain text"));
        assert!(!is_gzip(&[]));
    }

    #[test]
    fn test_find_in_container() {
        let bundle = container(&[("a.txt", b"first".as_slice()), ("b.txt", b"second".as_slice())]);

        let key = HashKey::sha256(b"second");
        assert_eq!(
            find_in_container(&key, &bundle, MAX).unwrap(),
            Some(b"second".to_vec())
        );

        let missing = HashKey::sha256(b"third");
        assert_eq!(find_in_container(&missing, &bundle, MAX).unwrap(), None);
    }

    #[test]
    fn test_oversized_entries_are_skipped() {
        let bundle = container(&[("big", b"0123456789".as_slice()), ("small", b"ok".as_slice())]);

        let big = HashKey::sha256(b"0123456789");
        assert_eq!(find_in_container(&big, &bundle, 4).unwrap(), None);

        let small = HashKey::sha256(b"ok");
        assert_eq!(find_in_container(&small, &bundle, 4).unwrap(), Some(b"ok".to_vec()));
    }

    #[test]
    fn test_forged_header_size_does_not_allocate() {
        // Header claims 64 TiB, followed by a single zero block
        let mut header = tar::Header::new_gnu();
        header.set_path("huge").unwrap();
        header.set_size(1 << 46);
        header.set_mode(0o644);
        header.set_cksum();

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(header.as_bytes()).unwrap();
        encoder.write_all(&[0u8; 512]).unwrap();
        let bundle = encoder.finish().unwrap();

        // Truncated data surfaces as an error or a miss, never a match
        let key = HashKey::sha256(b"anything");
        let result = find_in_container(&key, &bundle, MAX);
        assert!(!matches!(result, Ok(Some(_))));
    }

    #[test]
    fn test_not_a_container() {
        let key = HashKey::sha256(b"x");
        assert!(find_in_container(&key, b"definitely not gzip", MAX).is_err());
    }

    #[tokio::test]
    async fn test_put_from_container() {
        let temp = TempDir::new().unwrap();
        let store = ContentStore::new(StoreConfig::with_data_dir(temp.path()))
            .await
            .unwrap();

        let bundle = container(&[("one", b"one".as_slice()), ("two", b"two".as_slice())]);
        let key = HashKey::sha256(b"two");

        let found = store
            .put_from_container(&key, Bytes::from(bundle))
            .await
            .unwrap();
        assert_eq!(found.as_deref(), Some(&b"two"[..]));
        assert!(store.contains(&key).await.unwrap());
        assert!(!store.contains(&HashKey::sha256(b"one")).await.unwrap());
    }
}
