//! The on-disk build-info store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mason_common::ContentHash;
use mason_graph::{BuildInfo, BuildInfoWire, Node};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Name of the store file within the store directory.
const STORE_FILE: &str = "buildinfo.db";

/// Magic bytes identifying a Mason build-info store.
const STORE_MAGIC: [u8; 4] = *b"MASN";

/// Current store file format version. Increment on breaking changes to
/// the header or payload layout.
const STORE_FORMAT_VERSION: u32 = 1;

/// Header prepended to the store file for validation.
///
/// Contains magic bytes to identify the file, a format version for
/// compatibility checks, the tool version that wrote the file, and a
/// checksum of the payload to detect corruption.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreHeader {
    magic: [u8; 4],
    format_version: u32,
    tool_version: String,
    checksum: ContentHash,
}

/// Persistent store of build-info records, keyed by node identity.
///
/// The store defines only the persistence of records; record shape and the
/// version-check contract live in `mason_graph`. Per-record schema versions
/// are checked on [`get`](BuildInfoStore::get), so one store file can hold
/// records written by different schema versions.
pub struct BuildInfoStore {
    /// Directory holding the store file.
    dir: PathBuf,

    /// Tool version for whole-store compatibility checks.
    tool_version: String,

    /// Wire records, decoded lazily on lookup.
    records: BTreeMap<String, BuildInfoWire>,
}

impl BuildInfoStore {
    /// Loads an existing store or creates a fresh, empty one.
    ///
    /// Fail-safe: a missing file, bad magic, unknown format version,
    /// checksum mismatch, undecodable payload, or a different tool version
    /// all result in starting fresh, which makes every node stale.
    pub fn load_or_create(dir: &Path, tool_version: &str) -> Self {
        let records = read_records(&dir.join(STORE_FILE), tool_version).unwrap_or_default();
        tracing::debug!(
            dir = %dir.display(),
            records = records.len(),
            "build info store loaded"
        );
        Self {
            dir: dir.to_path_buf(),
            tool_version: tool_version.to_string(),
            records,
        }
    }

    /// Returns the record for the given node identity, if a usable one exists.
    ///
    /// The record's schema version is checked before any field is trusted.
    /// Records that cannot be decoded or migrated are treated as absent:
    /// the node has never been built.
    pub fn get(&self, name: &str) -> Option<BuildInfo> {
        let wire = self.records.get(name)?.clone();
        match BuildInfo::from_wire(wire) {
            Ok(info) => Some(info),
            Err(err) => {
                tracing::debug!(node = name, %err, "discarding unusable build info record");
                None
            }
        }
    }

    /// Stores a record for the given node identity.
    pub fn put(&mut self, name: &str, info: &BuildInfo) {
        self.records.insert(name.to_string(), info.to_wire());
    }

    /// Removes the record for the given node identity.
    pub fn remove(&mut self, name: &str) -> bool {
        self.records.remove(name).is_some()
    }

    /// Returns the number of persisted records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Installs the prior run's record into a node's info slot, if one exists.
    ///
    /// Must happen before the node's up-to-date decision is requested.
    pub fn hydrate(&self, node: &dyn Node) {
        if let Some(info) = self.get(node.name()) {
            node.core().set_previous_info(info);
        }
    }

    /// Computes a node's signature and stores a fresh record for it.
    pub fn record(&mut self, node: &dyn Node) -> Result<(), StoreError> {
        let csig = node.signature()?;
        self.put(node.name(), &BuildInfo::new(csig));
        Ok(())
    }

    /// Persists the store to disk, creating the directory if necessary.
    ///
    /// Layout: 4-byte little-endian header length, bincode-encoded header,
    /// then the JSON payload of records.
    pub fn save(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| StoreError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        let payload =
            serde_json::to_vec(&self.records).map_err(|e| StoreError::Serialization {
                reason: e.to_string(),
            })?;

        let header = StoreHeader {
            magic: STORE_MAGIC,
            format_version: STORE_FORMAT_VERSION,
            tool_version: self.tool_version.clone(),
            checksum: ContentHash::from_bytes(&payload),
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| StoreError::Serialization {
                reason: e.to_string(),
            })?;

        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(&payload);

        let path = self.dir.join(STORE_FILE);
        std::fs::write(&path, &output).map_err(|e| StoreError::Io { path, source: e })?;
        tracing::debug!(records = self.records.len(), "build info store saved");
        Ok(())
    }
}

/// Reads and validates the store file, returning `None` on any problem.
fn read_records(path: &Path, tool_version: &str) -> Option<BTreeMap<String, BuildInfoWire>> {
    let raw = std::fs::read(path).ok()?;

    // Need at least 4 bytes for the header length.
    if raw.len() < 4 {
        return None;
    }
    let header_len = u32::from_le_bytes(raw[..4].try_into().ok()?) as usize;
    if raw.len() < 4 + header_len {
        return None;
    }

    let header: StoreHeader =
        bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
            .ok()?
            .0;

    if header.magic != STORE_MAGIC {
        return None;
    }
    if header.format_version != STORE_FORMAT_VERSION {
        return None;
    }
    if header.tool_version != tool_version {
        tracing::debug!(
            stored = %header.tool_version,
            current = %tool_version,
            "tool version changed, discarding build info store"
        );
        return None;
    }

    let payload = &raw[4 + header_len..];
    if ContentHash::from_bytes(payload) != header.checksum {
        return None;
    }

    serde_json::from_slice(payload).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mason_common::Signature;
    use mason_graph::ValueNode;

    fn make_store() -> (tempfile::TempDir, BuildInfoStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = BuildInfoStore::load_or_create(dir.path(), "0.1.0");
        (dir, store)
    }

    #[test]
    fn fresh_store_is_empty() {
        let (_dir, store) = make_store();
        assert!(store.is_empty());
        assert!(store.get("anything").is_none());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();

        {
            let mut store = BuildInfoStore::load_or_create(dir.path(), "0.1.0");
            store.put("a", &BuildInfo::new(Signature::from_text("hello")));
            store.put("b", &BuildInfo::new(Signature::from_text("worldhello")));
            store.save().unwrap();
        }

        let store = BuildInfoStore::load_or_create(dir.path(), "0.1.0");
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a").unwrap().csig().as_str(), "hello");
        assert_eq!(store.get("b").unwrap().csig().as_str(), "worldhello");
    }

    #[test]
    fn tool_version_mismatch_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();

        {
            let mut store = BuildInfoStore::load_or_create(dir.path(), "0.1.0");
            store.put("a", &BuildInfo::new(Signature::from_text("hello")));
            store.save().unwrap();
        }

        let store = BuildInfoStore::load_or_create(dir.path(), "0.2.0");
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STORE_FILE), b"not a store file").unwrap();
        let store = BuildInfoStore::load_or_create(dir.path(), "0.1.0");
        assert!(store.is_empty());
    }

    #[test]
    fn truncated_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STORE_FILE), [1u8, 0]).unwrap();
        let store = BuildInfoStore::load_or_create(dir.path(), "0.1.0");
        assert!(store.is_empty());
    }

    #[test]
    fn tampered_payload_fails_checksum() {
        let dir = tempfile::tempdir().unwrap();

        {
            let mut store = BuildInfoStore::load_or_create(dir.path(), "0.1.0");
            store.put("a", &BuildInfo::new(Signature::from_text("hello")));
            store.save().unwrap();
        }

        // Flip "hello" to "jello" in the payload; still valid JSON, but the
        // checksum no longer matches.
        let path = dir.path().join(STORE_FILE);
        let mut raw = std::fs::read(&path).unwrap();
        let pos = raw
            .windows(5)
            .position(|w| w == b"hello")
            .expect("payload should contain the csig");
        raw[pos] = b'j';
        std::fs::write(&path, &raw).unwrap();

        let store = BuildInfoStore::load_or_create(dir.path(), "0.1.0");
        assert!(store.is_empty());
    }

    #[test]
    fn remove_drops_record() {
        let (_dir, mut store) = make_store();
        store.put("a", &BuildInfo::new(Signature::from_text("hello")));
        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        assert!(store.get("a").is_none());
    }

    #[test]
    fn legacy_record_in_store_is_migrated_on_get() {
        let (_dir, mut store) = make_store();
        store.records.insert(
            "old".to_string(),
            BuildInfoWire {
                version: 1,
                csig: None,
                fields: Some(
                    [("csig".to_string(), "hello".to_string())]
                        .into_iter()
                        .collect(),
                ),
            },
        );
        assert_eq!(store.get("old").unwrap().csig().as_str(), "hello");
    }

    #[test]
    fn unknown_record_version_reads_as_never_built() {
        let (_dir, mut store) = make_store();
        store.records.insert(
            "future".to_string(),
            BuildInfoWire {
                version: 9,
                csig: Some("hello".to_string()),
                fields: None,
            },
        );
        assert!(store.get("future").is_none());
    }

    #[test]
    fn record_and_hydrate_drive_the_up_to_date_decision() {
        let dir = tempfile::tempdir().unwrap();

        // First run: nothing persisted, so the node is stale. Build it and
        // record its signature.
        {
            let mut store = BuildInfoStore::load_or_create(dir.path(), "0.1.0");
            let a = ValueNode::new("hello");
            store.hydrate(&a);
            assert!(!a.is_up_to_date().unwrap());
            store.record(&a).unwrap();
            store.save().unwrap();
        }

        // Second run, unchanged contents: up to date.
        {
            let store = BuildInfoStore::load_or_create(dir.path(), "0.1.0");
            let a = ValueNode::new("hello");
            store.hydrate(&a);
            assert!(a.is_up_to_date().unwrap());
        }

        // Third run, changed contents: stale again.
        {
            let store = BuildInfoStore::load_or_create(dir.path(), "0.1.0");
            let a = ValueNode::named("HELLO", "hello");
            store.hydrate(&a);
            assert!(!a.is_up_to_date().unwrap());
        }
    }

    #[test]
    fn staleness_propagates_through_recorded_chain() {
        let dir = tempfile::tempdir().unwrap();

        {
            let mut store = BuildInfoStore::load_or_create(dir.path(), "0.1.0");
            let a = ValueNode::new("hello").shared();
            let b = ValueNode::new("world");
            b.core().add_source(a.clone());
            store.record(a.as_ref()).unwrap();
            store.record(&b).unwrap();
            assert_eq!(store.get("world").unwrap().csig().as_str(), "worldhello");
            store.save().unwrap();
        }

        // Rebuild the graph with a changed leaf: the parent's own contents
        // are untouched, but it is stale through its source.
        {
            let store = BuildInfoStore::load_or_create(dir.path(), "0.1.0");
            let a = ValueNode::named("HELLO", "hello").shared();
            let b = ValueNode::new("world");
            b.core().add_source(a.clone());
            store.hydrate(a.as_ref());
            store.hydrate(&b);
            assert!(!b.is_up_to_date().unwrap());
        }
    }
}
