//! Versioned build-info records.
//!
//! A build-info record is the persisted snapshot of the information used to
//! decide staleness for one node: exactly the content signature computed
//! when the node was last built. Records carry a schema version id on the
//! wire so that old records can be migrated or discarded instead of being
//! misread.

use std::collections::BTreeMap;

use mason_common::Signature;
use serde::{Deserialize, Serialize};

use crate::error::InfoError;

/// The schema version written by this build.
///
/// Version 1 was the legacy free-form representation that stored every
/// attribute in one string map. Version 2 declares an explicit field list.
pub const CURRENT_VERSION: u32 = 2;

/// Wire version of the legacy free-form record shape.
const LEGACY_VERSION: u32 = 1;

/// The last-known build state for one node.
///
/// Holds exactly the content signature computed when the node was last
/// built. Equality, and therefore usefulness for the up-to-date decision,
/// is defined solely by the signature: no other bookkeeping participates.
/// The wire version id is consumed during decoding and never stored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    csig: Signature,
}

impl BuildInfo {
    /// Creates a record for a freshly computed signature.
    pub fn new(csig: Signature) -> Self {
        Self { csig }
    }

    /// Returns the recorded content signature.
    pub fn csig(&self) -> &Signature {
        &self.csig
    }

    /// Converts this record to its wire form, stamping the current version.
    pub fn to_wire(&self) -> BuildInfoWire {
        BuildInfoWire {
            version: CURRENT_VERSION,
            csig: Some(self.csig.as_str().to_string()),
            fields: None,
        }
    }

    /// Decodes a wire record, checking the version id before trusting any field.
    ///
    /// Current-version records must carry the typed `csig` field. Legacy v1
    /// records are migrated by extracting `csig` from their free-form field
    /// map. Records of any other version are rejected; callers treat them as
    /// if the node had never been built.
    pub fn from_wire(wire: BuildInfoWire) -> Result<Self, InfoError> {
        match wire.version {
            CURRENT_VERSION => {
                let csig = wire.csig.ok_or(InfoError::MissingField {
                    version: CURRENT_VERSION,
                    field: "csig",
                })?;
                Ok(Self::new(Signature::from_text(csig)))
            }
            LEGACY_VERSION => migrate_legacy(wire.fields.unwrap_or_default()),
            actual => Err(InfoError::VersionMismatch {
                expected: CURRENT_VERSION,
                actual,
            }),
        }
    }
}

/// Serialized form of a [`BuildInfo`] record.
///
/// The version id is a live field here and only here: decoding checks it,
/// then discards it. The `fields` map exists to absorb the legacy v1 shape,
/// which kept everything in one free-form mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildInfoWire {
    /// Schema version id of this record.
    pub version: u32,

    /// The content signature (declared field, v2 and later).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csig: Option<String>,

    /// Free-form attribute map (legacy v1 records only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

/// Migrates a legacy v1 free-form record into the typed shape.
fn migrate_legacy(fields: BTreeMap<String, String>) -> Result<BuildInfo, InfoError> {
    match fields.get("csig") {
        Some(csig) => Ok(BuildInfo::new(Signature::from_text(csig.clone()))),
        None => Err(InfoError::MissingField {
            version: LEGACY_VERSION,
            field: "csig",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_roundtrip_preserves_csig() {
        let info = BuildInfo::new(Signature::from_text("worldhello"));
        let wire = info.to_wire();
        assert_eq!(wire.version, CURRENT_VERSION);

        let back = BuildInfo::from_wire(wire).unwrap();
        assert_eq!(back, info);
        assert_eq!(back.csig().as_str(), "worldhello");
    }

    #[test]
    fn json_roundtrip() {
        let info = BuildInfo::new(Signature::from_text("hello"));
        let json = serde_json::to_string(&info.to_wire()).unwrap();
        // The version travels on the wire but is not a field of BuildInfo.
        assert!(json.contains("\"version\":2"));

        let wire: BuildInfoWire = serde_json::from_str(&json).unwrap();
        let back = BuildInfo::from_wire(wire).unwrap();
        assert_eq!(back.csig().as_str(), "hello");
    }

    #[test]
    fn equality_is_csig_only() {
        let a = BuildInfo::new(Signature::from_text("hello"));
        let b = BuildInfo::new(Signature::from_text("hello"));
        let c = BuildInfo::new(Signature::from_text("HELLO"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn current_version_requires_typed_csig() {
        let wire = BuildInfoWire {
            version: CURRENT_VERSION,
            csig: None,
            fields: None,
        };
        let err = BuildInfo::from_wire(wire).unwrap_err();
        assert_eq!(
            err,
            InfoError::MissingField {
                version: CURRENT_VERSION,
                field: "csig"
            }
        );
    }

    #[test]
    fn legacy_v1_is_migrated() {
        let json = r#"{"version":1,"fields":{"csig":"hello","timestamp":"1234"}}"#;
        let wire: BuildInfoWire = serde_json::from_str(json).unwrap();
        let info = BuildInfo::from_wire(wire).unwrap();
        assert_eq!(info.csig().as_str(), "hello");
    }

    #[test]
    fn legacy_v1_without_csig_is_rejected() {
        let json = r#"{"version":1,"fields":{"timestamp":"1234"}}"#;
        let wire: BuildInfoWire = serde_json::from_str(json).unwrap();
        let err = BuildInfo::from_wire(wire).unwrap_err();
        assert_eq!(
            err,
            InfoError::MissingField {
                version: 1,
                field: "csig"
            }
        );
    }

    #[test]
    fn unknown_version_is_rejected_before_fields_are_read() {
        // A v3 record with a plausible csig must still be rejected.
        let wire = BuildInfoWire {
            version: 3,
            csig: Some("hello".to_string()),
            fields: None,
        };
        let err = BuildInfo::from_wire(wire).unwrap_err();
        assert_eq!(
            err,
            InfoError::VersionMismatch {
                expected: CURRENT_VERSION,
                actual: 3
            }
        );
    }

    #[test]
    fn legacy_record_without_field_map_is_rejected() {
        let wire = BuildInfoWire {
            version: 1,
            csig: None,
            fields: None,
        };
        assert!(BuildInfo::from_wire(wire).is_err());
    }
}
