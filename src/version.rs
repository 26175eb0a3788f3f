//! Snapshot version stamps
//!
//! Every artifact records the version of the host that produced it. The stamp
//! is an opaque string: equality decides whether an export can be skipped.
//! When both sides happen to be semantic versions the comparison is also
//! classified, which only feeds diagnostics.

use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

/// Stamp used when the host cannot report its version
pub const UNKNOWN_VERSION: &str = "unknown";

/// Field holding the stamp in snapshot metadata
pub const VERSION_FIELD: &str = "version";

/// Field name used by older snapshots
pub const LEGACY_VERSION_FIELD: &str = "hytaleVersion";

/// Version of the host that produced a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotVersion(String);

/// How the current version relates to a recorded one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionChange {
    Same,
    Upgrade,
    Downgrade,
    /// Different, but not comparable as semantic versions
    Changed,
}

impl SnapshotVersion {
    /// Resolve a best-effort host version; blank or missing becomes `unknown`
    pub fn resolve(reported: Option<&str>) -> Self {
        match reported.map(str::trim) {
            Some(version) if !version.is_empty() => Self(version.to_string()),
            _ => Self(UNKNOWN_VERSION.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_VERSION
    }

    /// Parse as a semantic version (a leading `v` is allowed)
    pub fn semver(&self) -> Option<Version> {
        let raw = self.0.strip_prefix('v').unwrap_or(&self.0);
        Version::parse(raw).ok()
    }

    /// Classify the move from `previous` to `self`
    pub fn change_from(&self, previous: &SnapshotVersion) -> VersionChange {
        if self == previous {
            return VersionChange::Same;
        }
        match (previous.semver(), self.semver()) {
            (Some(old), Some(new)) => match new.cmp(&old) {
                Ordering::Greater => VersionChange::Upgrade,
                Ordering::Less => VersionChange::Downgrade,
                Ordering::Equal => VersionChange::Changed,
            },
            _ => VersionChange::Changed,
        }
    }
}

impl fmt::Display for SnapshotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Version recorded in an existing metadata file.
///
/// Any failure (missing, unreadable, not JSON, no usable field) reads as no
/// prior version.
pub fn read_recorded(metadata_path: &Path) -> Option<SnapshotVersion> {
    if !metadata_path.is_file() {
        return None;
    }
    let raw = std::fs::read_to_string(metadata_path).ok()?;
    if raw.trim().is_empty() {
        return None;
    }
    let document: Value = serde_json::from_str(&raw).ok()?;
    [VERSION_FIELD, LEGACY_VERSION_FIELD]
        .iter()
        .filter_map(|field| document.get(field).and_then(Value::as_str))
        .find(|version| !version.trim().is_empty())
        .map(|version| SnapshotVersion(version.to_string()))
}
