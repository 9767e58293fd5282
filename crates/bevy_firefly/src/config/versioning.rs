#[derive(Clone, Copy, PartialEq, Eq)]
enum Change {
    Additive,
    Breaking,
}

// Released config formats, oldest first. The last entry is the format this crate writes.
const RELEASES: &[(&str, Change)] = &[
    ("1.0", Change::Additive),
    ("1.1", Change::Additive), // planet packs, part overrides
    ("2.0", Change::Breaking), // colors authored as SDRI tuples
    ("2.1", Change::Additive), // smoke emission multiplier
];

/// How a config's `firefly_version` relates to the format this crate reads.
#[derive(Debug, PartialEq, Eq)]
pub enum VersionStatus {
    /// Written in the current format.
    Current,
    /// Older, but only additive changes happened since. Loads as-is.
    Outdated {
        /// Version the config declares.
        found: String,
        /// Version it is upgraded to.
        current: &'static str,
    },
    /// Older, across a breaking format change. Refused.
    Incompatible {
        /// Version the config declares.
        found: String,
        /// Version this crate reads.
        current: &'static str,
    },
    /// Never released, likely written by a newer crate.
    Unknown,
}

fn release_index(version: &str) -> Option<usize> {
    RELEASES.iter().position(|(release, _)| *release == version)
}

/// Format version new configs are written with.
pub fn current_format_version() -> &'static str {
    RELEASES.last().map_or("", |(release, _)| release)
}

/// Whether a config written as `from` can be read as `to` without conversion.
///
/// Only forward moves qualify, and only when no release after `from` up to and
/// including `to` is breaking.
pub fn can_auto_upgrade(from: &str, to: &str) -> bool {
    match (release_index(from), release_index(to)) {
        (Some(from), Some(to)) if from < to => RELEASES[from + 1..=to]
            .iter()
            .all(|(_, change)| *change == Change::Additive),
        _ => false,
    }
}

/// Classifies a declared config version.
pub fn validate_version(version: &str) -> VersionStatus {
    let current = current_format_version();
    if version == current {
        return VersionStatus::Current;
    }
    if release_index(version).is_none() {
        return VersionStatus::Unknown;
    }

    let found = version.to_string();
    if can_auto_upgrade(version, current) {
        VersionStatus::Outdated { found, current }
    } else {
        VersionStatus::Incompatible { found, current }
    }
}
