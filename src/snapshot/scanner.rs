use super::{Lsn, SnapshotDescriptor};
use crate::error::ScanError;
use std::fs;
use std::io;
use std::path::Path;

const SNAP_SUFFIX: &str = ".snap";
const MAX_HEX_DIGITS: usize = 8;

/// Parse a `<hi>-<lo>.snap` file name into the position it was taken at.
///
/// Each component is one to eight hex digits, either case. Anything else,
/// including the server's `*.snap.<pid>.tmp` staging files, is rejected.
pub fn parse_snap_file_name(name: &str) -> Option<Lsn> {
    let stem = name.strip_suffix(SNAP_SUFFIX)?;
    let (hi, lo) = stem.split_once('-')?;
    Some(Lsn::from_parts(parse_hex_component(hi)?, parse_hex_component(lo)?))
}

fn parse_hex_component(raw: &str) -> Option<u32> {
    if raw.is_empty()
        || raw.len() > MAX_HEX_DIGITS
        || !raw.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return None;
    }
    u32::from_str_radix(raw, 16).ok()
}

/// List every snapshot file in `dir` with its size.
///
/// Unrelated entries are logged and skipped. A failed `stat` on a
/// well-named entry aborts the whole scan.
pub fn scan_snapshot_dir(dir: &Path) -> Result<Vec<SnapshotDescriptor>, ScanError> {
    let entries = fs::read_dir(dir).map_err(|source| ScanError::OpenDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut descriptors = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ScanError::ReadEntry {
            path: dir.to_path_buf(),
            source,
        })?;
        let file_name = entry.file_name();

        let Some(lsn) = file_name.to_str().and_then(parse_snap_file_name) else {
            tracing::warn!(
                file = %file_name.to_string_lossy(),
                "could not parse file name as .snap file"
            );
            continue;
        };
        tracing::debug!(%lsn, "found snap file");

        let size_bytes = entry_size(&entry).map_err(|source| ScanError::Metadata {
            path: entry.path(),
            source,
        })?;
        descriptors.push(SnapshotDescriptor { lsn, size_bytes });
    }

    Ok(descriptors)
}

/// Combined size of all snapshot files.
pub fn total_bytes(descriptors: &[SnapshotDescriptor]) -> u64 {
    descriptors
        .iter()
        .fold(0u64, |acc, desc| acc.saturating_add(desc.size_bytes))
}

// `DirEntry::metadata` stats relative to the open directory handle but does
// not follow symlinks; linked snapshots are sized by their target.
fn entry_size(entry: &fs::DirEntry) -> io::Result<u64> {
    let metadata = entry.metadata()?;
    if metadata.file_type().is_symlink() {
        return fs::metadata(entry.path()).map(|target| target.len());
    }
    Ok(metadata.len())
}
