//! engine::detectors::corruption
//!
//! Object store health: oversized blobs, stray object files and whether
//! Git LFS is in use.
//!
//! Large objects are reported by hash and size only. Finding the paths
//! that introduced them needs a full history walk and is left to the user.

use std::path::Path;

use crate::core::paths::DoctorPaths;
use crate::engine::state::{CorruptionState, LargeObject};
use crate::engine::tables;
use crate::git::{Git, GitError, ObjectSize};

/// Inspect the object store.
pub async fn detect(
    git: &Git,
    paths: Option<&DoctorPaths>,
    threshold: u64,
) -> Result<CorruptionState, GitError> {
    let sizes = git.reachable_object_sizes().await?;
    let garbage = git.garbage_count().await?;
    let lfs = lfs_active(git.work_dir(), paths);
    Ok(classify(&sizes, garbage, lfs, threshold))
}

/// Classify observations. Blobs strictly above `threshold` are large.
pub fn classify(sizes: &[ObjectSize], garbage: u64, lfs_active: bool, threshold: u64) -> CorruptionState {
    let mut large_objects: Vec<LargeObject> = sizes
        .iter()
        .filter(|o| o.kind == "blob" && o.size > threshold)
        .map(|o| LargeObject {
            oid: o.oid.clone(),
            size: o.size,
        })
        .collect();
    large_objects.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.oid.cmp(&b.oid)));
    large_objects.dedup();

    let scenario = tables::corruption(garbage > 0, !large_objects.is_empty(), lfs_active);
    CorruptionState {
        large_objects,
        lfs_active,
        garbage_objects: garbage,
        threshold,
        scenario,
    }
}

/// LFS is active if the top-level `.gitattributes` routes anything through
/// the lfs filter, or the repository has an LFS object directory.
pub fn lfs_active(work_dir: &Path, paths: Option<&DoctorPaths>) -> bool {
    let attributes = std::fs::read_to_string(work_dir.join(".gitattributes")).unwrap_or_default();
    let declared = attributes
        .lines()
        .map(str::trim)
        .filter(|l| !l.starts_with('#'))
        .any(|l| l.split_whitespace().any(|attr| attr == "filter=lfs"));
    declared || paths.is_some_and(|p| p.lfs_dir().is_dir())
}
