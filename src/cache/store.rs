use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::cache::fingerprint::Fingerprint;
use crate::foundation::error::SlidereelResult;

const CLIP_PREFIX: &str = "clip_";
const CLIP_SUFFIX: &str = ".mp4";
const PARTIAL_SUFFIX: &str = ".part";

/// Directory of rendered slide clips keyed by [`Fingerprint`].
///
/// Each entry is one file named `clip_<fingerprint>.mp4`. A hit is the existence of that file;
/// its bytes are never verified, so a damaged clip stays a hit until removed by hand.
#[derive(Clone, Debug)]
pub struct ArtifactCache {
    root: PathBuf,
}

/// Files removed by [`ArtifactCache::garbage_collect`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GcReport {
    /// Orphaned clip artifacts.
    pub removed: Vec<PathBuf>,
    /// Leftover partial writes from interrupted encodes.
    pub removed_partials: Vec<PathBuf>,
}

impl ArtifactCache {
    /// Open (creating if needed) the cache rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> SlidereelResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("failed to create cache directory '{}'", root.display()))?;
        Ok(Self { root })
    }

    /// Cache directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path where the clip for `fp` lives. No IO.
    pub fn resolve_path(&self, fp: Fingerprint) -> PathBuf {
        self.root.join(format!("{CLIP_PREFIX}{fp}{CLIP_SUFFIX}"))
    }

    /// Path the encoder writes to before the clip is moved onto [`Self::resolve_path`].
    pub fn partial_path(&self, fp: Fingerprint) -> PathBuf {
        self.root
            .join(format!("{CLIP_PREFIX}{fp}{CLIP_SUFFIX}{PARTIAL_SUFFIX}"))
    }

    /// `true` when a file exists at `path`.
    pub fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// Delete every clip artifact whose path is not in `keep`, plus any partial writes.
    ///
    /// Must only run once no slide pipeline is writing into the cache.
    pub fn garbage_collect(&self, keep: &HashSet<PathBuf>) -> SlidereelResult<GcReport> {
        let keep_names: HashSet<OsString> = keep
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_os_string()))
            .collect();

        let mut report = GcReport::default();
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("failed to list cache directory '{}'", self.root.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| {
                format!("failed to read cache directory '{}'", self.root.display())
            })?;
            let name = entry.file_name();
            let Some(name_str) = name.to_str() else {
                continue;
            };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            if is_partial_name(name_str) {
                if remove_logged(&path, "partial clip") {
                    report.removed_partials.push(path);
                }
            } else if parse_clip_name(name_str).is_some()
                && !keep_names.contains(&name)
                && remove_logged(&path, "unused cache entry")
            {
                report.removed.push(path);
            }
        }
        report.removed.sort();
        report.removed_partials.sort();
        Ok(report)
    }

    /// Remove every regular file in the cache directory. Returns how many were removed.
    pub fn clear(&self) -> SlidereelResult<usize> {
        let mut removed = 0usize;
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("failed to list cache directory '{}'", self.root.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| {
                    format!("failed to read cache directory '{}'", self.root.display())
                })?
                .path();
            if path.is_file() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("failed to remove '{}'", path.display()))?;
                removed += 1;
            }
        }
        tracing::info!(removed, cache = %self.root.display(), "cleaned cache directory");
        Ok(removed)
    }
}

/// Extract the fingerprint from a clip artifact file name.
pub fn parse_clip_name(name: &str) -> Option<Fingerprint> {
    let hex = name.strip_prefix(CLIP_PREFIX)?.strip_suffix(CLIP_SUFFIX)?;
    Fingerprint::from_hex(hex)
}

fn is_partial_name(name: &str) -> bool {
    name.strip_suffix(PARTIAL_SUFFIX)
        .is_some_and(|n| parse_clip_name(n).is_some())
}

fn remove_logged(path: &Path, what: &str) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "removed {what}");
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove {what}");
            false
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/store.rs"]
mod tests;
