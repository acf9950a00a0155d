mod size;
mod walk;

use crate::allowlist::Allowlist;
use crate::error::ScanError;
use crate::model::{MatchKind, ScanProgress, ScanRequest, ScanResult};
use crate::patterns::PatternSet;
use rayon::prelude::*;
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Shared flag checked at every traversal step.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct Scanner {
    allowlist: Allowlist,
}

impl Scanner {
    pub fn new(allowlist: Allowlist) -> Self {
        Self { allowlist }
    }

    /// Scans `request.root` for matching folders and files.
    ///
    /// Matched folders are not descended into for further matches; their
    /// size is still the recursive sum of everything below them. Folder
    /// sizes are computed in parallel once the walk has fixed the order.
    pub fn scan(
        &self,
        request: &ScanRequest,
        cancel: &CancelFlag,
        progress_cb: Option<&dyn Fn(&ScanProgress)>,
    ) -> Result<ScanResult, ScanError> {
        let root = validate_root(&request.root)?;

        if !request.has_patterns() {
            debug!(root = %root.display(), "no patterns, nothing to match");
            return Ok(ScanResult::empty(root));
        }

        info!(
            root = %root.display(),
            folders = %request.folder_patterns.to_list_string(),
            files = %request.extension_patterns.to_list_string(),
            "scan started"
        );

        let walk::Walk {
            mut records,
            mut warnings,
        } = walk::walk(&root, request, &self.allowlist, cancel, progress_cb)?;

        let size_warnings: Vec<_> = records
            .par_iter_mut()
            .filter(|r| r.kind == MatchKind::Folder)
            .flat_map_iter(|record| {
                let (size, skipped) = size::folder_size(&record.path, cancel);
                record.size_bytes = size;
                skipped
            })
            .collect();
        warnings.extend(size_warnings);

        if cancel.is_cancelled() {
            info!(root = %root.display(), "scan cancelled");
            return Err(ScanError::Cancelled);
        }

        let result = ScanResult {
            roots: vec![root],
            records,
            warnings,
        };
        info!(
            matches = result.total_count(),
            bytes = result.total_size_bytes(),
            skipped = result.warnings.len(),
            "scan finished"
        );
        Ok(result)
    }

    /// Scans each root in turn with the same patterns and joins the results
    /// in root order.
    ///
    /// Every root is validated before any traversal starts. Roots that are
    /// identical, or nested inside another listed root, once canonicalized,
    /// are scanned only through the outermost one. Progress counts run on
    /// across roots.
    pub fn scan_roots(
        &self,
        roots: &[PathBuf],
        folder_patterns: &PatternSet,
        extension_patterns: &PatternSet,
        cancel: &CancelFlag,
        progress_cb: Option<&dyn Fn(&ScanProgress)>,
    ) -> Result<ScanResult, ScanError> {
        let canonical = roots
            .iter()
            .map(|root| validate_root(root))
            .collect::<Result<Vec<_>, _>>()?;
        let roots = distinct_roots(&canonical);

        let mut combined = ScanResult::default();
        let dirs_before = Cell::new(0);
        for root in roots {
            let request =
                ScanRequest::new(root, folder_patterns.clone(), extension_patterns.clone());
            let (dirs_base, matches_base) = (dirs_before.get(), combined.records.len());
            let forward = |p: &ScanProgress| {
                dirs_before.set(dirs_base + p.dirs_visited);
                if let Some(cb) = progress_cb {
                    cb(&ScanProgress {
                        dirs_visited: dirs_base + p.dirs_visited,
                        matches_found: matches_base + p.matches_found,
                        current: p.current.clone(),
                    });
                }
            };
            combined.append(self.scan(&request, cancel, Some(&forward))?);
        }
        Ok(combined)
    }
}

fn validate_root(root: &Path) -> Result<PathBuf, ScanError> {
    let invalid = |source| ScanError::InvalidRoot {
        path: root.to_path_buf(),
        source,
    };

    let canonical = fs::canonicalize(root).map_err(invalid)?;
    if !fs::metadata(&canonical).map_err(invalid)?.is_dir() {
        return Err(ScanError::not_a_directory(root.to_path_buf()));
    }
    fs::read_dir(&canonical).map_err(invalid)?;
    Ok(canonical)
}

/// Keeps the first occurrence of each root and drops roots that lie inside
/// another listed root.
fn distinct_roots(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut kept: Vec<PathBuf> = Vec::new();
    for root in roots {
        let covered = kept.contains(root)
            || roots
                .iter()
                .any(|other| other != root && root.starts_with(other));
        if covered {
            debug!(root = %root.display(), "root already covered by another root");
        } else {
            kept.push(root.clone());
        }
    }
    kept
}
