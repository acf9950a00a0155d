use crate::allowlist::Allowlist;
use crate::error::{ScanError, TraversalSkip};
use crate::model::{MatchKind, MatchRecord, ScanProgress, ScanRequest};
use crate::scanner::CancelFlag;
use std::fs::{self, DirEntry};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub(super) struct Walk {
    pub records: Vec<MatchRecord>,
    pub warnings: Vec<TraversalSkip>,
}

/// Depth-first pre-order walk from `root`.
///
/// Per directory: folder matches first, then file matches, then descent into
/// the remaining subdirectories. Matched folders are recorded with size 0 and
/// never entered; the caller sizes them afterwards.
pub(super) fn walk(
    root: &Path,
    request: &ScanRequest,
    allowlist: &Allowlist,
    cancel: &CancelFlag,
    progress_cb: Option<&dyn Fn(&ScanProgress)>,
) -> Result<Walk, ScanError> {
    let mut out = Walk::default();
    let mut stack = vec![root.to_path_buf()];
    let mut dirs_visited = 0;

    while let Some(dir) = stack.pop() {
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let Some(entries) = read_sorted(&dir, &mut out.warnings) else {
            continue;
        };
        dirs_visited += 1;

        let mut folders = Vec::new();
        let mut files = Vec::new();
        let mut subdirs = Vec::new();

        for entry in entries {
            if cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }

            let path = entry.path();
            if allowlist.is_protected(&path) {
                debug!(path = %path.display(), "protected by allowlist");
                continue;
            }

            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(err) => {
                    skip(&mut out.warnings, path, &err);
                    continue;
                }
            };
            let file_name = entry.file_name();

            // file_type() does not follow links, so a link to a directory lands
            // in the leaf branch.
            if file_type.is_dir() {
                let matched = file_name
                    .to_str()
                    .and_then(|n| request.folder_patterns.match_name(n));
                match matched {
                    Some(pattern) => folders.push(MatchRecord {
                        path,
                        kind: MatchKind::Folder,
                        matched_pattern: pattern.to_string(),
                        size_bytes: 0,
                    }),
                    None => subdirs.push(path),
                }
            } else if let Some(pattern) = request.extension_patterns.match_suffix(&file_name) {
                match entry.metadata() {
                    Ok(metadata) => files.push(MatchRecord {
                        path,
                        kind: MatchKind::File,
                        matched_pattern: pattern.to_string(),
                        size_bytes: metadata.len(),
                    }),
                    Err(err) => skip(&mut out.warnings, path, &err),
                }
            }
        }

        out.records.append(&mut folders);
        out.records.append(&mut files);
        stack.extend(subdirs.into_iter().rev());

        if let Some(cb) = progress_cb {
            cb(&ScanProgress {
                dirs_visited,
                matches_found: out.records.len(),
                current: dir,
            });
        }
    }

    Ok(out)
}

fn read_sorted(dir: &Path, warnings: &mut Vec<TraversalSkip>) -> Option<Vec<DirEntry>> {
    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(err) => {
            skip(warnings, dir.to_path_buf(), &err);
            return None;
        }
    };

    let mut entries = Vec::new();
    for entry in read_dir {
        match entry {
            Ok(entry) => entries.push(entry),
            Err(err) => skip(warnings, dir.to_path_buf(), &err),
        }
    }
    entries.sort_by_key(DirEntry::file_name);
    Some(entries)
}

fn skip(warnings: &mut Vec<TraversalSkip>, path: PathBuf, err: &std::io::Error) {
    warn!(path = %path.display(), error = %err, "skipping unreadable entry");
    warnings.push(TraversalSkip::new(path, err));
}
