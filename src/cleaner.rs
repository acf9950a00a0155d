use crate::model::{DeletionOutcome, DeletionStatus, MatchKind, MatchRecord};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{info, warn};

/// Permanently removes each record, in order.
///
/// Every removal is attempted even if earlier ones failed. `on_progress` is
/// called after each attempt with `(done, total)`.
pub fn delete_records(
    records: &[MatchRecord],
    on_progress: Option<&dyn Fn(usize, usize)>,
) -> Vec<DeletionOutcome> {
    let total = records.len();
    let mut outcomes = Vec::with_capacity(total);

    for (i, record) in records.iter().enumerate() {
        let status = match remove(&record.path, record.kind) {
            Ok(()) => {
                info!(path = %record.path.display(), bytes = record.size_bytes, "deleted");
                DeletionStatus::Deleted
            }
            Err(e) => {
                warn!(path = %record.path.display(), error = %e, "delete failed");
                DeletionStatus::Failed(e.to_string())
            }
        };

        outcomes.push(DeletionOutcome {
            path: record.path.clone(),
            kind: record.kind,
            size_bytes: record.size_bytes,
            status,
        });

        if let Some(cb) = on_progress {
            cb(i + 1, total);
        }
    }

    outcomes
}

fn remove(path: &Path, kind: MatchKind) -> io::Result<()> {
    // symlink_metadata so a vanished path fails here and a link is never followed
    let metadata = fs::symlink_metadata(path)?;
    match kind {
        MatchKind::Folder if metadata.is_dir() => fs::remove_dir_all(path),
        MatchKind::Folder => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "no longer a directory",
        )),
        MatchKind::File if metadata.is_dir() => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "now a directory",
        )),
        MatchKind::File => fs::remove_file(path),
    }
}
