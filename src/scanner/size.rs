use crate::error::TraversalSkip;
use crate::scanner::CancelFlag;
use jwalk::WalkDir;
use std::path::Path;
use tracing::warn;

/// Sum of all regular-file sizes below `path`. Links are not followed.
///
/// Unreadable entries are reported and left out of the sum. Stops early
/// when `cancel` is raised; the caller discards the partial size.
pub(super) fn folder_size(path: &Path, cancel: &CancelFlag) -> (u64, Vec<TraversalSkip>) {
    let mut size = 0;
    let mut skipped = Vec::new();

    for entry in WalkDir::new(path)
        .skip_hidden(false)
        .follow_links(false)
        .parallelism(jwalk::Parallelism::Serial)
    {
        if cancel.is_cancelled() {
            break;
        }

        match entry {
            Ok(entry) if entry.file_type().is_file() => match entry.metadata() {
                Ok(metadata) => size += metadata.len(),
                Err(err) => {
                    warn!(path = %entry.path().display(), error = %err, "cannot stat file");
                    skipped.push(TraversalSkip::new(entry.path(), &err));
                }
            },
            // jwalk yields an unreadable directory as a normal entry and parks
            // the error on it.
            Ok(entry) => {
                if let Some(err) = &entry.read_children_error {
                    warn!(path = %entry.path().display(), error = %err, "cannot read folder");
                    skipped.push(TraversalSkip::new(entry.path(), err));
                }
            }
            Err(err) => {
                let at = err.path().unwrap_or(path).to_path_buf();
                warn!(path = %at.display(), error = %err, "cannot size subtree");
                skipped.push(TraversalSkip::new(at, &err));
            }
        }
    }

    (size, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn sums_nested_files() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path();
        fs::create_dir_all(root.join("a/b/c"))?;
        fs::write(root.join("top.bin"), [0u8; 10])?;
        fs::write(root.join("a/mid.bin"), [0u8; 20])?;
        fs::write(root.join("a/b/c/deep.bin"), [0u8; 30])?;
        fs::write(root.join(".hidden"), [0u8; 5])?;

        let (size, skipped) = folder_size(root, &CancelFlag::new());
        assert_eq!(size, 65);
        assert!(skipped.is_empty());
        Ok(())
    }

    #[test]
    fn empty_folder_is_zero() -> Result<()> {
        let dir = tempdir()?;
        let (size, skipped) = folder_size(dir.path(), &CancelFlag::new());
        assert_eq!(size, 0);
        assert!(skipped.is_empty());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subfolder_is_reported() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir()?;
        let root = dir.path();
        fs::write(root.join("open.bin"), [0u8; 3])?;
        let locked = root.join("locked");
        fs::create_dir(&locked)?;
        fs::write(locked.join("x.bin"), [0u8; 9])?;
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;

        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;
            return Ok(());
        }

        let (size, skipped) = folder_size(root, &CancelFlag::new());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;

        assert_eq!(size, 3);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].path, locked);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn links_are_not_followed() -> Result<()> {
        let outside = tempdir()?;
        fs::write(outside.path().join("big.bin"), [0u8; 1000])?;

        let dir = tempdir()?;
        fs::write(dir.path().join("own.bin"), [0u8; 7])?;
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link"))?;

        let (size, _) = folder_size(dir.path(), &CancelFlag::new());
        assert_eq!(size, 7);
        Ok(())
    }
}
