use std::path::{Path, PathBuf};

/// Replaces a leading `~` component with the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

/// Home-expanded, canonical form of `path`. Falls back to the expanded
/// path when it cannot be resolved (missing, unreadable parent).
pub fn resolve(path: &Path) -> PathBuf {
    let expanded = expand_home(path);
    expanded.canonicalize().unwrap_or(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn tilde_expands_to_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_home(Path::new("~/src")), home.join("src"));
        assert_eq!(expand_home(Path::new("~")), home);
        assert_eq!(expand_home(Path::new("/srv/~")), PathBuf::from("/srv/~"));
        assert_eq!(expand_home(Path::new("~user/x")), PathBuf::from("~user/x"));
    }

    #[test]
    fn resolve_canonicalizes_existing_paths() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir(dir.path().join("a"))?;
        let messy = dir.path().join("a").join("..").join("a");
        assert_eq!(resolve(&messy), fs::canonicalize(dir.path().join("a"))?);

        let missing = dir.path().join("nope");
        assert_eq!(resolve(&missing), missing);
        Ok(())
    }
}
