use crate::constants::{ALLOWLIST_FILE, APP_NAME};
use crate::paths;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    rules: Vec<PathBuf>,
}

impl Allowlist {
    /// Each rule is stored home-expanded and canonicalized.
    pub fn new(rules: Vec<PathBuf>) -> Self {
        Self {
            rules: rules.iter().map(|rule| paths::resolve(rule)).collect(),
        }
    }

    /// Loads the allowlist from the default configuration path.
    /// Returns an empty allowlist if the file doesn't exist or errors.
    pub fn load() -> Self {
        dirs::config_dir()
            .map(|dir| dir.join(APP_NAME).join(ALLOWLIST_FILE))
            .map_or_else(Self::default, |path| Self::load_from(&path))
    }

    pub fn load_from(path: &Path) -> Self {
        let mut rules = Vec::new();

        if let Ok(file) = fs::File::open(path) {
            let reader = BufReader::new(file);
            for line in reader.lines().map_while(Result::ok) {
                let trimmed = line.trim();
                // Skip empty lines and comments
                if !trimmed.is_empty() && !trimmed.starts_with('#') {
                    rules.push(PathBuf::from(trimmed));
                }
            }
            debug!(path = %path.display(), rules = rules.len(), "loaded allowlist");
        }

        Self::new(rules)
    }

    /// A rule protects the exact path and everything below it.
    /// Matching is per path component, so `/a/b` does not protect `/a/bc`.
    pub fn is_protected(&self, path: &Path) -> bool {
        self.rules.iter().any(|rule| path.starts_with(rule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_is_protected() {
        let allowlist = Allowlist::new(vec![
            PathBuf::from("/home/test/Secret"),
            PathBuf::from("/home/test/Projects/Keep"),
        ]);

        assert!(allowlist.is_protected(Path::new("/home/test/Secret")));
        assert!(allowlist.is_protected(Path::new("/home/test/Secret/file.log"))); // Subfile
        assert!(allowlist.is_protected(Path::new("/home/test/Projects/Keep/node_modules")));

        assert!(!allowlist.is_protected(Path::new("/home/test/Projects/KeepNot")));
        assert!(!allowlist.is_protected(Path::new("/home/test/Public")));
    }

    #[test]
    fn load_skips_comments_and_blanks() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(ALLOWLIST_FILE);
        let mut file = fs::File::create(&path)?;
        writeln!(file, "# keep these")?;
        writeln!(file)?;
        writeln!(file, "  /srv/app/node_modules  ")?;

        let allowlist = Allowlist::load_from(&path);
        assert!(allowlist.is_protected(Path::new("/srv/app/node_modules")));
        assert!(!allowlist.is_protected(Path::new("/srv/app")));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn rules_through_symlinks_are_resolved() -> Result<()> {
        let dir = tempdir()?;
        let real = fs::canonicalize(dir.path())?.join("real");
        fs::create_dir_all(real.join("keep"))?;
        let alias = dir.path().join("alias");
        std::os::unix::fs::symlink(&real, &alias)?;

        let allowlist = Allowlist::new(vec![alias.join("keep")]);
        assert!(allowlist.is_protected(&real.join("keep/node_modules")));
        assert!(!allowlist.is_protected(&real.join("other")));
        Ok(())
    }

    #[test]
    fn missing_file_is_empty() {
        let allowlist = Allowlist::load_from(Path::new("/nonexistent/tidydir/allowlist.txt"));
        assert!(allowlist.rules.is_empty());
    }
}
