use crate::constants::{APP_NAME, CONFIG_FILE, DEFAULT_FILE_PATTERNS, DEFAULT_FOLDER_PATTERNS};
use crate::error::ConfigError;
use crate::patterns::PatternSet;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    folder_patterns: Option<Vec<String>>,
    file_patterns: Option<Vec<String>>,
}

/// Pattern defaults for a session. The user can still edit them before each scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub folder_patterns: PatternSet,
    pub file_patterns: PatternSet,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            folder_patterns: PatternSet::folders(DEFAULT_FOLDER_PATTERNS),
            file_patterns: PatternSet::extensions(DEFAULT_FILE_PATTERNS),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Reads `path` if given, else the default location.
    /// A missing default file is not an error; a missing explicit one is.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(text)?;
        let mut config = Self::default();
        if let Some(folders) = file.folder_patterns {
            config.folder_patterns = PatternSet::folders(folders);
        }
        if let Some(files) = file.file_patterns {
            config.file_patterns = PatternSet::extensions(files);
        }
        Ok(config)
    }

    /// Applies comma-separated CLI overrides.
    #[must_use]
    pub fn with_overrides(mut self, folders: Option<&str>, files: Option<&str>) -> Self {
        if let Some(folders) = folders {
            self.folder_patterns = PatternSet::parse_folders(folders);
        }
        if let Some(files) = files {
            self.file_patterns = PatternSet::parse_extensions(files);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_builtin_lists() {
        let config = Config::default();
        assert_eq!(config.folder_patterns.iter().count(), 8);
        assert_eq!(config.folder_patterns.match_name(".git"), Some(".git"));
        assert_eq!(config.file_patterns.match_suffix("x.swp"), Some(".swp"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() -> Result<()> {
        let config = Config::from_toml(r#"folder_patterns = ["vendor", "node_modules"]"#)?;
        assert_eq!(
            config.folder_patterns.iter().collect::<Vec<_>>(),
            vec!["vendor", "node_modules"]
        );
        assert_eq!(config.file_patterns, Config::default().file_patterns);
        Ok(())
    }

    #[test]
    fn file_patterns_are_normalized() -> Result<()> {
        let config = Config::from_toml(r#"file_patterns = ["log", ".bak"]"#)?;
        assert_eq!(
            config.file_patterns.iter().collect::<Vec<_>>(),
            vec![".log", ".bak"]
        );
        Ok(())
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml("folders = []").is_err());
    }

    #[test]
    fn explicit_missing_file_errors() {
        let err = Config::load(Some(Path::new("/nonexistent/tidydir.toml")));
        assert!(matches!(err, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn load_reads_explicit_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "file_patterns = []\n")?;
        let config = Config::load(Some(&path))?;
        assert!(config.file_patterns.is_empty());
        Ok(())
    }

    #[test]
    fn cli_overrides_replace_lists() {
        let config = Config::default().with_overrides(Some("target"), None);
        assert_eq!(config.folder_patterns.iter().collect::<Vec<_>>(), vec!["target"]);
        assert_eq!(config.file_patterns, Config::default().file_patterns);

        let cleared = Config::default().with_overrides(Some(""), Some(""));
        assert!(cleared.folder_patterns.is_empty());
        assert!(cleared.file_patterns.is_empty());
    }
}
