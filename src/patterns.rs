use crate::constants::PATTERN_SEPARATOR;
use std::ffi::OsStr;

/// Ordered, deduplicated, case-sensitive set of name patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    patterns: Vec<String>,
}

impl PatternSet {
    /// Folder patterns compare against whole directory names.
    pub fn folders<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::build(patterns, |p| p.to_string())
    }

    /// Extension patterns are suffixes. A missing leading dot is added.
    pub fn extensions<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::build(patterns, |p| {
            if p.starts_with('.') {
                p.to_string()
            } else {
                format!(".{p}")
            }
        })
    }

    /// Parses comma-separated folder patterns, e.g. `"node_modules, dist"`.
    pub fn parse_folders(text: &str) -> Self {
        Self::folders(split_list(text))
    }

    pub fn parse_extensions(text: &str) -> Self {
        Self::extensions(split_list(text))
    }

    fn build<I, S>(patterns: I, normalize: impl Fn(&str) -> String) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for raw in patterns {
            let trimmed = raw.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }
            let pattern = normalize(trimmed);
            if !out.contains(&pattern) {
                out.push(pattern);
            }
        }
        Self { patterns: out }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }

    /// Exact match of a directory name.
    pub fn match_name(&self, name: &str) -> Option<&str> {
        self.iter().find(|p| *p == name)
    }

    /// First pattern (in order) that `name` ends with. Compared on the raw
    /// encoded bytes, so names that are not valid UTF-8 still match.
    pub fn match_suffix(&self, name: impl AsRef<OsStr>) -> Option<&str> {
        let name = name.as_ref().as_encoded_bytes();
        self.iter().find(|p| name.ends_with(p.as_bytes()))
    }

    /// Comma-joined form, used to prefill the pattern editors.
    pub fn to_list_string(&self) -> String {
        self.patterns.join(", ")
    }
}

fn split_list(text: &str) -> impl Iterator<Item = &str> {
    text.split(PATTERN_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_dedupes() {
        let set = PatternSet::parse_folders(" node_modules, dist,,node_modules , build ");
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["node_modules", "dist", "build"]);
    }

    #[test]
    fn parse_blank_is_empty() {
        assert!(PatternSet::parse_folders("  ").is_empty());
        assert!(PatternSet::parse_extensions(" , ,").is_empty());
    }

    #[test]
    fn extensions_get_leading_dot() {
        let set = PatternSet::parse_extensions("log, .tmp, pyc");
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![".log", ".tmp", ".pyc"]);
    }

    #[test]
    fn folder_match_is_exact_and_case_sensitive() {
        let set = PatternSet::folders(["node_modules", "build"]);
        assert_eq!(set.match_name("node_modules"), Some("node_modules"));
        assert_eq!(set.match_name("Node_Modules"), None);
        assert_eq!(set.match_name("node_modules2"), None);
        assert_eq!(set.match_name("rebuild"), None);
    }

    #[test]
    fn suffix_match_uses_pattern_order() {
        let set = PatternSet::extensions([".log", ".old.log"]);
        assert_eq!(set.match_suffix("app.old.log"), Some(".log"));
        assert_eq!(set.match_suffix(".DS_Store"), None);
        assert_eq!(set.match_suffix("app.LOG"), None);

        let ds = PatternSet::extensions([".DS_Store"]);
        assert_eq!(ds.match_suffix(".DS_Store"), Some(".DS_Store"));
    }

    #[cfg(unix)]
    #[test]
    fn suffix_match_ignores_invalid_utf8_in_stem() {
        use std::os::unix::ffi::OsStrExt;

        let set = PatternSet::extensions([".log"]);
        assert_eq!(set.match_suffix(OsStr::from_bytes(b"caf\xe9.log")), Some(".log"));
        assert_eq!(set.match_suffix(OsStr::from_bytes(b"caf\xe9.lo")), None);
    }

    #[test]
    fn list_string_round_trips_through_parse() {
        let set = PatternSet::parse_extensions(".pyc,.log");
        assert_eq!(set.to_list_string(), ".pyc, .log");
        assert_eq!(PatternSet::parse_extensions(&set.to_list_string()), set);
    }
}
