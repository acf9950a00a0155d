use crate::error::TraversalSkip;
use crate::patterns::PatternSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    Folder,
    File,
}

impl MatchKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Folder => "FOLDER",
            Self::File => "file",
        }
    }
}

/// A single folder or file found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub path: PathBuf,
    pub kind: MatchKind,
    pub matched_pattern: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub root: PathBuf,
    pub folder_patterns: PatternSet,
    pub extension_patterns: PatternSet,
}

impl ScanRequest {
    pub fn new(
        root: impl Into<PathBuf>,
        folder_patterns: PatternSet,
        extension_patterns: PatternSet,
    ) -> Self {
        Self {
            root: root.into(),
            folder_patterns,
            extension_patterns,
        }
    }

    pub fn has_patterns(&self) -> bool {
        !self.folder_patterns.is_empty() || !self.extension_patterns.is_empty()
    }
}

/// Matches in discovery order, plus the skips collected along the way.
///
/// Totals are derived from `records` so they stay exact after records are
/// removed by a deletion pass.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Canonical roots in scan order.
    pub roots: Vec<PathBuf>,
    pub records: Vec<MatchRecord>,
    pub warnings: Vec<TraversalSkip>,
}

impl ScanResult {
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            roots: vec![root.into()],
            records: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Appends another root's result after this one's records.
    pub fn append(&mut self, mut other: Self) {
        self.roots.append(&mut other.roots);
        self.records.append(&mut other.records);
        self.warnings.append(&mut other.warnings);
    }

    /// The root a record was found under.
    pub fn root_of(&self, path: &Path) -> Option<&Path> {
        self.roots
            .iter()
            .find(|root| path.starts_with(root))
            .map(PathBuf::as_path)
    }

    pub fn total_count(&self) -> usize {
        self.records.len()
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.size_bytes).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<&MatchRecord> {
        self.records.iter().find(|r| r.path == path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    pub dirs_visited: usize,
    pub matches_found: usize,
    pub current: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub count: usize,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionStatus {
    Deleted,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionOutcome {
    pub path: PathBuf,
    pub kind: MatchKind,
    pub size_bytes: u64,
    pub status: DeletionStatus,
}

impl DeletionOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self.status, DeletionStatus::Deleted)
    }
}

/// Summary of one deletion pass, shown to the user afterwards.
#[derive(Debug, Clone, Default)]
pub struct DeletionReport {
    pub outcomes: Vec<DeletionOutcome>,
}

impl DeletionReport {
    pub fn new(outcomes: Vec<DeletionOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn deleted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_deleted()).count()
    }

    pub fn freed_bytes(&self) -> u64 {
        self.outcomes
            .iter()
            .filter(|o| o.is_deleted())
            .map(|o| o.size_bytes)
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&DeletionOutcome, &str)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            DeletionStatus::Failed(reason) => Some((o, reason.as_str())),
            DeletionStatus::Deleted => None,
        })
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }
}
