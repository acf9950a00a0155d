use crate::cleaner;
use crate::error::SessionError;
use crate::model::{Aggregate, DeletionOutcome, MatchRecord, ScanResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scanning,
    Reviewing,
    Confirming,
    Deleting,
}

/// Owns the current scan result and which of its records are selected.
///
/// Only `Scanning` and `Deleting` involve the filesystem; every other
/// transition is in-memory.
#[derive(Debug)]
pub struct Session {
    phase: Phase,
    result: Option<ScanResult>,
    selected: HashSet<PathBuf>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            result: None,
            selected: HashSet::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn result(&self) -> Option<&ScanResult> {
        self.result.as_ref()
    }

    pub fn records(&self) -> &[MatchRecord] {
        self.result
            .as_ref()
            .map(|r| r.records.as_slice())
            .unwrap_or_default()
    }

    pub fn is_selected(&self, path: &Path) -> bool {
        self.selected.contains(path)
    }

    fn transition(&mut self, to: Phase) {
        debug!(from = ?self.phase, ?to, "session transition");
        self.phase = to;
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            from: self.phase,
            action,
        }
    }

    /// Phase to settle in once no operation is in flight.
    fn resting_phase(&self) -> Phase {
        if self.result.as_ref().is_some_and(|r| !r.is_empty()) {
            Phase::Reviewing
        } else {
            Phase::Idle
        }
    }

    pub fn begin_scan(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Idle | Phase::Reviewing => {
                self.transition(Phase::Scanning);
                Ok(())
            }
            _ => Err(self.invalid("start a scan")),
        }
    }

    /// Replaces the current result and selects every record in it.
    /// Only a running scan can deliver a result.
    pub fn apply_scan(&mut self, result: ScanResult) -> Result<(), SessionError> {
        if self.phase != Phase::Scanning {
            return Err(self.invalid("apply a scan result"));
        }
        self.selected = result.records.iter().map(|r| r.path.clone()).collect();
        self.result = Some(result);
        let to = self.resting_phase();
        self.transition(to);
        Ok(())
    }

    /// Leaves `Scanning` without touching the prior result.
    pub fn abort_scan(&mut self) {
        if self.phase == Phase::Scanning {
            let to = self.resting_phase();
            self.transition(to);
        }
    }

    /// Flips one record. Unknown paths are ignored.
    pub fn toggle(&mut self, path: &Path) {
        if self.phase == Phase::Deleting {
            return;
        }
        let Some(record) = self.result.as_ref().and_then(|r| r.get(path)) else {
            return;
        };
        if !self.selected.remove(&record.path) {
            self.selected.insert(record.path.clone());
        }
    }

    pub fn select_all(&mut self) {
        if self.phase == Phase::Deleting {
            return;
        }
        self.selected = self.records().iter().map(|r| r.path.clone()).collect();
    }

    pub fn select_none(&mut self) {
        if self.phase == Phase::Deleting {
            return;
        }
        self.selected.clear();
    }

    pub fn aggregate_selected(&self) -> Aggregate {
        self.records()
            .iter()
            .filter(|r| self.selected.contains(&r.path))
            .fold(Aggregate::default(), |acc, r| Aggregate {
                count: acc.count + 1,
                size_bytes: acc.size_bytes + r.size_bytes,
            })
    }

    pub fn selected_records(&self) -> Vec<MatchRecord> {
        self.records()
            .iter()
            .filter(|r| self.selected.contains(&r.path))
            .cloned()
            .collect()
    }

    pub fn request_delete(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Reviewing {
            return Err(self.invalid("confirm deletion"));
        }
        if self.selected.is_empty() {
            return Err(SessionError::NothingSelected);
        }
        self.transition(Phase::Confirming);
        Ok(())
    }

    pub fn cancel_delete(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Confirming {
            return Err(self.invalid("cancel deletion"));
        }
        self.transition(Phase::Reviewing);
        Ok(())
    }

    /// Enters `Deleting` and hands back the selected records in match order.
    pub fn begin_delete(&mut self) -> Result<Vec<MatchRecord>, SessionError> {
        if self.phase != Phase::Confirming {
            return Err(self.invalid("delete"));
        }
        self.transition(Phase::Deleting);
        Ok(self.selected_records())
    }

    /// Drops deleted records; failed ones stay and stay selected.
    pub fn finish_delete(&mut self, outcomes: &[DeletionOutcome]) -> Result<(), SessionError> {
        if self.phase != Phase::Deleting {
            return Err(self.invalid("finish deletion"));
        }

        let deleted: HashSet<&Path> = outcomes
            .iter()
            .filter(|o| o.is_deleted())
            .map(|o| o.path.as_path())
            .collect();

        if let Some(result) = self.result.as_mut() {
            result.records.retain(|r| !deleted.contains(r.path.as_path()));
        }
        self.selected.retain(|p| !deleted.contains(p.as_path()));
        for outcome in outcomes.iter().filter(|o| !o.is_deleted()) {
            self.selected.insert(outcome.path.clone());
        }

        let to = self.resting_phase();
        self.transition(to);
        Ok(())
    }

    /// Deletes the selection synchronously. Must be in `Confirming`.
    pub fn delete(&mut self) -> Result<Vec<DeletionOutcome>, SessionError> {
        let batch = self.begin_delete()?;
        let outcomes = cleaner::delete_records(&batch, None);
        self.finish_delete(&outcomes)?;
        Ok(outcomes)
    }

    /// Drops the result and returns to `Idle`.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if matches!(self.phase, Phase::Scanning | Phase::Deleting) {
            return Err(self.invalid("reset"));
        }
        self.result = None;
        self.selected.clear();
        self.transition(Phase::Idle);
        Ok(())
    }
}
