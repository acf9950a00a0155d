use crate::cleaner;
use crate::config::Config;
use crate::error::{ScanError, SessionError};
use crate::model::{DeletionOutcome, DeletionReport, MatchRecord, ScanProgress, ScanResult};
use crate::paths;
use crate::patterns::PatternSet;
use crate::scanner::{CancelFlag, Scanner};
use crate::session::{Phase, Session};
use crossterm::event::KeyCode;
use humansize::{BINARY, format_size};
use ratatui::widgets::TableState;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, TryRecvError};
use std::thread;
use sysinfo::Disks;
use tracing::{error, info};

pub enum ScanUpdate {
    Progress(ScanProgress),
    Finished(Result<ScanResult, ScanError>),
}

pub enum CleanUpdate {
    Progress { done: usize, total: usize },
    Finished(Vec<DeletionOutcome>),
}

pub enum Popup {
    Help,
    Report(DeletionReport),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Root,
    Folders,
    Files,
}

impl EditField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Root => "Add folder to scan",
            Self::Folders => "Find these folders",
            Self::Files => "Find these files",
        }
    }
}

pub struct Editor {
    pub field: EditField,
    pub buffer: String,
}

pub struct App {
    pub session: Session,
    pub roots: Vec<PathBuf>,
    pub root_cursor: usize,
    pub config: Config,
    pub scanner: Arc<Scanner>,
    pub table_state: TableState,
    pub disks: Disks,
    pub status: String,
    pub popup: Option<Popup>,
    pub editor: Option<Editor>,
    // Scanning
    pub scan_rx: Option<mpsc::Receiver<ScanUpdate>>,
    pub scan_cancel: Option<CancelFlag>,
    pub scan_progress: Option<ScanProgress>,
    // Channel receiver for cleaning thread results
    pub cleaning_rx: Option<mpsc::Receiver<CleanUpdate>>,
    pub clean_progress: (usize, usize),
}

impl App {
    pub fn new(roots: Vec<PathBuf>, config: Config, scanner: Scanner) -> Self {
        let disks = Disks::new_with_refreshed_list();
        Self {
            session: Session::new(),
            roots,
            root_cursor: 0,
            config,
            scanner: Arc::new(scanner),
            table_state: TableState::default(),
            disks,
            status: "Press [s] to scan".to_string(),
            popup: None,
            editor: None,
            scan_rx: None,
            scan_cancel: None,
            scan_progress: None,
            cleaning_rx: None,
            clean_progress: (0, 0),
        }
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn records(&self) -> &[MatchRecord] {
        self.session.records()
    }

    pub fn current_record(&self) -> Option<&MatchRecord> {
        self.table_state
            .selected()
            .and_then(|i| self.records().get(i))
    }

    pub fn next(&mut self) {
        let len = self.records().len();
        if len == 0 {
            return;
        }

        let i = match self.table_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.records().len();
        if len == 0 {
            return;
        }

        let i = match self.table_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    fn clamp_cursor(&mut self) {
        let len = self.records().len();
        match self.table_state.selected() {
            _ if len == 0 => self.table_state.select(None),
            Some(i) if i >= len => self.table_state.select(Some(len - 1)),
            None => self.table_state.select(Some(0)),
            Some(_) => {}
        }
    }

    pub fn toggle(&mut self) {
        if let Some(path) = self.current_record().map(|r| r.path.clone()) {
            self.session.toggle(&path);
            self.update_selection_status();
        }
    }

    pub fn select_all(&mut self) {
        self.session.select_all();
        self.update_selection_status();
    }

    pub fn select_none(&mut self) {
        self.session.select_none();
        self.update_selection_status();
    }

    fn update_selection_status(&mut self) {
        let agg = self.session.aggregate_selected();
        let total = self.records().len();
        self.status = if agg.count > 0 {
            format!(
                "{}/{total} selected ({}) - [d] Delete",
                agg.count,
                format_size(agg.size_bytes, BINARY)
            )
        } else {
            format!("{total} items found - [Space] to select")
        };
    }

    pub fn request_delete(&mut self) {
        match self.session.request_delete() {
            Ok(()) => {}
            Err(SessionError::NothingSelected) => self.status = "Nothing selected!".to_string(),
            Err(e) => self.status = e.to_string(),
        }
    }

    pub fn cancel_delete(&mut self) {
        if self.session.cancel_delete().is_ok() {
            self.status = "Cancelled".to_string();
        }
    }

    pub fn clear_results(&mut self) {
        if self.session.reset().is_ok() {
            self.table_state = TableState::default();
            self.status = "Cleared - [s] to scan".to_string();
        }
    }

    /// Resolves `input` and appends it to the scan list unless it is
    /// already there.
    pub fn add_root(&mut self, input: &str) {
        let input = input.trim();
        if input.is_empty() {
            self.status = "Enter a folder path".to_string();
            return;
        }
        let path = paths::resolve(Path::new(input));
        if !path.is_dir() {
            self.status = format!("Not a folder: {}", path.display());
            return;
        }
        if self.roots.contains(&path) {
            self.status = format!("Already added: {}", path.display());
            return;
        }

        info!(root = %path.display(), "folder added");
        self.roots.push(path);
        self.root_cursor = self.roots.len() - 1;
        self.status = format!("{} folder(s) ready - [s] to scan", self.roots.len());
    }

    pub fn remove_root(&mut self) {
        if self.root_cursor >= self.roots.len() {
            return;
        }
        let removed = self.roots.remove(self.root_cursor);
        info!(root = %removed.display(), "folder removed");
        self.root_cursor = self.root_cursor.min(self.roots.len().saturating_sub(1));
        self.status = format!("{} folder(s) ready", self.roots.len());
    }

    pub fn clear_roots(&mut self) {
        self.roots.clear();
        self.root_cursor = 0;
        self.status = "Add folders with [r], then [s] to scan".to_string();
    }

    pub fn next_root(&mut self) {
        if !self.roots.is_empty() {
            self.root_cursor = (self.root_cursor + 1) % self.roots.len();
        }
    }

    pub fn start_scan(&mut self) {
        if self.roots.is_empty() {
            self.status = "Add a folder to scan with [r]".to_string();
            return;
        }
        if self.config.folder_patterns.is_empty() && self.config.file_patterns.is_empty() {
            self.status = "Enter patterns to find ([f] folders, [e] files)".to_string();
            return;
        }
        if let Err(e) = self.session.begin_scan() {
            self.status = e.to_string();
            return;
        }

        let (tx, rx) = mpsc::channel();
        let cancel = CancelFlag::new();
        self.scan_rx = Some(rx);
        self.scan_cancel = Some(cancel.clone());
        self.scan_progress = None;
        self.status = format!("Scanning {} folder(s)...", self.roots.len());

        let scanner = Arc::clone(&self.scanner);
        let roots = self.roots.clone();
        let folders = self.config.folder_patterns.clone();
        let files = self.config.file_patterns.clone();
        thread::spawn(move || {
            let tx_progress = tx.clone();
            let cb = move |progress: &ScanProgress| {
                let _ = tx_progress.send(ScanUpdate::Progress(progress.clone()));
            };

            let res = scanner.scan_roots(&roots, &folders, &files, &cancel, Some(&cb));

            let _ = tx.send(ScanUpdate::Finished(res));
        });
    }

    pub fn cancel_scan(&mut self) {
        if let Some(cancel) = &self.scan_cancel {
            cancel.cancel();
            self.status = "Cancelling...".to_string();
        }
    }

    pub fn check_scan_status(&mut self) {
        let Some(rx) = &self.scan_rx else {
            return;
        };

        // Non-blocking check for all available messages
        let mut finished = None;
        loop {
            match rx.try_recv() {
                Ok(ScanUpdate::Progress(progress)) => self.scan_progress = Some(progress),
                Ok(ScanUpdate::Finished(res)) => {
                    finished = Some(res);
                    break;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    finished = Some(Err(ScanError::Cancelled));
                    error!("scan thread exited without a result");
                    break;
                }
            }
        }

        if let Some(res) = finished {
            self.scan_rx = None;
            self.scan_cancel = None;
            self.finish_scan(res);
        }
    }

    fn finish_scan(&mut self, res: Result<ScanResult, ScanError>) {
        match res {
            Ok(result) => {
                let warnings = result.warnings.len();
                if let Err(e) = self.session.apply_scan(result) {
                    error!(error = %e, "dropping scan result");
                    self.status = e.to_string();
                    return;
                }
                self.table_state = TableState::default();
                self.clamp_cursor();

                let agg = self.session.aggregate_selected();
                self.status = if agg.count == 0 {
                    "No matching items found".to_string()
                } else {
                    format!(
                        "ALL {} items selected ({}) - [d] Delete or [Space] to keep items",
                        agg.count,
                        format_size(agg.size_bytes, BINARY)
                    )
                };
                if warnings > 0 {
                    self.status.push_str(&format!(" | {warnings} skipped"));
                }
            }
            Err(ScanError::Cancelled) => {
                self.session.abort_scan();
                self.status = "Scan cancelled".to_string();
            }
            Err(e) => {
                self.session.abort_scan();
                error!(error = %e, "scan failed");
                self.status = format!("Error: {e}");
            }
        }
    }

    pub fn clean_selected(&mut self) {
        let batch = match self.session.begin_delete() {
            Ok(batch) => batch,
            Err(e) => {
                self.status = e.to_string();
                return;
            }
        };
        info!(items = batch.len(), "deleting selection");

        // Threaded cleaning
        let (tx, rx) = mpsc::channel();
        self.cleaning_rx = Some(rx);
        self.clean_progress = (0, batch.len());

        thread::spawn(move || {
            let tx_progress = tx.clone();
            let cb = move |done: usize, total: usize| {
                let _ = tx_progress.send(CleanUpdate::Progress { done, total });
            };

            let outcomes = cleaner::delete_records(&batch, Some(&cb));

            let _ = tx.send(CleanUpdate::Finished(outcomes));
        });
    }

    pub fn check_cleaning_status(&mut self) {
        let Some(rx) = &self.cleaning_rx else {
            return;
        };

        let mut finished = None;
        loop {
            match rx.try_recv() {
                Ok(CleanUpdate::Progress { done, total }) => self.clean_progress = (done, total),
                Ok(CleanUpdate::Finished(outcomes)) => {
                    finished = Some(outcomes);
                    break;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    error!("cleaning thread exited without a result");
                    self.cleaning_rx = None;
                    self.deletion_interrupted();
                    return;
                }
            }
        }

        if let Some(outcomes) = finished {
            self.cleaning_rx = None; // Detach receiver
            if let Err(e) = self.session.finish_delete(&outcomes) {
                error!(error = %e, "cannot apply deletion outcomes");
            }
            self.clamp_cursor();

            let report = DeletionReport::new(outcomes);
            self.status = if report.failed_count() == 0 {
                format!(
                    "Deleted {} items ({})",
                    report.deleted_count(),
                    format_size(report.freed_bytes(), BINARY)
                )
            } else {
                format!(
                    "Deleted {} items with {} errors",
                    report.deleted_count(),
                    report.failed_count()
                )
            };
            self.popup = Some(Popup::Report(report));

            // Refresh disk info after cleaning
            self.disks.refresh(true);
        }
    }

    /// Nothing is known about which records were removed, so the listing is
    /// rebuilt from disk.
    fn deletion_interrupted(&mut self) {
        if let Err(e) = self.session.finish_delete(&[]) {
            error!(error = %e, "cannot leave deletion");
        }
        self.clamp_cursor();
        self.start_scan();
        self.status = if self.phase() == Phase::Scanning {
            "Deletion stopped unexpectedly, outcome unknown - rescanning".to_string()
        } else {
            "Deletion stopped unexpectedly, outcome unknown - rescan to check".to_string()
        };
        self.disks.refresh(true);
    }

    pub fn begin_edit(&mut self, field: EditField) {
        let buffer = match field {
            EditField::Root => String::new(),
            EditField::Folders => self.config.folder_patterns.to_list_string(),
            EditField::Files => self.config.file_patterns.to_list_string(),
        };
        self.editor = Some(Editor { field, buffer });
    }

    pub fn edit_input(&mut self, code: KeyCode) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        match code {
            KeyCode::Backspace => {
                editor.buffer.pop();
            }
            KeyCode::Char(c) => editor.buffer.push(c),
            _ => {}
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editor = None;
    }

    pub fn commit_edit(&mut self) {
        let Some(editor) = self.editor.take() else {
            return;
        };
        match editor.field {
            EditField::Root => self.add_root(&editor.buffer),
            EditField::Folders => {
                self.config.folder_patterns = PatternSet::parse_folders(&editor.buffer);
            }
            EditField::Files => {
                self.config.file_patterns = PatternSet::parse_extensions(&editor.buffer);
            }
        }
    }

    pub fn current_root(&self) -> Option<&PathBuf> {
        self.roots.get(self.root_cursor)
    }

    /// Disk holding the highlighted root: the one with the longest matching
    /// mount point.
    pub fn root_disk(&self) -> Option<&sysinfo::Disk> {
        let root = self.current_root()?;
        self.disks
            .list()
            .iter()
            .filter(|d| root.starts_with(d.mount_point()))
            .max_by_key(|d| d.mount_point().as_os_str().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowlist::Allowlist;
    use crate::model::{DeletionStatus, MatchKind};
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    fn test_app() -> App {
        App::new(
            vec![PathBuf::from("/tmp")],
            Config::default(),
            Scanner::new(Allowlist::default()),
        )
    }

    fn record(path: &str, size: u64) -> MatchRecord {
        MatchRecord {
            path: PathBuf::from(path),
            kind: MatchKind::File,
            matched_pattern: ".log".to_string(),
            size_bytes: size,
        }
    }

    fn sample_result() -> ScanResult {
        ScanResult {
            roots: vec![PathBuf::from("/tmp")],
            records: vec![record("/tmp/a.log", 10), record("/tmp/b.log", 20)],
            warnings: vec![],
        }
    }

    #[test]
    fn test_check_scan_status_updates() {
        let mut app = test_app();
        app.session.begin_scan().unwrap();

        // Create a channel to simulate scan updates
        let (tx, rx) = mpsc::channel();
        app.scan_rx = Some(rx);

        // 1. Send Progress Update
        tx.send(ScanUpdate::Progress(ScanProgress {
            dirs_visited: 5,
            matches_found: 2,
            current: PathBuf::from("/tmp/x"),
        }))
        .unwrap();

        app.check_scan_status();

        let progress = app.scan_progress.as_ref().expect("progress should be recorded");
        assert_eq!(progress.dirs_visited, 5);
        assert_eq!(app.phase(), Phase::Scanning);

        // 2. Send Result (Done)
        tx.send(ScanUpdate::Finished(Ok(sample_result()))).unwrap();

        app.check_scan_status();

        assert_eq!(app.phase(), Phase::Reviewing);
        assert_eq!(app.records().len(), 2);
        assert_eq!(app.table_state.selected(), Some(0));
        assert_eq!(app.session.aggregate_selected().size_bytes, 30);
        assert!(app.scan_rx.is_none());
    }

    #[test]
    fn cancelled_scan_keeps_previous_results() {
        let mut app = test_app();
        app.session.begin_scan().unwrap();
        app.session.apply_scan(sample_result()).unwrap();

        app.session.begin_scan().unwrap();
        let (tx, rx) = mpsc::channel();
        app.scan_rx = Some(rx);
        tx.send(ScanUpdate::Finished(Err(ScanError::Cancelled))).unwrap();
        app.check_scan_status();

        assert_eq!(app.phase(), Phase::Reviewing);
        assert_eq!(app.records().len(), 2);
        assert_eq!(app.status, "Scan cancelled");
    }

    #[test]
    fn cleaning_results_update_session_and_report() {
        let mut app = test_app();
        app.session.begin_scan().unwrap();
        app.session.apply_scan(sample_result()).unwrap();
        app.table_state.select(Some(1));
        app.session.request_delete().unwrap();
        let batch = app.session.begin_delete().unwrap();

        let (tx, rx) = mpsc::channel();
        app.cleaning_rx = Some(rx);
        tx.send(CleanUpdate::Progress { done: 1, total: 2 }).unwrap();
        tx.send(CleanUpdate::Finished(vec![
            DeletionOutcome {
                path: batch[0].path.clone(),
                kind: MatchKind::File,
                size_bytes: 10,
                status: DeletionStatus::Failed("busy".to_string()),
            },
            DeletionOutcome {
                path: batch[1].path.clone(),
                kind: MatchKind::File,
                size_bytes: 20,
                status: DeletionStatus::Deleted,
            },
        ]))
        .unwrap();

        app.check_cleaning_status();

        assert!(app.cleaning_rx.is_none());
        assert_eq!(app.clean_progress, (1, 2));
        assert_eq!(app.records().len(), 1);
        assert_eq!(app.table_state.selected(), Some(0));
        assert!(matches!(app.popup, Some(Popup::Report(ref r)) if r.failed_count() == 1));
        assert_eq!(app.status, "Deleted 1 items with 1 errors");
    }

    #[test]
    fn cursor_wraps() {
        let mut app = test_app();
        app.session.begin_scan().unwrap();
        app.session.apply_scan(sample_result()).unwrap();
        app.table_state.select(Some(0));

        app.previous();
        assert_eq!(app.table_state.selected(), Some(1));
        app.next();
        assert_eq!(app.table_state.selected(), Some(0));

        app.toggle();
        assert!(!app.session.is_selected(Path::new("/tmp/a.log")));
    }

    #[test]
    fn editing_patterns() {
        let mut app = test_app();
        app.begin_edit(EditField::Files);
        assert_eq!(
            app.editor.as_ref().map(|e| e.buffer.as_str()),
            Some(".pyc, .pyo, .DS_Store, .log, .tmp, .swp")
        );

        if let Some(editor) = app.editor.as_mut() {
            editor.buffer = "bak, .old".to_string();
        }
        app.commit_edit();
        assert!(app.editor.is_none());
        assert_eq!(
            app.config.file_patterns.iter().collect::<Vec<_>>(),
            vec![".bak", ".old"]
        );
    }

    #[test]
    fn empty_patterns_do_not_start_scan() {
        let mut app = test_app();
        app.config.folder_patterns = PatternSet::default();
        app.config.file_patterns = PatternSet::default();
        app.start_scan();
        assert_eq!(app.phase(), Phase::Idle);
        assert!(app.scan_rx.is_none());
    }

    #[test]
    fn late_scan_result_is_dropped_while_deleting() {
        let mut app = test_app();
        app.session.begin_scan().unwrap();
        app.session.apply_scan(sample_result()).unwrap();
        app.session.request_delete().unwrap();
        app.session.begin_delete().unwrap();

        let (tx, rx) = mpsc::channel();
        app.scan_rx = Some(rx);
        tx.send(ScanUpdate::Finished(Ok(ScanResult::empty("/tmp"))))
            .unwrap();
        app.check_scan_status();

        assert_eq!(app.phase(), Phase::Deleting);
        assert_eq!(app.records().len(), 2);
    }

    #[test]
    fn lost_cleaning_thread_triggers_rescan() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.log"), b"x")?;

        let mut app = App::new(
            vec![dir.path().to_path_buf()],
            Config::default(),
            Scanner::new(Allowlist::default()),
        );
        app.session.begin_scan()?;
        app.session.apply_scan(sample_result())?;
        app.session.request_delete()?;
        app.session.begin_delete()?;

        let (tx, rx) = mpsc::channel::<CleanUpdate>();
        app.cleaning_rx = Some(rx);
        drop(tx);
        app.check_cleaning_status();

        assert!(app.cleaning_rx.is_none());
        assert!(app.popup.is_none());
        assert_eq!(app.phase(), Phase::Scanning);
        assert!(app.status.contains("outcome unknown"));
        Ok(())
    }

    #[test]
    fn scan_roots_are_added_removed_and_cleared() -> Result<()> {
        let dir = tempdir()?;
        let a = fs::canonicalize(dir.path())?.join("a");
        let b = fs::canonicalize(dir.path())?.join("b");
        fs::create_dir_all(&a)?;
        fs::create_dir_all(&b)?;

        let mut app = App::new(Vec::new(), Config::default(), Scanner::new(Allowlist::default()));
        app.start_scan();
        assert_eq!(app.phase(), Phase::Idle);
        assert_eq!(app.status, "Add a folder to scan with [r]");

        app.add_root(&a.display().to_string());
        app.add_root(&format!("{}/../b", a.display()));
        assert_eq!(app.roots, vec![a.clone(), b.clone()]);
        assert_eq!(app.root_cursor, 1);

        app.add_root(&b.display().to_string());
        assert!(app.status.starts_with("Already added"));
        app.add_root(&dir.path().join("missing").display().to_string());
        assert!(app.status.starts_with("Not a folder"));
        assert_eq!(app.roots.len(), 2);

        app.next_root();
        assert_eq!(app.current_root(), Some(&a));
        app.remove_root();
        assert_eq!(app.roots, vec![b.clone()]);
        assert_eq!(app.root_cursor, 0);

        app.clear_roots();
        assert!(app.roots.is_empty());
        assert_eq!(app.current_root(), None);
        Ok(())
    }
}
