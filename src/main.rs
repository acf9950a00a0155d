mod allowlist;
mod cleaner;
mod config;
mod constants;
mod error;
mod logging;
mod model;
mod paths;
mod patterns;
mod scanner;
mod session;
mod ui;

use allowlist::Allowlist;
use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use humansize::{BINARY, format_size};
use indicatif::{ProgressBar, ProgressStyle};
use model::{DeletionReport, ScanProgress};
use ratatui::prelude::*;
use scanner::{CancelFlag, Scanner};
use session::Session;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use ui::app::App;

#[derive(Parser)]
#[command(version, about, long_about = None, disable_version_flag = true)]
struct Cli {
    /// Folders to scan (defaults to the current directory)
    roots: Vec<PathBuf>,

    /// Comma-separated folder names to find, replacing the configured list
    #[arg(long, value_name = "LIST")]
    folders: Option<String>,

    /// Comma-separated file endings to find, replacing the configured list
    #[arg(long, value_name = "LIST")]
    files: Option<String>,

    /// Config file (defaults to <config dir>/tidydir/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log file (defaults to <cache dir>/tidydir/tidydir.log)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Scan once, print the matches and exit without deleting anything
    #[arg(long)]
    list: bool,

    /// With --list, permanently delete every match after printing it
    #[arg(long, requires = "list")]
    delete: bool,

    /// Print version information
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = cli.log_file.clone().unwrap_or_else(logging::default_log_path);
    if let Some(dir) = log_file.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create log directory {}", dir.display()))?;
    }
    let _guard = logging::init_logger(&log_file);

    let config = Config::load(cli.config.as_deref())?
        .with_overrides(cli.folders.as_deref(), cli.files.as_deref());
    let roots = if cli.roots.is_empty() {
        vec![std::env::current_dir().context("cannot determine current directory")?]
    } else {
        cli.roots.iter().map(|root| paths::resolve(root)).collect()
    };
    let scanner = Scanner::new(Allowlist::load());

    if cli.list {
        return list(&scanner, &roots, &config, cli.delete);
    }

    enable_raw_mode()?;
    let mut stderr = io::stderr();
    execute!(stderr, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stderr);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(roots, config, scanner);
    app.start_scan();

    let res = ui::run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

/// Headless scan: spinner on stderr, matches on stdout. With `delete`, every
/// match is then removed through the same session flow the TUI uses.
fn list(scanner: &Scanner, roots: &[PathBuf], config: &Config, delete: bool) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let cb = |p: &ScanProgress| {
        spinner.set_message(format!(
            "{} folders, {} matches | {}",
            p.dirs_visited,
            p.matches_found,
            p.current.display()
        ));
    };

    let result = scanner.scan_roots(
        roots,
        &config.folder_patterns,
        &config.file_patterns,
        &CancelFlag::new(),
        Some(&cb),
    );
    spinner.finish_and_clear();
    let result = result?;

    for record in &result.records {
        println!(
            "{:<6} {:>11}  {:<14} {}",
            record.kind.name(),
            format_size(record.size_bytes, BINARY),
            record.matched_pattern,
            record.path.display()
        );
    }
    for warning in &result.warnings {
        eprintln!("warning: {warning}");
    }
    println!(
        "{} items, {}",
        result.total_count(),
        format_size(result.total_size_bytes(), BINARY)
    );

    if delete && !result.is_empty() {
        let mut session = Session::new();
        session.begin_scan()?;
        session.apply_scan(result)?;
        session.request_delete()?;
        let report = DeletionReport::new(session.delete()?);

        for (outcome, reason) in report.failures() {
            eprintln!("failed: {}: {reason}", outcome.path.display());
        }
        println!(
            "deleted {} items, freed {}, {} failed",
            report.deleted_count(),
            format_size(report.freed_bytes(), BINARY),
            report.failed_count()
        );
    }

    Ok(())
}
