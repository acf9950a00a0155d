use crate::model::{MatchKind, MatchRecord};
use crate::session::Phase;
use crate::ui::app::{App, EditField, Popup};
use humansize::{BINARY, format_size};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, Wrap},
};
use std::fmt::Write as _;

const PATH_WIDTH: usize = 60;

pub fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let version = env!("CARGO_PKG_VERSION");
    let header_text = if let Some(disk) = app.root_disk() {
        let total = disk.total_space();
        let available = disk.available_space();
        let used = total.saturating_sub(available);
        let percent = if total > 0 {
            #[allow(clippy::cast_precision_loss)]
            {
                (used as f64 / total as f64) * 100.0
            }
        } else {
            0.0
        };

        format!(
            "tidydir v{version} | Disk: {} / {} ({percent:.1}% Used) | Free: {}",
            format_size(used, BINARY),
            format_size(total, BINARY),
            format_size(available, BINARY)
        )
    } else {
        format!("tidydir v{version} | Disk: N/A")
    };

    let title = Paragraph::new(header_text).block(Block::default().borders(Borders::ALL));
    f.render_widget(title, area);
}

pub fn render_settings(f: &mut Frame, app: &App, area: Rect) {
    let field = |label: &str, key: char, value: String| {
        vec![
            Line::from(vec![
                Span::styled(label.to_string(), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(format!(" [{key}]"), Style::default().fg(Color::DarkGray)),
            ]),
            Line::from(value),
            Line::from(""),
        ]
    };

    let mut lines = vec![Line::from(vec![
        Span::styled("Folders to scan", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            " [r] add [x] remove [X] clear [Tab] next",
            Style::default().fg(Color::DarkGray),
        ),
    ])];
    if app.roots.is_empty() {
        lines.push(Line::styled("(none)", Style::default().fg(Color::DarkGray)));
    }
    for (i, root) in app.roots.iter().enumerate() {
        let text = root.display().to_string();
        lines.push(if i == app.root_cursor {
            Line::styled(format!("> {text}"), Style::default().fg(Color::Yellow))
        } else {
            Line::from(format!("  {text}"))
        });
    }
    lines.push(Line::from(""));
    lines.extend(field(
        EditField::Folders.label(),
        'f',
        app.config.folder_patterns.to_list_string(),
    ));
    lines.extend(field(
        EditField::Files.label(),
        'e',
        app.config.file_patterns.to_list_string(),
    ));

    if let Some(result) = app.session.result()
        && !result.warnings.is_empty()
    {
        lines.push(Line::styled(
            format!("{} entries skipped (unreadable)", result.warnings.len()),
            Style::default().fg(Color::Yellow),
        ));
        for warning in result.warnings.iter().take(5) {
            lines.push(Line::from(format!(" - {}", warning.path.display())));
        }
    }

    let settings = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Settings"))
        .wrap(Wrap { trim: false });
    f.render_widget(settings, area);
}

pub fn render_results(f: &mut Frame, app: &mut App, area: Rect) {
    let rows: Vec<Row> = app
        .records()
        .iter()
        .map(|r| {
            let marker = if app.session.is_selected(&r.path) {
                Cell::from("✓ DEL").style(Style::default().fg(Color::Red))
            } else {
                Cell::from("  keep").style(Style::default().fg(Color::Green))
            };
            Row::new(vec![
                marker,
                Cell::from(r.kind.name()),
                Cell::from(display_path(app, r)),
                Cell::from(r.matched_pattern.clone()),
                Cell::from(format_size(r.size_bytes, BINARY)),
            ])
        })
        .collect();

    let title = app.session.result().map_or_else(
        || "Results".to_string(),
        |result| {
            format!(
                "Results: {} items, {}",
                result.total_count(),
                format_size(result.total_size_bytes(), BINARY)
            )
        },
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Min(20),
            Constraint::Length(14),
            Constraint::Length(11),
        ],
    )
    .header(
        Row::new(vec!["SEL", "TYPE", "PATH", "MATCH", "SIZE"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(title))
    .row_highlight_style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .fg(Color::Yellow),
    )
    .highlight_symbol("> ");
    f.render_stateful_widget(table, area, &mut app.table_state);
}

/// Path relative to its scan root (or to the root's parent when several
/// roots were scanned), shortened from the left to fit.
fn display_path(app: &App, record: &MatchRecord) -> String {
    let rel = app
        .session
        .result()
        .and_then(|result| {
            let root = result.root_of(&record.path)?;
            let base = if result.roots.len() > 1 {
                root.parent().unwrap_or(root)
            } else {
                root
            };
            record.path.strip_prefix(base).ok()
        })
        .unwrap_or(&record.path);
    let mut text = rel.display().to_string();
    if record.kind == MatchKind::Folder {
        text.push('/');
    }

    let chars = text.chars().count();
    if chars > PATH_WIDTH {
        let tail: String = text.chars().skip(chars - (PATH_WIDTH - 3)).collect();
        format!("...{tail}")
    } else {
        text
    }
}

pub fn render_scanning(f: &mut Frame, app: &App, area: Rect) {
    let mut text = format!("Scanning {} folder(s)...\n\n", app.roots.len());
    if let Some(progress) = &app.scan_progress {
        let _ = writeln!(text, "Folders visited: {}", progress.dirs_visited);
        let _ = writeln!(text, "Matches found:   {}", progress.matches_found);
        let _ = writeln!(text, "\n{}", progress.current.display());
    }
    text.push_str("\n[Esc] Cancel");

    let body = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Scanning"))
        .wrap(Wrap { trim: false });
    f.render_widget(body, area);
}

pub fn render_cleaning(f: &mut Frame, app: &App, area: Rect) {
    let (done, total) = app.clean_progress;
    let ratio = if total == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        {
            done as f64 / total as f64
        }
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Deleting"))
        .gauge_style(Style::default().fg(Color::Red))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(format!("{done}/{total}"));
    f.render_widget(gauge, area);
}

pub fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let agg = app.session.aggregate_selected();
    let keys = match app.phase() {
        _ if app.editor.is_some() => "[Enter] Apply [Esc] Cancel",
        Phase::Idle => "[s] Scan [r] Add folder [f] Folders [e] Files [?] Help [q] Quit",
        Phase::Scanning => "[Esc] Cancel scan",
        Phase::Reviewing => {
            "[Space] Toggle [a] All [n] None [d] Delete [s] Rescan [c] Clear [?] Help [q] Quit"
        }
        Phase::Confirming => "[y/Enter] Confirm [n/Esc] Cancel",
        Phase::Deleting => "Deleting... (This may take a while)",
    };
    let footer_text = format!(
        "{} | Selected: {} ({}) | {keys}",
        app.status,
        agg.count,
        format_size(agg.size_bytes, BINARY)
    );

    let footer = Paragraph::new(footer_text).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

pub fn render_popup(f: &mut Frame, app: &App) {
    if let Some(editor) = &app.editor {
        let area = centered_rect(70, 15, f.area());
        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(format!("{}_", editor.buffer)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(editor.field.label()),
            ),
            area,
        );
        return;
    }

    if app.phase() == Phase::Confirming {
        render_confirm(f, app);
        return;
    }

    match &app.popup {
        Some(Popup::Help) => {
            let area = centered_rect(60, 60, f.area());
            f.render_widget(Clear, area);
            f.render_widget(
                Paragraph::new(HELP_TEXT)
                    .block(Block::default().borders(Borders::ALL).title("Help"))
                    .wrap(Wrap { trim: false }),
                area,
            );
        }
        Some(Popup::Report(report)) => {
            let mut text = format!(
                "Deleted {} items, freed {}.\n",
                report.deleted_count(),
                format_size(report.freed_bytes(), BINARY)
            );
            if report.failed_count() > 0 {
                let _ = writeln!(
                    text,
                    "\n{} items could not be deleted and remain selected:",
                    report.failed_count()
                );
                for (outcome, reason) in report.failures().take(10) {
                    let _ = writeln!(
                        text,
                        " - {} {}: {reason}",
                        outcome.kind.name(),
                        outcome.path.display()
                    );
                }
            }
            text.push_str("\n[Press key to continue]");

            let area = centered_rect(60, 40, f.area());
            f.render_widget(Clear, area);
            f.render_widget(
                Paragraph::new(text)
                    .block(
                        Block::default()
                            .title("Clean Completed")
                            .borders(Borders::ALL),
                    )
                    .wrap(Wrap { trim: true }),
                area,
            );
        }
        None => {}
    }
}

fn render_confirm(f: &mut Frame, app: &App) {
    let selected = app.session.selected_records();
    let folders = selected.iter().filter(|r| r.kind == MatchKind::Folder).count();
    let files = selected.len() - folders;
    let total: u64 = selected.iter().map(|r| r.size_bytes).sum();

    let text = format!(
        "Folders: {folders}   Files: {files}\nTotal Size: {}\n\nThese actions cannot be undone.\n\n[y/Enter] DELETE EVERYTHING   [n/Esc] Cancel",
        format_size(total, BINARY)
    );

    let area = centered_rect(50, 30, f.area());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("PERMANENTLY DELETE?")
                    .border_style(Style::default().fg(Color::Red)),
            )
            .wrap(Wrap { trim: true }),
        area,
    );
}

const HELP_TEXT: &str = "\
1. Pick folders
   Press [r] and type a path to add it (~ is your home folder).
   [Tab] moves between added folders, [x] removes the highlighted
   one, [X] clears the list. Nested folders are scanned once.

2. Configure patterns
   [f] edits folder names to find, [e] edits file endings.
   Separate entries with commas.

3. Scan
   Press [s]. Matched folders are not searched further;
   their size includes everything inside them.

4. Review & delete
   Everything is selected after a scan. [Space] keeps an item,
   [a]/[n] select all or none, [d] deletes after confirmation.
   Items that fail to delete stay in the list.

[Esc] Close";

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
