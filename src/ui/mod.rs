pub mod app;
pub mod components;

use crate::session::Phase;
use crate::ui::app::{App, EditField, Popup};
use crate::ui::components::{
    render_cleaning, render_footer, render_header, render_popup, render_results,
    render_scanning, render_settings,
};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::prelude::*;
use std::time::Duration;

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(chunks[1]);

    render_settings(f, app, main_chunks[0]);
    match app.phase() {
        Phase::Scanning => render_scanning(f, app, main_chunks[1]),
        Phase::Deleting => render_cleaning(f, app, main_chunks[1]),
        _ => render_results(f, app, main_chunks[1]),
    }

    render_footer(f, app, chunks[2]);
    render_popup(f, app);
}

pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stderr>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        // Check for async cleaning results
        if app.phase() == Phase::Deleting {
            app.check_cleaning_status();
        }

        // Check for scanning results
        if app.phase() == Phase::Scanning {
            app.check_scan_status();
        }

        // Event polling with timeout to allow UI updates during scanning and cleaning
        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && handle_key(app, key)
        {
            return Ok(());
        }
    }
}

/// Returns `true` when the user asked to quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if app.editor.is_some() {
        match key.code {
            KeyCode::Enter => app.commit_edit(),
            KeyCode::Esc => app.cancel_edit(),
            code => app.edit_input(code),
        }
        return false;
    }

    if app.popup.is_some() {
        if let KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ' | 'q' | '?') = key.code {
            app.popup = None;
        }
        return false;
    }

    match app.phase() {
        Phase::Idle | Phase::Reviewing => match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Down | KeyCode::Char('j') => app.next(),
            KeyCode::Up | KeyCode::Char('k') => app.previous(),
            KeyCode::Char(' ') => app.toggle(),
            KeyCode::Char('a') => app.select_all(),
            KeyCode::Char('n') => app.select_none(),
            KeyCode::Char('d') | KeyCode::Enter => app.request_delete(),
            KeyCode::Char('s') => app.start_scan(),
            KeyCode::Char('c') => app.clear_results(),
            KeyCode::Char('r') => app.begin_edit(EditField::Root),
            KeyCode::Char('x') => app.remove_root(),
            KeyCode::Char('X') => app.clear_roots(),
            KeyCode::Tab => app.next_root(),
            KeyCode::Char('f') => app.begin_edit(EditField::Folders),
            KeyCode::Char('e') => app.begin_edit(EditField::Files),
            KeyCode::Char('?') | KeyCode::F(1) => app.popup = Some(Popup::Help),
            _ => {}
        },
        Phase::Confirming => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => app.clean_selected(),
            KeyCode::Char('n' | 'q') | KeyCode::Esc => app.cancel_delete(),
            _ => {}
        },
        Phase::Scanning => {
            if let KeyCode::Esc = key.code {
                app.cancel_scan();
            }
        }
        Phase::Deleting => {
            // Deletion can't be interrupted safely; wait for it.
        }
    }
    false
}
