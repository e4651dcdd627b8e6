pub mod app;
pub mod components;

use crate::filter::Profile;
use crate::ui::app::{App, AppState};
use crate::ui::components::{
    render_cleaning, render_details, render_flags_list, render_footer, render_header,
    render_popup, render_preview,
};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
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

    match app.state {
        AppState::Preview => render_preview(f, app, chunks[1]),
        AppState::Cleaning => render_cleaning(f, app, chunks[1]),
        _ => {
            let main_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
                .split(chunks[1]);

            render_flags_list(f, app, main_chunks[0]);
            render_details(f, app, main_chunks[1]);
        }
    }

    render_footer(f, app, chunks[2]);
    render_popup(f, app);
}

fn handle_preview_key(app: &mut App, code: KeyCode) {
    let Some(preview) = app.preview.as_mut() else {
        app.state = AppState::Browsing;
        return;
    };
    if preview.editing_ext {
        match code {
            KeyCode::Char(c) if c != '.' => preview.ext.push(c),
            KeyCode::Backspace => {
                preview.ext.pop();
            }
            KeyCode::Esc => {
                preview.ext.clear();
                preview.editing_ext = false;
            }
            KeyCode::Enter => preview.editing_ext = false,
            _ => {}
        }
        preview.refilter();
        return;
    }
    match code {
        KeyCode::Down | KeyCode::Char('j') => preview.next(),
        KeyCode::Up | KeyCode::Char('k') => preview.previous(),
        KeyCode::Char('s') => preview.cycle_sort(),
        KeyCode::Char('e') => preview.editing_ext = true,
        KeyCode::Char('d') => {
            app.delete_previewed();
        }
        KeyCode::Enter => app.confirm(),
        KeyCode::Esc | KeyCode::Char('q') => app.close_preview(),
        _ => {}
    }
}

pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stderr>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        // One deletion step per frame keeps the stop key responsive
        let timeout = if let AppState::Cleaning = app.state {
            app.tick();
            Duration::from_millis(10)
        } else {
            Duration::from_millis(100)
        };

        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match app.state {
                AppState::Browsing => match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Down | KeyCode::Char('j') => app.next(),
                    KeyCode::Up | KeyCode::Char('k') => app.previous(),
                    KeyCode::Char(' ') => app.toggle(),
                    KeyCode::Char('1') => app.apply_profile(Profile::Quick),
                    KeyCode::Char('2') => app.apply_profile(Profile::Complete),
                    KeyCode::Char('3') => app.apply_profile(Profile::Selective),
                    KeyCode::Char('c') => app.clear_cache(),
                    KeyCode::Char('p') => app.open_preview(),
                    KeyCode::Enter => app.confirm(),
                    _ => {}
                },
                AppState::Preview => handle_preview_key(app, key.code),
                AppState::Confirming => match key.code {
                    KeyCode::Char('y') | KeyCode::Enter => app.start_clean(),
                    KeyCode::Char('n' | 'q') | KeyCode::Esc => {
                        app.state = if app.preview.is_some() {
                            AppState::Preview
                        } else {
                            AppState::Browsing
                        };
                    }
                    _ => {}
                },
                AppState::Cleaning => {
                    if let KeyCode::Esc | KeyCode::Char('q') = key.code {
                        app.request_stop();
                    }
                }
                AppState::Done(_) => match key.code {
                    KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ' | 'q') => {
                        app.state = AppState::Browsing;
                    }
                    _ => {}
                },
            }
        }
    }
}
