use crate::filter::Flag;
use crate::model::Category;
use crate::ui::app::{App, AppState};
use humansize::{BINARY, format_size};
use ratatui::{
    prelude::*,
    widgets::{BarChart, Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap},
};
use std::fmt::Write as _;

pub fn render_header(f: &mut Frame, app: &App, area: Rect) {
    // The disk holding the ux0 volume, by longest matching mount point
    let disk_info = app.storage.volumes().get("ux0").and_then(|root| {
        app.disks
            .list()
            .iter()
            .filter(|d| root.starts_with(d.mount_point()))
            .max_by_key(|d| d.mount_point().as_os_str().len())
    });

    let header_text = if let Some(disk) = disk_info {
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
            "vitasweep v{} | ux0: {} / {} ({percent:.1}% Used)",
            env!("CARGO_PKG_VERSION"),
            format_size(used, BINARY),
            format_size(total, BINARY)
        )
    } else {
        format!("vitasweep v{} | ux0: N/A", env!("CARGO_PKG_VERSION"))
    };

    let title = Paragraph::new(header_text).block(Block::default().borders(Borders::ALL));
    f.render_widget(title, area);
}

pub fn render_flags_list(f: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = Flag::ALL
        .iter()
        .map(|flag| {
            let checkbox = if app.session.selection.get(*flag) {
                "[x]"
            } else {
                "[ ]"
            };
            ListItem::new(format!("{checkbox} {}", flag.label()))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Selection"))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Yellow),
        )
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut app.list_state);
}

fn short_label(category: Category) -> &'static str {
    match category {
        Category::System => "System",
        Category::VitaShell => "VShell",
        Category::Pkgi => "PKGi",
        Category::RetroArch => "Retro",
        Category::Adrenaline => "Adren",
        Category::Browser => "Browser",
        Category::CrashDumps => "Dumps",
        Category::Packages => "Pkgs",
        Category::Other => "Other",
    }
}

pub fn render_usage_chart(f: &mut Frame, app: &App, area: Rect) {
    let mut short_data: Vec<(&str, u64)> = app
        .report
        .by_category
        .iter()
        .map(|(category, size)| (short_label(*category), size / 1024))
        .collect();
    if app.report.orphans > 0 {
        short_data.push(("Orphans", app.report.orphans / 1024));
    }

    let barchart = BarChart::default()
        .block(Block::default().title("Reclaimable (KiB)").borders(Borders::ALL))
        .data(&short_data)
        .bar_width(7)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::White).bg(Color::Cyan));

    f.render_widget(barchart, area);
}

pub fn render_details_text(f: &mut Frame, app: &App, area: Rect) {
    let mut details_text = String::new();
    for (category, size) in &app.report.by_category {
        let _ = writeln!(
            details_text,
            " - {:<24} {:>10}",
            category.name(),
            format_size(*size, BINARY)
        );
    }
    if app.session.selection.orphan_sweep {
        let _ = writeln!(
            details_text,
            " - {:<24} {:>10}",
            "Orphaned App Data",
            format_size(app.report.orphans, BINARY)
        );
    }
    if app.report.by_category.is_empty() && app.report.orphans == 0 {
        details_text.push_str("Nothing to clean.\n");
    }
    let _ = write!(
        details_text,
        "\nTotal: {}{}\nCompleted cleanups: {}",
        format_size(app.report.total, BINARY),
        if app.report.from_cache { " (cached)" } else { "" },
        app.cleanups
    );

    let details = Paragraph::new(details_text)
        .block(Block::default().borders(Borders::ALL).title("Details"))
        .wrap(Wrap { trim: false });
    f.render_widget(details, area);
}

pub fn render_details(f: &mut Frame, app: &App, area: Rect) {
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_usage_chart(f, app, right_chunks[0]);
    render_details_text(f, app, right_chunks[1]);
}

pub fn render_preview(f: &mut Frame, app: &mut App, area: Rect) {
    let Some(preview) = app.preview.as_mut() else {
        return;
    };
    let items: Vec<ListItem> = preview
        .visible
        .iter()
        .filter_map(|&i| preview.list.get(i))
        .map(|record| {
            ListItem::new(format!(
                "{:>10}  {}",
                format_size(record.size, BINARY),
                record.path
            ))
        })
        .collect();

    let filter = if preview.ext.is_empty() && !preview.editing_ext {
        String::new()
    } else {
        format!(" | ext: .{}{}", preview.ext, if preview.editing_ext { "_" } else { "" })
    };
    let title = format!(
        "Preview: {} files, {} | sort: {:?}{filter}",
        preview.visible.len(),
        format_size(preview.visible_total, BINARY),
        preview.sort
    );

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Yellow),
        )
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut preview.list_state);
}

pub fn render_cleaning(f: &mut Frame, app: &App, area: Rect) {
    let Some((completed, total, label)) = app.progress() else {
        return;
    };
    let ratio = if total > 0 {
        #[allow(clippy::cast_precision_loss)]
        {
            completed as f64 / total as f64
        }
    } else {
        1.0
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Cleaning"))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(format!("{completed}/{total}  {label}"));
    f.render_widget(gauge, area);
}

pub fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let total = format_size(app.report.total, BINARY);
    let footer_text = match app.state {
        AppState::Browsing => format!(
            "Reclaimable: {total} | [Space] Toggle [1/2/3] Quick/Complete/Selective [p] Preview [c] Rescan [Enter] Clean [q] Quit"
        ),
        AppState::Preview => {
            "[s] Sort [e] Extension [d] Delete file [Enter] Clean all [Esc] Back".to_string()
        }
        AppState::Confirming => format!(
            "CONFIRM CLEAN? About {total} | [y/Enter] Confirm [n/Esc] Cancel"
        ),
        AppState::Cleaning => "Cleaning... [Esc] Stop after the current step".to_string(),
        AppState::Done(_) => "Done! [Press key to continue]".to_string(),
    };

    let footer = Paragraph::new(footer_text).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

pub fn render_popup(f: &mut Frame, app: &App) {
    if let AppState::Done(ref msg) = app.state {
        let block = Block::default()
            .title("Clean Completed")
            .borders(Borders::ALL);
        let area = centered_rect(60, 20, f.area());
        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(msg.clone())
                .block(block)
                .wrap(Wrap { trim: true }),
            area,
        );
    }
}

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
