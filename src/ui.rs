use crate::{
    app::{App, SettingsField, ThemeField, View},
    theme::{self, Side},
    timer::Mode,
};
use ratatui::{prelude::*, widgets::*};

pub fn render(f: &mut Frame, app: &App) {
    match app.view {
        View::Timer => render_timer(f, app),
        View::Help => render_help(f, app),
        View::Settings => render_settings(f, app),
        View::History => render_history(f, app),
        View::Insights => render_insights(f, app),
        View::Theme => render_theme(f, app),
    }
}

fn panel(title: &str, app: &App) -> Block<'static> {
    Block::default()
        .title(format!(" {title} "))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(app.accent()))
}

fn heading(text: &str, app: &App) -> Line<'static> {
    Line::from(Span::styled(
        text.to_owned(),
        Style::default().fg(app.accent()).add_modifier(Modifier::BOLD),
    ))
}

fn hint(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_owned(),
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    ))
}

fn render_timer(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(4)])
        .split(f.size());

    let mode = app.timer.mode();
    let accent = app.accent();

    f.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(accent))
            .title(Span::styled(" KESHI MODE ", Style::default().fg(accent).add_modifier(Modifier::BOLD))),
        chunks[0],
    );

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(14), Constraint::Min(20), Constraint::Length(14)])
        .split(chunks[1]);
    render_decor(f, app, Side::Left, columns[0]);
    render_decor(f, app, Side::Right, columns[2]);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(15),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(columns[1]);

    let label: Vec<Span> = mode
        .label()
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let style = if i % 2 == 0 {
                Style::default().fg(Color::Black).bg(Color::Rgb(0xf2, 0xef, 0xe9))
            } else {
                Style::default().fg(Color::White).bg(accent)
            };
            Span::styled(format!(" {c} "), style.add_modifier(Modifier::BOLD))
        })
        .collect();
    f.render_widget(Paragraph::new(Line::from(label)).alignment(Alignment::Center), sections[1]);
    f.render_widget(
        Paragraph::new(hint("press m to switch")).alignment(Alignment::Center),
        sections[2],
    );

    f.render_widget(
        Paragraph::new(vec![Line::from(""), Line::from(app.timer.display())])
            .style(Style::default().fg(accent).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        sections[4],
    );

    f.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded))
            .gauge_style(Style::default().fg(accent).bg(Color::Black))
            .ratio(app.timer.progress()),
        sections[6],
    );

    let (status, color) = if app.timer.is_running() {
        ("▶ RUNNING", Color::Green)
    } else {
        ("⏸ PAUSED", Color::Yellow)
    };
    f.render_widget(
        Paragraph::new(status)
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        sections[8],
    );

    f.render_widget(
        Paragraph::new(Span::styled(
            mode.quote(),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center),
        sections[10],
    );

    let mut footer = vec![
        Line::from(vec![
            span_key("Space", app),
            Span::raw(if app.timer.is_running() { " Pause  •  " } else { " Start  •  " }),
            span_key("R", app),
            Span::raw(" Reset  •  "),
            span_key("M", app),
            Span::raw(" Switch  •  "),
            span_key("S", app),
            Span::raw(" Settings  •  "),
            span_key("H", app),
            Span::raw(" History  •  "),
            span_key("I", app),
            Span::raw(" Insights  •  "),
            span_key("C", app),
            Span::raw(" Theme  •  "),
            span_key("Q", app),
            Span::raw(" Quit"),
        ]),
        radio_line(app),
    ];
    if let Some(status) = &app.status {
        footer.push(Line::from(Span::styled(status.clone(), Style::default().fg(Color::Gray))));
    }
    f.render_widget(
        Paragraph::new(footer).alignment(Alignment::Center).style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );
}

fn render_decor(f: &mut Frame, app: &App, side: Side, area: Rect) {
    let Some(image) = app.theme.image(side) else {
        return;
    };
    let kib = theme::image_size(image) / 1024;
    let pattern = if side == Side::Left { "▚▞" } else { "▞▚" };
    let mut lines = vec![Line::from("")];
    for _ in 0..area.height.saturating_sub(4) / 2 {
        lines.push(Line::from(Span::styled(pattern.repeat(4), Style::default().fg(app.accent()))));
    }
    lines.push(hint(&format!("{kib} KiB")));
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn radio_line(app: &App) -> Line<'static> {
    let station = app.radio.station();
    let mut spans = vec![
        span_key("A", app),
        Span::raw(if app.radio.is_playing() { " Radio off  •  " } else { " Radio on  •  " }),
        span_key("N", app),
        Span::raw(" Next  •  "),
        span_key("+/-", app),
        Span::raw(" Vol  •  "),
        span_key("X", app),
        Span::raw(" Mute  "),
        Span::styled(
            format!(
                "♪ {} {} {}",
                station.short_name,
                if app.radio.is_playing() { "ON AIR" } else { "OFF" },
                if app.radio.is_muted() { "muted".to_owned() } else { format!("{}%", app.radio.volume()) }
            ),
            Style::default().fg(app.accent()),
        ),
    ];
    if app.radio.show_tooltip() {
        spans.push(Span::styled(
            "  ← press a for ambient radio",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ));
    }
    Line::from(spans)
}

fn span_key(text: &str, app: &App) -> Span<'static> {
    Span::styled(text.to_owned(), Style::default().fg(app.accent()).add_modifier(Modifier::BOLD))
}

fn help_line(key: &str, desc: &str) -> Line<'static> {
    Line::from(vec![
        Span::raw("    "),
        Span::styled(key.to_owned(), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(format!("  {desc}")),
    ])
}

fn render_help(f: &mut Frame, app: &App) {
    let area = centered_rect(70, 85, f.size());
    let lines = vec![
        Line::from(""),
        heading("KEYBOARD SHORTCUTS", app),
        Line::from(""),
        Line::from("  Timer:"),
        help_line("Space", "Start / pause"),
        help_line("R", "Reset current countdown"),
        help_line("M", "Switch between focus and relax"),
        Line::from(""),
        Line::from("  Views:"),
        help_line("S", "Settings"),
        help_line("H", "Session history"),
        help_line("I", "Insights"),
        help_line("C", "Theme colors and decor"),
        help_line("?", "This help"),
        Line::from(""),
        Line::from("  Radio:"),
        help_line("A", "Toggle ambient radio"),
        help_line("N", "Next station"),
        help_line("+/-", "Radio volume"),
        help_line("X", "Mute / unmute radio"),
        Line::from(""),
        help_line("Q/Esc", "Back / quit"),
    ];
    f.render_widget(Paragraph::new(lines).block(panel("Help", app)), area);
}

fn render_settings(f: &mut Frame, app: &App) {
    let area = centered_rect(70, 70, f.size());
    let settings = app.timer.settings();

    let mut lines = vec![
        Line::from(""),
        heading("SETTINGS", app),
        Line::from(""),
        hint("  ↑↓/jk: Navigate  •  Enter: Edit  •  Space: Toggle  •  Esc: Back"),
        Line::from(""),
    ];

    for field in SettingsField::ALL {
        let (label, value) = match field {
            SettingsField::FocusDuration => ("Focus Duration", format!("{} min", settings.focus_minutes)),
            SettingsField::BreakDuration => ("Break Duration", format!("{} min", settings.break_minutes)),
            SettingsField::Sound => ("Sound", if settings.sound_enabled { "ON" } else { "OFF" }.into()),
        };
        push_field(&mut lines, app, app.settings_field == field, label, value);
    }

    if app.timer.is_running() {
        lines.push(Line::from(""));
        lines.push(hint("  Duration changes apply after the running countdown."));
    }
    push_status(&mut lines, app);

    f.render_widget(Paragraph::new(lines).block(panel("Settings", app)), area);
}

fn render_theme(f: &mut Frame, app: &App) {
    let area = centered_rect(70, 80, f.size());
    let colors = app.theme.colors();
    let image_label = |side| match app.theme.image(side) {
        Some(data) => format!("{} KiB", theme::image_size(data) / 1024),
        None => "default".to_owned(),
    };

    let mut lines = vec![
        Line::from(""),
        heading("THEME", app),
        Line::from(""),
        hint("  Enter: Edit (#rrggbb or image path)  •  ←→: Presets  •  x: Clear image  •  Esc: Back"),
        Line::from(""),
    ];

    for field in ThemeField::ALL {
        let (label, value) = match field {
            ThemeField::FocusColor => ("Focus Accent", color_label(&colors.focus)),
            ThemeField::BreakColor => ("Relax Accent", color_label(&colors.break_)),
            ThemeField::LeftImage => ("Left Decor", image_label(Side::Left)),
            ThemeField::RightImage => ("Right Decor", image_label(Side::Right)),
            ThemeField::Reset => ("Reset to Defaults", String::new()),
        };
        push_field(&mut lines, app, app.theme_field == field, label, value);

        let swatch = match field {
            ThemeField::FocusColor => Some(app.theme.accent(Mode::Focus)),
            ThemeField::BreakColor => Some(app.theme.accent(Mode::Break)),
            _ => None,
        };
        if let (Some(color), false) = (swatch, app.editing && app.theme_field == field) {
            lines.push(Line::from(vec![Span::raw("    "), Span::styled("██████", Style::default().fg(color))]));
        }
    }
    push_status(&mut lines, app);

    f.render_widget(Paragraph::new(lines).block(panel("Theme", app)), area);
}

fn color_label(value: &str) -> String {
    match theme::preset_named(value) {
        Some(preset) => format!("{value} ({})", preset.name),
        None => value.to_owned(),
    }
}

fn push_field(lines: &mut Vec<Line<'static>>, app: &App, selected: bool, label: &str, value: String) {
    lines.push(Line::from(""));

    if selected && app.editing {
        let edit = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
        lines.push(Line::from(vec![Span::styled("  > ", edit), Span::styled(label.to_owned(), edit)]));
        lines.push(Line::from(vec![
            Span::raw("    "),
            Span::styled(app.input.clone(), Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::styled("█", Style::default().fg(Color::Green)),
        ]));
        return;
    }

    let (prefix, label_style, value_style) = if selected {
        (
            "  > ",
            Style::default().fg(app.accent()).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )
    } else {
        ("    ", Style::default().fg(Color::Gray), Style::default().fg(Color::DarkGray))
    };
    lines.push(Line::from(vec![Span::styled(prefix, label_style), Span::styled(label.to_owned(), label_style)]));
    if !value.is_empty() {
        lines.push(Line::from(vec![Span::raw("    "), Span::styled(value, value_style)]));
    }
}

fn push_status(lines: &mut Vec<Line<'static>>, app: &App) {
    lines.push(Line::from(""));
    match &app.status {
        Some(msg) => lines.push(Line::from(Span::styled(format!("  {msg}"), Style::default().fg(Color::Red)))),
        None => lines.push(Line::from(Span::styled(
            "  Auto-saved",
            Style::default().fg(Color::Green).add_modifier(Modifier::ITALIC),
        ))),
    }
}

fn render_history(f: &mut Frame, app: &App) {
    let area = centered_rect(75, 85, f.size());
    let sessions = app.timer.history().sessions();

    let mut lines = vec![
        Line::from(""),
        heading("SESSION HISTORY", app),
        Line::from(""),
        hint("  c: Clear  •  i: Insights  •  Esc: Back"),
        Line::from(""),
    ];

    if app.confirming_clear {
        lines.push(Line::from(Span::styled(
            format!("  Clear all {} sessions? (y/n)", sessions.len()),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));
    }

    if sessions.is_empty() {
        lines.push(Line::from(Span::styled("  No sessions yet!", Style::default().fg(Color::DarkGray))));
    } else {
        let visible = area.height.saturating_sub(8) as usize;
        for s in sessions.iter().take(visible) {
            let color = app.theme.accent(s.mode);
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled("●", Style::default().fg(color)),
                Span::raw(" "),
                Span::styled(s.date.clone(), Style::default().fg(Color::Gray)),
                Span::raw(" • "),
                Span::styled(s.mode.name(), Style::default().fg(Color::White)),
                Span::raw(" • "),
                Span::styled(format!("{}m", s.duration), Style::default().fg(Color::Cyan)),
            ]));
        }
        if sessions.len() > visible {
            lines.push(hint(&format!("  … and {} more", sessions.len() - visible)));
        }
    }

    f.render_widget(Paragraph::new(lines).block(panel("History", app)), area);
}

fn stat_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("     {label}: ")),
        Span::styled(value, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
    ])
}

fn render_insights(f: &mut Frame, app: &App) {
    let area = centered_rect(70, 70, f.size());
    let insights = app.insights();

    let lines = vec![
        Line::from(""),
        heading("INSIGHTS", app),
        hint("  Performance report"),
        Line::from(""),
        stat_line("Total focus", insights.focus_total()),
        stat_line("Sessions", insights.focus_sessions.to_string()),
        stat_line("Peak time", insights.peak_time.map_or("TBD", |p| p.label()).to_owned()),
        stat_line(
            "Streak",
            match insights.streak_days {
                0 => "N/A".to_owned(),
                1 => "1 day".to_owned(),
                n => format!("{n} days"),
            },
        ),
        stat_line("Vibe", insights.vibe.label().to_owned()),
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            format!("  \"{}\"", insights.message),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )),
    ];

    f.render_widget(Paragraph::new(lines).block(panel("Insights", app)), area);
}

fn centered_rect(w: u16, h: u16, r: Rect) -> Rect {
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h) / 2),
            Constraint::Percentage(h),
            Constraint::Percentage((100 - h) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w) / 2),
            Constraint::Percentage(w),
            Constraint::Percentage((100 - w) / 2),
        ])
        .split(v[1])[1]
}
