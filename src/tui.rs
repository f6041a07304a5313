use crate::config::{save_config, Config, Layout};
use crate::notify::{Reminder, ReminderGate};
use crate::presenter::{project, CountdownView};
use crate::resolver::{resolve, ResolvedState, TransitionMemory};
use crate::storage::Storage;
use anyhow::Result;
use chrono::{Duration, Local, NaiveDateTime};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::warn;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout as TuiLayout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration as StdDuration, Instant};

const REMINDER_DISPLAY_SECS: i64 = 30;

/// Everything one frame needs, computed fresh each tick from the stored
/// rules and the live clock.
struct TickFrame {
    view: CountdownView,
    status: Status,
    rule_name: Option<String>,
    layout: Layout,
    reminders_on: bool,
    reminder: Option<String>,
    now: NaiveDateTime,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Status {
    Working,
    OnBreak,
    Upcoming,
    Idle,
}

pub fn run_tui(
    storage: &Storage,
    mut config: Config,
    timeout: Option<StdDuration>,
) -> Result<()> {
    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_loop(&mut terminal, storage, &mut config, timeout);

    // restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{:?}", err)
    }

    Ok(())
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    storage: &Storage,
    config: &mut Config,
    timeout: Option<StdDuration>,
) -> Result<()> {
    let started = Instant::now();
    let mut memory = TransitionMemory::default();
    let mut gate = ReminderGate::default();
    let mut active_reminder: Option<(Reminder, NaiveDateTime)> = None;

    loop {
        // rules and clock are re-read every tick; edits from `workdown
        // rules …` in another shell show up within a second
        let now = Local::now().naive_local();
        let book = storage.load();
        let state = resolve(&book, now);
        let view = project(&state, now);

        if memory.observe(&state) {
            ring_bell();
        }
        if let Some(reminder) = gate.check(&state, now, config) {
            ring_bell();
            active_reminder = Some((reminder, now));
        }
        if let Some((_, shown_at)) = active_reminder {
            if now - shown_at > Duration::seconds(REMINDER_DISPLAY_SECS) {
                active_reminder = None;
            }
        }

        let frame = TickFrame {
            status: match &state {
                ResolvedState::During(_) if view.is_break => Status::OnBreak,
                ResolvedState::During(_) => Status::Working,
                ResolvedState::Upcoming(_) => Status::Upcoming,
                ResolvedState::None => Status::Idle,
            },
            rule_name: match &state {
                ResolvedState::During(r) | ResolvedState::Upcoming(r) => {
                    Some(r.rule.countdown_name().to_string())
                }
                ResolvedState::None => None,
            },
            view,
            layout: config.layout,
            reminders_on: config.break_reminders,
            reminder: active_reminder.as_ref().map(|(r, _)| r.message.clone()),
            now,
        };

        terminal.draw(|f| draw(f, &frame))?;

        if event::poll(StdDuration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Char('l') => {
                        config.layout = config.layout.toggled();
                        if let Err(err) = save_config(config) {
                            warn!("failed to persist layout: {}", err);
                        }
                    }
                    KeyCode::Char('n') => {
                        config.break_reminders = !config.break_reminders;
                        if let Err(err) = save_config(config) {
                            warn!("failed to persist reminder setting: {}", err);
                        }
                    }
                    _ => {}
                }
            }
        }

        if let Some(timeout) = timeout {
            if started.elapsed() >= timeout {
                return Ok(());
            }
        }
    }
}

fn ring_bell() {
    let _ = execute!(io::stdout(), crossterm::style::Print("\u{7}"));
}

fn draw(frame: &mut Frame, tick: &TickFrame) {
    let chunks = TuiLayout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(5), // Big countdown
            Constraint::Length(4), // Small countdown
            Constraint::Length(4), // Progress
            Constraint::Min(0),    // Reminder line
            Constraint::Length(3), // Footer
        ])
        .split(frame.size());

    draw_header(frame, chunks[0], tick);
    draw_countdowns(frame, chunks[1], chunks[2], tick);
    draw_progress(frame, chunks[3], tick);
    draw_reminder(frame, chunks[4], tick);
    draw_footer(frame, chunks[5], tick);
}

fn status_span(tick: &TickFrame) -> Span<'static> {
    match tick.status {
        Status::Working => Span::styled(
            "WORKING",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Status::OnBreak => Span::styled(
            "ON BREAK",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Status::Upcoming => Span::styled(
            "UPCOMING",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Status::Idle => Span::styled(
            "NO SCHEDULE",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
    }
}

fn draw_header(frame: &mut Frame, area: Rect, tick: &TickFrame) {
    let mut spans = vec![
        Span::styled(
            " Workdown ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        status_span(tick),
        Span::raw(" | "),
        Span::raw(tick.now.format("%Y-%m-%d %H:%M:%S").to_string()),
    ];
    if let Some(name) = &tick.rule_name {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            name.clone(),
            Style::default().fg(Color::Magenta),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn draw_countdowns(frame: &mut Frame, big_area: Rect, small_area: Rect, tick: &TickFrame) {
    let view = &tick.view;
    // the layout preference only swaps which value is rendered large; the
    // presenter always supplies both
    let (big_text, big_label, small_text, small_label) = match tick.layout {
        Layout::BigTotal => (
            &view.total_text,
            &view.total_label,
            &view.part_text,
            &view.part_label,
        ),
        Layout::BigBreak => (
            &view.part_text,
            &view.part_label,
            &view.total_text,
            &view.total_label,
        ),
    };

    let big_color = if view.is_break {
        Color::Yellow
    } else {
        Color::Green
    };

    let big = Paragraph::new(vec![
        Line::from(Span::styled(
            big_text.clone(),
            Style::default().fg(big_color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::raw(big_label.clone())),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(big, big_area);

    let small = Paragraph::new(vec![
        Line::from(Span::styled(
            small_text.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            small_label.clone(),
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(small, small_area);
}

fn draw_progress(frame: &mut Frame, area: Rect, tick: &TickFrame) {
    let view = &tick.view;
    let chunks = TuiLayout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(1)])
        .split(area);

    let gauge_color = if view.is_break {
        Color::Yellow
    } else {
        Color::Green
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Progress "))
        .gauge_style(Style::default().fg(gauge_color))
        .ratio((view.progress_pct / 100.0).clamp(0.0, 1.0))
        .label(format!("{:.0}%", view.progress_pct));
    frame.render_widget(gauge, chunks[0]);

    let bounds = Paragraph::new(Line::from(vec![
        Span::raw(format!(" {}", view.window_start_text)),
        Span::raw(" — Now — "),
        Span::raw(view.window_end_text.clone()),
    ]))
    .alignment(Alignment::Center);
    frame.render_widget(bounds, chunks[1]);
}

fn draw_reminder(frame: &mut Frame, area: Rect, tick: &TickFrame) {
    if area.height == 0 {
        return;
    }
    let line = match &tick.reminder {
        Some(message) => Line::from(Span::styled(
            format!("  {}", message),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        None => Line::raw(""),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_footer(frame: &mut Frame, area: Rect, tick: &TickFrame) {
    let reminders = if tick.reminders_on { "on" } else { "off" };
    let help = Paragraph::new(format!(
        "Press 'q' to quit | 'l' to swap layout | 'n' reminders ({})",
        reminders
    ))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Center);
    frame.render_widget(help, area);
}
