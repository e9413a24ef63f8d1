mod app;
mod event;
mod ui;

use std::fs;
use std::io;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use env_logger::Env;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget, Wrap};

use quizr::config::{Backend, Config};
use quizr::session::timer::format_clock;
use quizr::wizard::WizardStep;

use app::{App, AppScreen, SETTINGS_FIELDS, TestOverlay};
use event::{AppEvent, EventHandler};
use ui::components::history_table::HistoryTable;
use ui::components::progress_bar::ProgressBar;
use ui::components::question_card::QuestionCard;
use ui::components::question_nav::QuestionNav;
use ui::components::result_card::ResultCard;
use ui::components::wizard::WizardView;
use ui::layout::{TestLayout, centered_rect, centered_rect_min, pack_hint_lines};
use ui::theme::Theme;

#[derive(Parser)]
#[command(name = "quizr", version, about = "Terminal quiz runner with timed multiple-choice tests")]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(long, help = "Base URL of the quiz API")]
    api_url: Option<String>,

    #[arg(long, help = "Use the built-in questions and store results locally")]
    offline: bool,

    #[arg(short, long, help = "Default test duration in minutes")]
    duration: Option<u32>,

    #[arg(short, long, help = "Default number of questions")]
    questions: Option<usize>,
}

/// The terminal is in raw mode while the app runs, so log records go to a
/// file under the data directory instead of stderr.
fn init_logging() {
    let Some(dir) = dirs::data_dir().map(|d| d.join("quizr")) else {
        return;
    };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("quizr.log"))
    else {
        return;
    };
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let mut config = Config::load().unwrap_or_else(|e| {
        log::warn!("config unreadable, using defaults: {e:#}");
        Config::default()
    });
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if cli.offline {
        config.backend = Backend::Local;
    }
    if let Some(minutes) = cli.duration {
        config.duration_minutes = minutes;
    }
    if let Some(count) = cli.questions {
        config.question_count = count;
    }
    config.validate(&Theme::available_themes());

    let theme: &'static Theme = Box::leak(Box::new(Theme::load(&config.theme).unwrap_or_default()));
    let (source, store) = app::build_backends(&config)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(100));
    let mut app = App::new(config, theme, source, store, events.sender());
    log::info!("quizr started ({} backend)", app.config.backend);

    let result = run_app(&mut terminal, &mut app, &events);

    // Stop the ticker before the terminal is restored.
    app.session = None;
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        log::error!("fatal: {err:?}");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Second { session_id } => app.on_second(session_id),
            AppEvent::Response(response) => app.handle_response(response),
            AppEvent::Tick | AppEvent::Resize(_, _) => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.screen {
        AppScreen::Menu => handle_menu_key(app, key),
        AppScreen::Wizard => handle_wizard_key(app, key),
        AppScreen::Loading => {
            if key.code == KeyCode::Esc {
                app.cancel_loading();
            }
        }
        AppScreen::Test => handle_test_key(app, key),
        AppScreen::TestResult => handle_result_key(app, key),
        AppScreen::History => handle_history_key(app, key),
        AppScreen::Settings => handle_settings_key(app, key),
    }
}

fn handle_menu_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.menu.prev(),
        KeyCode::Down | KeyCode::Char('j') => app.menu.next(),
        KeyCode::Enter => {
            let action = app.menu.selected_action();
            app.run_menu_action(action);
        }
        KeyCode::Char(ch) => {
            if let Some(action) = app.menu.action_for_key(ch) {
                app.run_menu_action(action);
            }
        }
        _ => {}
    }
}

fn handle_wizard_key(app: &mut App, key: KeyEvent) {
    if app.wizard.step == WizardStep::Student {
        match key.code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                app.wizard_move(true)
            }
            _ => app.wizard_student_key(key),
        }
        return;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Backspace => app.wizard_back(),
        KeyCode::Up | KeyCode::Char('k') => app.wizard_move(false),
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => app.wizard_move(true),
        KeyCode::Left | KeyCode::Char('h') => app.wizard_adjust(false),
        KeyCode::Right | KeyCode::Char('l') => app.wizard_adjust(true),
        KeyCode::Enter | KeyCode::Char(' ') => app.wizard_confirm(),
        _ => {}
    }
}

fn handle_test_key(app: &mut App, key: KeyEvent) {
    match app.overlay {
        TestOverlay::Jump(_) => {
            app.jump_key(key);
            return;
        }
        TestOverlay::ConfirmFinish => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Enter => app.confirm_finish(),
                KeyCode::Char('n') | KeyCode::Esc => app.overlay = TestOverlay::None,
                _ => {}
            }
            return;
        }
        TestOverlay::ConfirmAbandon => {
            match key.code {
                KeyCode::Char('y') => app.confirm_abandon(),
                KeyCode::Char('n') | KeyCode::Esc => app.overlay = TestOverlay::None,
                _ => {}
            }
            return;
        }
        TestOverlay::None => {}
    }

    match key.code {
        KeyCode::Esc => app.request_abandon(),
        KeyCode::Up | KeyCode::Char('k') => app.move_option_cursor(false),
        KeyCode::Down | KeyCode::Char('j') => app.move_option_cursor(true),
        KeyCode::Enter | KeyCode::Char(' ') => app.choose_option(None),
        KeyCode::Char(ch @ '1'..='9') => {
            let idx = ch as usize - '1' as usize;
            app.choose_option(Some(idx));
        }
        KeyCode::Left | KeyCode::Char('h') => app.previous_question(),
        KeyCode::Right | KeyCode::Char('l') => app.next_question(),
        KeyCode::Char(':') => app.open_jump(),
        KeyCode::Char('f') => app.request_finish(),
        _ => {}
    }
}

fn handle_result_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('m') => {
            app.go_to_menu()
        }
        KeyCode::Char('n') => app.open_wizard(),
        KeyCode::Char('h') => app.go_to_history(),
        _ => {}
    }
}

fn handle_history_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.go_to_menu(),
        KeyCode::Down | KeyCode::Char('j') => {
            if !app.history.is_empty() {
                app.history_selected = (app.history_selected + 1).min(app.history.len() - 1);
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.history_selected = app.history_selected.saturating_sub(1);
        }
        KeyCode::Char('r') => app.request_history(),
        _ => {}
    }
}

fn handle_settings_key(app: &mut App, key: KeyEvent) {
    if app.settings_editing.is_some() {
        app.settings_edit_key(key);
        return;
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.leave_settings(),
        KeyCode::Up | KeyCode::Char('k') => {
            app.settings_selected = app.settings_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.settings_selected = (app.settings_selected + 1).min(SETTINGS_FIELDS - 1);
        }
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => app.settings_cycle_forward(),
        KeyCode::Left | KeyCode::Char('h') => app.settings_cycle_backward(),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Menu => render_menu(frame, app),
        AppScreen::Wizard => render_wizard(frame, app),
        AppScreen::Loading => render_loading(frame, app),
        AppScreen::Test => render_test(frame, app),
        AppScreen::TestResult => render_result(frame, app),
        AppScreen::History => render_history(frame, app),
        AppScreen::Settings => render_settings(frame, app),
    }
}

fn render_menu(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let student = if app.config.student_name.is_empty() {
        String::new()
    } else {
        format!(" | {}", app.config.student_name)
    };
    let header_info = format!(" {} backend{student}", app.config.backend);
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " quizr ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            header_info,
            Style::default().fg(colors.muted()).bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, layout[0]);

    let menu_area = centered_rect(50, 80, layout[1]);
    frame.render_widget(&app.menu, menu_area);

    let footer = Paragraph::new(Line::from(Span::styled(
        " [1] Start  [h] History  [c] Settings  [q] Quit ",
        Style::default().fg(colors.muted()),
    )));
    frame.render_widget(footer, layout[2]);
}

fn render_wizard(frame: &mut ratatui::Frame, app: &App) {
    let area = centered_rect(70, 70, frame.area());
    frame.render_widget(WizardView::new(&app.wizard, app.theme), area);
}

fn render_loading(frame: &mut ratatui::Frame, app: &App) {
    let colors = &app.theme.colors;
    let area = centered_rect_min(40, 20, 40, 5, frame.area());
    let block = Block::bordered()
        .border_style(Style::default().fg(colors.accent()))
        .style(Style::default().bg(colors.bg()));
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Preparing your test...",
            Style::default().fg(colors.fg()),
        )),
        Line::from(Span::styled("[Esc] Cancel", Style::default().fg(colors.muted()))),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block),
        area,
    );
}

fn render_test(frame: &mut ratatui::Frame, app: &App) {
    let Some(session) = app.session.as_ref() else {
        return;
    };
    let area = frame.area();
    let colors = &app.theme.colors;
    let layout = TestLayout::new(area);

    let settings = session.settings();
    let remaining = session.remaining_secs();
    let clock_color = if session.is_expired() || remaining <= 60 {
        colors.error()
    } else if remaining <= 300 {
        colors.warning()
    } else {
        colors.header_fg()
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", settings.subject.name),
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("| {} ", settings.difficulty.label()),
            Style::default().fg(colors.muted()).bg(colors.header_bg()),
        ),
        Span::styled(
            format!("| \u{23f1} {} ", format_clock(remaining)),
            Style::default()
                .fg(clock_color)
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, layout.header);

    if let Some(progress_area) = layout.progress {
        let bar = ProgressBar::new(session.answered_count(), session.len(), app.theme);
        frame.render_widget(bar, progress_area);
    }

    frame.render_widget(QuestionCard::new(session, app.option_cursor, app.theme), layout.main);

    if let Some(sidebar) = layout.sidebar {
        frame.render_widget(QuestionNav::new(session, app.theme), sidebar);
    }

    let finish_hint = if session.submission().is_pending() {
        "Submitting..."
    } else if session.can_finish() {
        "[f] Finish"
    } else {
        ""
    };
    let hints = [
        "[\u{2191}\u{2193}] Option",
        "[Enter/1-9] Answer",
        "[\u{2190}\u{2192}] Prev/Next",
        "[:] Jump",
        finish_hint,
        "[Esc] Abandon",
    ];
    let mut footer_lines: Vec<Line> = Vec::new();
    if let Some(status) = &app.status {
        footer_lines.push(Line::from(Span::styled(
            format!("  {status}"),
            Style::default().fg(colors.warning()),
        )));
    }
    if !layout.tier.show_sidebar() {
        footer_lines.push(Line::from(Span::styled(
            format!("  {}/{} answered", session.answered_count(), session.len()),
            Style::default().fg(colors.fg()),
        )));
    }
    for hint in pack_hint_lines(&hints, layout.footer.width as usize) {
        footer_lines.push(Line::from(Span::styled(hint, Style::default().fg(colors.muted()))));
    }
    frame.render_widget(Paragraph::new(footer_lines), layout.footer);

    match &app.overlay {
        TestOverlay::None => {}
        TestOverlay::ConfirmFinish => render_confirm(
            frame,
            app,
            " Finish Test ",
            &format!(
                "Submit {} of {} answers now?",
                session.answered_count(),
                session.len()
            ),
            "[y/Enter] Submit  [n/Esc] Keep going",
        ),
        TestOverlay::ConfirmAbandon => render_confirm(
            frame,
            app,
            " Abandon Test ",
            "Leave this test? Your answers will not be saved.",
            "[y] Leave  [n/Esc] Stay",
        ),
        TestOverlay::Jump(input) => {
            let (before, cursor, after) = input.render_parts();
            let text = format!(
                "Go to question (1-{}): {before}{}{after}",
                session.len(),
                cursor.unwrap_or('_')
            );
            render_confirm(frame, app, " Jump ", &text, "[Enter] Go  [Esc] Cancel");
        }
    }
}

fn render_confirm(frame: &mut ratatui::Frame, app: &App, title: &str, message: &str, hint: &str) {
    let colors = &app.theme.colors;
    let area = centered_rect_min(40, 20, 44, 7, frame.area());
    frame.render_widget(Clear, area);
    let block = Block::bordered()
        .title(title.to_string())
        .border_style(Style::default().fg(colors.warning()))
        .style(Style::default().bg(colors.bg()));
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(colors.fg()))),
        Line::from(""),
        Line::from(Span::styled(hint.to_string(), Style::default().fg(colors.accent()))),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block),
        area,
    );
}

fn render_result(frame: &mut ratatui::Frame, app: &App) {
    let Some(stored) = app.last_result.as_ref() else {
        return;
    };
    let subject_name = app
        .last_settings
        .as_ref()
        .map(|s| s.subject.name.clone())
        .unwrap_or_else(|| app.subject_name(stored.result.subject_id));
    let area = centered_rect(60, 70, frame.area());
    frame.render_widget(
        ResultCard::new(stored, &subject_name, app.comparison.as_ref(), app.theme),
        area,
    );
}

fn render_history(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    let subject_name = |id: u32| app.subject_name(id);
    let table = HistoryTable {
        results: &app.history,
        selected: app.history_selected,
        subject_name: &subject_name,
        loading: app.history_loading,
        error: app.history_error.as_deref(),
        theme: app.theme,
    };
    frame.render_widget(table, layout[0]);

    let footer = Paragraph::new(Line::from(Span::styled(
        " [\u{2191}/\u{2193}] Select  [r] Refresh  [Esc] Menu ",
        Style::default().fg(colors.muted()),
    )));
    frame.render_widget(footer, layout[1]);
}

fn render_settings(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let centered = centered_rect(60, 80, area);

    let block = Block::bordered()
        .title(" Settings ")
        .border_style(Style::default().fg(colors.accent()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(centered);
    block.render(centered, frame.buffer_mut());

    let api_url = match &app.settings_editing {
        Some(input) => format!("{}_", input.value()),
        None => app.config.api_url.clone(),
    };
    let fields: [(&str, String); SETTINGS_FIELDS] = [
        ("Theme", app.config.theme.clone()),
        ("Backend", app.config.backend.to_string()),
        ("API URL", api_url),
        ("Default Duration", format!("{} minutes", app.config.duration_minutes)),
        ("Default Questions", app.config.question_count.to_string()),
        (
            "Shuffle Questions",
            if app.config.shuffle_questions { "on" } else { "off" }.to_string(),
        ),
        ("Request Timeout", format!("{}s", app.config.request_timeout_secs)),
    ];

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(fields.len() as u16 * 3),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(inner);

    let header = Paragraph::new(Line::from(Span::styled(
        "  Use arrows to navigate, Enter/Right to change, ESC to save & exit",
        Style::default().fg(colors.muted()),
    )));
    header.render(layout[0], frame.buffer_mut());

    let field_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(fields.iter().map(|_| Constraint::Length(3)).collect::<Vec<_>>())
        .split(layout[1]);

    for (i, (label, value)) in fields.iter().enumerate() {
        let is_selected = i == app.settings_selected;
        let indicator = if is_selected { " > " } else { "   " };

        let label_style = if is_selected {
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.fg())
        };
        let value_style = Style::default().fg(if is_selected {
            colors.warning()
        } else {
            colors.muted()
        });

        let lines = vec![
            Line::from(Span::styled(format!("{indicator}{label}:"), label_style)),
            Line::from(Span::styled(format!("  < {value} >"), value_style)),
        ];
        Paragraph::new(lines).render(field_layout[i], frame.buffer_mut());
    }

    let footer_text = if app.settings_editing.is_some() {
        "  [Enter] Apply  [Esc] Cancel edit"
    } else {
        "  [ESC] Save & back  [Enter/arrows] Change value"
    };
    let footer = Paragraph::new(Line::from(Span::styled(
        footer_text,
        Style::default().fg(colors.accent()),
    )));
    footer.render(layout[3], frame.buffer_mut());
}
