use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use crypto_list::coin::{BadgeColor, Coin, ICON_ACTIVE_COIN, ICON_ACTIVE_TOKEN, ICON_INACTIVE_COIN};
use crypto_list::{FilterPanel, Session};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

const NAVIGATION_BAR_TITLE: &str = "Crypto List";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Filter,
}

pub struct App {
    pub session: Session,
    pub coins: Vec<Coin>,
    pub state: TableState,
    pub panel: FilterPanel,
    pub input_mode: InputMode,
    pub query: String,
    updates: Receiver<Vec<Coin>>,
}

impl App {
    pub fn new(session: Session) -> Self {
        let (tx, updates) = mpsc::channel();
        session.engine.on_list_changed(move |coins| {
            let _ = tx.send(coins);
        });

        Self {
            session,
            coins: Vec::new(),
            state: TableState::default(),
            panel: FilterPanel::default(),
            input_mode: InputMode::Normal,
            query: String::new(),
            updates,
        }
    }

    /// Pull every pending emission; the last one wins.
    pub fn drain_updates(&mut self) {
        while let Ok(coins) = self.updates.try_recv() {
            self.set_coins(coins);
        }
    }

    fn set_coins(&mut self, coins: Vec<Coin>) {
        self.coins = coins;
        if self.coins.is_empty() {
            self.state.select(None);
        } else {
            let keep = self.state.selected().unwrap_or(0).min(self.coins.len() - 1);
            self.state.select(Some(keep));
        }
    }

    pub fn selected_coin(&self) -> Option<&Coin> {
        self.state.selected().and_then(|i| self.coins.get(i))
    }

    /// Pull-to-refresh: filters and search are reset, then a new load starts.
    pub fn refresh(&mut self) {
        self.reset_filters();
        self.query.clear();
        // Progress arrives through the listener channel
        let _pending = self.session.spawn_refresh();
    }

    pub fn toggle_filter(&mut self, index: usize) {
        let selected = self.panel.toggle(index);
        self.session.engine.apply_filter(&selected);
    }

    pub fn reset_filters(&mut self) {
        self.panel.reset();
        self.session.engine.apply_filter(&[]);
    }

    pub fn push_query(&mut self, c: char) {
        self.query.push(c);
        self.session.engine.search(&self.query);
    }

    pub fn pop_query(&mut self) {
        self.query.pop();
        self.session.engine.search(&self.query);
    }

    pub fn cancel_search(&mut self) {
        self.query.clear();
        self.session.engine.search("");
        self.input_mode = InputMode::Normal;
    }

    pub fn next(&mut self) {
        let len = self.coins.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.coins.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.coins.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + 20).min(len - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = match self.state.selected() {
            Some(i) => i.saturating_sub(20),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn stats(&self) -> CoinStats {
        let mut stats = CoinStats::default();

        for coin in &self.coins {
            if coin.is_active {
                stats.active_count += 1;
            } else {
                stats.inactive_count += 1;
            }
            if coin.is_new {
                stats.new_count += 1;
            }
            if coin.is_token() {
                stats.token_count += 1;
            }
        }

        stats
    }
}

#[derive(Default)]
pub struct CoinStats {
    pub active_count: usize,
    pub inactive_count: usize,
    pub new_count: usize,
    pub token_count: usize,
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    let _initial_load = app.session.spawn_refresh();

    loop {
        app.drain_updates();
        terminal.draw(|f| ui(f, app))?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            match app.input_mode {
                InputMode::Search => match key.code {
                    KeyCode::Esc => app.cancel_search(),
                    KeyCode::Enter => app.input_mode = InputMode::Normal,
                    KeyCode::Backspace => app.pop_query(),
                    KeyCode::Char(c) => app.push_query(c),
                    _ => {}
                },
                InputMode::Filter => match key.code {
                    KeyCode::Esc | KeyCode::Char('f') => app.input_mode = InputMode::Normal,
                    KeyCode::Char('c') => app.reset_filters(),
                    KeyCode::Char(c @ '1'..='9') => {
                        app.toggle_filter(c as usize - '1' as usize);
                    }
                    _ => {}
                },
                InputMode::Normal => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('/') => app.input_mode = InputMode::Search,
                    KeyCode::Char('f') => app.input_mode = InputMode::Filter,
                    KeyCode::Char('c') => app.reset_filters(),
                    KeyCode::Char('r') => app.refresh(),
                    KeyCode::Down | KeyCode::Char('j') => app.next(),
                    KeyCode::Up | KeyCode::Char('k') => app.previous(),
                    KeyCode::PageDown => app.page_down(),
                    KeyCode::PageUp => app.page_up(),
                    KeyCode::Home => app.state.select(Some(0)),
                    KeyCode::End => {
                        if !app.coins.is_empty() {
                            app.state.select(Some(app.coins.len() - 1));
                        }
                    }
                    _ => {}
                },
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let filter_height = if app.input_mode == InputMode::Filter {
        app.panel.options().len() as u16 + 2
    } else {
        0
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // Navigation bar
            Constraint::Min(0),                // Coin list
            Constraint::Length(filter_height), // Filter panel
            Constraint::Length(3),             // Search / status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.coins.is_empty() {
        render_empty_state(f, chunks[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    if app.input_mode == InputMode::Filter {
        render_filter_panel(f, chunks[2], app);
    }

    render_status_bar(f, chunks[3], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let stats = app.stats();

    let mut spans = vec![
        Span::styled(
            NAVIGATION_BAR_TITLE,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Shown: {}", app.coins.len()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("● {}", stats.active_count),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(
            format!("○ {}", stats.inactive_count),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  "),
        Span::styled(
            format!("★ {}", stats.new_count),
            Style::default().fg(Color::Cyan),
        ),
    ];

    // Filter dot
    if app.panel.has_selection() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("• filtered", Style::default().fg(Color::Red)));
    }

    if let Some(monitor) = &app.session.monitor {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            monitor.connection_type().as_str(),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn icon_for(coin: &Coin) -> (&'static str, Color) {
    match coin.display.image_key.as_deref() {
        Some(ICON_ACTIVE_COIN) => ("●", Color::Yellow),
        Some(ICON_ACTIVE_TOKEN) => ("◆", Color::Magenta),
        Some(ICON_INACTIVE_COIN) => ("○", Color::DarkGray),
        _ => (" ", Color::White),
    }
}

fn badge_for(coin: &Coin) -> Cell<'static> {
    if !coin.display.show_badge {
        return Cell::from("");
    }
    match coin.display.badge_color {
        BadgeColor::Gray => Cell::from("INACTIVE").style(Style::default().fg(Color::Black).bg(Color::Gray)),
        BadgeColor::None => Cell::from("NEW").style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
    }
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["", "Name", "Symbol", "Type", "Status"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.coins.iter().map(|coin| {
        let (icon, icon_color) = icon_for(coin);
        let name_style = if coin.is_active {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let cells = vec![
            Cell::from(icon).style(Style::default().fg(icon_color)),
            Cell::from(truncate(coin.display_name(), 28)).style(name_style),
            Cell::from(coin.display_symbol().to_string()),
            Cell::from(coin.coin_type.clone().unwrap_or_default()),
            badge_for(coin),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(30),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Coins "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_empty_state(f: &mut Frame, area: Rect, app: &App) {
    let message = app
        .session
        .engine
        .empty_state()
        .map(|s| s.message())
        .unwrap_or_default();

    let paragraph = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", message),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Coins "),
    );

    f.render_widget(paragraph, area);
}

fn render_filter_panel(f: &mut Frame, area: Rect, app: &App) {
    let lines: Vec<Line> = app
        .panel
        .options()
        .iter()
        .enumerate()
        .map(|(i, opt)| {
            let mark = if opt.selected {
                Span::styled("[x] ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            } else {
                Span::raw("[ ] ")
            };
            Line::from(vec![
                Span::raw(" "),
                Span::styled(format!("{}", i + 1), Style::default().fg(Color::Yellow)),
                Span::raw(". "),
                mark,
                Span::raw(opt.title.clone()),
            ])
        })
        .collect();

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Filters (1-5 toggle, c reset, f close) "),
    );

    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let spans = if app.input_mode == InputMode::Search {
        vec![
            Span::styled(" Search: ", Style::default().fg(Color::Cyan)),
            Span::raw(app.query.clone()),
            Span::styled("▏", Style::default().fg(Color::Yellow)),
            Span::raw("  ("),
            Span::styled("Enter", Style::default().fg(Color::Yellow)),
            Span::raw(" done, "),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::raw(" cancel)"),
        ]
    } else {
        let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
        let mut spans = vec![Span::styled(
            format!(" Row: {}/{} ", selected, app.coins.len()),
            Style::default().fg(Color::Cyan),
        )];

        if !app.query.is_empty() {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(
                format!("Search: {}", app.query),
                Style::default().fg(Color::Green),
            ));
        }

        for (key, label, color) in [
            ("/", " Search", Color::Yellow),
            ("f", " Filters", Color::Yellow),
            ("r", " Refresh", Color::Yellow),
            ("↑/↓", " Nav", Color::Yellow),
            ("q", " Quit", Color::Red),
        ] {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(key, Style::default().fg(color)));
            spans.push(Span::raw(label));
        }
        spans
    };

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
