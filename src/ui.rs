use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use finance_buddy::charts::{AllocationChart, Dimensions, TrendChart};
use finance_buddy::format::{format_currency, format_currency_cents, format_date, format_percentage};
use finance_buddy::ledger::{categories, cash_flow, current_month_transactions, TransactionQuery};
use finance_buddy::{AssetForm, DebtForm, FormErrors, KeyValueStore, Session};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Assets,
    Debts,
    Transactions,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Dashboard, Page::Assets, Page::Debts, Page::Transactions];

    pub fn next(&self) -> Self {
        match self {
            Page::Dashboard => Page::Assets,
            Page::Assets => Page::Debts,
            Page::Debts => Page::Transactions,
            Page::Transactions => Page::Dashboard,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Dashboard => Page::Transactions,
            Page::Assets => Page::Dashboard,
            Page::Debts => Page::Assets,
            Page::Transactions => Page::Debts,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Assets => "Assets",
            Page::Debts => "Debts",
            Page::Transactions => "Transactions",
        }
    }
}

// ============================================================================
// FORM MODAL
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum EditForm {
    Asset(AssetForm),
    Debt(DebtForm),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub form: EditForm,
    /// Id of the entity being edited; None when adding
    pub editing: Option<String>,
    pub focus: usize,
    pub errors: FormErrors,
}

impl FormState {
    const FIELD_COUNT: usize = 3;

    fn new(form: EditForm, editing: Option<String>) -> Self {
        FormState {
            form,
            editing,
            focus: 0,
            errors: FormErrors::default(),
        }
    }

    fn title(&self) -> String {
        let (verb, noun) = match (&self.form, self.editing.is_some()) {
            (EditForm::Asset(_), false) => ("Add", "Asset"),
            (EditForm::Asset(_), true) => ("Edit", "Asset"),
            (EditForm::Debt(_), false) => ("Add", "Debt"),
            (EditForm::Debt(_), true) => ("Edit", "Debt"),
        };
        format!(" {} {} ", verb, noun)
    }

    /// (label, value, error key) for each field, in focus order
    fn fields(&self) -> [(&'static str, String, &'static str); 3] {
        match &self.form {
            EditForm::Asset(form) => [
                ("Asset Name", form.name.clone(), "name"),
                ("Value (€)", form.value.clone(), "value"),
                (
                    "Home Equity",
                    if form.is_home_equity { "[x]" } else { "[ ]" }.to_string(),
                    "",
                ),
            ],
            EditForm::Debt(form) => [
                ("Debt Name", form.name.clone(), "debtName"),
                ("Balance (€)", form.balance.clone(), "balance"),
                ("Interest Rate (%)", form.interest_rate.clone(), "interestRate"),
            ],
        }
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        match (&mut self.form, self.focus) {
            (EditForm::Asset(form), 0) => Some(&mut form.name),
            (EditForm::Asset(form), 1) => Some(&mut form.value),
            (EditForm::Asset(_), _) => None,
            (EditForm::Debt(form), 0) => Some(&mut form.name),
            (EditForm::Debt(form), 1) => Some(&mut form.balance),
            (EditForm::Debt(form), _) => Some(&mut form.interest_rate),
        }
    }

    fn next_field(&mut self) {
        self.focus = (self.focus + 1) % Self::FIELD_COUNT;
    }

    fn previous_field(&mut self) {
        self.focus = (self.focus + Self::FIELD_COUNT - 1) % Self::FIELD_COUNT;
    }

    fn type_char(&mut self, c: char) {
        if let Some(text) = self.focused_text() {
            text.push(c);
        } else if c == ' ' {
            self.toggle_checkbox();
        }
    }

    fn backspace(&mut self) {
        if let Some(text) = self.focused_text() {
            text.pop();
        }
    }

    fn toggle_checkbox(&mut self) {
        if let EditForm::Asset(form) = &mut self.form {
            form.is_home_equity = !form.is_home_equity;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Normal,
    Form(FormState),
    Search,
    ConfirmDelete { id: String, name: String },
}

// ============================================================================
// APP
// ============================================================================

pub struct App<S: KeyValueStore> {
    pub session: Session<S>,
    pub current_page: Page,
    pub assets_state: TableState,
    pub debts_state: TableState,
    pub transactions_state: TableState,
    pub query: TransactionQuery,
    pub mode: Mode,
    pub status: Option<String>,
    pub trend_size: Dimensions,
    pub allocation_size: Dimensions,
    pub should_quit: bool,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(session: Session<S>, trend_size: Dimensions, allocation_size: Dimensions) -> Self {
        let mut app = Self {
            session,
            current_page: Page::Dashboard,
            assets_state: TableState::default(),
            debts_state: TableState::default(),
            transactions_state: TableState::default(),
            query: TransactionQuery::default(),
            mode: Mode::Normal,
            status: None,
            trend_size,
            allocation_size,
            should_quit: false,
        };
        app.clamp_selections();
        app
    }

    fn page_len(&self, page: Page) -> usize {
        match page {
            Page::Dashboard => 0,
            Page::Assets => self.session.assets().len(),
            Page::Debts => self.session.debts().len(),
            Page::Transactions => self.session.ledger(&self.query).len(),
        }
    }

    fn page_state(&mut self, page: Page) -> Option<&mut TableState> {
        match page {
            Page::Dashboard => None,
            Page::Assets => Some(&mut self.assets_state),
            Page::Debts => Some(&mut self.debts_state),
            Page::Transactions => Some(&mut self.transactions_state),
        }
    }

    /// Keep every table selection inside its (possibly shrunk) list
    fn clamp_selections(&mut self) {
        for page in [Page::Assets, Page::Debts, Page::Transactions] {
            let len = self.page_len(page);
            if let Some(state) = self.page_state(page) {
                let selected = match (len, state.selected()) {
                    (0, _) => None,
                    (len, Some(i)) if i >= len => Some(len - 1),
                    (_, Some(i)) => Some(i),
                    (_, None) => Some(0),
                };
                state.select(selected);
            }
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let page = self.current_page;
        let len = self.page_len(page);
        if len == 0 {
            return;
        }
        if let Some(state) = self.page_state(page) {
            let current = state.selected().unwrap_or(0) as isize;
            let next = (current + delta).rem_euclid(len as isize) as usize;
            state.select(Some(next));
        }
    }

    fn selected_index(&self) -> Option<usize> {
        match self.current_page {
            Page::Assets => self.assets_state.selected(),
            Page::Debts => self.debts_state.selected(),
            Page::Transactions => self.transactions_state.selected(),
            Page::Dashboard => None,
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn open_add_form(&mut self) {
        let form = match self.current_page {
            Page::Assets => EditForm::Asset(AssetForm::default()),
            Page::Debts => EditForm::Debt(DebtForm::default()),
            _ => return,
        };
        self.mode = Mode::Form(FormState::new(form, None));
    }

    pub fn open_edit_form(&mut self) {
        let Some(i) = self.selected_index() else { return };
        let state = match self.current_page {
            Page::Assets => self
                .session
                .assets()
                .get(i)
                .map(|a| FormState::new(EditForm::Asset(AssetForm::from_asset(a)), Some(a.id.clone()))),
            Page::Debts => self
                .session
                .debts()
                .get(i)
                .map(|d| FormState::new(EditForm::Debt(DebtForm::from_debt(d)), Some(d.id.clone()))),
            _ => None,
        };
        if let Some(state) = state {
            self.mode = Mode::Form(state);
        }
    }

    pub fn request_delete(&mut self) {
        let Some(i) = self.selected_index() else { return };
        let target = match self.current_page {
            Page::Assets => self.session.assets().get(i).map(|a| (a.id.clone(), a.name.clone())),
            Page::Debts => self.session.debts().get(i).map(|d| (d.id.clone(), d.name.clone())),
            _ => None,
        };
        if let Some((id, name)) = target {
            self.mode = Mode::ConfirmDelete { id, name };
        }
    }

    fn confirm_delete(&mut self, id: &str, name: &str) {
        let removed = match self.current_page {
            Page::Assets => self.session.remove_asset(id),
            Page::Debts => self.session.remove_debt(id),
            _ => false,
        };
        if removed {
            self.status = Some(format!("Deleted {}", name));
        }
        self.mode = Mode::Normal;
        self.clamp_selections();
    }

    fn submit_form(&mut self, mut state: FormState) {
        let result = match &state.form {
            EditForm::Asset(form) => self
                .session
                .save_asset_form(form, state.editing.as_deref())
                .map(|a| a.name),
            EditForm::Debt(form) => self
                .session
                .save_debt_form(form, state.editing.as_deref())
                .map(|d| d.name),
        };

        match result {
            Ok(name) => {
                self.status = Some(format!("Saved {}", name));
                self.mode = Mode::Normal;
                self.clamp_selections();
            }
            Err(errors) => {
                state.errors = errors;
                self.mode = Mode::Form(state);
            }
        }
    }

    fn cycle_category(&mut self) {
        let all = categories(self.session.transactions());
        self.query.category = match &self.query.category {
            None => all.first().cloned(),
            Some(current) => all
                .iter()
                .position(|c| c == current)
                .and_then(|i| all.get(i + 1))
                .cloned(),
        };
        self.clamp_selections();
    }

    /// Route one key press; sets `should_quit` on q/Esc in normal mode
    pub fn handle_key(&mut self, key: KeyEvent) {
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        match mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Form(state) => self.handle_form_key(state, key),
            Mode::Search => self.handle_search_key(key),
            Mode::ConfirmDelete { id, name } => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => self.confirm_delete(&id, &name),
                _ => self.mode = Mode::Normal,
            },
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        self.status = None;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::BackTab => self.previous_page(),
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.previous_page();
                } else {
                    self.next_page();
                }
            }
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::PageDown => self.move_selection(20),
            KeyCode::PageUp => self.move_selection(-20),
            KeyCode::Char('a') => self.open_add_form(),
            KeyCode::Char('e') | KeyCode::Enter => self.open_edit_form(),
            KeyCode::Char('d') => self.request_delete(),
            KeyCode::Char('s') if self.current_page == Page::Transactions => {
                let field = self.query.sort_field.next();
                self.query.toggle_sort(field);
            }
            KeyCode::Char('r') if self.current_page == Page::Transactions => {
                let field = self.query.sort_field;
                self.query.toggle_sort(field);
            }
            KeyCode::Char('f') if self.current_page == Page::Transactions => self.cycle_category(),
            KeyCode::Char('/') if self.current_page == Page::Transactions => self.mode = Mode::Search,
            KeyCode::Char('c') if self.current_page == Page::Transactions => {
                self.query = TransactionQuery::default();
                self.clamp_selections();
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, mut state: FormState, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => return,
            KeyCode::Enter => return self.submit_form(state),
            KeyCode::Tab | KeyCode::Down => state.next_field(),
            KeyCode::BackTab | KeyCode::Up => state.previous_field(),
            KeyCode::Backspace => state.backspace(),
            KeyCode::Char(c) => state.type_char(c),
            _ => {}
        }
        self.mode = Mode::Form(state);
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => return,
            KeyCode::Backspace => {
                self.query.search.pop();
            }
            KeyCode::Char(c) => self.query.search.push(c),
            _ => {}
        }
        self.mode = Mode::Search;
        self.clamp_selections();
    }
}

pub fn run_ui<S: KeyValueStore>(app: &mut App<S>) -> Result<()> {
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

fn run_app<B: ratatui::backend::Backend, S: KeyValueStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    while !app.should_quit {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                app.handle_key(key);
            }
        }
    }
    Ok(())
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui<S: KeyValueStore>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Dashboard => render_dashboard(f, chunks[1], app),
        Page::Assets => render_assets(f, chunks[1], app),
        Page::Debts => render_debts(f, chunks[1], app),
        Page::Transactions => render_transactions(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);

    match &app.mode {
        Mode::Form(state) => render_form(f, state),
        Mode::ConfirmDelete { name, .. } => render_confirm(f, name),
        _ => {}
    }
}

fn hex_color(hex: &str) -> Color {
    let hex = hex.trim_start_matches('#');
    let channel = |i: usize| hex.get(i..i + 2).and_then(|c| u8::from_str_radix(c, 16).ok());
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::White,
    }
}

fn amount_color(value: f64) -> Color {
    if value < 0.0 {
        Color::Red
    } else {
        Color::Green
    }
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    Row::new(cells).style(Style::default().bg(Color::DarkGray)).height(1)
}

fn bordered(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(title)
}

fn render_header<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let summary = app.session.summary();

    let mut tab_spans = vec![];
    for (i, page) in Page::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Net worth: {}", format_currency(summary.total_net_worth)),
        Style::default().fg(amount_color(summary.total_net_worth)),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Finance Buddy "),
    );

    f.render_widget(header, area);
}

fn render_dashboard<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(8), Constraint::Length(9)])
        .split(area);

    render_cards(f, rows[0], app);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[2]);

    render_trend(f, rows[1], app);
    render_allocation(f, bottom[0], app);
    render_month(f, bottom[1], app);
}

fn render_cards<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let dashboard = app.session.dashboard();
    let cards = [
        ("Total Net Worth", dashboard.total_net_worth, Color::Cyan),
        ("Liquid Net Worth", dashboard.liquid_net_worth, Color::Green),
        ("Home Equity", dashboard.home_equity, Color::Magenta),
        ("Total Debts", dashboard.total_debts, Color::Red),
    ];

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for ((title, value, color), column) in cards.iter().zip(columns.iter()) {
        let card = Paragraph::new(Line::from(Span::styled(
            format_currency(*value),
            Style::default().fg(*color).add_modifier(Modifier::BOLD),
        )))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(*color))
                .title(format!(" {} ", title)),
        );
        f.render_widget(card, *column);
    }
}

fn render_trend<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let block = bordered(" Net Worth Trend ".to_string());

    let chart = app.session.trend_chart(app.trend_size);
    let geometry = match &chart {
        TrendChart::Plot(geometry) => geometry,
        TrendChart::Placeholder { .. } => {
            let placeholder = Paragraph::new(TrendChart::PLACEHOLDER_MESSAGE)
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            f.render_widget(placeholder, area);
            return;
        }
    };

    // Pixel space has y growing downwards; flip it for the terminal chart
    let height = geometry.dimensions.height;
    let to_data = |points: &[finance_buddy::charts::Point]| -> Vec<(f64, f64)> {
        points.iter().map(|p| (p.x, height - p.y)).collect()
    };
    let total = to_data(&geometry.total_points[..]);
    let liquid = to_data(&geometry.liquid_points[..]);

    let datasets = vec![
        Dataset::default()
            .name(format!("Total Assets {}", format_currency(geometry.latest_total)))
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(hex_color(finance_buddy::charts::trend::TOTAL_COLOR)))
            .data(&total),
        Dataset::default()
            .name(format!("Liquid Assets {}", format_currency(geometry.latest_liquid)))
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(hex_color(finance_buddy::charts::trend::LIQUID_COLOR)))
            .data(&liquid),
    ];

    let x_labels: Vec<Span> = geometry
        .date_labels
        .iter()
        .map(|l| Span::raw(l.label.clone()))
        .collect();
    let y_labels: Vec<Span> = [geometry.grid_lines.first(), geometry.grid_lines.last()]
        .into_iter()
        .flatten()
        .map(|g| Span::raw(g.label.clone()))
        .collect();

    let margin = geometry.margin;
    let chart_widget = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([margin.left, geometry.dimensions.width - margin.right])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([margin.bottom, height - margin.top])
                .labels(y_labels),
        );

    f.render_widget(chart_widget, area);
}

fn render_allocation<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let block = bordered(" Asset Allocation ".to_string());

    let lines: Vec<Line> = match app.session.allocation_chart(app.allocation_size) {
        AllocationChart::Placeholder { reason, .. } => {
            vec![Line::from(Span::styled(reason.message(), Style::default().fg(Color::DarkGray)))]
        }
        AllocationChart::Donut(geometry) => {
            let bar_width = area.width.saturating_sub(40) as f64;
            geometry
                .slices
                .iter()
                .map(|slice| {
                    let filled = (bar_width * slice.percentage / 100.0).round() as usize;
                    Line::from(vec![
                        Span::styled("█".repeat(filled.max(1)), Style::default().fg(hex_color(slice.color))),
                        Span::raw(format!(
                            " {:<18} {:>10} {:>6}",
                            truncate(&slice.name, 18),
                            format_currency(slice.value),
                            format_percentage(slice.percentage),
                        )),
                    ])
                })
                .collect()
        }
    };

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_month<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let now = app.session.now();
    let month = current_month_transactions(app.session.transactions(), now);
    let flow = cash_flow(month.iter().copied());

    let row = |label: &'static str, value: f64, color: Color| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", label), Style::default().fg(Color::Cyan)),
            Span::styled(format_currency_cents(value), Style::default().fg(color)),
        ])
    };

    let content = vec![
        Line::from(""),
        row("Income", flow.income, Color::Green),
        row("Expenses", flow.expenses, Color::Red),
        row("Net", flow.net, amount_color(flow.net)),
        Line::from(""),
        Line::from(Span::styled(
            format!("  {} transactions this month", month.len()),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let title = format!(" {} ", now.format("%B %Y"));
    f.render_widget(Paragraph::new(content).block(bordered(title)), area);
}

fn render_assets<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let rows = app.session.assets().iter().map(|asset| {
        Row::new(vec![
            Cell::from(asset.name.clone()),
            Cell::from(format_currency(asset.value)).style(Style::default().fg(Color::Green)),
            Cell::from(if asset.is_home_equity { "Home equity" } else { "Liquid" }),
            Cell::from(format_date(&asset.date)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(30),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(14),
        ],
    )
    .header(header_row(&["Name", "Value", "Type", "Updated"]))
    .block(bordered(format!(" Assets ({}) ", app.session.assets().len())))
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.assets_state);
}

fn render_debts<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let rows = app.session.debts().iter().map(|debt| {
        Row::new(vec![
            Cell::from(debt.name.clone()),
            Cell::from(format_currency(debt.balance)).style(Style::default().fg(Color::Red)),
            Cell::from(debt.interest_rate.map(format_percentage).unwrap_or_else(|| "-".to_string())),
            Cell::from(format_date(&debt.date)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(30),
            Constraint::Length(14),
            Constraint::Length(10),
            Constraint::Length(14),
        ],
    )
    .header(header_row(&["Name", "Balance", "Rate", "Updated"]))
    .block(bordered(format!(" Debts ({}) ", app.session.debts().len())))
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.debts_state);
}

fn render_transactions<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let ledger = app.session.ledger(&app.query);
    let count = ledger.len();

    let rows: Vec<Row> = ledger
        .iter()
        .map(|tx| {
            Row::new(vec![
                Cell::from(format_date(&tx.date)),
                Cell::from(truncate(&tx.description, 30)),
                Cell::from(tx.category.clone()),
                Cell::from(tx.source.to_string()),
                Cell::from(format_currency_cents(tx.amount)).style(Style::default().fg(amount_color(tx.amount))),
            ])
        })
        .collect();

    let arrow = match app.query.direction {
        finance_buddy::SortDirection::Asc => "▲",
        finance_buddy::SortDirection::Desc => "▼",
    };
    let mut title = format!(" Transactions ({}) sorted by {} {} ", count, app.query.sort_field.title(), arrow);
    if let Some(category) = &app.query.category {
        title.push_str(&format!("| {} ", category));
    }
    if !app.query.search.is_empty() || app.mode == Mode::Search {
        title.push_str(&format!("| search: {} ", app.query.search));
    }

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(32),
            Constraint::Length(15),
            Constraint::Length(9),
            Constraint::Length(12),
        ],
    )
    .header(header_row(&["Date", "Description", "Category", "Source", "Amount"]))
    .block(bordered(title))
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.transactions_state);
}

fn render_status_bar<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let mut spans = vec![];
    if let Some(status) = &app.status {
        spans.push(Span::styled(format!(" {} ", status), Style::default().fg(Color::Green)));
        spans.push(Span::raw("| "));
    }

    match (&app.mode, app.current_page) {
        (Mode::Form(_), _) => {
            spans.extend([key("Tab"), Span::raw(" Field | "), key("Space"), Span::raw(" Toggle | ")]);
            spans.extend([key("Enter"), Span::raw(" Save | "), key("Esc"), Span::raw(" Cancel")]);
        }
        (Mode::Search, _) => {
            spans.extend([Span::raw(" Type to search | "), key("Enter"), Span::raw(" Done")]);
        }
        (_, Page::Assets) | (_, Page::Debts) => {
            spans.extend([key("a"), Span::raw(" Add | "), key("e"), Span::raw(" Edit | ")]);
            spans.extend([key("d"), Span::raw(" Delete | ")]);
        }
        (_, Page::Transactions) => {
            spans.extend([key("s"), Span::raw(" Sort | "), key("r"), Span::raw(" Reverse | ")]);
            spans.extend([key("f"), Span::raw(" Category | "), key("/"), Span::raw(" Search | ")]);
            spans.extend([key("c"), Span::raw(" Clear | ")]);
        }
        (_, Page::Dashboard) => {}
    }

    if !matches!(app.mode, Mode::Form(_) | Mode::Search) {
        spans.extend([key("Tab"), Span::raw(" Page | "), key("↑/↓"), Span::raw(" Nav | ")]);
        spans.push(Span::styled("q", Style::default().fg(Color::Red)));
        spans.push(Span::raw(" Quit"));
    }

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_form(f: &mut Frame, state: &FormState) {
    let area = centered_rect(56, 14, f.size());

    let mut content = vec![Line::from("")];
    for (i, (label, value, error_key)) in state.fields().into_iter().enumerate() {
        let focused = i == state.focus;
        let marker = if focused { "→ " } else { "  " };
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };

        content.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(format!("{:<18}", label), label_style),
            Span::raw(value),
            Span::styled(if focused { "_" } else { "" }, Style::default().fg(Color::Yellow)),
        ]));

        match state.errors.get(error_key) {
            Some(message) => content.push(Line::from(Span::styled(
                format!("    {}", message),
                Style::default().fg(Color::Red).add_modifier(Modifier::ITALIC),
            ))),
            None => content.push(Line::from("")),
        }
    }

    let modal = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(state.title()),
    );

    f.render_widget(Clear, area);
    f.render_widget(modal, area);
}

fn render_confirm(f: &mut Frame, name: &str) {
    let area = centered_rect(44, 5, f.size());
    let content = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw(format!("  Delete {}? ", truncate(name, 20))),
            Span::styled("y", Style::default().fg(Color::Yellow)),
            Span::raw("/"),
            Span::styled("n", Style::default().fg(Color::Yellow)),
        ]),
    ];

    let modal = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Confirm "),
    );

    f.render_widget(Clear, area);
    f.render_widget(modal, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use finance_buddy::{MemoryStore, Storage};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap()
    }

    fn app() -> App<MemoryStore> {
        let session = Session::load_with_clock(Storage::new(MemoryStore::new()), fixed_now);
        App::new(session, Dimensions::new(600.0, 300.0), Dimensions::new(400.0, 300.0))
    }

    fn press(app: &mut App<MemoryStore>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_str(app: &mut App<MemoryStore>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_page_cycle() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.current_page, Page::Assets);
        press(&mut app, KeyCode::BackTab);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.current_page, Page::Transactions);
    }

    #[test]
    fn test_add_asset_through_form() {
        let mut app = app();
        app.current_page = Page::Assets;

        press(&mut app, KeyCode::Char('a'));
        type_str(&mut app, "Savings");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "25000");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.session.assets().len(), 1);
        assert_eq!(app.session.assets()[0].value, 25000.0);
        assert_eq!(app.assets_state.selected(), Some(0));
        assert_eq!(app.session.snapshots().len(), 1);
    }

    #[test]
    fn test_invalid_form_stays_open_with_errors() {
        let mut app = app();
        app.current_page = Page::Debts;

        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Enter);

        match &app.mode {
            Mode::Form(state) => {
                assert_eq!(state.errors.get("debtName"), Some("Debt name is required"));
                assert_eq!(state.errors.get("balance"), Some("Balance is required"));
            }
            other => panic!("expected form, got {:?}", other),
        }
        assert!(app.session.debts().is_empty());
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut app = app();
        app.current_page = Page::Assets;
        press(&mut app, KeyCode::Char('a'));
        type_str(&mut app, "Car");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "12000");
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.session.assets().len(), 1);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.session.assets().is_empty());
        assert_eq!(app.assets_state.selected(), None);
    }

    #[test]
    fn test_transaction_search_and_sort() {
        let mut app = app();
        app.session.seed(
            Vec::new(),
            Vec::new(),
            finance_buddy::sample_data::sample_transactions(),
            Vec::new(),
        );
        app.current_page = Page::Transactions;

        press(&mut app, KeyCode::Char('/'));
        type_str(&mut app, "salary");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session.ledger(&app.query).len(), 6);

        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.query.sort_field, finance_buddy::SortField::Amount);

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.query, TransactionQuery::default());
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color("#3b82f6"), Color::Rgb(0x3b, 0x82, 0xf6));
        assert_eq!(hex_color("nope"), Color::White);
    }
}
