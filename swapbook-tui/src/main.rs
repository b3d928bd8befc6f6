/// Swapbook terminal dashboard
///
/// Renders the atomic-swap order book analytics as six views:
/// transactions, tag overview, quarterly breakdown, Thorchain and
/// Chainflip range histograms, and per-address search. All numbers are
/// produced by the pure aggregation layer in `swapbook-analytics`;
/// this binary only fetches snapshots and draws them.
use std::{error::Error, io, sync::Arc, time::Duration};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Gauge, Paragraph, Row, Table, Tabs, Wrap},
};
use tokio::sync::Mutex;
use tracing::{error, info};

use swapbook_analytics::{
    ApiClient, ApiConfig, Order,
    aggregate::{
        AddressSummary, MonthKey, MonthlyBreakdown, MonthlyChange, MonthlyRangeStats,
        QuarterTotals, address_report_summary, btc_ranges, bucket_by_month, filled_series,
        last_months, monthly_breakdown, monthly_changes, monthly_range_stats, october_start,
        quarter_totals, tag_distribution, unique_tags,
    },
};

/// Default order window shown on startup, in days.
const DEFAULT_WINDOW_DAYS: i64 = 7;

const PALETTE: [Color; 6] = [
    Color::Cyan,
    Color::Green,
    Color::Yellow,
    Color::Magenta,
    Color::Blue,
    Color::Red,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum View {
    Transactions,
    Overview,
    Quarterly,
    Thorchain,
    Chainflip,
    Search,
}

impl View {
    const ALL: [View; 6] = [
        View::Transactions,
        View::Overview,
        View::Quarterly,
        View::Thorchain,
        View::Chainflip,
        View::Search,
    ];

    fn title(self) -> &'static str {
        match self {
            View::Transactions => "Transactions",
            View::Overview => "Overview",
            View::Quarterly => "Quarterly",
            View::Thorchain => "Thorchain",
            View::Chainflip => "Chainflip",
            View::Search => "Search",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|view| *view == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }
}

/// What the keyboard is currently driving.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InputMode {
    Normal,
    Address,
    Tag,
}

/// Quarterly view data, computed once per fetch.
#[derive(Clone, Debug)]
struct QuarterlyData {
    rows: Vec<MonthlyBreakdown>,
    totals: QuarterTotals,
}

/// Search view data for one address.
#[derive(Clone, Debug)]
struct SearchData {
    address: String,
    tags: Vec<String>,
    orders: Vec<Order>,
    summary: AddressSummary,
    monthly: Vec<MonthlyChange>,
}

/// Fetched snapshots shared between the fetch tasks and the render
/// loop. Each fetch task writes only its own slot; a failed fetch
/// leaves the slot untouched so the view falls back to its empty
/// state.
#[derive(Clone)]
struct AppState {
    window_from: DateTime<Utc>,
    window_to: DateTime<Utc>,
    orders: Option<Vec<Order>>,
    orders_loading: bool,
    known_tags: Vec<String>,
    quarterly: Option<QuarterlyData>,
    quarterly_loading: bool,
    thorchain: Option<Vec<MonthlyRangeStats>>,
    thorchain_loading: bool,
    chainflip: Option<Vec<MonthlyRangeStats>>,
    chainflip_loading: bool,
    search: Option<SearchData>,
    search_loading: bool,
    last_update: DateTime<Utc>,
}

impl AppState {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            window_from: now - ChronoDuration::days(DEFAULT_WINDOW_DAYS),
            window_to: now,
            orders: None,
            orders_loading: false,
            known_tags: Vec::new(),
            quarterly: None,
            quarterly_loading: false,
            thorchain: None,
            thorchain_loading: false,
            chainflip: None,
            chainflip_loading: false,
            search: None,
            search_loading: false,
            last_update: now,
        }
    }
}

/// Purely local UI state (never touched by the fetch tasks).
struct App {
    view: View,
    input_mode: InputMode,
    input: String,
    selected: usize,
    scroll: usize,
    tag_filter: Option<String>,
}

impl App {
    fn new() -> Self {
        Self {
            view: View::Transactions,
            input_mode: InputMode::Normal,
            input: String::new(),
            selected: 0,
            scroll: 0,
            tag_filter: None,
        }
    }
}

fn init_logging() {
    // Stdout belongs to the alternate screen; only log when a file
    // target is configured.
    let Ok(path) = std::env::var("SWAPBOOK_LOG") else {
        return;
    };
    let Ok(file) = std::fs::File::create(path) else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let client = ApiClient::new(ApiConfig::from_env()?)?;

    // Setup panic hook to restore terminal on crash
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let state = Arc::new(Mutex::new(AppState::new()));

    // Kick off the initial fetches. Each one is an independent task;
    // there is no ordering between them and each writes only its own
    // slot of the shared state.
    spawn_orders_fetch(client.clone(), Arc::clone(&state));
    spawn_quarterly_fetch(client.clone(), Arc::clone(&state));
    spawn_thorchain_fetch(client.clone(), Arc::clone(&state));
    spawn_chainflip_fetch(client.clone(), Arc::clone(&state));

    let res = run_app(&mut terminal, client, state).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    client: ApiClient,
    state: Arc<Mutex<AppState>>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = std::time::Instant::now();
    let mut app = App::new();

    loop {
        let snapshot = {
            let s = state.lock().await;
            s.clone()
        };

        terminal.draw(|f| ui(f, &mut app, &snapshot))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match app.input_mode {
                    InputMode::Normal => {
                        if handle_normal_key(key.code, &mut app, &client, &state, &snapshot) {
                            return Ok(());
                        }
                    }
                    InputMode::Address | InputMode::Tag => {
                        handle_input_key(key.code, &mut app, &client, &state, &snapshot);
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = std::time::Instant::now();
        }
    }
}

/// Returns true when the app should quit.
fn handle_normal_key(
    code: KeyCode,
    app: &mut App,
    client: &ApiClient,
    state: &Arc<Mutex<AppState>>,
    snapshot: &AppState,
) -> bool {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Tab => {
            app.view = app.view.next();
            app.selected = 0;
            app.scroll = 0;
        }
        KeyCode::Char(c @ '1'..='6') => {
            let index = c as usize - '1' as usize;
            app.view = View::ALL[index];
            app.selected = 0;
            app.scroll = 0;
        }
        KeyCode::Up => match app.view {
            View::Transactions => app.selected = app.selected.saturating_sub(1),
            _ => app.scroll = app.scroll.saturating_sub(1),
        },
        KeyCode::Down => match app.view {
            View::Transactions => {
                let len = filtered_orders(snapshot, app.tag_filter.as_deref()).len();
                if app.selected + 1 < len {
                    app.selected += 1;
                }
            }
            _ => app.scroll += 1,
        },
        KeyCode::Char('r') => refresh_view(app.view, client, state, snapshot),
        KeyCode::Char('[') => {
            // Widen the order window a week at a time
            let state = Arc::clone(state);
            let client = client.clone();
            tokio::spawn(async move {
                {
                    let mut s = state.lock().await;
                    s.window_from = s.window_from - ChronoDuration::days(DEFAULT_WINDOW_DAYS);
                }
                fetch_orders(client, state).await;
            });
        }
        KeyCode::Char(']') => {
            // Reset to the default window
            let state = Arc::clone(state);
            let client = client.clone();
            tokio::spawn(async move {
                {
                    let mut s = state.lock().await;
                    let now = Utc::now();
                    s.window_from = now - ChronoDuration::days(DEFAULT_WINDOW_DAYS);
                    s.window_to = now;
                }
                fetch_orders(client, state).await;
            });
        }
        KeyCode::Char('f') => {
            if app.view == View::Transactions {
                app.tag_filter = cycle_filter(app.tag_filter.take(), &snapshot.known_tags);
                app.selected = 0;
            }
        }
        KeyCode::Char('t') => {
            // Tag the maker behind the current row (or the searched
            // address)
            let target = match app.view {
                View::Transactions => filtered_orders(snapshot, app.tag_filter.as_deref())
                    .get(app.selected)
                    .map(|order| order.maker.clone()),
                View::Search => snapshot.search.as_ref().map(|s| s.address.clone()),
                _ => None,
            };
            if target.is_some() {
                app.input_mode = InputMode::Tag;
                app.input.clear();
            }
        }
        KeyCode::Char('/') | KeyCode::Char('i') => {
            if app.view == View::Search || code == KeyCode::Char('/') {
                app.view = View::Search;
                app.input_mode = InputMode::Address;
                app.input.clear();
            }
        }
        _ => {}
    }
    false
}

fn handle_input_key(
    code: KeyCode,
    app: &mut App,
    client: &ApiClient,
    state: &Arc<Mutex<AppState>>,
    snapshot: &AppState,
) {
    match code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.input.clear();
        }
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Char(c) => app.input.push(c),
        KeyCode::Enter => {
            let entered = app.input.trim().to_string();
            let mode = app.input_mode;
            app.input_mode = InputMode::Normal;
            app.input.clear();
            if entered.is_empty() {
                return;
            }
            match mode {
                InputMode::Address => {
                    spawn_search_fetch(client.clone(), Arc::clone(state), entered);
                }
                InputMode::Tag => {
                    let target = match app.view {
                        View::Transactions => {
                            filtered_orders(snapshot, app.tag_filter.as_deref())
                                .get(app.selected)
                                .map(|order| order.maker.clone())
                        }
                        View::Search => snapshot.search.as_ref().map(|s| s.address.clone()),
                        _ => None,
                    };
                    if let Some(address) = target {
                        spawn_add_tag(client.clone(), Arc::clone(state), address, entered);
                    }
                }
                InputMode::Normal => {}
            }
        }
        _ => {}
    }
}

fn refresh_view(view: View, client: &ApiClient, state: &Arc<Mutex<AppState>>, snapshot: &AppState) {
    match view {
        View::Transactions | View::Overview => {
            spawn_orders_fetch(client.clone(), Arc::clone(state))
        }
        View::Quarterly => spawn_quarterly_fetch(client.clone(), Arc::clone(state)),
        View::Thorchain => spawn_thorchain_fetch(client.clone(), Arc::clone(state)),
        View::Chainflip => spawn_chainflip_fetch(client.clone(), Arc::clone(state)),
        View::Search => {
            if let Some(search) = &snapshot.search {
                spawn_search_fetch(client.clone(), Arc::clone(state), search.address.clone());
            }
        }
    }
}

fn cycle_filter(current: Option<String>, known_tags: &[String]) -> Option<String> {
    match current {
        None => known_tags.first().cloned(),
        Some(tag) => known_tags
            .iter()
            .position(|known| *known == tag)
            .and_then(|index| known_tags.get(index + 1))
            .cloned(),
    }
}

fn filtered_orders<'a>(snapshot: &'a AppState, tag_filter: Option<&str>) -> Vec<&'a Order> {
    let Some(orders) = &snapshot.orders else {
        return Vec::new();
    };
    orders
        .iter()
        .filter(|order| tag_filter.is_none_or(|tag| order.tags.contains(tag)))
        .collect()
}

// ============================================================================
// Fetch tasks
// ============================================================================
// Failures are logged and swallowed: the view keeps showing whatever it
// had (or its empty state). There is no retry.

fn spawn_orders_fetch(client: ApiClient, state: Arc<Mutex<AppState>>) {
    tokio::spawn(fetch_orders(client, state));
}

async fn fetch_orders(client: ApiClient, state: Arc<Mutex<AppState>>) {
    let (from, to) = {
        let mut s = state.lock().await;
        s.orders_loading = true;
        (s.window_from, s.window_to)
    };

    match client.orders(from, to).await {
        Ok(mut orders) => {
            // Newest first, as the table renders top-down
            orders.reverse();
            let known_tags = unique_tags(&orders);
            info!(count = orders.len(), "order window loaded");
            let mut s = state.lock().await;
            s.known_tags = known_tags;
            s.orders = Some(orders);
            s.orders_loading = false;
            s.last_update = Utc::now();
        }
        Err(err) => {
            error!(%err, "failed to fetch order window");
            let mut s = state.lock().await;
            s.orders_loading = false;
        }
    }
}

fn spawn_quarterly_fetch(client: ApiClient, state: Arc<Mutex<AppState>>) {
    tokio::spawn(async move {
        {
            state.lock().await.quarterly_loading = true;
        }

        let today = Utc::now();
        match client.orders(october_start(today), today).await {
            Ok(orders) => {
                let rows = monthly_breakdown(&orders, &last_months(today, 3));
                let totals = quarter_totals(&rows);
                let mut s = state.lock().await;
                s.quarterly = Some(QuarterlyData { rows, totals });
                s.quarterly_loading = false;
                s.last_update = Utc::now();
            }
            Err(err) => {
                error!(%err, "failed to fetch quarterly orders");
                state.lock().await.quarterly_loading = false;
            }
        }
    });
}

fn spawn_thorchain_fetch(client: ApiClient, state: Arc<Mutex<AppState>>) {
    tokio::spawn(async move {
        {
            state.lock().await.thorchain_loading = true;
        }

        match client.thorchain().await {
            Ok(swaps) => {
                let monthly = monthly_range_stats(
                    &swaps,
                    &btc_ranges(),
                    |swap| swap.timestamp,
                    |swap| swap.btc_amount,
                    |swap| swap.btc_address.as_str(),
                );
                let mut s = state.lock().await;
                s.thorchain = Some(monthly);
                s.thorchain_loading = false;
                s.last_update = Utc::now();
            }
            Err(err) => {
                error!(%err, "failed to fetch thorchain swaps");
                state.lock().await.thorchain_loading = false;
            }
        }
    });
}

fn spawn_chainflip_fetch(client: ApiClient, state: Arc<Mutex<AppState>>) {
    tokio::spawn(async move {
        {
            state.lock().await.chainflip_loading = true;
        }

        match client.chainflip().await {
            Ok(swaps) => {
                let monthly = monthly_range_stats(
                    &swaps,
                    &btc_ranges(),
                    |swap| swap.timestamp,
                    |swap| swap.amount_btc(),
                    |swap| swap.btc_address.as_str(),
                );
                let mut s = state.lock().await;
                s.chainflip = Some(monthly);
                s.chainflip_loading = false;
                s.last_update = Utc::now();
            }
            Err(err) => {
                error!(%err, "failed to fetch chainflip swaps");
                state.lock().await.chainflip_loading = false;
            }
        }
    });
}

fn spawn_search_fetch(client: ApiClient, state: Arc<Mutex<AppState>>, address: String) {
    tokio::spawn(async move {
        {
            state.lock().await.search_loading = true;
        }

        match client.search(&address).await {
            Ok(report) => {
                let summary = address_report_summary(&report.orders);

                // Monthly series from the October anchor, window
                // filtering first, then a gap-free bucket pass
                let today = Utc::now();
                let start = october_start(today);
                let windowed: Vec<&Order> = report
                    .orders
                    .iter()
                    .filter(|order| order.created_at >= start && order.created_at <= today)
                    .collect();
                let buckets =
                    bucket_by_month(&windowed, |order| order.created_at, |order| {
                        order.quantity_btc()
                    });
                let series = filled_series(
                    &buckets,
                    MonthKey::from_datetime(&start),
                    MonthKey::from_datetime(&today),
                );
                let monthly = monthly_changes(&series);

                let mut s = state.lock().await;
                s.search = Some(SearchData {
                    address,
                    tags: report.tags,
                    orders: report.orders,
                    summary,
                    monthly,
                });
                s.search_loading = false;
                s.last_update = Utc::now();
            }
            Err(err) => {
                error!(%err, %address, "address search failed");
                state.lock().await.search_loading = false;
            }
        }
    });
}

fn spawn_add_tag(client: ApiClient, state: Arc<Mutex<AppState>>, address: String, tag: String) {
    tokio::spawn(async move {
        match client.add_tag(&address, &tag).await {
            Ok(()) => {
                info!(%address, %tag, "tag added");
                let mut s = state.lock().await;
                // Mirror the server-side association locally so the
                // views update without a refetch
                if let Some(orders) = &mut s.orders {
                    for order in orders.iter_mut().filter(|order| order.maker == address) {
                        order.tags.push(tag.clone());
                    }
                }
                if let Some(search) = &mut s.search {
                    if search.address == address {
                        search.tags.push(tag.clone());
                    }
                }
                if !s.known_tags.contains(&tag) {
                    s.known_tags.push(tag);
                }
                s.last_update = Utc::now();
            }
            Err(err) => {
                error!(%err, %address, %tag, "failed to add tag");
            }
        }
    });
}

// ============================================================================
// Rendering
// ============================================================================

/// Shorten an address for table cells: first four and last four chars.
fn trim_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }
    format!("{}..{}", &address[..4], &address[address.len() - 4..])
}

fn format_date(time: &DateTime<Utc>) -> String {
    time.format("%d/%m/%Y").to_string()
}

/// Reference-currency totals stay full precision in the aggregation
/// layer; abbreviating to millions happens here and only here.
fn format_millions(notional: f64) -> String {
    format!("{:.2}M", notional / 1_000_000.0)
}

fn ui(f: &mut Frame, app: &mut App, snapshot: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_tabs(f, chunks[0], app, snapshot);

    match app.view {
        View::Transactions => render_transactions(f, chunks[1], app, snapshot),
        View::Overview => render_overview(f, chunks[1], snapshot),
        View::Quarterly => render_quarterly(f, chunks[1], snapshot),
        View::Thorchain => render_range_view(
            f,
            chunks[1],
            " THORCHAIN BTC FLOW ",
            &snapshot.thorchain,
            snapshot.thorchain_loading,
            app.scroll,
        ),
        View::Chainflip => render_range_view(
            f,
            chunks[1],
            " CHAINFLIP BTC FLOW ",
            &snapshot.chainflip,
            snapshot.chainflip_loading,
            app.scroll,
        ),
        View::Search => render_search(f, chunks[1], snapshot),
    }

    render_footer(f, chunks[2], app);
}

fn render_tabs(f: &mut Frame, area: Rect, app: &App, snapshot: &AppState) {
    let titles: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(index, view)| {
            Line::from(vec![
                Span::styled(
                    format!("{}:", index + 1),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(view.title()),
            ])
        })
        .collect();

    let loading = snapshot.orders_loading
        || snapshot.quarterly_loading
        || snapshot.thorchain_loading
        || snapshot.chainflip_loading
        || snapshot.search_loading;
    let status = if loading { "● fetching" } else { "● idle" };
    let status_color = if loading { Color::Yellow } else { Color::Green };

    let title = Line::from(vec![
        Span::styled(
            " SWAPBOOK ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                "{} → {} ",
                snapshot.window_from.format("%d/%m/%Y"),
                snapshot.window_to.format("%d/%m/%Y")
            ),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(format!("{status} "), Style::default().fg(status_color)),
    ]);

    let tabs = Tabs::new(titles)
        .select(app.view.index())
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title_top(title),
        );

    f.render_widget(tabs, area);
}

fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let line = match app.input_mode {
        InputMode::Address => Line::from(vec![
            Span::styled("address> ", Style::default().fg(Color::Cyan)),
            Span::raw(app.input.as_str()),
            Span::styled("█", Style::default().fg(Color::Cyan)),
        ]),
        InputMode::Tag => Line::from(vec![
            Span::styled("tag> ", Style::default().fg(Color::Yellow)),
            Span::raw(app.input.as_str()),
            Span::styled("█", Style::default().fg(Color::Yellow)),
        ]),
        InputMode::Normal => {
            let filter = app
                .tag_filter
                .as_deref()
                .map(|tag| format!("  filter: {tag}"))
                .unwrap_or_default();
            Line::from(Span::styled(
                format!(
                    " [1-6] views  [Tab] next  [r] refresh  [[] wider  []] reset  [f] filter  [t] tag  [/] search  [q] quit{filter}"
                ),
                Style::default().fg(Color::DarkGray),
            ))
        }
    };

    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(paragraph, area);
}

fn empty_notice(f: &mut Frame, area: Rect, block: Block, loading: bool) {
    let message = if loading {
        "Loading..."
    } else {
        "No data available"
    };
    let paragraph = Paragraph::new(Line::from(Span::styled(
        message,
        Style::default().fg(Color::DarkGray),
    )))
    .block(block)
    .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

fn render_transactions(f: &mut Frame, area: Rect, app: &mut App, snapshot: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" TRANSACTIONS ");

    let orders = filtered_orders(snapshot, app.tag_filter.as_deref());
    if orders.is_empty() {
        empty_notice(f, area, block, snapshot.orders_loading);
        return;
    }

    app.selected = app.selected.min(orders.len() - 1);

    let total_notional: f64 = orders.iter().map(|order| order.notional()).sum();
    let total_btc: f64 = orders.iter().map(|order| order.quantity_btc()).sum();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(block.inner(area));
    f.render_widget(block, area);

    let header = Row::new(
        ["Date", "ID", "From", "To", "BTC", "Maker", "Tags"]
            .into_iter()
            .map(|title| {
                Cell::from(title).style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )
            }),
    )
    .height(1);

    // Keep the selected row visible
    let selected = app.selected;
    let visible = chunks[0].height.saturating_sub(1) as usize;
    let start = selected.saturating_sub(visible.saturating_sub(1));

    let rows = orders.iter().enumerate().skip(start).map(|(index, order)| {
        let style = if index == selected {
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let tags = if order.tags.is_tagged() {
            order.tags.labels().join(", ")
        } else {
            "--".to_string()
        };
        Row::new(vec![
            Cell::from(format_date(&order.created_at)),
            Cell::from(order.id.to_string()),
            Cell::from(order.initiator_atomic_swap.chain.clone()),
            Cell::from(order.follower_atomic_swap.chain.clone()),
            Cell::from(format!("{:.2}", order.quantity_btc())),
            Cell::from(trim_address(&order.maker)),
            Cell::from(tags),
        ])
        .style(style)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .column_spacing(2);

    f.render_widget(table, chunks[0]);

    let footer = Line::from(vec![
        Span::styled(
            format!(" {} orders ", orders.len()),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("· {total_btc:.2} BTC "),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("· {} notional", format_millions(total_notional)),
            Style::default().fg(Color::Green),
        ),
    ]);
    f.render_widget(Paragraph::new(footer), chunks[1]);
}

fn render_overview(f: &mut Frame, area: Rect, snapshot: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" VOLUME BY TAG ");

    let Some(orders) = &snapshot.orders else {
        empty_notice(f, area, block, snapshot.orders_loading);
        return;
    };

    let shares = tag_distribution(orders);
    if shares.is_empty() {
        empty_notice(f, area, block, snapshot.orders_loading);
        return;
    }

    let inner = block.inner(area);
    f.render_widget(block, area);

    // One gauge per slice, largest first
    for (index, share) in shares.iter().enumerate() {
        let y = inner.y + (index as u16) * 2;
        if y + 1 > inner.y + inner.height {
            break;
        }
        let gauge_area = Rect {
            x: inner.x,
            y,
            width: inner.width,
            height: (inner.y + inner.height - y).min(2),
        };
        let color = PALETTE[index % PALETTE.len()];
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(color))
            .ratio((share.share_pct / 100.0).clamp(0.0, 1.0))
            .label(format!(
                "{} {:.2}% (${:.2})",
                share.label, share.share_pct, share.notional
            ));
        f.render_widget(gauge, gauge_area);
    }
}

fn render_quarterly(f: &mut Frame, area: Rect, snapshot: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" LAST 3 MONTHS ");

    let Some(quarterly) = &snapshot.quarterly else {
        empty_notice(f, area, block, snapshot.quarterly_loading);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(block.inner(area));
    f.render_widget(block, area);

    let totals = &quarterly.totals;
    let summary = vec![
        Line::from(vec![
            Span::styled("Quarterly Total BTC: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{:.2}", totals.total_btc),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
            Span::styled("Tagged Contribution: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{:.2} ({:.2}%)", totals.tagged_btc, totals.tagged_share_pct()),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Tagged Volume: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format_millions(totals.tagged_notional),
                Style::default().fg(Color::Green),
            ),
            Span::raw("   "),
            Span::styled("Untagged Volume: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format_millions(totals.untagged_notional),
                Style::default().fg(Color::Yellow),
            ),
        ]),
    ];
    f.render_widget(Paragraph::new(summary).wrap(Wrap { trim: true }), chunks[0]);

    let header = Row::new(
        ["Month", "Total BTC", "Tagged BTC", "Untagged BTC", "Contribution"]
            .into_iter()
            .map(|title| {
                Cell::from(title).style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )
            }),
    )
    .height(1);

    let rows = quarterly.rows.iter().map(|row| {
        Row::new(vec![
            Cell::from(row.month.to_string()),
            Cell::from(format!("{:.2}", row.total_btc)),
            Cell::from(format!("{:.2}", row.tagged_btc)),
            Cell::from(format!("{:.2}", row.untagged_btc)),
            Cell::from(format!("{:.2}%", row.tagged_share_pct())),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(9),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .column_spacing(2);

    f.render_widget(table, chunks[1]);
}

fn render_range_view(
    f: &mut Frame,
    area: Rect,
    title: &str,
    monthly: &Option<Vec<MonthlyRangeStats>>,
    loading: bool,
    scroll: usize,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title.to_string());

    let Some(monthly) = monthly else {
        empty_notice(f, area, block, loading);
        return;
    };
    if monthly.is_empty() {
        empty_notice(f, area, block, loading);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for month_data in monthly {
        lines.push(Line::from(Span::styled(
            month_data.month.to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            format!(
                "{:<14}{:>8}{:>10}{:>16}{:>18}",
                "BTC Range", "Txs", "Addrs", "Volume", "Avg Size"
            ),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        for stat in &month_data.stats {
            lines.push(Line::from(Span::raw(format!(
                "{:<14}{:>8}{:>10}{:>12.0} BTC{:>12.6} BTC",
                stat.range,
                stat.transaction_count,
                stat.unique_addresses,
                stat.total_volume,
                stat.average_tx_size,
            ))));
        }
        lines.push(Line::from(""));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((scroll as u16, 0));
    f.render_widget(paragraph, area);
}

fn render_search(f: &mut Frame, area: Rect, snapshot: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" ADDRESS SEARCH ");

    let Some(search) = &snapshot.search else {
        let message = if snapshot.search_loading {
            "Searching..."
        } else {
            "Press / and enter an address to search"
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(
            message,
            Style::default().fg(Color::DarkGray),
        )))
        .block(block)
        .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(6),
            Constraint::Length(8),
        ])
        .split(block.inner(area));
    f.render_widget(block, area);

    let summary = &search.summary;
    let tags = if search.tags.is_empty() {
        "--".to_string()
    } else {
        search.tags.join(", ")
    };
    let head = vec![
        Line::from(vec![
            Span::styled(
                search.address.clone(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  tags: {tags}"), Style::default().fg(Color::Gray)),
        ]),
        Line::from(vec![
            Span::styled(
                format!("Transactions: {}  ", summary.transactions),
                Style::default().fg(Color::White),
            ),
            Span::styled(
                format!("Total BTC: {:.2}  ", summary.total_btc),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(
                format!("Notional: {}  ", format_millions(summary.total_notional)),
                Style::default().fg(Color::Green),
            ),
            Span::styled(
                format!("Largest: {:.2} BTC", summary.largest_btc),
                Style::default().fg(Color::Yellow),
            ),
        ]),
    ];
    f.render_widget(Paragraph::new(head).wrap(Wrap { trim: true }), chunks[0]);

    // Monthly series from October to date
    let header = Row::new(["Month", "BTC Amount", "% Change"].into_iter().map(|title| {
        Cell::from(title).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    }))
    .height(1);

    let rows = search.monthly.iter().map(|row| {
        let change = match row.change {
            Some(change) => format!("{change:+.2}%"),
            None => "N/A".to_string(),
        };
        let change_color = match row.change {
            Some(change) if change < 0.0 => Color::Red,
            Some(_) => Color::Green,
            None => Color::DarkGray,
        };
        Row::new(vec![
            Cell::from(row.month.to_string()),
            Cell::from(format!("{:.2}", row.value)),
            Cell::from(change).style(Style::default().fg(change_color)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(9),
            Constraint::Length(12),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .column_spacing(2);
    f.render_widget(table, chunks[1]);

    // Most recent orders for the address
    let mut order_lines = vec![Line::from(Span::styled(
        "Recent orders",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ))];
    for order in search.orders.iter().rev().take(6) {
        order_lines.push(Line::from(Span::raw(format!(
            "{}  #{:<7} {:<10} -> {:<10} {:>10.2} BTC",
            format_date(&order.created_at),
            order.id,
            order.initiator_atomic_swap.chain,
            order.follower_atomic_swap.chain,
            order.quantity_btc(),
        ))));
    }
    f.render_widget(Paragraph::new(order_lines), chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_address() {
        assert_eq!(
            trim_address("0x74a1b2c3d4e5f6a7b8c9c09e"),
            "0x74..c09e"
        );
        // Short addresses pass through untouched
        assert_eq!(trim_address("bc1qabc"), "bc1qabc");
    }

    #[test]
    fn test_format_date() {
        let time: DateTime<Utc> = "2024-11-04T09:12:44Z".parse().unwrap();
        assert_eq!(format_date(&time), "04/11/2024");
    }

    #[test]
    fn test_format_millions() {
        assert_eq!(format_millions(2_500_000.0), "2.50M");
        assert_eq!(format_millions(0.0), "0.00M");
    }

    #[test]
    fn test_cycle_filter_walks_tags_then_clears() {
        let tags = vec!["vip".to_string(), "whale".to_string()];
        let first = cycle_filter(None, &tags);
        assert_eq!(first.as_deref(), Some("vip"));
        let second = cycle_filter(first, &tags);
        assert_eq!(second.as_deref(), Some("whale"));
        assert_eq!(cycle_filter(second, &tags), None);
        // Unknown tag (e.g. filter survived a refetch) clears too
        assert_eq!(cycle_filter(Some("gone".to_string()), &tags), None);
    }

    #[test]
    fn test_view_cycle_covers_all() {
        let mut view = View::Transactions;
        for _ in 0..View::ALL.len() {
            view = view.next();
        }
        assert_eq!(view, View::Transactions);
    }
}
