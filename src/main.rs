// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

use finance_buddy::charts::Dimensions;
use finance_buddy::format::{format_currency, format_currency_cents, format_date, format_percentage};
use finance_buddy::ledger::{cash_flow, monthly_spending_by_category, transactions_by_month};
use finance_buddy::logging;
use finance_buddy::net_worth::Reconciliation;
use finance_buddy::sample_data;
use finance_buddy::statements::select_statement;
use finance_buddy::{
    AppConfig, AssetForm, DebtForm, Session, SortDirection, SortField, SqliteStore, Storage,
    TransactionQuery,
};

#[derive(Parser)]
#[command(name = "finance-buddy", version, about = "Track net worth, assets, debts and spending")]
struct Cli {
    /// Configuration file layered over the default locations
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file (overrides data.path)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Without a subcommand the terminal UI starts
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Net worth cards and this month's cash flow
    Dashboard,
    /// Aggregate figures as JSON
    Summary,
    /// Record today's net worth snapshot
    Snapshot,
    Asset {
        #[command(subcommand)]
        action: AssetAction,
    },
    Debt {
        #[command(subcommand)]
        action: DebtAction,
    },
    /// List transactions
    Transactions {
        #[arg(long, value_enum, default_value_t = SortArg::Date)]
        sort: SortArg,
        /// Ascending order (default is descending)
        #[arg(long)]
        asc: bool,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        search: Option<String>,
        /// Restrict to one month, e.g. 2024-06
        #[arg(long)]
        month: Option<String>,
    },
    /// Render a chart as SVG
    Chart {
        #[command(subcommand)]
        kind: ChartKind,
    },
    /// Write assets, debts and snapshots as JSON
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load an export file
    Import { file: PathBuf },
    /// Pick a bank statement CSV
    ImportCsv { file: PathBuf },
    /// Replace all data with six months of demo data
    Seed,
    /// Delete all stored data
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum AssetAction {
    List,
    Add {
        name: String,
        value: String,
        #[arg(long)]
        home_equity: bool,
    },
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        value: Option<String>,
        #[arg(long)]
        home_equity: Option<bool>,
    },
    Remove { id: String },
}

#[derive(Subcommand)]
enum DebtAction {
    List,
    Add {
        name: String,
        balance: String,
        #[arg(long)]
        rate: Option<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        balance: Option<String>,
        #[arg(long)]
        rate: Option<String>,
    },
    Remove { id: String },
}

#[derive(Subcommand)]
enum ChartKind {
    Trend {
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        width: Option<f64>,
        #[arg(long)]
        height: Option<f64>,
    },
    Allocation {
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        width: Option<f64>,
        #[arg(long)]
        height: Option<f64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Date,
    Amount,
    Description,
    Category,
}

impl From<SortArg> for SortField {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Date => SortField::Date,
            SortArg::Amount => SortField::Amount,
            SortArg::Description => SortField::Description,
            SortArg::Category => SortField::Category,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    }
    .context("loading configuration")?;
    if let Some(db) = cli.db {
        config.data.path = db;
    }

    match cli.command {
        None => run_ui_mode(&config),
        Some(command) => {
            logging::init_stderr(&config.log.filter);
            run_command(command, &config)
        }
    }
}

fn open_session(config: &AppConfig) -> Result<Session<SqliteStore>> {
    let path = &config.data.path;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating data directory {}", dir.display()))?;
    }

    let store = SqliteStore::open(path).with_context(|| format!("opening database {}", path.display()))?;
    Ok(Session::load(Storage::new(store)))
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
            println!("✓ Wrote {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn run_command(command: Command, config: &AppConfig) -> Result<()> {
    let mut session = open_session(config)?;

    match command {
        Command::Dashboard => print_dashboard(&session),
        Command::Summary => {
            println!("{}", serde_json::to_string_pretty(&session.dashboard())?);
        }
        Command::Snapshot => {
            let outcome = session.record_snapshot();
            let summary = session.summary();
            match outcome {
                Reconciliation::Appended => println!("✓ Recorded snapshot for today"),
                Reconciliation::Replaced(_) => println!("✓ Updated today's snapshot"),
            }
            println!("  Net worth: {}", format_currency(summary.total_net_worth));
        }
        Command::Asset { action } => run_asset(&mut session, action)?,
        Command::Debt { action } => run_debt(&mut session, action)?,
        Command::Transactions { sort, asc, category, search, month } => {
            let query = TransactionQuery {
                sort_field: sort.into(),
                direction: if asc { SortDirection::Asc } else { SortDirection::Desc },
                category,
                search: search.unwrap_or_default(),
            };
            let rows = match month {
                Some(month) => {
                    let (year, month) = parse_month(&month)?;
                    let in_month: Vec<_> = transactions_by_month(session.transactions(), year, month)
                        .into_iter()
                        .cloned()
                        .collect();
                    query.apply(&in_month).into_iter().cloned().collect::<Vec<_>>()
                }
                None => session.ledger(&query).into_iter().cloned().collect(),
            };

            println!("{:<12} {:<28} {:<15} {:<8} {:>12}", "Date", "Description", "Category", "Source", "Amount");
            println!("{}", "─".repeat(79));
            for tx in &rows {
                println!(
                    "{:<12} {:<28} {:<15} {:<8} {:>12}",
                    format_date(&tx.date),
                    tx.description,
                    tx.category,
                    tx.source.as_str(),
                    format_currency_cents(tx.amount)
                );
            }
            let flow = cash_flow(&rows);
            println!("{}", "─".repeat(79));
            println!(
                "{} transactions | in {} | out {} | net {}",
                rows.len(),
                format_currency_cents(flow.income),
                format_currency_cents(flow.expenses),
                format_currency_cents(flow.net)
            );
        }
        Command::Chart { kind } => {
            let (svg, output) = match kind {
                ChartKind::Trend { output, width, height } => {
                    let dims = override_dims(config.charts.trend(), width, height)?;
                    (session.trend_chart(dims).to_svg(), output)
                }
                ChartKind::Allocation { output, width, height } => {
                    let dims = override_dims(config.charts.allocation(), width, height)?;
                    (session.allocation_chart(dims).to_svg(), output)
                }
            };
            write_output(output.as_deref(), &svg)?;
        }
        Command::Export { output } => {
            let json = session.export().context("exporting data")?;
            write_output(output.as_deref(), &json)?;
        }
        Command::Import { file } => {
            let json = fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
            let summary = session
                .try_import(&json)
                .with_context(|| format!("importing {}", file.display()))?;

            println!("✓ Imported {}", file.display());
            for (label, count) in [
                ("assets", summary.assets),
                ("debts", summary.debts),
                ("snapshots", summary.net_worth_snapshots),
            ] {
                if let Some(count) = count {
                    println!("  {} {}", count, label);
                }
            }
        }
        Command::ImportCsv { file } => {
            let selection = select_statement(&file);
            println!("Selected: {}", selection.file_name);
            println!("{}", selection.message);
        }
        Command::Seed => {
            session.seed(
                sample_data::sample_assets(),
                sample_data::sample_debts(),
                sample_data::sample_transactions(),
                sample_data::sample_snapshots(),
            );
            println!(
                "✓ Seeded {} assets, {} debts, {} transactions, {} snapshots",
                session.assets().len(),
                session.debts().len(),
                session.transactions().len(),
                session.snapshots().len()
            );
        }
        Command::Clear { yes } => {
            if !yes {
                bail!("refusing to delete all data without --yes");
            }
            session.clear();
            println!("✓ Cleared all data");
        }
    }

    Ok(())
}

fn override_dims(base: Dimensions, width: Option<f64>, height: Option<f64>) -> Result<Dimensions> {
    let dims = Dimensions::new(width.unwrap_or(base.width), height.unwrap_or(base.height));
    if !(dims.width > 0.0 && dims.height > 0.0) {
        bail!("chart size must be positive, got {}x{}", dims.width, dims.height);
    }
    Ok(dims)
}

fn parse_month(raw: &str) -> Result<(i32, u32)> {
    let (year, month) = raw
        .split_once('-')
        .with_context(|| format!("expected YYYY-MM, got '{}'", raw))?;
    let year: i32 = year.parse().with_context(|| format!("invalid year in '{}'", raw))?;
    let month: u32 = month.parse().with_context(|| format!("invalid month in '{}'", raw))?;
    if !(1..=12).contains(&month) {
        bail!("month must be 1-12, got {}", month);
    }
    Ok((year, month))
}

fn run_asset(session: &mut Session<SqliteStore>, action: AssetAction) -> Result<()> {
    match action {
        AssetAction::List => {
            println!("{:<38} {:<24} {:>12}  {}", "ID", "Name", "Value", "Type");
            for asset in session.assets() {
                println!(
                    "{:<38} {:<24} {:>12}  {}",
                    asset.id,
                    asset.name,
                    format_currency(asset.value),
                    if asset.is_home_equity { "home equity" } else { "liquid" }
                );
            }
        }
        AssetAction::Add { name, value, home_equity } => {
            let form = AssetForm { name, value, is_home_equity: home_equity };
            let asset = session.save_asset_form(&form, None)?;
            println!("✓ Added {} ({})", asset.name, asset.id);
        }
        AssetAction::Edit { id, name, value, home_equity } => {
            let existing = session.asset(&id).with_context(|| format!("no asset with id {}", id))?;
            let mut form = AssetForm::from_asset(existing);
            if let Some(name) = name {
                form.name = name;
            }
            if let Some(value) = value {
                form.value = value;
            }
            if let Some(home_equity) = home_equity {
                form.is_home_equity = home_equity;
            }
            let asset = session.save_asset_form(&form, Some(&id))?;
            println!("✓ Updated {}", asset.name);
        }
        AssetAction::Remove { id } => {
            if !session.remove_asset(&id) {
                bail!("no asset with id {}", id);
            }
            println!("✓ Removed asset {}", id);
        }
    }
    Ok(())
}

fn run_debt(session: &mut Session<SqliteStore>, action: DebtAction) -> Result<()> {
    match action {
        DebtAction::List => {
            println!("{:<38} {:<24} {:>12}  {}", "ID", "Name", "Balance", "Rate");
            for debt in session.debts() {
                println!(
                    "{:<38} {:<24} {:>12}  {}",
                    debt.id,
                    debt.name,
                    format_currency(debt.balance),
                    debt.interest_rate.map(format_percentage).unwrap_or_else(|| "-".to_string())
                );
            }
        }
        DebtAction::Add { name, balance, rate } => {
            let form = DebtForm {
                name,
                balance,
                interest_rate: rate.unwrap_or_default(),
            };
            let debt = session.save_debt_form(&form, None)?;
            println!("✓ Added {} ({})", debt.name, debt.id);
        }
        DebtAction::Edit { id, name, balance, rate } => {
            let existing = session.debt(&id).with_context(|| format!("no debt with id {}", id))?;
            let mut form = DebtForm::from_debt(existing);
            if let Some(name) = name {
                form.name = name;
            }
            if let Some(balance) = balance {
                form.balance = balance;
            }
            if let Some(rate) = rate {
                form.interest_rate = rate;
            }
            let debt = session.save_debt_form(&form, Some(&id))?;
            println!("✓ Updated {}", debt.name);
        }
        DebtAction::Remove { id } => {
            if !session.remove_debt(&id) {
                bail!("no debt with id {}", id);
            }
            println!("✓ Removed debt {}", id);
        }
    }
    Ok(())
}

fn print_dashboard(session: &Session<SqliteStore>) {
    let dashboard = session.dashboard();

    println!("💰 Finance Buddy");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Total Net Worth   {:>14}", format_currency(dashboard.total_net_worth));
    println!("  Liquid Net Worth  {:>14}", format_currency(dashboard.liquid_net_worth));
    println!("  Home Equity       {:>14}", format_currency(dashboard.home_equity));
    println!("  Total Debts       {:>14}", format_currency(dashboard.total_debts));

    if let Some(latest) = &dashboard.latest_snapshot {
        println!("  Last snapshot     {:>14}", format_date(&latest.date));
    }

    let now = session.now();
    let spending = monthly_spending_by_category(session.transactions(), now.year(), now.month());
    if !spending.is_empty() {
        println!("\n📊 Spending this month");
        for (category, amount) in &spending {
            println!("  {:<16} {:>12}", category, format_currency_cents(*amount));
        }
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig) -> Result<()> {
    let _log_guard = logging::init_file(&config.log.filter, &config.log_file())?;

    let session = open_session(config)?;
    let mut app = ui::App::new(session, config.charts.trend(), config.charts.allocation());
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AppConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or run a subcommand, e.g. finance-buddy dashboard");
    std::process::exit(1);
}
