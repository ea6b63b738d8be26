// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crypto_list::config::DEFAULT_CONFIG_FILE;
use crypto_list::{load_csv, AppConfig, Coin, FilterKind, FilterPanel, Session, SqliteCacheStore};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "crypto-list", version, about = "Cached, filterable crypto coin list")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Skip the connectivity probe and behave as offline
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive terminal UI (default)
    Tui,
    /// Load once and print the list
    List {
        /// Filter by option (active, inactive, tokens, coins, new); repeatable
        #[arg(long = "filter")]
        filters: Vec<String>,
        /// Case-insensitive search on name or symbol
        #[arg(long)]
        search: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Seed the cache from a CSV file (name,symbol,is_new,is_active,type)
    Import { csv: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => run_ui_mode(&config, cli.offline),
        Command::List { filters, search, json } => {
            config.logging.init();
            run_list(&config, cli.offline, &filters, search.as_deref(), json).await
        }
        Command::Import { csv } => {
            config.logging.init();
            run_import(&config, &csv)
        }
    }
}

async fn run_list(
    config: &AppConfig,
    offline: bool,
    filters: &[String],
    query: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut panel = FilterPanel::default();
    for name in filters {
        let Some(kind) = FilterKind::parse(name) else {
            bail!("Unknown filter '{}'", name);
        };
        panel.toggle_kind(kind);
    }

    let session = Session::build(config, offline)?;
    session.refresh().await.context("Load task failed")?;

    let engine = &session.engine;
    let mut coins = if panel.has_selection() {
        engine.apply_filter(&panel.selected())
    } else {
        engine.displayed()
    };
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        coins = engine.search(query);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&coins)?);
        return Ok(());
    }

    if coins.is_empty() {
        if let Some(state) = engine.empty_state() {
            println!("{}", state.message());
        }
        return Ok(());
    }

    print_table(&coins);
    Ok(())
}

fn print_table(coins: &[Coin]) {
    println!("{:<24} {:<8} {:<6} {:<14} {}", "NAME", "SYMBOL", "TYPE", "ICON", "BADGE");
    for coin in coins {
        let badge = match (coin.display.show_badge, coin.is_active) {
            (true, false) => "INACTIVE",
            (true, true) => "NEW",
            _ => "",
        };
        println!(
            "{:<24} {:<8} {:<6} {:<14} {}",
            coin.display_name(),
            coin.display_symbol(),
            coin.coin_type.as_deref().unwrap_or("-"),
            coin.display.image_key.as_deref().unwrap_or("-"),
            badge,
        );
    }
}

fn run_import(config: &AppConfig, csv_path: &Path) -> Result<()> {
    let Some(db_path) = &config.cache.path else {
        bail!("No cache path configured; set [cache].path or {}", crypto_list::config::ENV_DB);
    };

    println!("📂 Loading CSV...");
    let coins = load_csv(csv_path)
        .with_context(|| format!("Failed to read {}", csv_path.display()))?;
    println!("✓ Loaded {} coins from CSV", coins.len());

    let store = SqliteCacheStore::open(db_path)
        .with_context(|| format!("Failed to open cache at {}", db_path.display()))?;
    let inserted = store.try_save(&coins)?;

    println!("✓ Cache now holds {} coins ({})", inserted, db_path.display());
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig, offline: bool) -> Result<()> {
    config.logging.init_to_file()?;

    let session = Session::build(config, offline)?;
    let mut app = ui::App::new(session);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AppConfig, _offline: bool) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: crypto-list list");
    std::process::exit(1);
}
