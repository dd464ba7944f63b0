use std::fs::{self, File, OpenOptions};
use std::num::NonZeroUsize;
use std::sync::Mutex;

use accountant::config::{AppPaths, Settings};
use accountant::{EntryForm, FlowType, Ledger, LedgerStore, PaginatedView};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Flat-file expense ledger
#[derive(Parser, Debug)]
#[command(name = "accountant", version, about)]
struct Cli {
    /// Mirror log output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the application directories and an empty ledger
    Init,
    /// Add one entry to the ledger
    Add(AddArgs),
    /// Show one page of the ledger
    List {
        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        page: i64,
        /// Rows per page, defaults to the configured value
        #[arg(long)]
        page_size: Option<NonZeroUsize>,
    },
    /// Print the tag suggestions
    Tags,
    /// Show the theme, or switch it
    Theme {
        #[arg(long)]
        toggle: bool,
    },
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(long)]
    name: String,
    /// Whole amount, digits only
    #[arg(long)]
    amount: String,
    #[arg(long, default_value = "")]
    reason: String,
    #[arg(long, default_value = "")]
    tag: String,
    /// credit, debit or savings
    #[arg(long)]
    flow: Option<FlowType>,
    /// YYYY-MM-DD
    #[arg(long)]
    date: Option<NaiveDate>,
    /// HH:MM:SS
    #[arg(long)]
    time: Option<NaiveTime>,
    /// Use the current local date and time
    #[arg(long, conflicts_with_all = ["date", "time"])]
    now: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = AppPaths::new()?;

    init_logging(open_log_file(&paths), cli.verbose)?;

    let settings = Settings::load(&paths.config_file())?;
    tracing::debug!(home = %paths.base_dir().display(), command = ?cli.command, "starting");

    match cli.command {
        Command::Init => init(&paths, &settings),
        Command::Add(args) => add(&paths, &settings, args),
        Command::List { page, page_size } => list(&paths, &settings, page, page_size),
        Command::Tags => {
            for tag in &settings.tags {
                println!("{}", tag);
            }
            Ok(())
        }
        Command::Theme { toggle } => theme(&paths, settings, toggle),
    }
}

fn init_logging(log_file: Option<File>, verbose: bool) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("accountant=info")),
    );

    match log_file {
        Some(file) if verbose => builder
            .with_ansi(false)
            .with_writer(std::io::stderr.and(Mutex::new(file)))
            .try_init(),
        Some(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).try_init(),
        None => builder.with_writer(std::io::stderr).try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

// The log directory only exists once `init` has run.
fn open_log_file(paths: &AppPaths) -> Option<File> {
    let log_dir = paths.log_dir();
    if !log_dir.is_dir() {
        return None;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("accountant.log"))
        .ok()
}

fn init(paths: &AppPaths, settings: &Settings) -> Result<()> {
    let ledger = paths.ensure_store()?;

    let config_file = paths.config_file();
    if !config_file.exists() {
        settings.save(&config_file)?;
        tracing::info!(path = %config_file.display(), "wrote default config");
    }

    println!("Ledger ready at {}", ledger.display());
    Ok(())
}

fn add(paths: &AppPaths, settings: &Settings, args: AddArgs) -> Result<()> {
    let store = LedgerStore::open(settings.ledger_path(paths));
    let mut form = EntryForm::new(settings.tags.clone());

    form.set_name(args.name);
    form.set_amount(args.amount);
    form.set_reason(args.reason);
    form.set_tag(args.tag);
    if let Some(flow_type) = args.flow {
        form.set_flow_type(flow_type);
    }

    if args.now {
        let now = Local::now().naive_local();
        form.set_date(now.date());
        form.set_time(now.time());
    }
    if let Some(date) = args.date {
        form.set_date(date);
    }
    if let Some(time) = args.time {
        form.set_time(time);
    }

    let entry = form
        .submit(&store)
        .with_context(|| format!("Could not add entry to {}", store.path().display()))?;

    println!(
        "Added {} {} ({}) on {}",
        entry.flow_type, entry.amount, entry.name, entry.date_time
    );
    Ok(())
}

fn list(
    paths: &AppPaths,
    settings: &Settings,
    page: i64,
    page_size: Option<NonZeroUsize>,
) -> Result<()> {
    let store = LedgerStore::open(settings.ledger_path(paths));
    let entries = store
        .read_all()
        .with_context(|| format!("Could not read {}", store.path().display()))?;

    let mut view = PaginatedView::new(entries, page_size.unwrap_or(settings.page_size));
    view.go_to_page(page.saturating_sub(1));

    println!("{}", view);
    Ok(())
}

fn theme(paths: &AppPaths, mut settings: Settings, toggle: bool) -> Result<()> {
    if toggle {
        settings.theme = settings.theme.toggled();

        fs::create_dir_all(paths.base_dir())
            .with_context(|| format!("Failed to create {}", paths.base_dir().display()))?;
        settings.save(&paths.config_file())?;
        tracing::info!(theme = %settings.theme, "theme switched");
    }

    println!("{}", settings.theme);
    Ok(())
}
