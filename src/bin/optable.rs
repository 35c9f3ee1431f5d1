#![forbid(unsafe_code)]
//! Browse, filter and export ledger operations from the terminal

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use optable::cli::{init_logging, open_source};
use optable::config::{load_config_from, Config, SourceKind};
use optable::error::OpTableError;
use optable::export::{fetch_all, write_csv};
use optable::fetcher::{FetchLimits, FetchResult, NavState, OperationFetcher};
use optable::filter::type_filter_from_query;
use optable::record::{OperationType, Record};
use optable::source::{AnySource, OperationQuery, SqliteSource};
use optable::table;

#[derive(Parser)]
#[command(name = "optable", about = "Paginated, type-filterable ledger operations")]
struct Cli {
    /// Path to the config file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Record source, overrides `source.kind`
    #[arg(long, value_enum)]
    source: Option<SourceArg>,

    /// Horizon base URL, overrides `source.horizon_url`
    #[arg(long)]
    horizon_url: Option<String>,

    /// SQLite database, overrides `source.database_path`
    #[arg(long)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Horizon,
    Sqlite,
    Memory,
}

#[derive(clap::Args)]
struct Selection {
    /// Only operations of this account
    #[arg(long)]
    account: Option<String>,

    /// Only operations of this transaction
    #[arg(long)]
    tx: Option<String>,

    /// Keep only operations of this type
    #[arg(long = "type")]
    op_type: Option<String>,

    /// Take the type filter from a URL query string (`opTypeFilter=...`)
    #[arg(long, conflicts_with = "op_type")]
    query: Option<String>,

    /// Operations per page, overrides `fetch.page_limit`
    #[arg(long)]
    limit: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Page through operations interactively
    Browse {
        #[command(flatten)]
        selection: Selection,

        /// Hide the transaction and type columns
        #[arg(long)]
        compact: bool,

        /// Print the first page and exit
        #[arg(long)]
        once: bool,
    },
    /// Write every matching operation to a CSV file
    Export {
        #[command(flatten)]
        selection: Selection,

        #[arg(long, short)]
        out: PathBuf,
    },
    /// Load operations from a JSON file into the SQLite source
    Import {
        /// A JSON array of operations or a Horizon page
        file: PathBuf,
    },
    /// List known operation types
    Types,
}

fn apply_overrides(cli: &Cli, config: &mut Config) {
    if let Some(kind) = cli.source {
        config.source.kind = match kind {
            SourceArg::Horizon => SourceKind::Horizon,
            SourceArg::Sqlite => SourceKind::Sqlite,
            SourceArg::Memory => SourceKind::Memory,
        };
    }
    if let Some(url) = &cli.horizon_url {
        config.source.horizon_url = url.clone();
    }
    if let Some(db) = &cli.db {
        config.source.database_path = db.clone();
    }
}

fn build_fetcher<'a>(
    source: &'a AnySource,
    selection: &Selection,
    config: &Config,
) -> OperationFetcher<&'a AnySource> {
    let mut query = OperationQuery::new();
    if let Some(tx) = &selection.tx {
        query = query.for_transaction(tx);
    }
    if let Some(account) = &selection.account {
        query = query.for_account(account);
    }
    let filter = selection
        .op_type
        .clone()
        .or_else(|| selection.query.as_deref().and_then(type_filter_from_query));

    OperationFetcher::new(
        source,
        query,
        selection.limit.unwrap_or(config.fetch.page_limit),
    )
    .with_filter(filter)
    .with_limits(FetchLimits {
        max_total_records: config.fetch.max_total_records,
    })
}

fn print_page(fetcher: &OperationFetcher<&AnySource>, page: &FetchResult, compact: bool, nav: &NavState) {
    println!();
    if let Some(filter) = fetcher.filter() {
        println!("{}", format!("🔎 Filter: {}", filter).cyan());
    }
    if page.records.is_empty() {
        println!("{}", "📭 No operations on this page".yellow());
    } else {
        println!("{}", table::render(&page.records, compact));
    }
    if let Some(note) = table::disclaimer(fetcher.filter(), page.possibly_more_data_available) {
        println!("{}", note.yellow());
    }
    println!(
        "{}",
        format!(
            "page {} · {} scanned in {} request(s)",
            nav.history().len() + 1,
            page.total_fetched,
            page.pages_fetched
        )
        .bright_black()
    );
}

async fn browse(
    fetcher: OperationFetcher<&AnySource>,
    compact: bool,
    once: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut nav = NavState::new();
    let mut page = fetcher.fetch_records().await?;
    print_page(&fetcher, &page, compact, &nav);
    if once {
        return Ok(());
    }

    let stdin = io::stdin();
    loop {
        print!("{}", "[n]ext  [p]rev  [q]uit > ".bright_cyan());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        page = match line.trim() {
            "n" | "next" => fetcher.next(&mut nav, &page).await?,
            "p" | "prev" => fetcher.prev(&mut nav, &page).await?,
            "q" | "quit" => break,
            other => {
                println!("{}", format!("Unknown command: {}", other).red());
                continue;
            }
        };
        print_page(&fetcher, &page, compact, &nav);
    }
    Ok(())
}

fn read_import_file(file: &Path) -> Result<Vec<Record>, OpTableError> {
    let body = std::fs::read_to_string(file)?;
    match serde_json::from_str::<Vec<Record>>(&body) {
        Ok(records) => Ok(records),
        Err(_) => Ok(optable::source::horizon::parse_page(&body)?.records),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_config_from(&cli.config)?;
    apply_overrides(&cli, &mut config);
    config.validate()?;
    init_logging(&config.logging.level);

    match &cli.command {
        Command::Types => {
            println!("{}", "Operation types".bright_green().underline());
            for t in OperationType::ALL {
                println!("  - {}", t.as_str().bright_white());
            }
        }
        Command::Import { file } => {
            let records = read_import_file(file)?;
            let db = SqliteSource::open(&config.source.database_path)?;
            let written = db.insert_records(&records)?;
            println!(
                "{}",
                format!(
                    "✅ Imported {} operation(s) into {} ({} total)",
                    written,
                    config.source.database_path,
                    db.count()?
                )
                .green()
            );
        }
        Command::Browse {
            selection,
            compact,
            once,
        } => {
            let source = open_source(&config)?;
            let fetcher = build_fetcher(&source, selection, &config);
            browse(fetcher, *compact, *once).await?;
        }
        Command::Export { selection, out } => {
            let source = open_source(&config)?;
            let fetcher = build_fetcher(&source, selection, &config);
            let records = fetch_all(&fetcher, config.fetch.max_export_pages).await?;
            let file = std::fs::File::create(out)?;
            write_csv(&records, io::BufWriter::new(file))?;
            println!(
                "{}",
                format!("✅ Exported {} operation(s) to {}", records.len(), out.display()).green()
            );
        }
    }

    Ok(())
}
