use anyhow::{Context, Result};
use cdr_billing::analyzer::CdrAnalyzer;
use cdr_billing::config::get_config;
use cdr_billing::display::DisplayManager;
use cdr_billing::logging::init_logging;
use cdr_billing::prefix_table::PrefixTable;
use cdr_billing::reconciler::{ClientBook, RevenueMode};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "cdr-billing")]
#[command(about = "Classify, cost and reconcile telephone call detail records")]
#[command(version)]
struct Cli {
    /// CDR CSV file or glob pattern (repeatable)
    #[arg(long, short, global = true)]
    input: Vec<String>,

    /// Prefix table JSON file replacing the built-in tariffs
    #[arg(long, global = true)]
    prefixes: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Show at most N entries (terminal and JSON)
    #[arg(long, global = true)]
    limit: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Calls, duration and cost per category type
    Summary,
    /// Calls, duration and cost per tariff description
    Detail,
    /// Per-caller breakdown
    Callers,
    /// Calls grouped into macro categories
    Macro,
    /// Calendar month totals
    Monthly,
    /// Revenue and margin per billing client
    Clients {
        /// Client book JSON file
        #[arg(long)]
        book: Option<PathBuf>,
    },
    /// Print the active prefix table
    Prefixes,
    /// Classify dialed numbers against the active table
    Classify {
        #[arg(required = true)]
        numbers: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    let _guard = init_logging();

    let command = cli.command.unwrap_or(Commands::Summary);
    if let Err(e) = run(command, &cli.input, cli.prefixes.as_deref(), cli.json, cli.limit) {
        handle_error(e, cli.json);
    }
}

fn run(
    command: Commands,
    inputs: &[String],
    prefixes: Option<&Path>,
    json: bool,
    limit: Option<usize>,
) -> Result<()> {
    let config = get_config();
    let display = DisplayManager::with_json_pretty(config.output.json_pretty);

    let mut analyzer = CdrAnalyzer::from_config(config)?;
    if let Some(path) = prefixes {
        analyzer.replace_table(PrefixTable::load_from_file(path)?);
    }

    match &command {
        Commands::Prefixes => {
            display.display_prefixes(analyzer.table(), json);
            return Ok(());
        }
        Commands::Classify { numbers } => {
            let results: Vec<_> = numbers
                .iter()
                .map(|n| {
                    let classification = analyzer.classifier().classify_raw(n, analyzer.table());
                    (n.clone(), classification)
                })
                .collect();
            display.display_classifications(&results, json);
            return Ok(());
        }
        _ => {}
    }

    if inputs.is_empty() {
        anyhow::bail!("No input files given (use --input <FILE|GLOB>)");
    }
    for input in inputs {
        if Path::new(input).is_file() {
            analyzer.import_file(Path::new(input))?;
        } else {
            analyzer.import_glob(input)?;
        }
    }

    // The configured default only trims terminal reports; JSON stays complete
    // unless --limit is given.
    let limit = if json {
        limit
    } else {
        limit.or(Some(config.output.default_limit))
    };
    match command {
        Commands::Summary => {
            display.display_summary("summary", "Call Report - By Category", &analyzer.summary(), limit, json)
        }
        Commands::Detail => display.display_summary(
            "detail",
            "Call Report - By Destination",
            &analyzer.detailed_summary(),
            limit,
            json,
        ),
        Commands::Macro => display.display_summary(
            "macro",
            "Call Report - By Macro Category",
            &analyzer.macro_summary(),
            limit,
            json,
        ),
        Commands::Callers => display.display_callers(&analyzer.caller_analysis(), limit, json),
        Commands::Monthly => display.display_monthly(&analyzer.monthly_summary(), limit, json),
        Commands::Clients { book } => {
            let book_path = book
                .or_else(|| config.paths.clients.clone())
                .context("No client book given (use --book <JSON>)")?;
            let book = ClientBook::load_from_file(&book_path)?;
            let result = analyzer.reconcile(&book, RevenueMode::from_config(&config.reconciler));
            display.display_reconciliation(&result, limit, json);
        }
        Commands::Prefixes | Commands::Classify { .. } => {}
    }

    Ok(())
}

fn handle_error(e: anyhow::Error, json: bool) -> ! {
    if json {
        println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
    } else {
        eprintln!("Error: {:#}", e);
    }
    process::exit(1);
}
