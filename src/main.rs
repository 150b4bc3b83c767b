mod cache;
mod commands;
mod config;
mod context;
mod diagnostics;
mod error;
mod escape;
mod fundamental;
mod grammar;
mod namespace;
mod resolver;
mod scanner;
mod tagfile;
mod types;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `CPPTAGS_LOG=debug`.
const LOG_ENV: &str = "CPPTAGS_LOG";

#[derive(Parser)]
#[command(name = "cpptags", version, about = "Link C++ symbols in AsciiDoc to doxygen tagfile documentation")]
struct Cli {
    /// The subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Resolve every cpp: macro in the scanned pages and report failures (exit 1 if any)
    Check,
    /// Print a page with its cpp: macros replaced by links
    Render {
        /// AsciiDoc page to render
        file: String,
        /// Component whose tagfiles apply (default: from the page's directory)
        #[arg(long)]
        component: Option<String>,
    },
    /// Print the link for one symbol (exit 1 if unresolved)
    Resolve {
        /// Symbol such as `std::vector<int>` or `<algorithm>`
        symbol: String,
        /// Link text to show instead of the symbol
        #[arg(long)]
        text: Option<String>,
        /// Component whose tagfiles apply
        #[arg(long)]
        component: Option<String>,
        /// Print JSON instead of the bare link
        #[arg(long)]
        json: bool,
    },
    /// List registered tagfiles in lookup order
    Tagfiles {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Manage implicit using-namespace rules
    Using {
        /// The using-namespace action.
        #[command(subcommand)]
        action: UsingAction,
    },
}

/// `cpptags using` actions.
#[derive(Subcommand)]
enum UsingAction {
    /// Add a using-namespace rule
    Add {
        /// Namespace such as `boost::urls`
        namespace: String,
        /// Restrict the rule to one component
        #[arg(long)]
        component: Option<String>,
    },
    /// List rules in the order they are tried
    List,
    /// Remove a using-namespace rule
    Remove {
        /// Namespace to remove
        namespace: String,
        /// Component the rule was restricted to
        #[arg(long)]
        component: Option<String>,
    },
}

/// Install the stderr log subscriber, filtered by `CPPTAGS_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_err| return EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
    return;
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check => commands::check(),
        Commands::Render { file, component } => {
            commands::render(&file, component.as_deref()).map(|()| return ExitCode::SUCCESS)
        },
        Commands::Resolve { symbol, text, component, json } => {
            commands::resolve(&symbol, text.as_deref(), component.as_deref(), json)
        },
        Commands::Tagfiles { json } => commands::tagfiles(json).map(|()| return ExitCode::SUCCESS),
        Commands::Using { action } => run_using(action).map(|()| return ExitCode::SUCCESS),
    };

    return match result {
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(2)
        },
        Ok(code) => code,
    };
}

/// Dispatch a `cpptags using` action.
///
/// # Errors
///
/// Returns errors from config reading or writing.
fn run_using(action: UsingAction) -> Result<(), error::Error> {
    return match action {
        UsingAction::Add { namespace, component } => namespace::cmd_add(&namespace, component.as_deref()),
        UsingAction::List => namespace::cmd_list(),
        UsingAction::Remove { namespace, component } => namespace::cmd_remove(&namespace, component.as_deref()),
    };
}
