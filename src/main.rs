//! Transaction Categorization Engine CLI
//!
//! Command-line interface for categorizing bank transactions from CSV files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --rules rules.csv --categories categories.csv transactions.csv > categorized.csv
//! cargo run -- --strategy sync --rules rules.csv --categories categories.csv transactions.csv
//! cargo run -- --company 7 --rules rules.csv --categories categories.csv transactions.csv
//! cargo run -- --batch-size 2000 --max-concurrent 8 --rules rules.csv --categories categories.csv transactions.csv
//! ```
//!
//! The program loads the category and rule tables, categorizes every
//! transaction of the selected companies and writes each transaction with its
//! final category to stdout. Logs go to stderr.
//!
//! # Processing Strategies
//!
//! - **sync**: Sequential categorization, one company after another
//! - **async**: Concurrent categorization with id-partitioned workers (default)
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, malformed rule table, etc.)

use categorization_engine::cli;
use categorization_engine::strategy;
use std::process;

fn init_logging(level: Option<&str>) {
    tracing_subscriber::fmt()
        .with_env_filter(cli::env_filter(level))
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = cli::parse_args();
    init_logging(args.log_level.as_deref());

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy, config)
    };

    let mut output = std::io::stdout();
    match strategy.process(&args.to_run_inputs(), &mut output) {
        Ok(summaries) => {
            for summary in &summaries {
                tracing::info!(
                    company = summary.company,
                    categorized = summary.categorized_count,
                    total = summary.total_transactions,
                    rate = summary.categorization_rate(),
                    "Company categorized"
                );
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Categorization failed");
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
