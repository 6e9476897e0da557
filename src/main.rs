extern crate argparse;
extern crate parm;

mod command_line_args;

use command_line_args::parse_args_or_exit;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let arguments = parse_args_or_exit();
    init_logging(arguments.verbose);
    if !arguments.params.rules_enabled() {
        info!("No minimum confidence given, skipping rule generation.");
    }

    match parm::run(&arguments.params) {
        Ok(summary) => {
            info!(
                "{} transactions, support count {}: {} frequent items, {} closed patterns, {} itemsets.",
                summary.num_transactions,
                summary.min_support,
                summary.frequent_items,
                summary.closed_patterns,
                summary.itemsets
            );
            if let Some(rules) = summary.rules {
                info!("{} rules written.", rules);
            }
        }
        Err(err) => {
            error!("Error: {}", err);
            process::exit(1);
        }
    }
}
