use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use downstream_tree::Config;
use log::{debug, info};
use std::io::{BufWriter, Write};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "downstream")]
#[command(about = "Import resolution and dependency graphs for JavaScript/TypeScript monorepos", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the resolved import tree of entry files
    Tree(Config),
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let start = Instant::now();

    match cli.command {
        Commands::Tree(cfg) => {
            let num_threads = rayon::current_num_threads();
            info!("Resolving import trees (using {} threads)", num_threads);
            debug!("Config: root={:?}, entry_glob={:?}", cfg.root, cfg.entry_glob);

            let json = cfg.json;
            let report = downstream_tree::run_tree(cfg)?;
            let elapsed_ms = start.elapsed().as_millis();

            if json {
                downstream_tree::print_json(&mut stdout, &report)?;
            } else {
                downstream_tree::print_tree(&mut stdout, &report)?;
                downstream_tree::print_summary(&mut stdout, &report)?;
                writeln!(
                    stdout,
                    "\n{} {} modules in {}ms (using {} threads).",
                    "●".bright_blue(),
                    report.cache.len().to_string().cyan(),
                    elapsed_ms.to_string().cyan(),
                    num_threads.to_string().cyan()
                )?;
            }
            stdout.flush()?;

            if !report.failures.is_empty() {
                // Non-zero exit when any entry failed to resolve
                std::process::exit(1);
            }

            Ok(())
        }
    }
}
