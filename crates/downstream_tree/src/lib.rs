//! The `tree` command: resolve entry files and print their import trees.
//!
//! # Examples
//!
//! ```no_run
//! use clap::Parser;
//! use downstream_tree::{Config, run_tree};
//! use std::io::{BufWriter, Write};
//!
//! # fn main() -> anyhow::Result<()> {
//! let cfg = Config::parse_from(["tree", "--root", "/path/to/repo", "--depth", "2"]);
//! let report = run_tree(cfg)?;
//!
//! let mut stdout = BufWriter::new(std::io::stdout());
//! downstream_tree::print_tree(&mut stdout, &report)?;
//! downstream_tree::print_summary(&mut stdout, &report)?;
//! stdout.flush()?;
//! # Ok(())
//! # }
//! ```

mod config;
mod reporter;
mod runner;
mod types;

pub use config::Config;
pub use reporter::{print_json, print_summary, print_tree};
pub use runner::run_tree;
pub use types::{EntryFailure, TreeReport};
