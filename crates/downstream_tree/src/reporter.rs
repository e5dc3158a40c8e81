use std::{
    collections::HashSet,
    io::{self, Write},
    path::Path,
};

use colored::{ColoredString, Colorize};
use log::{debug, trace};

use downstream_core::{
    GlobalPath, ImportDefinition, ImportType, ModuleDefinition, reachable_from,
};

use crate::types::TreeReport;

/// Path shown to the user: relative to the project root when below it.
fn display_path(root: &Path, path: &GlobalPath) -> String {
    path.as_path()
        .strip_prefix(root)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| path.to_string())
}

fn edge_label(report: &TreeReport, import: &ImportDefinition) -> String {
    let path = display_path(&report.root, &import.path);
    match import.import_type {
        ImportType::Local => path,
        ImportType::Library => format!("{} {}", path, format!("({})", import.request).cyan()),
    }
}

/// Writes one tree per resolved entry, then the failed entries.
///
/// Back-edges to a module on the current branch are marked `(cycle)`, a module
/// already expanded under the same entry is shown once and then as `…`, and
/// targets that were never parsed (depth limit) are dimmed.
pub fn print_tree<W: Write>(writer: &mut W, report: &TreeReport) -> io::Result<()> {
    debug!("Printing import trees for {} entries", report.entries.len());

    for entry in &report.entries {
        let Some(module) = report.cache.get(entry) else {
            continue;
        };
        let reachable = reachable_from(&report.cache, entry).len();
        writeln!(
            writer,
            "{} ({} modules)",
            display_path(&report.root, entry).blue().bold(),
            reachable.to_string().cyan()
        )?;

        let mut ancestors = vec![entry.clone()];
        let mut printed = HashSet::from([entry.clone()]);
        print_children(writer, report, &module, "", &mut ancestors, &mut printed)?;
        writeln!(writer)?;
    }

    for failure in &report.failures {
        writeln!(
            writer,
            "{} {}: {}",
            "✗".red().bold(),
            display_path(&report.root, &failure.path).red(),
            failure.error
        )?;
    }

    writer.flush()?;
    Ok(())
}

fn print_children<W: Write>(
    writer: &mut W,
    report: &TreeReport,
    module: &ModuleDefinition,
    prefix: &str,
    ancestors: &mut Vec<GlobalPath>,
    printed: &mut HashSet<GlobalPath>,
) -> io::Result<()> {
    let imports = module.imports();
    for (idx, import) in imports.iter().enumerate() {
        let is_last = idx == imports.len() - 1;
        let branch = if is_last { "└── " } else { "├── " };
        let child = report.cache.get(&import.path);

        let marker: Option<ColoredString> = if ancestors.contains(&import.path) {
            Some("(cycle)".yellow())
        } else if child.is_none() {
            Some("(not expanded)".dimmed())
        } else if printed.contains(&import.path) {
            Some("…".dimmed())
        } else {
            None
        };

        let label = edge_label(report, import);
        match &marker {
            Some(marker) => writeln!(writer, "{}{}{} {}", prefix, branch.dimmed(), label, marker)?,
            None => writeln!(writer, "{}{}{}", prefix, branch.dimmed(), label)?,
        }

        if marker.is_none()
            && let Some(child) = child
        {
            trace!("Descending into {}", child.path());
            printed.insert(child.path().clone());
            ancestors.push(child.path().clone());
            let next_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
            print_children(writer, report, &child, &next_prefix, ancestors, printed)?;
            ancestors.pop();
        }
    }
    Ok(())
}

/// Writes every cached module, sorted by path, as a pretty JSON array.
pub fn print_json<W: Write>(writer: &mut W, report: &TreeReport) -> io::Result<()> {
    let modules = report.cache.modules();
    debug!("Serializing {} modules", modules.len());
    let records: Vec<&ModuleDefinition> = modules.iter().map(|m| m.as_ref()).collect();
    serde_json::to_writer_pretty(&mut *writer, &records).map_err(io::Error::from)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

pub fn print_summary<W: Write>(writer: &mut W, report: &TreeReport) -> io::Result<()> {
    writeln!(writer, "{}", "─".repeat(60).dimmed())?;
    writeln!(writer, "{}", "Summary".bold())?;
    writeln!(writer, "  Entries resolved: {}", report.entries.len().to_string().cyan().bold())?;
    writeln!(writer, "  Modules cached: {}", report.cache.len().to_string().cyan())?;
    writeln!(writer, "  Files parsed: {}", report.modules_parsed.to_string().cyan())?;
    if !report.failures.is_empty() {
        writeln!(writer, "  Failed entries: {}", report.failures.len().to_string().red().bold())?;
    }
    writer.flush()?;
    Ok(())
}
