//! Filtering gene designations by an expression-derived gene list.

use crate::reader::InputError;
use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Separator between alternate names of a single gene in the
/// highly-expressed gene list.
const NAME_SEPARATOR: &str = "__";

/// Filter-genes command.
#[derive(Debug, Clone, Default)]
pub struct FilterGenesCommand;

/// Statistics from a filter-genes run.
#[derive(Debug, Default, Clone)]
pub struct FilterGenesStats {
    /// Gene names accepted by the filter
    pub gene_names: usize,
    /// Designation rows read
    pub rows: usize,
    /// Designation rows written
    pub kept: usize,
}

impl std::fmt::Display for FilterGenesStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Gene names: {}, Rows: {}, Kept: {}",
            self.gene_names, self.rows, self.kept
        )
    }
}

impl FilterGenesCommand {
    pub fn new() -> Self {
        Self
    }

    /// Keep only designation rows whose common name (column 5) appears
    /// in the gene-list file (column 1, `__`-separated aliases).
    pub fn run<P: AsRef<Path>, W: Write>(
        &self,
        genes_path: P,
        designations_path: P,
        output: &mut W,
    ) -> Result<FilterGenesStats, InputError> {
        let mut stats = FilterGenesStats::default();

        let accepted = read_gene_names(genes_path)?;
        stats.gene_names = accepted.len();

        let designations = File::open(designations_path)?;
        let reader = BufReader::new(designations);

        for line_result in reader.lines() {
            let line = line_result?;
            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                continue;
            }
            stats.rows += 1;

            let common_name = trimmed.split('\t').nth(4);
            if common_name.is_some_and(|name| accepted.contains(name)) {
                writeln!(output, "{}", trimmed)?;
                stats.kept += 1;
            }
        }

        Ok(stats)
    }
}

/// Read a gene-list file into a name set, expanding `__`-joined aliases.
fn read_gene_names<P: AsRef<Path>>(path: P) -> Result<FxHashSet<String>, InputError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut names = FxHashSet::default();

    for line_result in reader.lines() {
        let line = line_result?;
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            continue;
        }
        let key = trimmed.split('\t').next().unwrap_or(trimmed);
        for name in key.split(NAME_SEPARATOR) {
            names.insert(name.to_string());
        }
    }

    Ok(names)
}
