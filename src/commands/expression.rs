//! Highly-expressed gene extraction from an expression matrix.
//!
//! The matrix carries one column per gene (from column 8 onward) and one
//! row per dataset, with a tissue/cell-type description in column 5.
//! Averages are taken over the datasets that pass the tissue filter and
//! the top fraction of genes by average is written to a second file.

use crate::reader::InputError;
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// First gene column (0-based) in header and data rows.
const FIRST_GENE_COLUMN: usize = 7;
/// Column holding the tissue/cell-type description.
const TISSUE_COLUMN: usize = 4;

/// Tissue/cell-type filtering applied to expression datasets.
///
/// Matching is by case-insensitive substring on the description column,
/// mirroring how the datasets are annotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TissueFilter {
    #[default]
    Any,
    SpermOnly,
    OocyteOnly,
    GermLineOnly,
    AnyGermLine,
}

impl TissueFilter {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "any" => Some(Self::Any),
            "sperm-only" => Some(Self::SpermOnly),
            "oocyte-only" => Some(Self::OocyteOnly),
            "germ-line-only" => Some(Self::GermLineOnly),
            "any-germ-line" => Some(Self::AnyGermLine),
            _ => None,
        }
    }

    /// Whether a dataset with the given description passes the filter.
    pub fn accepts(&self, description: &str) -> bool {
        let upper = description.to_uppercase();
        match self {
            Self::Any => true,
            Self::SpermOnly => upper.contains("SPERM"),
            Self::OocyteOnly => upper.contains("OOCYTE"),
            Self::GermLineOnly => upper.contains("GERM LINE"),
            Self::AnyGermLine => {
                upper.contains("SPERM") || upper.contains("OOCYTE") || upper.contains("GERMLINE")
            }
        }
    }
}

/// Expression command configuration.
#[derive(Debug, Clone)]
pub struct ExpressionCommand {
    pub tissue: TissueFilter,
    /// Percent of genes (by descending average) kept as highly expressed.
    pub percent_cutoff: u32,
}

impl Default for ExpressionCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics from an expression run.
#[derive(Debug, Default, Clone)]
pub struct ExpressionStats {
    pub genes: usize,
    /// Datasets passing the tissue filter
    pub datasets: usize,
    /// Genes written to the highly-expressed list
    pub top_genes: usize,
}

impl std::fmt::Display for ExpressionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Genes: {}, Datasets: {}, Top genes: {}",
            self.genes, self.datasets, self.top_genes
        )
    }
}

impl ExpressionCommand {
    pub fn new() -> Self {
        Self {
            tissue: TissueFilter::Any,
            percent_cutoff: 25,
        }
    }

    /// Average expression per gene, write the full table (descending by
    /// average) to `averages_out` and the top `percent_cutoff` percent
    /// to `top_out`.
    pub fn run<P: AsRef<Path>, W1: Write, W2: Write>(
        &self,
        input: P,
        averages_out: &mut W1,
        top_out: &mut W2,
    ) -> Result<ExpressionStats, InputError> {
        let file = File::open(input)?;
        let mut reader = BufReader::new(file);
        let mut stats = ExpressionStats::default();

        // First line is a title, second holds the gene columns.
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(InputError::InvalidFormat(
                "Expression file is empty".to_string(),
            ));
        }
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(InputError::InvalidFormat(
                "Expression file has no gene header line".to_string(),
            ));
        }

        let genes = parse_gene_headers(line.trim_end())?;
        stats.genes = genes.len();
        let mut values: FxHashMap<&str, Vec<f64>> =
            genes.iter().map(|g| (g.as_str(), Vec::new())).collect();

        let mut line_number = 2;
        for line_result in reader.lines() {
            let line = line_result?;
            line_number += 1;
            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                continue;
            }

            let fields: Vec<&str> = trimmed.split('\t').collect();
            if fields.len() <= TISSUE_COLUMN {
                return Err(InputError::Parse {
                    line: line_number,
                    message: "Expression row has no tissue description column".to_string(),
                });
            }
            if !self.tissue.accepts(fields[TISSUE_COLUMN]) {
                continue;
            }
            stats.datasets += 1;

            if fields.len() <= FIRST_GENE_COLUMN {
                continue;
            }
            for (gene, raw) in genes.iter().zip(&fields[FIRST_GENE_COLUMN..]) {
                if raw.is_empty() || *raw == "N.A." {
                    continue;
                }
                let value: f64 = raw.parse().map_err(|_| InputError::Parse {
                    line: line_number,
                    message: format!("Invalid expression value for {}: '{}'", gene, raw),
                })?;
                if let Some(series) = values.get_mut(gene.as_str()) {
                    series.push(value);
                }
            }
        }

        // Average per gene, zero when no dataset reported a value.
        let mut averaged: Vec<(&str, f64)> = genes
            .iter()
            .map(|gene| {
                let series = &values[gene.as_str()];
                let average = if series.is_empty() {
                    0.0
                } else {
                    series.iter().sum::<f64>() / series.len() as f64
                };
                (gene.as_str(), average)
            })
            .collect();
        averaged.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut float_buf = ryu::Buffer::new();
        for (gene, average) in &averaged {
            writeln!(averages_out, "{}\t{}", gene, float_buf.format(*average))?;
        }

        let cutoff = genes.len() * self.percent_cutoff as usize / 100;
        for (gene, average) in averaged.iter().take(cutoff) {
            writeln!(top_out, "{}\t{}", gene, float_buf.format(*average))?;
        }
        stats.top_genes = cutoff.min(averaged.len());

        Ok(stats)
    }
}

/// Extract gene keys from the header line: every column from the first
/// gene column onward carries names in parentheses, `...(name1, name2)`,
/// joined into a single `name1__name2` key.
fn parse_gene_headers(line: &str) -> Result<Vec<String>, InputError> {
    let fields: Vec<&str> = line.split('\t').collect();
    let mut genes = Vec::new();

    for (index, column) in fields.iter().enumerate().skip(FIRST_GENE_COLUMN) {
        let inner = column
            .split_once('(')
            .and_then(|(_, rest)| rest.rsplit_once(')'))
            .map(|(inner, _)| inner)
            .ok_or_else(|| InputError::Parse {
                line: 2,
                message: format!("Gene header column {} has no (names): '{}'", index + 1, column),
            })?;
        genes.push(inner.replace(", ", "__"));
    }

    if genes.is_empty() {
        return Err(InputError::InvalidFormat(
            "Expression file header contains no gene columns".to_string(),
        ));
    }

    Ok(genes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as IoWrite;
    use tempfile::NamedTempFile;

    fn create_matrix(rows: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "title line").unwrap();
        writeln!(
            file,
            "a\tb\tc\td\te\tf\tg\tExpr (abc-1)\tExpr (def-2, F26B1.2)\tExpr (ghi-3)\tExpr (jkl-4)"
        )
        .unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_tissue_filter_semantics() {
        assert!(TissueFilter::Any.accepts("whatever"));
        assert!(TissueFilter::SpermOnly.accepts("Sperm cells, adult"));
        assert!(!TissueFilter::SpermOnly.accepts("oocyte"));
        assert!(TissueFilter::GermLineOnly.accepts("germ line precursors"));
        assert!(!TissueFilter::GermLineOnly.accepts("germline"));
        assert!(TissueFilter::AnyGermLine.accepts("GERMLINE"));
        assert!(TissueFilter::AnyGermLine.accepts("Oocyte"));
        assert!(!TissueFilter::AnyGermLine.accepts("muscle"));
    }

    #[test]
    fn test_header_parsing_and_alias_join() {
        let genes = parse_gene_headers(
            "a\tb\tc\td\te\tf\tg\tx (abc-1)\ty (def-2, F26B1.2)",
        )
        .unwrap();
        assert_eq!(genes, vec!["abc-1", "def-2__F26B1.2"]);
    }

    #[test]
    fn test_average_and_cutoff() {
        let matrix = create_matrix(&[
            "d1\tb\tc\td\tmuscle\tf\tg\t1.0\t10.0\t\t2.0",
            "d2\tb\tc\td\tmuscle\tf\tg\t3.0\t20.0\tN.A.\t2.0",
        ]);

        let mut cmd = ExpressionCommand::new();
        cmd.percent_cutoff = 25;

        let mut averages = Vec::new();
        let mut top = Vec::new();
        let stats = cmd.run(matrix.path(), &mut averages, &mut top).unwrap();

        let averages = String::from_utf8(averages).unwrap();
        let lines: Vec<_> = averages.lines().collect();

        // Sorted descending by average; ghi-3 had no usable values.
        assert_eq!(lines[0], "def-2__F26B1.2\t15.0");
        assert_eq!(lines[1], "abc-1\t2.0");
        assert_eq!(lines[2], "jkl-4\t2.0");
        assert_eq!(lines[3], "ghi-3\t0.0");

        // 25% of 4 genes = top 1.
        let top = String::from_utf8(top).unwrap();
        assert_eq!(top.lines().collect::<Vec<_>>(), vec!["def-2__F26B1.2\t15.0"]);
        assert_eq!(stats.top_genes, 1);
        assert_eq!(stats.datasets, 2);
    }

    #[test]
    fn test_tissue_filter_drops_datasets() {
        let matrix = create_matrix(&[
            "d1\tb\tc\td\tsperm, isolated\tf\tg\t1.0\t1.0\t1.0\t1.0",
            "d2\tb\tc\td\tmuscle\tf\tg\t9.0\t9.0\t9.0\t9.0",
        ]);

        let mut cmd = ExpressionCommand::new();
        cmd.tissue = TissueFilter::SpermOnly;

        let mut averages = Vec::new();
        let mut top = Vec::new();
        let stats = cmd.run(matrix.path(), &mut averages, &mut top).unwrap();

        assert_eq!(stats.datasets, 1);
        let averages = String::from_utf8(averages).unwrap();
        assert!(averages.lines().all(|l| l.ends_with("\t1.0")));
    }

    #[test]
    fn test_bad_value_is_fatal() {
        let matrix = create_matrix(&["d1\tb\tc\td\tmuscle\tf\tg\tnot-a-number\t1.0\t1.0\t1.0"]);

        let cmd = ExpressionCommand::new();
        let mut averages = Vec::new();
        let mut top = Vec::new();
        assert!(cmd.run(matrix.path(), &mut averages, &mut top).is_err());
    }
}
