//! Pairwise and global overlap between gene-list files.

use crate::reader::InputError;
use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Overlap command.
#[derive(Debug, Clone, Default)]
pub struct OverlapCommand;

/// Statistics from an overlap run.
#[derive(Debug, Default, Clone)]
pub struct OverlapStats {
    pub files: usize,
    /// Genes present in every file
    pub intersection: usize,
    /// Genes present in any file
    pub union: usize,
}

impl std::fmt::Display for OverlapStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Files: {}, Intersection: {}, Union: {}",
            self.files, self.intersection, self.union
        )
    }
}

impl OverlapCommand {
    pub fn new() -> Self {
        Self
    }

    /// Compare two or more gene-list files, writing a per-file and
    /// per-pair report to `report_out`. The genes shared by all files
    /// and the genes in any file can optionally be written as
    /// `name\tNA` lists (sorted for stable output).
    pub fn run<W: Write>(
        &self,
        inputs: &[PathBuf],
        report_out: &mut W,
        mut intersect_out: Option<&mut dyn Write>,
        mut union_out: Option<&mut dyn Write>,
    ) -> Result<OverlapStats, InputError> {
        if inputs.len() < 2 {
            return Err(InputError::InvalidFormat(format!(
                "Overlap needs at least 2 gene lists, got {}",
                inputs.len()
            )));
        }

        let mut stats = OverlapStats {
            files: inputs.len(),
            ..Default::default()
        };

        let mut sets: Vec<FxHashSet<String>> = Vec::with_capacity(inputs.len());
        for path in inputs {
            let set = read_gene_set(path)?;
            writeln!(report_out, "{}: {} genes", path.display(), set.len())?;
            sets.push(set);
        }

        for i in 0..sets.len() {
            for j in (i + 1)..sets.len() {
                let shared = sets[i].intersection(&sets[j]).count();
                let combined = sets[i].union(&sets[j]).count();
                writeln!(
                    report_out,
                    "{} vs {}: {} shared of {} total",
                    inputs[i].display(),
                    inputs[j].display(),
                    shared,
                    combined
                )?;
            }
        }

        let mut intersection: Vec<&String> = sets[0]
            .iter()
            .filter(|gene| sets[1..].iter().all(|set| set.contains(*gene)))
            .collect();
        intersection.sort();

        let mut union: FxHashSet<&String> = FxHashSet::default();
        for set in &sets {
            union.extend(set.iter());
        }
        let mut union: Vec<&String> = union.into_iter().collect();
        union.sort();

        stats.intersection = intersection.len();
        stats.union = union.len();
        writeln!(
            report_out,
            "All files: {} shared of {} total",
            stats.intersection, stats.union
        )?;

        if let Some(out) = intersect_out.as_deref_mut() {
            for gene in &intersection {
                writeln!(out, "{}\tNA", gene)?;
            }
        }
        if let Some(out) = union_out.as_deref_mut() {
            for gene in &union {
                writeln!(out, "{}\tNA", gene)?;
            }
        }

        Ok(stats)
    }
}

/// First column of each non-empty line.
fn read_gene_set(path: &Path) -> Result<FxHashSet<String>, InputError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut genes = FxHashSet::default();

    for line_result in reader.lines() {
        let line = line_result?;
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            continue;
        }
        let name = trimmed.split('\t').next().unwrap_or(trimmed);
        genes.insert(name.to_string());
    }

    Ok(genes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as IoWrite;
    use tempfile::NamedTempFile;

    fn create_list(genes: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for gene in genes {
            writeln!(file, "{}\t1.0", gene).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_two_file_overlap() {
        let a = create_list(&["abc-1", "def-2", "ghi-3"]);
        let b = create_list(&["def-2", "ghi-3", "jkl-4"]);
        let inputs = vec![a.path().to_path_buf(), b.path().to_path_buf()];

        let cmd = OverlapCommand::new();
        let mut report = Vec::new();
        let mut shared = Vec::new();
        let mut combined = Vec::new();
        let stats = cmd
            .run(
                &inputs,
                &mut report,
                Some(&mut shared),
                Some(&mut combined),
            )
            .unwrap();

        assert_eq!(stats.intersection, 2);
        assert_eq!(stats.union, 4);

        let shared = String::from_utf8(shared).unwrap();
        assert_eq!(
            shared.lines().collect::<Vec<_>>(),
            vec!["def-2\tNA", "ghi-3\tNA"]
        );
        let combined = String::from_utf8(combined).unwrap();
        assert_eq!(combined.lines().count(), 4);

        let report = String::from_utf8(report).unwrap();
        assert!(report.contains("2 shared of 4 total"));
    }

    #[test]
    fn test_three_files_narrow_the_intersection() {
        let a = create_list(&["abc-1", "def-2"]);
        let b = create_list(&["abc-1", "def-2"]);
        let c = create_list(&["def-2"]);
        let inputs = vec![
            a.path().to_path_buf(),
            b.path().to_path_buf(),
            c.path().to_path_buf(),
        ];

        let cmd = OverlapCommand::new();
        let mut report = Vec::new();
        let stats = cmd.run(&inputs, &mut report, None, None).unwrap();

        assert_eq!(stats.intersection, 1);
        assert_eq!(stats.union, 2);
    }

    #[test]
    fn test_single_file_is_an_error() {
        let a = create_list(&["abc-1"]);
        let inputs = vec![a.path().to_path_buf()];

        let cmd = OverlapCommand::new();
        let mut report = Vec::new();
        assert!(cmd.run(&inputs, &mut report, None, None).is_err());
    }
}
