//! Chromosome whitelist for input validation.
//!
//! Mutation records on a chromosome outside the accepted set indicate a
//! malformed or mismatched input file and abort the run.

use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::reader::InputError;

/// The six *C. elegans* nuclear chromosomes.
pub const CELEGANS_CHROMOSOMES: [&str; 6] = ["chrI", "chrII", "chrIII", "chrIV", "chrV", "chrX"];

/// Set of chromosome names accepted in mutation input.
#[derive(Debug, Clone)]
pub struct ChromosomeSet {
    names: FxHashSet<String>,
}

impl ChromosomeSet {
    /// The default *C. elegans* whitelist.
    pub fn celegans() -> Self {
        Self {
            names: CELEGANS_CHROMOSOMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Load a whitelist from a file, one chromosome name per line
    /// (first tab-delimited column; blank lines and `#` comments skipped).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InputError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut names = FxHashSet::default();

        for line_result in reader.lines() {
            let line = line_result?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let name = line.split('\t').next().unwrap_or(line);
            names.insert(name.to_string());
        }

        if names.is_empty() {
            return Err(InputError::InvalidFormat(
                "Chromosome whitelist file contains no names".to_string(),
            ));
        }

        Ok(Self { names })
    }

    #[inline]
    pub fn contains(&self, chrom: &str) -> bool {
        self.names.contains(chrom)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for ChromosomeSet {
    fn default() -> Self {
        Self::celegans()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_set() {
        let chroms = ChromosomeSet::celegans();
        assert!(chroms.contains("chrI"));
        assert!(chroms.contains("chrX"));
        assert!(!chroms.contains("chrM"));
        assert_eq!(chroms.len(), 6);
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "chr1\t1000000").unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "chr2").unwrap();
        file.flush().unwrap();

        let chroms = ChromosomeSet::from_file(file.path()).unwrap();
        assert!(chroms.contains("chr1"));
        assert!(chroms.contains("chr2"));
        assert!(!chroms.contains("chrI"));
    }

    #[test]
    fn test_from_empty_file() {
        let file = NamedTempFile::new().unwrap();
        assert!(ChromosomeSet::from_file(file.path()).is_err());
    }
}
