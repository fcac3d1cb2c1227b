//! Minimal FASTA loading for background trinucleotide counting.
//!
//! The *C. elegans* genome is small enough (~100 Mb) to hold in memory,
//! so sequences are loaded whole rather than indexed.

use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::reader::InputError;

/// Per-chromosome reference sequences, uppercased.
#[derive(Debug, Default)]
pub struct GenomeSequence {
    chroms: FxHashMap<String, Vec<u8>>,
}

impl GenomeSequence {
    /// Load all sequences from a FASTA file. The chromosome name is the
    /// first whitespace-delimited token of each header.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InputError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut chroms: FxHashMap<String, Vec<u8>> = FxHashMap::default();
        let mut current: Option<String> = None;

        for line_result in reader.lines() {
            let line = line_result?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }

            if let Some(header) = line.strip_prefix('>') {
                let name = header
                    .split_whitespace()
                    .next()
                    .ok_or_else(|| {
                        InputError::InvalidFormat("FASTA header with no name".to_string())
                    })?
                    .to_string();
                chroms.entry(name.clone()).or_default();
                current = Some(name);
            } else {
                let name = current.as_ref().ok_or_else(|| {
                    InputError::InvalidFormat(
                        "FASTA sequence data before any header".to_string(),
                    )
                })?;
                let seq = chroms.get_mut(name).expect("current header is registered");
                seq.extend(line.bytes().map(|b| b.to_ascii_uppercase()));
            }
        }

        if chroms.is_empty() {
            return Err(InputError::InvalidFormat(
                "FASTA file contains no sequences".to_string(),
            ));
        }

        Ok(Self { chroms })
    }

    /// Slice of a chromosome, clamped to its bounds. Returns `None` for
    /// unknown chromosomes or an empty clamped range.
    pub fn slice(&self, chrom: &str, start: u64, end: u64) -> Option<&[u8]> {
        let seq = self.chroms.get(chrom)?;
        let start = (start as usize).min(seq.len());
        let end = (end as usize).min(seq.len());
        if start >= end {
            return None;
        }
        Some(&seq[start..end])
    }

    pub fn has_chrom(&self, chrom: &str) -> bool {
        self.chroms.contains_key(chrom)
    }

    pub fn len(&self) -> usize {
        self.chroms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chroms.is_empty()
    }
}

/// Reverse complement of a DNA sequence. Non-ACGT bytes map to `N`.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&b| match b {
            b'A' | b'a' => b'T',
            b'T' | b't' => b'A',
            b'C' | b'c' => b'G',
            b'G' | b'g' => b'C',
            _ => b'N',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_fasta(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_and_slice() {
        let file = create_fasta(">chrI extra description\nacgtACGT\nTTTT\n>chrII\nGGGG\n");
        let genome = GenomeSequence::from_file(file.path()).unwrap();

        assert_eq!(genome.len(), 2);
        assert_eq!(genome.slice("chrI", 0, 8), Some(&b"ACGTACGT"[..]));
        assert_eq!(genome.slice("chrI", 6, 12), Some(&b"GTTTTT"[..]));
        assert_eq!(genome.slice("chrII", 0, 4), Some(&b"GGGG"[..]));
        assert_eq!(genome.slice("chrIII", 0, 4), None);
    }

    #[test]
    fn test_slice_clamps_to_bounds() {
        let file = create_fasta(">chrI\nACGT\n");
        let genome = GenomeSequence::from_file(file.path()).unwrap();

        assert_eq!(genome.slice("chrI", 2, 100), Some(&b"GT"[..]));
        assert_eq!(genome.slice("chrI", 10, 20), None);
    }

    #[test]
    fn test_sequence_before_header() {
        let file = create_fasta("ACGT\n");
        assert!(GenomeSequence::from_file(file.path()).is_err());
    }

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement(b"ACGT"), b"ACGT".to_vec());
        assert_eq!(reverse_complement(b"TCT"), b"AGA".to_vec());
        assert_eq!(reverse_complement(b"GGn"), b"NCC".to_vec());
    }
}
