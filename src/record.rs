//! Core record types for mutation and gene-interval data.

use std::fmt;

/// Strand orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Plus,
    Minus,
    Unknown,
}

impl Strand {
    pub fn from_char(c: char) -> Self {
        match c {
            '+' => Strand::Plus,
            '-' => Strand::Minus,
            _ => Strand::Unknown,
        }
    }

    /// The opposite strand. `Unknown` has no complement.
    #[inline]
    pub fn complement(self) -> Self {
        match self {
            Strand::Plus => Strand::Minus,
            Strand::Minus => Strand::Plus,
            Strand::Unknown => Strand::Unknown,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
            Strand::Unknown => write!(f, "."),
        }
    }
}

/// Classification of a mutation against the transcribed strand of the
/// gene region that encompasses it.
///
/// `Unassigned` covers both intergenic mutations and mutations whose call
/// was revoked because overlapping genes disagree on the transcribed strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrandCall {
    Unassigned,
    Transcribed,
    NonTranscribed,
}

/// A single substitution mutation.
///
/// Positions are 0-based. The context is the substitution key in
/// `REF>ALT` form, where `REF` may be a trinucleotide window.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub chrom: String,
    /// 0-based position within the chromosome.
    pub position: u64,
    /// Substitution key, e.g. `TCT>A`.
    pub context: String,
    pub strand: Strand,
    /// Current call against the transcribed strand; mutable during
    /// overlap reconciliation, `Unassigned` once revoked.
    pub call: StrandCall,
}

impl MutationRecord {
    pub fn new(chrom: impl Into<String>, position: u64, context: impl Into<String>, strand: Strand) -> Self {
        Self {
            chrom: chrom.into(),
            position,
            context: context.into(),
            strand,
            call: StrandCall::Unassigned,
        }
    }
}

/// A gene region with its transcribed strand.
///
/// `start` and `end` are both 0-based and inclusive. Input files store a
/// 1-based-exclusive end and the coding strand; `from_designation`
/// converts both.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneInterval {
    pub chrom: String,
    pub start: u64,
    /// 0-based inclusive end.
    pub end: u64,
    /// Template strand for transcription, the complement of the stored
    /// coding strand.
    pub transcribed_strand: Strand,
}

impl GeneInterval {
    /// Build from raw designation columns: 0-based start, 1-based-exclusive
    /// end, and the coding strand.
    pub fn from_designation(
        chrom: impl Into<String>,
        start: u64,
        end_exclusive: u64,
        coding_strand: Strand,
    ) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end: end_exclusive.saturating_sub(1),
            transcribed_strand: coding_strand.complement(),
        }
    }

    /// Whether a position on the same chromosome falls inside the gene.
    #[inline]
    pub fn contains(&self, position: u64) -> bool {
        position >= self.start && position <= self.end
    }
}

impl fmt::Display for GeneInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.chrom,
            self.start,
            self.end + 1,
            self.transcribed_strand
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strand_complement() {
        assert_eq!(Strand::Plus.complement(), Strand::Minus);
        assert_eq!(Strand::Minus.complement(), Strand::Plus);
        assert_eq!(Strand::Unknown.complement(), Strand::Unknown);
    }

    #[test]
    fn test_gene_from_designation() {
        let gene = GeneInterval::from_designation("chrI", 50, 151, Strand::Minus);
        assert_eq!(gene.start, 50);
        assert_eq!(gene.end, 150);
        assert_eq!(gene.transcribed_strand, Strand::Plus);
    }

    #[test]
    fn test_gene_contains() {
        let gene = GeneInterval::from_designation("chrI", 50, 151, Strand::Minus);
        assert!(gene.contains(50));
        assert!(gene.contains(100));
        assert!(gene.contains(150));
        assert!(!gene.contains(151));
        assert!(!gene.contains(49));
    }

    #[test]
    fn test_mutation_defaults_unassigned() {
        let m = MutationRecord::new("chrI", 100, "TCT>A", Strand::Plus);
        assert_eq!(m.call, StrandCall::Unassigned);
    }
}
