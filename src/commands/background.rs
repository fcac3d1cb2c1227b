//! Trinucleotide background counts over unambiguous gene regions.
//!
//! Sorted gene regions are condensed into "clear" ranges: overlapping
//! genes on the same strand merge, while a strand conflict poisons the
//! whole merged range and drops it. Each surviving range is widened by
//! one base on both sides so boundary trinucleotides are represented,
//! then counted on both strands against the genome sequence.

use crate::fasta::{reverse_complement, GenomeSequence};
use crate::reader::InputError;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Strand column in the gene-region file.
const COL_STRAND: usize = 5;

#[derive(Debug, Clone)]
struct ClearRange {
    chrom: String,
    /// 0-based start.
    start: u64,
    /// 1-based-exclusive end.
    end: u64,
    strand: char,
    /// Overlapping genes disagreed on strand.
    ambiguous: bool,
}

/// Background command configuration.
#[derive(Debug, Clone)]
pub struct BackgroundCommand {
    pub verbose: bool,
}

impl Default for BackgroundCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics from a background run.
#[derive(Debug, Default, Clone)]
pub struct BackgroundStats {
    pub genes: usize,
    /// Clear ranges counted
    pub ranges: usize,
    /// Merged ranges dropped over a strand conflict
    pub ambiguous_dropped: usize,
    /// Distinct trinucleotides observed
    pub trinucleotides: usize,
}

impl std::fmt::Display for BackgroundStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Genes: {}, Ranges: {}, Ambiguous dropped: {}, Trinucleotides: {}",
            self.genes, self.ranges, self.ambiguous_dropped, self.trinucleotides
        )
    }
}

impl BackgroundCommand {
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Count trinucleotide occurrences on the transcribed and
    /// non-transcribed strands of the clear gene ranges in
    /// `genes_path`, against the genome in `fasta_path`.
    pub fn run<P: AsRef<Path>, W: Write>(
        &self,
        genes_path: P,
        fasta_path: P,
        output: &mut W,
    ) -> Result<BackgroundStats, InputError> {
        let mut stats = BackgroundStats::default();

        let ranges = condense_ranges(genes_path, &mut stats)?;
        if self.verbose {
            eprintln!(
                "Condensed {} genes into {} clear ranges",
                stats.genes, stats.ranges
            );
        }

        let genome = GenomeSequence::from_file(fasta_path)?;

        // Trinucleotide -> (NTS count, TS count), sorted for output.
        let mut counts: BTreeMap<String, (u64, u64)> = BTreeMap::new();

        for range in &ranges {
            if !genome.has_chrom(&range.chrom) {
                return Err(InputError::InvalidFormat(format!(
                    "Chromosome '{}' is not in the genome sequence",
                    range.chrom
                )));
            }
            // Widen by 1 bp on each side to include boundary contexts.
            let slice = genome
                .slice(&range.chrom, range.start.saturating_sub(1), range.end + 1)
                .unwrap_or(&[]);

            // Orient to the coding (non-transcribed) strand.
            let coding: Vec<u8> = if range.strand == '-' {
                reverse_complement(slice)
            } else {
                slice.to_vec()
            };

            for window in coding.windows(3) {
                let nts = String::from_utf8_lossy(window).into_owned();
                let ts = String::from_utf8_lossy(&reverse_complement(window)).into_owned();
                counts.entry(nts).or_default().0 += 1;
                counts.entry(ts).or_default().1 += 1;
            }
        }

        stats.trinucleotides = counts.len();

        writeln!(output, "Trinucleotide\tNTS_Counts\tTS_Counts")?;
        let mut itoa_buf = itoa::Buffer::new();
        for (trinucleotide, (nts, ts)) in &counts {
            output.write_all(trinucleotide.as_bytes())?;
            output.write_all(b"\t")?;
            output.write_all(itoa_buf.format(*nts).as_bytes())?;
            output.write_all(b"\t")?;
            output.write_all(itoa_buf.format(*ts).as_bytes())?;
            output.write_all(b"\n")?;
        }

        Ok(stats)
    }
}

/// Merge sorted gene regions into clear ranges, dropping any merged
/// range whose members disagree on strand.
fn condense_ranges<P: AsRef<Path>>(
    path: P,
    stats: &mut BackgroundStats,
) -> Result<Vec<ClearRange>, InputError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut ranges: Vec<ClearRange> = Vec::new();
    let mut current: Option<ClearRange> = None;

    for (index, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let trimmed = line.trim_end();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line_number = index + 1;

        let fields: Vec<&str> = trimmed.split('\t').collect();
        if fields.len() <= COL_STRAND {
            return Err(InputError::Parse {
                line: line_number,
                message: format!("Expected at least 6 fields, got {}", fields.len()),
            });
        }
        let start: u64 = fields[1].parse().map_err(|_| InputError::Parse {
            line: line_number,
            message: format!("Invalid start position: '{}'", fields[1]),
        })?;
        let end: u64 = fields[2].parse().map_err(|_| InputError::Parse {
            line: line_number,
            message: format!("Invalid end position: '{}'", fields[2]),
        })?;
        let strand = match fields[COL_STRAND] {
            "+" => '+',
            "-" => '-',
            other => {
                return Err(InputError::Parse {
                    line: line_number,
                    message: format!("Invalid strand: '{}'", other),
                })
            }
        };
        stats.genes += 1;

        match current.as_mut() {
            Some(range) if range.chrom == fields[0] && start < range.end => {
                // Overlaps the open range: extend, covering nested genes.
                range.end = range.end.max(end);
                if strand != range.strand {
                    range.ambiguous = true;
                }
            }
            _ => {
                flush_range(current.take(), &mut ranges, stats);
                current = Some(ClearRange {
                    chrom: fields[0].to_string(),
                    start,
                    end,
                    strand,
                    ambiguous: false,
                });
            }
        }
    }
    flush_range(current.take(), &mut ranges, stats);

    Ok(ranges)
}

fn flush_range(range: Option<ClearRange>, ranges: &mut Vec<ClearRange>, stats: &mut BackgroundStats) {
    if let Some(range) = range {
        if range.ambiguous {
            stats.ambiguous_dropped += 1;
        } else {
            stats.ranges += 1;
            ranges.push(range);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as IoWrite;
    use tempfile::NamedTempFile;

    fn create_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file.flush().unwrap();
        file
    }

    fn parse_counts(output: &str) -> BTreeMap<String, (u64, u64)> {
        output
            .lines()
            .skip(1)
            .map(|line| {
                let fields: Vec<&str> = line.split('\t').collect();
                (
                    fields[0].to_string(),
                    (fields[1].parse().unwrap(), fields[2].parse().unwrap()),
                )
            })
            .collect()
    }

    #[test]
    fn test_plus_strand_counts() {
        // chrI: ACGTACGT, gene covering 2..5 (GTA) widens to 1..6 (CGTAC).
        let fasta = create_file(">chrI\nACGTACGT\n");
        let genes = create_file("chrI\t2\t5\tg1\tabc-1\t+\n");

        let cmd = BackgroundCommand::new();
        let mut output = Vec::new();
        let stats = cmd.run(genes.path(), fasta.path(), &mut output).unwrap();

        assert_eq!(stats.ranges, 1);
        let counts = parse_counts(&String::from_utf8(output).unwrap());

        // CGTAC -> windows CGT, GTA, TAC on the coding strand.
        assert_eq!(counts["CGT"].0, 1);
        assert_eq!(counts["GTA"].0, 1);
        assert_eq!(counts["TAC"].0, 1);
        // Their reverse complements land in the TS column.
        assert_eq!(counts["ACG"].1, 1);
        assert_eq!(counts["TAC"].1, 1);
        assert_eq!(counts["GTA"].1, 1);
    }

    #[test]
    fn test_minus_strand_is_reverse_complemented() {
        let fasta = create_file(">chrI\nAAACCC\n");
        // Gene 1..4 widens to 0..5: AAACC, revcomp GGTTT.
        let genes = create_file("chrI\t1\t4\tg1\tabc-1\t-\n");

        let cmd = BackgroundCommand::new();
        let mut output = Vec::new();
        cmd.run(genes.path(), fasta.path(), &mut output).unwrap();

        let counts = parse_counts(&String::from_utf8(output).unwrap());
        assert_eq!(counts["GGT"].0, 1);
        assert_eq!(counts["GTT"].0, 1);
        assert_eq!(counts["TTT"].0, 1);
        assert_eq!(counts["AAA"].1, 1);
    }

    #[test]
    fn test_same_strand_overlap_merges() {
        let fasta = create_file(">chrI\nACGTACGTACGTACGT\n");
        let genes = create_file(
            "chrI\t2\t8\tg1\tabc-1\t+\n\
             chrI\t5\t10\tg2\tabc-2\t+\n",
        );

        let cmd = BackgroundCommand::new();
        let mut output = Vec::new();
        let stats = cmd.run(genes.path(), fasta.path(), &mut output).unwrap();

        assert_eq!(stats.genes, 2);
        assert_eq!(stats.ranges, 1);
        assert_eq!(stats.ambiguous_dropped, 0);
    }

    #[test]
    fn test_strand_conflict_drops_range() {
        let fasta = create_file(">chrI\nACGTACGTACGTACGT\n");
        let genes = create_file(
            "chrI\t2\t8\tg1\tabc-1\t+\n\
             chrI\t5\t10\tg2\tabc-2\t-\n\
             chrI\t12\t15\tg3\tabc-3\t+\n",
        );

        let cmd = BackgroundCommand::new();
        let mut output = Vec::new();
        let stats = cmd.run(genes.path(), fasta.path(), &mut output).unwrap();

        assert_eq!(stats.ambiguous_dropped, 1);
        assert_eq!(stats.ranges, 1);
    }

    #[test]
    fn test_nested_gene_does_not_truncate_range() {
        let fasta = create_file(">chrI\nACGTACGTACGTACGT\n");
        // g2 sits entirely inside g1; the merged range must keep g1's end.
        let genes = create_file(
            "chrI\t2\t12\tg1\tabc-1\t+\n\
             chrI\t4\t6\tg2\tabc-2\t+\n\
             chrI\t13\t16\tg3\tabc-3\t+\n",
        );

        let cmd = BackgroundCommand::new();
        let mut output = Vec::new();
        let stats = cmd.run(genes.path(), fasta.path(), &mut output).unwrap();

        // g3 starts past g1's end, so two ranges.
        assert_eq!(stats.ranges, 2);
    }

    #[test]
    fn test_unknown_chromosome_is_fatal() {
        let fasta = create_file(">chrI\nACGTACGT\n");
        let genes = create_file("chrII\t2\t5\tg1\tabc-1\t+\n");

        let cmd = BackgroundCommand::new();
        let mut output = Vec::new();
        assert!(cmd.run(genes.path(), fasta.path(), &mut output).is_err());
    }
}
