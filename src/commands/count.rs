//! Transcribed/non-transcribed mutation counting.
//!
//! A single-pass merge-join over two sorted streams: mutations and gene
//! intervals. Every mutation starts out counted as intergenic/ambiguous
//! and is moved into the transcribed (TS) or non-transcribed (NTS)
//! bucket when it falls inside a gene. Mutations inside overlapping
//! genes that disagree on the transcribed strand are pushed back to the
//! ambiguous bucket, never split between strand buckets.
//!
//! # Requirements
//!
//! Both input files MUST be sorted by chromosome (lexicographic), then
//! by position. With `check_sorted` enabled (the default) a violation
//! fails fast; without it, unsorted input silently corrupts the counts.

use crate::chrom::ChromosomeSet;
use crate::reader::{GeneReader, InputError, MutationReader};
use crate::record::{GeneInterval, MutationRecord, StrandCall};
use crate::validation::SortValidator;
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

/// Count command configuration.
#[derive(Debug, Clone)]
pub struct CountCommand {
    /// Verify the (chromosome, position) ordering of both inputs inline.
    pub check_sorted: bool,
    /// Report per-chromosome progress on stderr.
    pub verbose: bool,
    chroms: ChromosomeSet,
}

impl Default for CountCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics from a counting run.
#[derive(Debug, Default, Clone)]
pub struct CountStats {
    /// Number of mutation records read
    pub mutations: usize,
    /// Number of gene intervals read
    pub genes: usize,
    /// Number of mutations demoted to ambiguous by conflicting overlap
    pub reclassified_ambiguous: usize,
}

impl std::fmt::Display for CountStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Mutations: {}, Genes: {}, Reclassified ambiguous: {}",
            self.mutations, self.genes, self.reclassified_ambiguous
        )
    }
}

impl CountCommand {
    pub fn new() -> Self {
        Self {
            check_sorted: true,
            verbose: false,
            chroms: ChromosomeSet::celegans(),
        }
    }

    /// Replace the default *C. elegans* chromosome whitelist.
    pub fn with_chromosomes(mut self, chroms: ChromosomeSet) -> Self {
        self.chroms = chroms;
        self
    }

    /// Count mutations from a mutation file against a gene-designation
    /// file, writing the context table to `output`.
    pub fn run<P: AsRef<Path>, W: Write>(
        &self,
        mutation_path: P,
        gene_path: P,
        output: &mut W,
    ) -> Result<CountStats, InputError> {
        let mutations = MutationReader::from_path(mutation_path)?
            .with_chromosomes(self.chroms.clone());
        let genes = GeneReader::from_path(gene_path)?;
        self.run_readers(mutations, genes, output)
    }

    /// Count from already-constructed readers. Used directly by tests.
    pub fn run_readers<M: Read, G: Read, W: Write>(
        &self,
        mutations: MutationReader<M>,
        genes: GeneReader<G>,
        output: &mut W,
    ) -> Result<CountStats, InputError> {
        let mut counter = Counter::new(mutations, genes, self.check_sorted, self.verbose);
        counter.count()?;
        counter.write_results(output)?;
        Ok(counter.stats)
    }
}

/// Per-run counting state: the three context tables, the overlap buffer,
/// and the head record of each stream.
struct Counter<M: Read, G: Read> {
    mutations: MutationReader<M>,
    genes: GeneReader<G>,

    ts_counts: BTreeMap<String, u64>,
    nts_counts: BTreeMap<String, u64>,
    intergenic_counts: BTreeMap<String, u64>,

    /// Mutations classified against recent gene(s), kept until later
    /// overlapping genes can no longer revoke the call.
    pending_overlap: Vec<MutationRecord>,

    current_mutation: Option<MutationRecord>,
    current_gene: Option<GeneInterval>,

    check_sorted: bool,
    verbose: bool,
    mutation_order: SortValidator,
    gene_order: SortValidator,
    stats: CountStats,
}

impl<M: Read, G: Read> Counter<M, G> {
    fn new(
        mutations: MutationReader<M>,
        genes: GeneReader<G>,
        check_sorted: bool,
        verbose: bool,
    ) -> Self {
        Self {
            mutations,
            genes,
            ts_counts: BTreeMap::new(),
            nts_counts: BTreeMap::new(),
            intergenic_counts: BTreeMap::new(),
            pending_overlap: Vec::new(),
            current_mutation: None,
            current_gene: None,
            check_sorted,
            verbose,
            mutation_order: SortValidator::new(),
            gene_order: SortValidator::new(),
            stats: CountStats::default(),
        }
    }

    /// Advance the mutation stream. Each new mutation is immediately
    /// counted as intergenic/ambiguous; later classification moves it.
    fn read_next_mutation(&mut self) -> Result<(), InputError> {
        self.current_mutation = self.mutations.read_record()?;
        if let Some(ref mutation) = self.current_mutation {
            if self.check_sorted {
                self.mutation_order
                    .validate(&mutation.chrom, mutation.position, "Mutation file")?;
            }
            increment(&mut self.intergenic_counts, &mutation.context);
            self.stats.mutations += 1;
        }
        Ok(())
    }

    /// Advance the gene stream and reconcile the overlap buffer against
    /// the newly read gene.
    fn read_next_gene(&mut self) -> Result<(), InputError> {
        self.current_gene = self.genes.read_record()?;
        if let Some(ref gene) = self.current_gene {
            if self.check_sorted {
                self.gene_order
                    .validate(&gene.chrom, gene.start, "Gene positions file")?;
            }
            self.stats.genes += 1;
        }
        if self.current_gene.is_some() {
            self.check_overlap();
        }
        Ok(())
    }

    /// Advance whichever stream is on the lexicographically earlier
    /// chromosome until both agree or either is exhausted.
    fn reconcile_chromosomes(&mut self) -> Result<(), InputError> {
        let mut chromosome_changed = false;

        loop {
            let advance_mutation = match (&self.current_mutation, &self.current_gene) {
                (Some(m), Some(g)) if m.chrom != g.chrom => m.chrom < g.chrom,
                _ => break,
            };
            chromosome_changed = true;
            if advance_mutation {
                self.read_next_mutation()?;
            } else {
                self.read_next_gene()?;
            }
        }

        if chromosome_changed && self.verbose {
            if let (Some(_), Some(gene)) = (&self.current_mutation, &self.current_gene) {
                eprintln!("Counting in {}", gene.chrom);
            }
        }

        Ok(())
    }

    /// Whether the current mutation lies beyond the current gene's end
    /// (or the mutation stream has moved on or run out).
    fn mutation_past_gene(&self) -> bool {
        let (Some(mutation), Some(gene)) = (&self.current_mutation, &self.current_gene) else {
            return true;
        };
        mutation.position > gene.end || mutation.chrom != gene.chrom
    }

    /// If the current mutation falls inside the current gene, move it
    /// from intergenic to TS or NTS and remember it for overlap checks.
    /// Assumes `mutation_past_gene` was checked first.
    fn classify_current_mutation(&mut self) {
        let (Some(mutation), Some(gene)) = (self.current_mutation.as_mut(), &self.current_gene)
        else {
            return;
        };

        if mutation.position < gene.start {
            return;
        }

        decrement(&mut self.intergenic_counts, &mutation.context);
        if mutation.strand == gene.transcribed_strand {
            increment(&mut self.ts_counts, &mutation.context);
            mutation.call = StrandCall::Transcribed;
        } else {
            increment(&mut self.nts_counts, &mutation.context);
            mutation.call = StrandCall::NonTranscribed;
        }

        self.pending_overlap.push(mutation.clone());
    }

    /// Re-derive buffered calls against the newly read gene. A call that
    /// disagrees is revoked: the mutation moves to the ambiguous bucket
    /// and leaves the buffer for good, since only the latest gene is
    /// ever compared against.
    fn check_overlap(&mut self) {
        let Some(gene) = &self.current_gene else {
            return;
        };

        // Drop buffered mutations the new gene can no longer reach.
        self.pending_overlap
            .retain(|m| m.position >= gene.start && m.chrom == gene.chrom);

        for mutation in self.pending_overlap.iter_mut() {
            if mutation.position > gene.end {
                continue;
            }
            let matches_ts = mutation.strand == gene.transcribed_strand;
            let expected = if matches_ts {
                StrandCall::Transcribed
            } else {
                StrandCall::NonTranscribed
            };
            if mutation.call != expected {
                match mutation.call {
                    StrandCall::Transcribed => decrement(&mut self.ts_counts, &mutation.context),
                    StrandCall::NonTranscribed => {
                        decrement(&mut self.nts_counts, &mutation.context)
                    }
                    StrandCall::Unassigned => {}
                }
                increment(&mut self.intergenic_counts, &mutation.context);
                mutation.call = StrandCall::Unassigned;
                self.stats.reclassified_ambiguous += 1;
            }
        }

        // Revoked calls are final; no later gene may reinstate them.
        self.pending_overlap
            .retain(|m| m.call != StrandCall::Unassigned);
    }

    /// The merge-join sweep.
    fn count(&mut self) -> Result<(), InputError> {
        self.read_next_mutation()?;
        self.read_next_gene()?;

        match (&self.current_mutation, &self.current_gene) {
            (None, _) | (_, None) => {
                eprintln!("Warning: empty mutation or gene positions file; counts will be trivial")
            }
            (Some(mutation), Some(gene)) if mutation.chrom == gene.chrom => {
                if self.verbose {
                    eprintln!("Counting in {}", gene.chrom);
                }
            }
            _ => self.reconcile_chromosomes()?,
        }

        // One gene at a time: consume mutations until one passes the
        // gene's end, then move to the next gene and resynchronize.
        while self.current_gene.is_some() {
            while !self.mutation_past_gene() {
                self.classify_current_mutation();
                self.read_next_mutation()?;
            }
            self.read_next_gene()?;
            self.reconcile_chromosomes()?;
        }

        // Genes are exhausted. Drain the mutation stream so every
        // remaining mutation is still tallied (as intergenic).
        while self.current_mutation.is_some() {
            self.read_next_mutation()?;
        }

        Ok(())
    }

    /// Emit the per-context table, contexts sorted ascending.
    fn write_results<W: Write>(&self, output: &mut W) -> Result<(), InputError> {
        writeln!(
            output,
            "Mutation_Context\tMutant_Base\tTS_Counts\tNTS_Counts\t\
             Intergenic_And_Ambiguous_Counts\tNTS_to_TS_Ratio"
        )?;

        let mut ratio_buf = ryu::Buffer::new();

        for (context, &intergenic) in &self.intergenic_counts {
            let ts = self.ts_counts.get(context).copied().unwrap_or(0);
            let nts = self.nts_counts.get(context).copied().unwrap_or(0);
            let (reference, mutant) = context.split_once('>').unwrap_or((context.as_str(), "."));

            // NA sentinel keeps a zero TS count from becoming a division error.
            let ratio = if ts != 0 {
                ratio_buf.format(nts as f64 / ts as f64)
            } else {
                "NA"
            };

            writeln!(
                output,
                "{}\t{}\t{}\t{}\t{}\t{}",
                reference, mutant, ts, nts, intergenic, ratio
            )?;
        }

        Ok(())
    }
}

fn increment(counts: &mut BTreeMap<String, u64>, context: &str) {
    *counts.entry(context.to_string()).or_insert(0) += 1;
}

fn decrement(counts: &mut BTreeMap<String, u64>, context: &str) {
    if let Some(count) = counts.get_mut(context) {
        *count = count.saturating_sub(1);
    }
}
