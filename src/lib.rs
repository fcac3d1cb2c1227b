// Clippy allows for the whole crate
#![allow(clippy::should_implement_trait)]

//! mutstrand: strand-resolved mutation analysis for C. elegans
//!
//! This library counts mutations on the transcribed and non-transcribed
//! strands of gene regions, and carries the surrounding toolkit: gene
//! designation parsing, expression-based gene filtering, VCF splitting
//! by mutagen and trinucleotide background counting.
//!
//! # Example
//!
//! ```rust,no_run
//! use mutstrand::commands::CountCommand;
//!
//! let cmd = CountCommand::new();
//! let mut stdout = std::io::stdout().lock();
//! let stats = cmd.run("mutations.bed", "genes.bed", &mut stdout).unwrap();
//! eprintln!("{}", stats);
//! ```

pub mod chrom;
pub mod commands;
pub mod fasta;
pub mod parsing;
pub mod reader;
pub mod record;
pub mod validation;

// Re-export commonly used types
pub use chrom::ChromosomeSet;
pub use reader::{GeneReader, InputError, MutationReader};
pub use record::{GeneInterval, MutationRecord, Strand, StrandCall};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::chrom::ChromosomeSet;
    pub use crate::commands::{
        BackgroundCommand, CountCommand, ExpressionCommand, FilterGenesCommand, OverlapCommand,
        ParseGenesCommand, ParseVcfCommand,
    };
    pub use crate::reader::{GeneReader, InputError, MutationReader};
    pub use crate::record::{GeneInterval, MutationRecord, Strand, StrandCall};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_basic_workflow() {
        use crate::commands::CountCommand;
        use crate::reader::{GeneReader, MutationReader};

        let mutations = "chrI\t100\t101\tG\tA\t+\nchrI\t500\t501\tC\tT\t-\n";
        let genes = "chrI\t50\t151\tg1\tabc-1\t-\n";

        let cmd = CountCommand::new();
        let mut output = Vec::new();
        let stats = cmd
            .run_readers(
                MutationReader::new(mutations.as_bytes()),
                GeneReader::new(genes.as_bytes()),
                &mut output,
            )
            .unwrap();

        assert_eq!(stats.mutations, 2);
        assert_eq!(stats.genes, 1);

        let result = String::from_utf8(output).unwrap();
        assert!(result.starts_with("Mutation_Context\t"));
    }
}
