// Clippy allows
#![allow(clippy::too_many_arguments)]

//! mutstrand: strand-resolved mutation analysis for C. elegans
//!
//! Usage: mutstrand <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use mutstrand::chrom::ChromosomeSet;
use mutstrand::commands::{
    BackgroundCommand, CountCommand, ExpressionCommand, FilterGenesCommand, OverlapCommand,
    ParseGenesCommand, ParseVcfCommand, SampleTable, TissueFilter,
};
use mutstrand::reader::InputError;

#[derive(Parser)]
#[command(name = "mutstrand")]
#[command(version)]
#[command(about = "Strand-resolved mutation analysis for C. elegans", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count mutations on the transcribed/non-transcribed strands of genes
    Count {
        /// Sorted mutation file (BED-like, strand in column 6)
        #[arg(short, long)]
        mutations: PathBuf,

        /// Sorted gene-region file (BED-like, strand in column 6)
        #[arg(short, long)]
        genes: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// File listing accepted chromosomes (default: chrI..chrV, chrX)
        #[arg(long)]
        chromosomes: Option<PathBuf>,

        /// Skip sorted validation (faster for pre-sorted input)
        #[arg(long)]
        assume_sorted: bool,

        /// Report progress to stderr
        #[arg(short, long)]
        verbose: bool,

        /// Print counting statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Convert a gene-designation table into a sorted gene-region file
    ParseGenes {
        /// Gene-designation table (TSV, 1-based coordinates)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write common gene names (input order) to this file
        #[arg(long)]
        names_out: Option<PathBuf>,

        /// The table has no header line
        #[arg(long)]
        no_header: bool,

        /// Print parsing statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Keep designation rows whose gene appears in an expression-derived list
    FilterGenes {
        /// Gene-list file (gene name in column 1, `__`-joined aliases)
        #[arg(short, long)]
        genes: PathBuf,

        /// Gene-region file to filter
        #[arg(short, long)]
        designations: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print filtering statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Average an expression matrix and extract the top genes
    Expression {
        /// Expression matrix (title line, gene header line, dataset rows)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for all genes with averages (descending)
        #[arg(long)]
        averages_out: PathBuf,

        /// Output file for the top fraction of genes
        #[arg(long)]
        top_out: PathBuf,

        /// Tissue filter: any, sperm-only, oocyte-only, germ-line-only,
        /// any-germ-line
        #[arg(long, default_value = "any")]
        tissue: String,

        /// Percent of genes kept as highly expressed
        #[arg(long, default_value = "25")]
        percent: u32,

        /// Print statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Split single-sample VCFs into per-mutagen mutation files
    ParseVcf {
        /// Directory of `<sample>_*.vcf` files
        #[arg(short, long)]
        vcf_dir: PathBuf,

        /// Sample information CSV (sample, genotype, .., .., mutagen)
        #[arg(short, long)]
        samples: PathBuf,

        /// Output directory (one subdirectory per mutagen)
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Report per-sample progress to stderr
        #[arg(short, long)]
        verbose: bool,

        /// Print statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Compare gene lists: per-pair overlap, intersection and union
    Overlap {
        /// Two or more gene-list files (gene name in column 1)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Write the genes shared by all files to this file
        #[arg(long)]
        intersect_out: Option<PathBuf>,

        /// Write the genes present in any file to this file
        #[arg(long)]
        union_out: Option<PathBuf>,

        /// Print statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Count trinucleotide backgrounds over unambiguous gene regions
    Background {
        /// Sorted gene-region file (strand in column 6)
        #[arg(short, long)]
        genes: PathBuf,

        /// Genome sequence in FASTA format
        #[arg(short, long)]
        fasta: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report progress to stderr
        #[arg(short, long)]
        verbose: bool,

        /// Print statistics to stderr
        #[arg(long)]
        stats: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Count {
            mutations,
            genes,
            output,
            chromosomes,
            assume_sorted,
            verbose,
            stats,
        } => run_count(
            mutations,
            genes,
            output,
            chromosomes,
            assume_sorted,
            verbose,
            stats,
        ),

        Commands::ParseGenes {
            input,
            output,
            names_out,
            no_header,
            stats,
        } => run_parse_genes(input, output, names_out, no_header, stats),

        Commands::FilterGenes {
            genes,
            designations,
            output,
            stats,
        } => run_filter_genes(genes, designations, output, stats),

        Commands::Expression {
            input,
            averages_out,
            top_out,
            tissue,
            percent,
            stats,
        } => run_expression(input, averages_out, top_out, tissue, percent, stats),

        Commands::ParseVcf {
            vcf_dir,
            samples,
            output_dir,
            verbose,
            stats,
        } => run_parse_vcf(vcf_dir, samples, output_dir, verbose, stats),

        Commands::Overlap {
            inputs,
            intersect_out,
            union_out,
            stats,
        } => run_overlap(inputs, intersect_out, union_out, stats),

        Commands::Background {
            genes,
            fasta,
            output,
            verbose,
            stats,
        } => run_background(genes, fasta, output, verbose, stats),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Buffered writer over a file, or stdout when no path is given.
fn open_output(path: Option<PathBuf>) -> Result<Box<dyn Write>, InputError> {
    match path {
        Some(path) => Ok(Box::new(BufWriter::new(File::create(path)?))),
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

fn run_count(
    mutations: PathBuf,
    genes: PathBuf,
    output: Option<PathBuf>,
    chromosomes: Option<PathBuf>,
    assume_sorted: bool,
    verbose: bool,
    stats: bool,
) -> Result<(), InputError> {
    let mut cmd = CountCommand::new();
    cmd.check_sorted = !assume_sorted;
    cmd.verbose = verbose;
    if let Some(path) = chromosomes {
        cmd = cmd.with_chromosomes(ChromosomeSet::from_file(path)?);
    }

    let mut out = open_output(output)?;
    let run_stats = cmd.run(mutations, genes, &mut out)?;
    out.flush()?;

    if stats {
        eprintln!("{}", run_stats);
    }
    Ok(())
}

fn run_parse_genes(
    input: PathBuf,
    output: Option<PathBuf>,
    names_out: Option<PathBuf>,
    no_header: bool,
    stats: bool,
) -> Result<(), InputError> {
    let mut cmd = ParseGenesCommand::new();
    cmd.has_header = !no_header;

    let mut out = open_output(output)?;
    let mut names_file = names_out
        .map(|p| File::create(p).map(BufWriter::new))
        .transpose()?;

    let run_stats = cmd.run(
        input,
        &mut out,
        names_file.as_mut().map(|w| w as &mut dyn Write),
    )?;
    out.flush()?;
    if let Some(mut names) = names_file {
        names.flush()?;
    }

    if stats {
        eprintln!("{}", run_stats);
    }
    Ok(())
}

fn run_filter_genes(
    genes: PathBuf,
    designations: PathBuf,
    output: Option<PathBuf>,
    stats: bool,
) -> Result<(), InputError> {
    let cmd = FilterGenesCommand::new();
    let mut out = open_output(output)?;
    let run_stats = cmd.run(genes, designations, &mut out)?;
    out.flush()?;

    if stats {
        eprintln!("{}", run_stats);
    }
    Ok(())
}

fn run_expression(
    input: PathBuf,
    averages_out: PathBuf,
    top_out: PathBuf,
    tissue: String,
    percent: u32,
    stats: bool,
) -> Result<(), InputError> {
    let tissue = TissueFilter::from_str(&tissue).ok_or_else(|| {
        InputError::InvalidFormat(format!("Unknown tissue filter: '{}'", tissue))
    })?;

    let mut cmd = ExpressionCommand::new();
    cmd.tissue = tissue;
    cmd.percent_cutoff = percent;

    let mut averages = BufWriter::new(File::create(averages_out)?);
    let mut top = BufWriter::new(File::create(top_out)?);
    let run_stats = cmd.run(input, &mut averages, &mut top)?;
    averages.flush()?;
    top.flush()?;

    if stats {
        eprintln!("{}", run_stats);
    }
    Ok(())
}

fn run_parse_vcf(
    vcf_dir: PathBuf,
    samples: PathBuf,
    output_dir: PathBuf,
    verbose: bool,
    stats: bool,
) -> Result<(), InputError> {
    let table = SampleTable::from_file(samples)?;

    let mut cmd = ParseVcfCommand::new();
    cmd.verbose = verbose;
    let run_stats = cmd.run(vcf_dir, &table, output_dir)?;

    if stats {
        eprintln!("{}", run_stats);
    }
    Ok(())
}

fn run_overlap(
    inputs: Vec<PathBuf>,
    intersect_out: Option<PathBuf>,
    union_out: Option<PathBuf>,
    stats: bool,
) -> Result<(), InputError> {
    let cmd = OverlapCommand::new();

    let stdout = io::stdout();
    let mut report = stdout.lock();
    let mut intersect_file = intersect_out
        .map(|p| File::create(p).map(BufWriter::new))
        .transpose()?;
    let mut union_file = union_out
        .map(|p| File::create(p).map(BufWriter::new))
        .transpose()?;

    let run_stats = cmd.run(
        &inputs,
        &mut report,
        intersect_file.as_mut().map(|w| w as &mut dyn Write),
        union_file.as_mut().map(|w| w as &mut dyn Write),
    )?;
    if let Some(mut file) = intersect_file {
        file.flush()?;
    }
    if let Some(mut file) = union_file {
        file.flush()?;
    }

    if stats {
        eprintln!("{}", run_stats);
    }
    Ok(())
}

fn run_background(
    genes: PathBuf,
    fasta: PathBuf,
    output: Option<PathBuf>,
    verbose: bool,
    stats: bool,
) -> Result<(), InputError> {
    let mut cmd = BackgroundCommand::new();
    cmd.verbose = verbose;

    let mut out = open_output(output)?;
    let run_stats = cmd.run(genes, fasta, &mut out)?;
    out.flush()?;

    if stats {
        eprintln!("{}", run_stats);
    }
    Ok(())
}
