//! Splitting single-sample VCFs into per-mutagen mutation files.
//!
//! Each VCF in the input directory is named `<sample>_...vcf`. A sample
//! information CSV maps samples to their genotype and mutagen; records
//! are bucketed by mutagen and written as sorted BED-like rows with the
//! genotype carried as a trailing cohort column.

use crate::reader::InputError;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sample metadata from the sample-information CSV.
///
/// Layout: two header lines, then comma-delimited rows with the sample
/// ID in column 1, genotype in column 2 and mutagen in column 5.
/// Genotypes and mutagens are sanitized for use in file paths.
#[derive(Debug, Default)]
pub struct SampleTable {
    genotypes: FxHashMap<String, String>,
    mutagens: FxHashMap<String, String>,
}

impl SampleTable {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InputError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut table = Self::default();

        for (index, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let line_number = index + 1;
            if index < 2 {
                continue;
            }
            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                continue;
            }

            let fields: Vec<&str> = trimmed.split(',').collect();
            if fields.len() < 5 {
                return Err(InputError::Parse {
                    line: line_number,
                    message: format!("Expected at least 5 columns, got {}", fields.len()),
                });
            }

            let sample = fields[0].to_string();
            let genotype = fields[1].replace(' ', "").replace('(', "_").replace(')', "");
            let mutagen = fields[4].replace('/', "+");

            if table.genotypes.contains_key(&sample) {
                return Err(InputError::InvalidFormat(format!(
                    "Duplicate sample in sample info: {}",
                    sample
                )));
            }
            table.genotypes.insert(sample.clone(), genotype);
            table.mutagens.insert(sample, mutagen);
        }

        Ok(table)
    }

    pub fn genotype(&self, sample: &str) -> Option<&str> {
        self.genotypes.get(sample).map(String::as_str)
    }

    pub fn mutagen(&self, sample: &str) -> Option<&str> {
        self.mutagens.get(sample).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.genotypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genotypes.is_empty()
    }
}

#[derive(Debug, Clone)]
struct VcfRow {
    chrom: String,
    /// 0-based position; the 1-based position is derived on output.
    position: u64,
    reference: String,
    alternate: String,
    genotype: String,
}

/// Parse-vcf command configuration.
#[derive(Debug, Clone)]
pub struct ParseVcfCommand {
    /// Report per-sample progress on stderr.
    pub verbose: bool,
}

impl Default for ParseVcfCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics from a parse-vcf run.
#[derive(Debug, Default, Clone)]
pub struct ParseVcfStats {
    pub samples: usize,
    pub records: usize,
    /// One output file per mutagen
    pub output_files: usize,
}

impl std::fmt::Display for ParseVcfStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Samples: {}, Records: {}, Output files: {}",
            self.samples, self.records, self.output_files
        )
    }
}

impl ParseVcfCommand {
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Split every `.vcf` under `vcf_dir` into per-mutagen files below
    /// `output_dir` (`<mutagen>/<mutagen>_custom_input.bed`), each
    /// sorted by (chromosome, position).
    ///
    /// Output files are created only for mutagens with at least one
    /// contributing VCF; a mutagen that appears in the sample table but
    /// has no VCFs in the directory gets no (empty) file.
    pub fn run<P: AsRef<Path>>(
        &self,
        vcf_dir: P,
        samples: &SampleTable,
        output_dir: P,
    ) -> Result<ParseVcfStats, InputError> {
        let mut stats = ParseVcfStats::default();

        // Deterministic processing order.
        let mut vcf_paths: Vec<PathBuf> = fs::read_dir(vcf_dir.as_ref())?
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "vcf"))
            .collect();
        vcf_paths.sort();

        // BTreeMap keeps output-file creation order stable too.
        let mut buckets: BTreeMap<String, Vec<VcfRow>> = BTreeMap::new();

        for path in &vcf_paths {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    InputError::InvalidFormat(format!("Unreadable VCF file name: {}", path.display()))
                })?;
            let sample = file_name.split('_').next().unwrap_or(file_name);

            let (genotype, mutagen) = match (samples.genotype(sample), samples.mutagen(sample)) {
                (Some(g), Some(m)) => (g.to_string(), m.to_string()),
                _ => {
                    return Err(InputError::InvalidFormat(format!(
                        "Unknown sample '{}' (from {})",
                        sample, file_name
                    )))
                }
            };

            if self.verbose {
                eprintln!("Reading mutations for sample {}", sample);
            }
            stats.samples += 1;

            let bucket = buckets.entry(mutagen).or_default();
            stats.records += read_vcf_records(path, &genotype, bucket)?;
        }

        let mut itoa_buf = itoa::Buffer::new();
        for (mutagen, mut rows) in buckets {
            rows.sort_by(|a, b| a.chrom.cmp(&b.chrom).then(a.position.cmp(&b.position)));

            let dir = output_dir.as_ref().join(&mutagen);
            fs::create_dir_all(&dir)?;
            let out_path = dir.join(format!("{}_custom_input.bed", mutagen));
            let mut writer = BufWriter::new(File::create(out_path)?);

            for row in &rows {
                writer.write_all(row.chrom.as_bytes())?;
                writer.write_all(b"\t")?;
                writer.write_all(itoa_buf.format(row.position).as_bytes())?;
                writer.write_all(b"\t")?;
                writer.write_all(itoa_buf.format(row.position + 1).as_bytes())?;
                writeln!(
                    writer,
                    "\t{}\t{}\t+\t{}",
                    row.reference, row.alternate, row.genotype
                )?;
            }
            writer.flush()?;
            stats.output_files += 1;
        }

        Ok(stats)
    }
}

/// Append every record of one VCF to `bucket`; returns the record count.
fn read_vcf_records(
    path: &Path,
    genotype: &str,
    bucket: &mut Vec<VcfRow>,
) -> Result<usize, InputError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut count = 0;

    for (index, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let trimmed = line.trim_end();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split('\t').collect();
        if fields.len() < 5 {
            return Err(InputError::Parse {
                line: index + 1,
                message: format!("VCF record with {} fields in {}", fields.len(), path.display()),
            });
        }

        let position_1based: u64 = fields[1].parse().map_err(|_| InputError::Parse {
            line: index + 1,
            message: format!("Invalid VCF position: '{}'", fields[1]),
        })?;
        if position_1based == 0 {
            return Err(InputError::Parse {
                line: index + 1,
                message: "VCF position 0 in a 1-based file".to_string(),
            });
        }

        bucket.push(VcfRow {
            chrom: format!("chr{}", fields[0]),
            position: position_1based - 1,
            reference: fields[3].to_string(),
            alternate: fields[4].to_string(),
            genotype: genotype.to_string(),
        });
        count += 1;
    }

    Ok(count)
}
