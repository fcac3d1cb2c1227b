//! Streaming readers for mutation and gene-designation files.

use crate::chrom::ChromosomeSet;
use crate::parsing::{parse_u64_fast, should_skip_line, split_fields};
use crate::record::{GeneInterval, MutationRecord, Strand};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading input files.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid input: {0}")]
    InvalidFormat(String),

    #[error("'{chrom}' at line {line} is not an accepted chromosome")]
    Chromosome { chrom: String, line: usize },
}

pub type Result<T> = std::result::Result<T, InputError>;

/// A streaming reader over a mutation file.
///
/// Expected columns (tab or space delimited): chromosome, 0-based
/// position, unused, reference base(s), mutant base, strand.
pub struct MutationReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: String,
    whitelist: Option<ChromosomeSet>,
}

impl MutationReader<File> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> MutationReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: String::with_capacity(1024),
            whitelist: None,
        }
    }

    /// Reject records whose chromosome is not in the given set.
    pub fn with_chromosomes(mut self, chroms: ChromosomeSet) -> Self {
        self.whitelist = Some(chroms);
        self
    }

    /// Read the next mutation record, or `None` at end of input.
    pub fn read_record(&mut self) -> Result<Option<MutationRecord>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.buffer.trim_end();
            if should_skip_line(line.as_bytes()) {
                continue;
            }

            return self.parse_line(line).map(Some);
        }
    }

    fn parse_line(&self, line: &str) -> Result<MutationRecord> {
        let mut fields = split_fields(line.as_bytes());

        let chrom = fields.next();
        let position = fields.next();
        let _unused = fields.next();
        let reference = fields.next();
        let mutant = fields.next();
        let strand = fields.next();

        let (chrom, position, reference, mutant, strand) =
            match (chrom, position, reference, mutant, strand) {
                (Some(c), Some(p), Some(r), Some(m), Some(s)) => (c, p, r, m, s),
                _ => {
                    return Err(InputError::Parse {
                        line: self.line_number,
                        message: "Expected at least 6 fields in mutation record".to_string(),
                    })
                }
            };

        let chrom = field_str(chrom, self.line_number)?;
        if let Some(ref whitelist) = self.whitelist {
            if !whitelist.contains(chrom) {
                return Err(InputError::Chromosome {
                    chrom: chrom.to_string(),
                    line: self.line_number,
                });
            }
        }

        let position = parse_u64_fast(position).ok_or_else(|| InputError::Parse {
            line: self.line_number,
            message: format!("Invalid position: '{}'", String::from_utf8_lossy(position)),
        })?;

        let mut context = String::with_capacity(reference.len() + 1 + mutant.len());
        context.push_str(field_str(reference, self.line_number)?);
        context.push('>');
        context.push_str(field_str(mutant, self.line_number)?);

        let strand = Strand::from_char(strand[0] as char);

        Ok(MutationRecord::new(chrom, position, context, strand))
    }

    /// Line number of the most recently read record.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

/// A streaming reader over a gene-designation file.
///
/// Expected tab-delimited columns: chromosome, 0-based start,
/// 1-based-exclusive end, unused, unused, coding strand. The transcribed
/// strand of the yielded interval is the complement of the coding strand.
pub struct GeneReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: String,
}

impl GeneReader<File> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> GeneReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: String::with_capacity(1024),
        }
    }

    /// Read the next gene interval, or `None` at end of input.
    pub fn read_record(&mut self) -> Result<Option<GeneInterval>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.buffer.trim_end();
            if should_skip_line(line.as_bytes()) {
                continue;
            }

            return self.parse_line(line).map(Some);
        }
    }

    fn parse_line(&self, line: &str) -> Result<GeneInterval> {
        let fields: Vec<&str> = line.split('\t').collect();

        if fields.len() < 6 {
            return Err(InputError::Parse {
                line: self.line_number,
                message: format!("Expected at least 6 fields, got {}", fields.len()),
            });
        }

        let start = parse_position(fields[1], "start", self.line_number)?;
        let end = parse_position(fields[2], "end", self.line_number)?;

        if end <= start {
            return Err(InputError::Parse {
                line: self.line_number,
                message: format!("Gene end ({}) must exceed start ({})", end, start),
            });
        }

        let coding_strand = match fields[5].chars().next() {
            Some(c @ ('+' | '-')) => Strand::from_char(c),
            _ => {
                return Err(InputError::Parse {
                    line: self.line_number,
                    message: format!("Invalid coding strand: '{}'", fields[5]),
                })
            }
        };

        Ok(GeneInterval::from_designation(
            fields[0],
            start,
            end,
            coding_strand,
        ))
    }

    /// Line number of the most recently read record.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

fn field_str(bytes: &[u8], line: usize) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| InputError::Parse {
        line,
        message: "Field is not valid UTF-8".to_string(),
    })
}

fn parse_position(s: &str, field_name: &str, line: usize) -> Result<u64> {
    s.parse().map_err(|_| InputError::Parse {
        line,
        message: format!("Invalid {} position: '{}'", field_name, s),
    })
}
