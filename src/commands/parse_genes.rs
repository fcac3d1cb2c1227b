//! Gene-designation table parsing.
//!
//! Converts the raw gene-designation TSV into a sorted BED-like file of
//! gene regions, optionally emitting the list of common gene names.
//!
//! The table stores 1-based inclusive coordinates; output uses 0-based
//! start and 1-based-exclusive end.

use crate::reader::InputError;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

// Column layout of the designation table.
const COL_NAME: usize = 1;
const COL_CHROM: usize = 2;
const COL_STRAND: usize = 3;
const COL_START: usize = 4;
const COL_END: usize = 5;
const COL_COMMON_NAME: usize = 12;

#[derive(Debug, Clone)]
struct DesignationRow {
    chrom: String,
    start: u64,
    end: u64,
    name: String,
    common_name: String,
    strand: char,
}

/// Parse-genes command configuration.
#[derive(Debug, Clone)]
pub struct ParseGenesCommand {
    /// Skip the first line of the table (column headers).
    pub has_header: bool,
}

impl Default for ParseGenesCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics from a parse-genes run.
#[derive(Debug, Default, Clone)]
pub struct ParseGenesStats {
    pub rows: usize,
}

impl std::fmt::Display for ParseGenesStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rows: {}", self.rows)
    }
}

impl ParseGenesCommand {
    pub fn new() -> Self {
        Self { has_header: true }
    }

    /// Parse a designation table, writing sorted gene regions to
    /// `output` and, if given, common gene names (input order) to
    /// `names_out`.
    pub fn run<P: AsRef<Path>, W: Write>(
        &self,
        input: P,
        output: &mut W,
        mut names_out: Option<&mut dyn Write>,
    ) -> Result<ParseGenesStats, InputError> {
        let file = File::open(input)?;
        let reader = BufReader::new(file);

        let mut rows: Vec<DesignationRow> = Vec::new();
        let mut stats = ParseGenesStats::default();

        for (index, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let line_number = index + 1;
            if self.has_header && index == 0 {
                continue;
            }
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }

            let row = parse_designation_line(line, line_number)?;
            if let Some(names) = names_out.as_deref_mut() {
                writeln!(names, "{}", row.common_name)?;
            }
            rows.push(row);
            stats.rows += 1;
        }

        rows.sort_by(|a, b| {
            a.chrom
                .cmp(&b.chrom)
                .then(a.start.cmp(&b.start))
                .then(a.end.cmp(&b.end))
        });

        let mut itoa_buf = itoa::Buffer::new();
        for row in &rows {
            output.write_all(row.chrom.as_bytes())?;
            output.write_all(b"\t")?;
            output.write_all(itoa_buf.format(row.start).as_bytes())?;
            output.write_all(b"\t")?;
            output.write_all(itoa_buf.format(row.end).as_bytes())?;
            writeln!(output, "\t{}\t{}\t{}", row.name, row.common_name, row.strand)?;
        }

        Ok(stats)
    }
}

fn parse_designation_line(line: &str, line_number: usize) -> Result<DesignationRow, InputError> {
    let fields: Vec<&str> = line.split('\t').collect();

    if fields.len() <= COL_COMMON_NAME {
        return Err(InputError::Parse {
            line: line_number,
            message: format!(
                "Expected at least {} fields, got {}",
                COL_COMMON_NAME + 1,
                fields.len()
            ),
        });
    }

    let start_1based: u64 = fields[COL_START].parse().map_err(|_| InputError::Parse {
        line: line_number,
        message: format!("Invalid start position: '{}'", fields[COL_START]),
    })?;
    if start_1based == 0 {
        return Err(InputError::Parse {
            line: line_number,
            message: "Start position 0 in a 1-based table".to_string(),
        });
    }
    let end: u64 = fields[COL_END].parse().map_err(|_| InputError::Parse {
        line: line_number,
        message: format!("Invalid end position: '{}'", fields[COL_END]),
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

    Ok(DesignationRow {
        chrom: fields[COL_CHROM].to_string(),
        start: start_1based - 1,
        end,
        name: fields[COL_NAME].to_string(),
        common_name: fields[COL_COMMON_NAME].to_string(),
        strand,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as IoWrite;
    use tempfile::NamedTempFile;

    fn designation_line(name: &str, chrom: &str, strand: &str, start: &str, end: &str, common: &str) -> String {
        // 13 columns; unused ones are filler.
        let mut fields = vec!["id"; 13];
        fields[COL_NAME] = name;
        fields[COL_CHROM] = chrom;
        fields[COL_STRAND] = strand;
        fields[COL_START] = start;
        fields[COL_END] = end;
        fields[COL_COMMON_NAME] = common;
        fields.join("\t")
    }

    fn create_table(lines: &[String]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "header").unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_and_sort() {
        let table = create_table(&[
            designation_line("g2", "chrII", "+", "100", "300", "abc-2"),
            designation_line("g1", "chrI", "-", "51", "150", "abc-1"),
            designation_line("g3", "chrI", "+", "11", "90", "abc-3"),
        ]);

        let cmd = ParseGenesCommand::new();
        let mut output = Vec::new();
        let stats = cmd.run(table.path(), &mut output, None).unwrap();

        let result = String::from_utf8(output).unwrap();
        let lines: Vec<_> = result.lines().collect();

        assert_eq!(stats.rows, 3);
        assert_eq!(lines[0], "chrI\t10\t90\tg3\tabc-3\t+");
        assert_eq!(lines[1], "chrI\t50\t150\tg1\tabc-1\t-");
        assert_eq!(lines[2], "chrII\t99\t300\tg2\tabc-2\t+");
    }

    #[test]
    fn test_names_output_keeps_input_order() {
        let table = create_table(&[
            designation_line("g2", "chrII", "+", "100", "300", "abc-2"),
            designation_line("g1", "chrI", "-", "51", "150", "abc-1"),
        ]);

        let cmd = ParseGenesCommand::new();
        let mut output = Vec::new();
        let mut names = Vec::new();
        cmd.run(table.path(), &mut output, Some(&mut names)).unwrap();

        assert_eq!(String::from_utf8(names).unwrap(), "abc-2\nabc-1\n");
    }

    #[test]
    fn test_rejects_zero_start() {
        let table = create_table(&[designation_line("g1", "chrI", "+", "0", "100", "abc-1")]);

        let cmd = ParseGenesCommand::new();
        let mut output = Vec::new();
        assert!(cmd.run(table.path(), &mut output, None).is_err());
    }

    #[test]
    fn test_rejects_short_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "header").unwrap();
        writeln!(file, "a\tb\tc").unwrap();
        file.flush().unwrap();

        let cmd = ParseGenesCommand::new();
        let mut output = Vec::new();
        assert!(cmd.run(file.path(), &mut output, None).is_err());
    }
}
