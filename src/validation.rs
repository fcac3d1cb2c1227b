//! Inline sort-order validation.
//!
//! The counting sweep assumes both inputs are sorted by chromosome
//! (lexicographic) and then by position. Unsorted input would not fail,
//! it would silently produce wrong counts, so the validator turns the
//! precondition into a fast failure as records stream through.

use crate::reader::InputError;

/// Validates that records arrive in (chromosome, position) order.
///
/// Chromosomes must be lexicographically non-decreasing. The chromosome
/// reconciliation step compares names with `<`, so mere contiguity is
/// not enough here.
#[derive(Debug, Default)]
pub struct SortValidator {
    prev_chrom: Option<String>,
    prev_position: u64,
    record_count: usize,
}

impl SortValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate that the given record maintains sort order.
    #[inline]
    pub fn validate(&mut self, chrom: &str, position: u64, file_id: &str) -> Result<(), InputError> {
        self.record_count += 1;

        if let Some(ref pc) = self.prev_chrom {
            if chrom != pc.as_str() {
                if chrom < pc.as_str() {
                    return Err(InputError::InvalidFormat(format!(
                        "{} is not sorted: chromosome '{}' at record {} comes after '{}'",
                        file_id, chrom, self.record_count, pc
                    )));
                }
            } else if position < self.prev_position {
                return Err(InputError::InvalidFormat(format!(
                    "{} is not sorted: position {} at record {} comes after {} on {}",
                    file_id, position, self.record_count, self.prev_position, chrom
                )));
            }
        }

        if self.prev_chrom.as_deref() != Some(chrom) {
            self.prev_chrom = Some(chrom.to_string());
        }
        self.prev_position = position;

        Ok(())
    }

    /// Number of records validated so far.
    pub fn record_count(&self) -> usize {
        self.record_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_sequence() {
        let mut validator = SortValidator::new();
        assert!(validator.validate("chrI", 100, "mutations").is_ok());
        assert!(validator.validate("chrI", 100, "mutations").is_ok());
        assert!(validator.validate("chrI", 250, "mutations").is_ok());
        assert!(validator.validate("chrII", 10, "mutations").is_ok());
        assert_eq!(validator.record_count(), 4);
    }

    #[test]
    fn test_position_regression() {
        let mut validator = SortValidator::new();
        assert!(validator.validate("chrI", 200, "mutations").is_ok());
        assert!(validator.validate("chrI", 100, "mutations").is_err());
    }

    #[test]
    fn test_chromosome_regression() {
        let mut validator = SortValidator::new();
        assert!(validator.validate("chrII", 100, "genes").is_ok());
        let err = validator.validate("chrI", 500, "genes").unwrap_err();
        assert!(err.to_string().contains("genes is not sorted"));
    }

    #[test]
    fn test_celegans_chromosomes_are_lexicographic() {
        use crate::chrom::CELEGANS_CHROMOSOMES;
        let mut validator = SortValidator::new();
        for chrom in CELEGANS_CHROMOSOMES {
            assert!(validator.validate(chrom, 0, "mutations").is_ok());
        }
    }
}
