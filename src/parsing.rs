//! Byte-level field splitting and number parsing.
//!
//! These helpers keep the counting hot path free of per-field heap
//! allocation. Mutation files may be tab- or space-delimited, so fields
//! are split on either byte; runs of delimiters collapse like
//! `str::split_whitespace`.

use memchr::memchr2;

/// Fast u64 parsing - no allocation, no error formatting.
///
/// Returns None if the input is empty or contains non-digit characters.
#[inline(always)]
pub fn parse_u64_fast(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.wrapping_mul(10).wrapping_add(d as u64);
    }
    Some(n)
}

/// Iterator over tab/space-delimited fields of a line.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for Fields<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        // Collapse leading delimiters so repeated separators do not
        // produce empty fields.
        while let [b'\t' | b' ', tail @ ..] = self.rest {
            self.rest = tail;
        }
        if self.rest.is_empty() {
            return None;
        }
        match memchr2(b'\t', b' ', self.rest) {
            Some(i) => {
                let field = &self.rest[..i];
                self.rest = &self.rest[i + 1..];
                Some(field)
            }
            None => {
                let field = self.rest;
                self.rest = &[];
                Some(field)
            }
        }
    }
}

/// Split a line into tab/space-delimited fields.
#[inline]
pub fn split_fields(line: &[u8]) -> Fields<'_> {
    Fields { rest: line }
}

/// Check if a line should be skipped (empty or comment).
#[inline(always)]
pub fn should_skip_line(line: &[u8]) -> bool {
    line.is_empty() || line[0] == b'#'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64_fast() {
        assert_eq!(parse_u64_fast(b"12345"), Some(12345));
        assert_eq!(parse_u64_fast(b"0"), Some(0));
        assert_eq!(parse_u64_fast(b""), None);
        assert_eq!(parse_u64_fast(b"abc"), None);
        assert_eq!(parse_u64_fast(b"123abc"), None);
        assert_eq!(parse_u64_fast(b"18446744073709551615"), Some(u64::MAX));
    }

    #[test]
    fn test_split_fields_tabs() {
        let fields: Vec<_> = split_fields(b"chrI\t100\t101\tTCT\tA\t+").collect();
        assert_eq!(fields, vec![&b"chrI"[..], b"100", b"101", b"TCT", b"A", b"+"]);
    }

    #[test]
    fn test_split_fields_mixed_whitespace() {
        let fields: Vec<_> = split_fields(b"chrI 100\t 101").collect();
        assert_eq!(fields, vec![&b"chrI"[..], b"100", b"101"]);
    }

    #[test]
    fn test_split_fields_empty() {
        assert_eq!(split_fields(b"").count(), 0);
        assert_eq!(split_fields(b"  \t ").count(), 0);
    }

    #[test]
    fn test_should_skip_line() {
        assert!(should_skip_line(b""));
        assert!(should_skip_line(b"#comment"));
        assert!(!should_skip_line(b"chrI\t100"));
    }
}
