//! Line splitting that accepts `\n`, `\r\n` and a lone `\r` as terminators.

use std::io::{self, BufRead};

/// Iterator over the lines of a UTF-8 text stream, terminators removed.
///
/// Unlike [`BufRead::lines`], a bare `\r` also ends a line, so files with
/// old Mac line endings read the same as Unix or Windows ones.
pub struct TextLines<R> {
    reader: R,
}

impl<R: BufRead> TextLines<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read one line into `buf`. Returns `false` at end of input when nothing
    /// was read.
    fn read_line_bytes(&mut self, buf: &mut Vec<u8>) -> io::Result<bool> {
        let mut read_any = false;
        loop {
            let available = self.reader.fill_buf()?;
            if available.is_empty() {
                return Ok(read_any);
            }
            read_any = true;

            match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(idx) => {
                    let terminator = available[idx];
                    buf.extend_from_slice(&available[..idx]);
                    self.reader.consume(idx + 1);
                    if terminator == b'\r' {
                        // Swallow the `\n` of a `\r\n` pair, even across buffer refills.
                        let next = self.reader.fill_buf()?;
                        if next.first() == Some(&b'\n') {
                            self.reader.consume(1);
                        }
                    }
                    return Ok(true);
                }
                None => {
                    let len = available.len();
                    buf.extend_from_slice(available);
                    self.reader.consume(len);
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for TextLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = Vec::new();
        match self.read_line_bytes(&mut buf) {
            Ok(false) => None,
            Ok(true) => Some(
                String::from_utf8(buf)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            ),
            Err(e) => Some(Err(e)),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    fn collect(input: &str) -> Vec<String> {
        TextLines::new(Cursor::new(input))
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_all_terminators() {
        assert_eq!(collect("a\nb\r\nc\rd"), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_trailing_terminator_does_not_add_line() {
        assert_eq!(collect("a\n"), vec!["a"]);
        assert_eq!(collect("a\r"), vec!["a"]);
        assert_eq!(collect("a\r\n"), vec!["a"]);
    }

    #[test]
    fn test_empty_lines_kept() {
        assert_eq!(collect("a\r\rb"), vec!["a", "", "b"]);
        assert_eq!(collect("\n"), vec![""]);
    }

    #[test]
    fn test_empty_input_has_no_lines() {
        assert!(collect("").is_empty());
    }

    #[test]
    fn test_crlf_split_across_buffer_refills() {
        // Capacity 2 fills "ab", "c\r", "\nd": the pair straddles two fills.
        let reader = BufReader::with_capacity(2, Cursor::new("abc\r\nd"));
        let lines: Vec<String> = TextLines::new(reader).map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["abc", "d"]);
    }

    #[test]
    fn test_invalid_utf8_is_error() {
        let mut lines = TextLines::new(Cursor::new(vec![0xff, b'\n']));
        let err = lines.next().unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
