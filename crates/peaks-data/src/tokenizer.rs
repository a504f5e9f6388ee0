//! Single-line CSV field splitting.
//!
//! Handles double-quoted fields with `""` as an escaped quote. Embedded raw
//! newlines are not supported: every call sees exactly one physical line.

/// Split one line into its fields.
///
/// * Outside quotes a `,` ends the field and a `"` opens a quoted region
///   (the quote itself is dropped).
/// * Inside quotes `""` yields a literal `"`, a lone `"` closes the region.
/// * An unterminated quote simply runs to the end of the line.
/// * The last field is always emitted, so a trailing comma gives a trailing
///   empty field, and it has any trailing `\r` / `\n` removed.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else {
            match ch {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut current)),
                _ => current.push(ch),
            }
        }
    }

    // `TextLines` already drops terminators; this covers callers that pass a
    // raw line straight from `read_line`.
    let trimmed_len = current.trim_end_matches(['\r', '\n']).len();
    current.truncate(trimmed_len);
    fields.push(current);
    fields
}

// ── Tests ─────────────────────────────────────────────────────────────────────
