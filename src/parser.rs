//! Delimiter-sniffing CSV parser for roadmap and catalog exports.
//!
//! The upstream exports are messy: the delimiter varies between comma,
//! semicolon, and tab depending on which tool produced the file, numbers may
//! be quoted, and a UTF-8 BOM shows up intermittently. This parser sniffs the
//! delimiter from the first line and runs a quote-aware state machine over
//! the whole payload, producing a best-effort result for any input.

/// Candidate delimiters, in tie-breaking preference order.
const DELIMITERS: [char; 3] = [',', ';', '\t'];

/// Picks the field delimiter by counting candidate occurrences in the first
/// line. The highest count wins; ties break toward the earlier candidate
/// (comma, then semicolon, then tab). A line with no candidates defaults to
/// comma.
pub fn detect_delimiter(first_line: &str) -> char {
    let mut best = DELIMITERS[0];
    let mut best_count = 0;
    for d in DELIMITERS {
        let count = first_line.matches(d).count();
        if count > best_count {
            best = d;
            best_count = count;
        }
    }
    best
}

/// Parses delimiter-sniffed CSV text into rows of string fields.
///
/// - Strips a leading byte-order mark.
/// - Inside quotes: `""` is an escaped literal quote, a single `"` closes
///   the field, everything else (including delimiters and newlines) is
///   literal.
/// - Outside quotes: the sniffed delimiter ends a field, `\n` ends a row,
///   `\r` is dropped (so CRLF and LF both work).
/// - A trailing field or row without a final newline is still emitted.
/// - Rows whose every field trims to empty are dropped.
///
/// Total function: malformed quoting never panics or errors, it just yields
/// the state machine's best effort. Empty input yields an empty vec.
pub fn parse(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.is_empty() {
        return Vec::new();
    }

    let first_line = text.split('\n').next().unwrap_or(text);
    let delim = detect_delimiter(first_line);

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == delim {
            row.push(std::mem::take(&mut field));
        } else if c == '\n' {
            row.push(std::mem::take(&mut field));
            rows.push(std::mem::take(&mut row));
        } else if c != '\r' {
            field.push(c);
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows.retain(|r| r.iter().any(|f| !f.trim().is_empty()));
    rows
}
