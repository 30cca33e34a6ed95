//! Tokenizer for indentation-coded call listings.
//!
//! A listing is what `cflow` prints for one source file: one function per
//! line, nesting expressed only through leading spaces in steps of
//! [`INDENT_UNIT`], e.g.
//!
//! ```text
//! main() <int main (void) at app.c:10>:
//!     setup() <void setup (void) at app.c:3>:
//!         printf()
//!     run() <int run (int) at app.c:6>
//! ```

use crate::domain::error::LineError;

/// Spaces per nesting level.
pub const INDENT_UNIT: usize = 4;

/// One tokenized listing line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLine<'a> {
    /// 1-based position in the listing
    pub line_no: usize,
    /// Leading spaces
    pub indent: usize,
    /// Function name with any `()` suffix removed
    pub name: &'a str,
}

impl ListingLine<'_> {
    pub fn level(&self) -> usize {
        self.indent / INDENT_UNIT
    }
}

/// Split raw collaborator stdout into records, discarding the blank line
/// produced by the terminating newline.
pub fn split_records(output: &str) -> Vec<&str> {
    let mut records: Vec<&str> = output.split('\n').collect();
    if records.last().is_some_and(|last| last.is_empty()) {
        records.pop();
    }
    records
}

/// Tokenize a single listing line. Trailing annotations are ignored.
///
/// Checks run in order: a missing name is `Empty`, leading whitespace other
/// than spaces is `BadIndent`, and a space count off the unit is `Misaligned`.
pub fn parse_line(line_no: usize, raw: &str) -> Result<ListingLine<'_>, LineError> {
    let raw = raw.strip_suffix('\r').unwrap_or(raw);
    let body = raw.trim_start_matches(' ');
    let indent = raw.len() - body.len();

    let token = body
        .split_whitespace()
        .next()
        .ok_or(LineError::Empty { line_no })?;

    // macro-like entries carry no "()" suffix, functions do
    let name = token.strip_suffix("()").unwrap_or(token);
    if name.is_empty() {
        return Err(LineError::Empty { line_no });
    }

    if body.starts_with(char::is_whitespace) {
        return Err(LineError::BadIndent { line_no });
    }

    if indent % INDENT_UNIT != 0 {
        return Err(LineError::Misaligned {
            line_no,
            indent,
            unit: INDENT_UNIT,
        });
    }

    Ok(ListingLine {
        line_no,
        indent,
        name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_function_with_annotation() {
        let line = parse_line(3, "        setup() <void setup (void) at app.c:3>:").unwrap();
        assert_eq!(line.indent, 8);
        assert_eq!(line.level(), 2);
        assert_eq!(line.name, "setup");
        assert_eq!(line.line_no, 3);
    }

    #[test]
    fn test_parse_macro_entry_without_suffix() {
        let line = parse_line(1, "    WARN_ON").unwrap();
        assert_eq!(line.name, "WARN_ON");
        assert_eq!(line.indent, 4);
    }

    #[test]
    fn test_parse_tolerates_carriage_return() {
        let line = parse_line(1, "main()\r").unwrap();
        assert_eq!(line.name, "main");
    }

    #[test]
    fn test_blank_line_is_empty_error() {
        assert_eq!(parse_line(7, "        "), Err(LineError::Empty { line_no: 7 }));
        assert_eq!(parse_line(8, ""), Err(LineError::Empty { line_no: 8 }));
        assert_eq!(parse_line(9, "  ()"), Err(LineError::Empty { line_no: 9 }));
    }

    #[test]
    fn test_empty_name_wins_over_misalignment() {
        assert_eq!(parse_line(4, "      "), Err(LineError::Empty { line_no: 4 }));
        assert_eq!(parse_line(5, "      ()"), Err(LineError::Empty { line_no: 5 }));
        assert_eq!(parse_line(6, "\t()"), Err(LineError::Empty { line_no: 6 }));
    }

    #[test]
    fn test_tab_indent_rejected() {
        assert_eq!(parse_line(2, "\tfoo()"), Err(LineError::BadIndent { line_no: 2 }));
        assert_eq!(parse_line(3, "    \tfoo()"), Err(LineError::BadIndent { line_no: 3 }));
        assert_eq!(
            parse_line(4, "\u{a0}   foo()"),
            Err(LineError::BadIndent { line_no: 4 })
        );
    }

    #[test]
    fn test_misaligned_indent_rejected() {
        assert_eq!(
            parse_line(2, "  helper()"),
            Err(LineError::Misaligned {
                line_no: 2,
                indent: 2,
                unit: INDENT_UNIT
            })
        );
    }

    #[test]
    fn test_split_records_drops_trailing_blank() {
        assert_eq!(split_records("main()\n    foo()\n"), vec!["main()", "    foo()"]);
        assert_eq!(split_records("main()"), vec!["main()"]);
        assert!(split_records("").is_empty());
    }

    #[test]
    fn test_split_records_keeps_interior_blank() {
        assert_eq!(split_records("a()\n\nb()\n"), vec!["a()", "", "b()"]);
    }
}
