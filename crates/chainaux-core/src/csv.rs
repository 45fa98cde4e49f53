//! Line and field tokenizer for checkpoint files.
//!
//! Lines end in `\r\n`, `\n\r`, `\n`, or `\r` (matched in that order at each
//! position). Fields are separated by commas that sit outside double quotes.
//! Both splitters keep every empty piece between two separators but drop an
//! empty trailing piece, so a final line ending or a trailing comma adds
//! nothing while a blank line in the middle yields an empty record.

const LINE_SEPARATORS: [&str; 4] = ["\r\n", "\n\r", "\n", "\r"];

/// Split `data` into lines.
pub fn split_lines(data: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut pos = 0;
    while pos < data.len() {
        let rest = &data[pos..];
        match LINE_SEPARATORS.iter().find(|sep| rest.starts_with(**sep)) {
            Some(sep) => {
                lines.push(&data[start..pos]);
                pos += sep.len();
                start = pos;
            }
            None => pos += rest.chars().next().map_or(1, char::len_utf8),
        }
    }
    if start < data.len() {
        lines.push(&data[start..]);
    }
    lines
}

/// Split one line on commas outside double quotes.
///
/// A comma separates fields only if an even number of `"` follow it on the
/// line. Quotes are kept in the returned fields.
pub fn split_fields(line: &str) -> Vec<&str> {
    let mut quotes_after = line.bytes().filter(|b| *b == b'"').count();
    let mut fields = Vec::new();
    let mut start = 0;
    for (i, byte) in line.bytes().enumerate() {
        match byte {
            b'"' => quotes_after -= 1,
            b',' if quotes_after % 2 == 0 => {
                fields.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < line.len() {
        fields.push(&line[start..]);
    }
    fields
}

/// Strip surrounding whitespace and one pair of enclosing double quotes.
pub fn unquote(field: &str) -> &str {
    let field = field.trim();
    field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_line_endings() {
        assert_eq!(split_lines("a\nb\r\nc\rd\n\re"), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn trailing_line_ending_adds_nothing() {
        assert_eq!(split_lines("a\r\n"), vec!["a"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn blank_line_in_the_middle_is_kept() {
        assert_eq!(split_lines("a\n\nb"), vec!["a", "", "b"]);
        // `\n\r` is taken as one separator before the lone `\n`.
        assert_eq!(split_lines("a\n\r\nb"), vec!["a", "", "b"]);
        assert_eq!(split_lines("a\n\n"), vec!["a", ""]);
    }

    #[test]
    fn fields_split_outside_quotes() {
        assert_eq!(split_fields("1,abc"), vec!["1", "abc"]);
        assert_eq!(split_fields("\"1,0\",abc"), vec!["\"1,0\"", "abc"]);
        assert_eq!(split_fields("1,\"a,b\",c"), vec!["1", "\"a,b\"", "c"]);
    }

    #[test]
    fn empty_and_trailing_fields() {
        assert_eq!(split_fields(",b"), vec!["", "b"]);
        assert_eq!(split_fields("a,"), vec!["a"]);
        assert_eq!(split_fields("a,,b"), vec!["a", "", "b"]);
        assert!(split_fields("").is_empty());
    }

    #[test]
    fn unquote_strips_one_pair() {
        assert_eq!(unquote(" \"100\" "), "100");
        assert_eq!(unquote("\"\"x\"\""), "\"x\"");
        assert_eq!(unquote("\"open"), "\"open");
    }
}
