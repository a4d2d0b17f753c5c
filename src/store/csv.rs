//! Minimal comma-separated row encoding: quote-aware field splitting plus
//! the escaping applied to free-text fields before they are written.
//!
//! The escaping guarantees every row occupies exactly one line, so the
//! reader can hand individual lines to [`parse_line`].

/// Split one table row into fields, honoring double-quoted fields and the
/// doubled-quote escape. Tolerates an unterminated quote by flushing what
/// was accumulated so far.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(ch),
        }
    }

    fields.push(field);
    fields
}

/// Flatten a free-text field to a single line and escape embedded quotes:
/// carriage returns are stripped, newlines become a single space, and any
/// `"` is doubled. The result is safe to wrap in quotes and write verbatim.
pub fn escape_text(text: &str) -> String {
    text.replace('\r', "").replace('\n', " ").replace('"', "\"\"")
}

/// Escape and quote a free-text field for writing.
pub fn quote_text(text: &str) -> String {
    format!("\"{}\"", escape_text(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_fields() {
        let fields = parse_line("a,b,c");
        assert_eq!(fields, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_quoted_field_with_comma() {
        let fields = parse_line("1,\"hello, world\",open");
        assert_eq!(fields, vec!["1", "hello, world", "open"]);
    }

    #[test]
    fn test_parse_doubled_quote_escape() {
        let fields = parse_line("\"say \"\"hi\"\"\",x");
        assert_eq!(fields, vec!["say \"hi\"", "x"]);
    }

    #[test]
    fn test_parse_empty_fields() {
        let fields = parse_line("a,,c,");
        assert_eq!(fields, vec!["a", "", "c", ""]);
    }

    #[test]
    fn test_parse_unterminated_quote_flushes() {
        let fields = parse_line("\"unterminated,rest");
        assert_eq!(fields, vec!["unterminated,rest"]);
    }

    #[test]
    fn test_escape_text_newlines_and_quotes() {
        assert_eq!(
            escape_text("line one\r\nline \"two\""),
            "line one line \"\"two\"\""
        );
    }

    #[test]
    fn test_quote_text_round_trips_through_parser() {
        let original = "PR with \"quotes\" and\nnewlines";
        let row = format!("42,{},open", quote_text(original));
        let fields = parse_line(&row);
        assert_eq!(fields[1], "PR with \"quotes\" and newlines");
    }
}
