//! Escaping of values sent to the database in COPY text format.
//!
//! Both functions append to `destination` so that a whole copy line can be
//! assembled in a single buffer.

/// Escape a value for a non-hstore column sent with `COPY ... FROM STDIN`.
///
/// Backslash, backspace, form feed, newline, carriage return, tab and vertical
/// tab are prefixed with a backslash. The byte after the backslash is the
/// original byte, which the COPY parser takes literally. Every other character
/// is copied unchanged.
pub fn escape_copy_text(source: &str, destination: &mut String) {
    destination.reserve(source.len());
    for c in source.chars() {
        match c {
            '\\' | '\u{8}' | '\u{c}' | '\n' | '\r' | '\t' | '\u{b}' => {
                destination.push('\\');
                destination.push(c);
            }
            _ => destination.push(c),
        }
    }
}

/// Escape a key or value of an hstore column sent with `COPY ... FROM STDIN`.
///
/// The result is wrapped in double quotes. It is escaped twice: once for the
/// hstore literal and once for the COPY text format around it.
pub fn escape_hstore(source: &str, destination: &mut String) {
    destination.reserve(source.len() + 2);
    destination.push('"');
    for c in source.chars() {
        match c {
            '\\' => destination.push_str("\\\\\\\\"),
            '"' => destination.push_str("\\\\\""),
            '\t' | '\r' | '\n' => {
                destination.push('\\');
                destination.push(c);
            }
            _ => destination.push(c),
        }
    }
    destination.push('"');
}
