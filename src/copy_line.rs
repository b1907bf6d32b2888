use std::fmt::Write;

use crate::escape::{escape_copy_text, escape_hstore};

/// Builder for one row sent with [`crate::Table::send_line`].
///
/// Fields are appended in column order and separated with tabs; text goes
/// through [`escape_copy_text`], tags through [`escape_hstore`].
///
/// ```
/// use postgres_drivers::CopyLine;
///
/// let mut line = CopyLine::new();
/// line.int(42)
///     .hstore([("name", "Main \"Street\"")])
///     .null()
///     .bigint_array([1, 2, 3]);
/// assert_eq!(line.finish(), "42\t\"name\"=>\"Main \\\\\"Street\\\\\"\"\t\\N\t{1,2,3}\n");
/// ```
#[derive(Clone, Debug, Default)]
pub struct CopyLine {
    buf: String,
    fields: usize,
}

impl CopyLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: String::with_capacity(capacity),
            fields: 0,
        }
    }

    /// Number of fields appended so far.
    pub fn fields(&self) -> usize {
        self.fields
    }

    fn next_field(&mut self) -> &mut String {
        if self.fields > 0 {
            self.buf.push('\t');
        }
        self.fields += 1;
        &mut self.buf
    }

    pub fn text(&mut self, value: &str) -> &mut Self {
        escape_copy_text(value, self.next_field());
        self
    }

    pub fn int(&mut self, value: i64) -> &mut Self {
        // Writing into a String cannot fail.
        let _ = write!(self.next_field(), "{value}");
        self
    }

    /// `\N`, the NULL marker of the text format.
    pub fn null(&mut self) -> &mut Self {
        self.next_field().push_str("\\N");
        self
    }

    /// Append a field as is. The caller guarantees it holds no byte that needs escaping,
    /// hex encoded geometries for example.
    pub fn raw(&mut self, value: &str) -> &mut Self {
        self.next_field().push_str(value);
        self
    }

    /// Tags as an hstore literal, `"key"=>"value"` pairs joined with `,`.
    pub fn hstore<'a, I>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let field = self.next_field();
        for (idx, (key, value)) in tags.into_iter().enumerate() {
            if idx > 0 {
                field.push(',');
            }
            escape_hstore(key, field);
            field.push_str("=>");
            escape_hstore(value, field);
        }
        self
    }

    /// A `bigint[]` literal such as `{1,2,3}`.
    pub fn bigint_array<I>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = i64>,
    {
        let field = self.next_field();
        field.push('{');
        for (idx, value) in values.into_iter().enumerate() {
            if idx > 0 {
                field.push(',');
            }
            let _ = write!(field, "{value}");
        }
        field.push('}');
        self
    }

    /// A `char[]` literal such as `{n,w,r}` (member types of a relation).
    pub fn char_array<I>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = char>,
    {
        let field = self.next_field();
        field.push('{');
        for (idx, value) in values.into_iter().enumerate() {
            if idx > 0 {
                field.push(',');
            }
            field.push(value);
        }
        field.push('}');
        self
    }

    /// Terminate the row with `\n`.
    pub fn finish(mut self) -> String {
        self.buf.push('\n');
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::CopyLine;
    use crate::escape::tests::decode_copy_field;

    #[test]
    fn fields_are_tab_separated_and_terminated() {
        let mut line = CopyLine::new();
        line.int(1).text("a\tb").null().raw("0101000020E6100000");
        assert_eq!(line.fields(), 4);

        let line = line.finish();
        assert!(line.ends_with('\n'));
        let fields: Vec<&str> = split_fields(&line);
        assert_eq!(fields.len(), 4);
        assert_eq!(decode_copy_field(fields[1]), "a\tb");
        assert_eq!(fields[2], "\\N");
    }

    #[test]
    fn renders_arrays() {
        let mut line = CopyLine::new();
        line.bigint_array(std::iter::empty::<i64>()).bigint_array([-1, 7]).char_array(['n', 'w']);
        assert_eq!(line.finish(), "{}\t{-1,7}\t{n,w}\n");
    }

    #[test]
    fn renders_hstore_tags() {
        let mut line = CopyLine::new();
        line.hstore([("highway", "primary"), ("name", "a\\b")]);
        assert_eq!(
            line.finish(),
            "\"highway\"=>\"primary\",\"name\"=>\"a\\\\\\\\b\"\n"
        );

        let mut empty = CopyLine::new();
        empty.hstore(std::iter::empty::<(&str, &str)>());
        assert_eq!(empty.finish(), "\n");
    }

    // Split a line on the tabs that are not escaped.
    fn split_fields(line: &str) -> Vec<&str> {
        let body = line.strip_suffix('\n').unwrap_or(line);
        let bytes = body.as_bytes();
        let mut fields = Vec::new();
        let mut start = 0;
        let mut idx = 0;
        while idx < bytes.len() {
            match bytes[idx] {
                b'\\' => idx += 2,
                b'\t' => {
                    fields.push(&body[start..idx]);
                    idx += 1;
                    start = idx;
                }
                _ => idx += 1,
            }
        }
        fields.push(&body[start..]);
        fields
    }
}
