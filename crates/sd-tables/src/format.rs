//! Delimited-text encoding for the output tables.
//!
//! Quoting is minimal: a field is wrapped in the quote character only when it
//! contains the delimiter, the quote character, or a line break. A quote
//! character inside a quoted field is doubled.

/// Field separator and quote character shared by writer and reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableFormat {
    pub delimiter: char,
    pub quote: char,
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '|',
        }
    }
}

/// Text that does not parse as a table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("unterminated quoted field starting before line {line}")]
    UnterminatedQuote { line: usize },

    #[error("quote character inside unquoted field on line {line}")]
    StrayQuote { line: usize },
}

impl TableFormat {
    pub fn new(delimiter: char, quote: char) -> Self {
        Self { delimiter, quote }
    }

    fn needs_quoting(&self, field: &str) -> bool {
        field
            .chars()
            .any(|c| c == self.delimiter || c == self.quote || c == '\n' || c == '\r')
    }

    /// Append one encoded field to `out`.
    pub fn encode_field(&self, field: &str, out: &mut String) {
        if !self.needs_quoting(field) {
            out.push_str(field);
            return;
        }
        out.push(self.quote);
        for c in field.chars() {
            if c == self.quote {
                out.push(self.quote);
            }
            out.push(c);
        }
        out.push(self.quote);
    }

    /// Encode a full row, terminated by `\n`.
    pub fn encode_row<S: AsRef<str>>(&self, fields: &[S]) -> String {
        let mut out = String::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push(self.delimiter);
            }
            self.encode_field(field.as_ref(), &mut out);
        }
        out.push('\n');
        out
    }

    /// Split table text into rows of decoded fields.
    ///
    /// Accepts `\n` and `\r\n` line endings. A trailing newline does not
    /// produce an empty row.
    pub fn parse(&self, text: &str) -> Result<Vec<Vec<String>>, FormatError> {
        let mut rows = Vec::new();
        let mut row: Vec<String> = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut row_open = false;
        let mut line = 1usize;
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            if in_quotes {
                if c == self.quote {
                    if chars.peek() == Some(&self.quote) {
                        field.push(c);
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    if c == '\n' {
                        line += 1;
                    }
                    field.push(c);
                }
                continue;
            }

            match c {
                '\r' if chars.peek() == Some(&'\n') => {}
                '\n' => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                    row_open = false;
                    line += 1;
                }
                c if c == self.delimiter => {
                    row.push(std::mem::take(&mut field));
                    row_open = true;
                }
                c if c == self.quote => {
                    if !field.is_empty() {
                        return Err(FormatError::StrayQuote { line });
                    }
                    in_quotes = true;
                    row_open = true;
                }
                c => {
                    field.push(c);
                    row_open = true;
                }
            }
        }

        if in_quotes {
            return Err(FormatError::UnterminatedQuote { line });
        }
        if row_open {
            row.push(field);
            rows.push(row);
        }
        Ok(rows)
    }
}
