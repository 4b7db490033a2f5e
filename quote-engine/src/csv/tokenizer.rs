//! Field tokenizer
//!
//! A two-state machine over the input text: {Unquoted, Quoted}. A field
//! wrapped in `"..."` may contain the separator and literal line
//! endings; `""` inside a quoted field decodes to one literal `"`.
//! Rows are yielded as complete units, so callers chunking the stream
//! can never split a logical row.

use super::detect::LineEnding;

/// Iterator over logical rows of a CSV payload.
pub struct RowIter<'a> {
    rest: &'a str,
    separator: char,
    line_ending: LineEnding,
    /// 1-based physical row counter, header included
    next_row: usize,
}

impl<'a> RowIter<'a> {
    pub fn new(text: &'a str, separator: char, line_ending: LineEnding) -> Self {
        Self {
            rest: text,
            separator,
            line_ending,
            next_row: 1,
        }
    }

    /// Length in bytes of the line ending at the start of `s`, 0 if absent.
    fn ending_len(&self, s: &str) -> usize {
        let pattern = self.line_ending.as_str();
        if s.starts_with(pattern) { pattern.len() } else { 0 }
    }
}

#[derive(PartialEq)]
enum State {
    Unquoted,
    Quoted,
}

impl Iterator for RowIter<'_> {
    /// (physical row number, fields)
    type Item = (usize, Vec<String>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.rest.is_empty() {
                return None;
            }

            let mut fields = Vec::new();
            let mut field = String::new();
            let mut state = State::Unquoted;
            let mut chars = self.rest.char_indices();
            let mut consumed = self.rest.len();
            let mut terminated = false;

            while let Some((i, c)) = chars.next() {
                match state {
                    State::Unquoted => {
                        if c == '"' {
                            state = State::Quoted;
                        } else if c == self.separator {
                            fields.push(std::mem::take(&mut field));
                        } else {
                            let tail = &self.rest[i..];
                            let ending = self.ending_len(tail);
                            if ending > 0 {
                                consumed = i + ending;
                                terminated = true;
                                break;
                            }
                            field.push(c);
                        }
                    }
                    State::Quoted => {
                        if c == '"' {
                            // Escaped quote stays quoted and emits one literal '"'
                            if self.rest[i + 1..].starts_with('"') {
                                field.push('"');
                                chars.next();
                            } else {
                                state = State::Unquoted;
                            }
                        } else {
                            field.push(c);
                        }
                    }
                }
            }

            if !terminated {
                consumed = self.rest.len();
            }
            self.rest = &self.rest[consumed..];

            fields.push(field);
            let row = self.next_row;
            self.next_row += 1;

            // Blank physical lines are not rows
            if fields.len() == 1 && fields[0].trim().is_empty() {
                continue;
            }
            return Some((row, fields));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(text: &str, sep: char, ending: LineEnding) -> Vec<Vec<String>> {
        RowIter::new(text, sep, ending)
            .map(|(_, fields)| fields)
            .collect()
    }

    #[test]
    fn test_plain_rows() {
        let got = rows("a,b,c\n1,2,3\n", ',', LineEnding::Lf);
        assert_eq!(got, vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
    }

    #[test]
    fn test_quoted_separator_and_newline() {
        let text = "a,\"x, y\nz\",c\n";
        let got = rows(text, ',', LineEnding::Lf);
        assert_eq!(got, vec![vec!["a", "x, y\nz", "c"]]);
    }

    #[test]
    fn test_escaped_quote() {
        let got = rows("\"say \"\"hi\"\"\",b\n", ',', LineEnding::Lf);
        assert_eq!(got, vec![vec!["say \"hi\"", "b"]]);
    }

    #[test]
    fn test_crlf_rows() {
        let got = rows("a;b\r\nc;d\r\n", ';', LineEnding::CrLf);
        assert_eq!(got, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let got = rows("a,b\n\n\nc,d\n", ',', LineEnding::Lf);
        assert_eq!(got, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_no_trailing_newline() {
        let got = rows("a,b", ',', LineEnding::Lf);
        assert_eq!(got, vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_row_numbers_count_blank_lines() {
        let numbered: Vec<(usize, Vec<String>)> =
            RowIter::new("a\n\nb\n", ',', LineEnding::Lf).collect();
        assert_eq!(numbered[0].0, 1);
        // Blank line consumed a row number
        assert_eq!(numbered[1].0, 3);
    }
}
