//! CSV decode: header resolution, locale-tolerant price parsing, and
//! batched row-to-record mapping.

use std::collections::HashMap;

use shared::models::ProductRecord;
use tracing::debug;

use super::detect::{detect_line_ending, detect_separator, looks_like_header};
use super::tokenizer::RowIter;
use super::{Column, ParseError, RowError, RowErrorKind};

/// Default rows per batch for the batched decode path.
pub const DEFAULT_BATCH_SIZE: usize = 2_000;

/// Result of draining a whole payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOutcome {
    pub records: Vec<ProductRecord>,
    pub errors: Vec<RowError>,
    /// Rows dropped entirely (subset of `errors`)
    pub rows_skipped: usize,
}

/// One bounded batch of decoded rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch {
    pub records: Vec<ProductRecord>,
    pub errors: Vec<RowError>,
}

/// Resolved physical position of each logical column.
#[derive(Debug, Clone)]
struct ColumnMap {
    positions: HashMap<Column, usize>,
}

impl ColumnMap {
    fn get(&self, column: Column) -> Option<usize> {
        self.positions.get(&column).copied()
    }

    /// Positional mapping in canonical order, for headerless files.
    fn positional() -> Self {
        let positions = Column::ORDER
            .iter()
            .enumerate()
            .map(|(i, c)| (*c, i))
            .collect();
        Self { positions }
    }

    /// Resolve logical columns against a physical header row.
    ///
    /// Two passes per column: case-insensitive exact match over the
    /// alias list first, then case-insensitive substring match. A cell
    /// claimed by one column is not offered to later ones, and the
    /// substring pass runs `partnerPrice` before `listPrice` so the
    /// generic `price` alias cannot steal the partner column.
    fn resolve(header: &[String]) -> Result<Self, ParseError> {
        let cells: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
        let mut positions = HashMap::new();
        let mut claimed = vec![false; cells.len()];

        let assign = |column: Column,
                          positions: &mut HashMap<Column, usize>,
                          claimed: &mut Vec<bool>,
                          exact: bool| {
            if positions.contains_key(&column) {
                return;
            }
            for alias in column.aliases() {
                for (i, cell) in cells.iter().enumerate() {
                    if claimed[i] {
                        continue;
                    }
                    let hit = if exact {
                        cell == alias
                    } else {
                        cell.contains(alias)
                    };
                    if hit {
                        positions.insert(column, i);
                        claimed[i] = true;
                        return;
                    }
                }
            }
        };

        for column in Column::ORDER {
            assign(column, &mut positions, &mut claimed, true);
        }
        // Substring pass; partner before list so plain "price" headers
        // resolve to the list price only.
        for column in [
            Column::Code,
            Column::Name,
            Column::Description,
            Column::Category,
            Column::PartnerPrice,
            Column::ListPrice,
        ] {
            assign(column, &mut positions, &mut claimed, false);
        }

        for column in Column::ORDER {
            if column.is_mandatory() && !positions.contains_key(&column) {
                return Err(ParseError::MissingColumn(column.canonical()));
            }
        }
        Ok(Self { positions })
    }
}

/// Currency glyphs stripped before numeric parsing.
const CURRENCY_GLYPHS: [char; 8] = ['€', '$', '£', '¥', '₺', '₹', '₩', '¢'];

/// Parse a price cell tolerating currency symbols, grouping separators,
/// comma-decimal locales and surrounding whitespace.
///
/// Returns `None` for unparseable or negative input.
pub(super) fn parse_price(raw: &str) -> Option<f64> {
    let mut cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !CURRENCY_GLYPHS.contains(c))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let commas = cleaned.matches(',').count();
    let dots = cleaned.matches('.').count();

    if commas > 0 && dots > 0 {
        // Whichever separator occurs last is the decimal point
        let last_comma = cleaned.rfind(',').unwrap_or(0);
        let last_dot = cleaned.rfind('.').unwrap_or(0);
        if last_comma > last_dot {
            cleaned = cleaned.replace('.', "").replace(',', ".");
        } else {
            cleaned = cleaned.replace(',', "");
        }
    } else if commas > 0 {
        let decimals = cleaned.len() - cleaned.rfind(',').unwrap_or(0) - 1;
        if commas == 1 && decimals <= 2 {
            cleaned = cleaned.replace(',', ".");
        } else {
            // Comma as grouping: 1,234,567
            cleaned = cleaned.replace(',', "");
        }
    } else if dots > 1 {
        // Multiple dots can only be grouping: 1.234.567
        cleaned = cleaned.replace('.', "");
    }

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(value)
}

/// Streaming decoder over one CSV payload.
///
/// Construction detects the physical format and resolves the header;
/// rows are then pulled in bounded batches so memory stays proportional
/// to one batch and batch boundaries never split a logical row.
pub struct Decoder<'a> {
    rows: RowIter<'a>,
    columns: ColumnMap,
    pending: Option<(usize, Vec<String>)>,
}

impl<'a> Decoder<'a> {
    pub fn new(text: &'a str) -> Result<Self, ParseError> {
        let line_ending = detect_line_ending(text);
        let header_line = text
            .split(line_ending.as_str())
            .next()
            .unwrap_or(text);
        let separator = detect_separator(header_line);

        let mut rows = RowIter::new(text, separator, line_ending);
        let first = rows.next().ok_or(ParseError::EmptyFile)?;

        let (columns, pending) = match ColumnMap::resolve(&first.1) {
            Ok(columns) => (columns, None),
            Err(err) if looks_like_header(&first.1) => return Err(err),
            Err(_) => {
                debug!(row = first.0, "no header row detected, mapping columns positionally");
                (ColumnMap::positional(), Some(first))
            }
        };

        Ok(Self {
            rows,
            columns,
            pending,
        })
    }

    fn cell<'r>(&self, fields: &'r [String], column: Column) -> Option<&'r str> {
        self.columns
            .get(column)
            .and_then(|i| fields.get(i))
            .map(|s| s.trim())
    }

    fn map_row(
        &self,
        row: usize,
        fields: &[String],
        errors: &mut Vec<RowError>,
    ) -> Option<ProductRecord> {
        let Some(code) = self.cell(fields, Column::Code) else {
            errors.push(RowError {
                row,
                kind: RowErrorKind::ShortRow,
            });
            return None;
        };
        if code.is_empty() {
            errors.push(RowError {
                row,
                kind: RowErrorKind::MissingCode,
            });
            return None;
        }

        let Some(name) = self.cell(fields, Column::Name) else {
            errors.push(RowError {
                row,
                kind: RowErrorKind::ShortRow,
            });
            return None;
        };
        if name.is_empty() {
            errors.push(RowError {
                row,
                kind: RowErrorKind::MissingName,
            });
            return None;
        }

        // The list price column must exist in the row; the value itself
        // may still be garbage, which only defaults to 0.
        let Some(list_raw) = self.cell(fields, Column::ListPrice) else {
            errors.push(RowError {
                row,
                kind: RowErrorKind::ShortRow,
            });
            return None;
        };

        let mut price_of = |raw: Option<&str>| -> f64 {
            match raw {
                None => 0.0,
                Some(s) if s.is_empty() => 0.0,
                Some(s) => parse_price(s).unwrap_or_else(|| {
                    errors.push(RowError {
                        row,
                        kind: RowErrorKind::InvalidPrice,
                    });
                    0.0
                }),
            }
        };

        let list_price = price_of(Some(list_raw));
        let partner_price = price_of(self.cell(fields, Column::PartnerPrice));

        Some(ProductRecord {
            code: code.to_string(),
            name: name.to_string(),
            description: self
                .cell(fields, Column::Description)
                .unwrap_or_default()
                .to_string(),
            category: self
                .cell(fields, Column::Category)
                .unwrap_or_default()
                .to_string(),
            list_price,
            partner_price,
        })
    }

    /// Pull the next batch of at most `max_rows` data rows.
    ///
    /// Returns `None` once the payload is exhausted.
    pub fn next_batch(&mut self, max_rows: usize) -> Option<RecordBatch> {
        let max_rows = max_rows.max(1);
        let mut records = Vec::new();
        let mut errors = Vec::new();
        let mut seen = 0usize;

        while seen < max_rows {
            let Some((row, fields)) = self.pending.take().or_else(|| self.rows.next()) else {
                break;
            };
            seen += 1;
            if let Some(record) = self.map_row(row, &fields, &mut errors) {
                records.push(record);
            }
        }

        if seen == 0 {
            return None;
        }
        Some(RecordBatch { records, errors })
    }

    /// Drain the whole payload into one outcome.
    pub fn drain(mut self) -> DecodeOutcome {
        let mut records = Vec::new();
        let mut errors = Vec::new();
        while let Some(batch) = self.next_batch(DEFAULT_BATCH_SIZE) {
            records.extend(batch.records);
            errors.extend(batch.errors);
        }
        let rows_skipped = errors.iter().filter(|e| e.is_skip()).count();
        DecodeOutcome {
            records,
            errors,
            rows_skipped,
        }
    }
}

/// Decode a complete text payload.
pub fn decode_str(text: &str) -> Result<DecodeOutcome, ParseError> {
    Ok(Decoder::new(text)?.drain())
}

/// Decode a raw byte payload, detecting the text encoding first.
pub fn decode_bytes(bytes: &[u8]) -> Result<DecodeOutcome, ParseError> {
    let text = super::detect::detect_encoding(bytes)?;
    decode_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_file_scenario() {
        let out = decode_str("code,name,listPrice,partnerPrice\nA1,Widget,100,50").unwrap();
        assert_eq!(out.errors, vec![]);
        assert_eq!(
            out.records,
            vec![ProductRecord {
                code: "A1".to_string(),
                name: "Widget".to_string(),
                description: String::new(),
                category: String::new(),
                list_price: 100.0,
                partner_price: 50.0,
            }]
        );
    }

    #[test]
    fn test_decode_idempotent() {
        let text = "code;name;price\nA1;Widget;9,99\nB2;Gadget;12,50\n";
        let first = decode_str(text).unwrap();
        let second = decode_str(text).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_alias_and_order_flexibility() {
        let text = "Unit Price,Product Name,SKU\n19.90,Widget,A1\n";
        let out = decode_str(text).unwrap();
        assert_eq!(out.records[0].code, "A1");
        assert_eq!(out.records[0].name, "Widget");
        assert_eq!(out.records[0].list_price, 19.9);
    }

    #[test]
    fn test_partner_price_not_stolen_by_price_alias() {
        let text = "code,name,Partner Price,List Price\nA1,Widget,50,100\n";
        let out = decode_str(text).unwrap();
        assert_eq!(out.records[0].partner_price, 50.0);
        assert_eq!(out.records[0].list_price, 100.0);
    }

    #[test]
    fn test_missing_mandatory_column_is_fatal() {
        let err = decode_str("name,description\nWidget,Nice\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingColumn(_)));
    }

    #[test]
    fn test_empty_file_is_fatal() {
        assert_eq!(decode_str("").unwrap_err(), ParseError::EmptyFile);
        assert_eq!(decode_str("\n\n").unwrap_err(), ParseError::EmptyFile);
    }

    #[test]
    fn test_headerless_positional_mapping() {
        let text = "A1,Widget,Nice one,Network,100,60\n";
        let out = decode_str(text).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].category, "Network");
        assert_eq!(out.records[0].partner_price, 60.0);
    }

    #[test]
    fn test_rows_missing_code_or_name_skipped() {
        let text = "code,name,listPrice\n,NoCode,10\nA2,,20\nA3,Ok,30\n";
        let out = decode_str(text).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].code, "A3");
        assert_eq!(out.rows_skipped, 2);
        assert_eq!(out.errors[0].kind, RowErrorKind::MissingCode);
        assert_eq!(out.errors[1].kind, RowErrorKind::MissingName);
    }

    #[test]
    fn test_unparseable_price_defaults_to_zero() {
        let text = "code,name,listPrice\nA1,Widget,abc\n";
        let out = decode_str(text).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].list_price, 0.0);
        assert_eq!(out.errors[0].kind, RowErrorKind::InvalidPrice);
        assert_eq!(out.rows_skipped, 0);
    }

    #[test]
    fn test_short_row_is_skipped_not_fatal() {
        let text = "code,name,listPrice\nA1\nA2,Widget,10\n";
        let out = decode_str(text).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.errors[0].kind, RowErrorKind::ShortRow);
    }

    #[test]
    fn test_price_locales() {
        assert_eq!(parse_price("1.234,56"), Some(1234.56));
        assert_eq!(parse_price("1,234.56"), Some(1234.56));
        assert_eq!(parse_price("9,99"), Some(9.99));
        assert_eq!(parse_price("1,234"), Some(1234.0));
        assert_eq!(parse_price("1.234.567"), Some(1234567.0));
        assert_eq!(parse_price(" € 42,00 "), Some(42.0));
        assert_eq!(parse_price("$1,299.00"), Some(1299.0));
        assert_eq!(parse_price("₺15.75"), Some(15.75));
        assert_eq!(parse_price("abc"), None);
        assert_eq!(parse_price("-5"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn test_quoted_fields_survive() {
        let text = "code,name,listPrice\nA1,\"Widget, the \"\"big\"\" one\",10\n";
        let out = decode_str(text).unwrap();
        assert_eq!(out.records[0].name, "Widget, the \"big\" one");
    }

    #[test]
    fn test_batched_decode_bounds_rows() {
        let mut text = String::from("code,name,listPrice\n");
        for i in 0..10 {
            text.push_str(&format!("C{i},Item {i},{i}\n"));
        }
        let mut decoder = Decoder::new(&text).unwrap();
        let mut batches = 0;
        let mut total = 0;
        while let Some(batch) = decoder.next_batch(4) {
            batches += 1;
            assert!(batch.records.len() <= 4);
            total += batch.records.len();
        }
        assert_eq!(batches, 3); // 4 + 4 + 2
        assert_eq!(total, 10);
    }

    #[test]
    fn test_tab_separated_with_crlf() {
        let text = "code\tname\tlistPrice\r\nA1\tWidget\t10.50\r\n";
        let out = decode_str(text).unwrap();
        assert_eq!(out.records[0].list_price, 10.5);
    }

    #[test]
    fn test_decode_bytes_windows_1252() {
        let bytes = b"code,name,listPrice\nA1,Caf\xe9,10\n";
        let out = decode_bytes(bytes).unwrap();
        assert_eq!(out.records[0].name, "Café");
    }
}
