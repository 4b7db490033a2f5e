//! CSV encode: canonical column order, 2-decimal prices, minimal quoting.

use shared::models::ProductRecord;

use super::Column;

/// Separator used by the encoder. Decode accepts more, encode emits one.
const SEPARATOR: char = ',';

/// Quote a field iff it contains the separator, a quote, or a newline;
/// internal quotes are doubled.
fn escape_field(field: &str) -> String {
    let needs_quoting = field.contains(SEPARATOR)
        || field.contains('"')
        || field.contains('\n')
        || field.contains('\r');
    if needs_quoting {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Encode product records to canonical CSV text.
///
/// Header row `code,name,description,category,listPrice,partnerPrice`,
/// prices with exactly two decimal places. Round-trip property:
/// `parse(format(x)) == x` modulo 2-decimal price rounding.
pub fn encode(records: &[ProductRecord]) -> String {
    let mut out = String::with_capacity(64 + records.len() * 48);

    let header: Vec<&str> = Column::ORDER.iter().map(|c| c.canonical()).collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for record in records {
        let fields = [
            escape_field(&record.code),
            escape_field(&record.name),
            escape_field(&record.description),
            escape_field(&record.category),
            format!("{:.2}", record.list_price),
            format!("{:.2}", record.partner_price),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::super::decode::decode_str;
    use super::*;

    fn record(code: &str, name: &str, list: f64, partner: f64) -> ProductRecord {
        ProductRecord {
            code: code.to_string(),
            name: name.to_string(),
            description: String::new(),
            category: String::new(),
            list_price: list,
            partner_price: partner,
        }
    }

    #[test]
    fn test_canonical_header_and_decimals() {
        let text = encode(&[record("A1", "Widget", 100.0, 50.5)]);
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "code,name,description,category,listPrice,partnerPrice"
        );
        assert_eq!(lines.next().unwrap(), "A1,Widget,,,100.00,50.50");
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_round_trip_plain_ascii() {
        let records = vec![
            record("A1", "Widget", 100.0, 50.0),
            record("B2", "Gadget Pro", 19.99, 7.25),
        ];
        let out = decode_str(&encode(&records)).unwrap();
        assert_eq!(out.records, records);
        assert!(out.errors.is_empty());
    }

    #[test]
    fn test_round_trip_with_embedded_separators_and_quotes() {
        let mut r = record("A1", "Widget, the \"big\" one", 10.0, 5.0);
        r.description = "multi\nline".to_string();
        r.category = "Net;work".to_string();
        let out = decode_str(&encode(&[r.clone()])).unwrap();
        assert_eq!(out.records, vec![r]);
    }

    #[test]
    fn test_round_trip_rounds_to_two_decimals() {
        let r = record("A1", "Widget", 10.556, 1.0 / 3.0);
        let out = decode_str(&encode(&[r])).unwrap();
        assert_eq!(out.records[0].list_price, 10.56);
        assert_eq!(out.records[0].partner_price, 0.33);
    }
}
