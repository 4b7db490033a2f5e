//! Input format detection: text encoding, line ending, field separator,
//! and the header-row heuristic.

use std::borrow::Cow;

use super::ParseError;

/// Line ending of a CSV payload, detected by first occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    CrLf,
    Cr,
    Lf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
            Self::Lf => "\n",
        }
    }
}

/// Decode a raw byte payload to text.
///
/// BOM-sniffs UTF-8 / UTF-16LE / UTF-16BE; BOM-less payloads are taken
/// as UTF-8 when valid, otherwise fall back to WINDOWS-1252 (the usual
/// culprit for spreadsheet exports).
pub fn detect_encoding(bytes: &[u8]) -> Result<Cow<'_, str>, ParseError> {
    if let Some((encoding, bom_len)) = encoding_rs::Encoding::for_bom(bytes) {
        let (text, _, had_errors) = encoding.decode(&bytes[bom_len..]);
        if had_errors {
            return Err(ParseError::Encoding(format!(
                "invalid {} payload",
                encoding.name()
            )));
        }
        return Ok(text);
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(Cow::Borrowed(text)),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            Ok(text)
        }
    }
}

/// Detect the line ending by first occurrence, priority CRLF > CR > LF.
pub fn detect_line_ending(text: &str) -> LineEnding {
    if text.contains("\r\n") {
        LineEnding::CrLf
    } else if text.contains('\r') {
        LineEnding::Cr
    } else {
        LineEnding::Lf
    }
}

/// Detect the field separator from the header line.
///
/// First match in priority order tab > semicolon > comma wins; a line
/// with none of them defaults to comma (single-column file).
pub fn detect_separator(header_line: &str) -> char {
    for candidate in ['\t', ';', ','] {
        if header_line.contains(candidate) {
            return candidate;
        }
    }
    ','
}

/// Fixed vocabulary used to recognize an undeclared header row.
const HEADER_TERMS: [&str; 10] = [
    "product",
    "code",
    "name",
    "description",
    "price",
    "category",
    "id",
    "sku",
    "cost",
    "partner",
];

/// Heuristic: a row is "likely a header" when at least two of the
/// domain vocabulary terms appear in it, case-insensitively.
pub fn looks_like_header(fields: &[String]) -> bool {
    let joined = fields.join(" ").to_lowercase();
    HEADER_TERMS
        .iter()
        .filter(|term| joined.contains(*term))
        .count()
        >= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_ending_priority() {
        assert_eq!(detect_line_ending("a,b\r\nc,d"), LineEnding::CrLf);
        assert_eq!(detect_line_ending("a,b\rc,d"), LineEnding::Cr);
        assert_eq!(detect_line_ending("a,b\nc,d"), LineEnding::Lf);
        // CRLF wins even when a lone LF appears later
        assert_eq!(detect_line_ending("a\r\nb\nc"), LineEnding::CrLf);
    }

    #[test]
    fn test_separator_priority() {
        assert_eq!(detect_separator("a\tb;c,d"), '\t');
        assert_eq!(detect_separator("a;b,c"), ';');
        assert_eq!(detect_separator("a,b"), ',');
        assert_eq!(detect_separator("single"), ',');
    }

    #[test]
    fn test_utf8_passthrough() {
        let text = detect_encoding("code,name\nA1,Widget".as_bytes()).unwrap();
        assert_eq!(text, "code,name\nA1,Widget");
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"code,name");
        assert_eq!(detect_encoding(&bytes).unwrap(), "code,name");
    }

    #[test]
    fn test_utf16le_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "code".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(detect_encoding(&bytes).unwrap(), "code");
    }

    #[test]
    fn test_windows_1252_fallback() {
        // 0xE9 is 'é' in WINDOWS-1252 but invalid standalone UTF-8
        let bytes = b"caf\xe9";
        assert_eq!(detect_encoding(bytes).unwrap(), "café");
    }

    #[test]
    fn test_header_heuristic() {
        let yes = vec!["Product Code".to_string(), "List Price".to_string()];
        assert!(looks_like_header(&yes));
        let no = vec!["A1".to_string(), "Widget".to_string(), "9.99".to_string()];
        assert!(!looks_like_header(&no));
    }
}
