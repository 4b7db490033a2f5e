//! Minimal PDF 1.4 writer
//!
//! Just enough of the format for paginated text documents: catalog,
//! page tree, the two built-in Helvetica fonts, one uncompressed
//! content stream per page, and a classic xref table. Coordinates on
//! the public surface are top-down (offset from the page top); the
//! conversion to PDF's bottom-up space happens here.

use std::io::Write;

use crate::error::RenderError;
use crate::layout::{PAGE_HEIGHT, PAGE_WIDTH};

/// The two fonts every page resource dictionary carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(&self) -> &'static str {
        match self {
            Self::Regular => "/F1",
            Self::Bold => "/F2",
        }
    }
}

fn fmt_pt(value: f64) -> String {
    format!("{value:.2}")
}

/// Encode text for a PDF literal string under WinAnsiEncoding.
///
/// ASCII passes through (with `\`, `(`, `)` escaped), Latin-1 and the
/// euro sign become octal escapes, anything else degrades to `?` so a
/// document never fails on exotic input.
fn encode_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            ' '..='~' => out.push(c),
            // WinAnsi maps the euro sign at 0x80
            '€' => out.push_str("\\200"),
            c if ('\u{A0}'..='\u{FF}').contains(&c) => {
                out.push_str(&format!("\\{:03o}", c as u32));
            }
            _ => out.push('?'),
        }
    }
    out
}

/// Drawing operators of one page, accumulated top-down.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    ops: String,
}

impl PageContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw a line of text at `(x, y_top)`, where `y_top` is the offset
    /// of the line's top edge from the top of the page.
    pub fn text(&mut self, x: f64, y_top: f64, size: f64, font: Font, text: &str) {
        let baseline = PAGE_HEIGHT - y_top - size;
        self.ops.push_str(&format!(
            "BT {} {} Tf {} {} Td ({}) Tj ET\n",
            font.resource(),
            fmt_pt(size),
            fmt_pt(x),
            fmt_pt(baseline),
            encode_text(text),
        ));
    }

    /// Stroke a straight line between two top-down points.
    pub fn line(&mut self, x1: f64, y1_top: f64, x2: f64, y2_top: f64, width: f64) {
        self.ops.push_str(&format!(
            "{} w {} {} m {} {} l S\n",
            fmt_pt(width),
            fmt_pt(x1),
            fmt_pt(PAGE_HEIGHT - y1_top),
            fmt_pt(x2),
            fmt_pt(PAGE_HEIGHT - y2_top),
        ));
    }

    /// Stroke a rectangle whose top-left corner sits at `(x, y_top)`.
    pub fn rect(&mut self, x: f64, y_top: f64, w: f64, h: f64) {
        self.ops.push_str(&format!(
            "0.75 w {} {} {} {} re S\n",
            fmt_pt(x),
            fmt_pt(PAGE_HEIGHT - y_top - h),
            fmt_pt(w),
            fmt_pt(h),
        ));
    }

    /// Fill a rectangle with a gray level (0 black .. 1 white), then
    /// restore black fill.
    pub fn rect_filled(&mut self, x: f64, y_top: f64, w: f64, h: f64, gray: f64) {
        self.ops.push_str(&format!(
            "{} g {} {} {} {} re f 0 g\n",
            fmt_pt(gray),
            fmt_pt(x),
            fmt_pt(PAGE_HEIGHT - y_top - h),
            fmt_pt(w),
            fmt_pt(h),
        ));
    }

    fn stream(&self) -> &str {
        &self.ops
    }
}

/// Serialize finished pages into a complete PDF byte stream.
pub fn serialize(pages: &[PageContent]) -> Result<Vec<u8>, RenderError> {
    let empty = [PageContent::new()];
    let pages = if pages.is_empty() { &empty[..] } else { pages };

    let mut buf: Vec<u8> = Vec::with_capacity(8 * 1024);
    let mut offsets: Vec<usize> = Vec::new();

    buf.extend_from_slice(b"%PDF-1.4\n");
    // Binary marker comment so transports treat the file as binary
    buf.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

    // Object numbering: 1 catalog, 2 page tree, 3/4 fonts, then an
    // alternating (page, content) pair per page.
    let page_obj = |i: usize| 5 + 2 * i;
    let content_obj = |i: usize| 6 + 2 * i;
    let total_objects = 4 + 2 * pages.len();

    offsets.push(buf.len());
    write!(buf, "1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n")?;

    offsets.push(buf.len());
    let kids: Vec<String> = (0..pages.len()).map(|i| format!("{} 0 R", page_obj(i))).collect();
    write!(
        buf,
        "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
        kids.join(" "),
        pages.len()
    )?;

    offsets.push(buf.len());
    write!(
        buf,
        "3 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica \
         /Encoding /WinAnsiEncoding >>\nendobj\n"
    )?;
    offsets.push(buf.len());
    write!(
        buf,
        "4 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold \
         /Encoding /WinAnsiEncoding >>\nendobj\n"
    )?;

    for (i, page) in pages.iter().enumerate() {
        offsets.push(buf.len());
        write!(
            buf,
            "{} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> \
             /Contents {} 0 R >>\nendobj\n",
            page_obj(i),
            PAGE_WIDTH,
            PAGE_HEIGHT,
            content_obj(i)
        )?;

        let stream = page.stream();
        offsets.push(buf.len());
        write!(
            buf,
            "{} 0 obj\n<< /Length {} >>\nstream\n{}endstream\nendobj\n",
            content_obj(i),
            stream.len(),
            stream
        )?;
    }

    let xref_offset = buf.len();
    write!(buf, "xref\n0 {}\n", total_objects + 1)?;
    write!(buf, "0000000000 65535 f \n")?;
    for offset in &offsets {
        write!(buf, "{offset:010} 00000 n \n")?;
    }
    write!(
        buf,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        total_objects + 1,
        xref_offset
    )?;

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_trailer() {
        let mut page = PageContent::new();
        page.text(40.0, 40.0, 10.0, Font::Regular, "hello");
        let bytes = serialize(&[page]).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4\n"));
        assert!(bytes.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn test_page_count_in_tree() {
        let pages = vec![PageContent::new(), PageContent::new(), PageContent::new()];
        let bytes = serialize(&pages).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 3"));
        assert!(text.contains("/Kids [5 0 R 7 0 R 9 0 R]"));
    }

    #[test]
    fn test_empty_input_still_yields_one_page() {
        let bytes = serialize(&[]).unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("/Count 1"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let bytes = serialize(&[PageContent::new()]).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        let xref_at = text.find("xref\n").unwrap();
        for (n, line) in text[xref_at..]
            .lines()
            .skip(3) // "xref", "0 N", free entry
            .take_while(|l| l.ends_with("n "))
            .enumerate()
        {
            let offset: usize = line.split(' ').next().unwrap().parse().unwrap();
            assert!(text[offset..].starts_with(&format!("{} 0 obj", n + 1)));
        }
    }

    #[test]
    fn test_text_escaping() {
        assert_eq!(encode_text("a(b)c\\d"), "a\\(b\\)c\\\\d");
        assert_eq!(encode_text("10 €"), "10 \\200");
        assert_eq!(encode_text("café"), "caf\\351");
        assert_eq!(encode_text("漢"), "?");
    }

    #[test]
    fn test_text_op_converts_to_bottom_up_space() {
        let mut page = PageContent::new();
        page.text(40.0, 40.0, 10.0, Font::Bold, "x");
        // top offset 40 with 10pt text -> baseline at 842 - 50 = 792
        assert!(page.stream().contains("/F2 10.00 Tf 40.00 792.00 Td"));
    }
}
