//! Page geometry and pagination
//!
//! A4 portrait, fixed margins, a downward-growing cursor measured from
//! the top of the page. Sections measure their height first, then call
//! [`PageCursor::advance`], so a row never straddles a page boundary.

/// A4 page width in points
pub const PAGE_WIDTH: f64 = 595.0;
/// A4 page height in points
pub const PAGE_HEIGHT: f64 = 842.0;
/// Margin on all four sides in points
pub const MARGIN: f64 = 40.0;

/// Baseline-to-baseline distance for body text
pub const LINE_HEIGHT: f64 = 12.0;
/// Vertical padding inside a table cell (top + bottom combined)
pub const CELL_PADDING: f64 = 6.0;
/// Table rows never get shorter than this
pub const MIN_ROW_HEIGHT: f64 = 18.0;

/// Usable width between the margins.
pub fn content_width() -> f64 {
    PAGE_WIDTH - 2.0 * MARGIN
}

/// Pagination state: current page and vertical offset from the page top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageCursor {
    /// 1-based page number
    pub page: usize,
    /// Offset from the top of the page, in points
    pub y: f64,
}

impl PageCursor {
    pub fn new() -> Self {
        Self { page: 1, y: MARGIN }
    }

    /// Reserve `required` points of vertical space.
    ///
    /// When the space does not fit above the bottom margin, moves to the
    /// top of a fresh page and returns `true` so the caller can open it.
    pub fn advance(&mut self, required: f64) -> bool {
        if self.y + required > PAGE_HEIGHT - MARGIN {
            self.page += 1;
            self.y = MARGIN;
            true
        } else {
            false
        }
    }

    /// Consume vertical space on the current page.
    pub fn consume(&mut self, height: f64) {
        self.y += height;
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Horizontal alignment of text inside a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// One table column: header title, width as a fraction of the content
/// width, and cell alignment.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub title: &'static str,
    pub width_fraction: f64,
    pub align: Align,
}

impl ColumnSpec {
    pub const fn new(title: &'static str, width_fraction: f64, align: Align) -> Self {
        Self {
            title,
            width_fraction,
            align,
        }
    }

    /// Absolute column width in points.
    pub fn width(&self) -> f64 {
        self.width_fraction * content_width()
    }
}

/// Approximate rendered width of a string in points.
///
/// Helvetica has no fixed advance; an average-width factor is close
/// enough for wrapping and right-alignment of tabular content.
const AVG_CHAR_WIDTH_FACTOR: f64 = 0.5;

pub fn text_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * AVG_CHAR_WIDTH_FACTOR
}

/// Greedy word wrap against a maximum line width in points.
///
/// A single word wider than the limit gets its own line rather than
/// being broken mid-word. Empty input yields one empty line so callers
/// can treat every cell as at least one line tall.
pub fn wrap_text(text: &str, font_size: f64, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, font_size) <= max_width || current.is_empty() {
            current = candidate;
        } else {
            lines.push(current);
            current = word.to_string();
        }
    }
    lines.push(current);
    lines
}

/// Table row height for the tallest cell in the row.
pub fn row_height(max_lines: usize) -> f64 {
    let content = max_lines.max(1) as f64 * LINE_HEIGHT + CELL_PADDING;
    content.max(MIN_ROW_HEIGHT)
}
