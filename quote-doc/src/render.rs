//! Proposal document renderer
//!
//! Renders a proposal and its computed financial snapshot into a
//! paginated PDF. The document is an ordered list of sections; each
//! section reserves its height through the page cursor before drawing,
//! so rows never straddle a page boundary. Missing optional data
//! degrades to placeholders or skipped sections; the only fatal error
//! is final byte serialization.

use rust_decimal::Decimal;
use shared::FormatConfig;
use shared::format::{format_date, format_money, format_percent, format_quantity, to_decimal, to_f64};
use shared::models::{
    CustomTaxLine, EngineeringLine, ExpenseCategory, ExpenseLine, Proposal, ProposalFinancials,
    ProposalItem, VatBreakdown,
};
use tracing::{debug, instrument};

use crate::error::RenderError;
use crate::layout::{
    Align, CELL_PADDING, ColumnSpec, LINE_HEIGHT, MARGIN, MIN_ROW_HEIGHT, PAGE_HEIGHT, PAGE_WIDTH,
    PageCursor, content_width, row_height, text_width, wrap_text,
};
use crate::pdf::{self, Font, PageContent};

const TITLE_SIZE: f64 = 16.0;
const SECTION_SIZE: f64 = 11.0;
const BODY_SIZE: f64 = 9.0;
const SMALL_SIZE: f64 = 7.5;
const FOOTER_SIZE: f64 = 8.0;

/// Per-document settings supplied by the host application.
#[derive(Debug, Clone, Default)]
pub struct DocSettings {
    pub company_name: String,
    /// Skipped entirely when empty
    pub payment_terms: String,
    /// Legal disclaimer, skipped entirely when empty
    pub legal_text: String,
}

/// Renders proposals to PDF bytes.
pub struct DocumentRenderer {
    config: FormatConfig,
    settings: DocSettings,
}

impl DocumentRenderer {
    pub fn new(config: FormatConfig, settings: DocSettings) -> Self {
        Self { config, settings }
    }

    /// Render one proposal with its financial snapshot.
    #[instrument(skip_all, fields(reference = %proposal.reference))]
    pub fn render(
        &self,
        proposal: &Proposal,
        financials: &ProposalFinancials,
    ) -> Result<Vec<u8>, RenderError> {
        let mut doc = DocBuilder::new();

        self.render_header(&mut doc, proposal);
        self.render_customer(&mut doc, proposal);
        self.render_payment_terms(&mut doc);
        self.render_products(&mut doc, &proposal.items, financials);
        self.render_engineering(&mut doc, &proposal.engineering, financials);
        self.render_expenses(&mut doc, &proposal.expenses, financials);
        self.render_taxes(&mut doc, &proposal.taxes, financials);
        self.render_summary(&mut doc, financials);
        self.render_categories(&mut doc, financials);
        self.render_notes(&mut doc, proposal);
        self.render_legal(&mut doc);

        let generated = format_date(chrono::Local::now().date_naive(), &self.config);
        let pages = doc.finish(&proposal.reference, &generated);
        debug!(pages = pages.len(), "document laid out");
        pdf::serialize(&pages)
    }

    fn money(&self, value: f64) -> String {
        format_money(value, &self.config)
    }

    fn percent(&self, value: f64) -> String {
        format_percent(value, &self.config)
    }

    fn render_header(&self, doc: &mut DocBuilder, proposal: &Proposal) {
        if !self.settings.company_name.is_empty() {
            doc.text_line(&self.settings.company_name, TITLE_SIZE, Font::Bold, Align::Center);
            doc.gap(4.0);
        }
        doc.text_line(
            &format!("Proposal {}", proposal.reference),
            SECTION_SIZE + 2.0,
            Font::Bold,
            Align::Center,
        );
        doc.text_line(
            &format!(
                "{} — {}",
                proposal.status.label(),
                format_date(proposal.created_at, &self.config)
            ),
            BODY_SIZE,
            Font::Regular,
            Align::Center,
        );
        doc.rule();
    }

    fn render_customer(&self, doc: &mut DocBuilder, proposal: &Proposal) {
        doc.section_title("Customer");
        match &proposal.customer {
            None => doc.text_line("No customer on record", BODY_SIZE, Font::Regular, Align::Left),
            Some(customer) => {
                doc.text_line(&customer.name, BODY_SIZE, Font::Bold, Align::Left);
                for field in [
                    customer.contact_name.as_deref(),
                    customer.address.as_deref(),
                    customer.email.as_deref(),
                    customer.phone.as_deref(),
                ]
                .into_iter()
                .flatten()
                {
                    doc.text_line(field, BODY_SIZE, Font::Regular, Align::Left);
                }
            }
        }
    }

    fn render_payment_terms(&self, doc: &mut DocBuilder) {
        let terms = self.settings.payment_terms.trim();
        if terms.is_empty() {
            return;
        }
        doc.section_title("Payment Terms");
        doc.paragraph(terms, BODY_SIZE);
    }

    fn render_products(
        &self,
        doc: &mut DocBuilder,
        items: &[ProposalItem],
        financials: &ProposalFinancials,
    ) {
        if items.is_empty() {
            return;
        }
        const COLUMNS: [ColumnSpec; 5] = [
            ColumnSpec::new("Code", 0.22, Align::Left),
            ColumnSpec::new("Qty", 0.12, Align::Center),
            ColumnSpec::new("Unit Price", 0.24, Align::Right),
            ColumnSpec::new("Discount", 0.14, Align::Center),
            ColumnSpec::new("Amount", 0.28, Align::Right),
        ];

        doc.section_title("Products");
        let rows: Vec<Vec<String>> = items
            .iter()
            .map(|item| {
                vec![
                    item.product_code.clone(),
                    item.quantity.to_string(),
                    self.money(item.unit_price),
                    self.percent(item.discount_percent),
                    self.money(item_amount(item)),
                ]
            })
            .collect();
        doc.table(&COLUMNS, &rows);
        doc.total_row("Subtotal products", &self.money(financials.subtotal_products));
    }

    fn render_engineering(
        &self,
        doc: &mut DocBuilder,
        lines: &[EngineeringLine],
        financials: &ProposalFinancials,
    ) {
        if lines.is_empty() {
            return;
        }
        const COLUMNS: [ColumnSpec; 4] = [
            ColumnSpec::new("Description", 0.46, Align::Left),
            ColumnSpec::new("Days", 0.12, Align::Center),
            ColumnSpec::new("Daily Rate", 0.20, Align::Right),
            ColumnSpec::new("Amount", 0.22, Align::Right),
        ];

        doc.section_title("Engineering & Services");
        let rows: Vec<Vec<String>> = lines
            .iter()
            .map(|line| {
                vec![
                    line.description.clone(),
                    format_quantity(line.days),
                    self.money(line.daily_rate),
                    self.money(engineering_amount(line)),
                ]
            })
            .collect();
        doc.table(&COLUMNS, &rows);
        doc.total_row(
            "Subtotal engineering",
            &self.money(financials.subtotal_engineering),
        );
    }

    fn render_expenses(
        &self,
        doc: &mut DocBuilder,
        lines: &[ExpenseLine],
        financials: &ProposalFinancials,
    ) {
        if lines.is_empty() {
            return;
        }
        const COLUMNS: [ColumnSpec; 3] = [
            ColumnSpec::new("Description", 0.56, Align::Left),
            ColumnSpec::new("Category", 0.20, Align::Center),
            ColumnSpec::new("Amount", 0.24, Align::Right),
        ];

        doc.section_title("Expenses");
        let rows: Vec<Vec<String>> = lines
            .iter()
            .map(|line| {
                vec![
                    line.description.clone(),
                    ExpenseCategory::infer(&line.description).label().to_string(),
                    self.money(line.amount),
                ]
            })
            .collect();
        doc.table(&COLUMNS, &rows);
        doc.total_row("Subtotal expenses", &self.money(financials.subtotal_expenses));
    }

    fn render_taxes(
        &self,
        doc: &mut DocBuilder,
        lines: &[CustomTaxLine],
        financials: &ProposalFinancials,
    ) {
        if lines.is_empty() {
            return;
        }
        const COLUMNS: [ColumnSpec; 3] = [
            ColumnSpec::new("Tax", 0.56, Align::Left),
            ColumnSpec::new("Rate", 0.20, Align::Center),
            ColumnSpec::new("Amount", 0.24, Align::Right),
        ];

        doc.section_title("Taxes & Duties");
        let rows: Vec<Vec<String>> = lines
            .iter()
            .map(|line| {
                vec![
                    line.name.clone(),
                    self.percent(line.rate_percent),
                    self.money(line.amount),
                ]
            })
            .collect();
        doc.table(&COLUMNS, &rows);
        doc.total_row("Subtotal taxes", &self.money(financials.subtotal_taxes));
    }

    fn render_summary(&self, doc: &mut DocBuilder, financials: &ProposalFinancials) {
        doc.section_title("Financial Summary");
        doc.kv_row("Products", &self.money(financials.subtotal_products), Font::Regular);
        doc.kv_row(
            "Engineering & services",
            &self.money(financials.subtotal_engineering),
            Font::Regular,
        );
        doc.kv_row("Expenses", &self.money(financials.subtotal_expenses), Font::Regular);
        doc.kv_row("Taxes & duties", &self.money(financials.subtotal_taxes), Font::Regular);
        doc.rule();
        let vat = vat_over(financials.total_amount, &self.config);
        doc.kv_row("Total", &self.money(vat.net), Font::Bold);
        doc.kv_row(
            &format!("VAT ({})", self.percent(vat.rate_percent)),
            &self.money(vat.vat),
            Font::Regular,
        );
        doc.kv_row("Total incl. VAT", &self.money(vat.gross), Font::Bold);
        doc.gap(4.0);
        doc.kv_row("Gross profit", &self.money(financials.gross_profit), Font::Regular);
        doc.kv_row("Margin", &self.percent(financials.margin_percent), Font::Regular);
        doc.kv_row("Return on cost", &self.percent(financials.roi_percent), Font::Regular);
    }

    fn render_categories(&self, doc: &mut DocBuilder, financials: &ProposalFinancials) {
        if financials.categories.is_empty() {
            return;
        }
        const COLUMNS: [ColumnSpec; 5] = [
            ColumnSpec::new("Category", 0.32, Align::Left),
            ColumnSpec::new("Items", 0.10, Align::Center),
            ColumnSpec::new("Revenue", 0.22, Align::Right),
            ColumnSpec::new("Profit", 0.20, Align::Right),
            ColumnSpec::new("Margin", 0.16, Align::Right),
        ];

        doc.section_title("Category Analysis");
        // Already sorted deterministically by the engine
        let rows: Vec<Vec<String>> = financials
            .categories
            .iter()
            .map(|c| {
                vec![
                    c.category.clone(),
                    c.item_count.to_string(),
                    self.money(c.revenue),
                    self.money(c.profit),
                    self.percent(c.margin_percent),
                ]
            })
            .collect();
        doc.table(&COLUMNS, &rows);
    }

    fn render_notes(&self, doc: &mut DocBuilder, proposal: &Proposal) {
        let notes = proposal.notes.trim();
        if notes.is_empty() {
            return;
        }
        doc.section_title("Notes");
        doc.paragraph(notes, BODY_SIZE);
    }

    fn render_legal(&self, doc: &mut DocBuilder) {
        let legal = self.settings.legal_text.trim();
        if legal.is_empty() {
            return;
        }
        doc.gap(10.0);
        doc.paragraph(legal, SMALL_SIZE);
    }
}

/// Extended line amount as shown on the document.
///
/// Recomputed from the inputs through the shared Decimal rounding, so
/// the table line always agrees with the engine's subtotal. The stored
/// `amount` field is never trusted for display.
fn item_amount(item: &ProposalItem) -> f64 {
    let discount = to_decimal(item.discount_percent) / Decimal::ONE_HUNDRED;
    to_f64(to_decimal(item.unit_price) * Decimal::from(item.quantity) * (Decimal::ONE - discount))
}

/// Engineering line amount: `days × daily_rate`, same rounding rule.
fn engineering_amount(line: &EngineeringLine) -> f64 {
    to_f64(to_decimal(line.days) * to_decimal(line.daily_rate))
}

/// VAT over a net total at the configured single rate.
fn vat_over(net: f64, config: &FormatConfig) -> VatBreakdown {
    let net_dec = to_decimal(net);
    let vat = net_dec * to_decimal(config.vat_rate_percent) / Decimal::ONE_HUNDRED;
    VatBreakdown {
        net: to_f64(net_dec),
        rate_percent: config.vat_rate_percent,
        vat: to_f64(vat),
        gross: to_f64(net_dec + vat),
    }
}

/// Accumulates pages while tracking the cursor; footers are stamped on
/// every page at the end, when the total page count is known.
struct DocBuilder {
    pages: Vec<PageContent>,
    cursor: PageCursor,
}

impl DocBuilder {
    fn new() -> Self {
        Self {
            pages: vec![PageContent::new()],
            cursor: PageCursor::new(),
        }
    }

    fn page(&mut self) -> &mut PageContent {
        if self.pages.is_empty() {
            self.pages.push(PageContent::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Reserve vertical space, opening a new page when needed.
    fn ensure(&mut self, required: f64) {
        if self.cursor.advance(required) {
            self.pages.push(PageContent::new());
        }
    }

    fn gap(&mut self, height: f64) {
        self.cursor.consume(height);
    }

    /// Horizontal rule across the content width.
    fn rule(&mut self) {
        self.ensure(8.0);
        let y = self.cursor.y + 4.0;
        self.page().line(MARGIN, y, PAGE_WIDTH - MARGIN, y, 0.75);
        self.cursor.consume(8.0);
    }

    fn text_line(&mut self, text: &str, size: f64, font: Font, align: Align) {
        let height = size + 4.0;
        self.ensure(height);
        let x = match align {
            Align::Left => MARGIN,
            Align::Center => (PAGE_WIDTH - text_width(text, size)) / 2.0,
            Align::Right => PAGE_WIDTH - MARGIN - text_width(text, size),
        };
        let y = self.cursor.y;
        self.page().text(x, y, size, font, text);
        self.cursor.consume(height);
    }

    fn paragraph(&mut self, text: &str, size: f64) {
        for line in wrap_text(text, size, content_width()) {
            self.text_line(&line, size, Font::Regular, Align::Left);
        }
    }

    fn section_title(&mut self, title: &str) {
        self.gap(10.0);
        // Keep the title attached to at least one following row
        self.ensure(SECTION_SIZE + 4.0 + MIN_ROW_HEIGHT);
        let y = self.cursor.y;
        self.page().text(MARGIN, y, SECTION_SIZE, Font::Bold, title);
        self.cursor.consume(SECTION_SIZE + 6.0);
    }

    /// Draw a bordered table: one bold header row, then variable-height
    /// data rows keyed off the tallest wrapping cell.
    fn table(&mut self, columns: &[ColumnSpec], rows: &[Vec<String>]) {
        let header: Vec<Vec<String>> =
            columns.iter().map(|c| vec![c.title.to_string()]).collect();
        self.ensure(MIN_ROW_HEIGHT);
        self.draw_row(columns, &header, MIN_ROW_HEIGHT, Font::Bold, true);

        for row in rows {
            let wrapped: Vec<Vec<String>> = columns
                .iter()
                .zip(row)
                .map(|(col, cell)| wrap_text(cell, BODY_SIZE, col.width() - CELL_PADDING))
                .collect();
            let max_lines = wrapped.iter().map(Vec::len).max().unwrap_or(1);
            let height = row_height(max_lines);
            self.ensure(height);
            self.draw_row(columns, &wrapped, height, Font::Regular, false);
        }
    }

    fn draw_row(
        &mut self,
        columns: &[ColumnSpec],
        cells: &[Vec<String>],
        height: f64,
        font: Font,
        shaded: bool,
    ) {
        let y = self.cursor.y;
        if shaded {
            self.page()
                .rect_filled(MARGIN, y, content_width(), height, 0.92);
        }
        let mut x = MARGIN;
        for (col, lines) in columns.iter().zip(cells) {
            let w = col.width();
            self.page().rect(x, y, w, height);
            for (i, line) in lines.iter().enumerate() {
                let ty = y + CELL_PADDING / 2.0 + i as f64 * LINE_HEIGHT;
                let tx = match col.align {
                    Align::Left => x + 3.0,
                    Align::Center => x + (w - text_width(line, BODY_SIZE)) / 2.0,
                    Align::Right => x + w - 3.0 - text_width(line, BODY_SIZE),
                };
                self.page().text(tx, ty, BODY_SIZE, font, line);
            }
            x += w;
        }
        self.cursor.consume(height);
    }

    /// Bold subtotal line under a table, right-aligned to the margin.
    fn total_row(&mut self, label: &str, value: &str) {
        self.ensure(MIN_ROW_HEIGHT);
        let y = self.cursor.y + CELL_PADDING / 2.0;
        let value_x = PAGE_WIDTH - MARGIN - 3.0 - text_width(value, BODY_SIZE);
        let label_x = value_x - 12.0 - text_width(label, BODY_SIZE);
        self.page().text(label_x, y, BODY_SIZE, Font::Bold, label);
        self.page().text(value_x, y, BODY_SIZE, Font::Bold, value);
        self.cursor.consume(MIN_ROW_HEIGHT);
    }

    /// Label/value line of the financial summary box.
    fn kv_row(&mut self, label: &str, value: &str, font: Font) {
        self.ensure(MIN_ROW_HEIGHT);
        let y = self.cursor.y + CELL_PADDING / 2.0;
        self.page().text(MARGIN, y, BODY_SIZE, font, label);
        let value_x = PAGE_WIDTH - MARGIN - text_width(value, BODY_SIZE);
        self.page().text(value_x, y, BODY_SIZE, font, value);
        self.cursor.consume(MIN_ROW_HEIGHT);
    }

    /// Stamp the footer on every page: reference, generation date, page
    /// number out of the final total.
    fn finish(mut self, reference: &str, generated: &str) -> Vec<PageContent> {
        let total = self.pages.len();
        for (i, page) in self.pages.iter_mut().enumerate() {
            let y = PAGE_HEIGHT - MARGIN + 8.0;
            page.line(MARGIN, y - 4.0, PAGE_WIDTH - MARGIN, y - 4.0, 0.5);
            page.text(MARGIN, y, FOOTER_SIZE, Font::Regular, reference);
            let centered = generated.to_string();
            let cx = (PAGE_WIDTH - text_width(&centered, FOOTER_SIZE)) / 2.0;
            page.text(cx, y, FOOTER_SIZE, Font::Regular, &centered);
            let page_label = format!("Page {} / {}", i + 1, total);
            let px = PAGE_WIDTH - MARGIN - text_width(&page_label, FOOTER_SIZE);
            page.text(px, y, FOOTER_SIZE, Font::Regular, &page_label);
        }
        self.pages
    }
}
