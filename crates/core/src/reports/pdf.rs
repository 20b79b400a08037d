//! PDF rendering of reports.
//!
//! Rendering happens in two steps. [`layout`] turns a report into pages of
//! positioned drawing operations (pure, testable); [`render_pdf`] replays
//! those operations onto a `printpdf` document. Coordinates are millimetres
//! from the bottom-left corner of an A4 portrait page.
#![allow(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use std::io::BufWriter;

use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};
use rust_decimal::Decimal;

use super::error::ReportError;
use super::types::{
    Breakdown, ExpenseReport, FinancialReport, GeneralReport, InventoryReport, Report,
    ReportDocument, SalesReport,
};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_X: f32 = 15.0;
const CONTENT_TOP: f32 = 282.0;
const CONTENT_BOTTOM: f32 = 22.0;
const FOOTER_Y: f32 = 10.0;
const ROW_HEIGHT: f32 = 6.0;
const SECTION_GAP: f32 = 6.0;
const HEADING_HEIGHT: f32 = 7.0;
const VALUE_OFFSET: f32 = 75.0;

const TITLE_SIZE: f32 = 16.0;
const SUBTITLE_SIZE: f32 = 13.0;
const HEADING_SIZE: f32 = 11.0;
const BODY_SIZE: f32 = 9.0;
const FOOTER_SIZE: f32 = 8.0;

/// Average Helvetica glyph width at body size, used to clip table cells.
const CHAR_WIDTH: f32 = 1.7;

/// Business details printed in the title block and footer.
#[derive(Debug, Clone)]
pub struct PdfHeader {
    /// Name of the business the report belongs to.
    pub business_name: String,
}

/// A positioned drawing operation.
#[derive(Debug, Clone)]
pub enum DrawOp {
    /// A line of text with its baseline at `y`.
    Text {
        /// Text to draw.
        text: String,
        /// Font size in points.
        size: f32,
        /// Bold face.
        bold: bool,
        /// Left edge.
        x: f32,
        /// Baseline.
        y: f32,
    },
    /// A horizontal rule across the content width.
    Rule {
        /// Height of the rule.
        y: f32,
    },
}

struct Column {
    title: &'static str,
    width: f32,
}

const fn col(title: &'static str, width: f32) -> Column {
    Column { title, width }
}

enum Section {
    Pairs {
        title: &'static str,
        rows: Vec<(&'static str, String)>,
    },
    Table {
        title: &'static str,
        columns: Vec<Column>,
        rows: Vec<Vec<String>>,
    },
}

/// Renders a report to PDF bytes.
///
/// # Errors
///
/// Returns `ReportError::Render` if the document cannot be written.
pub fn render_pdf(document: &ReportDocument, header: &PdfHeader) -> Result<Vec<u8>, ReportError> {
    let pages = layout(document, header);

    let (doc, first_page, first_layer) = PdfDocument::new(
        document.kind.title(),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(render_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(render_error)?;

    for (index, ops) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            doc.get_page(page).get_layer(layer)
        };
        draw(&layer, ops, &regular, &bold);
    }

    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer).map_err(render_error)?;
    writer.into_inner().map_err(render_error)
}

fn render_error(err: impl std::fmt::Display) -> ReportError {
    ReportError::Render(err.to_string())
}

fn draw(layer: &PdfLayerReference, ops: &[DrawOp], regular: &IndirectFontRef, bold: &IndirectFontRef) {
    layer.set_outline_thickness(0.4);
    for op in ops {
        match op {
            DrawOp::Text {
                text,
                size,
                bold: is_bold,
                x,
                y,
            } => {
                let font = if *is_bold { bold } else { regular };
                layer.use_text(printable(text), *size, Mm(*x), Mm(*y), font);
            }
            DrawOp::Rule { y } => layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(MARGIN_X), Mm(*y)), false),
                    (Point::new(Mm(PAGE_WIDTH - MARGIN_X), Mm(*y)), false),
                ],
                is_closed: false,
            }),
        }
    }
}

/// Builtin PDF fonts only cover a Latin charset.
fn printable(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

/// Lays a report out into pages of drawing operations.
///
/// Tables that run past the bottom margin continue on a new page with
/// their header repeated. Every page gets a footer with its page number.
#[must_use]
pub fn layout(document: &ReportDocument, header: &PdfHeader) -> Vec<Vec<DrawOp>> {
    let mut page = Composer::new();

    page.text(&header.business_name, TITLE_SIZE, true, MARGIN_X);
    page.advance(8.0);
    page.text(document.kind.title(), SUBTITLE_SIZE, true, MARGIN_X);
    page.advance(6.0);
    page.text(
        &format!("Period: {} to {}", document.start_date, document.end_date),
        10.0,
        false,
        MARGIN_X,
    );
    page.advance(5.0);
    page.text(
        &format!(
            "Generated: {} UTC",
            document.generated_at.format("%Y-%m-%d %H:%M")
        ),
        BODY_SIZE,
        false,
        MARGIN_X,
    );
    page.advance(4.0);
    page.rule();
    page.advance(8.0);

    for section in sections(&document.data) {
        match section {
            Section::Pairs { title, rows } => page.pairs(title, &rows),
            Section::Table {
                title,
                columns,
                rows,
            } => page.table(title, &columns, &rows),
        }
    }

    let mut pages = page.finish();
    let total = pages.len();
    let footer_left = format!("{} - {}", header.business_name, document.kind.title());
    for (index, ops) in pages.iter_mut().enumerate() {
        ops.push(DrawOp::Rule { y: FOOTER_Y + 4.0 });
        ops.push(DrawOp::Text {
            text: footer_left.clone(),
            size: FOOTER_SIZE,
            bold: false,
            x: MARGIN_X,
            y: FOOTER_Y,
        });
        ops.push(DrawOp::Text {
            text: format!("Page {} of {total}", index + 1),
            size: FOOTER_SIZE,
            bold: false,
            x: PAGE_WIDTH - MARGIN_X - 22.0,
            y: FOOTER_Y,
        });
    }
    pages
}

struct Composer {
    finished: Vec<Vec<DrawOp>>,
    current: Vec<DrawOp>,
    y: f32,
}

impl Composer {
    fn new() -> Self {
        Self {
            finished: Vec::new(),
            current: Vec::new(),
            y: CONTENT_TOP,
        }
    }

    fn text(&mut self, text: &str, size: f32, bold: bool, x: f32) {
        self.current.push(DrawOp::Text {
            text: text.to_string(),
            size,
            bold,
            x,
            y: self.y,
        });
    }

    fn rule(&mut self) {
        self.current.push(DrawOp::Rule { y: self.y });
    }

    fn advance(&mut self, height: f32) {
        self.y -= height;
    }

    /// Starts a new page if `height` does not fit; returns true if it did.
    fn ensure(&mut self, height: f32) -> bool {
        if self.y - height >= CONTENT_BOTTOM {
            return false;
        }
        self.finished.push(std::mem::take(&mut self.current));
        self.y = CONTENT_TOP;
        true
    }

    fn pairs(&mut self, title: &str, rows: &[(&str, String)]) {
        self.ensure(HEADING_HEIGHT + ROW_HEIGHT * 2.0);
        self.text(title, HEADING_SIZE, true, MARGIN_X);
        self.advance(HEADING_HEIGHT);

        for (label, value) in rows {
            self.ensure(ROW_HEIGHT);
            self.text(label, BODY_SIZE, false, MARGIN_X);
            self.text(value, BODY_SIZE, true, MARGIN_X + VALUE_OFFSET);
            self.advance(ROW_HEIGHT);
        }
        self.advance(SECTION_GAP);
    }

    fn table(&mut self, title: &str, columns: &[Column], rows: &[Vec<String>]) {
        self.ensure(HEADING_HEIGHT + ROW_HEIGHT * 3.0);
        self.text(title, HEADING_SIZE, true, MARGIN_X);
        self.advance(HEADING_HEIGHT);
        self.table_header(columns);

        if rows.is_empty() {
            self.text("No data for this period.", BODY_SIZE, false, MARGIN_X);
            self.advance(ROW_HEIGHT);
        }

        for row in rows {
            if self.ensure(ROW_HEIGHT) {
                self.text(&format!("{title} (continued)"), HEADING_SIZE, true, MARGIN_X);
                self.advance(HEADING_HEIGHT);
                self.table_header(columns);
            }
            let mut x = MARGIN_X;
            for (cell, column) in row.iter().zip(columns) {
                self.text(&fit(cell, column.width), BODY_SIZE, false, x);
                x += column.width;
            }
            self.advance(ROW_HEIGHT);
        }
        self.advance(SECTION_GAP);
    }

    fn table_header(&mut self, columns: &[Column]) {
        let mut x = MARGIN_X;
        for column in columns {
            self.text(column.title, BODY_SIZE, true, x);
            x += column.width;
        }
        self.advance(2.0);
        self.rule();
        self.advance(ROW_HEIGHT - 1.0);
    }

    fn finish(mut self) -> Vec<Vec<DrawOp>> {
        self.finished.push(self.current);
        self.finished
    }
}

/// Clips text to the width of a table column.
fn fit(text: &str, width: f32) -> String {
    let max_chars = ((width - 2.0) / CHAR_WIDTH).max(4.0) as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars - 3).collect();
    format!("{kept}...")
}

/// Formats money with thousands separators and two decimals.
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let digits = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((&digits, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac_part}")
}

fn format_quantity(quantity: Decimal) -> String {
    quantity.normalize().to_string()
}

fn sections(report: &Report) -> Vec<Section> {
    match report {
        Report::Sales(r) => sales_sections(r),
        Report::Expenses(r) => expense_sections(r),
        Report::Inventory(r) => inventory_sections(r),
        Report::Financial(r) => financial_sections(r),
        Report::General(r) => general_sections(r),
    }
}

fn breakdown_table(title: &'static str, first: &'static str, rows: &[Breakdown]) -> Section {
    Section::Table {
        title,
        columns: vec![col(first, 80.0), col("Count", 40.0), col("Amount", 60.0)],
        rows: rows
            .iter()
            .map(|b| vec![b.label.clone(), b.count.to_string(), format_money(b.amount)])
            .collect(),
    }
}

fn sales_sections(report: &SalesReport) -> Vec<Section> {
    let s = &report.summary;
    vec![
        Section::Pairs {
            title: "Summary",
            rows: vec![
                ("Number of sales", s.count.to_string()),
                ("Quantity sold", format_quantity(s.total_quantity)),
                ("Revenue", format_money(s.revenue)),
                ("Cost of goods sold", format_money(s.cost)),
                ("Gross profit", format_money(s.profit)),
                ("Amount collected", format_money(s.amount_paid)),
                ("Outstanding", format_money(s.outstanding)),
                ("Average sale", format_money(s.average_sale)),
            ],
        },
        breakdown_table("By payment status", "Status", &report.by_payment_status),
        breakdown_table("By payment method", "Method", &report.by_payment_method),
        Section::Table {
            title: "Top products",
            columns: vec![
                col("Product", 70.0),
                col("Sales", 25.0),
                col("Quantity", 25.0),
                col("Revenue", 30.0),
                col("Profit", 30.0),
            ],
            rows: report
                .top_products
                .iter()
                .map(|p| {
                    vec![
                        p.product_name.clone(),
                        p.sale_count.to_string(),
                        format_quantity(p.quantity),
                        format_money(p.revenue),
                        format_money(p.profit),
                    ]
                })
                .collect(),
        },
        Section::Table {
            title: "Daily totals",
            columns: vec![
                col("Date", 60.0),
                col("Sales", 40.0),
                col("Revenue", 40.0),
                col("Profit", 40.0),
            ],
            rows: report
                .daily
                .iter()
                .map(|d| {
                    vec![
                        d.date.to_string(),
                        d.count.to_string(),
                        format_money(d.revenue),
                        format_money(d.profit),
                    ]
                })
                .collect(),
        },
    ]
}

fn expense_sections(report: &ExpenseReport) -> Vec<Section> {
    let s = &report.summary;
    vec![
        Section::Pairs {
            title: "Summary",
            rows: vec![
                ("Number of expenses", s.count.to_string()),
                ("Total", format_money(s.total)),
                ("Paid", format_money(s.paid)),
                ("Pending", format_money(s.pending)),
                ("Average expense", format_money(s.average)),
            ],
        },
        Section::Table {
            title: "By category",
            columns: vec![
                col("Category", 80.0),
                col("Count", 30.0),
                col("Total", 40.0),
                col("Share", 30.0),
            ],
            rows: report
                .by_category
                .iter()
                .map(|c| {
                    vec![
                        c.category.clone(),
                        c.count.to_string(),
                        format_money(c.total),
                        format!("{}%", c.share_percent.round_dp(2)),
                    ]
                })
                .collect(),
        },
        breakdown_table("By status", "Status", &report.by_status),
        Section::Table {
            title: "Largest expenses",
            columns: vec![
                col("Date", 28.0),
                col("Title", 62.0),
                col("Category", 45.0),
                col("Amount", 28.0),
                col("Status", 17.0),
            ],
            rows: report
                .top_expenses
                .iter()
                .map(|e| {
                    vec![
                        e.expense_date.to_string(),
                        e.title.clone(),
                        e.category_name.clone().unwrap_or_default(),
                        format_money(e.amount),
                        e.status.label().to_string(),
                    ]
                })
                .collect(),
        },
    ]
}

fn inventory_sections(report: &InventoryReport) -> Vec<Section> {
    let s = &report.summary;
    vec![
        Section::Pairs {
            title: "Summary",
            rows: vec![
                ("Products", s.product_count.to_string()),
                ("Total quantity", format_quantity(s.total_quantity)),
                ("Stock value (cost)", format_money(s.stock_value)),
                ("Stock value (retail)", format_money(s.retail_value)),
                ("Low stock products", s.low_stock_count.to_string()),
                ("Out of stock products", s.out_of_stock_count.to_string()),
            ],
        },
        Section::Table {
            title: "By category",
            columns: vec![
                col("Category", 80.0),
                col("Products", 30.0),
                col("Quantity", 35.0),
                col("Stock value", 35.0),
            ],
            rows: report
                .by_category
                .iter()
                .map(|c| {
                    vec![
                        c.category.clone(),
                        c.product_count.to_string(),
                        format_quantity(c.quantity),
                        format_money(c.stock_value),
                    ]
                })
                .collect(),
        },
        Section::Table {
            title: "Low stock",
            columns: vec![
                col("Product", 80.0),
                col("Quantity", 35.0),
                col("Threshold", 35.0),
                col("Unit", 30.0),
            ],
            rows: report
                .low_stock
                .iter()
                .map(|l| {
                    vec![
                        l.name.clone(),
                        format_quantity(l.quantity),
                        format_quantity(l.threshold),
                        l.unit.clone(),
                    ]
                })
                .collect(),
        },
        Section::Table {
            title: "Stock movements",
            columns: vec![
                col("Type", 80.0),
                col("Movements", 50.0),
                col("Net quantity", 50.0),
            ],
            rows: report
                .movements
                .iter()
                .map(|m| {
                    vec![
                        m.label.clone(),
                        m.count.to_string(),
                        format_quantity(m.quantity),
                    ]
                })
                .collect(),
        },
    ]
}

fn financial_sections(report: &FinancialReport) -> Vec<Section> {
    let s = &report.summary;
    vec![
        Section::Pairs {
            title: "Summary",
            rows: vec![
                ("Money in", format_money(s.inflow)),
                ("Money out", format_money(s.outflow)),
                ("Net cash flow", format_money(s.net_cash_flow)),
                ("Deposited", format_money(s.deposits_total)),
                ("Cash on hand", format_money(s.cash_on_hand)),
            ],
        },
        breakdown_table("By transaction type", "Type", &report.by_transaction_type),
        breakdown_table("Deposits by type", "Deposit type", &report.by_deposit_type),
    ]
}

fn general_sections(report: &GeneralReport) -> Vec<Section> {
    vec![
        Section::Pairs {
            title: "Sales",
            rows: vec![
                ("Number of sales", report.sales.count.to_string()),
                ("Revenue", format_money(report.sales.revenue)),
                ("Gross profit", format_money(report.sales.profit)),
                ("Outstanding", format_money(report.sales.outstanding)),
            ],
        },
        Section::Pairs {
            title: "Expenses",
            rows: vec![
                ("Number of expenses", report.expenses.count.to_string()),
                ("Total", format_money(report.expenses.total)),
                ("Pending", format_money(report.expenses.pending)),
            ],
        },
        Section::Pairs {
            title: "Inventory",
            rows: vec![
                ("Products", report.inventory.product_count.to_string()),
                ("Stock value (cost)", format_money(report.inventory.stock_value)),
                ("Low stock products", report.inventory.low_stock_count.to_string()),
            ],
        },
        Section::Pairs {
            title: "Cash flow",
            rows: vec![
                ("Money in", format_money(report.financial.inflow)),
                ("Money out", format_money(report.financial.outflow)),
                ("Deposited", format_money(report.financial.deposits_total)),
                ("Cash on hand", format_money(report.financial.cash_on_hand)),
            ],
        },
        Section::Pairs {
            title: "Result",
            rows: vec![
                ("Gross profit", format_money(report.sales.profit)),
                ("Expenses", format_money(report.expenses.total)),
                ("Net profit", format_money(report.net_profit)),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::types::{DailyTotal, SalesSummary};
    use chrono::{Days, NaiveDate, TimeZone, Utc};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn texts(page: &[DrawOp]) -> Vec<&str> {
        page.iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                DrawOp::Rule { .. } => None,
            })
            .collect()
    }

    fn sales_document(days: u64) -> ReportDocument {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let daily = (0..days)
            .map(|offset| DailyTotal {
                date: start + Days::new(offset),
                count: 3,
                revenue: dec!(120.50),
                profit: dec!(30),
            })
            .collect();
        let report = SalesReport {
            summary: SalesSummary::default(),
            by_payment_status: vec![],
            by_payment_method: vec![],
            top_products: vec![],
            daily,
        };
        ReportDocument::new(
            Report::Sales(report),
            start,
            start + Days::new(days),
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        )
    }

    fn header() -> PdfHeader {
        PdfHeader {
            business_name: "Lake Victoria Fresh".to_string(),
        }
    }

    #[rstest]
    #[case(dec!(0), "0.00")]
    #[case(dec!(5.5), "5.50")]
    #[case(dec!(1234.567), "1,234.57")]
    #[case(dec!(1000000), "1,000,000.00")]
    #[case(dec!(-98765.4), "-98,765.40")]
    #[case(dec!(100), "100.00")]
    fn test_format_money(#[case] amount: Decimal, #[case] expected: &str) {
        assert_eq!(format_money(amount), expected);
    }

    #[test]
    fn test_fit_clips_long_cells() {
        assert_eq!(fit("Tilapia", 70.0), "Tilapia");
        let clipped = fit("A very long product name that cannot fit", 20.0);
        assert!(clipped.ends_with("..."));
        assert!(clipped.chars().count() <= 11);
    }

    #[test]
    fn test_title_block_and_single_page_footer() {
        let pages = layout(&sales_document(3), &header());

        assert_eq!(pages.len(), 1);
        let page = texts(&pages[0]);
        assert_eq!(page[0], "Lake Victoria Fresh");
        assert_eq!(page[1], "Sales Report");
        assert!(page.contains(&"Period: 2025-01-01 to 2025-01-04"));
        assert!(page.contains(&"Page 1 of 1"));
        assert!(page.contains(&"No data for this period."));
    }

    #[test]
    fn test_long_table_breaks_pages_and_repeats_header() {
        let pages = layout(&sales_document(120), &header());

        assert!(pages.len() >= 3);
        for (index, page) in pages.iter().enumerate() {
            let page = texts(page);
            let footer = format!("Page {} of {}", index + 1, pages.len());
            assert!(page.contains(&footer.as_str()));
        }

        let second = texts(&pages[1]);
        assert!(second.contains(&"Daily totals (continued)"));
        assert!(second.contains(&"Date"));
        assert!(second.contains(&"Revenue"));

        let rows: usize = pages
            .iter()
            .map(|p| texts(p).iter().filter(|t| **t == "120.50").count())
            .sum();
        assert_eq!(rows, 120);
    }

    #[test]
    fn test_content_stays_inside_margins() {
        let pages = layout(&sales_document(200), &header());

        for page in &pages {
            for op in page {
                let y = match op {
                    DrawOp::Text { y, .. } | DrawOp::Rule { y } => *y,
                };
                assert!(y >= FOOTER_Y && y <= CONTENT_TOP);
            }
        }
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = render_pdf(&sales_document(40), &header()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(bytes.len() > 1000);
    }

    #[test]
    fn test_printable_replaces_non_ascii() {
        assert_eq!(printable("Café"), "Caf?");
    }
}
