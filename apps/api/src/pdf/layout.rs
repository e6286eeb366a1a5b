//! Page composition for an estimate: header, issuer and recipient blocks,
//! the items table (header repeated on every page), total and footers.

use chrono::NaiveDate;

use crate::config::IssuerConfig;
use crate::models::estimate::{EstimateRequest, LineItem};
use crate::pdf::canvas::{PageContent, PAGE_HEIGHT_PT, PAGE_WIDTH_PT};
use crate::pdf::font_metrics::FontFace;
use crate::pdf::GenerationError;

const MARGIN: f32 = 54.0;
const CONTENT_RIGHT: f32 = PAGE_WIDTH_PT - MARGIN;
/// Lowest point available to body content; the footer sits below it.
const BODY_BOTTOM: f32 = MARGIN + 24.0;
const FOOTER_BASELINE: f32 = MARGIN - 18.0;

const BODY_SIZE: f32 = 10.0;
const LINE_HEIGHT: f32 = 13.0;
const ROW_PADDING: f32 = 6.0;

// Items table columns. Description is left aligned, numbers right aligned.
const COL_DESCRIPTION_X: f32 = MARGIN + 4.0;
const COL_DESCRIPTION_WIDTH: f32 = 270.0;
const COL_UNITS_RIGHT: f32 = 394.0;
const COL_COST_RIGHT: f32 = 476.0;
const COL_AMOUNT_RIGHT: f32 = CONTENT_RIGHT - 4.0;

const RECIPIENT_WIDTH: f32 = 300.0;
const HEADER_BAND: f32 = LINE_HEIGHT + ROW_PADDING;

/// Lays out `estimate` into pages. Long blocks and long item descriptions
/// continue on the next page; the only failure is exceeding `max_pages`.
pub fn layout_estimate(
    estimate: &EstimateRequest,
    issuer: &IssuerConfig,
    issued_on: NaiveDate,
    max_pages: usize,
) -> Result<Vec<PageContent>, GenerationError> {
    let mut composer = Composer::new(max_pages);

    composer.title_block(estimate, issued_on);
    composer.issuer_block(issuer)?;
    composer.recipient_block(estimate)?;
    composer.start_table()?;
    for item in &estimate.items {
        composer.item_row(item, &issuer.currency_symbol)?;
    }
    composer.total_block(&issuer.currency_symbol, estimate.total())?;

    Ok(composer.finish(&estimate.estimate_number))
}

/// Description lines one row can hold on a page that starts with the table
/// header.
fn fresh_table_capacity() -> usize {
    ((PAGE_HEIGHT_PT - MARGIN - HEADER_BAND - ROW_PADDING - BODY_BOTTOM) / LINE_HEIGHT) as usize
}

/// Cursor-based page builder. `y` is the top of the next free band.
struct Composer {
    pages: Vec<PageContent>,
    y: f32,
    max_pages: usize,
}

impl Composer {
    fn new(max_pages: usize) -> Self {
        Self {
            pages: vec![PageContent::new()],
            y: PAGE_HEIGHT_PT - MARGIN,
            max_pages,
        }
    }

    fn page(&mut self) -> &mut PageContent {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) -> Result<(), GenerationError> {
        if self.pages.len() >= self.max_pages {
            return Err(GenerationError::TooManyPages {
                pages: self.pages.len() + 1,
                limit: self.max_pages,
            });
        }
        self.pages.push(PageContent::new());
        self.y = PAGE_HEIGHT_PT - MARGIN;
        Ok(())
    }

    /// Continues the items table on a new page.
    fn table_page_break(&mut self) -> Result<(), GenerationError> {
        self.new_page()?;
        self.table_header();
        Ok(())
    }

    /// Writes one line of text at the cursor, breaking the page first when
    /// the line would run into the footer.
    fn flow_line(&mut self, face: FontFace, size: f32, text: &str) -> Result<(), GenerationError> {
        if self.y - LINE_HEIGHT < BODY_BOTTOM {
            self.new_page()?;
        }
        let baseline = self.y - LINE_HEIGHT + 3.0;
        self.page().text(face, size, MARGIN, baseline, text);
        self.y -= LINE_HEIGHT;
        Ok(())
    }

    fn title_block(&mut self, estimate: &EstimateRequest, issued_on: NaiveDate) {
        let baseline = self.y - 22.0;
        let page = self.page();
        page.text(FontFace::Bold, 22.0, MARGIN, baseline, "ESTIMATE");
        page.text_right(
            FontFace::Bold,
            11.0,
            CONTENT_RIGHT,
            baseline + 6.0,
            &format!("Estimate # {}", estimate.estimate_number.trim()),
        );
        page.text_right(
            FontFace::Regular,
            BODY_SIZE,
            CONTENT_RIGHT,
            baseline - 8.0,
            &format!("Date: {}", issued_on.format("%B %-d, %Y")),
        );
        self.y = baseline - 22.0;
    }

    fn issuer_block(&mut self, issuer: &IssuerConfig) -> Result<(), GenerationError> {
        self.flow_line(FontFace::Bold, 12.0, &issuer.name)?;
        for line in &issuer.details {
            self.flow_line(FontFace::Regular, BODY_SIZE, line)?;
        }
        self.y -= 18.0;
        Ok(())
    }

    fn recipient_block(&mut self, estimate: &EstimateRequest) -> Result<(), GenerationError> {
        let regular = FontFace::Regular.metrics();
        let mut lines: Vec<String> = estimate
            .recipient_lines()
            .flat_map(|line| regular.wrap(line, BODY_SIZE, RECIPIENT_WIDTH))
            .collect();
        if let Some(email) = &estimate.email {
            lines.extend(regular.wrap(email, BODY_SIZE, RECIPIENT_WIDTH));
        }

        self.flow_line(FontFace::Bold, BODY_SIZE, "BILL TO")?;
        for line in &lines {
            self.flow_line(FontFace::Regular, BODY_SIZE, line)?;
        }
        self.y -= 22.0;
        Ok(())
    }

    /// Opens the items table where at least the header and one row fit.
    fn start_table(&mut self) -> Result<(), GenerationError> {
        if self.y - HEADER_BAND - LINE_HEIGHT - ROW_PADDING < BODY_BOTTOM {
            self.new_page()?;
        }
        self.table_header();
        Ok(())
    }

    fn table_header(&mut self) {
        let top = self.y;
        let baseline = top - LINE_HEIGHT + 2.0;
        let page = self.page();
        page.fill_rect(MARGIN, top - HEADER_BAND, CONTENT_RIGHT - MARGIN, HEADER_BAND, 0.92);
        page.text(FontFace::Bold, BODY_SIZE, COL_DESCRIPTION_X, baseline, "Description");
        page.text_right(FontFace::Bold, BODY_SIZE, COL_UNITS_RIGHT, baseline, "Units");
        page.text_right(FontFace::Bold, BODY_SIZE, COL_COST_RIGHT, baseline, "Cost");
        page.text_right(FontFace::Bold, BODY_SIZE, COL_AMOUNT_RIGHT, baseline, "Amount");
        page.line(MARGIN, top - HEADER_BAND, CONTENT_RIGHT, top - HEADER_BAND, 0.75, 0.2);
        self.y = top - HEADER_BAND;
    }

    /// Description lines that fit above the footer at the cursor.
    fn lines_that_fit(&self) -> usize {
        let room = (self.y - ROW_PADDING - BODY_BOTTOM) / LINE_HEIGHT;
        if room < 1.0 {
            0
        } else {
            room as usize
        }
    }

    /// Draws one item. A row that cannot fit on the current page moves to
    /// the next one when it would fit there whole; a row taller than a page
    /// is split, with the numbers on its first part.
    fn item_row(&mut self, item: &LineItem, symbol: &str) -> Result<(), GenerationError> {
        let regular = FontFace::Regular.metrics();
        let mut description = regular.wrap(&item.description, BODY_SIZE, COL_DESCRIPTION_WIDTH);
        if description.is_empty() {
            description.push(String::new());
        }

        let mut remaining = description.as_slice();
        let mut first = true;
        loop {
            let fits = self.lines_that_fit();
            let capacity = fresh_table_capacity();
            let move_whole = first && remaining.len() <= capacity && fits < capacity;
            if fits == 0 || (fits < remaining.len() && move_whole) {
                self.table_page_break()?;
                continue;
            }

            let (chunk, rest) = remaining.split_at(fits.min(remaining.len()));
            self.row_part(chunk, first.then_some(item), symbol);
            remaining = rest;
            first = false;

            if remaining.is_empty() {
                return Ok(());
            }
            self.table_page_break()?;
        }
    }

    fn row_part(&mut self, lines: &[String], numbers: Option<&LineItem>, symbol: &str) {
        let first_baseline = self.y - LINE_HEIGHT + 3.0;
        let page = self.page();
        for (line_no, line) in lines.iter().enumerate() {
            page.text(
                FontFace::Regular,
                BODY_SIZE,
                COL_DESCRIPTION_X,
                first_baseline - line_no as f32 * LINE_HEIGHT,
                line,
            );
        }
        if let Some(item) = numbers {
            page.text_right(
                FontFace::Regular,
                BODY_SIZE,
                COL_UNITS_RIGHT,
                first_baseline,
                &format_quantity(item.units),
            );
            page.text_right(
                FontFace::Regular,
                BODY_SIZE,
                COL_COST_RIGHT,
                first_baseline,
                &format_money(symbol, item.cost),
            );
            page.text_right(
                FontFace::Regular,
                BODY_SIZE,
                COL_AMOUNT_RIGHT,
                first_baseline,
                &format_money(symbol, item.amount),
            );
        }

        self.y -= lines.len() as f32 * LINE_HEIGHT + ROW_PADDING;
        let y = self.y;
        self.page().line(MARGIN, y, CONTENT_RIGHT, y, 0.5, 0.8);
    }

    fn total_block(&mut self, symbol: &str, total: f64) -> Result<(), GenerationError> {
        if self.y - 2.0 * LINE_HEIGHT - ROW_PADDING < BODY_BOTTOM {
            self.table_page_break()?;
        }
        let rule_y = self.y - 2.0;
        let baseline = self.y - LINE_HEIGHT - 4.0;
        let page = self.page();
        page.line(COL_UNITS_RIGHT, rule_y, CONTENT_RIGHT, rule_y, 1.0, 0.0);
        page.text_right(FontFace::Bold, 11.0, COL_COST_RIGHT, baseline, "Total");
        page.text_right(
            FontFace::Bold,
            11.0,
            COL_AMOUNT_RIGHT,
            baseline,
            &format_money(symbol, total),
        );
        self.y = baseline - ROW_PADDING;
        Ok(())
    }

    /// Stamps "Page n of m" footers once the page count is known.
    fn finish(mut self, estimate_number: &str) -> Vec<PageContent> {
        let count = self.pages.len();
        for (i, page) in self.pages.iter_mut().enumerate() {
            page.line(MARGIN, MARGIN, CONTENT_RIGHT, MARGIN, 0.5, 0.8);
            page.text(
                FontFace::Regular,
                8.0,
                MARGIN,
                FOOTER_BASELINE,
                &format!("Estimate # {}", estimate_number.trim()),
            );
            page.text_right(
                FontFace::Regular,
                8.0,
                CONTENT_RIGHT,
                FOOTER_BASELINE,
                &format!("Page {} of {}", i + 1, count),
            );
        }
        self.pages
    }
}

/// `1234.5` → `$1,234.50`, negatives as `-$5.00`.
pub fn format_money(symbol: &str, value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{symbol}{grouped}.{cents}")
}

/// Whole quantities print without decimals, others with up to two.
pub fn format_quantity(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-0" => "0".to_string(),
        other => other.to_string(),
    }
}
