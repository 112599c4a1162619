//! Ready-made transforms for common page shapes
//!
//! Both presets parse their selector up front, so a bad selector fails
//! before any page is fetched.
//!
//! ```no_run
//! use upton::{extract, Scraper};
//! use std::path::Path;
//!
//! # async fn example() -> upton::Result<()> {
//! let mut scraper = Scraper::from_instances(["http://example.com/stats"])?;
//! scraper
//!     .scrape_to_csv(Path::new("stats.csv"), extract::table("table#stats")?)
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::crawler::parse_selector;
use crate::page::Page;
use crate::UptonError;
use scraper::{ElementRef, Selector};

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Transform returning the text of every element matching `selector`
pub fn list(selector: &str) -> Result<impl Fn(&Page) -> Vec<String>, UptonError> {
    let selector = parse_selector(selector)?;
    Ok(move |page: &Page| {
        page.document()
            .select(&selector)
            .map(text_of)
            .collect::<Vec<_>>()
    })
}

/// Transform returning the tables matching `selector` as rows
///
/// The first row holds the `th` texts (omitted when there are none). Every
/// `tr` with at least one `td` follows as a row of cell texts. Matching
/// tables are appended in document order.
pub fn table(selector: &str) -> Result<impl Fn(&Page) -> Vec<Vec<String>>, UptonError> {
    let selector = parse_selector(selector)?;
    let header = parse_selector("th")?;
    let row = parse_selector("tr")?;
    let cell = parse_selector("td")?;

    Ok(move |page: &Page| {
        let document = page.document();
        let mut rows = Vec::new();
        for table in document.select(&selector) {
            rows.extend(table_rows(table, &header, &row, &cell));
        }
        rows
    })
}

fn table_rows(
    table: ElementRef<'_>,
    header: &Selector,
    row: &Selector,
    cell: &Selector,
) -> Vec<Vec<String>> {
    let mut rows = Vec::new();

    let headers: Vec<String> = table.select(header).map(text_of).collect();
    if !headers.is_empty() {
        rows.push(headers);
    }

    for tr in table.select(row) {
        let cells: Vec<String> = tr.select(cell).map(text_of).collect();
        if !cells.is_empty() {
            rows.push(cells);
        }
    }
    rows
}
