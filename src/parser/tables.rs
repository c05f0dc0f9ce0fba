use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th, td").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub is_header: bool,
}

pub type Row = Vec<Cell>;

/// Text of an element with whitespace runs collapsed to one space.
pub fn element_text(el: ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Every `<table>` in the document, rows in order, cells as text.
pub fn tables(doc: &Html) -> Vec<Vec<Row>> {
    tables_matching(doc, &TABLE)
}

pub fn tables_matching(doc: &Html, selector: &Selector) -> Vec<Vec<Row>> {
    doc.select(selector)
        .map(|table| {
            table
                .select(&ROW)
                .map(|row| {
                    row.select(&CELL)
                        .map(|cell| Cell {
                            text: element_text(cell),
                            is_header: cell.value().name() == "th",
                        })
                        .collect()
                })
                .collect()
        })
        .collect()
}

/// Visible text of anchors that carry an `href`.
pub fn anchor_texts(doc: &Html) -> Vec<String> {
    doc.select(&ANCHOR).map(element_text).collect()
}

/// All document text, text nodes separated by spaces so adjacent tokens
/// never fuse.
pub fn document_text(doc: &Html) -> String {
    element_text(doc.root_element())
}
