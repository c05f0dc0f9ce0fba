use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use scraper::Html;
use tracing::debug;

use super::models::extract_model;
use crate::parser::dates::{determine_status, parse_date};
use crate::parser::tables::tables;
use crate::product::EolEntry;

/// Raw `(product name, EOL announced, end of sale)` cell texts.
#[derive(Debug, Clone, PartialEq)]
pub struct EolRow {
    pub product: String,
    pub eol_announced: String,
    pub eos: String,
}

/// Data rows of every table on the EOL listing. The first row of each
/// table is its header; rows with fewer than three data cells are skipped.
pub fn parse_eol_rows(doc: &Html) -> Vec<EolRow> {
    let mut rows = Vec::new();
    for table in tables(doc) {
        for row in table.into_iter().skip(1) {
            let cells: Vec<String> = row
                .into_iter()
                .filter(|c| !c.is_header)
                .map(|c| c.text)
                .collect();
            if let [product, eol_announced, eos, ..] = cells.as_slice() {
                rows.push(EolRow {
                    product: product.clone(),
                    eol_announced: eol_announced.clone(),
                    eos: eos.clone(),
                });
            }
        }
    }
    rows
}

/// Lowercased model → entry. Rows whose name carries no model code are
/// dropped; a later row for the same model replaces an earlier one.
pub fn build_eol_map(rows: &[EolRow], now: NaiveDateTime) -> BTreeMap<String, EolEntry> {
    let mut map = BTreeMap::new();
    let mut dropped = 0usize;

    for row in rows {
        let Some(model) = extract_model(&row.product) else {
            dropped += 1;
            continue;
        };
        let eol_announced_date = parse_date(&row.eol_announced);
        let eos_date = parse_date(&row.eos);
        let status = determine_status(eol_announced_date.as_deref(), eos_date.as_deref(), now);

        map.insert(
            model.to_lowercase(),
            EolEntry {
                model,
                eol_announced_date,
                eos_date,
                status,
                full_name: row.product.clone(),
            },
        );
    }

    if dropped > 0 {
        debug!("{} EOL rows without a recognisable model", dropped);
    }
    map
}
