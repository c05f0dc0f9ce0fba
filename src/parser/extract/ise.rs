use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::parser::tables::tables_matching;

static COMPARISON_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.comparison-table").unwrap());

/// One appliance per data row, keyed by the table's header cells.
pub type ApplianceSpec = BTreeMap<String, String>;

/// Rows of every comparison table. Headers are the `th` cells of the first
/// row; tables without headers are skipped, as are rows with fewer data
/// cells than headers.
pub fn parse_comparison(doc: &Html) -> Vec<ApplianceSpec> {
    let mut models = Vec::new();

    for table in tables_matching(doc, &COMPARISON_TABLE) {
        let mut rows = table.into_iter();
        let headers: Vec<String> = match rows.next() {
            Some(first) => first
                .into_iter()
                .filter(|c| c.is_header)
                .map(|c| c.text)
                .collect(),
            None => continue,
        };
        if headers.is_empty() {
            continue;
        }

        for row in rows {
            let cells: Vec<String> = row
                .into_iter()
                .filter(|c| !c.is_header)
                .map(|c| c.text)
                .collect();
            if cells.len() < headers.len() {
                continue;
            }
            models.push(headers.iter().cloned().zip(cells).collect());
        }
    }

    models
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    #[test]
    fn comparison_fixture() {
        let html = std::fs::read_to_string("tests/fixtures/ise.html").unwrap();
        let models = parse_comparison(&parse_document(&html));
        assert_eq!(models.len(), 2);
        assert_eq!(models[0]["Model"], "SNS-3715");
        assert_eq!(models[0]["Max Endpoints"], "25,000");
        assert_eq!(models[1]["Model"], "SNS-3755");
        assert_eq!(models[1]["Memory"], "256 GB");
    }

    #[test]
    fn plain_tables_are_ignored() {
        let doc = parse_document(
            "<table><tr><th>Model</th></tr><tr><td>SNS-3715</td></tr></table>",
        );
        assert!(parse_comparison(&doc).is_empty());
    }
}
