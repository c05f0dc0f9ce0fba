pub mod eol;
pub mod fields;
pub mod ise;
pub mod models;
pub mod skus;

use chrono::Utc;
use scraper::Html;

use crate::product::ScrapedRecord;

/// Datasheet page → record: table fields plus SKUs found anywhere in
/// the page text.
pub fn extract_datasheet(doc: &Html, model: &str, source_url: &str) -> ScrapedRecord {
    let fields = fields::extract_fields(doc);
    let text = super::tables::document_text(doc);
    let skus = skus::extract_skus(&text, model);

    ScrapedRecord {
        model: model.to_string(),
        fields,
        sku_base: skus.hardware,
        sku_licenses: skus.licenses,
        source_url: source_url.to_string(),
        scraped_at: Utc::now(),
    }
}

// ── Tests ──
