use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use tracing::debug;

use crate::config::{datasheet_url, EOL_URL, ISE_COMPARISON_URL, MR_INDEX_URL};
use crate::db::ProductStore;
use crate::fetch::{FetchError, Fetcher, Transport};
use crate::parser::extract::eol::{build_eol_map, parse_eol_rows};
use crate::parser::extract::ise::{parse_comparison, ApplianceSpec};
use crate::parser::extract::models::extract_mr_models;
use crate::parser::extract::extract_datasheet;
use crate::parser::parse_document;
use crate::parser::tables::anchor_texts;
use crate::product::{Category, EolEntry, ScrapedRecord};
use crate::reconcile::{apply_eol, lookup_eol, upsert};
use crate::report::Reporter;

type Clock = Box<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// The scrape flows. Every request goes through the one rate-limited
/// fetcher, and every loop awaits each item before starting the next.
pub struct Pipeline<T> {
    fetcher: Fetcher<T>,
    reporter: Arc<dyn Reporter>,
    clock: Clock,
}

impl<T: Transport> Pipeline<T> {
    pub fn new(fetcher: Fetcher<T>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            fetcher,
            reporter,
            clock: Box::new(|| Local::now().naive_local()),
        }
    }

    /// Replace the "now" used for status derivation.
    #[cfg(test)]
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn fetcher(&self) -> &Fetcher<T> {
        &self.fetcher
    }

    // ── EOL ──

    /// Fetch the EOL listing and build the lowercased-model → entry map.
    /// A failed fetch is returned as-is; no partial map is produced.
    pub async fn scrape_eol_table(&self) -> Result<BTreeMap<String, EolEntry>, FetchError> {
        self.reporter.info("Scraping EOL dates...");
        let page = match self.fetcher.fetch(EOL_URL).await {
            Ok(page) => page,
            Err(e) => {
                self.reporter.error(&format!("Scraping EOL data failed: {}", e));
                return Err(e);
            }
        };

        let rows = parse_eol_rows(&parse_document(&page.body));
        let eol = build_eol_map(&rows, (self.clock)());
        debug!("{} EOL rows, {} with a model", rows.len(), eol.len());
        self.reporter.success(&format!("{} EOL entries found", eol.len()));
        Ok(eol)
    }

    /// Refresh `eol_announced`, `eos_date` and `status` on every MR/MX/MS/MV
    /// product that has an EOL entry. Returns how many products changed.
    pub async fn update_eol_data<S: ProductStore>(&self, store: &S) -> Result<usize> {
        let eol = self.scrape_eol_table().await?;
        self.apply_eol_map(store, &eol)
    }

    /// Store half of [`Self::update_eol_data`], for callers that already
    /// hold a scraped map.
    pub fn apply_eol_map<S: ProductStore>(
        &self,
        store: &S,
        eol: &BTreeMap<String, EolEntry>,
    ) -> Result<usize> {
        if eol.is_empty() {
            self.reporter.warn("No EOL data to apply");
            return Ok(0);
        }

        let mut updated = 0;
        for category in Category::EOL_TRACKED {
            for mut product in store.get_products_by_category(category)? {
                let Some(entry) = lookup_eol(&product, eol) else {
                    continue;
                };
                if !apply_eol(&mut product, entry) {
                    continue;
                }
                store.save_product(category, &product)?;
                updated += 1;
                self.reporter
                    .success(&format!("{}: status set to '{}'", product.name, entry.status));
            }
        }

        self.reporter.success(&format!("{} products updated", updated));
        Ok(updated)
    }

    // ── Datasheets ──

    /// Scrape one datasheet. `Ok(None)` when the page does not exist.
    pub async fn scrape_one(
        &self,
        category: Category,
        model: &str,
    ) -> Result<Option<ScrapedRecord>, FetchError> {
        let model = model.trim().to_uppercase();
        let url = datasheet_url(&category.docs_segment(), &model);
        self.reporter.info(&format!("Scraping datasheet for {}...", model));

        let page = match self.fetcher.fetch(&url).await {
            Ok(page) => page,
            Err(e) if e.is_not_found() => {
                self.reporter.warn(&format!("Datasheet not found: {}", url));
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let record = extract_datasheet(&parse_document(&page.body), &model, &url);
        debug!(
            "{}: {} fields, {} license SKUs",
            model,
            record.fields.len(),
            record.sku_licenses.len()
        );
        self.reporter
            .success(&format!("Datasheet for {} scraped", model));
        Ok(Some(record))
    }

    /// MR models linked from the MR product-information index.
    pub async fn scrape_mr_models(&self) -> Result<Vec<String>, FetchError> {
        self.reporter.info("Scraping MR product list...");
        let page = self.fetcher.fetch(MR_INDEX_URL).await?;
        let models = extract_mr_models(&anchor_texts(&parse_document(&page.body)));
        self.reporter.success(&format!("{} MR models found", models.len()));
        Ok(models)
    }

    /// Scrape every MR datasheet and upsert each result as it arrives.
    ///
    /// Only a failure to load the model index aborts. Missing datasheets,
    /// failed fetches and failed saves are reported and skipped.
    pub async fn scrape_all_mr<S: ProductStore>(&self, store: &S) -> Result<usize, FetchError> {
        let models = match self.scrape_mr_models().await {
            Ok(models) => models,
            Err(e) => {
                self.reporter.error(&format!("Scraping MR models failed: {}", e));
                return Err(e);
            }
        };
        if models.is_empty() {
            self.reporter.warn("No MR models to scrape");
            return Ok(0);
        }

        let total = models.len();
        let mut updated = 0;
        for (i, model) in models.iter().enumerate() {
            self.reporter.progress(i + 1, total, model);

            match self.scrape_one(Category::Mr, model).await {
                Ok(Some(record)) => match upsert(store, Category::Mr, &record) {
                    Ok(_) => updated += 1,
                    Err(e) => self
                        .reporter
                        .error(&format!("Saving {} failed: {:#}", model, e)),
                },
                Ok(None) => {}
                Err(e) => self
                    .reporter
                    .error(&format!("Scraping {} failed: {}", model, e)),
            }
        }
        self.reporter.finish();

        self.reporter
            .success(&format!("{} of {} MR products updated", updated, total));
        Ok(updated)
    }

    // ── ISE ──

    pub async fn scrape_ise_models(&self) -> Result<Vec<ApplianceSpec>, FetchError> {
        self.reporter.info("Scraping ISE models...");
        let page = self.fetcher.fetch(ISE_COMPARISON_URL).await?;
        let models = parse_comparison(&parse_document(&page.body));
        self.reporter.success(&format!("{} ISE models found", models.len()));
        Ok(models)
    }
}

// ── Tests ──
