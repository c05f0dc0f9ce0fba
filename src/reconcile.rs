use std::collections::BTreeMap;

use anyhow::Result;
use serde_json::Value;

use crate::db::ProductStore;
use crate::product::{Category, EolEntry, ProductRecord, ScrapedRecord};

/// Merge a scraped record into the store, creating the product if its id
/// is new to `category`. Only the scraped keys are written.
pub fn upsert(store: &impl ProductStore, category: Category, scraped: &ScrapedRecord) -> Result<ProductRecord> {
    let id = scraped.product_id();
    let mut product = match store.get_product(category, &id)? {
        Some(existing) => existing,
        None => ProductRecord::new(&id, &format!("Meraki {}", scraped.model), category),
    };

    merge_scraped(&mut product, scraped);
    store.save_product(category, &product)?;
    Ok(product)
}

/// Shallow merge, incoming wins per key. Applying the same record twice
/// gives the same result as applying it once.
pub fn merge_scraped(product: &mut ProductRecord, scraped: &ScrapedRecord) {
    let attrs = &mut product.attrs;
    attrs.insert("model".into(), Value::from(scraped.model.clone()));
    attrs.insert("datasheet_url".into(), Value::from(scraped.source_url.clone()));
    attrs.insert("scraped_at".into(), Value::from(scraped.scraped_at.to_rfc3339()));

    for (field, value) in &scraped.fields {
        attrs.insert(field.clone(), Value::from(value.clone()));
    }
    if let Some(sku) = &scraped.sku_base {
        attrs.insert("sku_base".into(), Value::from(sku.clone()));
    }
    if !scraped.sku_licenses.is_empty() {
        let licenses = scraped
            .sku_licenses
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.clone())))
            .collect();
        attrs.insert("sku_licenses".into(), Value::Object(licenses));
    }
}

/// Find a product's EOL entry: by id first, then by the last word of its
/// display name ("Meraki MR46" → "mr46").
pub fn lookup_eol<'a>(product: &ProductRecord, eol: &'a BTreeMap<String, EolEntry>) -> Option<&'a EolEntry> {
    let id = product.id.to_lowercase();
    eol.get(&id).or_else(|| {
        let token = product.name.split_whitespace().last()?.to_lowercase();
        eol.get(&token)
    })
}

/// Write the EOL-derived fields. Returns whether anything changed.
pub fn apply_eol(product: &mut ProductRecord, entry: &EolEntry) -> bool {
    let eol_announced = opt_value(&entry.eol_announced_date);
    let eos_date = opt_value(&entry.eos_date);

    let changed = product.status != Some(entry.status)
        || product.attrs.get("eol_announced") != Some(&eol_announced)
        || product.attrs.get("eos_date") != Some(&eos_date);

    product.status = Some(entry.status);
    product.attrs.insert("eol_announced".into(), eol_announced);
    product.attrs.insert("eos_date".into(), eos_date);
    changed
}

fn opt_value(v: &Option<String>) -> Value {
    v.as_ref().map_or(Value::Null, |s| Value::from(s.clone()))
}
