use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use serde_json::{Map, Value};

use crate::product::{Category, ProductRecord, Status};

/// Read/write boundary the scrape flows use. The store owns persisted
/// records; writers hand it whole records and it keeps unrelated fields.
pub trait ProductStore {
    fn get_products_by_category(&self, category: Category) -> Result<Vec<ProductRecord>>;
    /// First match across all categories.
    fn get_product_by_id(&self, id: &str) -> Result<Option<ProductRecord>>;
    fn get_product(&self, category: Category, id: &str) -> Result<Option<ProductRecord>>;
    /// Upsert by `id` within `category`. Attributes already stored but
    /// absent from `record` are kept, as are the stored name and status
    /// when `record` leaves them empty.
    fn save_product(&self, category: Category, record: &ProductRecord) -> Result<()>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("opening database {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Self::init(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS products (
                category   TEXT NOT NULL,
                id         TEXT NOT NULL,
                name       TEXT NOT NULL DEFAULT '',
                status     TEXT CHECK(status IN ('Active','EOL Announced','End of Sale')),
                attrs      TEXT NOT NULL DEFAULT '{}',
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (category, id)
            );
            CREATE INDEX IF NOT EXISTS idx_products_id ON products(id);
            CREATE INDEX IF NOT EXISTS idx_products_status ON products(status);

            CREATE TABLE IF NOT EXISTS settings (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(Self { conn })
    }

    // ── Settings ──

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |r| r.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    // ── Stats ──

    pub fn get_stats(&self) -> Result<Stats> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |r| r.get(0))?;

        let mut by_category = BTreeMap::new();
        let mut stmt = self
            .conn
            .prepare("SELECT category, COUNT(*) FROM products GROUP BY category")?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)? as usize)))?;
        for row in rows {
            let (category, n) = row?;
            by_category.insert(category, n);
        }

        let mut by_status = BTreeMap::new();
        let mut stmt = self.conn.prepare(
            "SELECT COALESCE(status, 'Unknown'), COUNT(*) FROM products GROUP BY status",
        )?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)? as usize)))?;
        for row in rows {
            let (status, n) = row?;
            by_status.insert(status, n);
        }

        Ok(Stats {
            total: total as usize,
            by_category,
            by_status,
        })
    }

    fn query_products(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<ProductRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let raw = stmt
            .query_map(params, |row| {
                Ok(RawProduct {
                    category: row.get(0)?,
                    id: row.get(1)?,
                    name: row.get(2)?,
                    status: row.get(3)?,
                    attrs: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(RawProduct::into_record).collect()
    }
}

pub struct Stats {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
}

struct RawProduct {
    category: String,
    id: String,
    name: String,
    status: Option<String>,
    attrs: String,
}

impl RawProduct {
    fn into_record(self) -> Result<ProductRecord> {
        let attrs: Map<String, Value> = serde_json::from_str(&self.attrs)
            .with_context(|| format!("corrupt attrs for product {}", self.id))?;
        Ok(ProductRecord {
            category: self.category.parse()?,
            status: self.status.as_deref().and_then(Status::parse),
            id: self.id,
            name: self.name,
            attrs,
        })
    }
}

const SELECT_PRODUCT: &str = "SELECT category, id, name, status, attrs FROM products";

impl ProductStore for SqliteStore {
    fn get_products_by_category(&self, category: Category) -> Result<Vec<ProductRecord>> {
        self.query_products(
            &format!("{} WHERE category = ?1 ORDER BY id", SELECT_PRODUCT),
            &[&category.as_str()],
        )
    }

    fn get_product_by_id(&self, id: &str) -> Result<Option<ProductRecord>> {
        let mut found = self.query_products(
            &format!("{} WHERE id = ?1 ORDER BY category LIMIT 1", SELECT_PRODUCT),
            &[&id],
        )?;
        Ok(found.pop())
    }

    fn get_product(&self, category: Category, id: &str) -> Result<Option<ProductRecord>> {
        let mut found = self.query_products(
            &format!("{} WHERE category = ?1 AND id = ?2", SELECT_PRODUCT),
            &[&category.as_str(), &id],
        )?;
        Ok(found.pop())
    }

    fn save_product(&self, category: Category, record: &ProductRecord) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let stored: Option<String> = tx
            .query_row(
                "SELECT attrs FROM products WHERE category = ?1 AND id = ?2",
                rusqlite::params![category.as_str(), record.id],
                |r| r.get(0),
            )
            .optional()?;

        let mut attrs: Map<String, Value> = match stored {
            Some(json) => serde_json::from_str(&json)
                .with_context(|| format!("corrupt attrs for product {}", record.id))?,
            None => Map::new(),
        };
        for (key, value) in &record.attrs {
            attrs.insert(key.clone(), value.clone());
        }

        tx.execute(
            "INSERT INTO products (category, id, name, status, attrs, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))
             ON CONFLICT(category, id) DO UPDATE SET
                name = CASE WHEN excluded.name = '' THEN products.name ELSE excluded.name END,
                status = COALESCE(excluded.status, products.status),
                attrs = excluded.attrs,
                updated_at = excluded.updated_at",
            rusqlite::params![
                category.as_str(),
                record.id,
                record.name,
                record.status.map(|s| s.as_str()),
                serde_json::to_string(&attrs)?,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }
}

// ── Catalog import ──

/// Load `products_<category>.json` files (`{"products": [...]}`) from
/// `dir`. Returns the number of records saved. Missing files are skipped.
pub fn import_catalog(store: &impl ProductStore, dir: &Path) -> Result<usize> {
    let mut saved = 0;
    for category in Category::ALL {
        let path = dir.join(format!("products_{}.json", category.as_str()));
        if !path.exists() {
            tracing::warn!("{} not found, skipping", path.display());
            continue;
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let doc: Value = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;

        let products = doc
            .get("products")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for entry in products {
            match ProductRecord::from_json(category, entry) {
                Ok(record) => {
                    store.save_product(category, &record)?;
                    saved += 1;
                }
                Err(e) => tracing::warn!("{}: {}", path.display(), e),
            }
        }
        tracing::info!("Imported {} from {}", category, path.display());
    }
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, attrs: Value) -> ProductRecord {
        let mut rec = ProductRecord::new(id, &format!("Meraki {}", id.to_uppercase()), Category::Mr);
        if let Value::Object(map) = attrs {
            rec.attrs = map;
        }
        rec
    }

    #[test]
    fn save_and_read_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut rec = record("mr46", json!({ "wifi_standard": "802.11ax", "price": 1299 }));
        rec.status = Some(Status::Active);
        store.save_product(Category::Mr, &rec).unwrap();

        let got = store.get_product(Category::Mr, "mr46").unwrap().unwrap();
        assert_eq!(got, rec);
        assert_eq!(store.get_product_by_id("mr46").unwrap(), Some(rec));
        assert!(store.get_product(Category::Ms, "mr46").unwrap().is_none());
        assert!(store.get_product_by_id("nope").unwrap().is_none());
    }

    #[test]
    fn save_keeps_unmentioned_attrs() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .save_product(Category::Mr, &record("mr46", json!({ "price": 1299, "weight": "1 kg" })))
            .unwrap();
        store
            .save_product(Category::Mr, &record("mr46", json!({ "weight": "1.2 kg" })))
            .unwrap();

        let got = store.get_product(Category::Mr, "mr46").unwrap().unwrap();
        assert_eq!(got.attrs["price"], 1299);
        assert_eq!(got.attrs["weight"], "1.2 kg");
    }

    #[test]
    fn partial_record_keeps_stored_name_and_status() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut eos = record("mr18", json!({ "eos_date": "2017-07-31" }));
        eos.status = Some(Status::EndOfSale);
        store.save_product(Category::Mr, &eos).unwrap();

        let partial = ProductRecord::from_json(
            Category::Mr,
            json!({ "id": "mr18", "status": "Discontinued", "price": 5 }),
        )
        .unwrap();
        assert_eq!(partial.status, None);
        assert_eq!(partial.name, "");
        store.save_product(Category::Mr, &partial).unwrap();

        let got = store.get_product(Category::Mr, "mr18").unwrap().unwrap();
        assert_eq!(got.status, Some(Status::EndOfSale));
        assert_eq!(got.name, "Meraki MR18");
        assert_eq!(got.attrs["price"], 5);
        assert_eq!(got.attr_str("eos_date"), Some("2017-07-31"));
    }

    #[test]
    fn by_category_is_sorted_and_scoped() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_product(Category::Mr, &record("mr46", json!({}))).unwrap();
        store.save_product(Category::Mr, &record("mr20", json!({}))).unwrap();
        let mut ms = record("ms120", json!({}));
        ms.category = Category::Ms;
        store.save_product(Category::Ms, &ms).unwrap();

        let ids: Vec<String> = store
            .get_products_by_category(Category::Mr)
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["mr20", "mr46"]);
    }

    #[test]
    fn settings_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get_setting("rate_limit_secs").unwrap(), None);
        store.set_setting("rate_limit_secs", "3").unwrap();
        store.set_setting("rate_limit_secs", "4").unwrap();
        assert_eq!(store.get_setting("rate_limit_secs").unwrap().as_deref(), Some("4"));
    }

    #[test]
    fn stats_counts() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut a = record("mr46", json!({}));
        a.status = Some(Status::EndOfSale);
        store.save_product(Category::Mr, &a).unwrap();
        store.save_product(Category::Mr, &record("mr20", json!({}))).unwrap();

        let s = store.get_stats().unwrap();
        assert_eq!(s.total, 2);
        assert_eq!(s.by_category["mr"], 2);
        assert_eq!(s.by_status["End of Sale"], 1);
        assert_eq!(s.by_status["Unknown"], 1);
    }

    #[test]
    fn import_catalog_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        std::fs::write(
            dir.join("products_mr.json"),
            r#"{"products": [
                {"id": "mr46", "name": "Meraki MR46", "category": "MR", "status": "Active", "subcategory": "Indoor"},
                {"name": "no id"}
            ]}"#,
        )
        .unwrap();
        std::fs::write(dir.join("products_mx.json"), r#"{"products": []}"#).unwrap();

        let store = SqliteStore::open_in_memory().unwrap();
        let n = import_catalog(&store, dir).unwrap();
        assert_eq!(n, 1);

        let got = store.get_product(Category::Mr, "mr46").unwrap().unwrap();
        assert_eq!(got.name, "Meraki MR46");
        assert_eq!(got.status, Some(Status::Active));
        assert_eq!(got.attr_str("subcategory"), Some("Indoor"));
    }
}
