use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Device classes the catalog keeps one collection for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    Mr,
    Mx,
    Ms,
    Mv,
    Mt,
    CatalystAp,
    CatalystSwitch,
    Ise,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Mr,
        Category::Mx,
        Category::Ms,
        Category::Mv,
        Category::Mt,
        Category::CatalystAp,
        Category::CatalystSwitch,
        Category::Ise,
    ];

    /// Categories covered by the vendor EOL listing.
    pub const EOL_TRACKED: [Category; 4] = [Category::Mr, Category::Mx, Category::Ms, Category::Mv];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Mr => "mr",
            Category::Mx => "mx",
            Category::Ms => "ms",
            Category::Mv => "mv",
            Category::Mt => "mt",
            Category::CatalystAp => "catalyst_ap",
            Category::CatalystSwitch => "catalyst_switch",
            Category::Ise => "ise",
        }
    }

    /// Path segment used on the documentation site (`MR`, `MX`, ...).
    pub fn docs_segment(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let lower = s.trim().to_lowercase();
        match Category::ALL.iter().find(|c| c.as_str() == lower) {
            Some(c) => Ok(*c),
            None => bail!("unknown category: {}", s),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = anyhow::Error;

    fn try_from(s: String) -> anyhow::Result<Self> {
        s.parse()
    }
}

impl From<Category> for String {
    fn from(c: Category) -> String {
        c.as_str().to_string()
    }
}

/// Lifecycle status, always derived from the EOL/EOS dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "Active")]
    Active,
    #[serde(rename = "EOL Announced")]
    EolAnnounced,
    #[serde(rename = "End of Sale")]
    EndOfSale,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "Active",
            Status::EolAnnounced => "EOL Announced",
            Status::EndOfSale => "End of Sale",
        }
    }

    pub fn parse(s: &str) -> Option<Status> {
        match s.trim() {
            "Active" => Some(Status::Active),
            "EOL Announced" => Some(Status::EolAnnounced),
            "End of Sale" => Some(Status::EndOfSale),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted catalog entry: a small typed core plus whatever fields
/// vendor pages and manual edits have attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(flatten)]
    pub attrs: Map<String, Value>,
}

impl ProductRecord {
    pub fn new(id: &str, name: &str, category: Category) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            status: None,
            attrs: Map::new(),
        }
    }

    /// Build a record from a loose JSON object as found in catalog files.
    /// `category` comes from the file, not the object. Unknown status
    /// strings are dropped.
    pub fn from_json(category: Category, value: Value) -> anyhow::Result<Self> {
        let Value::Object(mut attrs) = value else {
            bail!("product entry is not a JSON object");
        };
        let id = match attrs.remove("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => id,
            _ => bail!("product entry without an id"),
        };
        let name = match attrs.remove("name") {
            Some(Value::String(name)) => name,
            _ => String::new(),
        };
        attrs.remove("category");
        let status = match attrs.remove("status") {
            Some(Value::String(s)) => {
                let parsed = Status::parse(&s);
                if parsed.is_none() {
                    warn!("{}: ignoring unknown status {:?}", id, s);
                }
                parsed
            }
            _ => None,
        };
        Ok(Self {
            id,
            name,
            category,
            status,
            attrs,
        })
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }
}

/// Output of one datasheet scrape. Not persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapedRecord {
    pub model: String,
    pub fields: BTreeMap<String, String>,
    pub sku_base: Option<String>,
    pub sku_licenses: BTreeMap<String, String>,
    pub source_url: String,
    pub scraped_at: DateTime<Utc>,
}

impl ScrapedRecord {
    /// Store id for this model (`MR46` → `mr46`).
    pub fn product_id(&self) -> String {
        self.model.to_lowercase()
    }
}

/// One row of the vendor EOL listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EolEntry {
    pub model: String,
    pub eol_announced_date: Option<String>,
    pub eos_date: Option<String>,
    pub status: Status,
    pub full_name: String,
}
