use std::path::PathBuf;
use std::time::Duration;

pub const DOCS_BASE_URL: &str = "https://documentation.meraki.com";
pub const EOL_URL: &str = "https://documentation.meraki.com/General_Administration/Other_Topics/Meraki_End-of-Life_(EOL)_Product_Dates";
pub const MR_INDEX_URL: &str = "https://documentation.meraki.com/MR/Product_Information";
pub const ISE_COMPARISON_URL: &str =
    "https://www.cisco.com/c/en/us/products/security/identity-services-engine/models-comparison.html";

pub const DEFAULT_DB_PATH: &str = "data/catalog.sqlite";
pub const DB_ENV_VAR: &str = "CATALOG_DB";

pub const DEFAULT_RATE_LIMIT_SECS: u64 = 2;
pub const RATE_LIMIT_RANGE: std::ops::RangeInclusive<u64> = 1..=10;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings key for the persisted rate-limit delay.
pub const RATE_LIMIT_KEY: &str = "rate_limit_secs";

/// Datasheet page for one model, e.g. `.../MR/Product_Information/Overviews_and_Datasheets/MR46_Datasheet`.
pub fn datasheet_url(category: &str, model: &str) -> String {
    format!(
        "{}/{}/Product_Information/Overviews_and_Datasheets/{}_Datasheet",
        DOCS_BASE_URL, category, model
    )
}

/// `--db` wins, then `$CATALOG_DB`, then the default path.
pub fn resolve_db_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var(DB_ENV_VAR).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
}

/// Reject delays outside [`RATE_LIMIT_RANGE`].
pub fn check_rate_limit(secs: u64) -> anyhow::Result<u64> {
    if !RATE_LIMIT_RANGE.contains(&secs) {
        anyhow::bail!(
            "rate limit must be between {} and {} seconds, got {}",
            RATE_LIMIT_RANGE.start(),
            RATE_LIMIT_RANGE.end(),
            secs
        );
    }
    Ok(secs)
}

/// `--delay` wins, then the stored setting, then the default.
pub fn resolve_delay(flag: Option<u64>, stored: Option<u64>) -> Duration {
    Duration::from_secs(flag.or(stored).unwrap_or(DEFAULT_RATE_LIMIT_SECS))
}
