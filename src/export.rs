use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

/// Write scraped data as pretty JSON, creating parent directories.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn writes_into_new_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("scraped").join("eol.json");
        let data = BTreeMap::from([("mr46", "MR46-HW")]);

        write_json(&path, &data).unwrap();
        let back: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back["mr46"], "MR46-HW");
    }
}
