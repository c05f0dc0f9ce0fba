use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

static LICENSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"LIC-[A-Z0-9-]+").unwrap());

const DURATIONS: &[(&str, &str)] = &[("1YR", "1"), ("3YR", "3"), ("5YR", "5")];

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Skus {
    pub hardware: Option<String>,
    /// `{years}_year_{tier}` → SKU, e.g. `3_year_ent` → `LIC-ENT-3YR`.
    pub licenses: BTreeMap<String, String>,
}

/// Hardware (`<model>-HW`) and license (`LIC-...`) SKUs in page text.
pub fn extract_skus(text: &str, model: &str) -> Skus {
    let hardware = RegexBuilder::new(&format!("{}-HW", regex::escape(model)))
        .case_insensitive(true)
        .build()
        .ok()
        .and_then(|re| re.find(text).map(|m| m.as_str().to_uppercase()));

    let mut licenses = BTreeMap::new();
    for token in LICENSE_RE.find_iter(text).map(|m| m.as_str()) {
        if let Some(key) = classify_license(token) {
            licenses.insert(key, token.to_string());
        }
    }

    Skus { hardware, licenses }
}

/// Tier from `ENT` (enterprise) or `SEC`/`ADV` (advanced security), term
/// from `1YR`/`3YR`/`5YR`. Tokens missing either are not guessed at.
pub fn classify_license(token: &str) -> Option<String> {
    let tier = if token.contains("ENT") {
        "ent"
    } else if token.contains("SEC") || token.contains("ADV") {
        "adv"
    } else {
        return None;
    };
    let (_, years) = DURATIONS.iter().find(|(marker, _)| token.contains(*marker))?;
    Some(format!("{}_year_{}", years, tier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardware_and_enterprise_license() {
        let skus = extract_skus("Order MR46-HW with LIC-ENT-3YR today", "MR46");
        assert_eq!(skus.hardware.as_deref(), Some("MR46-HW"));
        assert_eq!(skus.licenses.len(), 1);
        assert_eq!(skus.licenses["3_year_ent"], "LIC-ENT-3YR");
    }

    #[test]
    fn hardware_match_is_case_insensitive() {
        let skus = extract_skus("sku: mr46-hw", "MR46");
        assert_eq!(skus.hardware.as_deref(), Some("MR46-HW"));
    }

    #[test]
    fn other_models_hardware_ignored() {
        let skus = extract_skus("MR36-HW", "MR46");
        assert_eq!(skus.hardware, None);
    }

    #[test]
    fn security_tiers() {
        assert_eq!(classify_license("LIC-MX67-SEC-3YR").as_deref(), Some("3_year_adv"));
        assert_eq!(classify_license("LIC-MX67-ADV-5YR").as_deref(), Some("5_year_adv"));
        assert_eq!(classify_license("LIC-ENT-1YR").as_deref(), Some("1_year_ent"));
    }

    #[test]
    fn ambiguous_tokens_dropped() {
        assert_eq!(classify_license("LIC-MR-7YR"), None);
        assert_eq!(classify_license("LIC-ENT-10D"), None);
        assert_eq!(classify_license("LIC-MV-1YR"), None);

        let skus = extract_skus("LIC-MR-7YR LIC-MV-1YR", "MR46");
        assert!(skus.licenses.is_empty());
    }

    #[test]
    fn later_token_overwrites_same_key() {
        let skus = extract_skus("LIC-ENT-1YR LIC-MR-ENT-1YR", "MR46");
        assert_eq!(skus.licenses["1_year_ent"], "LIC-MR-ENT-1YR");
    }
}
