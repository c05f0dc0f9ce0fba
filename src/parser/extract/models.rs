use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// MR46, MX250, MS225-48FP, MV72X ...
static MODEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(MR|MX|MS|MV|MT)\d+[A-Z]*(-\d+[A-Z]*)?").unwrap());

static MR_MODEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"MR\d+[A-Z]*").unwrap());

/// First model code in a product name or free text, uppercased.
pub fn extract_model(text: &str) -> Option<String> {
    let upper = text.to_uppercase();
    MODEL_RE.find(&upper).map(|m| m.as_str().to_string())
}

/// Distinct MR models mentioned in link texts, sorted.
pub fn extract_mr_models<S: AsRef<str>>(anchor_texts: &[S]) -> Vec<String> {
    anchor_texts
        .iter()
        .flat_map(|t| MR_MODEL_RE.find_iter(t.as_ref()))
        .map(|m| m.as_str().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
