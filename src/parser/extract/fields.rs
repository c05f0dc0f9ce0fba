use std::collections::BTreeMap;

use scraper::Html;

use crate::parser::tables::tables;

/// Vendor label → canonical field. Matched as case-insensitive substrings,
/// first entry wins, so more specific labels must come first.
const FIELD_LABELS: &[(&str, &str)] = &[
    ("wi-fi standard", "wifi_standard"),
    ("maximum data rate", "max_data_rate"),
    ("spatial streams", "spatial_streams"),
    ("frequency bands", "frequency_bands"),
    ("poe requirement", "poe_requirement"),
    ("power consumption", "max_power_consumption"),
    ("ethernet ports", "ethernet_ports"),
    ("dimensions", "dimensions"),
    ("weight", "weight"),
    ("operating temperature", "operating_temp"),
    ("firewall throughput", "firewall_throughput"),
    ("vpn throughput", "vpn_throughput"),
    ("recommended users", "recommended_users"),
    ("total ports", "total_ports"),
    ("poe budget", "poe_budget"),
    ("switching capacity", "switching_capacity"),
];

pub fn map_label(raw: &str) -> Option<&'static str> {
    let lower = raw.to_lowercase();
    FIELD_LABELS
        .iter()
        .find(|(label, _)| lower.contains(*label))
        .map(|(_, field)| *field)
}

/// Label/value pairs from every table row with two or more cells.
/// Unknown labels are dropped; a later row overwrites an earlier one.
pub fn extract_fields(doc: &Html) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();

    for table in tables(doc) {
        for row in table {
            let [label, value, ..] = row.as_slice() else {
                continue;
            };
            if let Some(field) = map_label(&label.text) {
                fields.insert(field.to_string(), value.text.clone());
            }
        }
    }

    fields
}
