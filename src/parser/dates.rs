use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::product::Status;

const PLACEHOLDERS: &[&str] = &["n/a", "tbd", "-"];

/// Tried in order; first hit wins.
const FORMATS: &[&str] = &["%B %d, %Y", "%m/%d/%Y", "%Y-%m-%d", "%d.%m.%Y"];

/// Normalise a vendor date to `YYYY-MM-DD`.
///
/// Empty input and placeholder tokens give `None`. Text that matches no
/// known format is returned unchanged, so callers may see non-ISO strings.
pub fn parse_date(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || PLACEHOLDERS.contains(&trimmed.to_lowercase().as_str()) {
        return None;
    }

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .map(|d| d.format("%Y-%m-%d").to_string())
        .or_else(|| Some(trimmed.to_string()))
}

/// Lifecycle status from the two dates and the current time.
///
/// An EOS date that is not ISO (passed through by [`parse_date`]) counts
/// as no EOS date.
pub fn determine_status(
    eol_announced: Option<&str>,
    eos_date: Option<&str>,
    now: NaiveDateTime,
) -> Status {
    let Some(eos) = eos_date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()) else {
        return Status::Active;
    };

    if eos.and_time(NaiveTime::MIN) < now {
        Status::EndOfSale
    } else if eol_announced.is_some() {
        Status::EolAnnounced
    } else {
        Status::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn all_formats_normalise() {
        for input in ["March 3, 2026", "03/03/2026", "2026-03-03", "03.03.2026"] {
            assert_eq!(parse_date(input).as_deref(), Some("2026-03-03"), "{input}");
        }
    }

    #[test]
    fn placeholders_are_none() {
        assert_eq!(parse_date("N/A"), None);
        assert_eq!(parse_date("tbd"), None);
        assert_eq!(parse_date("-"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
    }

    #[test]
    fn unknown_text_passes_through() {
        assert_eq!(parse_date("garbled-text").as_deref(), Some("garbled-text"));
        assert_eq!(parse_date("Q3 2027").as_deref(), Some("Q3 2027"));
        assert_eq!(parse_date("  Q3 2027 \n").as_deref(), Some("Q3 2027"));
    }

    #[test]
    fn status_without_eos_is_active() {
        let now = at("2026-10-17");
        assert_eq!(determine_status(None, None, now), Status::Active);
        assert_eq!(determine_status(Some("2024-01-01"), None, now), Status::Active);
    }

    #[test]
    fn status_past_eos_is_end_of_sale() {
        let now = at("2026-10-17");
        assert_eq!(determine_status(None, Some("2025-01-01"), now), Status::EndOfSale);
        assert_eq!(
            determine_status(Some("2024-01-01"), Some("2025-01-01"), now),
            Status::EndOfSale
        );
        // Midnight of today is already past.
        assert_eq!(determine_status(None, Some("2026-10-17"), now), Status::EndOfSale);
    }

    #[test]
    fn status_future_eos() {
        let now = at("2026-10-17");
        assert_eq!(
            determine_status(Some("2026-01-01"), Some("2027-06-30"), now),
            Status::EolAnnounced
        );
        assert_eq!(determine_status(None, Some("2027-06-30"), now), Status::Active);
    }

    #[test]
    fn unparsed_eos_counts_as_absent() {
        let now = at("2026-10-17");
        assert_eq!(
            determine_status(Some("2026-01-01"), Some("Q3 2027"), now),
            Status::Active
        );
    }
}
