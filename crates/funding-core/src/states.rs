//! Normalization of free-text state names into USPS codes.
//!
//! Source sheets are inconsistent: some carry `"WA"`, some `"Washington"`,
//! some `"washington "`. Filtering and the states-covered metric both need a
//! single canonical form.

/// Full state/territory names (lowercased) paired with their USPS code.
const STATE_TABLE: &[(&str, &str)] = &[
    ("alabama", "AL"),
    ("alaska", "AK"),
    ("arizona", "AZ"),
    ("arkansas", "AR"),
    ("california", "CA"),
    ("colorado", "CO"),
    ("connecticut", "CT"),
    ("delaware", "DE"),
    ("district of columbia", "DC"),
    ("florida", "FL"),
    ("georgia", "GA"),
    ("hawaii", "HI"),
    ("idaho", "ID"),
    ("illinois", "IL"),
    ("indiana", "IN"),
    ("iowa", "IA"),
    ("kansas", "KS"),
    ("kentucky", "KY"),
    ("louisiana", "LA"),
    ("maine", "ME"),
    ("maryland", "MD"),
    ("massachusetts", "MA"),
    ("michigan", "MI"),
    ("minnesota", "MN"),
    ("mississippi", "MS"),
    ("missouri", "MO"),
    ("montana", "MT"),
    ("nebraska", "NE"),
    ("nevada", "NV"),
    ("new hampshire", "NH"),
    ("new jersey", "NJ"),
    ("new mexico", "NM"),
    ("new york", "NY"),
    ("north carolina", "NC"),
    ("north dakota", "ND"),
    ("ohio", "OH"),
    ("oklahoma", "OK"),
    ("oregon", "OR"),
    ("pennsylvania", "PA"),
    ("puerto rico", "PR"),
    ("rhode island", "RI"),
    ("south carolina", "SC"),
    ("south dakota", "SD"),
    ("tennessee", "TN"),
    ("texas", "TX"),
    ("utah", "UT"),
    ("vermont", "VT"),
    ("virginia", "VA"),
    ("washington", "WA"),
    ("west virginia", "WV"),
    ("wisconsin", "WI"),
    ("wyoming", "WY"),
];

/// True when `code` is a recognised two-letter USPS code (case-insensitive).
pub fn is_state_code(code: &str) -> bool {
    let trimmed = code.trim();
    trimmed.len() == 2
        && STATE_TABLE
            .iter()
            .any(|(_, c)| c.eq_ignore_ascii_case(trimmed))
}

/// Normalise a raw state string into a canonical USPS code.
///
/// * A known two-letter code (any casing) is uppercased: `"wa"` → `"WA"`.
/// * A known full name (any casing, surrounding whitespace ignored) maps to
///   its code: `"Washington"` → `"WA"`.
/// * Anything else is returned trimmed but otherwise unchanged, so unexpected
///   regions still group consistently instead of disappearing.
/// * Empty or whitespace-only input → `""`.
///
/// # Examples
///
/// ```
/// use funding_core::states::normalize_state;
///
/// assert_eq!(normalize_state("Washington"), "WA");
/// assert_eq!(normalize_state("  tx "), "TX");
/// assert_eq!(normalize_state("Guam"), "Guam");
/// ```
pub fn normalize_state(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if is_state_code(trimmed) {
        return trimmed.to_ascii_uppercase();
    }

    let lower = trimmed.to_lowercase();
    if let Some((_, code)) = STATE_TABLE.iter().find(|(name, _)| *name == lower) {
        return (*code).to_string();
    }

    trimmed.to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_state_full_name() {
        assert_eq!(normalize_state("Washington"), "WA");
        assert_eq!(normalize_state("NEW YORK"), "NY");
        assert_eq!(normalize_state("district of columbia"), "DC");
    }

    #[test]
    fn test_normalize_state_code_passthrough() {
        assert_eq!(normalize_state("CA"), "CA");
        assert_eq!(normalize_state("ca"), "CA");
        assert_eq!(normalize_state(" tx "), "TX");
    }

    #[test]
    fn test_normalize_state_unknown_returned_trimmed() {
        assert_eq!(normalize_state("  Guam "), "Guam");
        assert_eq!(normalize_state("Region 9"), "Region 9");
    }

    #[test]
    fn test_normalize_state_empty() {
        assert_eq!(normalize_state(""), "");
        assert_eq!(normalize_state("   "), "");
    }

    #[test]
    fn test_is_state_code() {
        assert!(is_state_code("WA"));
        assert!(is_state_code("pr"));
        assert!(!is_state_code("XX"));
        assert!(!is_state_code("Washington"));
    }

    #[test]
    fn test_state_table_codes_are_unique() {
        let mut codes: Vec<&str> = STATE_TABLE.iter().map(|(_, c)| *c).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), STATE_TABLE.len());
    }
}
