/// Format a floating-point number with thousands separators and a fixed
/// number of decimal places.
///
/// # Examples
///
/// ```
/// use funding_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let rendered = format!("{:.*}", decimals as usize, value.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rendered.as_str(), None),
    };

    let mut result = group_thousands(int_part);
    if let Some(frac) = frac_part {
        result.push('.');
        result.push_str(frac);
    }
    if value < 0.0 {
        result.insert(0, '-');
    }
    result
}

/// Format a monetary amount as a USD string with two decimal places.
///
/// # Examples
///
/// ```
/// use funding_core::formatting::format_currency;
///
/// assert_eq!(format_currency(1234.56), "$1,234.56");
/// assert_eq!(format_currency(-9.99), "-$9.99");
/// ```
pub fn format_currency(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${}", format_number(amount.abs(), 2))
    } else {
        format!("${}", format_number(amount, 2))
    }
}

/// Format a monetary amount compactly for metric headlines: `"$1.2B"`,
/// `"$3.4M"`, `"$12.5K"`, falling back to whole dollars below a thousand.
///
/// # Examples
///
/// ```
/// use funding_core::formatting::format_compact_currency;
///
/// assert_eq!(format_compact_currency(2_400_000.0), "$2.4M");
/// assert_eq!(format_compact_currency(980.0), "$980");
/// ```
pub fn format_compact_currency(amount: f64) -> String {
    let abs = amount.abs();
    let sign = if amount < 0.0 { "-" } else { "" };
    if abs >= 1e9 {
        format!("{}${:.1}B", sign, abs / 1e9)
    } else if abs >= 1e6 {
        format!("{}${:.1}M", sign, abs / 1e6)
    } else if abs >= 1e3 {
        format!("{}${:.1}K", sign, abs / 1e3)
    } else {
        format!("{}${:.0}", sign, abs)
    }
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero.
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let factor = 10_f64.powi(decimal_places as i32);
    ((part / whole) * 100.0 * factor).round() / factor
}

/// Shorten `label` to at most `max_chars` characters, appending `"..."`
/// when anything was cut.
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let kept: String = label.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits, counting from the right.
fn group_thousands(digits: &str) -> String {
    let bytes = digits.as_bytes();
    let mut grouped = Vec::with_capacity(bytes.len() + bytes.len() / 3);
    for (i, b) in bytes.iter().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(b',');
        }
        grouped.push(*b);
    }
    grouped.reverse();
    String::from_utf8(grouped).expect("digits are ascii")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
