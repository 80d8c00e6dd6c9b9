//! Display formatting for dates, money and numbers

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Format an ISO date (or date-time) as a long English date, e.g. `January 5, 2024`.
///
/// Returns `None` when the input is not a recognisable date.
pub fn long_date(raw: &str) -> Option<String> {
    parse_date(raw).map(|date| date.format("%B %-d, %Y").to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return Some(dt.date());
        }
    }
    None
}

/// Format a monetary amount with its currency symbol and thousands separators.
///
/// Unknown currency codes are written as a prefix: `CHF 1,200.00`.
pub fn currency(amount: f64, code: &str) -> String {
    let code = code.trim().to_uppercase();
    let (prefix, decimals) = match code.as_str() {
        "USD" | "" => ("$".to_string(), 2),
        "EUR" => ("€".to_string(), 2),
        "GBP" => ("£".to_string(), 2),
        "JPY" => ("¥".to_string(), 0),
        other => (format!("{} ", other), 2),
    };

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}{}{}", sign, prefix, grouped(amount.abs(), decimals))
}

fn grouped(amount: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, amount);
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Raw numeric display: integers without a fractional part, `0` stays `0`
pub fn number(value: f64) -> String {
    if value == 0.0 {
        // avoids "-0"
        return "0".to_string();
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_long_date_from_iso() {
        assert_eq!(long_date("2024-01-05").as_deref(), Some("January 5, 2024"));
        assert_eq!(
            long_date("2024-12-31T10:00:00Z").as_deref(),
            Some("December 31, 2024")
        );
        assert_eq!(
            long_date("2024-03-15T08:30:00").as_deref(),
            Some("March 15, 2024")
        );
    }

    #[test]
    fn test_long_date_rejects_garbage() {
        assert_eq!(long_date(""), None);
        assert_eq!(long_date("next tuesday"), None);
        assert_eq!(long_date("2024-13-40"), None);
    }

    #[test]
    fn test_currency_symbols() {
        assert_eq!(currency(1500.0, "USD"), "$1,500.00");
        assert_eq!(currency(1234567.891, "EUR"), "€1,234,567.89");
        assert_eq!(currency(99.5, "gbp"), "£99.50");
        assert_eq!(currency(5000.0, "JPY"), "¥5,000");
        assert_eq!(currency(1200.0, "CHF"), "CHF 1,200.00");
    }

    #[test]
    fn test_currency_small_and_negative() {
        assert_eq!(currency(0.5, "USD"), "$0.50");
        assert_eq!(currency(-42.0, "USD"), "-$42.00");
        assert_eq!(currency(999.0, "USD"), "$999.00");
    }

    #[test]
    fn test_number_display() {
        assert_eq!(number(0.0), "0");
        assert_eq!(number(-0.0), "0");
        assert_eq!(number(42.0), "42");
        assert_eq!(number(12.5), "12.5");
    }
}
