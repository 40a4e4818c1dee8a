// Display formatting (en-IE, EUR)

use chrono::{DateTime, Utc};

/// Whole euros with thousands separators: `€450,000`, `-€295,000`
pub fn format_currency(value: f64) -> String {
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}€{}", sign, group_thousands(rounded.abs() as u64))
}

/// Euros and cents: `€3,500.00`, `-€85.50`
pub fn format_currency_cents(value: f64) -> String {
    let cents = (value * 100.0).round();
    let sign = if cents < 0.0 { "-" } else { "" };
    let cents = cents.abs() as u64;
    format!("{}€{}.{:02}", sign, group_thousands(cents / 100), cents % 100)
}

/// Axis label for the trend chart: `Jan 24`
pub fn format_month_year(date: &DateTime<Utc>) -> String {
    date.format("%b %y").to_string()
}

/// List date: `2 Jan 2024`
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%-d %b %Y").to_string()
}

/// Percentage with one decimal: `42.5%`
pub fn format_percentage(value: f64) -> String {
    format!("{:.1}%", value)
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "€0");
        assert_eq!(format_currency(999.0), "€999");
        assert_eq!(format_currency(460000.0), "€460,000");
        assert_eq!(format_currency(1234567.0), "€1,234,567");
        assert_eq!(format_currency(-295000.0), "-€295,000");
    }

    #[test]
    fn test_format_currency_rounds_half_away_from_zero() {
        assert_eq!(format_currency(89.5), "€90");
        assert_eq!(format_currency(-89.5), "-€90");
        assert_eq!(format_currency(-0.4), "€0");
    }

    #[test]
    fn test_format_currency_cents() {
        assert_eq!(format_currency_cents(3500.0), "€3,500.00");
        assert_eq!(format_currency_cents(-85.5), "-€85.50");
        assert_eq!(format_currency_cents(-89.99), "-€89.99");
        assert_eq!(format_currency_cents(0.0), "€0.00");
    }

    #[test]
    fn test_format_dates() {
        let date = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(format_month_year(&date), "Jan 24");
        assert_eq!(format_date(&date), "2 Jan 2024");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(42.456), "42.5%");
        assert_eq!(format_percentage(100.0), "100.0%");
    }
}
