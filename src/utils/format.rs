//! Number formatting for the text report.
//!
//! Values inside the crate are USD millions; the report shows large
//! aggregates as billions (`US$ 41.4 Bi`) and table cells with Brazilian
//! thousands separators (`41.418`).

/// Rounds to an integer and groups thousands with `.`.
pub fn format_br_thousands(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if negative && grouped != "0" {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

pub fn format_billions(value_usd_millions: f64) -> String {
    format!("US$ {:.1} Bi", value_usd_millions / 1000.0)
}

pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_br_thousands() {
        assert_eq!(format_br_thousands(41418.2), "41.418");
        assert_eq!(format_br_thousands(999.6), "1.000");
        assert_eq!(format_br_thousands(12.0), "12");
        assert_eq!(format_br_thousands(-1234567.0), "-1.234.567");
        assert_eq!(format_br_thousands(-0.2), "0");
    }

    #[test]
    fn test_format_billions_and_percent() {
        assert_eq!(format_billions(40838.0), "US$ 40.8 Bi");
        assert_eq!(format_billions(-1408.0), "US$ -1.4 Bi");
        assert_eq!(format_percent(12.345, 1), "12.3%");
    }
}
