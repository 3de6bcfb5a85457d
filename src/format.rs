use serde::Deserialize;

/// How gauge labels render numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NumberFormat {
    /// Thousands grouped with `,`, at most three decimals: `1,234.568`.
    #[default]
    Locale,
    /// Magnitude suffixes with one decimal: `1.2K`, `3.4M`, `5B`, `6.1T`.
    Abbreviated,
}

const MAX_LOCALE_DECIMALS: usize = 3;

const MAGNITUDES: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

pub fn format_number(value: f64, format: NumberFormat) -> String {
    match format {
        NumberFormat::Locale => format_locale(value),
        NumberFormat::Abbreviated => format_abbreviated(value),
    }
}

fn format_locale(value: f64) -> String {
    if let Some(special) = format_non_finite(value) {
        return special;
    }
    let (int_part, frac_part) = split_fixed(value.abs(), MAX_LOCALE_DECIMALS);
    let mut out = String::new();
    if value < 0.0 && !(int_part == "0" && frac_part.is_empty()) {
        out.push('-');
    }
    out.push_str(&group_thousands(&int_part));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(&frac_part);
    }
    out
}

fn format_abbreviated(value: f64) -> String {
    if let Some(special) = format_non_finite(value) {
        return special;
    }
    let magnitude = value.abs();
    // MAGNITUDES runs largest first; pick the largest scale the value reaches.
    let Some(index) = MAGNITUDES.iter().position(|(scale, _)| magnitude >= *scale) else {
        return format_locale(value);
    };
    let round_tenths = |scale: f64| (magnitude / scale * 10.0).round() / 10.0;
    let (mut scale, mut suffix) = MAGNITUDES[index];
    let mut scaled = round_tenths(scale);
    // 999_950 rounds to 1000K; only then move up to the next suffix.
    if scaled >= 1000.0 && index > 0 {
        (scale, suffix) = MAGNITUDES[index - 1];
        scaled = round_tenths(scale);
    }
    let (int_part, frac_part) = split_fixed(scaled, 1);
    let sign = if value < 0.0 { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{sign}{int_part}{suffix}")
    } else {
        format!("{sign}{int_part}.{frac_part}{suffix}")
    }
}

fn format_non_finite(value: f64) -> Option<String> {
    if value.is_nan() {
        Some("NaN".to_string())
    } else if value.is_infinite() {
        Some(if value > 0.0 { "∞" } else { "-∞" }.to_string())
    } else {
        None
    }
}

/// Fixed-point digits of a non-negative value with trailing zeros dropped.
fn split_fixed(magnitude: f64, decimals: usize) -> (String, String) {
    let fixed = format!("{magnitude:.decimals$}");
    match fixed.split_once('.') {
        Some((int_part, frac_part)) => (
            int_part.to_string(),
            frac_part.trim_end_matches('0').to_string(),
        ),
        None => (fixed, String::new()),
    }
}

fn group_thousands(digits: &str) -> String {
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

    #[test]
    fn locale_groups_thousands() {
        assert_eq!(format_number(1234567.0, NumberFormat::Locale), "1,234,567");
        assert_eq!(format_number(999.0, NumberFormat::Locale), "999");
        assert_eq!(format_number(1000.0, NumberFormat::Locale), "1,000");
    }

    #[test]
    fn locale_keeps_three_decimals() {
        assert_eq!(format_number(1234.56789, NumberFormat::Locale), "1,234.568");
        assert_eq!(format_number(0.5, NumberFormat::Locale), "0.5");
        assert_eq!(format_number(-42.25, NumberFormat::Locale), "-42.25");
    }

    #[test]
    fn locale_drops_negative_zero() {
        assert_eq!(format_number(-0.0001, NumberFormat::Locale), "0");
    }

    #[test]
    fn abbreviated_uses_magnitude_suffixes() {
        assert_eq!(format_number(1500.0, NumberFormat::Abbreviated), "1.5K");
        assert_eq!(format_number(2_000_000.0, NumberFormat::Abbreviated), "2M");
        assert_eq!(format_number(-3_250_000_000.0, NumberFormat::Abbreviated), "-3.3B");
        assert_eq!(format_number(7.1e12, NumberFormat::Abbreviated), "7.1T");
    }

    #[test]
    fn abbreviated_rolls_over_to_next_suffix() {
        assert_eq!(format_number(999_950.0, NumberFormat::Abbreviated), "1M");
        assert_eq!(format_number(999_950_000.0, NumberFormat::Abbreviated), "1B");
    }

    #[test]
    fn abbreviated_stays_on_suffix_below_rollover() {
        assert_eq!(format_number(950_000.0, NumberFormat::Abbreviated), "950K");
        assert_eq!(format_number(960_000.0, NumberFormat::Abbreviated), "960K");
        assert_eq!(format_number(999_000.0, NumberFormat::Abbreviated), "999K");
        assert_eq!(format_number(-950_000_000.0, NumberFormat::Abbreviated), "-950M");
    }

    #[test]
    fn abbreviated_leaves_small_values_alone() {
        assert_eq!(format_number(999.5, NumberFormat::Abbreviated), "999.5");
        assert_eq!(format_number(0.0, NumberFormat::Abbreviated), "0");
    }

    #[test]
    fn non_finite_values() {
        assert_eq!(format_number(f64::NAN, NumberFormat::Locale), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY, NumberFormat::Abbreviated), "-∞");
    }
}
