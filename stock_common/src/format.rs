//! Human-readable number formatting shared by the normalizer and the renderer.
//!
//! Fraction digits are rounded half away from zero (`1.25` → `"1.3"`), not to
//! the nearest even digit as `format!` does on exact ties.

/// Rounds `n` to `digits` fraction digits, ties away from zero. Values too
/// large to scale are returned as they are.
fn round_to(n: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    let scaled = n * factor;
    if scaled.is_finite() {
        scaled.round() / factor
    } else {
        n
    }
}

/// Formats `n` with thousands separators and at most three fraction digits
/// (`1234567.891` → `"1,234,567.891"`, `2.5` → `"2.5"`).
pub fn format_grouped(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    let fixed = format!("{:.3}", round_to(n.abs(), 3));
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac = frac_part.trim_end_matches('0');

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if n < 0.0 && (int_part != "0" || !frac.is_empty()) {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Formats a volume/value figure with a magnitude suffix.
///
/// Below one million the number is grouped (`"999,999"`); below one billion
/// it is expressed in millions (`"1.5 M"`, `"2 M"`), otherwise in billions
/// (`"3.2 B"`). One decimal is shown unless the scaled value is integral.
/// Returns `None` for NaN and infinities.
pub fn format_magnitude(n: f64) -> Option<String> {
    if !n.is_finite() {
        return None;
    }
    let abs = n.abs();
    if abs < 1_000_000.0 {
        return Some(format_grouped(n));
    }
    let (scaled, suffix) = if abs < 1_000_000_000.0 {
        (n / 1_000_000.0, "M")
    } else {
        (n / 1_000_000_000.0, "B")
    };
    if scaled.fract() == 0.0 {
        Some(format!("{:.0} {}", scaled, suffix))
    } else {
        Some(format!("{:.1} {}", round_to(scaled, 1), suffix))
    }
}

/// String form of a number as used for text filtering: integral values
/// print without a fractional part (`20.0` → `"20"`).
pub fn plain_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_suffixes() {
        assert_eq!(format_magnitude(999_999.0).as_deref(), Some("999,999"));
        assert_eq!(format_magnitude(1_500_000.0).as_deref(), Some("1.5 M"));
        assert_eq!(format_magnitude(2_000_000.0).as_deref(), Some("2 M"));
        assert_eq!(format_magnitude(3_200_000_000.0).as_deref(), Some("3.2 B"));
        assert_eq!(format_magnitude(7_000_000_000.0).as_deref(), Some("7 B"));
        // exact ties round up
        assert_eq!(format_magnitude(1_250_000.0).as_deref(), Some("1.3 M"));
        assert_eq!(format_magnitude(2_250_000_000.0).as_deref(), Some("2.3 B"));
        assert_eq!(format_magnitude(-1_250_000.0).as_deref(), Some("-1.3 M"));
        // a non-integral value keeps its decimal even when it rounds to one
        assert_eq!(format_magnitude(1_999_990.0).as_deref(), Some("2.0 M"));
        assert_eq!(format_magnitude(f64::NAN), None);
    }

    #[test]
    fn grouping_handles_fractions_and_signs() {
        assert_eq!(format_grouped(0.0), "0");
        assert_eq!(format_grouped(1000.0), "1,000");
        assert_eq!(format_grouped(-1234.5), "-1,234.5");
        assert_eq!(format_grouped(12.3456), "12.346");
        assert_eq!(format_grouped(0.0625), "0.063");
        assert_eq!(format_grouped(-2.0625), "-2.063");
        assert_eq!(format_grouped(123_456_789.0), "123,456,789");
    }

    #[test]
    fn plain_number_drops_integral_fraction() {
        assert_eq!(plain_number(20.0), "20");
        assert_eq!(plain_number(-3.0), "-3");
        assert_eq!(plain_number(2.25), "2.25");
    }
}
