//! Fraction arithmetic and label formatting
//!
//! Pure helpers shared by the question generators and the free-throw
//! filler. Labels use `num/den` for fractions and `whole num/den` for
//! mixed numbers.

use std::sync::LazyLock;

use regex::Regex;

use crate::consts::VALUE_EPSILON;

/// Greatest common divisor of the absolute values (1 when both are zero)
pub fn gcd(a: i64, b: i64) -> i64 {
    let mut x = a.abs();
    let mut y = b.abs();
    while y != 0 {
        let t = x % y;
        x = y;
        y = t;
    }
    if x == 0 { 1 } else { x }
}

/// Reduce `num/den`, carrying the sign on the numerator.
///
/// A zero denominator yields `(0, 1)`.
pub fn simplify_fraction(num: i64, den: i64) -> (i64, i64) {
    if den == 0 {
        return (0, 1);
    }
    let sign = if den < 0 { -1 } else { 1 };
    let n = num * sign;
    let d = den.abs();
    let g = gcd(n, d);
    (n / g, d / g)
}

/// Best `num/den` approximation of `value` with `den <= max_den`, simplified.
///
/// Denominators are scanned in increasing order and only a strictly smaller
/// error replaces the current best, so ties keep the smallest denominator.
pub fn approximate_fraction(value: f64, max_den: i64) -> (i64, i64) {
    let mut best = (0, 1);
    let mut best_err = f64::INFINITY;
    for den in 1..=max_den.max(1) {
        let num = (value * den as f64).round() as i64;
        let err = (value - num as f64 / den as f64).abs();
        if err < best_err {
            best_err = err;
            best = (num, den);
        }
    }
    simplify_fraction(best.0, best.1)
}

/// Format `value` as an integer or a `num/den` fraction
pub fn to_fraction_label(value: f64, max_den: i64) -> String {
    if !value.is_finite() {
        return "?".to_string();
    }
    let rounded = value.round();
    if (value - rounded).abs() < VALUE_EPSILON {
        return format!("{}", rounded as i64);
    }
    format_fraction(approximate_fraction(value, max_den))
}

/// Format `value` as a mixed number (`"-1 3/4"`), falling back to a plain
/// fraction when there is no whole part or no fractional part.
pub fn to_mixed_label(value: f64, max_den: i64) -> String {
    if !value.is_finite() {
        return "?".to_string();
    }
    let negative = value < 0.0;
    let abs = value.abs();
    let whole = abs.floor();
    let frac = abs - whole;
    if whole == 0.0 || frac < VALUE_EPSILON {
        return to_fraction_label(value, max_den);
    }

    let mut best_num = 0i64;
    let mut best_den = 1i64;
    let mut best_err = f64::INFINITY;
    for den in 2..=max_den {
        let num = (frac * den as f64).round() as i64;
        if num == 0 {
            continue;
        }
        let err = (frac - num as f64 / den as f64).abs();
        if err < best_err {
            best_err = err;
            best_num = num;
            best_den = den;
        }
    }

    let whole = whole as i64;
    let prefix = if negative { "-" } else { "" };
    if best_num == 0 {
        return format!("{prefix}{whole}");
    }
    let (num, den) = simplify_fraction(best_num, best_den);
    format!("{prefix}{whole} {}/{den}", num.abs())
}

/// Three-decimal display with trailing zeros stripped and a decimal comma
pub fn format_compact_decimal(value: f64) -> String {
    if !value.is_finite() {
        return "?".to_string();
    }
    let rounded = (value * 1000.0).round() / 1000.0;
    let text = if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        let fixed = format!("{rounded:.3}");
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    };
    text.replacen('.', ",", 1)
}

/// First `num/den` pattern in a label, whitespace allowed around the slash
static FRACTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*/\s*(\d+)").expect("fraction pattern is valid"));

/// Denominator of the first `num/den` in a label, if positive
pub fn extract_denominator(label: &str) -> Option<u32> {
    let captures = FRACTION_PATTERN.captures(label)?;
    captures
        .get(2)?
        .as_str()
        .parse::<u32>()
        .ok()
        .filter(|den| *den > 0)
}

/// `"n/d"`, or `"n"` when the denominator is 1
pub fn format_fraction((num, den): (i64, i64)) -> String {
    if den == 1 {
        num.to_string()
    } else {
        format!("{num}/{den}")
    }
}
