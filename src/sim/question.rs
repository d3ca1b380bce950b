//! Questions and the per-level question generators
//!
//! Each level archetype maps to a `QuestionKind`. A generator returns a
//! target value, its display label, a short tip and the denominator of the
//! displayed fraction. Callers reject values outside the level range.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::fraction::{gcd, simplify_fraction, to_fraction_label, to_mixed_label};

/// A single placement target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Exact target position on the number line
    pub value: f64,
    /// What the player is asked to find ("3/8", "1 2/3", "6/12", ...)
    pub label: String,
    /// Hint shown next to the target
    pub tip: String,
    /// Denominator of the displayed fraction (drives the dynamic tick grid)
    pub denominator: Option<u32>,
    /// Random filler produced when a generator could not supply enough values
    #[serde(default)]
    pub free_throw: bool,
}

impl Question {
    pub fn new(value: f64, label: impl Into<String>, tip: impl Into<String>, denominator: Option<u32>) -> Self {
        Self {
            value,
            label: label.into(),
            tip: tip.into(),
            denominator,
            free_throw: false,
        }
    }
}

/// Curated introductory targets (drawn without replacement for the warm-up level)
pub const WARMUP_POOL: [(i64, i64, &str); 6] = [
    (1, 2, "Find the midpoint"),
    (1, 4, "First quarter"),
    (3, 4, "Third quarter"),
    (1, 8, "One eighth"),
    (7, 8, "Close to the end"),
    (3, 8, "Three eighths"),
];

/// Build a question from a warm-up pool entry
pub fn warmup_question(index: usize) -> Question {
    let (num, den, tip) = WARMUP_POOL[index % WARMUP_POOL.len()];
    Question::new(num as f64 / den as f64, format!("{num}/{den}"), tip, Some(den as u32))
}

/// Level archetypes, each with its own generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    /// Curated warm-up pool; generates basic fractions past the pool
    Warmup,
    /// Denominator from {2,4,8}, proper numerator
    Basic,
    /// Reduced fraction shown with a scaled-up label
    Equivalent,
    /// Whole part 1-2 plus a coprime proper fraction
    Mixed,
    /// Warm-up entries mixed with mixed numbers
    Sprint,
    /// Fractions across a range that includes negatives, never zero
    Negative,
    /// Improper fractions, shown either improper or mixed
    Compound,
    /// Interior fractions with denominators 3..9
    Drift,
    /// Denominators 3..10, fraction or mixed display
    Boss,
}

const BASIC_DENS: [i64; 3] = [2, 4, 8];
const EQUIVALENT_DENS: [i64; 5] = [2, 3, 4, 5, 6];
const EQUIVALENT_FACTORS: [i64; 3] = [2, 3, 4];
const MIXED_DENS: [i64; 6] = [2, 3, 4, 5, 6, 8];
const NEGATIVE_DENS: [i64; 5] = [2, 3, 4, 5, 6];
const DRIFT_DENS: [i64; 7] = [3, 4, 5, 6, 7, 8, 9];
const BOSS_DENS: [i64; 8] = [3, 4, 5, 6, 7, 8, 9, 10];

/// Retries spent looking for a numerator coprime with the denominator
const COPRIME_RETRIES: u32 = 24;

fn pick<R: Rng + ?Sized>(rng: &mut R, items: &[i64]) -> i64 {
    items[rng.random_range(0..items.len())]
}

/// Uniform integer in `[min, max]`; collapses to `min` when the range is empty
fn rand_int<R: Rng + ?Sized>(rng: &mut R, min: i64, max: i64) -> i64 {
    if max <= min { min } else { rng.random_range(min..=max) }
}

fn den_u32(den: i64) -> Option<u32> {
    if den > 1 { u32::try_from(den).ok() } else { None }
}

/// Numerator bounds of `den`ths inside `range`
fn numerator_bounds(range: (f64, f64), den: i64) -> (i64, i64) {
    let min = (range.0 * den as f64).ceil() as i64;
    let max = (range.1 * den as f64).floor() as i64;
    (min, max)
}

impl QuestionKind {
    /// Produce one candidate question for a level spanning `range`
    pub fn generate<R: Rng + ?Sized>(self, rng: &mut R, range: (f64, f64)) -> Question {
        match self {
            QuestionKind::Warmup | QuestionKind::Basic => basic(rng),
            QuestionKind::Equivalent => equivalent(rng),
            QuestionKind::Mixed => mixed(rng),
            QuestionKind::Sprint => {
                if rng.random_bool(0.52) {
                    warmup_question(rng.random_range(0..WARMUP_POOL.len()))
                } else {
                    Question {
                        tip: "Basic and mixed-number sprint".to_string(),
                        ..mixed(rng)
                    }
                }
            }
            QuestionKind::Negative => negative(rng, range),
            QuestionKind::Compound => compound(rng),
            QuestionKind::Drift => drift(rng, range),
            QuestionKind::Boss => boss(rng, range),
        }
    }
}

fn basic<R: Rng + ?Sized>(rng: &mut R) -> Question {
    let den = pick(rng, &BASIC_DENS);
    let num = rand_int(rng, 1, den - 1);
    Question::new(num as f64 / den as f64, format!("{num}/{den}"), "Basic fraction hunt", den_u32(den))
}

fn equivalent<R: Rng + ?Sized>(rng: &mut R) -> Question {
    let den = pick(rng, &EQUIVALENT_DENS);
    let num = rand_int(rng, 1, den - 1);
    let factor = pick(rng, &EQUIVALENT_FACTORS);
    Question::new(
        num as f64 / den as f64,
        format!("{}/{}", num * factor, den * factor),
        format!("Equivalent to {num}/{den}"),
        den_u32(den * factor),
    )
}

fn mixed<R: Rng + ?Sized>(rng: &mut R) -> Question {
    let den = pick(rng, &MIXED_DENS);
    let whole = rand_int(rng, 1, 2);
    let mut num = rand_int(rng, 1, den - 1);
    let mut guard = 0;
    // A shared factor would make the label read as a different reduced fraction
    while gcd(num, den) != 1 && guard < COPRIME_RETRIES {
        num = rand_int(rng, 1, den - 1);
        guard += 1;
    }
    Question::new(
        whole as f64 + num as f64 / den as f64,
        format!("{whole} {num}/{den}"),
        "Place the mixed number on the right segment",
        den_u32(den),
    )
}

fn negative<R: Rng + ?Sized>(rng: &mut R, range: (f64, f64)) -> Question {
    let den = pick(rng, &NEGATIVE_DENS);
    let (min_num, max_num) = numerator_bounds(range, den);
    let mut num = rand_int(rng, min_num, max_num);
    if num == 0 {
        num = if rng.random_bool(0.5) { -1 } else { 1 };
    }
    let (n, d) = simplify_fraction(num, den);
    Question::new(
        n as f64 / d as f64,
        crate::fraction::format_fraction((n, d)),
        "Careful on the negative side",
        den_u32(d),
    )
}

fn compound<R: Rng + ?Sized>(rng: &mut R) -> Question {
    let den = pick(rng, &MIXED_DENS);
    let whole = rand_int(rng, 1, 2);
    let num = rand_int(rng, 1, den - 1);
    let improper = whole * den + num;
    let value = improper as f64 / den as f64;
    if rng.random_bool(0.55) {
        Question::new(value, format!("{whole} {num}/{den}"), "Whole plus fraction", den_u32(den))
    } else {
        Question::new(value, format!("{improper}/{den}"), "Improper fraction", den_u32(den))
    }
}

fn drift<R: Rng + ?Sized>(rng: &mut R, range: (f64, f64)) -> Question {
    let den = pick(rng, &DRIFT_DENS);
    let (min_num, max_num) = numerator_bounds(range, den);
    // Keep off the endpoints
    let num = rand_int(rng, min_num + 1, (min_num + 1).max(max_num - 1));
    let (n, d) = simplify_fraction(num, den);
    let value = n as f64 / d as f64;
    Question::new(value, to_fraction_label(value, 12), "Drifting line", den_u32(d))
}

fn boss<R: Rng + ?Sized>(rng: &mut R, range: (f64, f64)) -> Question {
    let den = pick(rng, &BOSS_DENS);
    let (min_num, max_num) = numerator_bounds(range, den);
    let num = rand_int(rng, min_num, max_num);
    let (n, d) = simplify_fraction(num, den);
    let value = n as f64 / d as f64;
    let label = if rng.random_bool(0.45) {
        to_mixed_label(value, 12)
    } else {
        to_fraction_label(value, 12)
    };
    Question::new(value, label, "Camera boss fight", den_u32(d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fraction::extract_denominator;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn samples(kind: QuestionKind, range: (f64, f64)) -> Vec<Question> {
        let mut rng = Pcg32::seed_from_u64(7);
        (0..400).map(|_| kind.generate(&mut rng, range)).collect()
    }

    #[test]
    fn test_basic_denominators() {
        for q in samples(QuestionKind::Basic, (0.0, 1.0)) {
            let den = q.denominator.expect("basic questions are fractions");
            assert!([2, 4, 8].contains(&den));
            assert!(q.value > 0.0 && q.value < 1.0);
        }
    }

    #[test]
    fn test_equivalent_label_is_scaled() {
        for q in samples(QuestionKind::Equivalent, (0.0, 1.0)) {
            let (num, den) = q.label.split_once('/').expect("fraction label");
            let num: f64 = num.parse().unwrap();
            let den: f64 = den.parse().unwrap();
            assert!((num / den - q.value).abs() < 1e-9);
            assert!(den >= 4.0);
            assert_eq!(q.denominator, Some(den as u32));
        }
    }

    #[test]
    fn test_mixed_is_coprime_and_in_range() {
        for q in samples(QuestionKind::Mixed, (0.0, 3.0)) {
            assert!(q.value > 1.0 && q.value < 3.0, "value {}", q.value);
            let (_, frac) = q.label.split_once(' ').expect("mixed label");
            let (num, den) = frac.split_once('/').unwrap();
            assert_eq!(gcd(num.parse().unwrap(), den.parse().unwrap()), 1);
        }
    }

    #[test]
    fn test_negative_never_zero() {
        for q in samples(QuestionKind::Negative, (-2.0, 2.0)) {
            assert!(q.value != 0.0);
            assert!((-2.0..=2.0).contains(&q.value));
        }
    }

    #[test]
    fn test_compound_labels_agree() {
        for q in samples(QuestionKind::Compound, (0.0, 3.0)) {
            let whole_and_frac = match q.label.split_once(' ') {
                Some((whole, frac)) => (whole.parse::<f64>().unwrap(), frac),
                None => (0.0, q.label.as_str()),
            };
            let (num, den) = whole_and_frac.1.split_once('/').unwrap();
            let shown = whole_and_frac.0 + num.parse::<f64>().unwrap() / den.parse::<f64>().unwrap();
            assert!((shown - q.value).abs() < 1e-9);
        }
    }

    #[test]
    fn test_drift_stays_inside() {
        for q in samples(QuestionKind::Drift, (0.0, 3.0)) {
            assert!(q.value > 0.0 && q.value < 3.0, "value {}", q.value);
        }
    }

    #[test]
    fn test_boss_denominator_matches_label() {
        for q in samples(QuestionKind::Boss, (-1.0, 2.0)) {
            assert!((-1.0..=2.0).contains(&q.value));
            assert_eq!(q.denominator, extract_denominator(&q.label));
        }
    }

    #[test]
    fn test_warmup_pool_entries() {
        let q = warmup_question(4);
        assert_eq!(q.label, "7/8");
        assert_eq!(q.denominator, Some(8));
        assert!((q.value - 0.875).abs() < 1e-12);
    }
}
