//! Question set construction
//!
//! A level always gets exactly `level.questions` targets inside its range.
//! Generators are retried a bounded number of times; whatever is still
//! missing afterwards is filled with random "free throw" values.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use super::levels::LevelDef;
use super::question::{Question, QuestionKind, WARMUP_POOL, warmup_question};
use crate::consts::QUESTION_RETRY_BUDGET;
use crate::fraction::{approximate_fraction, to_fraction_label};

/// Largest denominator used to label free-throw values
const FREE_THROW_MAX_DEN: i64 = 10;

/// Dedup key: value rounded to 4 decimal places
#[inline]
fn value_key(value: f64) -> i64 {
    (value * 10_000.0).round() as i64
}

/// Build the question list for a level using its own generator
pub fn build_questions<R: Rng + ?Sized>(level: &LevelDef, rng: &mut R) -> Vec<Question> {
    if level.kind == QuestionKind::Warmup {
        let mut order: Vec<usize> = (0..WARMUP_POOL.len()).collect();
        order.shuffle(rng);
        let mut picked: Vec<Question> = order
            .into_iter()
            .take(level.questions)
            .map(warmup_question)
            .filter(|q| level.contains(q.value))
            .collect();
        if picked.len() < level.questions {
            let more = build_questions_with(level, rng, &picked, |rng, range| {
                QuestionKind::Basic.generate(rng, range)
            });
            picked.extend(more);
        }
        return picked;
    }

    let kind = level.kind;
    build_questions_with(level, rng, &[], |rng, range| kind.generate(rng, range))
}

/// Fill a level's remaining slots from `generate`, skipping values already in `existing`.
///
/// Returns only the new questions.
pub fn build_questions_with<R, F>(
    level: &LevelDef,
    rng: &mut R,
    existing: &[Question],
    mut generate: F,
) -> Vec<Question>
where
    R: Rng + ?Sized,
    F: FnMut(&mut R, (f64, f64)) -> Question,
{
    let needed = level.questions.saturating_sub(existing.len());
    let mut seen: HashSet<i64> = existing.iter().map(|q| value_key(q.value)).collect();
    let mut picked = Vec::with_capacity(needed);
    let min_key = value_key(level.range.0);
    let max_key = value_key(level.range.1);

    let mut attempts = 0;
    while picked.len() < needed && attempts < QUESTION_RETRY_BUDGET {
        attempts += 1;
        let question = generate(rng, level.range);
        let key = value_key(question.value);
        if key < min_key || key > max_key || !seen.insert(key) {
            continue;
        }
        picked.push(question);
    }

    let missing = needed - picked.len();
    if missing > 0 {
        log::debug!(
            "Level {}: generator gave {} of {} questions, adding {} free throws",
            level.id,
            picked.len(),
            needed,
            missing
        );
    }
    while picked.len() < needed {
        picked.push(free_throw(level, rng));
    }

    picked
}

/// Uniform random in-range value, labeled by its closest small fraction
fn free_throw<R: Rng + ?Sized>(level: &LevelDef, rng: &mut R) -> Question {
    let value = level.range.0 + rng.random::<f64>() * level.span();
    let (_, den) = approximate_fraction(value, FREE_THROW_MAX_DEN);
    let mut question = Question::new(
        value,
        to_fraction_label(value, FREE_THROW_MAX_DEN),
        "Free throw",
        if den > 1 { u32::try_from(den).ok() } else { None },
    );
    question.free_throw = true;
    question
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::levels::catalog;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn assert_well_formed(level: &LevelDef, questions: &[Question]) {
        assert_eq!(questions.len(), level.questions, "level {}", level.id);
        for q in questions {
            assert!(level.contains(q.value), "{} outside {:?}", q.value, level.range);
        }
        if questions.iter().all(|q| !q.free_throw) {
            for (i, a) in questions.iter().enumerate() {
                for b in &questions[i + 1..] {
                    assert!((a.value - b.value).abs() >= 1e-4, "duplicate {}", a.value);
                }
            }
        }
    }

    #[test]
    fn test_every_builtin_level_builds() {
        let mut rng = Pcg32::seed_from_u64(2024);
        for level in catalog() {
            for _ in 0..20 {
                let questions = build_questions(&level, &mut rng);
                assert_well_formed(&level, &questions);
            }
        }
    }

    #[test]
    fn test_warmup_uses_curated_pool() {
        let level = &catalog()[0];
        let mut rng = Pcg32::seed_from_u64(1);
        let questions = build_questions(level, &mut rng);
        let mut labels: Vec<_> = questions.iter().map(|q| q.label.clone()).collect();
        labels.sort();
        assert_eq!(labels, ["1/2", "1/4", "1/8", "3/4", "3/8", "7/8"]);
        assert!(questions.iter().all(|q| !q.free_throw));
    }

    #[test]
    fn test_duplicate_generator_falls_back_to_free_throws() {
        let level = LevelDef::new("dup", "Dup", (0.0, 1.0), QuestionKind::Basic).questions(5, 0.05);
        let mut rng = Pcg32::seed_from_u64(3);
        let mut calls = 0;
        let questions = build_questions_with(&level, &mut rng, &[], |_, _| {
            calls += 1;
            Question::new(0.5, "1/2", "always the same", Some(2))
        });
        assert_eq!(calls, QUESTION_RETRY_BUDGET);
        assert_eq!(questions.len(), 5);
        assert_eq!(questions[0].label, "1/2");
        assert!(!questions[0].free_throw);
        assert!(questions[1..].iter().all(|q| q.free_throw && level.contains(q.value)));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let level = LevelDef::new("oor", "Oor", (0.0, 1.0), QuestionKind::Basic).questions(3, 0.05);
        let mut rng = Pcg32::seed_from_u64(9);
        let questions = build_questions_with(&level, &mut rng, &[], |_, _| {
            Question::new(2.5, "5/2", "too far", Some(2))
        });
        assert!(questions.iter().all(|q| q.free_throw && level.contains(q.value)));
    }

    proptest! {
        #[test]
        fn built_sets_are_full_and_in_range(seed in any::<u64>(), index in 0usize..8) {
            let level = catalog().swap_remove(index);
            let mut rng = Pcg32::seed_from_u64(seed);
            let questions = build_questions(&level, &mut rng);
            prop_assert_eq!(questions.len(), level.questions);
            prop_assert!(questions.iter().all(|q| level.contains(q.value)));
        }
    }
}
