//! Spaced-repetition scheduling
//!
//! SM-2 style state transition for one review: the previous
//! (repetitions, interval, ease factor, lapses) tuple and a quality rating
//! produce the next tuple.
//!
//! Quality ratings (0-5):
//! - 0: Complete blackout, no recall
//! - 1: Incorrect, but upon seeing answer, remembered
//! - 2: Incorrect, but answer seemed easy to recall
//! - 3: Correct response with serious difficulty
//! - 4: Correct response after hesitation
//! - 5: Perfect response with no hesitation

use thiserror::Error;

use super::models::CardReviewState;

/// Minimum ease factor allowed
pub const MIN_EASE_FACTOR: f32 = 1.3;

/// Lapse count at which a failing review marks the card as a leech
pub const LEECH_LAPSE_THRESHOLD: i32 = 4;

/// Quality ratings below this count as a lapse
pub const PASS_QUALITY: i32 = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("quality rating out of range: {0} (expected 0-5)")]
pub struct InvalidQuality(pub i32);

/// Result of calculating the next review
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewResult {
    pub repetitions: i32,
    pub interval_days: i32,
    pub ease_factor: f32,
    pub lapses: i32,
}

/// Calculate the next scheduling state for a card.
///
/// Fails with [`InvalidQuality`] for ratings outside 0-5 before reading
/// any state. Pure and deterministic; callers own all side effects.
pub fn calculate_next_review(
    state: &CardReviewState,
    quality: i32,
) -> Result<ReviewResult, InvalidQuality> {
    if !(0..=5).contains(&quality) {
        return Err(InvalidQuality(quality));
    }

    let mut repetitions = state.repetitions;
    let mut interval = state.interval_days;
    let mut ease_factor = state.ease_factor;
    let mut lapses = state.lapses;

    if quality >= PASS_QUALITY {
        repetitions += 1;
        interval = match repetitions {
            1 => 1,
            2 => 3,
            _ => {
                // Better recall grows the interval faster: quality 5 adds
                // 30% on top of the ease multiplier, quality 3 is neutral.
                let boost = 1.0 + (quality - PASS_QUALITY) as f32 * 0.15;
                ((interval as f32 * ease_factor * boost).round() as i32).max(1)
            }
        };

        // EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02))
        ease_factor = ease_factor
            + (0.1 - (5 - quality) as f32 * (0.08 + (5 - quality) as f32 * 0.02));
        ease_factor = ease_factor.max(MIN_EASE_FACTOR);
    } else {
        // Lapse: back to the start of the ladder
        repetitions = 0;
        interval = 1;
        ease_factor = (ease_factor - 0.2).max(MIN_EASE_FACTOR);
        lapses += 1;
    }

    Ok(ReviewResult {
        repetitions,
        interval_days: interval,
        ease_factor,
        lapses,
    })
}

/// Map the legacy boolean submission to a quality rating
pub fn quality_from_correct(correct: bool) -> i32 {
    if correct {
        4
    } else {
        1
    }
}

/// Whether a failing review turns the card into a leech.
///
/// Only outright failures count (quality below 2), and only once the
/// card's lapse count has reached the threshold. Each qualifying review
/// bumps the leech count by exactly one.
pub fn is_leech_lapse(quality: i32, lapses_after: i32) -> bool {
    quality < 2 && lapses_after >= LEECH_LAPSE_THRESHOLD
}
