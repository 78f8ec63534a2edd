//! Practice session queue
//!
//! Builds a bounded, shuffled practice queue biased toward error-prone and
//! leeched cards, and reinserts missed cards a couple of positions ahead so
//! they come back within the same sitting. This near-term repetition is
//! separate from the scheduler's long-horizon intervals.

use rand::Rng;

use super::models::{Card, CardReviewState, CardWithState};

/// Cap on the error-derived part of a card's sampling weight
pub const WEIGHT_CAP: i32 = 4;

/// How many positions ahead a missed card is reinserted
const RETRY_OFFSET: usize = 2;

/// Sampling weight for a card: every card gets one base share, mistakes
/// and leeches add up to [`WEIGHT_CAP`] more
pub fn practice_weight(state: &CardReviewState) -> i32 {
    1 + (state.wrong + state.leech_count * 2).min(WEIGHT_CAP)
}

/// A practice queue for one sitting
#[derive(Debug, Clone)]
pub struct PracticeQueue {
    cards: Vec<Card>,
    index: usize,
}

impl PracticeQueue {
    /// Draw up to `length` cards from the pool, weighted by error history.
    ///
    /// Each card contributes `practice_weight` virtual copies; draws use
    /// cumulative-weight selection with per-draw decrement, which matches
    /// shuffling the replicated pool and truncating it, without ever
    /// materializing the copies.
    pub fn build(pool: &[CardWithState], length: usize, rng: &mut impl Rng) -> Self {
        let mut weights: Vec<i64> = pool
            .iter()
            .map(|entry| i64::from(practice_weight(&entry.state)))
            .collect();
        let mut total: i64 = weights.iter().sum();

        let mut cards = Vec::with_capacity(length.min(total as usize));
        while cards.len() < length && total > 0 {
            let mut roll = rng.gen_range(0..total);
            for (i, weight) in weights.iter_mut().enumerate() {
                if roll < *weight {
                    *weight -= 1;
                    total -= 1;
                    cards.push(pool[i].card.clone());
                    break;
                }
                roll -= *weight;
            }
        }

        Self { cards, index: 0 }
    }

    /// Card currently up for practice, if the sitting is not finished
    pub fn current(&self) -> Option<&Card> {
        self.cards.get(self.index)
    }

    /// Move past the current card
    pub fn advance(&mut self) {
        if self.index < self.cards.len() {
            self.index += 1;
        }
    }

    /// Requeue the current card a couple of positions ahead (or at the end
    /// when the queue is shorter), so a miss is retried this sitting
    pub fn retry_current(&mut self) {
        if let Some(card) = self.current().cloned() {
            let pos = (self.index + RETRY_OFFSET).min(self.cards.len());
            self.cards.insert(pos, card);
        }
    }

    /// 1-based position of the current card, for progress display
    pub fn position(&self) -> usize {
        self.index + 1
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.cards.len()
    }
}
