//! Data models for the vocabulary trainer

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A vocabulary card: a prompt-side word and its translation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: Uuid,
    /// Word shown to the learner
    pub prompt: String,
    /// Expected translation
    pub answer: String,
    /// Optional usage example
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Card {
    pub fn new(prompt: String, answer: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt,
            answer,
            example: None,
            created_at: Utc::now(),
        }
    }
}

/// Per-card review history and scheduling state (1:1 with Card)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardReviewState {
    pub card_id: Uuid,
    /// Total reviews; always equals correct + wrong
    #[serde(default)]
    pub attempts: i32,
    #[serde(default)]
    pub correct: i32,
    #[serde(default)]
    pub wrong: i32,
    /// Consecutive successful reviews since the last lapse
    #[serde(default)]
    pub repetitions: i32,
    #[serde(default)]
    pub interval_days: i32,
    #[serde(default = "default_ease_factor")]
    pub ease_factor: f32,
    /// Day on/after which the card is eligible for review again
    pub due_date: NaiveDate,
    /// Failing reviews over the card's lifetime
    #[serde(default)]
    pub lapses: i32,
    /// Times the card qualified as a leech; never decreases
    #[serde(default)]
    pub leech_count: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

fn default_ease_factor() -> f32 {
    2.5
}

impl CardReviewState {
    pub fn new(card_id: Uuid, today: NaiveDate) -> Self {
        Self {
            card_id,
            attempts: 0,
            correct: 0,
            wrong: 0,
            repetitions: 0,
            interval_days: 0,
            ease_factor: default_ease_factor(),
            due_date: today,
            lapses: 0,
            leech_count: 0,
            first_reviewed_at: None,
            last_reviewed_at: None,
        }
    }

    /// Check whether the card is due on the given day
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.due_date <= today
    }

    /// Accuracy in percent over all attempts (0 when never reviewed)
    pub fn accuracy(&self) -> f32 {
        if self.attempts == 0 {
            0.0
        } else {
            self.correct as f32 / self.attempts as f32 * 100.0
        }
    }

    /// A card counts as hard once it has been missed often enough and its
    /// accuracy is at or below the configured ceiling
    pub fn is_hard(&self, settings: &ReviewSettings) -> bool {
        if self.attempts == 0 {
            return false;
        }
        if self.wrong < settings.min_wrong_for_hard {
            return false;
        }
        self.accuracy() <= settings.max_accuracy_for_hard as f32
    }
}

/// Tunable review thresholds and daily goals
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSettings {
    #[serde(default = "default_daily_goal_new")]
    pub daily_goal_new: i32,
    #[serde(default = "default_daily_goal_reviews")]
    pub daily_goal_reviews: i32,
    #[serde(default = "default_min_wrong_for_hard")]
    pub min_wrong_for_hard: i32,
    #[serde(default = "default_max_accuracy_for_hard")]
    pub max_accuracy_for_hard: i32,
}

fn default_daily_goal_new() -> i32 {
    20
}

fn default_daily_goal_reviews() -> i32 {
    50
}

fn default_min_wrong_for_hard() -> i32 {
    2
}

fn default_max_accuracy_for_hard() -> i32 {
    70
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            daily_goal_new: default_daily_goal_new(),
            daily_goal_reviews: default_daily_goal_reviews(),
            min_wrong_for_hard: default_min_wrong_for_hard(),
            max_accuracy_for_hard: default_max_accuracy_for_hard(),
        }
    }
}

/// Per-day counters of first-time vs. repeat reviews
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLedgerEntry {
    pub day: NaiveDate,
    #[serde(default)]
    pub new_count: i32,
    #[serde(default)]
    pub review_count: i32,
}

impl DailyLedgerEntry {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day,
            new_count: 0,
            review_count: 0,
        }
    }
}

/// Badges a learner can earn; once granted, never removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Badge {
    FirstReview,
    Reviews100,
    Correct250,
    Streak3,
    Streak7,
    Streak30,
    Xp500,
    Xp2000,
}

/// A learner's gamification record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    #[serde(default)]
    pub xp: i64,
    #[serde(default = "default_level")]
    pub level: i32,
    #[serde(default)]
    pub streak: i32,
    #[serde(default)]
    pub longest_streak: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active_date: Option<NaiveDate>,
    #[serde(default)]
    pub badges: BTreeSet<Badge>,
}

fn default_level() -> i32 {
    1
}

impl UserProfile {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            xp: 0,
            level: default_level(),
            streak: 0,
            longest_streak: 0,
            last_active_date: None,
            badges: BTreeSet::new(),
        }
    }

    /// Zero everything except the identity
    pub fn reset(&mut self) {
        let id = self.id;
        *self = Self::new();
        self.id = id;
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self::new()
    }
}

/// A card paired with its review state, used for listings and sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardWithState {
    pub card: Card,
    pub state: CardReviewState,
}

/// Which cards a listing should include
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardFilter {
    All,
    Due,
    Hard,
}

impl Default for CardFilter {
    fn default() -> Self {
        Self::All
    }
}

/// Aggregates over the whole card set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifetimeTotals {
    pub total_cards: usize,
    pub total_correct: i64,
    pub total_wrong: i64,
    pub due_today: usize,
}

/// Everything the dashboard view needs in one read
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub settings: ReviewSettings,
    pub profile: UserProfile,
    pub totals: LifetimeTotals,
    pub today: DailyLedgerEntry,
    pub hard_count: usize,
    /// Most recent seven ledger entries, oldest first
    pub trend: Vec<DailyLedgerEntry>,
}

/// Result of one committed review submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub ok: bool,
    /// Quality rating that was applied (after legacy mapping)
    pub quality: i32,
    pub xp_gain: i64,
}

/// Summary returned by a word-list import
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub inserted: usize,
    pub parsed: usize,
}
