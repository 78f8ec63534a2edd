//! Storage and the review transaction coordinator
//!
//! Directory layout under the data dir:
//! ```text
//! szokincs/
//! ├── cards/
//! │   └── {card-id}.json     # Individual card files
//! ├── states/
//! │   └── {card-id}.json     # Per-card review state
//! ├── profiles/
//! │   └── {profile-id}.json  # Learner profiles
//! ├── ledger.json            # Per-day review counters
//! └── settings.json          # Review thresholds and goals
//! ```
//!
//! Review submissions run as one transaction: the card's state lock
//! serializes reviews of the same card, the profile lock serializes the
//! gamification update, and the commit either lands every change or none.
//! Lock order is fixed: card state, then tally, then ledger, then profile.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Local, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use uuid::Uuid;

use super::algorithm::{self, InvalidQuality, PASS_QUALITY};
use super::gamification;
use super::models::*;

/// Upper bound on any single lock acquisition inside a review transaction
pub const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum TrainerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    InvalidQuality(#[from] InvalidQuality),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("card not found: {0}")]
    CardNotFound(Uuid),

    #[error("profile not found: {0}")]
    ProfileNotFound(Uuid),

    #[error("lock acquisition timed out")]
    LockTimeout,

    #[error("data directory not found")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, TrainerError>;

/// Lifetime attempt/correct counters, rebuilt from the card states at
/// open time and advanced inside each review transaction. Never persisted;
/// the states are the source of truth.
#[derive(Debug, Clone, Default)]
struct ReviewTally {
    attempts: i64,
    correct: i64,
}

/// Store for cards, review states, the daily ledger, and learner profiles
pub struct TrainerStore {
    data_dir: PathBuf,
    cards: RwLock<HashMap<Uuid, Card>>,
    states: RwLock<HashMap<Uuid, Arc<Mutex<CardReviewState>>>>,
    tally: Mutex<ReviewTally>,
    ledger: Mutex<BTreeMap<NaiveDate, DailyLedgerEntry>>,
    profiles: RwLock<HashMap<Uuid, Arc<Mutex<UserProfile>>>>,
    default_profile: Uuid,
    settings: RwLock<ReviewSettings>,
}

impl TrainerStore {
    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("szokincs"))
            .ok_or(TrainerError::DataDirNotFound)
    }

    /// Open (or initialize) a store at the given data directory
    pub fn open(data_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(data_dir.join("cards"))?;
        fs::create_dir_all(data_dir.join("states"))?;
        fs::create_dir_all(data_dir.join("profiles"))?;

        let today = Local::now().date_naive();

        let mut cards = HashMap::new();
        for entry in fs::read_dir(data_dir.join("cards"))? {
            let path = entry?.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                let card: Card = serde_json::from_str(&fs::read_to_string(&path)?)?;
                cards.insert(card.id, card);
            }
        }

        let mut states = HashMap::new();
        for entry in fs::read_dir(data_dir.join("states"))? {
            let path = entry?.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                let state: CardReviewState =
                    serde_json::from_str(&fs::read_to_string(&path)?)?;
                states.insert(state.card_id, state);
            }
        }
        // Every card gets a state, even if its file went missing
        for id in cards.keys() {
            if !states.contains_key(id) {
                let state = CardReviewState::new(*id, today);
                write_json(&state_path(&data_dir, *id), &state)?;
                states.insert(*id, state);
            }
        }

        let mut tally = ReviewTally::default();
        for state in states.values() {
            tally.attempts += i64::from(state.attempts);
            tally.correct += i64::from(state.correct);
        }

        let ledger_file = data_dir.join("ledger.json");
        let ledger: BTreeMap<NaiveDate, DailyLedgerEntry> = if ledger_file.exists() {
            let entries: Vec<DailyLedgerEntry> =
                serde_json::from_str(&fs::read_to_string(&ledger_file)?)?;
            entries.into_iter().map(|e| (e.day, e)).collect()
        } else {
            BTreeMap::new()
        };

        let mut profiles = HashMap::new();
        for entry in fs::read_dir(data_dir.join("profiles"))? {
            let path = entry?.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                let profile: UserProfile =
                    serde_json::from_str(&fs::read_to_string(&path)?)?;
                profiles.insert(profile.id, profile);
            }
        }
        let default_profile = match profiles.keys().min().copied() {
            Some(id) => id,
            None => {
                let profile = UserProfile::new();
                write_json(&profile_path(&data_dir, profile.id), &profile)?;
                let id = profile.id;
                profiles.insert(id, profile);
                id
            }
        };

        let settings_file = data_dir.join("settings.json");
        let settings: ReviewSettings = if settings_file.exists() {
            serde_json::from_str(&fs::read_to_string(&settings_file)?)?
        } else {
            let settings = ReviewSettings::default();
            write_json(&settings_file, &settings)?;
            settings
        };

        Ok(Self {
            data_dir,
            cards: RwLock::new(cards),
            states: RwLock::new(
                states
                    .into_iter()
                    .map(|(id, s)| (id, Arc::new(Mutex::new(s))))
                    .collect(),
            ),
            tally: Mutex::new(tally),
            ledger: Mutex::new(ledger),
            profiles: RwLock::new(
                profiles
                    .into_iter()
                    .map(|(id, p)| (id, Arc::new(Mutex::new(p))))
                    .collect(),
            ),
            default_profile,
            settings: RwLock::new(settings),
        })
    }

    /// Profile used by the binaries when none is specified
    pub fn default_profile_id(&self) -> Uuid {
        self.default_profile
    }

    pub async fn card_count(&self) -> usize {
        self.cards.read().await.len()
    }

    // ==================== Review Coordinator ====================

    /// Submit one review for a card on behalf of a profile.
    ///
    /// Not idempotent: resubmitting the same event counts a second attempt
    /// and advances the schedule again, so callers must not auto-retry.
    pub async fn submit_review(
        &self,
        profile_id: Uuid,
        card_id: Uuid,
        quality: i32,
    ) -> Result<ReviewOutcome> {
        self.submit_review_on(profile_id, card_id, quality, Local::now().date_naive())
            .await
    }

    /// Review submission pinned to an explicit calendar day
    pub async fn submit_review_on(
        &self,
        profile_id: Uuid,
        card_id: Uuid,
        quality: i32,
        today: NaiveDate,
    ) -> Result<ReviewOutcome> {
        // Validation happens before any lock: no partial state on bad input
        if !(0..=5).contains(&quality) {
            return Err(InvalidQuality(quality).into());
        }

        let state_arc = self
            .states
            .read()
            .await
            .get(&card_id)
            .cloned()
            .ok_or(TrainerError::CardNotFound(card_id))?;
        let profile_arc = self
            .profiles
            .read()
            .await
            .get(&profile_id)
            .cloned()
            .ok_or(TrainerError::ProfileNotFound(profile_id))?;

        let mut state = timeout(LOCK_TIMEOUT, state_arc.lock())
            .await
            .map_err(|_| TrainerError::LockTimeout)?;
        let prev_state = state.clone();

        let next = algorithm::calculate_next_review(&state, quality)?;
        let now = Utc::now();
        let first_review = state.first_reviewed_at.is_none();

        state.attempts += 1;
        if quality >= PASS_QUALITY {
            state.correct += 1;
        } else {
            state.wrong += 1;
        }
        if next.lapses > state.lapses && algorithm::is_leech_lapse(quality, next.lapses) {
            state.leech_count += 1;
        }
        state.repetitions = next.repetitions;
        state.interval_days = next.interval_days;
        state.ease_factor = next.ease_factor;
        state.lapses = next.lapses;
        state.due_date = today + ChronoDuration::days(i64::from(next.interval_days));
        if first_review {
            state.first_reviewed_at = Some(now);
        }
        state.last_reviewed_at = Some(now);

        let mut tally = timeout(LOCK_TIMEOUT, self.tally.lock())
            .await
            .map_err(|_| TrainerError::LockTimeout)?;
        let prev_tally = tally.clone();
        tally.attempts += 1;
        if quality >= PASS_QUALITY {
            tally.correct += 1;
        }

        let mut ledger = timeout(LOCK_TIMEOUT, self.ledger.lock())
            .await
            .map_err(|_| TrainerError::LockTimeout)?;
        let prev_entry = ledger.get(&today).cloned();
        let entry = ledger
            .entry(today)
            .or_insert_with(|| DailyLedgerEntry::new(today));
        entry.review_count += 1;
        if first_review {
            entry.new_count += 1;
        }

        let mut profile = timeout(LOCK_TIMEOUT, profile_arc.lock())
            .await
            .map_err(|_| TrainerError::LockTimeout)?;
        let prev_profile = profile.clone();
        let xp_gain =
            gamification::apply_review(&mut profile, quality, today, tally.attempts, tally.correct);

        if let Err(err) = self.persist_review(&state, &ledger, &profile) {
            log::warn!("review commit failed, rolling back: {}", err);
            // Best-effort restore of any file written before the failure
            let _ = write_json(&state_path(&self.data_dir, card_id), &prev_state);
            let mut restored = ledger.clone();
            match prev_entry {
                Some(e) => {
                    restored.insert(today, e.clone());
                    ledger.insert(today, e);
                }
                None => {
                    restored.remove(&today);
                    ledger.remove(&today);
                }
            }
            let _ = write_ledger(&self.data_dir, &restored);
            *state = prev_state;
            *tally = prev_tally;
            *profile = prev_profile;
            return Err(err);
        }

        Ok(ReviewOutcome {
            ok: true,
            quality,
            xp_gain,
        })
    }

    fn persist_review(
        &self,
        state: &CardReviewState,
        ledger: &BTreeMap<NaiveDate, DailyLedgerEntry>,
        profile: &UserProfile,
    ) -> Result<()> {
        write_json(&state_path(&self.data_dir, state.card_id), state)?;
        write_ledger(&self.data_dir, ledger)?;
        write_json(&profile_path(&self.data_dir, profile.id), profile)?;
        Ok(())
    }

    // ==================== Queries ====================

    /// List cards with their states, filtered and ordered for practice.
    ///
    /// Due listings come oldest-due first; everything else is ordered by
    /// error count so problem words surface at the top.
    pub async fn list_cards(&self, filter: CardFilter, limit: usize) -> Result<Vec<CardWithState>> {
        let today = Local::now().date_naive();
        let settings = self.settings.read().await.clone();
        let mut entries = self.snapshot().await;

        entries.retain(|entry| match filter {
            CardFilter::All => true,
            CardFilter::Due => entry.state.is_due(today),
            CardFilter::Hard => entry.state.is_hard(&settings),
        });

        match filter {
            CardFilter::Due => entries.sort_by(|a, b| {
                a.state
                    .due_date
                    .cmp(&b.state.due_date)
                    .then(b.state.wrong.cmp(&a.state.wrong))
                    .then(a.card.id.cmp(&b.card.id))
            }),
            _ => entries.sort_by(|a, b| {
                b.state
                    .wrong
                    .cmp(&a.state.wrong)
                    .then(a.card.id.cmp(&b.card.id))
            }),
        }

        entries.truncate(limit);
        Ok(entries)
    }

    /// Cards the learner keeps missing: leeches first, then by error count
    pub async fn mistakes(&self, limit: usize) -> Result<Vec<CardWithState>> {
        let mut entries = self.snapshot().await;
        entries.retain(|entry| entry.state.wrong > 0);
        entries.sort_by(|a, b| {
            b.state
                .leech_count
                .cmp(&a.state.leech_count)
                .then(b.state.wrong.cmp(&a.state.wrong))
                .then(b.state.attempts.cmp(&a.state.attempts))
                .then(a.card.id.cmp(&b.card.id))
        });
        entries.truncate(limit);
        Ok(entries)
    }

    /// Everything the dashboard shows, in one read
    pub async fn dashboard(&self, profile_id: Uuid) -> Result<Dashboard> {
        let today = Local::now().date_naive();
        let settings = self.settings.read().await.clone();
        let entries = self.snapshot().await;

        let mut totals = LifetimeTotals {
            total_cards: entries.len(),
            ..Default::default()
        };
        let mut hard_count = 0;
        for entry in &entries {
            totals.total_correct += i64::from(entry.state.correct);
            totals.total_wrong += i64::from(entry.state.wrong);
            if entry.state.is_due(today) {
                totals.due_today += 1;
            }
            if entry.state.is_hard(&settings) {
                hard_count += 1;
            }
        }

        let profile_arc = self
            .profiles
            .read()
            .await
            .get(&profile_id)
            .cloned()
            .ok_or(TrainerError::ProfileNotFound(profile_id))?;
        let profile = profile_arc.lock().await.clone();

        let ledger = self.ledger.lock().await;
        let today_entry = ledger
            .get(&today)
            .cloned()
            .unwrap_or_else(|| DailyLedgerEntry::new(today));
        let mut trend: Vec<DailyLedgerEntry> =
            ledger.values().rev().take(7).cloned().collect();
        trend.reverse();

        Ok(Dashboard {
            settings,
            profile,
            totals,
            today: today_entry,
            hard_count,
            trend,
        })
    }

    async fn snapshot(&self) -> Vec<CardWithState> {
        let cards = self.cards.read().await;
        let states = self.states.read().await;
        let mut entries = Vec::with_capacity(cards.len());
        for (id, card) in cards.iter() {
            if let Some(state_arc) = states.get(id) {
                let state = state_arc.lock().await.clone();
                entries.push(CardWithState {
                    card: card.clone(),
                    state,
                });
            }
        }
        entries
    }

    // ==================== Settings ====================

    pub async fn settings(&self) -> ReviewSettings {
        self.settings.read().await.clone()
    }

    pub async fn update_settings(&self, new: ReviewSettings) -> Result<ReviewSettings> {
        if new.daily_goal_new < 0 || new.daily_goal_reviews < 0 || new.min_wrong_for_hard < 0 {
            return Err(TrainerError::InvalidInput(
                "goals and thresholds must not be negative".to_string(),
            ));
        }
        if !(0..=100).contains(&new.max_accuracy_for_hard) {
            return Err(TrainerError::InvalidInput(
                "accuracy ceiling must be 0-100".to_string(),
            ));
        }

        let mut settings = self.settings.write().await;
        write_json(&self.data_dir.join("settings.json"), &new)?;
        *settings = new.clone();
        Ok(new)
    }

    // ==================== Import ====================

    /// Import semicolon-separated `prompt;answer` lines.
    ///
    /// Invalid lines are skipped, already-known pairs are left untouched,
    /// and every inserted card gets a fresh review state.
    pub async fn import_text(&self, text: &str) -> Result<ImportSummary> {
        let parsed = parse_word_pairs(text);
        let parsed_count = parsed.len();
        if parsed_count == 0 {
            return Err(TrainerError::InvalidInput(
                "no valid word pairs found".to_string(),
            ));
        }

        let today = Local::now().date_naive();
        let mut cards = self.cards.write().await;
        let mut states = self.states.write().await;

        let mut known: std::collections::HashSet<(String, String)> = cards
            .values()
            .map(|c| (c.prompt.clone(), c.answer.clone()))
            .collect();

        let mut inserted = 0;
        for (prompt, answer) in parsed {
            if !known.insert((prompt.clone(), answer.clone())) {
                continue;
            }
            let card = Card::new(prompt, answer);
            let state = CardReviewState::new(card.id, today);
            write_json(&card_path(&self.data_dir, card.id), &card)?;
            write_json(&state_path(&self.data_dir, card.id), &state)?;
            states.insert(card.id, Arc::new(Mutex::new(state)));
            cards.insert(card.id, card);
            inserted += 1;
        }

        log::info!("imported {} new cards ({} parsed)", inserted, parsed_count);
        Ok(ImportSummary {
            inserted,
            parsed: parsed_count,
        })
    }

    // ==================== Reset ====================

    /// Zero all review state, clear the ledger, and reset profiles
    pub async fn reset(&self) -> Result<()> {
        let today = Local::now().date_naive();

        let states = self.states.read().await;
        for (id, state_arc) in states.iter() {
            let mut state = timeout(LOCK_TIMEOUT, state_arc.lock())
                .await
                .map_err(|_| TrainerError::LockTimeout)?;
            *state = CardReviewState::new(*id, today);
            write_json(&state_path(&self.data_dir, *id), &*state)?;
        }

        let mut tally = timeout(LOCK_TIMEOUT, self.tally.lock())
            .await
            .map_err(|_| TrainerError::LockTimeout)?;
        *tally = ReviewTally::default();

        let mut ledger = timeout(LOCK_TIMEOUT, self.ledger.lock())
            .await
            .map_err(|_| TrainerError::LockTimeout)?;
        ledger.clear();
        write_ledger(&self.data_dir, &ledger)?;

        let profiles = self.profiles.read().await;
        for profile_arc in profiles.values() {
            let mut profile = timeout(LOCK_TIMEOUT, profile_arc.lock())
                .await
                .map_err(|_| TrainerError::LockTimeout)?;
            profile.reset();
            write_json(&profile_path(&self.data_dir, profile.id), &*profile)?;
        }

        log::info!("progress reset: all states, ledger, and profiles cleared");
        Ok(())
    }
}

/// Parse `prompt;answer` lines; the answer keeps any further semicolons
pub fn parse_word_pairs(text: &str) -> Vec<(String, String)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut pairs = Vec::new();
    for record in reader.records().flatten() {
        if record.len() < 2 {
            continue;
        }
        let prompt = record.get(0).unwrap_or("").trim();
        // everything after the first separator is the answer, semicolons kept
        let answer = record.iter().skip(1).collect::<Vec<_>>().join(";");
        let answer = answer.trim();
        if !prompt.is_empty() && !answer.is_empty() {
            pairs.push((prompt.to_string(), answer.to_string()));
        }
    }
    pairs
}

fn card_path(data_dir: &Path, id: Uuid) -> PathBuf {
    data_dir.join("cards").join(format!("{}.json", id))
}

fn state_path(data_dir: &Path, id: Uuid) -> PathBuf {
    data_dir.join("states").join(format!("{}.json", id))
}

fn profile_path(data_dir: &Path, id: Uuid) -> PathBuf {
    data_dir.join("profiles").join(format!("{}.json", id))
}

fn write_ledger(data_dir: &Path, ledger: &BTreeMap<NaiveDate, DailyLedgerEntry>) -> Result<()> {
    let entries: Vec<&DailyLedgerEntry> = ledger.values().collect();
    write_json(&data_dir.join("ledger.json"), &entries)
}

/// Write pretty JSON through a temp file so a crash never leaves a
/// half-written entity behind
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_with_words(words: &str) -> (TempDir, TrainerStore) {
        let dir = TempDir::new().unwrap();
        let store = TrainerStore::open(dir.path().to_path_buf()).unwrap();
        store.import_text(words).await.unwrap();
        (dir, store)
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    #[test]
    fn test_parse_word_pairs() {
        let pairs = parse_word_pairs("apple;alma\n\n;\nbroken line\npear ; körte \n");
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("apple".to_string(), "alma".to_string()));
        assert_eq!(pairs[1], ("pear".to_string(), "körte".to_string()));
    }

    #[test]
    fn test_parse_keeps_semicolons_in_answer() {
        let pairs = parse_word_pairs("run;fut; szalad");
        assert_eq!(pairs, vec![("run".to_string(), "fut; szalad".to_string())]);
    }

    #[tokio::test]
    async fn test_import_skips_duplicates() {
        let (_dir, store) = open_with_words("apple;alma\npear;körte").await;

        let summary = store.import_text("apple;alma\ngrape;szőlő").await.unwrap();
        assert_eq!(summary.parsed, 2);
        assert_eq!(summary.inserted, 1);
        assert_eq!(store.card_count().await, 3);
    }

    #[tokio::test]
    async fn test_import_rejects_empty_input() {
        let dir = TempDir::new().unwrap();
        let store = TrainerStore::open(dir.path().to_path_buf()).unwrap();
        assert!(matches!(
            store.import_text("no separator here").await,
            Err(TrainerError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_review_updates_state_and_ledger() {
        let (_dir, store) = open_with_words("apple;alma").await;
        let profile_id = store.default_profile_id();
        let card_id = store.list_cards(CardFilter::All, 10).await.unwrap()[0].card.id;

        let outcome = store
            .submit_review_on(profile_id, card_id, 5, today())
            .await
            .unwrap();
        assert!(outcome.ok);
        assert_eq!(outcome.quality, 5);
        assert_eq!(outcome.xp_gain, 16);

        let entry = &store.list_cards(CardFilter::All, 10).await.unwrap()[0];
        assert_eq!(entry.state.attempts, 1);
        assert_eq!(entry.state.correct, 1);
        assert_eq!(entry.state.repetitions, 1);
        assert_eq!(entry.state.interval_days, 1);
        assert_eq!(entry.state.due_date, today() + ChronoDuration::days(1));
        assert!(entry.state.first_reviewed_at.is_some());

        let dashboard = store.dashboard(profile_id).await.unwrap();
        assert_eq!(dashboard.today.review_count, 1);
        assert_eq!(dashboard.today.new_count, 1);
        assert_eq!(dashboard.profile.xp, 16);
        assert_eq!(dashboard.profile.streak, 1);
        assert!(dashboard.profile.badges.contains(&Badge::FirstReview));
    }

    #[tokio::test]
    async fn test_second_review_is_not_new() {
        let (_dir, store) = open_with_words("apple;alma").await;
        let profile_id = store.default_profile_id();
        let card_id = store.list_cards(CardFilter::All, 10).await.unwrap()[0].card.id;

        store
            .submit_review_on(profile_id, card_id, 4, today())
            .await
            .unwrap();
        store
            .submit_review_on(profile_id, card_id, 4, today())
            .await
            .unwrap();

        let dashboard = store.dashboard(profile_id).await.unwrap();
        assert_eq!(dashboard.today.review_count, 2);
        assert_eq!(dashboard.today.new_count, 1);
    }

    #[tokio::test]
    async fn test_invalid_quality_leaves_no_trace() {
        let (_dir, store) = open_with_words("apple;alma").await;
        let profile_id = store.default_profile_id();
        let card_id = store.list_cards(CardFilter::All, 10).await.unwrap()[0].card.id;

        let err = store
            .submit_review_on(profile_id, card_id, 9, today())
            .await
            .unwrap_err();
        assert!(matches!(err, TrainerError::InvalidQuality(_)));

        let entry = &store.list_cards(CardFilter::All, 10).await.unwrap()[0];
        assert_eq!(entry.state.attempts, 0);
        let dashboard = store.dashboard(profile_id).await.unwrap();
        assert_eq!(dashboard.today.review_count, 0);
        assert_eq!(dashboard.profile.xp, 0);
    }

    #[tokio::test]
    async fn test_unknown_card_is_not_found() {
        let (_dir, store) = open_with_words("apple;alma").await;
        let err = store
            .submit_review_on(store.default_profile_id(), Uuid::new_v4(), 4, today())
            .await
            .unwrap_err();
        assert!(matches!(err, TrainerError::CardNotFound(_)));
    }

    #[tokio::test]
    async fn test_leech_counting() {
        let (_dir, store) = open_with_words("apple;alma").await;
        let profile_id = store.default_profile_id();
        let card_id = store.list_cards(CardFilter::All, 10).await.unwrap()[0].card.id;

        // three hard failures: lapses climb but no leech yet
        for _ in 0..3 {
            store
                .submit_review_on(profile_id, card_id, 0, today())
                .await
                .unwrap();
        }
        let state = &store.list_cards(CardFilter::All, 10).await.unwrap()[0].state;
        assert_eq!(state.lapses, 3);
        assert_eq!(state.leech_count, 0);

        // the fourth failure crosses the threshold, the fifth counts again
        store
            .submit_review_on(profile_id, card_id, 0, today())
            .await
            .unwrap();
        store
            .submit_review_on(profile_id, card_id, 1, today())
            .await
            .unwrap();
        let state = &store.list_cards(CardFilter::All, 10).await.unwrap()[0].state;
        assert_eq!(state.lapses, 5);
        assert_eq!(state.leech_count, 2);

        // a soft lapse (quality 2) adds a lapse but never a leech
        store
            .submit_review_on(profile_id, card_id, 2, today())
            .await
            .unwrap();
        let state = &store.list_cards(CardFilter::All, 10).await.unwrap()[0].state;
        assert_eq!(state.lapses, 6);
        assert_eq!(state.leech_count, 2);
    }

    #[tokio::test]
    async fn test_due_listing_and_ordering() {
        let (_dir, store) = open_with_words("a;1\nb;2\nc;3").await;
        let profile_id = store.default_profile_id();

        // push one card into the future; the other two stay due today
        let all = store.list_cards(CardFilter::All, 10).await.unwrap();
        store
            .submit_review_on(profile_id, all[0].card.id, 5, today())
            .await
            .unwrap();

        let due = store.list_cards(CardFilter::Due, 10).await.unwrap();
        assert_eq!(due.len(), 2);
        assert!(due.iter().all(|e| e.card.id != all[0].card.id));
    }

    #[tokio::test]
    async fn test_hard_listing_uses_settings() {
        let (_dir, store) = open_with_words("a;1\nb;2").await;
        let profile_id = store.default_profile_id();
        let all = store.list_cards(CardFilter::All, 10).await.unwrap();

        // two misses and a pass: accuracy 33% under the default 70% ceiling
        for quality in [1, 1, 4] {
            store
                .submit_review_on(profile_id, all[0].card.id, quality, today())
                .await
                .unwrap();
        }

        let hard = store.list_cards(CardFilter::Hard, 10).await.unwrap();
        assert_eq!(hard.len(), 1);
        assert_eq!(hard[0].card.id, all[0].card.id);
    }

    #[tokio::test]
    async fn test_mistakes_ordering() {
        let (_dir, store) = open_with_words("a;1\nb;2\nc;3").await;
        let profile_id = store.default_profile_id();
        let all = store.list_cards(CardFilter::All, 10).await.unwrap();

        // card 0: one miss; card 1: four hard failures -> a leech
        store
            .submit_review_on(profile_id, all[0].card.id, 1, today())
            .await
            .unwrap();
        for _ in 0..4 {
            store
                .submit_review_on(profile_id, all[1].card.id, 0, today())
                .await
                .unwrap();
        }

        let mistakes = store.mistakes(10).await.unwrap();
        assert_eq!(mistakes.len(), 2);
        assert_eq!(mistakes[0].card.id, all[1].card.id);
        assert_eq!(mistakes[0].state.leech_count, 1);
        assert_eq!(mistakes[1].card.id, all[0].card.id);
    }

    #[tokio::test]
    async fn test_settings_roundtrip_and_validation() {
        let (_dir, store) = open_with_words("a;1").await;

        let mut settings = store.settings().await;
        settings.daily_goal_new = 5;
        settings.max_accuracy_for_hard = 50;
        store.update_settings(settings).await.unwrap();

        let reloaded = store.settings().await;
        assert_eq!(reloaded.daily_goal_new, 5);
        assert_eq!(reloaded.max_accuracy_for_hard, 50);

        let mut bad = reloaded.clone();
        bad.max_accuracy_for_hard = 150;
        assert!(matches!(
            store.update_settings(bad).await,
            Err(TrainerError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let (_dir, store) = open_with_words("a;1\nb;2").await;
        let profile_id = store.default_profile_id();
        let all = store.list_cards(CardFilter::All, 10).await.unwrap();
        for entry in &all {
            store
                .submit_review_on(profile_id, entry.card.id, 5, today())
                .await
                .unwrap();
        }

        store.reset().await.unwrap();

        let entry = &store.list_cards(CardFilter::All, 10).await.unwrap()[0];
        assert_eq!(entry.state.attempts, 0);
        assert_eq!(entry.state.interval_days, 0);
        assert!(entry.state.first_reviewed_at.is_none());

        let dashboard = store.dashboard(profile_id).await.unwrap();
        assert_eq!(dashboard.profile.xp, 0);
        assert_eq!(dashboard.today.review_count, 0);
        assert!(dashboard.trend.is_empty());
        // cards themselves survive a reset
        assert_eq!(dashboard.totals.total_cards, 2);
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let profile_id;
        let card_id;
        {
            let store = TrainerStore::open(dir.path().to_path_buf()).unwrap();
            store.import_text("apple;alma").await.unwrap();
            profile_id = store.default_profile_id();
            card_id = store.list_cards(CardFilter::All, 10).await.unwrap()[0].card.id;
            store
                .submit_review_on(profile_id, card_id, 5, today())
                .await
                .unwrap();
        }

        let store = TrainerStore::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(store.default_profile_id(), profile_id);
        let entry = &store.list_cards(CardFilter::All, 10).await.unwrap()[0];
        assert_eq!(entry.card.id, card_id);
        assert_eq!(entry.state.attempts, 1);

        let dashboard = store.dashboard(profile_id).await.unwrap();
        assert_eq!(dashboard.profile.xp, 16);
        assert_eq!(dashboard.today.review_count, 1);
    }

    #[tokio::test]
    async fn test_concurrent_reviews_of_distinct_cards() {
        let (_dir, store) = open_with_words("a;1\nb;2").await;
        let store = Arc::new(store);
        let profile_id = store.default_profile_id();
        let all = store.list_cards(CardFilter::All, 10).await.unwrap();

        let s1 = Arc::clone(&store);
        let s2 = Arc::clone(&store);
        let (id1, id2) = (all[0].card.id, all[1].card.id);
        let (r1, r2) = tokio::join!(
            tokio::spawn(async move { s1.submit_review_on(profile_id, id1, 4, today()).await }),
            tokio::spawn(async move { s2.submit_review_on(profile_id, id2, 3, today()).await }),
        );
        assert!(r1.unwrap().is_ok());
        assert!(r2.unwrap().is_ok());

        let dashboard = store.dashboard(profile_id).await.unwrap();
        assert_eq!(dashboard.today.review_count, 2);
    }

    #[tokio::test]
    async fn test_concurrent_reviews_of_same_card_serialize() {
        let (_dir, store) = open_with_words("a;1").await;
        let store = Arc::new(store);
        let profile_id = store.default_profile_id();
        let card_id = store.list_cards(CardFilter::All, 10).await.unwrap()[0].card.id;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let s = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                s.submit_review_on(profile_id, card_id, 4, today()).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // no lost updates: every submission counted exactly once
        let state = &store.list_cards(CardFilter::All, 10).await.unwrap()[0].state;
        assert_eq!(state.attempts, 8);
        assert_eq!(state.correct, 8);
        let dashboard = store.dashboard(profile_id).await.unwrap();
        assert_eq!(dashboard.profile.xp, 8 * 12);
    }
}
