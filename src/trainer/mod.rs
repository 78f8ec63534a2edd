//! Vocabulary trainer engine
//!
//! This module provides:
//! - SM-2 style spaced repetition scheduling
//! - Per-card review history with hard-card and leech detection
//! - Daily progress ledger and gamification (XP, levels, streaks, badges)
//! - A transactional review coordinator over file-backed storage
//! - Weighted practice-queue building for drill sessions

pub mod algorithm;
pub mod gamification;
pub mod models;
pub mod session;
pub mod storage;

pub use models::*;
pub use session::PracticeQueue;
pub use storage::{TrainerError, TrainerStore};
