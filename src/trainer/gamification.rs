//! XP, levels, streaks, and badges
//!
//! All functions are pure; the review coordinator applies them to the
//! profile inside its transaction.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::models::{Badge, UserProfile};

/// XP awarded for one review at the given quality.
///
/// Deliberately convex: a perfect recall is worth four times a bare pass.
pub fn xp_for_quality(quality: i32) -> i64 {
    match quality {
        5 => 16,
        4 => 12,
        3 => 8,
        2 => 4,
        _ => 1,
    }
}

/// Level for a total XP amount: level L requires xp >= 60 * (L-1)^2.
///
/// Integer arithmetic throughout, so leveling is exact and reproducible.
pub fn level_for_xp(xp: i64) -> i32 {
    let xp = xp.max(0);
    let mut level: i32 = 1;
    while xp >= 60 * i64::from(level) * i64::from(level) {
        level += 1;
    }
    level
}

/// Next streak value given the last active day.
///
/// Same day keeps the streak, the next day extends it, any longer gap
/// starts over at 1. A first-ever review also starts at 1.
pub fn next_streak(current: i32, last_active: Option<NaiveDate>, today: NaiveDate) -> i32 {
    match last_active {
        None => 1,
        Some(last) => match (today - last).num_days() {
            0 => current.max(1),
            1 => current + 1,
            gap if gap > 1 => 1,
            // Day moved backwards (clock skew); leave the streak alone
            _ => current.max(1),
        },
    }
}

/// Badges earned at the given cumulative metrics.
///
/// Idempotent: identical metrics always yield the identical set. The
/// caller unions this into the profile, so a badge once granted is never
/// removed even if metrics later shrink (e.g. after a streak break).
pub fn earned_badges(
    lifetime_attempts: i64,
    lifetime_correct: i64,
    streak: i32,
    xp: i64,
) -> BTreeSet<Badge> {
    let mut badges = BTreeSet::new();
    if lifetime_attempts >= 1 {
        badges.insert(Badge::FirstReview);
    }
    if lifetime_attempts >= 100 {
        badges.insert(Badge::Reviews100);
    }
    if lifetime_correct >= 250 {
        badges.insert(Badge::Correct250);
    }
    if streak >= 3 {
        badges.insert(Badge::Streak3);
    }
    if streak >= 7 {
        badges.insert(Badge::Streak7);
    }
    if streak >= 30 {
        badges.insert(Badge::Streak30);
    }
    if xp >= 500 {
        badges.insert(Badge::Xp500);
    }
    if xp >= 2000 {
        badges.insert(Badge::Xp2000);
    }
    badges
}

/// Fold one committed review into the profile; returns the XP gained.
pub fn apply_review(
    profile: &mut UserProfile,
    quality: i32,
    today: NaiveDate,
    lifetime_attempts: i64,
    lifetime_correct: i64,
) -> i64 {
    let gain = xp_for_quality(quality);
    profile.xp += gain;
    profile.level = level_for_xp(profile.xp);

    profile.streak = next_streak(profile.streak, profile.last_active_date, today);
    profile.longest_streak = profile.longest_streak.max(profile.streak);
    profile.last_active_date = Some(today);

    let earned = earned_badges(lifetime_attempts, lifetime_correct, profile.streak, profile.xp);
    profile.badges.extend(earned);

    gain
}
