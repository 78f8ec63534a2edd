//! Progress dashboard rendering

use anyhow::Result;

use szokincs::trainer::{Badge, TrainerStore};

fn badge_label(badge: Badge) -> &'static str {
    match badge {
        Badge::FirstReview => "first review",
        Badge::Reviews100 => "100 reviews",
        Badge::Correct250 => "250 correct",
        Badge::Streak3 => "3-day streak",
        Badge::Streak7 => "7-day streak",
        Badge::Streak30 => "30-day streak",
        Badge::Xp500 => "500 xp",
        Badge::Xp2000 => "2000 xp",
    }
}

pub async fn run(store: &TrainerStore) -> Result<()> {
    let dashboard = store.dashboard(store.default_profile_id()).await?;

    println!(
        "Words: {} | due today: {} | hard: {}",
        dashboard.totals.total_cards, dashboard.totals.due_today, dashboard.hard_count
    );
    println!(
        "Lifetime: {} correct, {} wrong",
        dashboard.totals.total_correct, dashboard.totals.total_wrong
    );
    println!(
        "Level {} | {} xp | streak {} (best {})",
        dashboard.profile.level,
        dashboard.profile.xp,
        dashboard.profile.streak,
        dashboard.profile.longest_streak
    );

    if !dashboard.profile.badges.is_empty() {
        let labels: Vec<_> = dashboard
            .profile
            .badges
            .iter()
            .map(|b| badge_label(*b))
            .collect();
        println!("Badges: {}", labels.join(", "));
    }

    println!(
        "Today: {} reviews ({} new) | goals: {} new / {} reviews",
        dashboard.today.review_count,
        dashboard.today.new_count,
        dashboard.settings.daily_goal_new,
        dashboard.settings.daily_goal_reviews
    );

    if !dashboard.trend.is_empty() {
        println!("\nLast days:");
        for entry in &dashboard.trend {
            println!(
                "  {}  {:>4} reviews  {:>4} new",
                entry.day, entry.review_count, entry.new_count
            );
        }
    }

    Ok(())
}
