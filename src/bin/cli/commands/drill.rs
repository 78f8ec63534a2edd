//! Typed-answer practice drill
//!
//! Builds a weighted practice queue from the chosen word set, asks for
//! translations on stdin, and submits each answer as a review. Missed
//! words come back a couple of questions later in the same sitting.

use std::io::{self, BufRead, Write};

use anyhow::Result;

use szokincs::trainer::algorithm::quality_from_correct;
use szokincs::trainer::{CardFilter, PracticeQueue, TrainerStore};

/// Trimmed, case-folded answer comparison
fn answers_match(given: &str, expected: &str) -> bool {
    given.trim().to_lowercase() == expected.trim().to_lowercase()
}

pub async fn run(store: &TrainerStore, length: usize, hard: bool, due: bool) -> Result<()> {
    let filter = if hard {
        CardFilter::Hard
    } else if due {
        CardFilter::Due
    } else {
        CardFilter::All
    };

    let pool = store.list_cards(filter, usize::MAX).await?;
    if pool.is_empty() {
        println!("No words to practice. Import a word list first.");
        return Ok(());
    }

    let mut queue = PracticeQueue::build(&pool, length, &mut rand::thread_rng());
    let profile_id = store.default_profile_id();
    let stdin = io::stdin();
    let mut input = String::new();
    let mut score = 0usize;
    let mut asked = 0usize;

    println!("Type the translation, q quits.\n");

    while let Some(card) = queue.current().cloned() {
        print!("[{}/{}] {} -> ", queue.position(), queue.len(), card.prompt);
        io::stdout().flush()?;

        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            // EOF ends the sitting
            break;
        }
        let given = input.trim();
        if given == "q" {
            break;
        }

        let correct = answers_match(given, &card.answer);
        let outcome = store
            .submit_review(profile_id, card.id, quality_from_correct(correct))
            .await?;

        if correct {
            score += 1;
            println!("Correct. (+{} xp)", outcome.xp_gain);
        } else {
            println!("Wrong. Answer: {}", card.answer);
            queue.retry_current();
        }
        asked += 1;
        queue.advance();
    }

    println!("\nScore: {}/{}", score, asked);
    Ok(())
}
