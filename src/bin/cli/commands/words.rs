//! Word list import, mistakes listing, and progress reset

use std::path::Path;

use anyhow::{Context, Result};

use szokincs::trainer::TrainerStore;

pub async fn run_import(store: &TrainerStore, file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let summary = store.import_text(&text).await?;
    println!(
        "Imported {} new words ({} lines parsed).",
        summary.inserted, summary.parsed
    );
    Ok(())
}

pub async fn run_mistakes(store: &TrainerStore, limit: usize) -> Result<()> {
    let mistakes = store.mistakes(limit).await?;
    if mistakes.is_empty() {
        println!("No mistakes recorded yet.");
        return Ok(());
    }

    for entry in &mistakes {
        println!(
            "{:>3}x wrong  {:>2}x leech  {} -> {}",
            entry.state.wrong, entry.state.leech_count, entry.card.prompt, entry.card.answer
        );
    }
    Ok(())
}

pub async fn run_reset(store: &TrainerStore, yes: bool) -> Result<()> {
    if !yes {
        println!("This clears all review progress. Re-run with --yes to confirm.");
        return Ok(());
    }
    store.reset().await?;
    println!("Progress reset.");
    Ok(())
}
