//! `startupmate reports`: prints the most recent idea analyses and deck
//! scorecards from the configured store.

use anyhow::{bail, Result};
use std::sync::Arc;

use crate::config::Config;
use crate::handlers::{self, Stores};
use crate::sqlite_store::SqliteBackend;

pub async fn run_reports(config: &Config, limit: Option<usize>) -> Result<()> {
    if !config.db.is_configured() {
        bail!("no document store configured (set DATABASE_URL and DATABASE_NAME)");
    }
    let backend = SqliteBackend::connect(&config.db).await?;
    let stores = Stores::new(Arc::new(backend));
    let limit = limit.unwrap_or(config.reports.default_limit);

    let reports = handlers::list_reports(Some(&stores), limit).await?;

    println!("--- Ideas ({}) ---", reports.ideas.len());
    for stored in &reports.ideas {
        let idea = &stored.document;
        println!("id:      {}", stored.id);
        println!("idea:    {}", idea.idea);
        if let Some(score) = idea.score_overall {
            println!("score:   {}", score);
        }
        println!("tags:    {}", idea.tags.join(", "));
        println!();
    }

    println!("--- Decks ({}) ---", reports.decks.len());
    for stored in &reports.decks {
        let deck = &stored.document;
        println!("id:      {}", stored.id);
        println!("file:    {}", deck.filename);
        println!(
            "type:    {}",
            deck.mime_type.as_deref().unwrap_or("unknown")
        );
        println!("score:   {}", deck.overall_score);
        for (category, score) in &deck.category_scores {
            println!("  {:<12} {}", category, score);
        }
        println!();
    }

    Ok(())
}
