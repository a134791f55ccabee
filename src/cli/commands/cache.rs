//! Cache command - inspect and clean cached installations

use crate::cache::{CacheEntry, CacheState, ToolCache};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::Config;
use crate::error::LeinupResult;
use crate::installer::{cache_version_key, TOOL_NAME};
use console::style;
use std::io::{self, Write};

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> LeinupResult<()> {
    let cache = ToolCache::new(config.cache_dir());

    match args.action {
        CacheAction::List { format } => list_entries(&cache, format).await,
        CacheAction::Clean { version, yes } => clean_entries(&cache, version, yes).await,
    }
}

async fn list_entries(cache: &ToolCache, format: OutputFormat) -> LeinupResult<()> {
    let entries = cache.entries(TOOL_NAME).await?;

    if entries.is_empty() {
        println!("No cached installations found.");
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_table(&entries),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Plain => {
            for entry in &entries {
                println!("{} {}", entry.version, entry.arch);
            }
        }
    }

    Ok(())
}

fn print_table(entries: &[CacheEntry]) {
    println!(
        "{:<12} {:<10} {:<10} {:<20}",
        "VERSION", "ARCH", "STATE", "CREATED"
    );
    println!("{}", "-".repeat(54));

    for entry in entries {
        let state_display = match entry.state {
            CacheState::Complete => style("complete").green().to_string(),
            CacheState::Partial => style("partial").yellow().to_string(),
        };
        let created = entry.created_at.format("%Y-%m-%d %H:%M").to_string();

        println!(
            "{:<12} {:<10} {:<10} {:<20}",
            entry.version, entry.arch, state_display, created
        );
    }

    println!();
    println!("Total: {} installation(s)", entries.len());
}

async fn clean_entries(
    cache: &ToolCache,
    version: Option<String>,
    skip_confirm: bool,
) -> LeinupResult<()> {
    let entries = cache.entries(TOOL_NAME).await?;
    let key = version.as_deref().map(cache_version_key);

    let targets: Vec<&CacheEntry> = entries
        .iter()
        .filter(|e| key.as_deref().is_none_or(|k| e.version == k))
        .collect();

    if targets.is_empty() {
        println!("Nothing to remove.");
        return Ok(());
    }

    println!("This will remove {} installation(s):", targets.len());
    for entry in &targets {
        println!(
            "  {} leiningen {} ({})",
            style("•").red(),
            entry.version,
            entry.arch
        );
    }
    println!();

    if !skip_confirm {
        print!("Are you sure? [y/N] ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            println!("Failed to read input, aborting.");
            return Ok(());
        }
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let mut removed = 0;
    for entry in targets {
        if cache.remove(TOOL_NAME, &entry.version, &entry.arch).await? {
            removed += 1;
        }
    }

    println!("{} removed {} installation(s)", style("✓").green(), removed);
    Ok(())
}
