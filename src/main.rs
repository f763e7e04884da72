//! Character Keeper
//!
//! Loads one or more forum characters and reports their threads and profile
//! stats.
//!
//! Usage:
//!   character-keeper <PROFILE_URL>...            # Summary per character
//!   character-keeper --todo <PROFILE_URL>...     # Threads waiting on a reply
//!   character-keeper --json <PROFILE_URL>...     # Raw extraction results

use anyhow::Result;
use chrono::Utc;
use std::collections::HashSet;
use std::env;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use character_keeper::config::Config;
use character_keeper::tracker::{self, CharacterReport, TrackedCharacter, Urgency};
use character_keeper::{character_id_from_url, ExtractionEngine, HttpFetcher};

const DEFAULT_CONFIG: &str = "config/settings.toml";

/// Command-line arguments
struct Args {
    /// Path to the TOML config
    config: String,
    /// Print results as JSON
    json: bool,
    /// Print the cross-character reply list
    todo: bool,
    /// Debug logging
    verbose: bool,
    /// Show help
    help: bool,
    urls: Vec<String>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut result = Args {
            config: DEFAULT_CONFIG.to_string(),
            json: false,
            todo: false,
            verbose: false,
            help: false,
            urls: Vec::new(),
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--json" | "-j" => result.json = true,
                "--todo" | "-t" => result.todo = true,
                "--verbose" | "-v" => result.verbose = true,
                "--config" | "-c" => {
                    i += 1;
                    if i < args.len() {
                        result.config = args[i].clone();
                    }
                }
                "--help" | "-h" => result.help = true,
                other if !other.starts_with('-') => result.urls.push(other.to_string()),
                _ => {}
            }
            i += 1;
        }

        result
    }

    fn print_help() {
        println!("Character Keeper - forum thread and profile tracker\n");
        println!("USAGE:");
        println!("  character-keeper [OPTIONS] <PROFILE_URL>...\n");
        println!("OPTIONS:");
        println!("  --config, -c PATH Config file (default: {})", DEFAULT_CONFIG);
        println!("  --todo, -t        List open threads waiting on a reply, oldest first");
        println!("  --json, -j        Print extraction results as JSON");
        println!("  --verbose, -v     Debug logging");
        println!("  --help, -h        Show this help message\n");
        println!("Each URL must carry the character's uid, e.g.");
        println!("  https://charmingrp.com/member.php?action=profile&uid=1234");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.help || args.urls.is_empty() {
        Args::print_help();
        return Ok(());
    }

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::load_or_default(&args.config)?;
    info!("Loaded configuration");

    let characters = tracked_characters(&args.urls);
    if characters.is_empty() {
        anyhow::bail!("no usable profile URLs given");
    }

    let fetcher = HttpFetcher::new(&config.http)?;
    let engine = ExtractionEngine::new(fetcher, &config.forum);
    let reports = tracker::track_all(&engine, characters, config.http.max_concurrent).await;

    if args.json {
        print_json(&reports)
    } else if args.todo {
        print_todo(&reports, &config);
        Ok(())
    } else {
        print_summary(&reports, &config);
        Ok(())
    }
}

/// One entry per distinct uid; URLs without a uid are rejected
fn tracked_characters(urls: &[String]) -> Vec<TrackedCharacter> {
    let mut seen = HashSet::new();
    let mut characters = Vec::new();

    for url in urls {
        let id = character_id_from_url(url);
        if id == 0 {
            warn!("Ignoring {}: must contain a uid parameter", url);
            continue;
        }
        if !seen.insert(id) {
            warn!("Character {} already added", id);
            continue;
        }
        characters.push(TrackedCharacter {
            id,
            name: format!("Character {}", id),
            url: url.clone(),
        });
    }

    characters
}

fn print_json(reports: &[CharacterReport]) -> Result<()> {
    let results: Vec<_> = reports
        .iter()
        .filter_map(|r| r.outcome.as_ref().ok())
        .collect();
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

fn print_todo(reports: &[CharacterReport], config: &Config) {
    let now = Utc::now();
    let todo = tracker::todo_list(reports);

    if todo.is_empty() {
        println!("Nothing waiting on a reply.");
        return;
    }

    for item in todo {
        let urgency = Urgency::classify(item.thread, now, &config.staleness);
        println!(
            "[{}] {} - {} (last: {}, {})",
            urgency,
            item.character_name,
            item.thread.title,
            item.thread.last_poster,
            tracker::relative_label(item.thread.last_post_date, now)
        );
    }
}

fn print_summary(reports: &[CharacterReport], config: &Config) {
    let now = Utc::now();

    for report in reports {
        println!("\n{} (uid {})", report.character.name, report.character.id);

        let result = match &report.outcome {
            Ok(result) => result,
            Err(e) => {
                println!("  Error: {}", e);
                continue;
            }
        };

        if let Some(stats) = &result.stats {
            let age = stats.age.map(|a| a.to_string()).unwrap_or_else(|| "?".to_string());
            println!("  Age: {}  Blood: {}  Ship: {}", age, stats.blood, stats.ship);
            if stats.age_needs_update {
                println!(
                    "  Age needs update: birthday {} makes them {}",
                    stats.birthday.as_deref().unwrap_or("?"),
                    stats.calculated_age.unwrap_or_default()
                );
            }
        }

        println!("  Threads: {}", result.threads.len());
        for thread in &result.threads {
            println!(
                "    [{}] {} ({})",
                Urgency::classify(thread, now, &config.staleness),
                thread.title,
                tracker::relative_label(thread.last_post_date, now)
            );
        }
    }
}
