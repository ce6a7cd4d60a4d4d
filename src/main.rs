use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};

use smartdial::index::source::JsonContactSource;
use smartdial::models::{LookupHit, MatchPosition};
use smartdial::{AppConfig, DatabaseConfig, MatchIndex};

const DEFAULT_LIMIT: usize = 20;

fn print_usage() {
    eprintln!(
        "usage: smartdial <db-path> sync <contacts.json> [--full]\n\
         \u{20}      smartdial <db-path> query <digits> [limit]\n\
         \n\
         SMARTDIAL_DB overrides <db-path>; RUST_LOG controls verbosity."
    );
}

#[tokio::main]
async fn main() -> ExitCode {
    smartdial::logging::init_tracing_from_env();
    match run().await {
        Ok(code) => code,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        print_usage();
        return Ok(ExitCode::from(2));
    }

    let db_path = std::env::var("SMARTDIAL_DB").unwrap_or_else(|_| args[0].clone());
    let config = AppConfig {
        database: DatabaseConfig { path: db_path },
        ..Default::default()
    };
    let index = MatchIndex::open(&config).await?;

    match args[1].as_str() {
        "sync" => {
            let force_full = args.iter().skip(3).any(|a| a == "--full");
            let source = JsonContactSource::load(Path::new(&args[2]))?;
            let summary = index.start_update(&source, force_full).await?;
            println!(
                "indexed {} contacts ({} skipped, {} removed, {} purged) in {:.2}s",
                summary.indexed,
                summary.skipped,
                summary.removed,
                summary.purged,
                summary.duration.as_secs_f64()
            );
        }
        "query" => {
            let limit = args
                .get(3)
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("limit must be a number")?
                .unwrap_or(DEFAULT_LIMIT);
            let hits = index.lookup(&args[2], limit).await?;
            if hits.is_empty() {
                println!("no matches");
            }
            for hit in &hits {
                println!("{}", format_hit(hit));
            }
        }
        other => {
            log::error!("unknown command: {other}");
            print_usage();
            return Ok(ExitCode::from(2));
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Wraps each highlighted span in brackets. Positions are char offsets.
fn highlight(text: &str, positions: &[MatchPosition]) -> String {
    let mut out = String::with_capacity(text.len() + positions.len() * 2);
    for (i, ch) in text.chars().enumerate() {
        if positions.iter().any(|p| p.start == i && !p.is_empty()) {
            out.push('[');
        }
        out.push(ch);
        if positions.iter().any(|p| p.end == i + 1 && !p.is_empty()) {
            out.push(']');
        }
    }
    out
}

fn format_hit(hit: &LookupHit) -> String {
    let name = hit.display_name.as_deref().unwrap_or("<no name>");
    let mut line = format!("#{} {}", hit.contact_id, highlight(name, &hit.name_positions));
    if let Some(number) = hit.matched_number.as_deref() {
        let spans: Vec<MatchPosition> = hit.number_position.into_iter().collect();
        line.push_str("  ");
        line.push_str(&highlight(number, &spans));
    }
    line
}
