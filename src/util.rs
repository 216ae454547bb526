use colored::*;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::types::MovieResult;

/// Log to stderr so `--json` output on stdout stays clean. `RUST_LOG` wins
/// over `--debug`.
pub fn init_logging(debug: bool) {
    let default = if debug { "info,moviesda=debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn print_json<T: Serialize + std::fmt::Debug>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(_) => println!("{:?}", value),
    }
}

pub fn print_summary(results: &[MovieResult]) {
    println!("{} {}", "Total movies scraped:".bold(), results.len());

    for movie in results {
        println!("\n{} {}", "[MOVIE]".green().bold(), movie.title.bold());
        if let Some(poster) = &movie.poster_url {
            println!("   {} {}", "[POSTER]".yellow(), poster);
        }
        if !movie.screenshots.is_empty() {
            println!("   {} {} found", "[SCREENSHOTS]".yellow(), movie.screenshots.len());
            for (i, shot) in movie.screenshots.iter().take(3).enumerate() {
                println!("      [{}] {}", i + 1, shot);
            }
        }
        for quality in &movie.qualities {
            println!("   {} {}", "[QUALITY]".blue().bold(), quality.label);
            for dl in &quality.downloads {
                println!("      [FILE] {}", dl.filename);
                if let Some(size) = &dl.file_size {
                    println!("         Size: {}", size);
                }
                for server in &dl.servers {
                    match &server.media_url {
                        Some(media) => println!("         {} {}", "[MP4]".green(), media.as_str().cyan()),
                        None => println!("         {} {}", "[LINK]".red(), server.level1_url),
                    }
                }
            }
        }
    }
}
