use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use url::Url;

mod aggregate;
mod classify;
mod config;
mod document;
mod error;
mod fetch;
mod listing;
mod redirect;
mod report;
mod resolve;
mod types;
mod util;

use config::{ListingLimits, ScraperConfig, DEFAULT_BASE_URL, DEFAULT_CATEGORY_URL};
use fetch::{Fetch, HttpFetcher};
use types::{MovieRef, MovieResult};

#[derive(Parser, Debug)]
#[command(name = "moviesda", version, about = "Resolve moviesda / isaidub title pages to media URLs", long_about = None)]
struct Cli {
    /// Print the results as JSON instead of a summary
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    /// Site that relative movie URLs are resolved against
    #[arg(long, env = "BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: Url,

    /// Seconds to wait before every request
    #[arg(long, env = "REQUEST_DELAY", default_value_t = 1.0, global = true)]
    delay: f64,

    /// Request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 30, global = true)]
    timeout: u64,

    /// Comma-separated category URLs; search mode searches their sites
    #[arg(long, env = "CATEGORY_URLS", default_value = DEFAULT_CATEGORY_URL, global = true)]
    category_urls: String,

    #[arg(long, default_value = "scraped_movies.json", global = true)]
    output: PathBuf,

    #[arg(long, default_value = "playlists", global = true)]
    playlist_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape the newest movies of each category
    #[command(visible_alias = "ls")]
    Category {
        #[arg(long, env = "MAX_PAGES", default_value_t = 1)]
        max_pages: usize,
        #[arg(long, env = "MAX_MOVIES", default_value_t = 5)]
        max_movies: usize,
    },

    /// Find movies by name (comma-separated) and scrape the first hit of each
    Search {
        #[arg(env = "SEARCH_QUERY")]
        queries: String,
    },

    /// Scrape a single movie page
    Movie {
        url: String,
        #[arg(long)]
        title: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_logging(cli.debug);

    let config = ScraperConfig {
        base_url: cli.base_url.clone(),
        delay: Duration::try_from_secs_f64(cli.delay).context("invalid request delay")?,
        timeout: Duration::from_secs(cli.timeout),
    };
    let fetcher = HttpFetcher::new(config.clone()).context("building http client")?;
    let category_urls = config::split_list(&cli.category_urls)
        .iter()
        .map(|s| Url::parse(s).with_context(|| format!("invalid category url: {}", s)))
        .collect::<Result<Vec<_>>>()?;

    let movies = match &cli.command {
        Commands::Category { max_pages, max_movies } => {
            let limits = ListingLimits { max_pages: *max_pages, max_movies: *max_movies };
            let mut movies = Vec::new();
            for (i, category_url) in category_urls.iter().enumerate() {
                info!("[site {}/{}] {}", i + 1, category_urls.len(), category_url);
                let listed = listing::list_category(&fetcher, category_url, limits.max_pages).await;
                info!("found {} movies", listed.len());
                movies.extend(listed.into_iter().take(limits.max_movies));
            }
            movies
        }
        Commands::Search { queries } => {
            let mut sites = config::site_origins(&category_urls);
            if sites.is_empty() {
                sites.push(document::origin_of(&config.base_url));
            }
            let mut movies = Vec::new();
            for query in config::split_list(queries) {
                match listing::find_title(&fetcher, &query, &sites).await {
                    Some(movie) => movies.push(movie),
                    None => warn!("no movies found matching '{}' on any site", query),
                }
            }
            movies
        }
        Commands::Movie { url, title } => {
            let url = config.base_url.join(url).with_context(|| format!("invalid movie url: {}", url))?;
            let title = title
                .clone()
                .or_else(|| aggregate::title_from_url(&url))
                .unwrap_or_else(|| url.to_string());
            vec![MovieRef { title, url }]
        }
    };

    let results = scrape_all(&fetcher, &movies, cli.json || cli.debug).await?;
    if results.is_empty() {
        println!("{}", "No movies to save.".yellow());
        return Ok(());
    }

    report::write_json(&results, &cli.output)?;
    let playlists = report::write_playlists(&results, &cli.playlist_dir)?;

    if cli.json {
        util::print_json(&results);
    } else {
        println!("{} {}", "JSON saved to:".bold(), cli.output.display());
        println!(
            "{} {} in {}",
            "M3U playlists:".bold(),
            playlists.len(),
            cli.playlist_dir.display()
        );
        util::print_summary(&results);
    }
    Ok(())
}

/// Resolve every movie in turn, one request at a time.
async fn scrape_all(fetcher: &dyn Fetch, movies: &[MovieRef], quiet: bool) -> Result<Vec<MovieResult>> {
    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(movies.len() as u64)
    };
    pb.set_style(
        ProgressStyle::with_template("{spinner} [{pos}/{len}] {wide_msg}")
            .context("progress template")?,
    );

    let mut results = Vec::with_capacity(movies.len());
    for movie in movies {
        pb.set_message(movie.title.clone());
        results.push(aggregate::build_movie_result(fetcher, movie).await);
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok(results)
}
