//! Result files: the JSON report and one M3U playlist per movie.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;
use url::Url;

use crate::classify::resolution_token;
use crate::types::MovieResult;

/// Movies with more server links than this are grouped as series.
const SERIES_THRESHOLD: usize = 4;

pub fn write_json(results: &[MovieResult], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(results).context("serializing results")?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    info!("json saved to {}", path.display());
    Ok(())
}

/// Write `{safe_title}.m3u` for every movie that has at least one quality.
/// Returns the files written.
pub fn write_playlists(results: &[MovieResult], dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut written = Vec::new();
    for movie in results.iter().filter(|m| !m.qualities.is_empty()) {
        let path = dir.join(format!("{}.m3u", safe_title(&movie.title)));
        fs::write(&path, playlist(movie)).with_context(|| format!("writing {}", path.display()))?;
        info!("created {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Playlist text: one entry per server link that reached a media URL.
pub fn playlist(movie: &MovieResult) -> String {
    let logo = movie
        .poster_url
        .as_ref()
        .map(|poster| format!(" tvg-logo=\"{poster}\""))
        .unwrap_or_default();
    let group = group_title(movie);

    let mut out = String::from("#EXTM3U\n");
    for media in movie.media_urls() {
        out.push_str(&format!(
            "#EXTINF:-1 group-title=\"{group}\"{logo},{}\n{media}\n",
            display_title(&movie.title, media)
        ));
    }
    out
}

fn group_title(movie: &MovieResult) -> &'static str {
    if movie.server_links().count() > SERIES_THRESHOLD {
        "Series"
    } else {
        "Movies"
    }
}

/// "Leo 720p HD": the movie title plus what the media filename says about quality.
pub fn display_title(title: &str, media: &Url) -> String {
    let last = media.path().rsplit('/').next().unwrap_or_default();
    let filename = urlencoding::decode(last).map(|s| s.into_owned()).unwrap_or_else(|_| last.to_string());
    let resolution = resolution_token(&filename).unwrap_or_default();
    let hd = if filename.contains("HD") { " HD" } else { "" };
    format!("{title} {resolution}{hd}").trim().to_string()
}

/// File-name-safe form of a title.
pub fn safe_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '(' | ')'))
        .collect();
    kept.trim().replace(' ', "_")
}
