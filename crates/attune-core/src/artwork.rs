//! Album artwork lookup via the Last.fm `album.getinfo` endpoint.
//!
//! Best-effort: artwork failing to resolve never fails the record fetch
//! that wanted it. Lookup tries an explicit ordered list of strategies —
//! the album name as-is, then with the `" - Single"` suffix stripped —
//! and each strategy's answer is cached independently under an
//! artist-album composite key.

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{TtlCache, TTL_DAY};

const LASTFM_ENDPOINT: &str = "http://ws.audioscrobbler.com/2.0/";
const SINGLE_SUFFIX: &str = " - Single";

pub struct ArtworkClient {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl ArtworkClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
        }
    }

    /// Resolve an artwork URL for `artist` / `album`, or None when every
    /// strategy comes up empty.
    pub async fn album_artwork(
        &self,
        cache: &TtlCache,
        artist: &str,
        album: &str,
    ) -> Option<String> {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => {
                debug!("artwork lookup skipped: no Last.fm API key configured");
                return None;
            }
        };

        for candidate in album_candidates(album) {
            let key = format!("artwork:{artist}-{candidate}");
            if let Some(url) = cache.get::<String>(&key, TTL_DAY) {
                return Some(url);
            }
            match self.fetch(api_key, artist, &candidate).await {
                Ok(Some(url)) => {
                    cache.set(&key, &url);
                    return Some(url);
                }
                Ok(None) => continue,
                Err(e) => {
                    // Best-effort: log and try the next strategy.
                    warn!("artwork lookup failed for {artist} / {candidate}: {e}");
                    continue;
                }
            }
        }
        None
    }

    async fn fetch(&self, api_key: &str, artist: &str, album: &str) -> anyhow::Result<Option<String>> {
        let response = self
            .http
            .get(LASTFM_ENDPOINT)
            .query(&[
                ("method", "album.getinfo"),
                ("artist", artist),
                ("album", album),
                ("api_key", api_key),
                ("format", "json"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Last.fm returned status {}", response.status());
        }

        let data: Value = response.json().await?;
        Ok(extract_image_url(&data))
    }
}

/// Album names to try, in order. The catalog suffixes single releases with
/// `" - Single"` while Last.fm indexes them bare.
fn album_candidates(album: &str) -> Vec<String> {
    let mut candidates = vec![album.to_string()];
    if album.contains(SINGLE_SUFFIX) {
        candidates.push(album.replace(SINGLE_SUFFIX, ""));
    }
    candidates
}

/// Largest image wins: the `album.image` array is ordered small → large.
fn extract_image_url(data: &Value) -> Option<String> {
    let images = data.get("album")?.get("image")?.as_array()?;
    let url = images.last()?.get("#text")?.as_str()?;
    if url.is_empty() {
        None
    } else {
        Some(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_album_candidates_strips_single_suffix() {
        assert_eq!(album_candidates("Atlas"), vec!["Atlas"]);
        assert_eq!(
            album_candidates("Geronimo - Single"),
            vec!["Geronimo - Single", "Geronimo"]
        );
    }

    #[test]
    fn test_extract_image_takes_largest() {
        let data = json!({
            "album": {
                "image": [
                    { "#text": "https://img/small.png", "size": "small" },
                    { "#text": "https://img/mega.png", "size": "mega" },
                ]
            }
        });
        assert_eq!(
            extract_image_url(&data).as_deref(),
            Some("https://img/mega.png")
        );
    }

    #[test]
    fn test_extract_image_handles_missing_shapes() {
        assert_eq!(extract_image_url(&json!({})), None);
        assert_eq!(extract_image_url(&json!({ "album": {} })), None);
        let empty_text = json!({ "album": { "image": [{ "#text": "" }] } });
        assert_eq!(extract_image_url(&empty_text), None);
    }
}
