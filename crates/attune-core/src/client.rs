//! Library client: the one place that strings together script building,
//! bridge invocation, wire decoding, coercion, caching, and artwork
//! enrichment.
//!
//! Bridge calls are awaited one at a time — the target application does
//! not tolerate overlapping automation requests. Artwork enrichment goes
//! over HTTP instead and fans out with `join_all`.

use anyhow::Context;
use futures_util::future::join_all;
use tracing::info;

use crate::artwork::ArtworkClient;
use crate::bridge::{Bridge, Osascript};
use crate::cache::{TtlCache, TTL_DAY, TTL_HOUR};
use crate::config::Config;
use crate::models::{MusicState, PlayerState, Playlist, RepeatMode, Track};
use crate::query::{parse_record, parse_records};
use crate::scripts;

const TRACKS_KEY: &str = "tracks";
const PLAYLISTS_KEY: &str = "playlists";

/// Built-in container playlists that are not useful in listings.
const HIDDEN_PLAYLISTS: [&str; 2] = ["Library", "Music"];

pub struct MusicClient<B: Bridge> {
    bridge: B,
    cache: TtlCache,
    artwork: ArtworkClient,
    app: String,
}

impl MusicClient<Osascript> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Osascript,
            TtlCache::with_dir(config.cache.dir.clone()),
            ArtworkClient::new(config.lastfm.api_key.clone()),
            config.app.name.clone(),
        )
    }
}

impl<B: Bridge> MusicClient<B> {
    pub fn new(bridge: B, cache: TtlCache, artwork: ArtworkClient, app: String) -> Self {
        Self {
            bridge,
            cache,
            artwork,
            app,
        }
    }

    // ── library queries ───────────────────────────────────────────────────────

    /// Every track in the library. Cached for a day under `"tracks"`.
    pub async fn all_tracks(&self, use_cache: bool) -> anyhow::Result<Vec<Track>> {
        if use_cache {
            if let Some(tracks) = self.cache.get::<Vec<Track>>(TRACKS_KEY, TTL_DAY) {
                return Ok(tracks);
            }
        }
        let script = scripts::all_tracks(&self.app)?;
        let raw = self
            .bridge
            .run(&script)
            .await
            .context("fetching library tracks")?;
        let mut tracks: Vec<Track> = parse_records(&raw).iter().map(Track::from_record).collect();
        info!("fetched {} tracks from {}", tracks.len(), self.app);

        self.enrich_artwork(&mut tracks).await;
        self.cache.set(TRACKS_KEY, &tracks);
        Ok(tracks)
    }

    /// All playlists with their member track ids. Cached for a day.
    pub async fn playlists(&self, use_cache: bool) -> anyhow::Result<Vec<Playlist>> {
        if use_cache {
            if let Some(playlists) = self.cache.get::<Vec<Playlist>>(PLAYLISTS_KEY, TTL_DAY) {
                return Ok(playlists);
            }
        }
        let script = scripts::all_playlists(&self.app)?;
        let raw = self
            .bridge
            .run(&script)
            .await
            .context("fetching playlists")?;
        let mut playlists: Vec<Playlist> = parse_records(&raw)
            .iter()
            .map(Playlist::from_record)
            .filter(|p| !HIDDEN_PLAYLISTS.contains(&p.name.as_str()))
            .collect();
        info!("fetched {} playlists from {}", playlists.len(), self.app);

        // Sequential on purpose: every id fetch is another bridge call.
        for playlist in &mut playlists {
            playlist.tracks = self.playlist_track_ids(&playlist.id, use_cache).await?;
        }
        self.cache.set(PLAYLISTS_KEY, &playlists);
        Ok(playlists)
    }

    /// Persistent IDs of a playlist's tracks. Cached per playlist for an
    /// hour — playlist membership churns faster than the library.
    pub async fn playlist_track_ids(
        &self,
        playlist_id: &str,
        use_cache: bool,
    ) -> anyhow::Result<Vec<String>> {
        let key = format!("playlist:{playlist_id}");
        if use_cache {
            if let Some(ids) = self.cache.get::<Vec<String>>(&key, TTL_HOUR) {
                return Ok(ids);
            }
        }
        let raw = self
            .bridge
            .run(&scripts::playlist_track_ids(&self.app, playlist_id))
            .await
            .with_context(|| format!("fetching tracks of playlist {playlist_id}"))?;
        let ids: Vec<String> = raw
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.trim().to_string())
            .collect();
        self.cache.set(&key, &ids);
        Ok(ids)
    }

    /// Detail record for the current track; None when nothing is playing.
    /// Not cached — it changes with every skip.
    pub async fn current_track(&self) -> anyhow::Result<Option<Track>> {
        let script = scripts::current_track(&self.app)?;
        let raw = self
            .bridge
            .run(&script)
            .await
            .context("fetching current track")?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let mut track = Track::from_record(&parse_record(&raw));
        track.artwork = self
            .artwork
            .album_artwork(&self.cache, &track.album_artist, &track.album)
            .await;
        Ok(Some(track))
    }

    /// Now-playing snapshot (launches the app when it is not running).
    pub async fn music_state(&self) -> anyhow::Result<MusicState> {
        let script = scripts::music_state(&self.app)?;
        let raw = self
            .bridge
            .run(&script)
            .await
            .context("fetching player state")?;
        Ok(MusicState::from_record(&parse_record(&raw)))
    }

    /// Repopulate the long-lived caches, bypassing existing entries.
    pub async fn refresh_cache(&self) -> anyhow::Result<()> {
        self.all_tracks(false).await?;
        self.playlists(false).await?;
        Ok(())
    }

    // ── playback control ──────────────────────────────────────────────────────

    pub async fn play(&self) -> anyhow::Result<()> {
        self.tell("play").await
    }

    pub async fn pause(&self) -> anyhow::Result<()> {
        self.tell("pause").await
    }

    pub async fn toggle_play(&self) -> anyhow::Result<()> {
        self.tell("playpause").await
    }

    pub async fn stop(&self) -> anyhow::Result<()> {
        self.tell("stop").await
    }

    pub async fn next_track(&self) -> anyhow::Result<()> {
        self.tell("next track").await
    }

    pub async fn previous_track(&self) -> anyhow::Result<()> {
        self.tell("previous track").await
    }

    /// Restart the current track from the beginning.
    pub async fn restart_track(&self) -> anyhow::Result<()> {
        self.tell("back track").await
    }

    pub async fn play_track(&self, track: &Track) -> anyhow::Result<()> {
        let script = scripts::play_track(&self.app, &track.name, &track.album, &track.artist);
        self.bridge.run(&script).await.context("playing track")?;
        Ok(())
    }

    pub async fn reveal_track(&self, track: &Track) -> anyhow::Result<()> {
        let script = scripts::reveal_track(&self.app, &track.name, &track.album, &track.artist);
        self.bridge.run(&script).await.context("revealing track")?;
        Ok(())
    }

    pub async fn play_playlist(&self, playlist_id: &str, shuffle: bool) -> anyhow::Result<()> {
        let script = scripts::play_playlist(&self.app, playlist_id, shuffle);
        self.bridge.run(&script).await.context("playing playlist")?;
        Ok(())
    }

    // ── current-track state ───────────────────────────────────────────────────

    pub async fn favorite(&self) -> anyhow::Result<()> {
        self.tell("set favorited of current track to true").await
    }

    pub async fn dislike(&self) -> anyhow::Result<()> {
        self.tell("set disliked of current track to true").await
    }

    pub async fn toggle_favorite(&self) -> anyhow::Result<()> {
        self.tell("set favorited of current track to not favorited of current track")
            .await
    }

    pub async fn toggle_dislike(&self) -> anyhow::Result<()> {
        self.tell("set disliked of current track to not disliked of current track")
            .await
    }

    pub async fn add_current_to_library(&self) -> anyhow::Result<()> {
        self.tell(r#"duplicate current track to source "Library""#)
            .await
    }

    /// Rate the current track, 0.0–5.0 stars (wire scale 0–100).
    pub async fn set_rating(&self, stars: f32) -> anyhow::Result<()> {
        let rating = (stars.clamp(0.0, 5.0) * 20.0).round() as u32;
        let script = scripts::set_current_rating(&self.app, rating);
        self.bridge.run(&script).await.context("setting rating")?;
        Ok(())
    }

    // ── player settings ───────────────────────────────────────────────────────

    pub async fn set_volume(&self, volume: u32) -> anyhow::Result<()> {
        self.tell(&format!("set sound volume to {}", volume.min(100)))
            .await
    }

    pub async fn get_volume(&self) -> anyhow::Result<u32> {
        let raw = self
            .bridge
            .run(&scripts::tell(&self.app, "get sound volume"))
            .await
            .context("reading volume")?;
        Ok(raw.trim().parse().unwrap_or(0))
    }

    pub async fn player_state(&self) -> anyhow::Result<PlayerState> {
        let raw = self
            .bridge
            .run(&scripts::tell(&self.app, "get player state"))
            .await
            .context("reading player state")?;
        Ok(PlayerState::from_str(raw.trim()))
    }

    pub async fn set_shuffle(&self, shuffle: bool) -> anyhow::Result<()> {
        self.tell(&format!("set shuffle enabled to {shuffle}")).await
    }

    pub async fn set_repeat(&self, mode: RepeatMode) -> anyhow::Result<()> {
        self.tell(&format!("set song repeat to {}", mode.script_name()))
            .await
    }

    // ── internals ─────────────────────────────────────────────────────────────

    async fn tell(&self, command: &str) -> anyhow::Result<()> {
        self.bridge
            .run(&scripts::tell(&self.app, command))
            .await
            .with_context(|| format!("command failed: {command}"))?;
        Ok(())
    }

    /// Fan out artwork lookups over HTTP. Failures leave `artwork` at None;
    /// independent lookups run concurrently with no ordering guarantee.
    async fn enrich_artwork(&self, tracks: &mut [Track]) {
        let lookups = tracks.iter().map(|track| {
            let artist = if track.album_artist.is_empty() {
                &track.artist
            } else {
                &track.album_artist
            };
            self.artwork.album_artwork(&self.cache, artist, &track.album)
        });
        let urls = join_all(lookups).await;
        for (track, url) in tracks.iter_mut().zip(urls) {
            track.artwork = url;
        }
    }
}
