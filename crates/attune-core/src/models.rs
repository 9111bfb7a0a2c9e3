//! Typed library entities and their coercion from decoded wire records.
//!
//! The decoder hands back raw strings; everything the bridge returns is
//! text. Coercion rules are fixed per entity:
//!   - numbers parse with a zero default (the bridge emits `missing value`
//!     or garbage for unset fields),
//!   - booleans are string equality against `"true"`,
//!   - rating arrives on a 0–100 scale and is exposed as 0.0–5.0,
//!   - `date added` arrives as a locale date string and is stored as epoch
//!     millis.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::query::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    Playing,
    Paused,
    Stopped,
}

impl PlayerState {
    pub fn from_str(s: &str) -> Self {
        match s {
            "playing" => Self::Playing,
            "paused" => Self::Paused,
            _ => Self::Stopped,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub album: String,
    pub album_artist: String,
    pub genre: String,
    /// Epoch millis of `date added`.
    pub date_added: i64,
    pub played_count: u32,
    /// Seconds.
    pub duration: f64,
    /// Pre-formatted "m:ss" from the bridge.
    pub time: String,
    pub year: String,
    pub in_library: bool,
    pub favorited: bool,
    pub disliked: bool,
    /// 0.0–5.0 (wire scale is 0–100).
    pub rating: f32,
    /// Artwork URL once enriched; None until then.
    pub artwork: Option<String>,
}

impl Track {
    pub fn from_record(r: &Record) -> Self {
        Self {
            id: r.get("id").to_string(),
            name: r.get("name").to_string(),
            artist: r.get("artist").to_string(),
            album: r.get("album").to_string(),
            album_artist: r.get("albumArtist").to_string(),
            genre: r.get("genre").to_string(),
            date_added: parse_added_date(r.get("dateAdded")),
            played_count: parse_num(r.get("playedCount")),
            duration: r.get("duration").parse().unwrap_or(0.0),
            time: r.get("time").to_string(),
            year: r.get("year").to_string(),
            in_library: parse_bool(r.get("inLibrary")),
            favorited: parse_bool(r.get("favorited")),
            disliked: parse_bool(r.get("disliked")),
            rating: parse_rating(r.get("rating")),
            artwork: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaylistKind {
    User,
    Subscription,
    Other,
}

impl PlaylistKind {
    /// The wire carries the AppleScript class name, e.g. "user playlist".
    pub fn from_str(s: &str) -> Self {
        match s {
            "user playlist" => Self::User,
            "subscription playlist" => Self::Subscription,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub duration: f64,
    pub count: u32,
    pub time: String,
    pub kind: PlaylistKind,
    /// Persistent IDs of member tracks.
    pub tracks: Vec<String>,
    pub artwork: Option<String>,
}

impl Playlist {
    pub fn from_record(r: &Record) -> Self {
        Self {
            id: r.get("id").to_string(),
            name: r.get("name").to_string(),
            duration: r.get("duration").parse().unwrap_or(0.0),
            count: parse_num(r.get("count")),
            time: r.get("time").to_string(),
            kind: PlaylistKind::from_str(r.get("kind")),
            tracks: Vec::new(),
            artwork: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    Off,
    One,
    All,
}

impl RepeatMode {
    pub fn from_str(s: &str) -> Self {
        match s {
            "one" => Self::One,
            "all" => Self::All,
            _ => Self::Off,
        }
    }

    /// AppleScript spelling of the mode (`song repeat` takes `none`).
    pub fn script_name(&self) -> &'static str {
        match self {
            Self::Off => "none",
            Self::One => "one",
            Self::All => "all",
        }
    }

    /// User-facing spelling, matching what the CLI accepts as input.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::One => "one",
            Self::All => "all",
        }
    }
}

/// Now-playing snapshot. When the player is stopped the bridge returns the
/// reduced record (playing / repeat / shuffle only) and track fields stay
/// at their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicState {
    pub name: String,
    pub artist: String,
    pub playing: PlayerState,
    pub repeat: RepeatMode,
    pub shuffle: bool,
    pub in_library: bool,
    pub favorited: bool,
    pub disliked: bool,
    pub rating: f32,
}

impl MusicState {
    pub fn from_record(r: &Record) -> Self {
        Self {
            name: r.get("name").to_string(),
            artist: r.get("artist").to_string(),
            playing: PlayerState::from_str(r.get("playing")),
            repeat: RepeatMode::from_str(r.get("repeat")),
            shuffle: parse_bool(r.get("shuffle")),
            in_library: parse_bool(r.get("inLibrary")),
            favorited: parse_bool(r.get("favorited")),
            disliked: parse_bool(r.get("disliked")),
            rating: parse_rating(r.get("rating")),
        }
    }
}

// ── coercion helpers ──────────────────────────────────────────────────────────

fn parse_bool(s: &str) -> bool {
    s == "true"
}

fn parse_num(s: &str) -> u32 {
    s.trim().parse().unwrap_or(0)
}

/// Wire rating is 0–100; exposed as 0.0–5.0.
fn parse_rating(s: &str) -> f32 {
    parse_num(s) as f32 / 20.0
}

/// Parse the locale date string the bridge emits for `date added`, e.g.
/// `"January 5, 2021 at 10:13:29 AM"`. Commas and the "at" separator are
/// stripped first. Unparseable input falls back to epoch 0.
pub fn parse_added_date(s: &str) -> i64 {
    let cleaned = s.replace(',', "").replace(" at ", " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    for fmt in ["%B %d %Y %I:%M:%S %p", "%B %d %Y %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, fmt) {
            return dt.and_utc().timestamp_millis();
        }
    }
    0
}

/// "2 hours 5 min" style duration for list views. Input is seconds.
pub fn display_duration(duration: f64) -> String {
    let hours = (duration / 3600.0).floor() as u64;
    let minutes = ((duration % 3600.0) / 60.0).floor() as u64;
    match hours {
        0 => format!("{minutes} min"),
        1 => format!("1 hour {minutes} min"),
        _ => format!("{hours} hours {minutes} min"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parse_record;

    #[test]
    fn test_track_coercion() {
        let r = parse_record(
            "id<EQ>ABC<BR>name<EQ>Hey Jude<BR>artist<EQ>The Beatles<BR>album<EQ>1\
             <BR>albumArtist<EQ>The Beatles<BR>genre<EQ>Rock\
             <BR>dateAdded<EQ>January 5, 2021 at 10:13:29 AM\
             <BR>playedCount<EQ>42<BR>duration<EQ>431.333<BR>time<EQ>7:11\
             <BR>year<EQ>1968<BR>inLibrary<EQ>true<BR>favorited<EQ>true\
             <BR>disliked<EQ>false<BR>rating<EQ>100",
        );
        let t = Track::from_record(&r);
        assert_eq!(t.name, "Hey Jude");
        assert_eq!(t.played_count, 42);
        assert_eq!(t.rating, 5.0);
        assert!(t.in_library);
        assert!(t.favorited);
        assert!(!t.disliked);
        assert!(t.date_added > 0);
        assert!(t.artwork.is_none());
    }

    #[test]
    fn test_unset_fields_take_defaults() {
        let r = parse_record("id<EQ>ABC<BR>name<EQ>X");
        let t = Track::from_record(&r);
        assert_eq!(t.played_count, 0);
        assert_eq!(t.rating, 0.0);
        assert_eq!(t.date_added, 0);
        assert!(!t.favorited);
    }

    #[test]
    fn test_rating_scale() {
        assert_eq!(parse_rating("100"), 5.0);
        assert_eq!(parse_rating("60"), 3.0);
        assert_eq!(parse_rating("0"), 0.0);
        assert_eq!(parse_rating("not a number"), 0.0);
    }

    #[test]
    fn test_parse_added_date() {
        let ms = parse_added_date("January 5, 2021 at 10:13:29 AM");
        assert!(ms > 0);
        // Same instant spelled without AM/PM.
        assert_eq!(ms, parse_added_date("January 5, 2021 at 10:13:29"));
        assert_eq!(parse_added_date("yesterday-ish"), 0);
    }

    #[test]
    fn test_music_state_stopped_reduced_record() {
        let r = parse_record("playing<EQ>stopped<BR>repeat<EQ>none<BR>shuffle<EQ>false");
        let s = MusicState::from_record(&r);
        assert_eq!(s.playing, PlayerState::Stopped);
        assert_eq!(s.repeat, RepeatMode::Off);
        assert!(s.name.is_empty());
    }

    #[test]
    fn test_repeat_mode_spellings() {
        // The wire takes "none" for the off mode; users see "off".
        assert_eq!(RepeatMode::Off.script_name(), "none");
        assert_eq!(RepeatMode::Off.label(), "off");
        assert_eq!(RepeatMode::All.script_name(), RepeatMode::All.label());
    }

    #[test]
    fn test_playlist_kind() {
        assert_eq!(PlaylistKind::from_str("user playlist"), PlaylistKind::User);
        assert_eq!(
            PlaylistKind::from_str("subscription playlist"),
            PlaylistKind::Subscription
        );
        assert_eq!(PlaylistKind::from_str("library playlist"), PlaylistKind::Other);
    }

    #[test]
    fn test_display_duration() {
        assert_eq!(display_duration(125.0), "2 min");
        assert_eq!(display_duration(3725.0), "1 hour 2 min");
        assert_eq!(display_duration(7380.0), "2 hours 3 min");
    }
}
