//! AppleScript source builders.
//!
//! Pure string construction; nothing here touches the bridge. Query-shaped
//! scripts concatenate a rendered [`QuerySpec`] inside a repeat loop so the
//! bridge returns one serialized record per line.

use crate::bridge::escape_quotes;
use crate::query::{QueryError, QuerySpec};

/// Fields fetched for every track listing and detail view.
pub fn track_query() -> QuerySpec {
    QuerySpec::new()
        .field("id", "persistent ID")
        .field("name", "name")
        .field("artist", "artist")
        .field("album", "album")
        .field("albumArtist", "album artist")
        .field("genre", "genre")
        .field("dateAdded", "date added")
        .field("playedCount", "played count")
        .field("duration", "duration")
        .field("time", "time")
        .field("year", "year")
        .field("inLibrary", "inLibrary")
        .field("favorited", "favorited")
        .field("disliked", "disliked")
        .field("rating", "rating")
}

pub fn playlist_query() -> QuerySpec {
    QuerySpec::new()
        .field("id", "persistent ID")
        .field("name", "name as string")
        .field("duration", "duration")
        .field("count", "(count tracks)")
        .field("time", "time")
        .field("kind", "class of currentPlaylist as string")
}

/// Wrap a one-line command in a `tell application` block.
pub fn tell(app: &str, command: &str) -> String {
    format!("tell application \"{app}\" to {command}")
}

pub fn all_tracks(app: &str) -> Result<String, QueryError> {
    let query = track_query().render()?;
    Ok(format!(
        r#"set output to ""
set inLibrary to true
tell application "{app}"
  set allTracks to every track
  repeat with aTrack in allTracks
    tell aTrack to set output to output & {query} & "\n"
  end repeat
end tell
return output"#
    ))
}

/// Current-track detail. Prefers the library copy when one matches
/// name/album/artist so library-only fields (rating, favorited) come back
/// populated.
pub fn current_track(app: &str) -> Result<String, QueryError> {
    let query = track_query().render()?;
    Ok(format!(
        r#"tell application "{app}"
  if exists current track then
    set matchingTracks to (tracks of playlist "Library" whose name is name of current track as string and album is album of current track as string and artist is artist of current track as string)
    set inLibrary to (count of matchingTracks) > 0
    if inLibrary then
      set myTrack to beginning of matchingTracks
      tell myTrack to return {query} & "\n"
    else
      tell current track to return {query} & "\n"
    end if
  end if
end tell"#
    ))
}

pub fn all_playlists(app: &str) -> Result<String, QueryError> {
    let query = playlist_query().render()?;
    Ok(format!(
        r#"set output to ""
tell application "{app}"
  repeat with currentPlaylist in every playlist
    tell currentPlaylist to set output to output & {query} & "\n"
  end repeat
end tell
return output"#
    ))
}

/// Persistent IDs of a playlist's tracks, one per line.
pub fn playlist_track_ids(app: &str, playlist_id: &str) -> String {
    let playlist_id = escape_quotes(playlist_id);
    format!(
        r#"set output to ""
tell application "{app}"
  set allTracks to tracks of first playlist of (every playlist whose persistent ID is "{playlist_id}")
  repeat with aTrack in allTracks
    tell aTrack to set output to output & persistent ID & "\n"
  end repeat
end tell
return output"#
    )
}

/// Now-playing snapshot. Launches the app if needed; a stopped player
/// returns the reduced record.
pub fn music_state(app: &str) -> Result<String, QueryError> {
    let full = QuerySpec::new()
        .field("name", "name of current track")
        .field("artist", "artist of current track")
        .field("playing", "player state")
        .field("repeat", "song repeat")
        .field("shuffle", "shuffle enabled")
        .field("favorited", "favorited of current track")
        .field("disliked", "disliked of current track")
        .field("inLibrary", "inLibrary")
        .field("rating", "rating of current track")
        .render()?;
    let reduced = QuerySpec::new()
        .field("playing", "player state")
        .field("repeat", "song repeat")
        .field("shuffle", "shuffle enabled")
        .render()?;
    Ok(format!(
        r#"tell application "System Events" to set isRunning to (count of (every process whose name is "{app}")) > 0
if not isRunning then tell application "{app}" to launch
tell application "{app}"
  if player state is not stopped and exists current track then
    set matchingTracks to (tracks of playlist "Library" whose name is name of current track as string and album is album of current track as string and artist is artist of current track as string)
    set inLibrary to (count of matchingTracks) > 0
    return {full} & "\n"
  else
    return {reduced} & "\n"
  end if
end tell"#
    ))
}

pub fn play_track(app: &str, name: &str, album: &str, artist: &str) -> String {
    let (name, album, artist) = (escape_quotes(name), escape_quotes(album), escape_quotes(artist));
    tell(
        app,
        &format!(
            "play first track whose name is \"{name}\" and album is \"{album}\" and artist is \"{artist}\""
        ),
    )
}

pub fn reveal_track(app: &str, name: &str, album: &str, artist: &str) -> String {
    let (name, album, artist) = (escape_quotes(name), escape_quotes(album), escape_quotes(artist));
    format!(
        r#"tell application "{app}"
  reveal first track whose name is "{name}" and album is "{album}" and artist is "{artist}"
  activate
end tell"#
    )
}

pub fn play_playlist(app: &str, playlist_id: &str, shuffle: bool) -> String {
    let playlist_id = escape_quotes(playlist_id);
    format!(
        r#"tell application "{app}"
  set shuffle enabled to {shuffle}
  set song repeat to all
  play first playlist whose persistent ID is "{playlist_id}"
end tell"#
    )
}

/// Set the 0–100 rating of the library copy of the current track.
pub fn set_current_rating(app: &str, rating: u32) -> String {
    format!(
        r#"tell application "{app}"
  set matchingTrack to first track of (tracks of playlist "Library" whose name is name of current track as string and album is album of current track as string and artist is artist of current track as string)
  set rating of matchingTrack to {rating}
end tell"#
    )
}
