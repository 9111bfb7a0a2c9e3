//! attune — control the Music app from the terminal.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use attune_core::models::{display_duration, MusicState, PlayerState, RepeatMode, Track};
use attune_core::{Config, MusicClient, Osascript};

#[derive(Parser)]
#[command(name = "attune")]
#[command(about = "Control Apple Music from the terminal")]
struct Args {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Show the current track
    Now,
    /// Show the player state (playing / repeat / shuffle)
    State,
    /// Resume playback, or play the first library track matching QUERY
    Play {
        /// Track name to search for in the library
        query: Option<String>,
    },
    /// Pause playback
    Pause,
    /// Toggle play/pause
    Toggle,
    /// Stop playback
    Stop,
    /// Skip to the next track
    Next,
    /// Go back to the previous track
    Prev,
    /// Restart the current track
    Restart,
    /// List library tracks
    Tracks {
        /// Bypass the cache and re-query the library
        #[arg(long)]
        no_cache: bool,
    },
    /// List playlists
    Playlists {
        #[arg(long)]
        no_cache: bool,
    },
    /// List the track ids of a playlist
    PlaylistTracks {
        /// Playlist persistent ID
        id: String,
    },
    /// Play a playlist by persistent ID
    PlayPlaylist {
        id: String,
        #[arg(long)]
        shuffle: bool,
    },
    /// Get the volume, or set it when N is given
    Volume {
        /// 0–100
        n: Option<u32>,
    },
    /// Rate the current track, 0–5 stars
    Rate { stars: f32 },
    /// Favorite the current track
    Favorite,
    /// Dislike the current track
    Dislike,
    /// Turn shuffle on or off
    Shuffle {
        #[arg(value_parser = ["on", "off"])]
        state: String,
    },
    /// Set the repeat mode
    Repeat {
        #[arg(value_parser = ["off", "one", "all"])]
        mode: String,
    },
    /// Re-fetch tracks and playlists, overwriting the cache
    RefreshCache,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load().context("loading config")?;
    debug!("config loaded from {:?}", Config::config_path());
    let client = MusicClient::<Osascript>::from_config(&config);

    match args.command {
        Cmd::Now => match client.current_track().await? {
            Some(track) => print_track_detail(&track),
            None => println!("Nothing playing."),
        },
        Cmd::State => print_state(&client.music_state().await?),
        Cmd::Play { query: None } => client.play().await?,
        Cmd::Play { query: Some(q) } => {
            let tracks = client.all_tracks(true).await?;
            let needle = q.to_lowercase();
            match tracks
                .iter()
                .find(|t| t.name.to_lowercase().contains(&needle))
            {
                Some(track) => {
                    client.play_track(track).await?;
                    println!("Playing {} — {}", track.name, track.artist);
                }
                None => anyhow::bail!("no library track matching {q:?}"),
            }
        }
        Cmd::Pause => client.pause().await?,
        Cmd::Toggle => client.toggle_play().await?,
        Cmd::Stop => client.stop().await?,
        Cmd::Next => client.next_track().await?,
        Cmd::Prev => client.previous_track().await?,
        Cmd::Restart => client.restart_track().await?,
        Cmd::Tracks { no_cache } => {
            for track in client.all_tracks(!no_cache).await? {
                println!(
                    "{}\t{} — {} ({})",
                    track.id, track.name, track.artist, track.album
                );
            }
        }
        Cmd::Playlists { no_cache } => {
            for playlist in client.playlists(!no_cache).await? {
                println!(
                    "{}\t{} ({} tracks, {})",
                    playlist.id,
                    playlist.name,
                    playlist.count,
                    display_duration(playlist.duration)
                );
            }
        }
        Cmd::PlaylistTracks { id } => {
            for track_id in client.playlist_track_ids(&id, true).await? {
                println!("{track_id}");
            }
        }
        Cmd::PlayPlaylist { id, shuffle } => client.play_playlist(&id, shuffle).await?,
        Cmd::Volume { n: None } => println!("{}", client.get_volume().await?),
        Cmd::Volume { n: Some(n) } => client.set_volume(n).await?,
        Cmd::Rate { stars } => client.set_rating(stars).await?,
        Cmd::Favorite => client.favorite().await?,
        Cmd::Dislike => client.dislike().await?,
        Cmd::Shuffle { state } => client.set_shuffle(state == "on").await?,
        Cmd::Repeat { mode } => {
            let mode = match mode.as_str() {
                "one" => RepeatMode::One,
                "all" => RepeatMode::All,
                _ => RepeatMode::Off,
            };
            client.set_repeat(mode).await?;
        }
        Cmd::RefreshCache => {
            client.refresh_cache().await?;
            println!("Cache refreshed.");
        }
    }

    Ok(())
}

fn print_track_detail(track: &Track) {
    println!("{} — {}", track.name, track.artist);
    println!("  album:  {}", track.album);
    if !track.genre.is_empty() {
        println!("  genre:  {}", track.genre);
    }
    if !track.time.is_empty() {
        println!("  time:   {}", track.time);
    }
    if track.rating > 0.0 {
        println!("  rating: {:.1}/5", track.rating);
    }
    println!("  plays:  {}", track.played_count);
    if let Some(artwork) = &track.artwork {
        println!("  art:    {artwork}");
    }
}

fn print_state(state: &MusicState) {
    match state.playing {
        PlayerState::Stopped => println!("stopped"),
        _ => {
            println!("{}: {} — {}", state.playing.label(), state.name, state.artist);
        }
    }
    println!(
        "  shuffle {} / repeat {}",
        if state.shuffle { "on" } else { "off" },
        state.repeat.label()
    );
}
