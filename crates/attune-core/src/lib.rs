//! attune-core — headless Apple Music control.
//!
//! Talks to the running Music app over osascript, marshals query results
//! through a delimited text wire format, and caches decoded entities with
//! per-call TTLs so repeated invocations skip the slow bridge.

pub mod artwork;
pub mod bridge;
pub mod cache;
pub mod client;
pub mod config;
pub mod models;
pub mod platform;
pub mod query;
pub mod scripts;

pub use bridge::{Bridge, Osascript, ScriptError};
pub use cache::TtlCache;
pub use client::MusicClient;
pub use config::Config;
