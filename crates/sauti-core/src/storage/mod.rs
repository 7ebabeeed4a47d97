//! SQLite-backed persistence for tokens and speaker profiles.

mod database;
mod speakers;

pub use database::Database;
pub use speakers::{SpeakerProfile, SpeakerStore};
