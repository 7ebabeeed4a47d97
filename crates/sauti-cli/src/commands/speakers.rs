//! Speaker profile inspection.

use sauti_core::SpeakerStore;

pub fn list(speakers: &SpeakerStore) -> anyhow::Result<()> {
    let profiles = speakers.list()?;
    if profiles.is_empty() {
        println!("No speaker profiles stored.");
        return Ok(());
    }

    for profile in &profiles {
        println!(
            "{}  {}  ({} bytes, created {})",
            profile.id,
            profile.name,
            profile.data.len(),
            profile
                .created_at
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        );
    }
    println!("{} profile(s)", profiles.len());
    Ok(())
}
