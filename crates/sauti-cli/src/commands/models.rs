//! Model variant inspection.

use sauti_core::ModelVariant;

pub fn list() -> anyhow::Result<()> {
    for variant in ModelVariant::all() {
        println!("{} ({})", variant.id(), variant.display_name());
        println!("  Languages:       {}", variant.supported_languages().join(", "));
        match variant.preset_speakers() {
            Some(roster) => println!("  Speakers:        {}", roster.join(", ")),
            None => println!("  Speakers:        from stored speaker profiles"),
        }
        println!(
            "  Custom speakers: {}",
            if variant.supports_custom_speakers() {
                "supported"
            } else {
                "not supported"
            }
        );
        if variant.requires_instruction() {
            println!("  Requires a voice instruction");
        }
        println!();
    }
    Ok(())
}
