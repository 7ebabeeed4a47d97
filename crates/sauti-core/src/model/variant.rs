//! Model variant capability metadata and parser utilities.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Loadable model variants.
///
/// Variants differ in how a voice is selected, not in how they are driven:
/// callers branch on the capability accessors below, never on the concrete
/// backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelVariant {
    /// Fixed roster of built-in voices.
    #[serde(rename = "preset-voice")]
    Preset,
    /// Clones a voice from a stored speaker profile.
    #[serde(rename = "voice-clone")]
    VoiceClone,
    /// Designs a voice from a natural-language description.
    #[serde(rename = "voice-design")]
    VoiceDesign,
}

/// Built-in voices of the preset variant.
pub const PRESET_SPEAKERS: &[&str] = &[
    "amber", "caleb", "dana", "felix", "iris", "jonas", "mira", "noel", "sora",
];

/// Sentinel speaker accepted by the voice-design variant: the voice is
/// produced from the instruction, not picked from a roster.
pub const DESIGNED_SPEAKERS: &[&str] = &["generated"];

const PRESET_LANGUAGES: &[&str] = &["zh", "en", "ja", "ko", "de", "fr", "ru", "pt", "es", "it"];

const NAMED_LANGUAGES: &[&str] = &[
    "auto",
    "chinese",
    "english",
    "french",
    "german",
    "italian",
    "japanese",
    "korean",
    "portuguese",
    "russian",
    "spanish",
];

impl ModelVariant {
    pub fn all() -> &'static [ModelVariant] {
        &[Self::Preset, Self::VoiceClone, Self::VoiceDesign]
    }

    /// Stable string identifier, accepted back by [`parse_model_variant`].
    pub fn id(&self) -> &'static str {
        match self {
            Self::Preset => "preset-voice",
            Self::VoiceClone => "voice-clone",
            Self::VoiceDesign => "voice-design",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Preset => "Preset voices",
            Self::VoiceClone => "Voice cloning",
            Self::VoiceDesign => "Voice design",
        }
    }

    pub fn supported_languages(&self) -> &'static [&'static str] {
        match self {
            Self::Preset => PRESET_LANGUAGES,
            Self::VoiceClone | Self::VoiceDesign => NAMED_LANGUAGES,
        }
    }

    pub fn supports_language(&self, language: &str) -> bool {
        self.supported_languages().contains(&language)
    }

    /// Static speaker roster, or `None` when speakers come from stored
    /// profiles.
    pub fn preset_speakers(&self) -> Option<&'static [&'static str]> {
        match self {
            Self::Preset => Some(PRESET_SPEAKERS),
            Self::VoiceClone => None,
            Self::VoiceDesign => Some(DESIGNED_SPEAKERS),
        }
    }

    /// Whether new speaker profiles can be created against this variant.
    pub fn supports_custom_speakers(&self) -> bool {
        matches!(self, Self::VoiceClone)
    }

    /// Whether a voice instruction is mandatory.
    pub fn requires_instruction(&self) -> bool {
        matches!(self, Self::VoiceDesign)
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Parse a canonical variant id. Unknown ids are an error.
pub fn parse_model_variant(id: &str) -> Result<ModelVariant> {
    ModelVariant::all()
        .iter()
        .find(|variant| variant.id() == id)
        .copied()
        .ok_or_else(|| Error::ModelNotFound(id.to_string()))
}

/// Resolve a caller-facing model name to a variant, accepting the aliases
/// external clients commonly send. Falls back to the preset variant.
pub fn resolve_model_variant(name: &str) -> ModelVariant {
    if let Ok(variant) = parse_model_variant(name) {
        return variant;
    }

    let lowered = name.to_lowercase();
    if lowered == "tts-1" || lowered == "tts-1-hd" {
        ModelVariant::Preset
    } else if lowered.contains("clone") || lowered.contains("custom") {
        ModelVariant::VoiceClone
    } else if lowered.contains("design") {
        ModelVariant::VoiceDesign
    } else {
        ModelVariant::Preset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_canonical_ids() {
        assert_eq!(
            parse_model_variant("preset-voice").unwrap(),
            ModelVariant::Preset
        );
        assert_eq!(
            parse_model_variant("voice-clone").unwrap(),
            ModelVariant::VoiceClone
        );
        assert_eq!(
            parse_model_variant("voice-design").unwrap(),
            ModelVariant::VoiceDesign
        );
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!(parse_model_variant("tts-9000").is_err());
        assert!(parse_model_variant("").is_err());
    }

    #[test]
    fn resolve_accepts_public_aliases() {
        assert_eq!(resolve_model_variant("tts-1"), ModelVariant::Preset);
        assert_eq!(resolve_model_variant("TTS-1-HD"), ModelVariant::Preset);
        assert_eq!(
            resolve_model_variant("my-custom-voice"),
            ModelVariant::VoiceClone
        );
        assert_eq!(
            resolve_model_variant("voice-designer-v2"),
            ModelVariant::VoiceDesign
        );
    }

    #[test]
    fn resolve_falls_back_to_preset() {
        assert_eq!(resolve_model_variant("whatever"), ModelVariant::Preset);
    }

    #[test]
    fn capability_flags() {
        assert!(ModelVariant::VoiceClone.supports_custom_speakers());
        assert!(!ModelVariant::Preset.supports_custom_speakers());
        assert!(ModelVariant::VoiceDesign.requires_instruction());
        assert!(ModelVariant::VoiceClone.preset_speakers().is_none());
        assert!(ModelVariant::Preset.supports_language("en"));
        assert!(!ModelVariant::Preset.supports_language("english"));
        assert!(ModelVariant::VoiceClone.supports_language("auto"));
    }
}
