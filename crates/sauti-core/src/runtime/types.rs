//! Runtime request types and batch grouping keys.

use serde::{Deserialize, Serialize};

use crate::model::{ModelVariant, SamplingParams, VoiceConfig};

/// One or many text items to synthesize in a single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextInput {
    Single(String),
    Many(Vec<String>),
}

impl TextInput {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Single(text) => vec![text],
            Self::Many(texts) => texts,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(texts) => texts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for TextInput {
    fn from(text: &str) -> Self {
        Self::Single(text.to_string())
    }
}

impl From<String> for TextInput {
    fn from(text: String) -> Self {
        Self::Single(text)
    }
}

impl From<Vec<String>> for TextInput {
    fn from(texts: Vec<String>) -> Self {
        Self::Many(texts)
    }
}

/// A synthesis request as accepted by the engine, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisRequest {
    /// Canonical variant id, see `parse_model_variant`.
    pub model_id: String,

    pub text: TextInput,

    pub language: String,

    /// Speaker selector: a roster name, a profile id, or the design
    /// sentinel.
    pub speaker: String,

    /// Natural-language description of the desired voice.
    #[serde(default)]
    pub instruction: Option<String>,

    #[serde(default)]
    pub params: SamplingParams,
}

/// Equality class over every generation parameter except the text payload.
///
/// Two pending requests are merged into one physical call iff their keys
/// are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BatchKey {
    pub variant: ModelVariant,
    pub language: String,
    pub speaker: String,
    pub instruction: Option<String>,
    pub params: SamplingParams,
}

impl BatchKey {
    pub fn new(variant: ModelVariant, voice: &VoiceConfig) -> Self {
        Self {
            variant,
            language: voice.language.clone(),
            speaker: voice.speaker.clone(),
            instruction: voice.instruction.clone(),
            params: voice.params.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_input_deserializes_single_and_list() {
        let single: TextInput = serde_json::from_str(r#""hello""#).unwrap();
        assert_eq!(single.into_vec(), vec!["hello".to_string()]);

        let many: TextInput = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(many.len(), 2);
    }

    #[test]
    fn batch_keys_group_on_everything_but_text() {
        let voice = VoiceConfig {
            language: "en".into(),
            speaker: "amber".into(),
            speaker_profile: None,
            instruction: None,
            params: SamplingParams::default(),
        };
        let a = BatchKey::new(ModelVariant::Preset, &voice);
        let b = BatchKey::new(ModelVariant::Preset, &voice);
        assert_eq!(a, b);

        let mut other = voice.clone();
        other.speaker = "caleb".into();
        let c = BatchKey::new(ModelVariant::Preset, &other);
        assert_ne!(a, c);

        let d = BatchKey::new(ModelVariant::VoiceDesign, &voice);
        assert_ne!(a, d);
    }
}
