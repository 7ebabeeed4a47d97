//! Model variants and the backend seam.

mod backend;
mod variant;

pub use backend::{
    ModelFactory, ReferenceAudio, SamplingParams, SynthesisOutput, TtsModel, VoiceConfig,
};
pub use variant::{
    parse_model_variant, resolve_model_variant, ModelVariant, DESIGNED_SPEAKERS, PRESET_SPEAKERS,
};
