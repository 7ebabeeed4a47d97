//! The model backend seam.
//!
//! Backends own the resource-resident model instance (accelerator memory,
//! compiled graphs). This crate only drives them: a blocking batched
//! synthesis call, an explicit teardown, and an optional speaker-profile
//! creation hook.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::ModelVariant;
use crate::storage::SpeakerProfile;

/// Sampling knobs forwarded to the backend.
///
/// Floats compare and hash by bit pattern so the struct can participate in
/// batch-key equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplingParams {
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub top_p: Option<f32>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub repetition_penalty: Option<f32>,
    #[serde(default)]
    pub max_new_tokens: Option<usize>,
}

impl SamplingParams {
    #[allow(clippy::type_complexity)]
    fn key(&self) -> (Option<usize>, Option<u32>, Option<u32>, Option<u32>, Option<usize>) {
        (
            self.top_k,
            self.top_p.map(f32::to_bits),
            self.temperature.map(f32::to_bits),
            self.repetition_penalty.map(f32::to_bits),
            self.max_new_tokens,
        )
    }
}

impl PartialEq for SamplingParams {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for SamplingParams {}

impl Hash for SamplingParams {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Every generation parameter except the text payload, resolved and
/// validated by the engine before submission.
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    pub language: String,
    /// Resolved speaker selector: a roster name, a profile id, or the
    /// design sentinel.
    pub speaker: String,
    /// Stored profile backing the speaker, for variants with dynamic
    /// rosters.
    pub speaker_profile: Option<SpeakerProfile>,
    pub instruction: Option<String>,
    pub params: SamplingParams,
}

/// Result of one physical synthesis call: one clip per input text, plus the
/// sample rate shared by all clips.
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    pub clips: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

impl SynthesisOutput {
    pub fn duration_secs(&self) -> f32 {
        let samples: usize = self.clips.iter().map(Vec::len).sum();
        samples as f32 / self.sample_rate as f32
    }
}

/// Reference recording used to create a speaker profile.
#[derive(Debug, Clone)]
pub struct ReferenceAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// A loaded, resource-resident model instance.
///
/// `synthesize` is long-running and blocking; callers must run it off the
/// async context (the batcher does this on the blocking worker pool).
pub trait TtsModel: Send + Sync {
    fn variant(&self) -> ModelVariant;

    /// Synthesize one clip per input text. All texts in a call share the
    /// same voice configuration.
    fn synthesize(&self, texts: &[String], voice: &VoiceConfig) -> Result<SynthesisOutput>;

    /// Produce an opaque speaker-profile payload from a reference
    /// recording. Only variants with `supports_custom_speakers` implement
    /// this.
    fn create_speaker_profile(
        &self,
        _name: &str,
        _reference_audio: &ReferenceAudio,
        _reference_text: &str,
    ) -> Result<Vec<u8>> {
        Err(Error::InvalidInput(format!(
            "{} does not support custom speakers",
            self.variant()
        )))
    }

    /// Release the resources backing this instance (accelerator memory,
    /// compiled graphs). Called by the cache on eviction and removal.
    fn unload(&self) -> Result<()>;
}

/// Creates model instances on demand. Supplied by the embedding
/// application; `load` is blocking and may take a long time.
pub trait ModelFactory: Send + Sync {
    fn load(&self, variant: ModelVariant, device: &str) -> Result<Arc<dyn TtsModel>>;
}
