//! Synthesis orchestration: model resolution, residency, batching.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::model::{
    parse_model_variant, ModelFactory, ModelVariant, ReferenceAudio, SynthesisOutput, TtsModel,
    VoiceConfig,
};
use crate::runtime::batcher::InferenceBatcher;
use crate::runtime::model_cache::ModelCache;
use crate::runtime::types::{BatchKey, SynthesisRequest};
use crate::storage::{SpeakerProfile, SpeakerStore};

/// Coordinates model residency and request batching for synthesis calls.
///
/// Requests flow: resolve the variant, validate language and speaker,
/// obtain a handle from the cache (loading through the factory on a miss),
/// then submit to the batcher and hand back only this caller's slice.
/// Credential checks happen before any of this, in the token store.
pub struct SynthesisEngine {
    config: EngineConfig,
    factory: Arc<dyn ModelFactory>,
    cache: ModelCache,
    batcher: InferenceBatcher,
    speakers: SpeakerStore,
}

impl SynthesisEngine {
    pub fn new(
        config: EngineConfig,
        factory: Arc<dyn ModelFactory>,
        speakers: SpeakerStore,
    ) -> Self {
        let cache = ModelCache::new(config.max_loaded_models, config.coalesce_loads);
        Self {
            config,
            factory,
            cache,
            batcher: InferenceBatcher::new(),
            speakers,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    pub fn speakers(&self) -> &SpeakerStore {
        &self.speakers
    }

    /// Validate, batch, and run one synthesis request.
    pub async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisOutput> {
        let variant = parse_model_variant(&request.model_id)?;

        let texts = request.text.into_vec();
        if texts.is_empty() || texts.iter().any(|text| text.trim().is_empty()) {
            return Err(Error::InvalidInput("text items must be non-empty".into()));
        }

        if !variant.supports_language(&request.language) {
            return Err(Error::InvalidInput(format!(
                "Unsupported language '{}'. Supported: {}",
                request.language,
                variant.supported_languages().join(", ")
            )));
        }

        let (speaker, speaker_profile) = self.resolve_speaker(variant, &request.speaker)?;

        let instruction = request.instruction.filter(|i| !i.trim().is_empty());
        if variant.requires_instruction() && instruction.is_none() {
            return Err(Error::InvalidInput(
                "an instruction describing the desired voice is required".into(),
            ));
        }

        let handle = self.model(variant).await?;

        let voice = VoiceConfig {
            language: request.language,
            speaker,
            speaker_profile,
            instruction,
            params: request.params,
        };
        let key = BatchKey::new(variant, &voice);

        let model = Arc::clone(&handle);
        self.batcher
            .submit(key, texts, move |combined| model.synthesize(&combined, &voice))
            .await
    }

    /// Fetch the resident handle for a variant, loading it on a miss.
    pub async fn model(&self, variant: ModelVariant) -> Result<Arc<dyn TtsModel>> {
        let factory = Arc::clone(&self.factory);
        let device = self.config.device.clone();
        self.cache
            .get_or_load(variant, || async move {
                // The factory call is slow and resource-acquiring; keep it
                // off the async context.
                tokio::task::spawn_blocking(move || factory.load(variant, &device))
                    .await
                    .map_err(|err| Error::ModelLoadError(format!("loader task failed: {err}")))?
            })
            .await
    }

    /// Create and persist a speaker profile through a capable backend.
    pub async fn create_speaker(
        &self,
        variant: ModelVariant,
        name: &str,
        reference_audio: ReferenceAudio,
        reference_text: &str,
    ) -> Result<SpeakerProfile> {
        if !variant.supports_custom_speakers() {
            return Err(Error::InvalidInput(format!(
                "{variant} does not support custom speakers"
            )));
        }

        let handle = self.model(variant).await?;
        let owned_name = name.to_string();
        let owned_text = reference_text.to_string();
        let payload = tokio::task::spawn_blocking(move || {
            handle.create_speaker_profile(&owned_name, &reference_audio, &owned_text)
        })
        .await
        .map_err(|err| Error::ModelLoadError(format!("profile task failed: {err}")))??;

        let profile = self.speakers.create(name, payload)?;
        info!(speaker = %profile.id, name = %profile.name, "Created speaker profile");
        Ok(profile)
    }

    fn resolve_speaker(
        &self,
        variant: ModelVariant,
        selector: &str,
    ) -> Result<(String, Option<SpeakerProfile>)> {
        match variant.preset_speakers() {
            Some(roster) => {
                let name = roster
                    .iter()
                    .find(|speaker| speaker.eq_ignore_ascii_case(selector))
                    .ok_or_else(|| {
                        Error::InvalidInput(format!(
                            "Unknown speaker '{selector}'. Available speakers: {}",
                            roster.join(", ")
                        ))
                    })?;
                Ok(((*name).to_string(), None))
            }
            None => {
                let id = Uuid::parse_str(selector).map_err(|_| {
                    Error::InvalidInput(format!("Invalid speaker id: {selector}"))
                })?;
                let profile = self
                    .speakers
                    .get(id)?
                    .ok_or_else(|| Error::NotFound(format!("speaker {id}")))?;
                Ok((profile.id.to_string(), Some(profile)))
            }
        }
    }
}
