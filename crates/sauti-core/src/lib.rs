//! Sauti Core - Text-to-Speech Serving Core
//!
//! This crate coordinates access to a small set of heavyweight, memory-bound
//! TTS model instances. It provides:
//!
//! - A bounded, LRU-evicting [`ModelCache`] that loads models on demand
//!   through a caller-supplied [`ModelFactory`]
//! - An [`InferenceBatcher`] that coalesces concurrent compatible requests
//!   into single physical calls to the blocking model backend
//! - An auth token lifecycle ([`TokenStore`]) guarding every request with
//!   opaque bearer credentials
//!
//! The generation call itself is opaque to this crate: backends implement
//! the [`TtsModel`] trait and are created by a [`ModelFactory`] supplied at
//! engine construction.
//!
//! # Example
//!
//! ```ignore
//! use sauti_core::{EngineConfig, SynthesisEngine, SynthesisRequest};
//!
//! let engine = SynthesisEngine::new(EngineConfig::default(), factory, speakers);
//! let output = engine.synthesize(SynthesisRequest {
//!     model_id: "preset-voice".into(),
//!     text: "Hello, world!".into(),
//!     language: "en".into(),
//!     speaker: "amber".into(),
//!     instruction: None,
//!     params: Default::default(),
//! }).await?;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod model;
pub mod runtime;
pub mod storage;

pub use config::EngineConfig;
pub use error::{Error, Result};

pub use model::{
    parse_model_variant, resolve_model_variant, ModelFactory, ModelVariant, ReferenceAudio,
    SamplingParams, SynthesisOutput, TtsModel, VoiceConfig,
};

pub use runtime::{
    BatchKey, InferenceBatcher, ModelCache, SynthesisEngine, SynthesisRequest, TextInput,
};

pub use auth::{AuthTokenRecord, TokenStore, TOKEN_PREFIX};

pub use storage::{Database, SpeakerProfile, SpeakerStore};
