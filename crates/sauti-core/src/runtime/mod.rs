//! Request coordination: model residency, batching, and the synthesis
//! facade.

pub mod batcher;
pub mod model_cache;
pub mod service;
pub mod types;

pub use batcher::InferenceBatcher;
pub use model_cache::ModelCache;
pub use service::SynthesisEngine;
pub use types::{BatchKey, SynthesisRequest, TextInput};
