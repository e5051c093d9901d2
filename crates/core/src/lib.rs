//! karoo-core: a text-to-speech engine core.
//!
//! Text goes in through a voice's utterance-processor pipeline, which
//! builds a heterogeneous relation graph (tokens, words, phrases,
//! syllables, segments) and hands it to a back end: unit selection with
//! residual-excited LPC resynthesis, or full-context label generation
//! for an external parametric engine.

pub mod features;
pub mod frontend;
pub mod hrg;
pub mod hts;
pub mod labels;
pub mod lang;
pub mod pipeline;
pub mod track;
pub mod unitsel;
pub mod voice;
pub mod voices;
pub mod waveform;

pub use hrg::{FeatureValue, ItemId, Utterance};
pub use pipeline::PipelineError;
pub use voice::{Backend, Voice};
pub use waveform::Waveform;
