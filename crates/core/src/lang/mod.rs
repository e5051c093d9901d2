//! Language resources: phonesets, syllabification, grapheme-to-phoneme
//! rules, pronunciation dictionaries and orthographic tone rules.

pub mod g2p;
pub mod phoneset;
pub mod pronundict;
pub mod syllabify;
pub mod tones;

pub use g2p::{G2pError, RewriteRule, RewriteRules};
pub use phoneset::{Phoneset, StressGuesser, SyllabifierKind};
pub use pronundict::{PronunDict, PronunEntry, PronunLookupError, Pronunciation};
