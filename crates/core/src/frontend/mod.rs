//! The linguistic front end: pipeline stages building tokens, words,
//! phrases, syllables and segments on the utterance graph.

pub mod normalize;
pub mod pauses;
pub mod phonetize;
pub mod phrasify;
pub mod tokenize;
