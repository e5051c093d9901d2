//! Voice composition: phoneset + G2P + dictionaries + pipeline
//! configuration + synthesis backend, bundled behind one immutable
//! handle.
//!
//! A voice stays constant during synthesis; every stage receives `&Voice`
//! and an exclusive `&mut Utterance`, so parallel syntheses can share one
//! voice freely.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::frontend;
use crate::hrg::{HrgError, Utterance};
use crate::hts::EngineConfig;
use crate::labels::{self, LabelStyle};
use crate::lang::{Phoneset, PronunDict, RewriteRules};
use crate::pipeline::{self, PipelineError, PipelineStep, ProcessMap};
use crate::unitsel::{self, UnitCatalogue, UnitSelectionConfig};

impl From<HrgError> for PipelineError {
    fn from(e: HrgError) -> Self {
        // A duplicate-content append means a stage broke the relation
        // contract; surface it as a failed stage.
        PipelineError::StageNotDefined(e.to_string())
    }
}

/// The pronunciation resources for one language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LangResources {
    pub phoneset: Phoneset,
    pub g2p: RewriteRules,
    pub pronundict: PronunDict,
    /// Overlay consulted before the dictionary: word -> phones.
    pub addendum: BTreeMap<String, Vec<String>>,
    /// Plain word -> phones map consulted after the dictionary.
    pub raw_map: BTreeMap<String, Vec<String>>,
}

impl LangResources {
    pub fn new(phoneset: Phoneset, g2p: RewriteRules, pronundict: PronunDict) -> Self {
        LangResources {
            phoneset,
            g2p,
            pronundict,
            addendum: BTreeMap::new(),
            raw_map: BTreeMap::new(),
        }
    }

    /// Whether a word is listed in any of this language's lexicons.
    pub fn knows_word(&self, word: &str) -> bool {
        self.addendum.contains_key(word)
            || self.pronundict.contains(word)
            || self.raw_map.contains_key(word)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Characters stripped at token edges; the first/last stripped one is
    /// kept as prepunc/postpunc.
    pub punctuation: String,
    /// Apply NFKD plus stray/duplicate combining-mark repair up front.
    pub normalize_unicode: bool,
    /// Combining marks subject to repair.
    pub diacritics: Vec<char>,
    /// When set, tokens containing none of these characters (dangling
    /// diacritics and the like) are dropped.
    pub required_chars: Option<String>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        TokenizerConfig {
            punctuation: frontend::tokenize::DEFAULT_PUNCTUATION.to_string(),
            normalize_unicode: false,
            diacritics: Vec::new(),
            required_chars: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Tag each word with a language and route English words to the
    /// English resources.
    pub multilang: bool,
    /// ALL-CAPS tokens read as English.
    pub allcaps_english: bool,
    /// Prefer the English lexicon only for words longer than this.
    pub eng_word_threshold: usize,
    /// The language's standard grapheme inventory; words using characters
    /// outside it read as English.
    pub graphset: Option<String>,
    /// Store a pronunciation form with tone accents stripped (NFC).
    pub strip_tone_diacritics: bool,
    /// Insert word boundaries at internal capitals (KwaZulu -> kwa, zulu).
    pub uppercase_morph_split: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhrasingConfig {
    /// Punctuation opening a new phrase when found in a token's postpunc.
    pub punctuation: String,
    /// Words a new phrase opens before.
    pub conjunctions: BTreeSet<String>,
}

impl Default for PhrasingConfig {
    fn default() -> Self {
        PhrasingConfig {
            punctuation: frontend::phrasify::PHRASING_PUNCTUATION.to_string(),
            conjunctions: BTreeSet::new(),
        }
    }
}

/// How per-syllable marks are produced and stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToneConfig {
    /// Feature name on syllable items: "stress" or "tone".
    pub feature: String,
    /// Fall back to orthographic tone rules when the phoneset cannot
    /// guess stress.
    pub orthographic: bool,
    /// Mark used when nothing else applies.
    pub default_mark: char,
}

impl Default for ToneConfig {
    fn default() -> Self {
        ToneConfig { feature: "stress".into(), orthographic: false, default_mark: '0' }
    }
}

/// The waveform-producing back half of a voice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(clippy::large_enum_variant)]
pub enum Backend {
    /// Symbolic processing only.
    None,
    UnitSelection {
        catalogue: UnitCatalogue,
        config: UnitSelectionConfig,
    },
    Engine {
        config: EngineConfig,
        labels: LabelStyle,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    pub main: LangResources,
    /// English resources for multi-language voices.
    pub english: Option<LangResources>,
    pub tokenizer: TokenizerConfig,
    pub normalizer: NormalizerConfig,
    pub phrasing: PhrasingConfig,
    pub tone: ToneConfig,
    pub processes: ProcessMap,
    pub backend: Backend,
}

impl Voice {
    /// A symbolic-only voice with the standard process table.
    pub fn new(name: &str, main: LangResources) -> Self {
        Voice {
            name: name.to_string(),
            main,
            english: None,
            tokenizer: TokenizerConfig::default(),
            normalizer: NormalizerConfig::default(),
            phrasing: PhrasingConfig::default(),
            tone: ToneConfig::default(),
            processes: pipeline::standard_processes(),
            backend: Backend::None,
        }
    }

    /// Install a backend and the synthesis processes it supports.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        match &backend {
            Backend::None => {}
            Backend::UnitSelection { .. } => {
                self.processes.insert(
                    "text-to-units".into(),
                    with_synth_step(pipeline::frontend_steps(), "targetunits"),
                );
                self.processes.insert(
                    "text-to-wave".into(),
                    with_synth_step(pipeline::frontend_steps(), "synth"),
                );
            }
            Backend::Engine { .. } => {
                self.processes.insert(
                    "text-to-label".into(),
                    with_synth_step(pipeline::frontend_steps(), "label_only"),
                );
                self.processes.insert(
                    "text-to-wave".into(),
                    with_synth_step(pipeline::frontend_steps(), "label_and_synth"),
                );
                self.processes.insert(
                    "utt-to-wave".into(),
                    vec![PipelineStep::with_sub("synthesize", "label_and_synth")],
                );
            }
        }
        self.backend = backend;
        self
    }

    /// Load a voice definition file (JSON). The loaded graph carries no
    /// reference to process-global state.
    pub fn from_file(path: &Path) -> Result<Voice> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read voice file: {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse voice file: {}", path.display()))
    }

    pub fn to_file(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string(self).context("Failed to serialize voice")?;
        std::fs::write(path, data)
            .with_context(|| format!("Failed to write voice file: {}", path.display()))
    }

    // ─── Phone-level views across languages ──────────────────────

    /// Engine symbol for a phone, routing `eng_` phones through the
    /// English phoneset.
    pub fn phone_symbol(&self, phone: &str) -> String {
        if let (Some(stripped), Some(eng)) = (phone.strip_prefix("eng_"), &self.english) {
            return format!("eng_{}", eng.phoneset.symbol(stripped));
        }
        self.main.phoneset.symbol(phone).to_string()
    }

    /// Vowel test across the voice's phonesets.
    pub fn is_vowel_phone(&self, phone: &str) -> bool {
        if let (Some(stripped), Some(eng)) = (phone.strip_prefix("eng_"), &self.english) {
            return eng.phoneset.is_vowel(stripped);
        }
        self.main.phoneset.is_vowel(phone)
    }

    pub fn silence_phone(&self) -> &str {
        &self.main.phoneset.silence_phone
    }

    // ─── Pipeline execution ──────────────────────────────────────

    /// Run a named process over an utterance.
    pub fn run_process(&self, utt: &mut Utterance, process: &str) -> Result<(), PipelineError> {
        let steps = self
            .processes
            .get(process)
            .ok_or_else(|| PipelineError::ProcessNotDefined(process.to_string()))?
            .clone();
        for step in steps {
            self.run_stage(utt, &step)?;
        }
        Ok(())
    }

    fn run_stage(&self, utt: &mut Utterance, step: &PipelineStep) -> Result<(), PipelineError> {
        match step.stage.as_str() {
            "tokenize" => frontend::tokenize::run(self, utt),
            "normalize" => frontend::normalize::run(self, utt),
            "phrasify" => frontend::phrasify::run(self, utt),
            "phonetize" => frontend::phonetize::run(self, utt),
            "pauses" => frontend::pauses::run(self, utt),
            "synthesize" => self.run_backend(utt, step.subprocess.as_deref()),
            other => Err(PipelineError::StageNotDefined(other.to_string())),
        }
    }

    fn run_backend(&self, utt: &mut Utterance, sub: Option<&str>) -> Result<(), PipelineError> {
        match &self.backend {
            Backend::None => {
                log::warn!("voice '{}' has no synthesis backend", self.name);
                Ok(())
            }
            Backend::UnitSelection { catalogue, config } => {
                let sub = sub.unwrap_or("synth");
                let steps: &[&str] = match sub {
                    "targetunits" => &["targetunits"],
                    "selectunits" => &["targetunits", "selectunits"],
                    "synth" => &["targetunits", "selectunits", "concat"],
                    other => return Err(PipelineError::ProcessNotDefined(other.to_string())),
                };
                for stage in steps {
                    match *stage {
                        "targetunits" => unitsel::target_units(utt, config.unit_type)?,
                        "selectunits" => {
                            if let Err(e) = unitsel::select_units(utt, catalogue, config) {
                                log::error!("unit selection failed: {e}");
                                return Ok(());
                            }
                        }
                        "concat" => {
                            if let Err(e) = unitsel::concat_units(utt) {
                                log::error!("unit concatenation failed: {e}");
                                return Ok(());
                            }
                        }
                        _ => unreachable!(),
                    }
                }
                Ok(())
            }
            Backend::Engine { config, labels: style } => {
                let sub = sub.unwrap_or("label_and_synth");
                let (label, synth) = match sub {
                    "label_only" => (true, false),
                    "label_and_synth" => (true, true),
                    "synth_only" => (false, true),
                    other => return Err(PipelineError::ProcessNotDefined(other.to_string())),
                };
                if label {
                    utt.labels = labels::build(utt, self, *style);
                }
                if synth {
                    if let Err(e) = config.synthesize(utt) {
                        // Engine failure is observable as a missing
                        // waveform; the symbolic content stays usable.
                        log::error!("parametric engine failed: {e:#}");
                    }
                }
                Ok(())
            }
        }
    }

    // ─── Entry points ────────────────────────────────────────────

    /// Render an input string through a named process, returning the
    /// utterance whatever the back end managed to produce.
    pub fn synthesize(&self, text: &str, process: &str) -> Result<Utterance, PipelineError> {
        let mut utt = Utterance::from_text(text);
        utt.features.insert("voicename".into(), self.name.as_str().into());
        self.run_process(&mut utt, process)?;
        Ok(utt)
    }

    /// Re-run a process over an existing utterance (e.g. one restored
    /// from disk).
    pub fn resynthesize(&self, utt: &mut Utterance, process: &str) -> Result<(), PipelineError> {
        self.run_process(utt, process)
    }
}

fn with_synth_step(mut steps: Vec<PipelineStep>, sub: &str) -> Vec<PipelineStep> {
    steps.push(PipelineStep::with_sub("synthesize", sub));
    steps
}
