//! Unit-selection synthesis: target-unit construction over the utterance
//! graph, Viterbi search against a waveform-unit catalogue, and
//! residual-excited LPC resynthesis.

pub mod relp;
pub mod viterbi;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hrg::{HrgError, ItemId, Utterance};
use crate::track::Track;

pub use viterbi::select_units;

/// Fixed output rate of the resynthesis filter.
pub const SAMPLERATE: u32 = 16_000;

#[derive(Debug, Error)]
pub enum UnitSelectionError {
    #[error("utterance needs a 'Unit' relation")]
    MissingUnitRelation,
    #[error("no candidates in catalogue for target unit '{0}'")]
    NoCandidates(String),
    #[error("no units selected; run the search first")]
    NoSelection,
}

/// Target or candidate unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitType {
    HalfPhone,
    Word,
}

/// Linguistic context compared between a target and a candidate. Absent
/// fields compare equal when absent on both sides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitFeatures {
    pub num_syls: Option<i64>,
    pub position_in_syl: Option<String>,
    pub position_in_word: Option<String>,
    pub position_in_phrase: Option<String>,
    pub context_prevsegment: Option<String>,
    pub context_nextsegment: Option<String>,
    pub context_prevword: Option<String>,
    pub context_nextword: Option<String>,
}

/// One catalogue entry: a recorded unit with its join coefficients and
/// the LPC track + residual the filter consumes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogueUnit {
    pub name: String,
    pub features: UnitFeatures,
    pub left_joincoef: Vec<f64>,
    pub right_joincoef: Vec<f64>,
    /// Pitch-synchronous LPC frames; each frame is `[gain, a1..ap]` and
    /// the leading gain element is not used by the filter.
    pub lpc: Track,
    pub residual: Vec<f64>,
}

/// Read-only unit inventory shared by every synthesis. Candidates are
/// handed out by reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitCatalogue {
    pub units: BTreeMap<String, Vec<Arc<CatalogueUnit>>>,
}

impl UnitCatalogue {
    pub fn candidates(&self, name: &str) -> &[Arc<CatalogueUnit>] {
        self.units.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn add(&mut self, unit: CatalogueUnit) {
        self.units.entry(unit.name.clone()).or_default().push(Arc::new(unit));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitSelectionConfig {
    pub unit_type: UnitType,
    /// Candidates scoring below `best * (1 - prune_delta)` are dropped.
    pub prune_delta: f64,
    /// Survivor cap per trellis column.
    pub prune_top_k: usize,
}

impl Default for UnitSelectionConfig {
    fn default() -> Self {
        UnitSelectionConfig {
            unit_type: UnitType::HalfPhone,
            prune_delta: 0.01,
            prune_top_k: 100,
        }
    }
}

// ─── Segment context extractors ──────────────────────────────────

/// Number of syllables of the word the segment belongs to.
fn count_syls(utt: &Utterance, seg: ItemId) -> Option<i64> {
    let seg_ss = utt.item_in_relation(seg, "SylStructure")?;
    let word = utt.parent(utt.parent(seg_ss)?)?;
    Some(utt.num_daughters(word) as i64)
}

fn edge_position(prev: bool, next: bool) -> Option<String> {
    match (prev, next) {
        (true, true) => Some("medial".to_string()),
        (false, true) => Some("initial".to_string()),
        (true, false) => Some("final".to_string()),
        (false, false) => None,
    }
}

/// Position of the segment in its syllable: initial/medial/final.
fn syl_position(utt: &Utterance, seg: ItemId) -> Option<String> {
    let seg_ss = utt.item_in_relation(seg, "SylStructure")?;
    edge_position(utt.prev(seg_ss).is_some(), utt.next(seg_ss).is_some())
}

/// Position of the segment's syllable in its word.
fn word_position(utt: &Utterance, seg: ItemId) -> Option<String> {
    let syl = utt.parent(utt.item_in_relation(seg, "SylStructure")?)?;
    edge_position(utt.prev(syl).is_some(), utt.next(syl).is_some())
}

/// Position of the segment's word in its phrase.
fn phrase_position(utt: &Utterance, seg: ItemId) -> Option<String> {
    let seg_ss = utt.item_in_relation(seg, "SylStructure")?;
    let word = utt.parent(utt.parent(seg_ss)?)?;
    edge_position(utt.prev(word).is_some(), utt.next(word).is_some())
}

/// The context features of one target segment.
fn segment_features(utt: &Utterance, seg: ItemId) -> UnitFeatures {
    UnitFeatures {
        num_syls: count_syls(utt, seg),
        position_in_syl: syl_position(utt, seg),
        position_in_word: word_position(utt, seg),
        position_in_phrase: phrase_position(utt, seg),
        context_prevsegment: utt.prev(seg).and_then(|p| utt.name(p)).map(str::to_string),
        context_nextsegment: utt.next(seg).and_then(|n| utt.name(n)).map(str::to_string),
        context_prevword: None,
        context_nextword: None,
    }
}

fn set_opt_int(utt: &mut Utterance, item: ItemId, name: &str, value: Option<i64>) {
    if let Some(v) = value {
        utt.set_feature(item, name, v);
    }
}

fn set_opt_str(utt: &mut Utterance, item: ItemId, name: &str, value: Option<String>) {
    if let Some(v) = value {
        utt.set_feature(item, name, v);
    }
}

fn attach_features(utt: &mut Utterance, unit: ItemId, features: &UnitFeatures) {
    set_opt_int(utt, unit, "num_syls", features.num_syls);
    set_opt_str(utt, unit, "position_in_syl", features.position_in_syl.clone());
    set_opt_str(utt, unit, "position_in_word", features.position_in_word.clone());
    set_opt_str(utt, unit, "position_in_phrase", features.position_in_phrase.clone());
    set_opt_str(utt, unit, "context_prevsegment", features.context_prevsegment.clone());
    set_opt_str(utt, unit, "context_nextsegment", features.context_nextsegment.clone());
    set_opt_str(utt, unit, "context_prevword", features.context_prevword.clone());
    set_opt_str(utt, unit, "context_nextword", features.context_nextword.clone());
}

/// Rebuild target features from a Unit item.
pub(crate) fn unit_features(utt: &Utterance, unit: ItemId) -> UnitFeatures {
    let get_str = |name: &str| utt.feature_str(unit, name).map(str::to_string);
    UnitFeatures {
        num_syls: utt.feature(unit, "num_syls").and_then(|v| v.as_int()),
        position_in_syl: get_str("position_in_syl"),
        position_in_word: get_str("position_in_word"),
        position_in_phrase: get_str("position_in_phrase"),
        context_prevsegment: get_str("context_prevsegment"),
        context_nextsegment: get_str("context_nextsegment"),
        context_prevword: get_str("context_prevword"),
        context_nextword: get_str("context_nextword"),
    }
}

/// Build the Unit relation of target units for the configured unit type.
pub fn target_units(utt: &mut Utterance, unit_type: UnitType) -> Result<(), HrgError> {
    match unit_type {
        UnitType::HalfPhone => half_phone_targets(utt),
        UnitType::Word => word_targets(utt),
    }
}

/// Half-phone targets: a `left-` and `right-` unit per segment, hung as
/// daughters of the segment. The utterance-boundary pause sides facing
/// outward are suppressed (nothing joins onto them).
fn half_phone_targets(utt: &mut Utterance) -> Result<(), HrgError> {
    let seg_rel = match utt.relation("Segment") {
        Some(r) => r,
        None => {
            log::warn!("targetunits: utterance has no Segment relation");
            return Ok(());
        }
    };
    let unit_rel = utt.new_relation("Unit");
    let segs = utt.item_list(seg_rel);
    let last = segs.len().saturating_sub(1);
    for (i, seg) in segs.into_iter().enumerate() {
        let name = utt.name(seg).unwrap_or_default().to_string();
        let features = segment_features(utt, seg);
        let is_pause = name == "pau";

        if !(i == 0 && is_pause) {
            let unit = utt.append_item(unit_rel, None)?;
            utt.set_feature(unit, "name", format!("left-{name}"));
            attach_features(utt, unit, &features);
            utt.add_daughter(seg, Some(unit))?;
        }
        if !(i == last && is_pause) {
            let unit = utt.append_item(unit_rel, None)?;
            utt.set_feature(unit, "name", format!("right-{name}"));
            attach_features(utt, unit, &features);
            utt.add_daughter(seg, Some(unit))?;
        }
    }
    Ok(())
}

/// Word targets: one unit per word with neighbouring-word context.
fn word_targets(utt: &mut Utterance) -> Result<(), HrgError> {
    let word_rel = match utt.relation("Word") {
        Some(r) => r,
        None => {
            log::warn!("targetunits: utterance has no Word relation");
            return Ok(());
        }
    };
    let unit_rel = utt.new_relation("Unit");
    for word in utt.item_list(word_rel) {
        let name = utt.name(word).unwrap_or_default().to_string();
        let features = UnitFeatures {
            context_prevword: utt.prev(word).and_then(|p| utt.name(p)).map(str::to_string),
            context_nextword: utt.next(word).and_then(|n| utt.name(n)).map(str::to_string),
            ..UnitFeatures::default()
        };
        let unit = utt.append_item(unit_rel, None)?;
        utt.set_feature(unit, "name", name);
        attach_features(utt, unit, &features);
    }
    Ok(())
}

/// Linguistic match between target and candidate, in [0, 1].
pub fn target_score(target: &UnitFeatures, candidate: &UnitFeatures, unit_type: UnitType) -> f64 {
    match unit_type {
        UnitType::HalfPhone => {
            let mut score = match (target.num_syls, candidate.num_syls) {
                (Some(t), Some(c)) if t > 0 && c > 0 => {
                    let (t, c) = (t as f64, c as f64);
                    if c >= t {
                        t / c
                    } else {
                        c / t
                    }
                }
                _ => 1.0,
            };
            if target.position_in_syl == candidate.position_in_syl {
                score += 1.0;
            }
            if target.position_in_word == candidate.position_in_word {
                score += 1.0;
            }
            if target.position_in_phrase == candidate.position_in_phrase {
                score += 1.0;
            }
            if target.context_nextsegment == candidate.context_nextsegment {
                score += 1.0;
            }
            if target.context_prevsegment == candidate.context_prevsegment {
                score += 1.0;
            }
            score / 6.0
        }
        UnitType::Word => {
            let mut score = 0.0;
            if target.context_prevword == candidate.context_prevword {
                score += 0.5;
            }
            if target.context_nextword == candidate.context_nextword {
                score += 0.5;
            }
            score
        }
    }
}

/// Concatenate the selected units into a waveform via the RELP filter.
pub fn concat_units(utt: &mut Utterance) -> Result<(), UnitSelectionError> {
    if utt.relation("Unit").is_none() {
        return Err(UnitSelectionError::MissingUnitRelation);
    }
    if utt.selected_units.is_empty() {
        return Err(UnitSelectionError::NoSelection);
    }
    let units = utt.selected_units.clone();
    utt.waveform = Some(relp::synthesize(&units));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voices::english_voice;

    fn segments_utt(text: &str) -> Utterance {
        let voice = english_voice();
        voice.synthesize(text, "text-to-segments").unwrap()
    }

    #[test]
    fn test_half_phone_targets_boundary_pauses() {
        let mut utt = segments_utt("hello");
        target_units(&mut utt, UnitType::HalfPhone).unwrap();
        let names: Vec<String> = utt
            .items_named("Unit")
            .iter()
            .map(|&u| utt.name(u).unwrap().to_string())
            .collect();
        // No left side for the initial pause, no right side for the final.
        assert_eq!(names.first().map(String::as_str), Some("right-pau"));
        assert_eq!(names.last().map(String::as_str), Some("left-pau"));
        // pau h ə l əʊ pau -> 2 halves per segment minus the two edges.
        assert_eq!(names.len(), 6 * 2 - 2);
    }

    #[test]
    fn test_units_are_segment_daughters() {
        let mut utt = segments_utt("hello");
        target_units(&mut utt, UnitType::HalfPhone).unwrap();
        for unit in utt.items_named("Unit") {
            let in_seg = utt.item_in_relation(unit, "Segment").unwrap();
            let seg = utt.parent(in_seg).unwrap();
            let seg_name = utt.name(seg).unwrap();
            let unit_name = utt.name(unit).unwrap();
            assert!(unit_name.ends_with(seg_name), "{unit_name} under {seg_name}");
        }
    }

    #[test]
    fn test_target_features_attached() {
        let mut utt = segments_utt("hello");
        target_units(&mut utt, UnitType::HalfPhone).unwrap();
        let units = utt.items_named("Unit");
        // right-pau: pause has no syllable features, only contexts.
        assert!(utt.feature(units[0], "num_syls").is_none());
        assert_eq!(utt.feature_str(units[0], "context_nextsegment"), Some("h"));
        // left-h: first phone of a two-syllable word.
        assert_eq!(utt.feature(units[1], "num_syls").and_then(|v| v.as_int()), Some(2));
        assert_eq!(utt.feature_str(units[1], "position_in_syl"), Some("initial"));
        assert_eq!(utt.feature_str(units[1], "context_prevsegment"), Some("pau"));
    }

    #[test]
    fn test_word_targets() {
        let mut utt = segments_utt("this is a test");
        target_units(&mut utt, UnitType::Word).unwrap();
        let units = utt.items_named("Unit");
        assert_eq!(units.len(), 4);
        assert_eq!(utt.name(units[0]), Some("this"));
        assert_eq!(utt.feature_str(units[0], "context_nextword"), Some("is"));
        assert!(utt.feature(units[0], "context_prevword").is_none());
        assert_eq!(utt.feature_str(units[3], "context_prevword"), Some("a"));
    }

    #[test]
    fn test_half_phone_score_range_and_exact_match() {
        let features = UnitFeatures {
            num_syls: Some(2),
            position_in_syl: Some("initial".into()),
            position_in_word: Some("initial".into()),
            position_in_phrase: Some("medial".into()),
            context_prevsegment: Some("pau".into()),
            context_nextsegment: Some("ə".into()),
            ..UnitFeatures::default()
        };
        assert!((target_score(&features, &features, UnitType::HalfPhone) - 1.0).abs() < 1e-12);
        let mismatch = UnitFeatures { num_syls: Some(4), ..features.clone() };
        let score = target_score(&features, &mismatch, UnitType::HalfPhone);
        assert!(score < 1.0 && score > 0.0);
        assert!((score - (5.0 + 0.5) / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_word_score() {
        let a = UnitFeatures {
            context_prevword: Some("this".into()),
            context_nextword: Some("a".into()),
            ..UnitFeatures::default()
        };
        let b = UnitFeatures { context_nextword: Some("a".into()), ..UnitFeatures::default() };
        assert!((target_score(&a, &a, UnitType::Word) - 1.0).abs() < 1e-12);
        assert!((target_score(&a, &b, UnitType::Word) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_missing_contexts_compare_equal() {
        let empty = UnitFeatures::default();
        assert!((target_score(&empty, &empty, UnitType::HalfPhone) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_concat_without_selection_fails() {
        let mut utt = segments_utt("hello");
        target_units(&mut utt, UnitType::HalfPhone).unwrap();
        assert!(matches!(
            concat_units(&mut utt),
            Err(UnitSelectionError::NoSelection)
        ));
    }
}
