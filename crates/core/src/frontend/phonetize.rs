//! Phonetization: pronounce every Word through the fallback chain
//! (addendum, dictionary with and without POS, raw map, G2P, silence
//! phone), syllabify, assign per-syllable stress or tone marks, and wire
//! the Word -> Syllable -> Segment tree.

use crate::hrg::{ItemId, Utterance};
use crate::lang::tones;
use crate::pipeline::PipelineError;
use crate::voice::{LangResources, ToneConfig, Voice};

struct ResolvedPronun {
    syllables: Vec<Vec<String>>,
    syltones: String,
}

/// The pronunciation fallback chain. Every step yields `Option`; the
/// first hit wins, and a completely unknown word falls back to the
/// silence phone.
fn resolve(res: &LangResources, tone: &ToneConfig, word: &str, pos: Option<&str>, orth: &str) -> ResolvedPronun {
    let mut entry_tones: Option<String> = None;

    let syllables = if let Some(phones) = res.addendum.get(word) {
        res.phoneset.syllabify(phones)
    } else if let Ok(entry) = lookup_with_pos_fallback(res, word, pos) {
        entry_tones = entry.syltones.clone();
        match entry.syllables {
            Some(syls) => syls,
            None => res.phoneset.syllabify(&entry.phones),
        }
    } else if let Some(phones) = res.raw_map.get(word) {
        res.phoneset.syllabify(phones)
    } else {
        let phones = match res.g2p.predict_word(word) {
            Ok(phones) => phones,
            Err(e) => {
                log::warn!("no pronunciation found for '{orth}': {e}");
                vec![res.phoneset.silence_phone.clone()]
            }
        };
        res.phoneset.syllabify(&phones)
    };

    let syltones = entry_tones
        .or_else(|| res.phoneset.guess_sylstress(&syllables))
        .or_else(|| {
            if tone.orthographic {
                let guessed = tones::word_to_tones(orth);
                (guessed.chars().count() == syllables.len()).then_some(guessed)
            } else {
                None
            }
        })
        .unwrap_or_else(|| tone.default_mark.to_string().repeat(syllables.len()));

    ResolvedPronun { syllables, syltones }
}

fn lookup_with_pos_fallback(
    res: &LangResources,
    word: &str,
    pos: Option<&str>,
) -> Result<crate::lang::PronunEntry, crate::lang::PronunLookupError> {
    match res.pronundict.lookup(word, pos) {
        Err(crate::lang::PronunLookupError::NoPos) => res.pronundict.lookup(word, None),
        other => other,
    }
}

/// The grapheme form pronunciation resources are keyed by.
fn lookup_form(utt: &Utterance, word: ItemId) -> String {
    utt.feature_str(word, "pronunform")
        .or_else(|| utt.name(word))
        .unwrap_or("")
        .to_string()
}

pub fn run(voice: &Voice, utt: &mut Utterance) -> Result<(), PipelineError> {
    let word_rel = match utt.relation("Word") {
        Some(r) => r,
        None => {
            log::warn!("phonetize: utterance has no Word relation");
            return Ok(());
        }
    };
    let syl_rel = utt.new_relation("Syllable");
    let sylstruct_rel = utt.new_relation("SylStructure");
    let seg_rel = utt.new_relation("Segment");

    for word in utt.item_list(word_rel) {
        let form = lookup_form(utt, word);
        let orth = utt.name(word).unwrap_or("").to_string();
        let pos = utt.feature_str(word, "pos").map(str::to_string);
        let is_english = utt.feature_str(word, "lang") == Some("eng");

        let (resolved, prefix) = match (&voice.english, is_english) {
            (Some(eng), true) => (resolve(eng, &voice.tone, &form, pos.as_deref(), &orth), "eng_"),
            _ => (resolve(&voice.main, &voice.tone, &form, pos.as_deref(), &orth), ""),
        };

        let word_ss = utt.append_item(sylstruct_rel, Some(word))?;
        for (syl, mark) in resolved.syllables.iter().zip(resolved.syltones.chars()) {
            let syl_item = utt.append_item(syl_rel, None)?;
            utt.set_feature(syl_item, "name", "syl");
            utt.set_feature(syl_item, voice.tone.feature.as_str(), mark.to_string());
            let syl_ss = utt.add_daughter(word_ss, Some(syl_item))?;
            for phone in syl {
                let seg = utt.append_item(seg_rel, None)?;
                utt.set_feature(seg, "name", format!("{prefix}{phone}"));
                utt.add_daughter(syl_ss, Some(seg))?;
            }
        }
    }
    Ok(())
}
