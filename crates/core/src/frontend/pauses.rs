//! Pause insertion: a silence segment at the utterance start and after
//! the last segment of every phrase.

use crate::hrg::Utterance;
use crate::pipeline::PipelineError;
use crate::voice::Voice;

pub fn run(voice: &Voice, utt: &mut Utterance) -> Result<(), PipelineError> {
    let silence = voice.silence_phone().to_string();
    let seg_rel = match utt.relation("Segment") {
        Some(r) => r,
        None => {
            log::warn!("pauses: utterance has no Segment relation");
            return Ok(());
        }
    };

    let pause = match utt.head(seg_rel) {
        Some(first) => utt.prepend_before(first, None)?,
        None => utt.append_item(seg_rel, None)?,
    };
    utt.set_feature(pause, "name", silence.as_str());

    let phrase_rel = match utt.relation("Phrase") {
        Some(r) => r,
        None => {
            log::warn!("pauses: utterance has no Phrase relation");
            return Ok(());
        }
    };
    for phrase in utt.item_list(phrase_rel) {
        // Phrase-final word -> its last syllable -> its last segment.
        let last_seg = utt
            .last_daughter(phrase)
            .and_then(|word| utt.item_in_relation(word, "SylStructure"))
            .and_then(|word_ss| utt.last_daughter(word_ss))
            .and_then(|syl_ss| utt.last_daughter(syl_ss))
            .and_then(|seg_ss| utt.item_in_relation(seg_ss, "Segment"));
        match last_seg {
            Some(seg) => {
                let pause = utt.append_after(seg, None)?;
                utt.set_feature(pause, "name", silence.as_str());
            }
            None => log::warn!("pauses: phrase without a final segment"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{normalize, phonetize, phrasify, tokenize};
    use crate::voices::english_voice;

    fn with_pauses(text: &str) -> Utterance {
        let voice = english_voice();
        let mut utt = Utterance::from_text(text);
        tokenize::run(&voice, &mut utt).unwrap();
        normalize::run(&voice, &mut utt).unwrap();
        phrasify::run(&voice, &mut utt).unwrap();
        phonetize::run(&voice, &mut utt).unwrap();
        run(&voice, &mut utt).unwrap();
        utt
    }

    fn seg_names(utt: &Utterance) -> Vec<String> {
        utt.items_named("Segment")
            .iter()
            .map(|&s| utt.name(s).unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_initial_and_final_pause() {
        let utt = with_pauses("hello");
        let names = seg_names(&utt);
        assert_eq!(names.first().map(String::as_str), Some("pau"));
        assert_eq!(names.last().map(String::as_str), Some("pau"));
        assert_eq!(names.iter().filter(|n| *n == "pau").count(), 2);
    }

    #[test]
    fn test_one_pause_per_phrase() {
        let utt = with_pauses("Hello, world.");
        let names = seg_names(&utt);
        // Initial pause plus one after each of the two phrases.
        assert_eq!(names.iter().filter(|n| *n == "pau").count(), 3);
        assert_eq!(names.last().map(String::as_str), Some("pau"));
    }

    #[test]
    fn test_mid_phrase_pause_position() {
        let utt = with_pauses("Hello, world.");
        let names = seg_names(&utt);
        // "hello" is h ə l əʊ; its phrase pause follows immediately.
        let hello_end = names.iter().position(|n| n == "əʊ").unwrap();
        assert_eq!(names[hello_end + 1], "pau");
    }

    #[test]
    fn test_pause_count_matches_segment_budget() {
        let utt = with_pauses("mathematics is easy");
        let voice = english_voice();
        let mut expected = 0usize;
        for word in ["mathematics", "is", "easy"] {
            let entry = voice.main.pronundict.lookup(word, None).unwrap();
            expected += entry.phones.len();
        }
        // Syllabified phone total plus two boundary pauses.
        assert_eq!(seg_names(&utt).len(), expected + 2);
    }

    #[test]
    fn test_pauses_have_no_syllable_structure() {
        let utt = with_pauses("hello");
        for seg in utt.items_named("Segment") {
            let in_tree = utt.in_relation(seg, "SylStructure");
            assert_eq!(utt.name(seg) != Some("pau"), in_tree);
        }
    }
}
