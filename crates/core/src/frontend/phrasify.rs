//! Phrasing: group Word items under Phrase items ("BB"), opening a new
//! phrase after phrase-final punctuation or before configured
//! conjunctions.

use crate::hrg::{ItemId, Utterance};
use crate::pipeline::PipelineError;
use crate::voice::Voice;

pub const PHRASING_PUNCTUATION: &str = "!?.,:;";

fn any_chars_in(s: &str, template: &str) -> bool {
    s.chars().any(|c| template.contains(c))
}

/// The lexical form conjunction lists are matched against.
fn match_form<'a>(utt: &'a Utterance, word: ItemId) -> Option<&'a str> {
    utt.feature_str(word, "pronunform").or_else(|| utt.name(word))
}

pub fn run(voice: &Voice, utt: &mut Utterance) -> Result<(), PipelineError> {
    let word_rel = match utt.relation("Word") {
        Some(r) => r,
        None => {
            log::warn!("phrasify: utterance has no Word relation");
            return Ok(());
        }
    };
    let cfg = &voice.phrasing;
    let phrase_rel = utt.new_relation("Phrase");
    let mut phrase = utt.append_item(phrase_rel, None)?;
    utt.set_feature(phrase, "name", "BB");

    let words = utt.item_list(word_rel);
    let tail = words.last().copied();
    for word in words {
        utt.add_daughter(phrase, Some(word))?;
        let word_tok = match utt.item_in_relation(word, "Token") {
            Some(t) => t,
            None => continue,
        };
        let token = match utt.parent(word_tok) {
            Some(t) => t,
            None => continue,
        };
        // Only a token-final word can close a phrase, and never the last
        // word of the utterance.
        if utt.last_daughter(token) != Some(word_tok) || Some(word) == tail {
            continue;
        }
        let break_on_punc = utt
            .feature_str(token, "postpunc")
            .map(|p| any_chars_in(p, &cfg.punctuation))
            .unwrap_or(false);
        let break_on_conj = utt
            .next(word)
            .and_then(|next| match_form(utt, next))
            .map(|form| cfg.conjunctions.contains(form))
            .unwrap_or(false);
        if break_on_punc || break_on_conj {
            phrase = utt.append_item(phrase_rel, None)?;
            utt.set_feature(phrase, "name", "BB");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{normalize, tokenize};
    use crate::voices::english_voice;

    fn phrasified(text: &str) -> (Utterance, Vec<Vec<String>>) {
        let voice = english_voice();
        let mut utt = Utterance::from_text(text);
        tokenize::run(&voice, &mut utt).unwrap();
        normalize::run(&voice, &mut utt).unwrap();
        run(&voice, &mut utt).unwrap();
        let phrases = utt
            .items_named("Phrase")
            .iter()
            .map(|&p| {
                utt.daughters(p)
                    .iter()
                    .map(|&w| utt.name(w).unwrap().to_string())
                    .collect()
            })
            .collect();
        (utt, phrases)
    }

    #[test]
    fn test_single_phrase() {
        let (utt, phrases) = phrasified("mathematics is easy");
        assert_eq!(phrases, vec![vec!["mathematics", "is", "easy"]]);
        let phrase = utt.items_named("Phrase")[0];
        assert_eq!(utt.name(phrase), Some("BB"));
    }

    #[test]
    fn test_comma_opens_phrase() {
        let (_, phrases) = phrasified("Hello, world.");
        assert_eq!(phrases, vec![vec!["hello"], vec!["world"]]);
    }

    #[test]
    fn test_final_punctuation_opens_nothing() {
        let (_, phrases) = phrasified("just one phrase.");
        assert_eq!(phrases.len(), 1);
    }

    #[test]
    fn test_hyphenated_token_breaks_only_after_last_word() {
        // The comma sits on the token; only the token-final word may
        // close the phrase.
        let (_, phrases) = phrasified("well-known, fact");
        assert_eq!(phrases, vec![vec!["well", "known"], vec!["fact"]]);
    }

    #[test]
    fn test_every_word_in_exactly_one_phrase() {
        let (utt, phrases) = phrasified("One, two, three.");
        let from_phrases: usize = phrases.iter().map(Vec::len).sum();
        assert_eq!(from_phrases, utt.items_named("Word").len());
        for word in utt.items_named("Word") {
            let in_phrase = utt.item_in_relation(word, "Phrase").unwrap();
            assert!(utt.parent(in_phrase).is_some());
        }
    }

    #[test]
    fn test_conjunction_break() {
        let mut voice = english_voice();
        voice.phrasing.conjunctions.insert("but".to_string());
        let mut utt = Utterance::from_text("slow but steady");
        tokenize::run(&voice, &mut utt).unwrap();
        normalize::run(&voice, &mut utt).unwrap();
        run(&voice, &mut utt).unwrap();
        let phrases: Vec<usize> = utt
            .items_named("Phrase")
            .iter()
            .map(|&p| utt.num_daughters(p))
            .collect();
        assert_eq!(phrases, vec![1, 2]);
    }
}
