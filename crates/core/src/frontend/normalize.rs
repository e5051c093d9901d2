//! Normalization: Tokens to lowercase Word items, hyphen splitting,
//! ligature substitution and (for multi-language voices) per-word
//! language tagging.

use unicode_normalization::UnicodeNormalization;

use crate::hrg::Utterance;
use crate::lang::tones::{COMBINING_ACUTE, COMBINING_GRAVE};
use crate::pipeline::PipelineError;
use crate::voice::Voice;

/// Single-character tokens are never read as ALL-CAPS.
fn is_allcaps(token: &str, diacritics: &[char]) -> bool {
    let stripped: String = token.chars().filter(|c| !diacritics.contains(c)).collect();
    stripped.chars().count() > 1
        && stripped == stripped.to_uppercase()
        && stripped.chars().any(|c| c.is_alphabetic())
}

/// Insert boundaries at internal capitals: `KwaZulu` -> `Kwa-Zulu`.
fn split_internal_capitals(token: &str) -> String {
    let mut out = String::new();
    for (i, c) in token.chars().enumerate() {
        if i > 0 && c.is_uppercase() {
            out.push('-');
        }
        out.push(c);
    }
    out
}

/// The pronunciation form: tone accents stripped, recomposed to NFC (the
/// lexicon convention), while the name keeps the full orthography.
fn pronunform(word: &str, strip_tone_diacritics: bool) -> String {
    if strip_tone_diacritics {
        word.chars()
            .filter(|&c| c != COMBINING_ACUTE && c != COMBINING_GRAVE)
            .collect::<String>()
            .nfc()
            .collect()
    } else {
        word.nfc().collect()
    }
}

pub fn run(voice: &Voice, utt: &mut Utterance) -> Result<(), PipelineError> {
    let cfg = &voice.normalizer;
    let token_rel = match utt.relation("Token") {
        Some(r) => r,
        None => {
            log::warn!("normalize: utterance has no Token relation");
            return Ok(());
        }
    };
    let word_rel = utt.new_relation("Word");

    for token in utt.item_list(token_rel) {
        let original = utt.name(token).unwrap_or("").to_string();
        let allcaps = cfg.allcaps_english && is_allcaps(&original, &voice.tokenizer.diacritics);

        let mut tokentext = original;
        if cfg.uppercase_morph_split
            && tokentext != tokentext.to_uppercase()
            && !tokentext.contains('-')
        {
            tokentext = split_internal_capitals(&tokentext);
        }
        tokentext = tokentext.to_lowercase();

        for wordname in tokentext.split('-') {
            if wordname.is_empty() {
                continue;
            }
            let mut wordname = wordname.replace('ﬁ', "fi");
            let mut form = pronunform(&wordname, cfg.strip_tone_diacritics);

            let word = utt.append_item(word_rel, None)?;

            if cfg.multilang {
                let lang = if wordname.starts_with('|') {
                    wordname.remove(0);
                    if form.starts_with('|') {
                        form.remove(0);
                    }
                    "eng"
                } else if allcaps {
                    "eng"
                } else if voice
                    .english
                    .as_ref()
                    .map(|eng| {
                        eng.knows_word(&form)
                            && form.chars().count() > cfg.eng_word_threshold
                            && !voice.main.addendum.contains_key(&form)
                    })
                    .unwrap_or(false)
                {
                    "eng"
                } else if cfg
                    .graphset
                    .as_ref()
                    .map(|gs| !form.to_lowercase().chars().all(|c| gs.contains(c)))
                    .unwrap_or(false)
                {
                    "eng"
                } else {
                    "def"
                };
                utt.set_feature(word, "lang", lang);
            }

            if wordname.chars().any(|c| c.is_ascii_digit()) {
                // No digit expansion yet; tagged so later stages can tell.
                utt.set_feature(word, "type", "num");
            } else {
                utt.set_feature(word, "type", "norm");
            }

            if cfg.multilang || cfg.strip_tone_diacritics {
                utt.set_feature(word, "pronunform", form);
            }
            utt.set_feature(word, "name", wordname);
            utt.add_daughter(token, Some(word))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::tokenize;
    use crate::voices::{english_voice, yoruba_voice};

    fn words(voice: &Voice, text: &str) -> (Utterance, Vec<crate::hrg::ItemId>) {
        let mut utt = Utterance::from_text(text);
        tokenize::run(voice, &mut utt).unwrap();
        run(voice, &mut utt).unwrap();
        let items = utt.items_named("Word");
        (utt, items)
    }

    #[test]
    fn test_lowercase_words_under_tokens() {
        let voice = english_voice();
        let (utt, items) = words(&voice, "Hello World");
        let names: Vec<&str> = items.iter().map(|&w| utt.name(w).unwrap()).collect();
        assert_eq!(names, vec!["hello", "world"]);
        for w in items {
            let token = utt.parent(utt.item_in_relation(w, "Token").unwrap()).unwrap();
            assert!(utt.name(token).is_some());
        }
    }

    #[test]
    fn test_hyphen_split() {
        let voice = english_voice();
        let (utt, items) = words(&voice, "well-known");
        let names: Vec<&str> = items.iter().map(|&w| utt.name(w).unwrap()).collect();
        assert_eq!(names, vec!["well", "known"]);
        // Both words hang off the same token.
        let t0 = utt.parent(utt.item_in_relation(items[0], "Token").unwrap()).unwrap();
        let t1 = utt.parent(utt.item_in_relation(items[1], "Token").unwrap()).unwrap();
        assert!(utt.same_content(t0, t1));
    }

    #[test]
    fn test_ligature_substitution() {
        let voice = english_voice();
        let (utt, items) = words(&voice, "conﬁg");
        assert_eq!(utt.name(items[0]), Some("config"));
    }

    #[test]
    fn test_pipe_marker_tags_english() {
        let voice = yoruba_voice();
        let (utt, items) = words(&voice, "báwo |hello");
        assert_eq!(utt.feature_str(items[0], "lang"), Some("def"));
        assert_eq!(utt.feature_str(items[1], "lang"), Some("eng"));
        assert_eq!(utt.name(items[1]), Some("hello"));
    }

    #[test]
    fn test_allcaps_tags_english() {
        let voice = yoruba_voice();
        let (utt, items) = words(&voice, "NASA ni");
        assert_eq!(utt.feature_str(items[0], "lang"), Some("eng"));
        assert_eq!(utt.feature_str(items[1], "lang"), Some("def"));
    }

    #[test]
    fn test_foreign_graphemes_tag_english() {
        let voice = yoruba_voice();
        // 'x' and 'z' are not Yoruba graphemes.
        let (utt, items) = words(&voice, "xerox ni");
        assert_eq!(utt.feature_str(items[0], "lang"), Some("eng"));
        assert_eq!(utt.feature_str(items[1], "lang"), Some("def"));
    }

    #[test]
    fn test_pronunform_strips_tone_accents() {
        let voice = yoruba_voice();
        let (utt, items) = words(&voice, "báwo");
        assert_eq!(utt.feature_str(items[0], "pronunform"), Some("bawo"));
        // The name keeps the accent for tone assignment.
        assert_eq!(utt.name(items[0]), Some("ba\u{0301}wo"));
    }

    #[test]
    fn test_digit_words_tagged() {
        let voice = english_voice();
        let (utt, items) = words(&voice, "route 66");
        assert_eq!(utt.feature_str(items[0], "type"), Some("norm"));
        assert_eq!(utt.feature_str(items[1], "type"), Some("num"));
    }

    #[test]
    fn test_missing_token_relation_is_logged_not_fatal() {
        let voice = english_voice();
        let mut utt = Utterance::from_text("hello");
        assert!(run(&voice, &mut utt).is_ok());
        assert!(utt.relation("Word").is_none());
    }
}
