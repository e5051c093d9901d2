//! Tokenization: whitespace splitting with single-character pre/post
//! punctuation capture, plus optional Unicode repair for diacritic-heavy
//! orthographies.

use unicode_normalization::UnicodeNormalization;

use crate::hrg::Utterance;
use crate::pipeline::PipelineError;
use crate::voice::Voice;

pub const DEFAULT_PUNCTUATION: &str = "\"`.,:;!?(){}[]-";

/// NFKD-normalize and repair combining marks: a mark stranded after
/// whitespace reattaches to the preceding word, and doubled marks
/// collapse.
fn repair_unicode(text: &str, diacritics: &[char]) -> String {
    let chars: Vec<char> = text.nfkd().collect();
    let mut out: Vec<char> = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            let mut j = i;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j < chars.len() && diacritics.contains(&chars[j]) {
                // Drop the whitespace so the stray mark combines left.
                i = j;
                continue;
            }
            out.push(c);
            i += 1;
            continue;
        }
        if diacritics.contains(&c) && out.last() == Some(&c) {
            i += 1;
            continue;
        }
        out.push(c);
        i += 1;
    }
    out.into_iter().collect()
}

/// Split the utterance text into Token items. Fails only when the
/// utterance carries no text.
pub fn run(voice: &Voice, utt: &mut Utterance) -> Result<(), PipelineError> {
    let cfg = &voice.tokenizer;
    let mut text = utt.text().ok_or(PipelineError::MissingText)?.to_string();
    if cfg.normalize_unicode {
        text = repair_unicode(&text, &cfg.diacritics);
        utt.set_text(&text);
    }

    let is_punct = |c: char| cfg.punctuation.contains(c);
    let token_rel = utt.new_relation("Token");
    for raw in text.split_whitespace() {
        let prepunc = raw.chars().next().filter(|&c| is_punct(c));
        let postpunc = raw.chars().next_back().filter(|&c| is_punct(c));
        let stripped = raw.trim_matches(is_punct);
        if stripped.is_empty() {
            continue;
        }
        if let Some(required) = &cfg.required_chars {
            let lowered = stripped.to_lowercase();
            if !lowered.chars().any(|c| required.contains(c)) {
                continue;
            }
        }
        let item = utt.append_item(token_rel, None)?;
        utt.set_feature(item, "name", stripped);
        if let Some(p) = prepunc {
            utt.set_feature(item, "prepunc", p.to_string());
        }
        if let Some(p) = postpunc {
            utt.set_feature(item, "postpunc", p.to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voices::{english_voice, yoruba_voice};

    fn tokens(voice: &Voice, text: &str) -> Vec<(String, Option<String>, Option<String>)> {
        let mut utt = Utterance::from_text(text);
        run(voice, &mut utt).unwrap();
        utt.items_named("Token")
            .iter()
            .map(|&t| {
                (
                    utt.name(t).unwrap().to_string(),
                    utt.feature_str(t, "prepunc").map(str::to_string),
                    utt.feature_str(t, "postpunc").map(str::to_string),
                )
            })
            .collect()
    }

    #[test]
    fn test_whitespace_split() {
        let voice = english_voice();
        let toks = tokens(&voice, "mathematics is easy");
        let names: Vec<&str> = toks.iter().map(|(n, _, _)| n.as_str()).collect();
        assert_eq!(names, vec!["mathematics", "is", "easy"]);
    }

    #[test]
    fn test_punctuation_capture() {
        let voice = english_voice();
        let toks = tokens(&voice, "\"Hello, world.");
        assert_eq!(toks[0].0, "Hello");
        assert_eq!(toks[0].1.as_deref(), Some("\""));
        assert_eq!(toks[0].2.as_deref(), Some(","));
        assert_eq!(toks[1].0, "world");
        assert_eq!(toks[1].1, None);
        assert_eq!(toks[1].2.as_deref(), Some("."));
    }

    #[test]
    fn test_pure_punctuation_token_dropped() {
        let voice = english_voice();
        let toks = tokens(&voice, "well - said");
        let names: Vec<&str> = toks.iter().map(|(n, _, _)| n.as_str()).collect();
        assert_eq!(names, vec!["well", "said"]);
    }

    #[test]
    fn test_missing_text_aborts() {
        let voice = english_voice();
        let mut utt = Utterance::new();
        assert_eq!(run(&voice, &mut utt).unwrap_err(), PipelineError::MissingText);
    }

    #[test]
    fn test_unicode_repair() {
        let voice = yoruba_voice();
        // Composed input decomposes; a stray grave after whitespace
        // reattaches to the previous token.
        let mut utt = Utterance::from_text("báwo \u{0300} ni");
        run(&voice, &mut utt).unwrap();
        let names: Vec<String> = utt
            .items_named("Token")
            .iter()
            .map(|&t| utt.name(t).unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["ba\u{0301}wo\u{0300}", "ni"]);
    }

    #[test]
    fn test_duplicate_diacritics_collapse() {
        let voice = yoruba_voice();
        let mut utt = Utterance::from_text("ba\u{0301}\u{0301}wo");
        run(&voice, &mut utt).unwrap();
        let names = utt.items_named("Token");
        assert_eq!(utt.name(names[0]), Some("ba\u{0301}wo"));
    }
}
