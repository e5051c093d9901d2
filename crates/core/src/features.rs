//! Linguistic feature extractors over HRG items.
//!
//! Pure functions computing the positional and counting context the label
//! builder and the unit-selection front end need. Every function returns
//! `Option`: `None` means "not defined here" and is mapped to `0` or the
//! `xxx` sentinel by the caller.

use crate::hrg::traverse::MethodRegistry;
use crate::hrg::{FeatureValue, ItemId, Utterance};

/// Forward position (1-based) of `item`'s counterpart in `relation` within
/// its parent's daughter list.
fn item_pos_in_parent_f(utt: &Utterance, item: ItemId, relation: &str) -> Option<i64> {
    let item = match utt.item_in_relation(item, relation) {
        Some(i) => i,
        None => return Some(0),
    };
    let parent = utt.parent(item)?;
    let daughters = utt.daughters(parent);
    daughters.iter().position(|&d| d == item).map(|i| i as i64 + 1)
}

/// Backward position (1-based from the end) within the parent's daughters.
fn item_pos_in_parent_b(utt: &Utterance, item: ItemId, relation: &str) -> Option<i64> {
    let item = match utt.item_in_relation(item, relation) {
        Some(i) => i,
        None => return Some(0),
    };
    let parent = utt.parent(item)?;
    let daughters = utt.daughters(parent);
    let idx = daughters.iter().position(|&d| d == item)?;
    Some((daughters.len() - idx) as i64)
}

/// All syllable items (SylStructure view) under a Phrase item, in order.
fn syls_in_phrase(utt: &Utterance, phrase: ItemId) -> Option<Vec<ItemId>> {
    let mut out = Vec::new();
    for word in utt.daughters(phrase) {
        let word_ss = utt.item_in_relation(word, "SylStructure")?;
        out.extend(utt.daughters(word_ss));
    }
    Some(out)
}

pub fn num_syls_in_phrase(utt: &Utterance, phrase: ItemId) -> Option<i64> {
    syls_in_phrase(utt, phrase).map(|l| l.len() as i64)
}

pub fn seg_pos_in_syl_f(utt: &Utterance, seg: ItemId) -> Option<i64> {
    item_pos_in_parent_f(utt, seg, "SylStructure")
}

pub fn seg_pos_in_syl_b(utt: &Utterance, seg: ItemId) -> Option<i64> {
    item_pos_in_parent_b(utt, seg, "SylStructure")
}

pub fn syl_pos_in_word_f(utt: &Utterance, syl: ItemId) -> Option<i64> {
    item_pos_in_parent_f(utt, syl, "SylStructure")
}

pub fn syl_pos_in_word_b(utt: &Utterance, syl: ItemId) -> Option<i64> {
    item_pos_in_parent_b(utt, syl, "SylStructure")
}

/// The Phrase item enclosing a syllable's SylStructure counterpart.
fn phrase_of_syl(utt: &Utterance, syl: ItemId) -> Option<(ItemId, Vec<ItemId>)> {
    let syl_ss = utt.item_in_relation(syl, "SylStructure")?;
    let word_ss = utt.parent(syl_ss)?;
    let word_phr = utt.item_in_relation(word_ss, "Phrase")?;
    let phrase = utt.parent(word_phr)?;
    Some((syl_ss, syls_in_phrase(utt, phrase)?))
}

pub fn syl_pos_in_phrase_f(utt: &Utterance, syl: ItemId) -> Option<i64> {
    let (syl_ss, syllist) = match phrase_of_syl(utt, syl) {
        Some(x) => x,
        None => return Some(0),
    };
    syllist.iter().position(|&s| s == syl_ss).map(|i| i as i64 + 1)
}

pub fn syl_pos_in_phrase_b(utt: &Utterance, syl: ItemId) -> Option<i64> {
    let (syl_ss, syllist) = match phrase_of_syl(utt, syl) {
        Some(x) => x,
        None => return Some(0),
    };
    let idx = syllist.iter().position(|&s| s == syl_ss)?;
    Some((syllist.len() - idx) as i64)
}

fn feature_matches(utt: &Utterance, item: ItemId, feat: &str, value: &str) -> bool {
    utt.feature(item, feat).map(|v| v.render() == value).unwrap_or(false)
}

/// Syllables before the current one, within the phrase, with `feat = value`.
pub fn num_syls_before_syl_in_phrase(
    utt: &Utterance,
    syl: ItemId,
    feat: &str,
    value: &str,
) -> Option<i64> {
    let (syl_ss, syllist) = match phrase_of_syl(utt, syl) {
        Some(x) => x,
        None => return Some(0),
    };
    let idx = syllist.iter().position(|&s| s == syl_ss)?;
    Some(syllist[..idx].iter().filter(|&&s| feature_matches(utt, s, feat, value)).count() as i64)
}

/// Syllables after the current one, within the phrase, with `feat = value`.
pub fn num_syls_after_syl_in_phrase(
    utt: &Utterance,
    syl: ItemId,
    feat: &str,
    value: &str,
) -> Option<i64> {
    let (syl_ss, syllist) = match phrase_of_syl(utt, syl) {
        Some(x) => x,
        None => return Some(0),
    };
    let idx = syllist.iter().position(|&s| s == syl_ss)?;
    Some(
        syllist[idx + 1..]
            .iter()
            .filter(|&&s| feature_matches(utt, s, feat, value))
            .count() as i64,
    )
}

/// Distance (in syllables, ≥1) back to the previous syllable with
/// `feat = value`; 0 when there is none.
pub fn syl_dist_prev(utt: &Utterance, syl: ItemId, feat: &str, value: &str) -> Option<i64> {
    let syl = utt.item_in_relation(syl, "Syllable")?;
    let mut count = 1;
    let mut cur = utt.prev(syl);
    while let Some(s) = cur {
        if feature_matches(utt, s, feat, value) {
            return Some(count);
        }
        count += 1;
        cur = utt.prev(s);
    }
    Some(0)
}

/// Distance forward to the next syllable with `feat = value`; 0 when none.
pub fn syl_dist_next(utt: &Utterance, syl: ItemId, feat: &str, value: &str) -> Option<i64> {
    let syl = utt.item_in_relation(syl, "Syllable")?;
    let mut count = 1;
    let mut cur = utt.next(syl);
    while let Some(s) = cur {
        if feature_matches(utt, s, feat, value) {
            return Some(count);
        }
        count += 1;
        cur = utt.next(s);
    }
    Some(0)
}

pub fn word_pos_in_phrase_f(utt: &Utterance, word: ItemId) -> Option<i64> {
    let word = utt.item_in_relation(word, "Phrase")?;
    let phrase = utt.parent(word)?;
    let words = utt.daughters(phrase);
    words.iter().position(|&w| w == word).map(|i| i as i64 + 1)
}

pub fn word_pos_in_phrase_b(utt: &Utterance, word: ItemId) -> Option<i64> {
    let word = utt.item_in_relation(word, "Phrase")?;
    let phrase = utt.parent(word)?;
    let words = utt.daughters(phrase);
    let idx = words.iter().position(|&w| w == word)?;
    Some((words.len() - idx) as i64)
}

/// Words before the current one, within the phrase, with `feat = value`.
pub fn num_words_before_word_in_phrase(
    utt: &Utterance,
    word: ItemId,
    feat: &str,
    value: &str,
) -> Option<i64> {
    let word = utt.item_in_relation(word, "Phrase")?;
    let phrase = utt.parent(word)?;
    let words = utt.daughters(phrase);
    let idx = words.iter().position(|&w| w == word)?;
    Some(words[..idx].iter().filter(|&&w| feature_matches(utt, w, feat, value)).count() as i64)
}

/// Words after the current one, within the phrase, with `feat = value`.
pub fn num_words_after_word_in_phrase(
    utt: &Utterance,
    word: ItemId,
    feat: &str,
    value: &str,
) -> Option<i64> {
    let word = utt.item_in_relation(word, "Phrase")?;
    let phrase = utt.parent(word)?;
    let words = utt.daughters(phrase);
    let idx = words.iter().position(|&w| w == word)?;
    Some(
        words[idx + 1..]
            .iter()
            .filter(|&&w| feature_matches(utt, w, feat, value))
            .count() as i64,
    )
}

pub fn word_dist_prev(utt: &Utterance, word: ItemId, feat: &str, value: &str) -> Option<i64> {
    let word = utt.item_in_relation(word, "Word")?;
    let mut count = 1;
    let mut cur = utt.prev(word);
    while let Some(w) = cur {
        if feature_matches(utt, w, feat, value) {
            return Some(count);
        }
        count += 1;
        cur = utt.prev(w);
    }
    Some(0)
}

pub fn word_dist_next(utt: &Utterance, word: ItemId, feat: &str, value: &str) -> Option<i64> {
    let word = utt.item_in_relation(word, "Word")?;
    let mut count = 1;
    let mut cur = utt.next(word);
    while let Some(w) = cur {
        if feature_matches(utt, w, feat, value) {
            return Some(count);
        }
        count += 1;
        cur = utt.next(w);
    }
    Some(0)
}

pub fn phrase_pos_in_utt_f(utt: &Utterance, phrase: ItemId) -> Option<i64> {
    let phrases = utt.items_named("Phrase");
    phrases.iter().position(|&p| p == phrase).map(|i| i as i64 + 1)
}

pub fn phrase_pos_in_utt_b(utt: &Utterance, phrase: ItemId) -> Option<i64> {
    let phrases = utt.items_named("Phrase");
    let idx = phrases.iter().position(|&p| p == phrase)?;
    Some((phrases.len() - idx) as i64)
}

fn int(v: Option<i64>) -> Option<FeatureValue> {
    v.map(FeatureValue::Int)
}

fn arg<'a>(args: &'a [String], i: usize) -> &'a str {
    args.get(i).map(String::as_str).unwrap_or("")
}

/// Register every extractor under the name the traversal paths use.
pub fn register_defaults(reg: &mut MethodRegistry) {
    reg.register("num_daughters", |utt, item, _| {
        Some(FeatureValue::Int(utt.num_daughters(item) as i64))
    });
    reg.register("segpos_insyl_f", |utt, item, _| int(seg_pos_in_syl_f(utt, item)));
    reg.register("segpos_insyl_b", |utt, item, _| int(seg_pos_in_syl_b(utt, item)));
    reg.register("sylpos_inword_f", |utt, item, _| int(syl_pos_in_word_f(utt, item)));
    reg.register("sylpos_inword_b", |utt, item, _| int(syl_pos_in_word_b(utt, item)));
    reg.register("sylpos_inphrase_f", |utt, item, _| int(syl_pos_in_phrase_f(utt, item)));
    reg.register("sylpos_inphrase_b", |utt, item, _| int(syl_pos_in_phrase_b(utt, item)));
    reg.register("numsylsbeforesyl_inphrase", |utt, item, args| {
        int(num_syls_before_syl_in_phrase(utt, item, arg(args, 0), arg(args, 1)))
    });
    reg.register("numsylsaftersyl_inphrase", |utt, item, args| {
        int(num_syls_after_syl_in_phrase(utt, item, arg(args, 0), arg(args, 1)))
    });
    reg.register("syldistprev", |utt, item, args| {
        int(syl_dist_prev(utt, item, arg(args, 0), arg(args, 1)))
    });
    reg.register("syldistnext", |utt, item, args| {
        int(syl_dist_next(utt, item, arg(args, 0), arg(args, 1)))
    });
    reg.register("wordpos_inphrase_f", |utt, item, _| int(word_pos_in_phrase_f(utt, item)));
    reg.register("wordpos_inphrase_b", |utt, item, _| int(word_pos_in_phrase_b(utt, item)));
    reg.register("numwordsbeforeword_inphrase", |utt, item, args| {
        int(num_words_before_word_in_phrase(utt, item, arg(args, 0), arg(args, 1)))
    });
    reg.register("numwordsafterword_inphrase", |utt, item, args| {
        int(num_words_after_word_in_phrase(utt, item, arg(args, 0), arg(args, 1)))
    });
    reg.register("worddistprev", |utt, item, args| {
        int(word_dist_prev(utt, item, arg(args, 0), arg(args, 1)))
    });
    reg.register("worddistnext", |utt, item, args| {
        int(word_dist_next(utt, item, arg(args, 0), arg(args, 1)))
    });
    reg.register("numsyls_inphrase", |utt, item, _| int(num_syls_in_phrase(utt, item)));
    reg.register("phrasepos_inutt_f", |utt, item, _| int(phrase_pos_in_utt_f(utt, item)));
    reg.register("phrasepos_inutt_b", |utt, item, _| int(phrase_pos_in_utt_b(utt, item)));
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two phrases: ["hello" (2 syls), "big" (1 syl)] and ["world" (1 syl)].
    /// Each syllable holds two segments; syllable stress alternates 1/0.
    fn phrased_utt() -> Utterance {
        let mut utt = Utterance::new();
        let word_rel = utt.new_relation("Word");
        let syl_rel = utt.new_relation("Syllable");
        let seg_rel = utt.new_relation("Segment");
        let ss_rel = utt.new_relation("SylStructure");
        let phr_rel = utt.new_relation("Phrase");

        let layout: Vec<(Vec<usize>, Vec<&str>)> = vec![
            (vec![2, 1], vec!["hello", "big"]),
            (vec![1], vec!["world"]),
        ];
        let mut stress = ["1", "0"].iter().cycle();
        for (syl_counts, words) in layout {
            let phrase = utt.append_item(phr_rel, None).unwrap();
            utt.set_feature(phrase, "name", "BB");
            for (w, name) in words.iter().enumerate() {
                let word = utt.append_item(word_rel, None).unwrap();
                utt.set_feature(word, "name", *name);
                utt.add_daughter(phrase, Some(word)).unwrap();
                let word_ss = utt.append_item(ss_rel, Some(word)).unwrap();
                for _ in 0..syl_counts[w] {
                    let syl = utt.append_item(syl_rel, None).unwrap();
                    utt.set_feature(syl, "name", "syl");
                    utt.set_feature(syl, "stress", *stress.next().unwrap());
                    let syl_ss = utt.add_daughter(word_ss, Some(syl)).unwrap();
                    for _ in 0..2 {
                        let seg = utt.append_item(seg_rel, None).unwrap();
                        utt.set_feature(seg, "name", "a");
                        utt.add_daughter(syl_ss, Some(seg)).unwrap();
                    }
                }
            }
        }
        utt
    }

    #[test]
    fn test_seg_pos_in_syl() {
        let utt = phrased_utt();
        let segs = utt.items_named("Segment");
        assert_eq!(seg_pos_in_syl_f(&utt, segs[0]), Some(1));
        assert_eq!(seg_pos_in_syl_b(&utt, segs[0]), Some(2));
        assert_eq!(seg_pos_in_syl_f(&utt, segs[1]), Some(2));
        assert_eq!(seg_pos_in_syl_b(&utt, segs[1]), Some(1));
    }

    #[test]
    fn test_syl_pos_in_word() {
        let utt = phrased_utt();
        let syls = utt.items_named("Syllable");
        // "hello" has two syllables.
        assert_eq!(syl_pos_in_word_f(&utt, syls[0]), Some(1));
        assert_eq!(syl_pos_in_word_b(&utt, syls[0]), Some(2));
        assert_eq!(syl_pos_in_word_f(&utt, syls[1]), Some(2));
        assert_eq!(syl_pos_in_word_b(&utt, syls[1]), Some(1));
    }

    #[test]
    fn test_syl_pos_in_phrase() {
        let utt = phrased_utt();
        let syls = utt.items_named("Syllable");
        // First phrase has 3 syllables across two words.
        assert_eq!(syl_pos_in_phrase_f(&utt, syls[2]), Some(3));
        assert_eq!(syl_pos_in_phrase_b(&utt, syls[2]), Some(1));
        // Second phrase restarts.
        assert_eq!(syl_pos_in_phrase_f(&utt, syls[3]), Some(1));
    }

    #[test]
    fn test_stress_counting() {
        let utt = phrased_utt();
        let syls = utt.items_named("Syllable");
        // Phrase 1 stresses: 1, 0, 1.
        assert_eq!(num_syls_before_syl_in_phrase(&utt, syls[2], "stress", "1"), Some(1));
        assert_eq!(num_syls_after_syl_in_phrase(&utt, syls[0], "stress", "1"), Some(1));
        assert_eq!(num_syls_after_syl_in_phrase(&utt, syls[2], "stress", "1"), Some(0));
    }

    #[test]
    fn test_syl_distances_cross_phrase() {
        let utt = phrased_utt();
        let syls = utt.items_named("Syllable");
        // Distances walk the Syllable relation, which ignores phrases.
        assert_eq!(syl_dist_prev(&utt, syls[3], "stress", "1"), Some(1));
        assert_eq!(syl_dist_next(&utt, syls[1], "stress", "0"), Some(2));
        assert_eq!(syl_dist_prev(&utt, syls[0], "stress", "1"), Some(0));
    }

    #[test]
    fn test_word_positions_and_counts() {
        let utt = phrased_utt();
        let words = utt.items_named("Word");
        assert_eq!(word_pos_in_phrase_f(&utt, words[0]), Some(1));
        assert_eq!(word_pos_in_phrase_b(&utt, words[0]), Some(2));
        assert_eq!(word_pos_in_phrase_f(&utt, words[2]), Some(1));
        assert_eq!(num_words_after_word_in_phrase(&utt, words[0], "name", "big"), Some(1));
        assert_eq!(num_words_before_word_in_phrase(&utt, words[1], "name", "hello"), Some(1));
        assert_eq!(word_dist_next(&utt, words[0], "name", "world"), Some(2));
        assert_eq!(word_dist_prev(&utt, words[0], "name", "world"), Some(0));
    }

    #[test]
    fn test_phrase_level() {
        let utt = phrased_utt();
        let phrases = utt.items_named("Phrase");
        assert_eq!(num_syls_in_phrase(&utt, phrases[0]), Some(3));
        assert_eq!(num_syls_in_phrase(&utt, phrases[1]), Some(1));
        assert_eq!(phrase_pos_in_utt_f(&utt, phrases[0]), Some(1));
        assert_eq!(phrase_pos_in_utt_b(&utt, phrases[0]), Some(2));
        assert_eq!(phrase_pos_in_utt_b(&utt, phrases[1]), Some(1));
    }

    #[test]
    fn test_undefined_for_items_outside_structure() {
        let mut utt = phrased_utt();
        let seg_rel = utt.relation("Segment").unwrap();
        // A pause segment has no SylStructure counterpart.
        let pause = utt.prepend_item(seg_rel, None).unwrap();
        utt.set_feature(pause, "name", "pau");
        assert_eq!(seg_pos_in_syl_f(&utt, pause), Some(0));
        assert_eq!(seg_pos_in_syl_b(&utt, pause), Some(0));
    }
}
