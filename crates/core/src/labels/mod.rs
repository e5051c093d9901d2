//! Full-context label construction for the parametric synthesis engine.
//!
//! Each Segment yields one label line of eleven slash-joined groups
//! (p/A/B/C/D/E/F/G/H/I/J) of identity, positional and counting features,
//! with `xxx` for missing symbols and `0` for missing counts. Variants add
//! tone groups (K/L/M/N) or swap accent for word prominence.

mod variants;

use serde::{Deserialize, Serialize};

use crate::hrg::traverse::traverse_value;
use crate::hrg::{FeatureValue, ItemId, Utterance};
use crate::voice::Voice;

pub const NONE_STRING: &str = "xxx";

/// Which label flavor a voice's models were trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelStyle {
    Standard,
    /// Adds K/L/M/N syllable-tone groups.
    Tone,
    /// Replaces the syllable accent with a word prominence feature.
    Prominence,
}

/// Seconds to the HTK 100 ns time unit.
pub fn float_to_htk_int(seconds: f64) -> i64 {
    (seconds * 10_000_000.0).round() as i64
}

/// HTK 100 ns units to seconds.
pub fn htk_int_to_float(value: i64) -> f64 {
    value as f64 / 10_000_000.0
}

/// Traverse and surrender to `None` on any broken link.
fn tf(utt: &Utterance, item: ItemId, path: &str) -> Option<FeatureValue> {
    traverse_value(utt, item, path).ok()
}

/// Missing count -> "0".
fn zero(v: Option<FeatureValue>) -> String {
    v.map(|v| v.render()).unwrap_or_else(|| "0".to_string())
}

/// Missing symbol -> "xxx".
fn xxx(v: Option<String>) -> String {
    v.unwrap_or_else(|| NONE_STRING.to_string())
}

fn mapped_phone(utt: &Utterance, item: ItemId, path: &str, voice: &Voice) -> Option<String> {
    tf(utt, item, path)
        .and_then(|v| v.as_str().map(str::to_string))
        .map(|name| voice.phone_symbol(&name))
}

fn p(utt: &Utterance, seg: ItemId, voice: &Voice) -> String {
    let seg = utt.item_in_relation(seg, "Segment").unwrap_or(seg);
    let p1 = xxx(mapped_phone(utt, seg, "p.p.F:name", voice));
    let p2 = xxx(mapped_phone(utt, seg, "p.F:name", voice));
    // The current symbol may be overridden per segment.
    let p3 = match utt.feature_str(seg, "hts_symbol") {
        Some(symbol) => symbol.to_string(),
        None => voice.phone_symbol(utt.name(seg).unwrap_or(NONE_STRING)),
    };
    let p4 = xxx(mapped_phone(utt, seg, "n.F:name", voice));
    let p5 = xxx(mapped_phone(utt, seg, "n.n.F:name", voice));
    let p6 = zero(tf(utt, seg, "M:segpos_insyl_f()"));
    let p7 = zero(tf(utt, seg, "M:segpos_insyl_b()"));
    format!("{p1}^{p2}-{p3}+{p4}={p5}@{p6}_{p7}")
}

fn a(utt: &Utterance, seg: ItemId) -> String {
    let a1 = zero(tf(utt, seg, "R:SylStructure.parent.R:Syllable.p.R:SylStructure.F:stress"));
    let a2 = zero(tf(utt, seg, "R:SylStructure.parent.R:Syllable.p.R:SylStructure.F:accent"));
    let a3 = zero(tf(utt, seg, "R:SylStructure.parent.R:Syllable.p.R:SylStructure.M:num_daughters()"));
    format!("A:{a1}_{a2}_{a3}")
}

/// The syllable's vowel identity: the first daughter segment the voice
/// classifies as a vowel, rendered through the symbol map.
fn syl_vowel(utt: &Utterance, seg: ItemId, voice: &Voice) -> String {
    let syl = match utt.item_in_relation(seg, "SylStructure").and_then(|s| utt.parent(s)) {
        Some(s) => s,
        None => return NONE_STRING.to_string(),
    };
    for daughter in utt.daughters(syl) {
        if let Some(name) = utt.name(daughter) {
            if voice.is_vowel_phone(name) {
                return voice.phone_symbol(name);
            }
        }
    }
    NONE_STRING.to_string()
}

fn b(utt: &Utterance, seg: ItemId, voice: &Voice, prominence: bool) -> String {
    let b1 = zero(tf(utt, seg, "R:SylStructure.parent.F:stress"));
    let b2 = if prominence {
        zero(tf(utt, seg, "R:SylStructure.parent.parent.F:prom"))
    } else {
        zero(tf(utt, seg, "R:SylStructure.parent.F:accent"))
    };
    let b3 = zero(tf(utt, seg, "R:SylStructure.parent.M:num_daughters()"));
    let b4 = zero(tf(utt, seg, "R:SylStructure.parent.M:sylpos_inword_f()"));
    let b5 = zero(tf(utt, seg, "R:SylStructure.parent.M:sylpos_inword_b()"));
    let b6 = zero(tf(utt, seg, "R:SylStructure.parent.M:sylpos_inphrase_f()"));
    let b7 = zero(tf(utt, seg, "R:SylStructure.parent.M:sylpos_inphrase_b()"));
    let b8 = zero(tf(utt, seg, "R:SylStructure.parent.M:numsylsbeforesyl_inphrase('stress', '1')"));
    let b9 = zero(tf(utt, seg, "R:SylStructure.parent.M:numsylsaftersyl_inphrase('stress', '1')"));
    let b10 = zero(tf(utt, seg, "R:SylStructure.parent.M:numsylsbeforesyl_inphrase('accent', '1')"));
    let b11 = zero(tf(utt, seg, "R:SylStructure.parent.M:numsylsaftersyl_inphrase('accent', '1')"));
    let b12 = zero(tf(utt, seg, "R:SylStructure.parent.M:syldistprev('stress', '1')"));
    let b13 = zero(tf(utt, seg, "R:SylStructure.parent.M:syldistnext('stress', '1')"));
    let b14 = zero(tf(utt, seg, "R:SylStructure.parent.M:syldistprev('accent', '1')"));
    let b15 = zero(tf(utt, seg, "R:SylStructure.parent.M:syldistnext('accent', '1')"));
    let b16 = syl_vowel(utt, seg, voice);
    format!("B:{b1}-{b2}-{b3}@{b4}-{b5}&{b6}-{b7}#{b8}-{b9}${b10}-{b11}!{b12}-{b13};{b14}-{b15}|{b16}")
}

fn c(utt: &Utterance, seg: ItemId) -> String {
    let c1 = zero(tf(utt, seg, "R:SylStructure.parent.R:Syllable.n.R:SylStructure.F:stress"));
    let c2 = zero(tf(utt, seg, "R:SylStructure.parent.R:Syllable.n.R:SylStructure.F:accent"));
    let c3 = zero(tf(utt, seg, "R:SylStructure.parent.R:Syllable.n.R:SylStructure.M:num_daughters()"));
    format!("C:{c1}+{c2}+{c3}")
}

fn d(utt: &Utterance, seg: ItemId) -> String {
    let d1 = xxx(tf(utt, seg, "R:SylStructure.parent.parent.p.F:gpos").map(|v| v.render()));
    let d2 = zero(tf(utt, seg, "R:SylStructure.parent.parent.p.M:num_daughters()"));
    format!("D:{d1}_{d2}")
}

fn e(utt: &Utterance, seg: ItemId) -> String {
    let e1 = xxx(tf(utt, seg, "R:SylStructure.parent.parent.F:gpos").map(|v| v.render()));
    let e2 = zero(tf(utt, seg, "R:SylStructure.parent.parent.M:num_daughters()"));
    let e3 = zero(tf(utt, seg, "R:SylStructure.parent.parent.M:wordpos_inphrase_f()"));
    let e4 = zero(tf(utt, seg, "R:SylStructure.parent.parent.M:wordpos_inphrase_b()"));
    let e5 = zero(tf(utt, seg, "R:SylStructure.parent.parent.M:numwordsbeforeword_inphrase('content', '1')"));
    let e6 = zero(tf(utt, seg, "R:SylStructure.parent.parent.M:numwordsafterword_inphrase('content', '1')"));
    let e7 = zero(tf(utt, seg, "R:SylStructure.parent.parent.M:worddistprev('content', '1')"));
    let e8 = zero(tf(utt, seg, "R:SylStructure.parent.parent.M:worddistnext('content', '1')"));
    format!("E:{e1}+{e2}@{e3}+{e4}&{e5}+{e6}#{e7}+{e8}")
}

fn f(utt: &Utterance, seg: ItemId) -> String {
    let f1 = xxx(tf(utt, seg, "R:SylStructure.parent.parent.n.F:gpos").map(|v| v.render()));
    let f2 = zero(tf(utt, seg, "R:SylStructure.parent.parent.n.M:num_daughters()"));
    format!("F:{f1}_{f2}")
}

fn g(utt: &Utterance, seg: ItemId) -> String {
    let g1 = zero(tf(utt, seg, "R:SylStructure.parent.parent.R:Phrase.parent.p.M:numsyls_inphrase()"));
    let g2 = zero(tf(utt, seg, "R:SylStructure.parent.parent.R:Phrase.parent.p.M:num_daughters()"));
    format!("G:{g1}_{g2}")
}

fn h(utt: &Utterance, seg: ItemId) -> String {
    let h1 = zero(tf(utt, seg, "R:SylStructure.parent.parent.R:Phrase.parent.M:numsyls_inphrase()"));
    let h2 = zero(tf(utt, seg, "R:SylStructure.parent.parent.R:Phrase.parent.M:num_daughters()"));
    let h3 = zero(tf(utt, seg, "R:SylStructure.parent.parent.R:Phrase.parent.M:phrasepos_inutt_f()"));
    let h4 = zero(tf(utt, seg, "R:SylStructure.parent.parent.R:Phrase.parent.M:phrasepos_inutt_b()"));
    let h5 = xxx(tf(utt, seg, "R:SylStructure.parent.parent.R:Phrase.parent.F:tobi").map(|v| v.render()));
    format!("H:{h1}={h2}@{h3}={h4}|{h5}")
}

fn i_group(utt: &Utterance, seg: ItemId) -> String {
    let i1 = zero(tf(utt, seg, "R:SylStructure.parent.parent.R:Phrase.parent.n.M:numsyls_inphrase()"));
    let i2 = zero(tf(utt, seg, "R:SylStructure.parent.parent.R:Phrase.parent.n.M:num_daughters()"));
    format!("I:{i1}_{i2}")
}

fn j(utt: &Utterance) -> String {
    let j1 = utt.items_named("Syllable").len();
    let j2 = utt.items_named("Word").len();
    let j3 = utt.items_named("Phrase").len();
    format!("J:{j1}+{j2}-{j3}")
}

/// One label for one segment.
pub fn segment_label(utt: &Utterance, seg: ItemId, voice: &Voice, style: LabelStyle) -> String {
    let mut groups = vec![
        p(utt, seg, voice),
        a(utt, seg),
        b(utt, seg, voice, style == LabelStyle::Prominence),
        c(utt, seg),
        d(utt, seg),
        e(utt, seg),
        f(utt, seg),
        g(utt, seg),
        h(utt, seg),
        i_group(utt, seg),
        j(utt),
    ];
    if style == LabelStyle::Tone {
        groups.extend(variants::tone_groups(utt, seg));
    }
    groups.join("/")
}

/// Labels for every segment, in utterance order. When a segment carries
/// an `end` time, the label is prefixed with right-aligned start/end
/// 100 ns integers.
pub fn build(utt: &Utterance, voice: &Voice, style: LabelStyle) -> Vec<String> {
    let mut labels = Vec::new();
    let mut starttime: i64 = 0;
    for seg in utt.items_named("Segment") {
        let label = segment_label(utt, seg, voice, style);
        match utt.feature(seg, "end").and_then(|v| v.as_float()) {
            Some(end) => {
                let endtime = float_to_htk_int(end);
                labels.push(format!("{:>10} {:>10} {}", starttime, endtime, label));
                starttime = endtime;
            }
            None => labels.push(label),
        }
    }
    labels
}
