//! Tone-language label groups: K/L/M/N carry the current, previous,
//! previous-previous and next syllable tone.

use crate::hrg::{ItemId, Utterance};

use super::{tf, NONE_STRING};

fn tone_at(utt: &Utterance, seg: ItemId, path: &str) -> String {
    tf(utt, seg, path)
        .map(|v| v.render())
        .unwrap_or_else(|| NONE_STRING.to_string())
}

pub fn tone_groups(utt: &Utterance, seg: ItemId) -> Vec<String> {
    let k = tone_at(utt, seg, "R:SylStructure.parent.F:tone");
    let l = tone_at(utt, seg, "R:SylStructure.parent.R:Syllable.p.F:tone");
    let m = tone_at(utt, seg, "R:SylStructure.parent.R:Syllable.p.p.F:tone");
    let n = tone_at(utt, seg, "R:SylStructure.parent.R:Syllable.n.F:tone");
    vec![format!("K:{k}"), format!("L:{l}"), format!("M:{m}"), format!("N:{n}")]
}
