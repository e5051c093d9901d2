//! Syllabification algorithms.
//!
//! Two families: a left-to-right sweep for Nguni/Sotho-family (and
//! Yoruba-like) phone inventories, and a cluster-rule algorithm for
//! Germanic inventories following T.A. Hall, "English syllabification as
//! the interaction of markedness constraints", Studia Linguistica 60
//! (2006). Both partition the input: concatenating the returned syllables
//! reproduces the phone sequence.

use super::phoneset::{ClusterTables, Phoneset};

/// Left-to-right sweep. A syllabic consonant followed by a consonant
/// closes a syllable; with `vcc_rule`, a V·C·C triple closes as V·C and
/// restarts on the final C; a vowel closes a syllable; anything else joins
/// the current one.
pub fn sweep(ps: &Phoneset, phones: &[String], vcc_rule: bool) -> Vec<Vec<String>> {
    let mut sylls: Vec<Vec<String>> = vec![Vec::new()];
    let n = phones.len();
    let mut i = 0;
    while i < n {
        let phone = &phones[i];

        if i + 1 < n && ps.is_syllabic_consonant(phone) && ps.is_consonant(&phones[i + 1]) {
            sylls.last_mut().unwrap().push(phone.clone());
            i += 1;
            if i < n {
                sylls.push(Vec::new());
            }
            continue;
        }

        if vcc_rule
            && i + 2 < n
            && ps.is_vowel(phone)
            && !ps.is_vowel(&phones[i + 1])
            && !ps.is_vowel(&phones[i + 2])
        {
            sylls.last_mut().unwrap().push(phones[i].clone());
            sylls.last_mut().unwrap().push(phones[i + 1].clone());
            i += 2;
            if i < n {
                sylls.push(Vec::new());
            }
            continue;
        }

        if ps.is_vowel(phone) {
            sylls.last_mut().unwrap().push(phone.clone());
            i += 1;
            if i < n {
                sylls.push(Vec::new());
            }
            continue;
        }

        sylls.last_mut().unwrap().push(phone.clone());
        i += 1;
    }
    sylls
}

fn is_wellformed(tables: &ClusterTables, cluster: &[&str]) -> bool {
    tables.wellformed.iter().any(|wf| wf.iter().map(String::as_str).eq(cluster.iter().copied()))
}

/// Decide where a matched cluster splits, returning the pattern with a
/// syllable boundary dot inserted (e.g. `VC.CV`).
fn process_cluster(ps: &Phoneset, tables: &ClusterTables, cluster: &str, phones: &[String]) -> String {
    match cluster {
        "VCV" => "V.CV".to_string(),
        "VCCV" => {
            let cc = [phones[1].as_str(), phones[2].as_str()];
            let tautosyllabic = (is_wellformed(tables, &cc)
                && ps.sonority_level(cc[1]) > ps.sonority_level(cc[0]))
                || (cc[0] == "s" && ps.is_plosive(cc[1]) && !ps.is_voiced(cc[1]));
            if tautosyllabic {
                "V.CCV".to_string()
            } else {
                "VC.CV".to_string()
            }
        }
        "VCCCV" => {
            let ccc = [phones[1].as_str(), phones[2].as_str(), phones[3].as_str()];
            if ccc.iter().all(|c| ps.is_obstruent(c)) || is_wellformed(tables, &ccc[1..]) {
                "VC.CCV".to_string()
            } else {
                "VCC.CV".to_string()
            }
        }
        "VCCCCV" => "VC.CCCV".to_string(),
        "VCGV" => {
            let cg = [phones[1].as_str(), phones[2].as_str()];
            if ps.is_plosive(cg[0]) && is_wellformed(tables, &cg) {
                "V.CGV".to_string()
            } else {
                "VC.GV".to_string()
            }
        }
        "VCCGV" => {
            if phones[1] == "s" {
                "V.CCGV".to_string()
            } else {
                "VC.CGV".to_string()
            }
        }
        "VCCCGV" => "VC.CCGV".to_string(),
        "VV" => "V.V".to_string(),
        // Unknown pattern from a voice file: split after the first class.
        other => format!("{}.{}", &other[..1], &other[1..]),
    }
}

/// Cluster-rule syllabification. Phones are classified V (vowel or
/// reclassified final syllabic consonant), G (glide) or C; the configured
/// cluster patterns are applied in order, each match splitting the class
/// string until no pattern matches.
pub fn clusters(ps: &Phoneset, phones: &[String]) -> Vec<Vec<String>> {
    let tables = match &ps.clusters {
        Some(t) => t,
        None => return vec![phones.to_vec()],
    };

    let mut plist: Vec<String> = phones.to_vec();
    let mut classstr: String = plist
        .iter()
        .map(|p| {
            if ps.is_vowel(p) {
                'V'
            } else if ps.is_glide(p) {
                'G'
            } else {
                'C'
            }
        })
        .collect();

    // A word-final syllabic consonant after an obstruent or nasal acts as
    // a syllable nucleus.
    if plist.len() >= 2 {
        let last = &plist[plist.len() - 1];
        let prev = &plist[plist.len() - 2];
        if ps.is_syllabic_consonant(last) && (ps.is_obstruent(prev) || ps.is_nasal(prev)) {
            classstr.pop();
            classstr.push('V');
        }
    }

    for cluster in &tables.order {
        while let Some(start) = classstr.find(cluster.as_str()) {
            let end = start + cluster.len();
            let split = process_cluster(ps, tables, cluster, &plist[start..end]);
            classstr.replace_range(start..end, &split);
            let dot = split.find('.').expect("cluster split carries a boundary");
            // Keep plist aligned with classstr by inserting a marker.
            plist.insert(start + dot, String::new());
        }
    }

    let mut sylls: Vec<Vec<String>> = vec![Vec::new()];
    let mut idx = 0;
    for ch in classstr.chars() {
        if ch == '.' {
            sylls.push(Vec::new());
        } else {
            sylls.last_mut().unwrap().push(phones[idx].clone());
            idx += 1;
        }
    }
    sylls
}
