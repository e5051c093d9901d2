//! Built-in compact voices for tests, demos and the CLI.
//!
//! Production voices ship as voice definition files; these constructors
//! carry just enough data (phoneset, a bootstrap G2P rule set, a small
//! lexicon) to exercise every pipeline stage without external files.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::hts::EngineConfig;
use crate::labels::LabelStyle;
use crate::lang::phoneset::ClusterTables;
use crate::lang::{
    Phoneset, PronunDict, Pronunciation, RewriteRules, StressGuesser, SyllabifierKind,
};
use crate::unitsel::{UnitCatalogue, UnitSelectionConfig};
use crate::voice::{Backend, LangResources, NormalizerConfig, ToneConfig, Voice};

fn props(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn word_list(pairs: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    pairs
        .iter()
        .map(|(w, ps)| (w.to_string(), ps.iter().map(|p| p.to_string()).collect()))
        .collect()
}

fn cluster_order() -> Vec<String> {
    ["VCV", "VCCV", "VCCCV", "VCCCCV", "VCGV", "VCCGV", "VCCCGV", "VV"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn clusters(list: &[&[&str]]) -> Vec<Vec<String>> {
    list.iter()
        .map(|c| c.iter().map(|p| p.to_string()).collect())
        .collect()
}

/// The MRPA-style English phoneset with the well-formed onset tables.
pub fn lwazi_english_phoneset() -> Phoneset {
    let mut phones = BTreeMap::new();
    phones.insert("pau".into(), props(&["pause"]));
    phones.insert("pau_cl".into(), props(&["closure"]));
    phones.insert("ʔ".into(), props(&["glottal-stop"]));
    phones.insert(
        "ə".into(),
        props(&["class_sonorant", "class_syllabic", "vowel", "duration_short", "height_mid", "position_central"]),
    );
    phones.insert(
        "ɜ".into(),
        props(&["class_sonorant", "class_syllabic", "vowel", "duration_long", "height_mid", "position_central"]),
    );
    phones.insert(
        "a".into(),
        props(&["class_sonorant", "class_syllabic", "vowel", "duration_short", "height_low", "position_front"]),
    );
    phones.insert(
        "ɑ".into(),
        props(&["class_sonorant", "class_syllabic", "vowel", "duration_long", "height_low", "position_back"]),
    );
    phones.insert("aɪ".into(), props(&["class_sonorant", "class_syllabic", "vowel", "duration_diphthong"]));
    phones.insert("aʊ".into(), props(&["class_sonorant", "class_syllabic", "vowel", "duration_diphthong"]));
    phones.insert(
        "b".into(),
        props(&["class_consonantal", "consonant", "manner_plosive", "place_bilabial", "voiced"]),
    );
    phones.insert(
        "tʃ".into(),
        props(&["class_consonantal", "consonant", "manner_affricate", "manner_strident", "place_alveolar", "place_post-alveolar"]),
    );
    phones.insert(
        "d".into(),
        props(&["class_consonantal", "consonant", "manner_plosive", "place_alveolar", "voiced"]),
    );
    phones.insert(
        "ð".into(),
        props(&["class_consonantal", "consonant", "manner_fricative", "place_dental", "voiced"]),
    );
    phones.insert(
        "ɛ".into(),
        props(&["class_sonorant", "class_syllabic", "vowel", "duration_short", "height_mid", "position_front"]),
    );
    phones.insert("ɛə".into(), props(&["class_sonorant", "class_syllabic", "vowel", "duration_diphthong"]));
    phones.insert("eɪ".into(), props(&["class_sonorant", "class_syllabic", "vowel", "duration_diphthong"]));
    phones.insert(
        "f".into(),
        props(&["class_consonantal", "consonant", "manner_fricative", "manner_strident", "place_labiodental"]),
    );
    phones.insert(
        "g".into(),
        props(&["class_consonantal", "consonant", "manner_plosive", "place_velar", "voiced"]),
    );
    phones.insert("h".into(), props(&["consonant", "manner_fricative", "place_glottal"]));
    phones.insert(
        "ɪ".into(),
        props(&["class_sonorant", "class_syllabic", "vowel", "duration_short", "height_high", "position_front"]),
    );
    phones.insert("ɪə".into(), props(&["class_sonorant", "class_syllabic", "vowel", "duration_diphthong"]));
    phones.insert(
        "i".into(),
        props(&["class_sonorant", "class_syllabic", "vowel", "duration_short", "height_high", "position_front"]),
    );
    phones.insert(
        "dʒ".into(),
        props(&["class_consonantal", "consonant", "manner_affricate", "manner_strident", "place_alveolar", "place_post-alveolar", "voiced"]),
    );
    phones.insert("k".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_velar"]));
    phones.insert(
        "l".into(),
        props(&["class_sonorant", "class_consonantal", "consonant", "manner_approximant", "manner_liquid", "manner_lateral", "place_alveolar", "voiced"]),
    );
    phones.insert(
        "m".into(),
        props(&["class_sonorant", "class_consonantal", "consonant", "manner_nasal", "place_bilabial", "voiced"]),
    );
    phones.insert(
        "n".into(),
        props(&["class_sonorant", "class_consonantal", "consonant", "manner_nasal", "place_alveolar", "voiced"]),
    );
    phones.insert(
        "ŋ".into(),
        props(&["class_sonorant", "class_consonantal", "consonant", "manner_nasal", "place_velar", "voiced"]),
    );
    phones.insert(
        "ɒ".into(),
        props(&["class_sonorant", "class_syllabic", "vowel", "duration_short", "height_low", "position_back", "articulation_rounded"]),
    );
    phones.insert("ɔɪ".into(), props(&["class_sonorant", "class_syllabic", "vowel", "duration_diphthong"]));
    phones.insert(
        "ɔ".into(),
        props(&["class_sonorant", "class_syllabic", "vowel", "duration_short", "height_mid", "position_back", "articulation_rounded"]),
    );
    phones.insert("əʊ".into(), props(&["class_sonorant", "class_syllabic", "vowel", "duration_diphthong"]));
    phones.insert("p".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_bilabial"]));
    phones.insert(
        "ɹ".into(),
        props(&["class_sonorant", "class_consonantal", "consonant", "manner_approximant", "manner_liquid", "place_alveolar", "voiced"]),
    );
    phones.insert(
        "s".into(),
        props(&["class_consonantal", "consonant", "manner_fricative", "manner_strident", "place_alveolar"]),
    );
    phones.insert("ʃ".into(), props(&["class_consonantal", "consonant", "manner_fricative", "place_post-alveolar"]));
    phones.insert("t".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_alveolar"]));
    phones.insert("θ".into(), props(&["class_consonantal", "consonant", "manner_fricative", "place_dental"]));
    phones.insert(
        "ʊ".into(),
        props(&["class_sonorant", "class_syllabic", "vowel", "duration_short", "height_high", "position_back", "articulation_rounded"]),
    );
    phones.insert("ʊə".into(), props(&["class_sonorant", "class_syllabic", "vowel", "duration_diphthong"]));
    phones.insert(
        "ʌ".into(),
        props(&["class_sonorant", "class_syllabic", "vowel", "duration_short", "height_mid", "position_back"]),
    );
    phones.insert(
        "u".into(),
        props(&["class_sonorant", "class_syllabic", "vowel", "duration_long", "height_high", "position_back", "articulation_rounded"]),
    );
    phones.insert(
        "v".into(),
        props(&["class_consonantal", "consonant", "manner_fricative", "manner_strident", "place_labiodental", "voiced"]),
    );
    phones.insert(
        "w".into(),
        props(&["class_sonorant", "consonant", "manner_approximant", "manner_glide", "place_labial", "place_velar", "voiced"]),
    );
    phones.insert(
        "j".into(),
        props(&["class_sonorant", "consonant", "manner_approximant", "manner_glide", "place_palatal", "voiced"]),
    );
    phones.insert(
        "z".into(),
        props(&["class_consonantal", "consonant", "manner_fricative", "manner_strident", "place_alveolar", "voiced"]),
    );
    phones.insert(
        "ʒ".into(),
        props(&["class_consonantal", "consonant", "manner_fricative", "place_post-alveolar", "voiced"]),
    );

    let map: BTreeMap<String, String> = [
        ("pau", "pau"), ("pau_cl", "pau_cl"), ("ʔ", "pau_gs"),
        ("ə", "_"), ("ɜ", "__"), ("a", "a"), ("ɑ", "aa"), ("aɪ", "ai"), ("aʊ", "au"),
        ("b", "b"), ("tʃ", "ch"), ("d", "d"), ("ð", "dh"), ("ɛ", "e"), ("ɛə", "e_"),
        ("eɪ", "ei"), ("f", "f"), ("g", "g"), ("h", "h"), ("ɪ", "i"), ("ɪə", "i_"),
        ("i", "ii"), ("dʒ", "jh"), ("k", "k"), ("l", "l"), ("m", "m"), ("n", "n"),
        ("ŋ", "ng"), ("ɒ", "o"), ("ɔɪ", "oi"), ("ɔ", "oo"), ("əʊ", "ou"), ("p", "p"),
        ("ɹ", "r"), ("s", "s"), ("ʃ", "sh"), ("t", "t"), ("θ", "th"), ("ʊ", "u"),
        ("ʊə", "u_"), ("ʌ", "uh"), ("u", "uu"), ("v", "v"), ("w", "w"), ("j", "y"),
        ("z", "z"), ("ʒ", "zh"),
    ]
    .iter()
    .map(|(a, b)| (a.to_string(), b.to_string()))
    .collect();

    let wellformed = clusters(&[
        // plosive + approximant
        &["p", "l"], &["b", "l"], &["k", "l"], &["g", "l"], &["p", "ɹ"], &["b", "ɹ"],
        &["t", "ɹ"], &["d", "ɹ"], &["k", "ɹ"], &["g", "ɹ"], &["t", "w"], &["d", "w"],
        &["g", "w"], &["k", "w"], &["p", "j"], &["b", "j"], &["t", "j"], &["d", "j"],
        &["k", "j"], &["g", "j"],
        // fricative + approximant
        &["f", "l"], &["f", "ɹ"], &["θ", "ɹ"], &["ʃ", "ɹ"], &["θ", "w"], &["h", "w"],
        &["f", "j"], &["v", "j"], &["θ", "j"], &["z", "j"], &["h", "j"],
        // sonorant + glide
        &["m", "j"], &["n", "j"], &["l", "j"],
        // s-clusters
        &["s", "p"], &["s", "t"], &["s", "k"], &["s", "m"], &["s", "n"], &["s", "f"],
        &["s", "w"], &["s", "l"], &["s", "j"], &["s", "p", "l"], &["s", "p", "ɹ"],
        &["s", "p", "j"], &["s", "m", "j"], &["s", "t", "ɹ"], &["s", "t", "j"],
        &["s", "k", "l"], &["s", "k", "ɹ"], &["s", "k", "w"], &["s", "k", "j"],
    ]);

    Phoneset {
        name: "Lwazi English".into(),
        silence_phone: "pau".into(),
        closure_phone: "pau_cl".into(),
        phones,
        map,
        syllabifier: SyllabifierKind::Clusters,
        clusters: Some(ClusterTables { order: cluster_order(), wellformed }),
        stress: StressGuesser::SchwaMono { schwa: "ə".into() },
    }
}

/// Bootstrap English letter-to-phone rules: digraphs split through
/// gnulls, a few context rules, one default rule per letter.
fn english_g2p() -> RewriteRules {
    let mut rules = RewriteRules::default();
    rules
        .parse_rules(concat!(
            "0;;;;0;0\n",
            "a;;;a;0;0\n",
            "b;;;b;0;0\n",
            "c;;e;s;2;0\n",
            "c;;i;s;2;0\n",
            "c;;y;s;2;0\n",
            "c;;;k;0;0\n",
            "d;;;d;0;0\n",
            "e;; ;;2;0\n",
            "e;;;ɛ;0;0\n",
            "f;;;f;0;0\n",
            "g;;;g;0;0\n",
            "h;;;h;0;0\n",
            "i;;;ɪ;0;0\n",
            "j;;;dʒ;0;0\n",
            "k;;;k;0;0\n",
            "l;;;l;0;0\n",
            "m;;;m;0;0\n",
            "n;;;n;0;0\n",
            "o;;;ɒ;0;0\n",
            "p;;;p;0;0\n",
            "q;;;k;0;0\n",
            "r;;;ɹ;0;0\n",
            "s;;;s;0;0\n",
            "t;;;t;0;0\n",
            "u;;;ʌ;0;0\n",
            "v;;;v;0;0\n",
            "w;;;w;0;0\n",
            "y; ;;j;2;0\n",
            "y;;;i;0;0\n",
            "z;;;z;0;0\n",
            "t;;ʃ;tʃ;3;0\n",
            "ʃ;t;;;2;0\n",
            "ʃ;;;ʃ;0;0\n",
            "θ;;;θ;0;0\n",
            "ŋ;;;ŋ;0;0\n",
            "i;;0;i;3;0\n",
            "u;;0;u;3;0\n",
        ))
        .expect("builtin English rules parse");
    rules
        .parse_gnulls("ch;tʃ0\nsh;ʃ0\nth;θ0\nng;ŋ0\nee;i0\noo;u0\nx;k0s\n")
        .expect("builtin English gnulls parse");
    rules
}

fn english_dictionary() -> PronunDict {
    let mut dict = PronunDict::new();
    let entries: &[(&str, &[&str])] = &[
        ("a", &["ə"]),
        ("easy", &["i", "z", "ɪ"]),
        ("hello", &["h", "ə", "l", "əʊ"]),
        ("is", &["ɪ", "z"]),
        ("mathematics", &["m", "a", "θ", "ə", "m", "a", "t", "ɪ", "k", "s"]),
        ("test", &["t", "ɛ", "s", "t"]),
        ("the", &["ð", "ə"]),
        ("this", &["ð", "ɪ", "s"]),
        ("world", &["w", "ɜ", "l", "d"]),
    ];
    for (word, phones) in entries {
        dict.add_word(
            word,
            Pronunciation::Phones(phones.iter().map(|p| p.to_string()).collect()),
            None,
            None,
        )
        .expect("builtin dictionary entry");
    }
    dict
}

fn english_resources() -> LangResources {
    let mut res = LangResources::new(lwazi_english_phoneset(), english_g2p(), english_dictionary());
    res.addendum = word_list(&[("okay", &["əʊ", "k", "eɪ"])]);
    res
}

/// The basic English voice: symbolic front end only.
pub fn english_voice() -> Voice {
    Voice::new("english", english_resources())
}

/// English voice with a unit-selection back end over the given catalogue.
pub fn english_unit_selection_voice(catalogue: UnitCatalogue, config: UnitSelectionConfig) -> Voice {
    Voice::new("english-us", english_resources())
        .with_backend(Backend::UnitSelection { catalogue, config })
}

/// English voice driving the external parametric engine.
pub fn english_engine_voice(bin: &Path, models_dir: &Path) -> Voice {
    Voice::new("english-hts", english_resources()).with_backend(Backend::Engine {
        config: EngineConfig::new(bin, models_dir),
        labels: LabelStyle::Standard,
    })
}

/// The Yoruba phoneset: tone language, open-syllable sweep with
/// syllabic nasals.
pub fn yoruba_phoneset() -> Phoneset {
    let mut phones = BTreeMap::new();
    phones.insert("pau".into(), props(&["pause"]));
    phones.insert("pau_cl".into(), props(&["closure"]));
    phones.insert("ʔ".into(), props(&["glottal-stop"]));
    for (name, extra) in [
        ("a", vec!["height_low", "position_front"]),
        ("ã", vec!["height_low", "position_front", "articulation_nasalized"]),
        ("e", vec!["height_mid", "position_front"]),
        ("ɛ", vec!["height_mid", "position_front"]),
        ("ɛ̃", vec!["height_mid", "position_front", "articulation_nasalized"]),
        ("i", vec!["height_high", "position_front"]),
        ("ĩ", vec!["height_high", "position_front", "articulation_nasalized"]),
        ("o", vec!["height_mid", "position_back", "articulation_rounded"]),
        ("ɔ", vec!["height_mid", "position_back", "articulation_rounded"]),
        ("ɔ̃", vec!["height_mid", "position_back", "articulation_rounded", "articulation_nasalized"]),
        ("u", vec!["height_high", "position_back"]),
        ("ũ", vec!["height_high", "position_back", "articulation_nasalized"]),
    ] {
        let mut p = props(&["class_sonorant", "class_syllabic", "vowel", "duration_short"]);
        p.extend(extra.iter().map(|s| s.to_string()));
        phones.insert(name.to_string(), p);
    }
    phones.insert("b".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_bilabial", "voiced"]));
    phones.insert("d".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_alveolar", "voiced"]));
    phones.insert("f".into(), props(&["class_consonantal", "consonant", "manner_fricative", "manner_strident", "place_labiodental"]));
    phones.insert("g".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_velar", "voiced"]));
    phones.insert("gb".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_velar", "place_bilabial", "voiced"]));
    phones.insert("h".into(), props(&["consonant", "manner_fricative", "place_glottal"]));
    phones.insert("j".into(), props(&["class_sonorant", "consonant", "manner_approximant", "manner_glide", "place_palatal", "voiced"]));
    phones.insert("dʒ".into(), props(&["class_consonantal", "consonant", "manner_affricate", "place_alveolar", "place_post-alveolar", "voiced"]));
    phones.insert("k".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_velar"]));
    phones.insert("l".into(), props(&["class_sonorant", "class_consonantal", "consonant", "manner_approximant", "manner_liquid", "manner_lateral", "place_alveolar", "voiced"]));
    phones.insert("m".into(), props(&["class_sonorant", "class_syllabic", "class_consonantal", "consonant", "manner_nasal", "place_bilabial", "voiced"]));
    phones.insert("n".into(), props(&["class_sonorant", "class_syllabic", "class_consonantal", "consonant", "manner_nasal", "place_alveolar", "voiced"]));
    phones.insert("kp".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_velar", "place_bilabial"]));
    phones.insert("r".into(), props(&["class_sonorant", "class_consonantal", "consonant", "manner_trill", "place_alveolar", "voiced"]));
    phones.insert("s".into(), props(&["class_consonantal", "consonant", "manner_fricative", "manner_strident", "place_alveolar"]));
    phones.insert("ʃ".into(), props(&["class_consonantal", "consonant", "manner_fricative", "place_post-alveolar"]));
    phones.insert("t".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_alveolar"]));
    phones.insert("w".into(), props(&["class_sonorant", "consonant", "manner_approximant", "manner_glide", "place_labial", "place_velar", "voiced"]));

    let map: BTreeMap<String, String> = [
        ("pau", "pau"), ("pau_cl", "pau_cl"), ("ʔ", "pau_gs"),
        ("a", "a"), ("ã", "an"), ("e", "e"), ("ɛ", "E"), ("ɛ̃", "En"), ("i", "i"),
        ("ĩ", "in"), ("o", "o"), ("ɔ", "O"), ("ɔ̃", "On"), ("u", "u"), ("ũ", "un"),
        ("b", "b"), ("d", "d"), ("dʒ", "dZ"), ("f", "f"), ("g", "g"), ("gb", "gb"),
        ("h", "h"), ("j", "j"), ("k", "k"), ("kp", "kp"), ("l", "l"), ("m", "m"),
        ("n", "n"), ("r", "r"), ("s", "s"), ("t", "t"), ("ʃ", "S"), ("w", "w"),
    ]
    .iter()
    .map(|(a, b)| (a.to_string(), b.to_string()))
    .collect();

    Phoneset {
        name: "Yoruba".into(),
        silence_phone: "pau".into(),
        closure_phone: "pau_cl".into(),
        phones,
        map,
        syllabifier: SyllabifierKind::Sweep { vcc_rule: false },
        clusters: None,
        stress: StressGuesser::None,
    }
}

/// Yoruba letter rules over the de-toned NFC pronunciation form.
fn yoruba_g2p() -> RewriteRules {
    let mut rules = RewriteRules::default();
    rules
        .parse_rules(concat!(
            "a;;;a;0;0\n",
            "b;;;b;0;0\n",
            "d;;;d;0;0\n",
            "e;;;e;0;0\n",
            "ẹ;;;ɛ;0;0\n",
            "f;;;f;0;0\n",
            "g;;b;;2;0\n",
            "g;;;g;0;0\n",
            "b;g;;gb;2;0\n",
            "h;;;h;0;0\n",
            "i;;;i;0;0\n",
            "j;;;dʒ;0;0\n",
            "k;;p;;2;0\n",
            "k;;;k;0;0\n",
            "p;k;;kp;2;0\n",
            "p;;;kp;0;0\n",
            "l;;;l;0;0\n",
            "m;;;m;0;0\n",
            "n;;;n;0;0\n",
            "o;;;o;0;0\n",
            "ọ;;;ɔ;0;0\n",
            "r;;;r;0;0\n",
            "s;;;s;0;0\n",
            "ṣ;;;ʃ;0;0\n",
            "t;;;t;0;0\n",
            "u;;;u;0;0\n",
            "w;;;w;0;0\n",
            "y;;;j;0;0\n",
        ))
        .expect("builtin Yoruba rules parse");
    rules
}

/// Multi-language Yoruba voice: tone from orthography, English words
/// routed to the English resources with prefixed phones.
pub fn yoruba_voice() -> Voice {
    let main = LangResources::new(yoruba_phoneset(), yoruba_g2p(), PronunDict::new());
    let mut voice = Voice::new("yoruba", main);
    voice.english = Some(english_resources());
    voice.tokenizer.normalize_unicode = true;
    voice.tokenizer.diacritics = vec!['\u{0300}', '\u{0301}', '\u{0323}'];
    voice.tokenizer.required_chars =
        Some("abcdefghijklmnopqrstuvwxyz0123456789".to_string());
    voice.normalizer = NormalizerConfig {
        multilang: true,
        allcaps_english: true,
        eng_word_threshold: 4,
        graphset: Some("abdeẹfghijklmnoọprsṣtuwy".to_string()),
        strip_tone_diacritics: true,
        uppercase_morph_split: false,
    };
    voice.tone = ToneConfig { feature: "tone".into(), orthographic: true, default_mark: 'N' };
    for conj in ["ati", "tabi", "ṣugbọn", "nitori", "boya"] {
        voice.phrasing.conjunctions.insert(conj.to_string());
    }
    voice
}

/// Yoruba voice driving the parametric engine with tone labels and F0
/// read-back.
pub fn yoruba_engine_voice(bin: &Path, models_dir: &Path) -> Voice {
    let mut config = EngineConfig::new(bin, models_dir);
    config.read_f0 = true;
    yoruba_voice().with_backend(Backend::Engine { config, labels: LabelStyle::Tone })
}

/// A compact Zulu phoneset: Nguni sweep syllabification with the V·C·C
/// closing rule.
pub fn zulu_phoneset() -> Phoneset {
    let mut phones = BTreeMap::new();
    phones.insert("pau".into(), props(&["pause"]));
    phones.insert("pau_cl".into(), props(&["closure"]));
    for (name, extra) in [
        ("a", vec!["height_low", "position_front"]),
        ("ɛ", vec!["height_mid", "position_front"]),
        ("i", vec!["height_high", "position_front"]),
        ("ɔ", vec!["height_mid", "position_back", "articulation_rounded"]),
        ("u", vec!["height_high", "position_back", "articulation_rounded"]),
    ] {
        let mut p = props(&["class_sonorant", "class_syllabic", "vowel", "duration_short"]);
        p.extend(extra.iter().map(|s| s.to_string()));
        phones.insert(name.to_string(), p);
    }
    phones.insert("b".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_bilabial", "voiced"]));
    phones.insert("d".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_alveolar", "voiced"]));
    phones.insert("f".into(), props(&["class_consonantal", "consonant", "manner_fricative", "manner_strident", "place_labiodental"]));
    phones.insert("g".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_velar", "voiced"]));
    phones.insert("h".into(), props(&["consonant", "manner_fricative", "place_glottal"]));
    phones.insert("ɦ".into(), props(&["consonant", "manner_fricative", "place_glottal", "voiced"]));
    phones.insert("j".into(), props(&["class_sonorant", "consonant", "manner_approximant", "manner_glide", "place_palatal", "voiced"]));
    phones.insert("k".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_velar"]));
    phones.insert("kʰ".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_velar", "aspirated"]));
    phones.insert("l".into(), props(&["class_sonorant", "class_consonantal", "consonant", "manner_approximant", "manner_liquid", "manner_lateral", "place_alveolar", "voiced"]));
    phones.insert("ɬ".into(), props(&["class_consonantal", "consonant", "manner_fricative", "manner_lateral", "place_alveolar"]));
    phones.insert("m".into(), props(&["class_sonorant", "class_consonantal", "consonant", "manner_nasal", "place_bilabial", "voiced"]));
    phones.insert("n".into(), props(&["class_sonorant", "class_consonantal", "consonant", "manner_nasal", "place_alveolar", "voiced"]));
    phones.insert("ɲ".into(), props(&["class_sonorant", "class_consonantal", "consonant", "manner_nasal", "place_palatal", "voiced"]));
    phones.insert("ŋ".into(), props(&["class_sonorant", "class_consonantal", "consonant", "manner_nasal", "place_velar", "voiced"]));
    phones.insert("p".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_bilabial"]));
    phones.insert("pʰ".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_bilabial", "aspirated"]));
    phones.insert("s".into(), props(&["class_consonantal", "consonant", "manner_fricative", "manner_strident", "place_alveolar"]));
    phones.insert("ʃ".into(), props(&["class_consonantal", "consonant", "manner_fricative", "place_post-alveolar"]));
    phones.insert("t".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_alveolar"]));
    phones.insert("tʰ".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_alveolar", "aspirated"]));
    phones.insert("dʒ".into(), props(&["class_consonantal", "consonant", "manner_affricate", "place_alveolar", "place_post-alveolar", "voiced"]));
    phones.insert("ǀ".into(), props(&["class_consonantal", "consonant", "manner_click", "place_dental"]));
    phones.insert("ǃ".into(), props(&["class_consonantal", "consonant", "manner_click", "place_post-alveolar"]));
    phones.insert("v".into(), props(&["class_consonantal", "consonant", "manner_fricative", "manner_strident", "place_labiodental", "voiced"]));
    phones.insert("w".into(), props(&["class_sonorant", "consonant", "manner_approximant", "manner_glide", "place_labial", "place_velar", "voiced"]));
    phones.insert("z".into(), props(&["class_consonantal", "consonant", "manner_fricative", "manner_strident", "place_alveolar", "voiced"]));

    let map: BTreeMap<String, String> = [
        ("pau", "pau"), ("pau_cl", "pau_cl"), ("a", "a"), ("ɛ", "E"), ("i", "i"),
        ("ɔ", "O"), ("u", "u"), ("b", "b"), ("d", "d"), ("dʒ", "d_0Z"), ("f", "f"),
        ("g", "g"), ("h", "h"), ("ɦ", "h_v"), ("j", "j"), ("k", "k"), ("kʰ", "k_h"), ("l", "l"),
        ("ɬ", "K"), ("m", "m"), ("n", "n"), ("ɲ", "J"), ("ŋ", "N"), ("p", "p"),
        ("pʰ", "p_h"), ("s", "s"), ("ʃ", "S"), ("t", "t"), ("tʰ", "t_h"),
        ("ǀ", "_c"), ("ǃ", "_q"), ("v", "v"), ("w", "w"), ("z", "z"),
    ]
    .iter()
    .map(|(a, b)| (a.to_string(), b.to_string()))
    .collect();

    Phoneset {
        name: "Lwazi Zulu".into(),
        silence_phone: "pau".into(),
        closure_phone: "pau_cl".into(),
        phones,
        map,
        syllabifier: SyllabifierKind::Sweep { vcc_rule: true },
        clusters: None,
        stress: StressGuesser::None,
    }
}

/// Zulu letter rules. Digraphs (hl, sh, ny, ng, aspirated stops, click
/// letters c/q) resolve through gnulls and context rules.
fn zulu_g2p() -> RewriteRules {
    let mut rules = RewriteRules::default();
    rules
        .parse_rules(concat!(
            "0;;;;0;0\n",
            "a;;;a;0;0\n",
            "b;;;b;0;0\n",
            "c;;;ǀ;0;0\n",
            "d;;;d;0;0\n",
            "e;;;ɛ;0;0\n",
            "f;;;f;0;0\n",
            "g;;;g;0;0\n",
            "h;;;h;0;0\n",
            "ʰ;;;;0;0\n",
            "i;;;i;0;0\n",
            "j;;;dʒ;0;0\n",
            "k;;ʰ;kʰ;3;0\n",
            "k;;;k;0;0\n",
            "l;;;l;0;0\n",
            "m;;;m;0;0\n",
            "n;;;n;0;0\n",
            "o;;;ɔ;0;0\n",
            "p;;ʰ;pʰ;3;0\n",
            "p;;;p;0;0\n",
            "q;;;ǃ;0;0\n",
            "s;;;s;0;0\n",
            "t;;ʰ;tʰ;3;0\n",
            "t;;;t;0;0\n",
            "u;;;u;0;0\n",
            "v;;;v;0;0\n",
            "w;;;w;0;0\n",
            "y;;;j;0;0\n",
            "z;;;z;0;0\n",
            "ɬ;;;ɬ;0;0\n",
            "ʃ;;;ʃ;0;0\n",
            "ɲ;;;ɲ;0;0\n",
            "ŋ;;;ŋ;0;0\n",
        ))
        .expect("builtin Zulu rules parse");
    rules
        .parse_gnulls("hl;ɬ0\nsh;ʃ0\nny;ɲ0\nng;ŋ0\nth;tʰ0\nph;pʰ0\nkh;kʰ0\n")
        .expect("builtin Zulu gnulls parse");
    rules
}

/// Multi-language Zulu voice: internal-capital morph splitting,
/// English-lexicon routing and conjunction-driven phrase breaks.
pub fn zulu_voice() -> Voice {
    let main = LangResources::new(zulu_phoneset(), zulu_g2p(), PronunDict::new());
    let mut voice = Voice::new("zulu", main);
    voice.english = Some(english_resources());
    voice.normalizer = NormalizerConfig {
        multilang: true,
        allcaps_english: false,
        eng_word_threshold: 2,
        graphset: None,
        strip_tone_diacritics: false,
        uppercase_morph_split: true,
    };
    for conj in ["futhi", "kodwa", "ngoba", "noma", "uma", "kanti", "lapho"] {
        voice.phrasing.conjunctions.insert(conj.to_string());
    }
    voice
}

/// A compact Afrikaans phoneset covering the demo lexicon.
pub fn afrikaans_phoneset() -> Phoneset {
    let mut phones = BTreeMap::new();
    phones.insert("pau".into(), props(&["pause"]));
    phones.insert("pau_cl".into(), props(&["closure"]));
    for (name, extra) in [
        ("a", vec!["height_low", "position_front", "duration_short"]),
        ("ɑː", vec!["height_low", "position_back", "duration_long"]),
        ("ə", vec!["height_mid", "position_central", "duration_short"]),
        ("ɛ", vec!["height_mid", "position_front", "duration_short"]),
        ("ɛː", vec!["height_mid", "position_front", "duration_long"]),
        ("i", vec!["height_high", "position_front", "duration_short"]),
        ("u", vec!["height_high", "position_back", "duration_short", "articulation_rounded"]),
        ("o", vec!["height_mid", "position_back", "duration_short", "articulation_rounded"]),
    ] {
        let mut p = props(&["class_sonorant", "class_syllabic", "vowel"]);
        p.extend(extra.iter().map(|s| s.to_string()));
        phones.insert(name.to_string(), p);
    }
    phones.insert("ɦ".into(), props(&["consonant", "manner_fricative", "place_glottal", "voiced"]));
    phones.insert("f".into(), props(&["class_consonantal", "consonant", "manner_fricative", "manner_strident", "place_labiodental"]));
    phones.insert("s".into(), props(&["class_consonantal", "consonant", "manner_fricative", "manner_strident", "place_alveolar"]));
    phones.insert("x".into(), props(&["class_consonantal", "consonant", "manner_fricative", "place_velar"]));
    phones.insert("m".into(), props(&["class_sonorant", "class_consonantal", "consonant", "manner_nasal", "place_bilabial", "voiced"]));
    phones.insert("n".into(), props(&["class_sonorant", "class_consonantal", "consonant", "manner_nasal", "place_alveolar", "voiced"]));
    phones.insert("r".into(), props(&["class_sonorant", "class_consonantal", "consonant", "manner_liquid", "manner_trill", "place_alveolar", "voiced"]));
    phones.insert("l".into(), props(&["class_sonorant", "class_consonantal", "consonant", "manner_approximant", "manner_liquid", "manner_lateral", "place_alveolar", "voiced"]));
    phones.insert("b".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_bilabial", "voiced"]));
    phones.insert("d".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_alveolar", "voiced"]));
    phones.insert("t".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_alveolar"]));
    phones.insert("k".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_velar"]));
    phones.insert("p".into(), props(&["class_consonantal", "consonant", "manner_plosive", "place_bilabial"]));

    let map: BTreeMap<String, String> = [
        ("pau", "pau"), ("pau_cl", "pau_cl"), ("a", "a"), ("ɑː", "aa"), ("ə", "_"),
        ("ɛ", "e"), ("ɛː", "ee"), ("i", "i"), ("u", "u"), ("o", "o"), ("ɦ", "h_v"),
        ("f", "f"), ("s", "s"), ("x", "x"), ("m", "m"), ("n", "n"), ("r", "r"),
        ("l", "l"), ("b", "b"), ("d", "d"), ("t", "t"), ("k", "k"), ("p", "p"),
    ]
    .iter()
    .map(|(a, b)| (a.to_string(), b.to_string()))
    .collect();

    let wellformed = clusters(&[
        &["f", "r"], &["f", "l"], &["k", "r"], &["k", "l"], &["p", "r"], &["p", "l"],
        &["b", "r"], &["b", "l"], &["d", "r"], &["t", "r"], &["s", "p"], &["s", "t"],
        &["s", "k"], &["s", "m"], &["s", "n"], &["s", "l"],
    ]);

    Phoneset {
        name: "Afrikaans".into(),
        silence_phone: "pau".into(),
        closure_phone: "pau_cl".into(),
        phones,
        map,
        syllabifier: SyllabifierKind::Clusters,
        clusters: Some(ClusterTables { order: cluster_order(), wellformed }),
        stress: StressGuesser::SchwaMono { schwa: "ə".into() },
    }
}

/// Afrikaans letter rules: digraphs resolved through contexts, `ê`
/// reading as a long mid vowel.
fn afrikaans_g2p() -> RewriteRules {
    let mut rules = RewriteRules::default();
    rules
        .parse_rules(concat!(
            "0;;;;0;0\n",
            "a;;0a;ɑː;2;0\n",
            "a;a0;;;3;0\n",
            "a;;;a;0;0\n",
            "b;;;b;0;0\n",
            "d;;;d;0;0\n",
            "e;o0;;;3;0\n",
            "e;i0;;;3;0\n",
            "e;; ;ə;2;0\n",
            "e;;;ɛ;0;0\n",
            "ê;;;ɛː;0;0\n",
            "f;;;f;0;0\n",
            "g;;;x;0;0\n",
            "h;;;ɦ;0;0\n",
            "i;;0e;i;2;0\n",
            "i;;;ə;0;0\n",
            "k;;;k;0;0\n",
            "l;;;l;0;0\n",
            "m;;;m;0;0\n",
            "n;;;n;0;0\n",
            "o;;0e;u;2;0\n",
            "o;;;o;0;0\n",
            "p;;;p;0;0\n",
            "r;;;r;0;0\n",
            "s;;;s;0;0\n",
            "t;;;t;0;0\n",
            "u;;;u;0;0\n",
            "w;;;v;0;0\n",
        ))
        .expect("builtin Afrikaans rules parse");
    rules.parse_gnulls("aa;a0a\noe;o0e\nie;i0e\n").expect("builtin Afrikaans gnulls parse");
    rules
}

/// The Afrikaans demo voice: small lexicon, G2P for everything else.
pub fn afrikaans_voice() -> Voice {
    let mut dict = PronunDict::new();
    dict.add_word(
        "die",
        Pronunciation::Phones(vec!["d".into(), "i".into()]),
        None,
        None,
    )
    .expect("builtin dictionary entry");
    let main = LangResources::new(afrikaans_phoneset(), afrikaans_g2p(), dict);
    Voice::new("afrikaans", main)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_g2p_digraphs() {
        let g2p = english_g2p();
        assert_eq!(g2p.predict_word("thing").unwrap(), vec!["θ", "ɪ", "ŋ"]);
        assert_eq!(g2p.predict_word("shop").unwrap(), vec!["ʃ", "ɒ", "p"]);
        assert_eq!(g2p.predict_word("box").unwrap(), vec!["b", "ɒ", "k", "s"]);
        assert_eq!(g2p.predict_word("seen").unwrap(), vec!["s", "i", "n"]);
    }

    #[test]
    fn test_english_g2p_context_rules() {
        let g2p = english_g2p();
        // c reads soft before front vowels, silent final e drops.
        assert_eq!(g2p.predict_word("nice").unwrap(), vec!["n", "ɪ", "s"]);
        assert_eq!(g2p.predict_word("cat").unwrap(), vec!["k", "a", "t"]);
        // y is a glide word-initially, a vowel elsewhere.
        assert_eq!(g2p.predict_word("yes").unwrap(), vec!["j", "ɛ", "s"]);
        assert_eq!(g2p.predict_word("happy").unwrap()[4], "i");
    }

    #[test]
    fn test_english_phones_all_known() {
        let ps = lwazi_english_phoneset();
        let g2p = english_g2p();
        for rules in g2p.rules.values() {
            for rule in rules {
                if !rule.phoneme.is_empty() {
                    assert!(ps.contains(&rule.phoneme), "unknown phone {}", rule.phoneme);
                }
            }
        }
        let dict = english_dictionary();
        for word in ["hello", "mathematics", "world", "this"] {
            for p in dict.lookup(word, None).unwrap().phones {
                assert!(ps.contains(&p), "unknown phone {p}");
            }
        }
    }

    #[test]
    fn test_yoruba_g2p() {
        let g2p = yoruba_g2p();
        assert_eq!(g2p.predict_word("bawo").unwrap(), vec!["b", "a", "w", "o"]);
        assert_eq!(g2p.predict_word("ni").unwrap(), vec!["n", "i"]);
        // Digraph consonants collapse to single phones.
        assert_eq!(g2p.predict_word("gbogbo").unwrap(), vec!["gb", "o", "gb", "o"]);
        assert_eq!(g2p.predict_word("ṣe").unwrap(), vec!["ʃ", "e"]);
    }

    #[test]
    fn test_afrikaans_g2p_sentence() {
        let g2p = afrikaans_g2p();
        assert_eq!(g2p.predict_word("hoe").unwrap(), vec!["ɦ", "u"]);
        assert_eq!(g2p.predict_word("sê").unwrap(), vec!["s", "ɛː"]);
        assert_eq!(g2p.predict_word("mens").unwrap(), vec!["m", "ɛ", "n", "s"]);
        assert_eq!(
            g2p.predict_word("afrikaans").unwrap(),
            vec!["a", "f", "r", "ə", "k", "ɑː", "n", "s"]
        );
    }

    #[test]
    fn test_afrikaans_sentence_never_hits_silence() {
        let voice = afrikaans_voice();
        let utt = voice
            .synthesize("Hoe sê mens dit in Afrikaans?", "text-to-segments")
            .unwrap();
        let segments = utt.items_named("Segment");
        let silence: Vec<_> = segments
            .iter()
            .filter(|&&s| utt.name(s) == Some("pau"))
            .collect();
        // Only the two boundary pauses; no silence-phone fallback fired.
        assert_eq!(silence.len(), 2);
        // The word for "sê" carries its long vowel.
        let words = utt.items_named("Word");
        let se = words.iter().copied().find(|&w| utt.name(w) == Some("sê")).unwrap();
        let ss = utt.item_in_relation(se, "SylStructure").unwrap();
        let phones: Vec<&str> = utt
            .daughters(ss)
            .iter()
            .flat_map(|&syl| utt.daughters(syl))
            .map(|seg| utt.name(seg).unwrap())
            .collect();
        assert_eq!(phones, vec!["s", "ɛː"]);
    }

    #[test]
    fn test_zulu_g2p_digraphs() {
        let g2p = zulu_g2p();
        assert_eq!(g2p.predict_word("sawubona").unwrap(), vec!["s", "a", "w", "u", "b", "ɔ", "n", "a"]);
        assert_eq!(g2p.predict_word("ngiyabonga").unwrap()[0], "ŋ");
        assert_eq!(g2p.predict_word("hlala").unwrap(), vec!["ɬ", "a", "l", "a"]);
        assert_eq!(g2p.predict_word("thatha").unwrap(), vec!["tʰ", "a", "tʰ", "a"]);
        assert_eq!(g2p.predict_word("qonda").unwrap()[0], "ǃ");
    }

    #[test]
    fn test_zulu_vcc_syllabification() {
        let ps = zulu_phoneset();
        // umuntu: the V·C·C triple closes as V·C -> u.mun.tu.
        let phones: Vec<String> =
            ["u", "m", "u", "n", "t", "u"].iter().map(|p| p.to_string()).collect();
        let sylls = ps.syllabify(&phones);
        assert_eq!(sylls.len(), 3);
        assert_eq!(sylls[1], vec!["m".to_string(), "u".into(), "n".into()]);
        assert_eq!(sylls[2], vec!["t".to_string(), "u".into()]);
    }

    #[test]
    fn test_zulu_morph_split_and_conjunction_phrasing() {
        let voice = zulu_voice();
        let utt = voice.synthesize("Ngiyabonga KwaZulu kodwa hamba", "text-to-words").unwrap();
        let words: Vec<&str> = utt
            .items_named("Word")
            .iter()
            .map(|&w| utt.name(w).unwrap())
            .collect();
        // Internal capital splits KwaZulu into two words.
        assert_eq!(words, vec!["ngiyabonga", "kwa", "zulu", "kodwa", "hamba"]);
        // A new phrase opens before the conjunction.
        let phrases: Vec<usize> = utt
            .items_named("Phrase")
            .iter()
            .map(|&p| utt.num_daughters(p))
            .collect();
        assert_eq!(phrases, vec![3, 2]);
    }

    #[test]
    fn test_unit_selection_end_to_end() {
        use crate::track::Track;
        use crate::unitsel::{self, CatalogueUnit, UnitType};

        // Discover the target unit names for the test sentence, then
        // stock a catalogue with one candidate per name.
        let probe = english_voice();
        let mut utt = probe.synthesize("this is a test", "text-to-segments").unwrap();
        unitsel::target_units(&mut utt, UnitType::HalfPhone).unwrap();
        let mut catalogue = UnitCatalogue::default();
        for unit in utt.items_named("Unit") {
            catalogue.add(CatalogueUnit {
                name: utt.name(unit).unwrap().to_string(),
                features: Default::default(),
                left_joincoef: vec![0.0, 0.0],
                right_joincoef: vec![0.0, 0.0],
                lpc: Track {
                    times: vec![0.004, 0.008],
                    frames: vec![vec![1.0, 0.1], vec![1.0, 0.1]],
                },
                residual: vec![50.0; 160],
            });
        }

        let voice = english_unit_selection_voice(catalogue, UnitSelectionConfig::default());
        let utt = voice.synthesize("this is a test", "text-to-wave").unwrap();
        let units = utt.items_named("Unit");
        assert!(!units.is_empty());
        assert_eq!(utt.selected_units.len(), units.len());
        for unit in units {
            assert!(utt.feature(unit, "selected_unit").is_some());
        }
        let wave = utt.waveform.expect("unit-selection produces audio");
        assert_eq!(wave.samplerate, 16000);
        assert!(!wave.is_empty());
    }

    #[test]
    fn test_builtin_voices_have_distinct_names() {
        let names = [
            english_voice().name,
            yoruba_voice().name,
            zulu_voice().name,
            afrikaans_voice().name,
        ];
        let unique: std::collections::BTreeSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }
}
