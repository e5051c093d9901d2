//! Orthography-to-tone rules for Yoruba-style diacritic writing.
//!
//! Reads an NFD-normalized lowercase word and produces one tone mark per
//! syllabic position: `H` for an acute accent, `L` for a grave, `M`
//! otherwise. Under-dots mark vowel quality, not tone, and are skipped
//! when reading the accent; `n` after a vowel letter marks nasalization
//! and is not a syllable of its own.

pub const COMBINING_GRAVE: char = '\u{0300}';
pub const COMBINING_ACUTE: char = '\u{0301}';
pub const COMBINING_UNDERDOT: char = '\u{0323}';

const BASECHARS: &str = "abcdefghijklmnopqrstuvwxyz";
const VOWELS: &str = "aeiou";
const NASALS: &str = "mn";

fn tone_label(word: &[char], i: usize) -> char {
    let mut next = match word.get(i + 1) {
        Some(c) => *c,
        None => return 'M',
    };
    if next == COMBINING_UNDERDOT {
        next = match word.get(i + 2) {
            Some(c) => *c,
            None => return 'M',
        };
    }
    match next {
        c if c == COMBINING_GRAVE => 'L',
        c if c == COMBINING_ACUTE => 'H',
        _ => 'M',
    }
}

fn next_basechar(word: &[char], i: usize) -> Option<(char, usize)> {
    word.iter()
        .enumerate()
        .skip(i + 1)
        .find(|(_, c)| BASECHARS.contains(**c))
        .map(|(j, c)| (*c, j))
}

fn prev_basechar(word: &[char], i: usize) -> Option<(char, usize)> {
    word[..i]
        .iter()
        .enumerate()
        .rev()
        .find(|(_, c)| BASECHARS.contains(**c))
        .map(|(j, c)| (*c, j))
}

/// Whether position `i` is a syllable nucleus: a vowel, or a nasal not
/// followed by a vowel (a syllabic nasal). `n` after a vowel letter is a
/// nasalization mark, not a nucleus.
fn syllabic(word: &[char], i: usize) -> bool {
    let c = word[i];
    if VOWELS.contains(c) {
        return true;
    }
    if c == 'n' {
        if let Some((pbc, pbci)) = prev_basechar(word, i) {
            if "eo".contains(pbc) {
                if word.get(pbci + 1) == Some(&COMBINING_UNDERDOT) {
                    return false;
                }
            } else if "aiu".contains(pbc) {
                return false;
            }
        }
    }
    if NASALS.contains(c) {
        match next_basechar(word, i) {
            Some((nbc, _)) if VOWELS.contains(nbc) => {}
            _ => return true,
        }
    }
    false
}

/// Tone marks for a word, one per syllabic position.
pub fn word_to_tones(word: &str) -> String {
    let chars: Vec<char> = word.chars().collect();
    (0..chars.len())
        .filter(|&i| syllabic(&chars, i))
        .map(|i| tone_label(&chars, i))
        .collect()
}
