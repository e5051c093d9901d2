//! Pronunciation dictionary: canonical (lowercase) grapheme form to one or
//! more entries with phones, optional syllables, per-syllable stress/tone
//! string and part of speech.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PronunLookupError {
    #[error("word not in dictionary")]
    NoWord,
    #[error("no entry with matching part of speech")]
    NoPos,
}

/// How a pronunciation is supplied when adding a word.
#[derive(Debug, Clone)]
pub enum Pronunciation {
    Phones(Vec<String>),
    Syllables(Vec<Vec<String>>),
}

/// One pronunciation of one word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PronunEntry {
    pub word: String,
    pub phones: Vec<String>,
    pub syllables: Option<Vec<Vec<String>>>,
    /// Per-syllable stress or tone marks, one character per syllable.
    pub syltones: Option<String>,
    pub pos: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PronunDict {
    pub features: BTreeMap<String, String>,
    entries: BTreeMap<String, Vec<PronunEntry>>,
}

impl PronunDict {
    pub fn new() -> Self {
        PronunDict::default()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a pronunciation; repeated words accumulate entry lists.
    pub fn add_word(
        &mut self,
        word: &str,
        pronun: Pronunciation,
        syltones: Option<String>,
        pos: Option<String>,
    ) -> Result<()> {
        let (phones, syllables) = match pronun {
            Pronunciation::Phones(phones) => (phones, None),
            Pronunciation::Syllables(syls) => {
                (syls.iter().flatten().cloned().collect(), Some(syls))
            }
        };
        if let (Some(tones), Some(syls)) = (&syltones, &syllables) {
            if tones.chars().count() != syls.len() {
                bail!(
                    "'{}': {} syltone marks for {} syllables",
                    word,
                    tones.chars().count(),
                    syls.len()
                );
            }
        }
        self.entries.entry(word.to_string()).or_default().push(PronunEntry {
            word: word.to_string(),
            phones,
            syllables,
            syltones,
            pos,
        });
        Ok(())
    }

    /// Look a word up. Without a POS the first entry wins; with one, the
    /// first entry whose POS matches. The returned entry is an independent
    /// copy the caller may mutate freely.
    pub fn lookup(&self, word: &str, pos: Option<&str>) -> Result<PronunEntry, PronunLookupError> {
        let entries = self.entries.get(word).ok_or(PronunLookupError::NoWord)?;
        match pos {
            None => Ok(entries[0].clone()),
            Some(pos) => entries
                .iter()
                .find(|e| e.pos.as_deref() == Some(pos))
                .cloned()
                .ok_or(PronunLookupError::NoPos),
        }
    }

    /// Parse the flat text format, one entry per line:
    /// `word pos syltones syllable-lengths phones...`, with `None` for
    /// absent pos/syltones and single-digit per-syllable phone counts.
    pub fn parse_text(&mut self, text: &str) -> Result<()> {
        for (lineno, line) in text.lines().enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() < 5 {
                bail!("line {}: expected at least 5 fields", lineno + 1);
            }
            let word = fields[0];
            let pos = (fields[1] != "None").then(|| fields[1].to_string());
            let syltones = (fields[2] != "None").then(|| fields[2].to_string());
            let mut phones: Vec<String> = fields[4..].iter().map(|s| s.to_string()).collect();
            if fields[3] == "None" {
                self.add_word(word, Pronunciation::Phones(phones), syltones, pos)?;
                continue;
            }
            let mut syllables = Vec::new();
            for c in fields[3].chars() {
                let n = c
                    .to_digit(10)
                    .with_context(|| format!("line {}: bad syllable length '{}'", lineno + 1, c))?
                    as usize;
                if n > phones.len() {
                    bail!("line {}: syllable lengths exceed phone count", lineno + 1);
                }
                let rest = phones.split_off(n);
                syllables.push(phones);
                phones = rest;
            }
            if !phones.is_empty() {
                bail!("line {}: {} phones left over after syllables", lineno + 1, phones.len());
            }
            self.add_word(word, Pronunciation::Syllables(syllables), syltones, pos)?;
        }
        Ok(())
    }

    pub fn load_text_file(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dictionary file: {}", path.display()))?;
        self.parse_text(&text)
    }

    /// Write the flat text format, sorted by word.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for entries in self.entries.values() {
            for entry in entries {
                let syls = entry
                    .syllables
                    .as_ref()
                    .map(|s| s.iter().map(|syl| syl.len().to_string()).collect::<String>())
                    .unwrap_or_else(|| "None".to_string());
                out.push_str(&format!(
                    "{} {} {} {} {}\n",
                    entry.word,
                    entry.pos.as_deref().unwrap_or("None"),
                    entry.syltones.as_deref().unwrap_or("None"),
                    syls,
                    entry.phones.join(" ")
                ));
            }
        }
        out
    }
}
