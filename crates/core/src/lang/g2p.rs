//! Grapheme-to-phoneme prediction by ordered context-dependent rewrite
//! rules, in the "dictionarymaker" semicolon format.
//!
//! Each grapheme owns a rule list sorted most-specific-first (descending
//! ordinal). A rule matches when its left context is a suffix of the
//! input's left context and its right context a prefix of the input's
//! right context. The whitespace sentinel `#` brackets every word, and
//! grapheme-null substitutions split digraphs before matching.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel standing in for whitespace at word edges and in contexts.
pub const WHITESPACE_CHAR: char = '#';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum G2pError {
    #[error("grapheme '{grapheme}' not defined (word '{word}')")]
    GraphemeNotDefined { word: String, grapheme: char },
    #[error("no rule found for grapheme '{grapheme}' (word '{word}')")]
    NoRuleFound { word: String, grapheme: char },
}

/// A single context-dependent rewrite rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRule {
    pub grapheme: char,
    pub leftcontext: String,
    pub rightcontext: String,
    /// Empty string means the grapheme produces no phone.
    pub phoneme: String,
    pub ordinal: u32,
}

impl RewriteRule {
    /// Suffix-match the left context, prefix-match the right context; only
    /// the overlapping characters are compared.
    fn matches(&self, leftcontext: &[char], rightcontext: &[char]) -> bool {
        for (c1, c2) in self.leftcontext.chars().rev().zip(leftcontext.iter().rev()) {
            if c1 != *c2 {
                return false;
            }
        }
        for (c1, c2) in self.rightcontext.chars().zip(rightcontext.iter()) {
            if c1 != *c2 {
                return false;
            }
        }
        true
    }
}

/// A full rewrite-rule set for one language.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewriteRules {
    pub features: BTreeMap<String, String>,
    /// Grapheme -> rules, most specific (highest ordinal) first.
    pub rules: BTreeMap<char, Vec<RewriteRule>>,
    /// Grapheme-null substitutions applied before matching, e.g. `uk -> u0k`.
    pub gnulls: BTreeMap<String, String>,
}

impl RewriteRules {
    /// Sort every grapheme's rule list for application order.
    pub fn sort_rules(&mut self) {
        for rules in self.rules.values_mut() {
            rules.sort_by(|a, b| b.ordinal.cmp(&a.ordinal));
        }
    }

    pub fn add_rule(&mut self, rule: RewriteRule) {
        self.rules.entry(rule.grapheme).or_default().push(rule);
    }

    /// Apply grapheme-null substitutions, in deterministic (sorted
    /// pattern) order.
    pub fn apply_gnulls(&self, word: &str) -> String {
        let mut word = word.to_string();
        for (pattern, replacement) in &self.gnulls {
            word = word.replace(pattern, replacement);
        }
        word
    }

    /// Predict the phone sequence for a word.
    pub fn predict_word(&self, word: &str) -> Result<Vec<String>, G2pError> {
        let bracketed = format!("{WHITESPACE_CHAR}{word}{WHITESPACE_CHAR}");
        let substituted = self.apply_gnulls(&bracketed);
        let chars: Vec<char> = substituted.chars().collect();

        let mut phones = Vec::new();
        for i in 1..chars.len() - 1 {
            let grapheme = chars[i];
            let rules = self.rules.get(&grapheme).ok_or(G2pError::GraphemeNotDefined {
                word: word.to_string(),
                grapheme,
            })?;
            let (leftcontext, rightcontext) = (&chars[..i], &chars[i + 1..]);
            let rule = rules
                .iter()
                .find(|r| r.matches(leftcontext, rightcontext))
                .ok_or(G2pError::NoRuleFound {
                    word: word.to_string(),
                    grapheme,
                })?;
            if !rule.phoneme.is_empty() {
                phones.push(rule.phoneme.clone());
            }
        }
        Ok(phones)
    }

    /// Load rules from the semicolon-delimited format:
    /// `grapheme;left;right;phoneme;ordinal;count` (count ignored), with
    /// spaces in contexts standing for the whitespace sentinel.
    pub fn parse_rules(&mut self, text: &str) -> Result<()> {
        for (lineno, line) in text.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(';').collect();
            if fields.len() != 6 {
                bail!("line {}: expected 6 semicolon fields, got {}", lineno + 1, fields.len());
            }
            let mut graphemes = fields[0].chars();
            let grapheme = match (graphemes.next(), graphemes.next()) {
                (Some(g), None) => g,
                _ => bail!("line {}: grapheme must be a single character", lineno + 1),
            };
            let ordinal: u32 = fields[4]
                .parse()
                .with_context(|| format!("line {}: bad ordinal '{}'", lineno + 1, fields[4]))?;
            self.add_rule(RewriteRule {
                grapheme,
                leftcontext: fields[1].replace(' ', "#"),
                rightcontext: fields[2].replace(' ', "#"),
                phoneme: fields[3].to_string(),
                ordinal,
            });
        }
        self.sort_rules();
        Ok(())
    }

    pub fn load_rule_file(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule file: {}", path.display()))?;
        self.parse_rules(&text)
    }

    /// Load gnull substitutions (`pattern;replacement`, trailing
    /// whitespace significant, spaces standing for the sentinel).
    pub fn parse_gnulls(&mut self, text: &str) -> Result<()> {
        for (lineno, line) in text.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let (a, b) = line
                .split_once(';')
                .with_context(|| format!("line {}: expected 'pattern;replacement'", lineno + 1))?;
            let (a, b) = (a.replace(' ', "#"), b.replace(' ', "#"));
            if self.gnulls.contains_key(&a) {
                bail!("line {}: duplicate gnull pattern '{}'", lineno + 1, a);
            }
            self.gnulls.insert(a, b);
        }
        Ok(())
    }

    pub fn load_gnulls_file(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read gnulls file: {}", path.display()))?;
        self.parse_gnulls(&text)
    }

    /// Rename every rule phoneme through a loaded phone map.
    pub fn map_phones(&mut self, phonemap: &BTreeMap<String, String>) -> Result<()> {
        for rules in self.rules.values_mut() {
            for rule in rules.iter_mut() {
                if rule.phoneme.is_empty() {
                    continue;
                }
                match phonemap.get(&rule.phoneme) {
                    Some(mapped) => rule.phoneme = mapped.clone(),
                    None => bail!("phone map has no entry for '{}'", rule.phoneme),
                }
            }
        }
        Ok(())
    }

    /// Rename graphemes through a loaded grapheme map, rewriting rule
    /// keys, contexts and gnull entries.
    pub fn map_graphs(&mut self, graphmap: &BTreeMap<String, String>) -> Result<()> {
        for (from, to) in graphmap {
            if from == to {
                continue;
            }
            let mut fs = from.chars();
            let mut ts = to.chars();
            let (from_c, to_c) = match (fs.next(), fs.next(), ts.next(), ts.next()) {
                (Some(f), None, Some(t), None) => (f, t),
                _ => bail!("grapheme map entries must be single characters"),
            };
            if let Some(mut rules) = self.rules.remove(&from_c) {
                for rule in rules.iter_mut() {
                    rule.grapheme = to_c;
                }
                self.rules.insert(to_c, rules);
            }
            for rules in self.rules.values_mut() {
                for rule in rules.iter_mut() {
                    rule.leftcontext = rule.leftcontext.replace(from_c, &to.to_string());
                    rule.rightcontext = rule.rightcontext.replace(from_c, &to.to_string());
                }
            }
            let renamed: BTreeMap<String, String> = self
                .gnulls
                .iter()
                .map(|(k, v)| (k.replace(from_c, to), v.replace(from_c, to)))
                .collect();
            self.gnulls = renamed;
        }
        Ok(())
    }
}

/// Load a one-to-one `a;b` map file.
pub fn parse_simple_map(text: &str) -> Result<BTreeMap<String, String>> {
    let mut mapping = BTreeMap::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (a, b) = line
            .split_once(';')
            .with_context(|| format!("line {}: expected 'a;b'", lineno + 1))?;
        if mapping.contains_key(a) || mapping.values().any(|v| v == b) {
            bail!("line {}: mapping is not one-to-one", lineno + 1);
        }
        mapping.insert(a.to_string(), b.to_string());
    }
    Ok(mapping)
}

pub fn load_simple_map_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read map file: {}", path.display()))?;
    parse_simple_map(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ruleset() -> RewriteRules {
        let mut rs = RewriteRules::default();
        rs.parse_rules(concat!(
            "a;;;ah;0;100\n",
            "b;;;b;0;50\n",
            "c;;;k;0;40\n",
            "c;;e;s;1;10\n",
            "e;;;eh;0;90\n",
            "e;; ;;1;20\n",
            "h;;;h;0;30\n",
            "n;;;n;0;60\n",
            "n;;0g;N;1;5\n",
            "g;;;g;0;20\n",
            "0;;;;0;5\n",
            "t;;;t;0;70\n",
        ))
        .unwrap();
        rs.parse_gnulls("ng;n0g\n").unwrap();
        rs
    }

    #[test]
    fn test_predict_plain() {
        let rs = ruleset();
        assert_eq!(rs.predict_word("bat").unwrap(), vec!["b", "ah", "t"]);
    }

    #[test]
    fn test_right_context_selects_specific_rule() {
        let rs = ruleset();
        // c before e -> s; otherwise k.
        assert_eq!(rs.predict_word("ce").unwrap(), vec!["s", "eh"]);
        assert_eq!(rs.predict_word("ca").unwrap(), vec!["k", "ah"]);
    }

    #[test]
    fn test_word_final_context_uses_sentinel() {
        let rs = ruleset();
        // e at word end (right context '#') is silent.
        assert_eq!(rs.predict_word("bane").unwrap(), vec!["b", "ah", "n"]);
        assert_eq!(rs.predict_word("bena").unwrap(), vec!["b", "eh", "n", "ah"]);
    }

    #[test]
    fn test_gnull_splits_digraph() {
        let rs = ruleset();
        // "ng" becomes n0g; n reads its N rule off the null, 0 is silent.
        assert_eq!(rs.predict_word("bang").unwrap(), vec!["b", "ah", "N", "g"]);
    }

    #[test]
    fn test_grapheme_not_defined() {
        let rs = ruleset();
        assert_eq!(
            rs.predict_word("bax").unwrap_err(),
            G2pError::GraphemeNotDefined { word: "bax".into(), grapheme: 'x' }
        );
    }

    #[test]
    fn test_no_rule_found() {
        let mut rs = RewriteRules::default();
        // Only rule for 'a' requires a 'b' on the left.
        rs.parse_rules("a;b;;ah;0;1\n").unwrap();
        assert_eq!(
            rs.predict_word("a").unwrap_err(),
            G2pError::NoRuleFound { word: "a".into(), grapheme: 'a' }
        );
        assert_eq!(rs.predict_word("ba").unwrap(), vec!["ah"]);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let rs = ruleset();
        let first = rs.predict_word("cabbage");
        for _ in 0..3 {
            assert_eq!(rs.predict_word("cabbage"), first);
        }
    }

    #[test]
    fn test_rules_sorted_by_ordinal_descending() {
        let rs = ruleset();
        let c_rules = &rs.rules[&'c'];
        assert!(c_rules.windows(2).all(|w| w[0].ordinal >= w[1].ordinal));
    }

    #[test]
    fn test_map_phones() {
        let mut rs = ruleset();
        let map = parse_simple_map("ah;a\nb;bb\nk;kk\ns;ss\neh;e\nh;hh\nn;nn\nN;ng\ng;gg\nt;tt\n").unwrap();
        rs.map_phones(&map).unwrap();
        assert_eq!(rs.predict_word("bat").unwrap(), vec!["bb", "a", "tt"]);
    }

    #[test]
    fn test_simple_map_rejects_duplicates() {
        assert!(parse_simple_map("a;b\na;c\n").is_err());
        assert!(parse_simple_map("a;b\nc;b\n").is_err());
    }

    #[test]
    fn test_map_graphs() {
        let mut rs = RewriteRules::default();
        rs.parse_rules("q;;;k;0;1\na;q;;x;1;1\na;;;ah;0;9\n").unwrap();
        let mut gm = BTreeMap::new();
        gm.insert("q".to_string(), "k".to_string());
        rs.map_graphs(&gm).unwrap();
        assert_eq!(rs.predict_word("ka").unwrap(), vec!["k", "x"]);
    }
}
