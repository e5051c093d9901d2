//! Heterogeneous relation graph: the utterance structure every pipeline
//! stage reads and mutates.
//!
//! An utterance owns named relations (Token, Word, Phrase, Syllable,
//! SylStructure, Segment, Unit). A relation is an ordered, doubly-linked
//! list of items with optional parent/daughter links forming a forest.
//! Items in different relations can share one content node, so a word seen
//! through the Word relation and the same word seen through SylStructure
//! carry the same features. All nodes live in per-utterance arenas and
//! link via indices, so navigation is O(1) and there are no ownership
//! cycles.

pub mod traverse;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hts::Parm;
use crate::track::Track;
use crate::unitsel::CatalogueUnit;
use crate::waveform::Waveform;

pub use traverse::{Path, PathStep, PathValue, TraversalError};

/// Errors raised by HRG mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HrgError {
    /// Two items sharing content may not live in the same relation.
    #[error("an item with this content already exists in relation '{0}'")]
    DuplicateItemInRelation(String),
}

/// A feature value attached to an item content or to the utterance itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl FeatureValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FeatureValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FeatureValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FeatureValue::Float(f) => Some(*f),
            FeatureValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Render the value the way the label builder prints it.
    pub fn render(&self) -> String {
        match self {
            FeatureValue::Str(s) => s.clone(),
            FeatureValue::Int(i) => i.to_string(),
            FeatureValue::Float(f) => f.to_string(),
            FeatureValue::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for FeatureValue {
    fn from(s: &str) -> Self {
        FeatureValue::Str(s.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(s: String) -> Self {
        FeatureValue::Str(s)
    }
}

impl From<i64> for FeatureValue {
    fn from(i: i64) -> Self {
        FeatureValue::Int(i)
    }
}

impl From<usize> for FeatureValue {
    fn from(i: usize) -> Self {
        FeatureValue::Int(i as i64)
    }
}

impl From<f64> for FeatureValue {
    fn from(f: f64) -> Self {
        FeatureValue::Float(f)
    }
}

impl From<bool> for FeatureValue {
    fn from(b: bool) -> Self {
        FeatureValue::Bool(b)
    }
}

pub type FeatureMap = BTreeMap<String, FeatureValue>;

/// Index of an item in the utterance arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u32);

/// Index of a shared content node in the utterance arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentId(u32);

/// Index of a relation in the utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationId(u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ContentNode {
    features: FeatureMap,
    /// Relation name -> the single item in that relation holding this content.
    relations: BTreeMap<String, ItemId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ItemNode {
    relation: RelationId,
    content: ContentId,
    next: Option<ItemId>,
    prev: Option<ItemId>,
    parent: Option<ItemId>,
    first_daughter: Option<ItemId>,
    last_daughter: Option<ItemId>,
    removed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RelationNode {
    name: String,
    head: Option<ItemId>,
    tail: Option<ItemId>,
}

/// An utterance: its own feature map plus named relations over shared items.
///
/// Serializes without any reference to the voice that produced it; the
/// caller re-attaches a voice by name after loading.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Utterance {
    pub features: FeatureMap,
    items: Vec<ItemNode>,
    contents: Vec<ContentNode>,
    relations: Vec<RelationNode>,
    relation_index: BTreeMap<String, RelationId>,
    /// Full-context labels produced by the label builder.
    pub labels: Vec<String>,
    /// Synthesized audio, when a back end ran successfully.
    pub waveform: Option<Waveform>,
    /// Generated F0 contour (tone-variant parametric back end).
    pub f0: Option<Track>,
    /// Per-utterance parametric-engine parameter overrides.
    pub engine_overrides: BTreeMap<String, Option<Parm>>,
    /// Candidates chosen by the unit-selection search, in Unit order.
    #[serde(skip)]
    pub selected_units: Vec<Arc<CatalogueUnit>>,
}

impl Utterance {
    pub fn new() -> Self {
        Utterance::default()
    }

    /// Create an utterance carrying the given input text.
    pub fn from_text(text: &str) -> Self {
        let mut utt = Utterance::new();
        utt.features.insert("text".into(), text.into());
        utt
    }

    pub fn text(&self) -> Option<&str> {
        self.features.get("text").and_then(|v| v.as_str())
    }

    pub fn set_text(&mut self, text: &str) {
        self.features.insert("text".into(), text.into());
    }

    // ─── Relations ───────────────────────────────────────────────

    /// Create a relation with the given name, replacing any existing one.
    pub fn new_relation(&mut self, name: &str) -> RelationId {
        let id = RelationId(self.relations.len() as u32);
        self.relations.push(RelationNode {
            name: name.to_string(),
            head: None,
            tail: None,
        });
        self.relation_index.insert(name.to_string(), id);
        id
    }

    pub fn relation(&self, name: &str) -> Option<RelationId> {
        self.relation_index.get(name).copied()
    }

    pub fn relation_name(&self, rel: RelationId) -> &str {
        &self.relations[rel.0 as usize].name
    }

    pub fn head(&self, rel: RelationId) -> Option<ItemId> {
        self.relations[rel.0 as usize].head
    }

    pub fn tail(&self, rel: RelationId) -> Option<ItemId> {
        self.relations[rel.0 as usize].tail
    }

    /// Items of a relation in linked-list order.
    pub fn item_list(&self, rel: RelationId) -> Vec<ItemId> {
        let mut out = Vec::new();
        let mut cur = self.head(rel);
        while let Some(item) = cur {
            out.push(item);
            cur = self.next(item);
        }
        out
    }

    /// Items of a named relation, or an empty list if it does not exist.
    pub fn items_named(&self, name: &str) -> Vec<ItemId> {
        self.relation(name).map(|r| self.item_list(r)).unwrap_or_default()
    }

    pub fn relation_len(&self, rel: RelationId) -> usize {
        self.item_list(rel).len()
    }

    // ─── Item creation ───────────────────────────────────────────

    fn alloc_content(&mut self) -> ContentId {
        let id = ContentId(self.contents.len() as u32);
        self.contents.push(ContentNode {
            features: FeatureMap::new(),
            relations: BTreeMap::new(),
        });
        id
    }

    fn alloc_item(&mut self, rel: RelationId, shared: Option<ItemId>) -> Result<ItemId, HrgError> {
        let content = match shared {
            Some(item) => self.items[item.0 as usize].content,
            None => self.alloc_content(),
        };
        let relname = self.relations[rel.0 as usize].name.clone();
        if self.contents[content.0 as usize].relations.contains_key(&relname) {
            return Err(HrgError::DuplicateItemInRelation(relname));
        }
        let id = ItemId(self.items.len() as u32);
        self.items.push(ItemNode {
            relation: rel,
            content,
            next: None,
            prev: None,
            parent: None,
            first_daughter: None,
            last_daughter: None,
            removed: false,
        });
        self.contents[content.0 as usize].relations.insert(relname, id);
        Ok(id)
    }

    /// Append an item at the tail of a relation. With `shared`, the new
    /// item references the given item's content instead of fresh content.
    pub fn append_item(&mut self, rel: RelationId, shared: Option<ItemId>) -> Result<ItemId, HrgError> {
        let id = self.alloc_item(rel, shared)?;
        let relnode = &mut self.relations[rel.0 as usize];
        match relnode.tail {
            None => {
                relnode.head = Some(id);
                relnode.tail = Some(id);
            }
            Some(tail) => {
                relnode.tail = Some(id);
                self.items[tail.0 as usize].next = Some(id);
                self.items[id.0 as usize].prev = Some(tail);
            }
        }
        Ok(id)
    }

    /// Prepend an item at the head of a relation.
    pub fn prepend_item(&mut self, rel: RelationId, shared: Option<ItemId>) -> Result<ItemId, HrgError> {
        let id = self.alloc_item(rel, shared)?;
        let relnode = &mut self.relations[rel.0 as usize];
        match relnode.head {
            None => {
                relnode.head = Some(id);
                relnode.tail = Some(id);
            }
            Some(head) => {
                relnode.head = Some(id);
                self.items[head.0 as usize].prev = Some(id);
                self.items[id.0 as usize].next = Some(head);
            }
        }
        Ok(id)
    }

    /// Add a daughter under `parent`, at the end of its daughter list.
    pub fn add_daughter(&mut self, parent: ItemId, shared: Option<ItemId>) -> Result<ItemId, HrgError> {
        let rel = self.items[parent.0 as usize].relation;
        let id = self.alloc_item(rel, shared)?;
        let last = self.items[parent.0 as usize].last_daughter;
        match last {
            None => {
                self.items[parent.0 as usize].first_daughter = Some(id);
            }
            Some(last) => {
                self.items[last.0 as usize].next = Some(id);
                self.items[id.0 as usize].prev = Some(last);
            }
        }
        self.items[parent.0 as usize].last_daughter = Some(id);
        self.items[id.0 as usize].parent = Some(parent);
        Ok(id)
    }

    /// Insert a new item directly after `at`, in the same sibling list.
    pub fn append_after(&mut self, at: ItemId, shared: Option<ItemId>) -> Result<ItemId, HrgError> {
        match self.items[at.0 as usize].next {
            None => {
                // Last in its containing list: defer to the parent or relation.
                match self.items[at.0 as usize].parent {
                    Some(parent) => self.add_daughter(parent, shared),
                    None => {
                        let rel = self.items[at.0 as usize].relation;
                        self.append_item(rel, shared)
                    }
                }
            }
            Some(next) => {
                let rel = self.items[at.0 as usize].relation;
                let id = self.alloc_item(rel, shared)?;
                self.items[next.0 as usize].prev = Some(id);
                self.items[id.0 as usize].next = Some(next);
                self.items[at.0 as usize].next = Some(id);
                self.items[id.0 as usize].prev = Some(at);
                self.items[id.0 as usize].parent = self.items[at.0 as usize].parent;
                Ok(id)
            }
        }
    }

    /// Insert a new item directly before `at`, in the same sibling list.
    pub fn prepend_before(&mut self, at: ItemId, shared: Option<ItemId>) -> Result<ItemId, HrgError> {
        let rel = self.items[at.0 as usize].relation;
        let id = self.alloc_item(rel, shared)?;
        let prev = self.items[at.0 as usize].prev;
        match prev {
            None => match self.items[at.0 as usize].parent {
                Some(parent) => self.items[parent.0 as usize].first_daughter = Some(id),
                None => self.relations[rel.0 as usize].head = Some(id),
            },
            Some(prev) => self.items[prev.0 as usize].next = Some(id),
        }
        self.items[id.0 as usize].next = Some(at);
        self.items[id.0 as usize].prev = prev;
        self.items[at.0 as usize].prev = Some(id);
        self.items[id.0 as usize].parent = self.items[at.0 as usize].parent;
        Ok(id)
    }

    // ─── Removal ─────────────────────────────────────────────────

    /// Remove an item, repairing head/tail, parent daughter links and
    /// sibling links. Daughters are removed too; with `deep` their shared
    /// contents (and so their items in every relation) go as well.
    pub fn remove_item(&mut self, item: ItemId, deep: bool) {
        if self.items[item.0 as usize].removed {
            return;
        }
        let node = self.items[item.0 as usize].clone();
        let relnode = &mut self.relations[node.relation.0 as usize];
        if relnode.head == Some(item) {
            relnode.head = node.next;
        }
        if relnode.tail == Some(item) {
            relnode.tail = node.prev;
        }
        if let Some(parent) = node.parent {
            if self.items[parent.0 as usize].first_daughter == Some(item) {
                self.items[parent.0 as usize].first_daughter = node.next;
            }
            if self.items[parent.0 as usize].last_daughter == Some(item) {
                self.items[parent.0 as usize].last_daughter = node.prev;
            }
        }
        if let Some(next) = node.next {
            self.items[next.0 as usize].prev = node.prev;
        }
        if let Some(prev) = node.prev {
            self.items[prev.0 as usize].next = node.next;
        }

        for d in self.daughters(item) {
            if deep {
                self.remove_content(d, true);
            } else {
                self.remove_item(d, false);
            }
        }

        let relname = self.relations[node.relation.0 as usize].name.clone();
        self.contents[node.content.0 as usize].relations.remove(&relname);
        self.items[item.0 as usize].removed = true;
    }

    /// Remove the content behind `item`: every item sharing it, in every
    /// relation, is removed.
    pub fn remove_content(&mut self, item: ItemId, deep: bool) {
        let content = self.items[item.0 as usize].content;
        let linked: Vec<ItemId> = self.contents[content.0 as usize].relations.values().copied().collect();
        for it in linked {
            if !self.items[it.0 as usize].removed {
                self.remove_item(it, deep);
            }
        }
    }

    // ─── Navigation ──────────────────────────────────────────────

    pub fn next(&self, item: ItemId) -> Option<ItemId> {
        self.items[item.0 as usize].next
    }

    pub fn prev(&self, item: ItemId) -> Option<ItemId> {
        self.items[item.0 as usize].prev
    }

    pub fn parent(&self, item: ItemId) -> Option<ItemId> {
        self.items[item.0 as usize].parent
    }

    pub fn first_daughter(&self, item: ItemId) -> Option<ItemId> {
        self.items[item.0 as usize].first_daughter
    }

    pub fn last_daughter(&self, item: ItemId) -> Option<ItemId> {
        self.items[item.0 as usize].last_daughter
    }

    pub fn has_daughters(&self, item: ItemId) -> bool {
        self.items[item.0 as usize].first_daughter.is_some()
    }

    pub fn daughters(&self, item: ItemId) -> Vec<ItemId> {
        let mut out = Vec::new();
        let mut cur = self.first_daughter(item);
        while let Some(d) = cur {
            out.push(d);
            cur = self.next(d);
        }
        out
    }

    pub fn num_daughters(&self, item: ItemId) -> usize {
        let mut count = 0;
        let mut cur = self.first_daughter(item);
        while let Some(d) = cur {
            count += 1;
            cur = self.next(d);
        }
        count
    }

    /// First item in the sibling list containing `item`.
    pub fn first_in_list(&self, item: ItemId) -> ItemId {
        let mut cur = item;
        while let Some(prev) = self.prev(cur) {
            cur = prev;
        }
        cur
    }

    /// Last item in the sibling list containing `item`.
    pub fn last_in_list(&self, item: ItemId) -> ItemId {
        let mut cur = item;
        while let Some(next) = self.next(cur) {
            cur = next;
        }
        cur
    }

    pub fn item_relation(&self, item: ItemId) -> RelationId {
        self.items[item.0 as usize].relation
    }

    /// The item in `relation` sharing this item's content, if any.
    pub fn item_in_relation(&self, item: ItemId, relation: &str) -> Option<ItemId> {
        let content = self.items[item.0 as usize].content;
        self.contents[content.0 as usize].relations.get(relation).copied()
    }

    pub fn in_relation(&self, item: ItemId, relation: &str) -> bool {
        self.item_in_relation(item, relation).is_some()
    }

    /// Items share identity iff they share content.
    pub fn same_content(&self, a: ItemId, b: ItemId) -> bool {
        self.items[a.0 as usize].content == self.items[b.0 as usize].content
    }

    // ─── Features ────────────────────────────────────────────────

    pub fn feature(&self, item: ItemId, name: &str) -> Option<&FeatureValue> {
        let content = self.items[item.0 as usize].content;
        self.contents[content.0 as usize].features.get(name)
    }

    pub fn feature_str(&self, item: ItemId, name: &str) -> Option<&str> {
        self.feature(item, name).and_then(|v| v.as_str())
    }

    pub fn has_feature(&self, item: ItemId, name: &str) -> bool {
        self.feature(item, name).is_some()
    }

    pub fn set_feature<V: Into<FeatureValue>>(&mut self, item: ItemId, name: &str, value: V) {
        let content = self.items[item.0 as usize].content;
        self.contents[content.0 as usize]
            .features
            .insert(name.to_string(), value.into());
    }

    pub fn remove_feature(&mut self, item: ItemId, name: &str) -> Option<FeatureValue> {
        let content = self.items[item.0 as usize].content;
        self.contents[content.0 as usize].features.remove(name)
    }

    /// Name feature, the conventional identity of most items.
    pub fn name(&self, item: ItemId) -> Option<&str> {
        self.feature_str(item, "name")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds the classic three-word utterance used throughout the tests:
    /// "mathematics is easy" with hand-written syllables.
    fn build_utt() -> Utterance {
        let mut utt = Utterance::from_text("mathematics is easy");
        let words: Vec<Vec<Vec<&str>>> = vec![
            vec![vec!["m", "ae", "th"], vec!["ax"], vec!["m", "ae"], vec!["t", "ih", "k", "s"]],
            vec![vec!["ih", "z"]],
            vec![vec!["ii"], vec!["z", "ih"]],
        ];

        let word_rel = utt.new_relation("Word");
        let syl_rel = utt.new_relation("Syllable");
        let seg_rel = utt.new_relation("Segment");
        let sylstruct_rel = utt.new_relation("SylStructure");

        for word in utt.text().unwrap().split_whitespace().map(str::to_string).collect::<Vec<_>>() {
            let item = utt.append_item(word_rel, None).unwrap();
            utt.set_feature(item, "name", word.as_str());
        }

        for (i, word_item) in utt.item_list(word_rel).into_iter().enumerate() {
            let word_in_ss = utt.append_item(sylstruct_rel, Some(word_item)).unwrap();
            for syl in &words[i] {
                let syl_item = utt.append_item(syl_rel, None).unwrap();
                utt.set_feature(syl_item, "name", "syl");
                let syl_in_ss = utt.add_daughter(word_in_ss, Some(syl_item)).unwrap();
                for seg in syl {
                    let seg_item = utt.append_item(seg_rel, None).unwrap();
                    utt.set_feature(seg_item, "name", *seg);
                    utt.add_daughter(syl_in_ss, Some(seg_item)).unwrap();
                }
            }
        }
        utt
    }

    #[test]
    fn test_relation_order() {
        let utt = build_utt();
        let word_rel = utt.relation("Word").unwrap();
        let names: Vec<&str> = utt.item_list(word_rel).iter().map(|&i| utt.name(i).unwrap()).collect();
        assert_eq!(names, vec!["mathematics", "is", "easy"]);
    }

    #[test]
    fn test_shared_content_across_relations() {
        let utt = build_utt();
        let word_rel = utt.relation("Word").unwrap();
        for word in utt.item_list(word_rel) {
            let in_ss = utt.item_in_relation(word, "SylStructure").unwrap();
            assert!(utt.same_content(word, in_ss));
            assert_eq!(utt.name(word), utt.name(in_ss));
        }
    }

    #[test]
    fn test_duplicate_in_relation_rejected() {
        let mut utt = Utterance::new();
        let rel = utt.new_relation("Word");
        let item = utt.append_item(rel, None).unwrap();
        let err = utt.append_item(rel, Some(item)).unwrap_err();
        assert_eq!(err, HrgError::DuplicateItemInRelation("Word".into()));
    }

    #[test]
    fn test_daughters_and_counts() {
        let utt = build_utt();
        let ss = utt.relation("SylStructure").unwrap();
        let first_word = utt.head(ss).unwrap();
        assert_eq!(utt.num_daughters(first_word), 4);
        let first_syl = utt.first_daughter(first_word).unwrap();
        assert_eq!(utt.num_daughters(first_syl), 3);
        let segs: Vec<&str> = utt
            .daughters(first_syl)
            .iter()
            .map(|&s| utt.name(s).unwrap())
            .collect();
        assert_eq!(segs, vec!["m", "ae", "th"]);
    }

    #[test]
    fn test_segment_order_matches_tree_leaves() {
        let utt = build_utt();
        let seg_rel = utt.relation("Segment").unwrap();
        let flat: Vec<&str> = utt.item_list(seg_rel).iter().map(|&s| utt.name(s).unwrap()).collect();
        let mut from_tree = Vec::new();
        for word in utt.items_named("SylStructure") {
            for syl in utt.daughters(word) {
                for seg in utt.daughters(syl) {
                    from_tree.push(utt.name(seg).unwrap());
                }
            }
        }
        assert_eq!(flat, from_tree);
    }

    #[test]
    fn test_prepend_and_insert() {
        let mut utt = Utterance::new();
        let rel = utt.new_relation("Segment");
        let b = utt.append_item(rel, None).unwrap();
        utt.set_feature(b, "name", "b");
        let a = utt.prepend_item(rel, None).unwrap();
        utt.set_feature(a, "name", "a");
        let mid = utt.append_after(a, None).unwrap();
        utt.set_feature(mid, "name", "mid");
        let names: Vec<&str> = utt.item_list(rel).iter().map(|&i| utt.name(i).unwrap()).collect();
        assert_eq!(names, vec!["a", "mid", "b"]);
        assert_eq!(utt.head(rel), Some(a));
        assert_eq!(utt.tail(rel), Some(b));
        let before = utt.prepend_before(mid, None).unwrap();
        utt.set_feature(before, "name", "before");
        let names: Vec<&str> = utt.item_list(rel).iter().map(|&i| utt.name(i).unwrap()).collect();
        assert_eq!(names, vec!["a", "before", "mid", "b"]);
    }

    #[test]
    fn test_append_after_tail_of_daughter_list() {
        let mut utt = Utterance::new();
        let rel = utt.new_relation("SylStructure");
        let parent = utt.append_item(rel, None).unwrap();
        let d1 = utt.add_daughter(parent, None).unwrap();
        // Appending after the last daughter goes through the parent.
        let d2 = utt.append_after(d1, None).unwrap();
        assert_eq!(utt.parent(d2), Some(parent));
        assert_eq!(utt.last_daughter(parent), Some(d2));
        assert_eq!(utt.next(d1), Some(d2));
    }

    #[test]
    fn test_remove_repairs_links() {
        let mut utt = Utterance::new();
        let rel = utt.new_relation("Segment");
        let a = utt.append_item(rel, None).unwrap();
        let b = utt.append_item(rel, None).unwrap();
        let c = utt.append_item(rel, None).unwrap();
        utt.remove_item(b, false);
        assert_eq!(utt.next(a), Some(c));
        assert_eq!(utt.prev(c), Some(a));
        assert_eq!(utt.item_list(rel), vec![a, c]);
        utt.remove_item(a, false);
        assert_eq!(utt.head(rel), Some(c));
        utt.remove_item(c, false);
        assert_eq!(utt.head(rel), None);
        assert_eq!(utt.tail(rel), None);
    }

    #[test]
    fn test_remove_head_updates_parent_daughters() {
        let mut utt = Utterance::new();
        let rel = utt.new_relation("SylStructure");
        let parent = utt.append_item(rel, None).unwrap();
        let d1 = utt.add_daughter(parent, None).unwrap();
        let d2 = utt.add_daughter(parent, None).unwrap();
        utt.remove_item(d1, false);
        assert_eq!(utt.first_daughter(parent), Some(d2));
        assert_eq!(utt.last_daughter(parent), Some(d2));
        utt.remove_item(d2, false);
        assert!(!utt.has_daughters(parent));
    }

    #[test]
    fn test_remove_content_removes_all_views() {
        let mut utt = Utterance::new();
        let word = utt.new_relation("Word");
        let ss = utt.new_relation("SylStructure");
        let w = utt.append_item(word, None).unwrap();
        utt.append_item(ss, Some(w)).unwrap();
        utt.remove_content(w, false);
        assert!(utt.item_list(word).is_empty());
        assert!(utt.item_list(ss).is_empty());
    }

    #[test]
    fn test_features_shared_through_content() {
        let mut utt = Utterance::new();
        let word = utt.new_relation("Word");
        let ss = utt.new_relation("SylStructure");
        let w = utt.append_item(word, None).unwrap();
        let w2 = utt.append_item(ss, Some(w)).unwrap();
        utt.set_feature(w, "name", "hello");
        assert_eq!(utt.name(w2), Some("hello"));
        utt.set_feature(w2, "gpos", "content");
        assert_eq!(utt.feature_str(w, "gpos"), Some("content"));
        utt.remove_feature(w, "gpos");
        assert!(!utt.has_feature(w2, "gpos"));
    }

    #[test]
    fn test_first_last_in_list() {
        let mut utt = Utterance::new();
        let rel = utt.new_relation("Segment");
        let a = utt.append_item(rel, None).unwrap();
        let b = utt.append_item(rel, None).unwrap();
        let c = utt.append_item(rel, None).unwrap();
        assert_eq!(utt.first_in_list(b), a);
        assert_eq!(utt.last_in_list(b), c);
        assert_eq!(utt.first_in_list(a), a);
        assert_eq!(utt.last_in_list(c), c);
    }

    #[test]
    fn test_utterance_serde_roundtrip_without_voice() {
        let utt = build_utt();
        let json = serde_json::to_string(&utt).unwrap();
        let utt2: Utterance = serde_json::from_str(&json).unwrap();
        assert_eq!(utt2.text(), Some("mathematics is easy"));
        let words: Vec<String> = utt2
            .items_named("Word")
            .iter()
            .map(|&i| utt2.name(i).unwrap().to_string())
            .collect();
        assert_eq!(words, vec!["mathematics", "is", "easy"]);
        assert!(utt2.selected_units.is_empty());
    }
}
