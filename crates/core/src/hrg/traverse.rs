//! Path-based traversal over HRG items.
//!
//! A path is a dotted step sequence, e.g.
//! `n.R:SylStructure.parent.p.daughter.last.daughtern.first.F:name`.
//! Paths are parsed once into a step list and interpreted against an
//! `(utterance, item)` pair; following a null link fails with
//! [`TraversalError`], which callers map to a neutral value.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use thiserror::Error;

use super::{FeatureValue, ItemId, Utterance};

/// A traversal that followed a null link, asked for a missing feature, or
/// named an unknown method.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("traversal failed at step '{step}'")]
pub struct TraversalError {
    pub step: String,
}

impl TraversalError {
    fn at(step: &str) -> Self {
        TraversalError { step: step.to_string() }
    }
}

/// One parsed step of a traversal path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Next,
    Prev,
    Parent,
    FirstDaughter,
    LastDaughter,
    First,
    Last,
    InRelation(String),
    Feature(String),
    Method(String, Vec<String>),
}

/// Result of evaluating a path: an item, or a feature/method value.
#[derive(Debug, Clone, PartialEq)]
pub enum PathValue {
    Item(ItemId),
    Value(FeatureValue),
}

/// An item-extension function callable through `M:` steps.
pub type MethodFn = fn(&Utterance, ItemId, &[String]) -> Option<FeatureValue>;

/// Registry mapping method names to item-extension functions.
#[derive(Default)]
pub struct MethodRegistry {
    map: BTreeMap<String, MethodFn>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        MethodRegistry::default()
    }

    /// Registry preloaded with the linguistic feature extractors.
    pub fn with_defaults() -> Self {
        let mut reg = MethodRegistry::new();
        crate::features::register_defaults(&mut reg);
        reg
    }

    pub fn register(&mut self, name: &str, func: MethodFn) {
        self.map.insert(name.to_string(), func);
    }

    pub fn get(&self, name: &str) -> Option<MethodFn> {
        self.map.get(name).copied()
    }
}

lazy_static! {
    /// The registry used by [`Path::eval`] and the label builder.
    pub static ref DEFAULT_METHODS: MethodRegistry = MethodRegistry::with_defaults();
}

/// A parsed traversal path.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    steps: Vec<PathStep>,
}

impl Path {
    /// Parse a dotted path string. Unknown step names fail.
    pub fn parse(path: &str) -> Result<Path, TraversalError> {
        let mut steps = Vec::new();
        for step in path.split('.') {
            let parsed = match step {
                "n" => PathStep::Next,
                "p" => PathStep::Prev,
                "parent" => PathStep::Parent,
                "daughter" => PathStep::FirstDaughter,
                "daughtern" => PathStep::LastDaughter,
                "first" => PathStep::First,
                "last" => PathStep::Last,
                _ => {
                    if let Some(name) = step.strip_prefix("R:") {
                        PathStep::InRelation(name.to_string())
                    } else if let Some(name) = step.strip_prefix("F:") {
                        PathStep::Feature(name.to_string())
                    } else if let Some(call) = step.strip_prefix("M:") {
                        parse_method(call).ok_or_else(|| TraversalError::at(step))?
                    } else {
                        return Err(TraversalError::at(step));
                    }
                }
            };
            steps.push(parsed);
        }
        Ok(Path { steps })
    }

    /// Interpret the path starting from `item`.
    pub fn eval(
        &self,
        utt: &Utterance,
        item: ItemId,
        methods: &MethodRegistry,
    ) -> Result<PathValue, TraversalError> {
        let mut current = item;
        let mut steps = self.steps.iter().peekable();
        while let Some(step) = steps.next() {
            match step {
                PathStep::Next => current = utt.next(current).ok_or_else(|| TraversalError::at("n"))?,
                PathStep::Prev => current = utt.prev(current).ok_or_else(|| TraversalError::at("p"))?,
                PathStep::Parent => {
                    current = utt.parent(current).ok_or_else(|| TraversalError::at("parent"))?
                }
                PathStep::FirstDaughter => {
                    current = utt
                        .first_daughter(current)
                        .ok_or_else(|| TraversalError::at("daughter"))?
                }
                PathStep::LastDaughter => {
                    current = utt
                        .last_daughter(current)
                        .ok_or_else(|| TraversalError::at("daughtern"))?
                }
                PathStep::First => current = utt.first_in_list(current),
                PathStep::Last => current = utt.last_in_list(current),
                PathStep::InRelation(name) => {
                    current = utt
                        .item_in_relation(current, name)
                        .ok_or_else(|| TraversalError::at(name))?
                }
                PathStep::Feature(name) => {
                    // Terminal step: a value cannot be traversed further.
                    if steps.peek().is_some() {
                        return Err(TraversalError::at(name));
                    }
                    let value = utt.feature(current, name).ok_or_else(|| TraversalError::at(name))?;
                    return Ok(PathValue::Value(value.clone()));
                }
                PathStep::Method(name, args) => {
                    if steps.peek().is_some() {
                        return Err(TraversalError::at(name));
                    }
                    let func = methods.get(name).ok_or_else(|| TraversalError::at(name))?;
                    let value = func(utt, current, args).ok_or_else(|| TraversalError::at(name))?;
                    return Ok(PathValue::Value(value));
                }
            }
        }
        Ok(PathValue::Item(current))
    }
}

fn parse_method(call: &str) -> Option<PathStep> {
    let open = call.find('(')?;
    if !call.ends_with(')') {
        return None;
    }
    let name = &call[..open];
    let argstr = &call[open + 1..call.len() - 1];
    let args: Vec<String> = if argstr.trim().is_empty() {
        Vec::new()
    } else {
        argstr
            .split(',')
            .map(|a| a.trim().trim_matches('\'').trim_matches('"').to_string())
            .collect()
    };
    Some(PathStep::Method(name.to_string(), args))
}

/// Parse and evaluate in one call, returning the value of a terminal
/// `F:`/`M:` step.
pub fn traverse_value(utt: &Utterance, item: ItemId, path: &str) -> Result<FeatureValue, TraversalError> {
    match Path::parse(path)?.eval(utt, item, &DEFAULT_METHODS)? {
        PathValue::Value(v) => Ok(v),
        PathValue::Item(_) => Err(TraversalError::at(path)),
    }
}

/// Parse and evaluate in one call, returning the reached item.
pub fn traverse_item(utt: &Utterance, item: ItemId, path: &str) -> Result<ItemId, TraversalError> {
    match Path::parse(path)?.eval(utt, item, &DEFAULT_METHODS)? {
        PathValue::Item(i) => Ok(i),
        PathValue::Value(_) => Err(TraversalError::at(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_relation_utt() -> (Utterance, ItemId) {
        let mut utt = Utterance::new();
        let word = utt.new_relation("Word");
        let ss = utt.new_relation("SylStructure");
        let w1 = utt.append_item(word, None).unwrap();
        utt.set_feature(w1, "name", "hello");
        let w2 = utt.append_item(word, None).unwrap();
        utt.set_feature(w2, "name", "world");
        let w1_ss = utt.append_item(ss, Some(w1)).unwrap();
        let syl = utt.add_daughter(w1_ss, None).unwrap();
        utt.set_feature(syl, "name", "syl");
        utt.add_daughter(w1_ss, None).unwrap();
        (utt, w1)
    }

    #[test]
    fn test_parse_rejects_unknown_step() {
        assert!(Path::parse("n.q").is_err());
        assert!(Path::parse("M:broken(").is_err());
    }

    #[test]
    fn test_next_and_feature() {
        let (utt, w1) = two_relation_utt();
        let v = traverse_value(&utt, w1, "n.F:name").unwrap();
        assert_eq!(v, FeatureValue::Str("world".into()));
    }

    #[test]
    fn test_null_link_fails() {
        let (utt, w1) = two_relation_utt();
        assert!(traverse_value(&utt, w1, "p.F:name").is_err());
        assert!(traverse_value(&utt, w1, "n.n.F:name").is_err());
    }

    #[test]
    fn test_missing_feature_fails() {
        let (utt, w1) = two_relation_utt();
        assert!(traverse_value(&utt, w1, "F:gpos").is_err());
    }

    #[test]
    fn test_relation_jump_and_daughters() {
        let (utt, w1) = two_relation_utt();
        let v = traverse_value(&utt, w1, "R:SylStructure.daughter.F:name").unwrap();
        assert_eq!(v, FeatureValue::Str("syl".into()));
        // w2 has no SylStructure counterpart.
        let w2 = utt.next(w1).unwrap();
        assert!(traverse_item(&utt, w2, "R:SylStructure").is_err());
    }

    #[test]
    fn test_first_last() {
        let (utt, w1) = two_relation_utt();
        let w2 = utt.next(w1).unwrap();
        assert_eq!(traverse_item(&utt, w2, "first").unwrap(), w1);
        assert_eq!(traverse_item(&utt, w1, "last").unwrap(), w2);
    }

    #[test]
    fn test_method_call() {
        let (utt, w1) = two_relation_utt();
        let v = traverse_value(&utt, w1, "R:SylStructure.M:num_daughters()").unwrap();
        assert_eq!(v, FeatureValue::Int(2));
    }

    #[test]
    fn test_method_args_parsing() {
        let step = parse_method("syldistprev('stress', '1')").unwrap();
        assert_eq!(
            step,
            PathStep::Method("syldistprev".into(), vec!["stress".into(), "1".into()])
        );
        let step = parse_method("num_daughters()").unwrap();
        assert_eq!(step, PathStep::Method("num_daughters".into(), vec![]));
    }

    #[test]
    fn test_value_steps_are_terminal() {
        let (utt, w1) = two_relation_utt();
        assert!(traverse_value(&utt, w1, "F:name.n").is_err());
    }
}
