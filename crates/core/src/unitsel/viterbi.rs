//! Viterbi search over the candidate lattice.
//!
//! Column by column, every new candidate is scored against every
//! surviving previous candidate: join score `6 / (6 + euclidean)` between
//! adjacent join-coefficient vectors, plus the accumulated path score,
//! plus the new candidate's target score. Columns are pruned by relative
//! score delta and then capped to the top K survivors.

use std::sync::Arc;

use crate::hrg::Utterance;

use super::{
    target_score, unit_features, CatalogueUnit, UnitCatalogue, UnitSelectionConfig,
    UnitSelectionError,
};

#[derive(Debug, Clone)]
struct Node {
    candidate: Arc<CatalogueUnit>,
    /// Index into the previous column, for traceback.
    prev: Option<usize>,
    total_score: f64,
}

fn join_score(left: &[f64], right: &[f64]) -> f64 {
    let dist: f64 = left
        .iter()
        .zip(right.iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>()
        .sqrt();
    6.0 / (6.0 + dist)
}

/// First index of the maximum score.
fn argmax(scores: impl Iterator<Item = f64>) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, s) in scores.enumerate() {
        if best.map(|(_, b)| s > b).unwrap_or(true) {
            best = Some((i, s));
        }
    }
    best
}

/// Search the catalogue for the best unit sequence and record it on the
/// utterance: each Unit item gets a `selected_unit` index into
/// `utt.selected_units`, which holds the chosen candidates in order.
pub fn select_units(
    utt: &mut Utterance,
    catalogue: &UnitCatalogue,
    config: &UnitSelectionConfig,
) -> Result<(), UnitSelectionError> {
    let unit_rel = utt.relation("Unit").ok_or(UnitSelectionError::MissingUnitRelation)?;
    let units = utt.item_list(unit_rel);
    if units.is_empty() {
        return Err(UnitSelectionError::MissingUnitRelation);
    }

    let mut trellis: Vec<Vec<Node>> = Vec::with_capacity(units.len());

    // First column: every candidate enters with score zero.
    let first_name = utt.name(units[0]).unwrap_or_default().to_string();
    let first_cands = catalogue.candidates(&first_name);
    if first_cands.is_empty() {
        return Err(UnitSelectionError::NoCandidates(first_name));
    }
    trellis.push(
        first_cands
            .iter()
            .map(|c| Node { candidate: Arc::clone(c), prev: None, total_score: 0.0 })
            .collect(),
    );

    for &unit in &units[1..] {
        let name = utt.name(unit).unwrap_or_default().to_string();
        let cands = catalogue.candidates(&name);
        if cands.is_empty() {
            return Err(UnitSelectionError::NoCandidates(name));
        }
        let target = unit_features(utt, unit);
        let prev_col = trellis.last().unwrap();

        let mut column: Vec<Node> = Vec::with_capacity(cands.len());
        for cand in cands {
            let (best_prev, best_score) = argmax(prev_col.iter().map(|prev| {
                prev.total_score + join_score(&cand.left_joincoef, &prev.candidate.right_joincoef)
            }))
            .expect("previous column is never empty");
            column.push(Node {
                candidate: Arc::clone(cand),
                prev: Some(best_prev),
                total_score: best_score + target_score(&target, &cand.features, config.unit_type),
            });
        }

        // Prune on relative score, then cap the column size.
        let best = column.iter().map(|n| n.total_score).fold(f64::MIN, f64::max);
        let threshold = best - config.prune_delta * best;
        let mut column: Vec<Node> =
            column.into_iter().filter(|n| n.total_score >= threshold).collect();
        if column.len() > config.prune_top_k {
            column.sort_by(|a, b| b.total_score.partial_cmp(&a.total_score).unwrap());
            column.truncate(config.prune_top_k);
        }
        trellis.push(column);
    }

    // Traceback from the best final node.
    let last = trellis.last().unwrap();
    let (mut best_index, _) =
        argmax(last.iter().map(|n| n.total_score)).expect("final column is never empty");
    let mut path: Vec<Arc<CatalogueUnit>> = Vec::with_capacity(trellis.len());
    for column in trellis.iter().rev() {
        let node = &column[best_index];
        path.push(Arc::clone(&node.candidate));
        best_index = node.prev.unwrap_or(0);
    }
    path.reverse();

    for (i, unit) in units.iter().enumerate() {
        utt.set_feature(*unit, "selected_unit", i);
    }
    utt.selected_units = path;
    Ok(())
}

/// Exhaustive search over all paths; the reference the pruned search is
/// checked against.
#[cfg(test)]
pub fn brute_force_best(
    utt: &Utterance,
    catalogue: &UnitCatalogue,
    config: &UnitSelectionConfig,
) -> Option<(Vec<String>, f64)> {
    let units = utt.items_named("Unit");
    let mut paths: Vec<(Vec<Arc<CatalogueUnit>>, f64)> = catalogue
        .candidates(utt.name(units[0])?)
        .iter()
        .map(|c| (vec![Arc::clone(c)], 0.0))
        .collect();
    for &unit in &units[1..] {
        let target = unit_features(utt, unit);
        let mut next = Vec::new();
        for cand in catalogue.candidates(utt.name(unit)?) {
            for (path, score) in &paths {
                let prev = path.last().unwrap();
                let s = score
                    + join_score(&cand.left_joincoef, &prev.right_joincoef)
                    + target_score(&target, &cand.features, config.unit_type);
                let mut path = path.clone();
                path.push(Arc::clone(cand));
                next.push((path, s));
            }
        }
        paths = next;
    }
    paths
        .into_iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .map(|(path, score)| (path.iter().map(|c| c.name.clone()).collect(), score))
}
