//! Derived `SIMILAR_TO` edges over the stored company population
//!
//! Pairs are computed set-wise from inverted indices (category -> companies,
//! sector -> companies) and oriented from the lower node id to the higher one,
//! so every unordered pair is stored once and never as a self-loop.

use super::property::{PropertyMap, PropertyValue};
use super::store::{GraphResult, GraphStore};
use super::types::{EdgeType, Label, NodeId};
use crate::schema::{self, NodeLabel, SimilarityBasis};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// One derived pair; `source < target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarPair {
    pub source: NodeId,
    pub target: NodeId,
    /// Sorted shared category names; empty for the sector basis
    pub shared_categories: Vec<String>,
}

/// Companies sharing at least one `OFFERS` target
pub fn pairs_by_shared_category(store: &GraphStore) -> Vec<SimilarPair> {
    let company = Label::from(NodeLabel::Company);
    let category = Label::from(NodeLabel::ProductCategory);
    let offers = EdgeType::new(schema::OFFERS);

    let mut offered_by: BTreeMap<String, BTreeSet<NodeId>> = BTreeMap::new();
    for edge in store.get_edges_by_type(&offers) {
        let (Some(source), Some(target)) = (store.get_node(edge.source), store.get_node(edge.target))
        else {
            continue;
        };
        if !source.has_label(&company) || !target.has_label(&category) {
            continue;
        }
        if let Some(name) = target.key() {
            offered_by.entry(name.to_string()).or_default().insert(source.id);
        }
    }

    let mut shared: BTreeMap<(NodeId, NodeId), BTreeSet<String>> = BTreeMap::new();
    for (name, companies) in &offered_by {
        for (a, b) in ordered_pairs(companies) {
            shared.entry((a, b)).or_default().insert(name.clone());
        }
    }

    shared
        .into_iter()
        .map(|((source, target), names)| SimilarPair {
            source,
            target,
            shared_categories: names.into_iter().collect(),
        })
        .collect()
}

/// Companies with an equal, non-null `sector`
pub fn pairs_by_sector(store: &GraphStore) -> Vec<SimilarPair> {
    let mut by_sector: BTreeMap<&str, BTreeSet<NodeId>> = BTreeMap::new();
    for node in store.get_nodes_by_label(&Label::from(NodeLabel::Company)) {
        if let Some(sector) = node.get_str(schema::SECTOR) {
            by_sector.entry(sector).or_default().insert(node.id);
        }
    }

    let mut pairs: BTreeSet<(NodeId, NodeId)> = BTreeSet::new();
    for companies in by_sector.values() {
        pairs.extend(ordered_pairs(companies));
    }

    pairs
        .into_iter()
        .map(|(source, target)| SimilarPair {
            source,
            target,
            shared_categories: Vec::new(),
        })
        .collect()
}

pub fn current_pairs(store: &GraphStore, basis: SimilarityBasis) -> Vec<SimilarPair> {
    match basis {
        SimilarityBasis::ProductCategory => pairs_by_shared_category(store),
        SimilarityBasis::Sector => pairs_by_sector(store),
    }
}

/// Remove `SIMILAR_TO` edges of `basis` whose condition no longer holds.
/// Returns the number of edges removed.
pub fn prune_similar(store: &mut GraphStore, basis: SimilarityBasis) -> GraphResult<usize> {
    let current: BTreeSet<(NodeId, NodeId)> = current_pairs(store, basis)
        .into_iter()
        .map(|pair| (pair.source, pair.target))
        .collect();

    let pattern = basis_pattern(basis);
    let stale: Vec<_> = store
        .get_edges_by_type(&EdgeType::new(schema::SIMILAR_TO))
        .into_iter()
        .filter(|edge| edge.matches_properties(&pattern))
        .filter(|edge| !current.contains(&(edge.source, edge.target)))
        .map(|edge| edge.id)
        .collect();

    for id in &stale {
        store.delete_edge(*id)?;
    }
    debug!("Pruned {} stale {} similarity edges", stale.len(), basis);
    Ok(stale.len())
}

/// Merge one `SIMILAR_TO` edge per current pair of `basis`.
/// Returns the number of pairs written.
pub fn derive_similar(store: &mut GraphStore, basis: SimilarityBasis) -> GraphResult<usize> {
    let pairs = current_pairs(store, basis);
    for pair in &pairs {
        let id = store.merge_edge(
            pair.source,
            pair.target,
            schema::SIMILAR_TO,
            basis_pattern(basis),
        )?;
        if basis == SimilarityBasis::ProductCategory {
            if let Some(edge) = store.get_edge_mut(id) {
                edge.set_property(
                    schema::SHARED_CATEGORIES,
                    PropertyValue::from(pair.shared_categories.clone()),
                );
            }
        }
    }
    debug!("Derived {} {} similarity edges", pairs.len(), basis);
    Ok(pairs.len())
}

fn basis_pattern(basis: SimilarityBasis) -> PropertyMap {
    let mut pattern = PropertyMap::new();
    pattern.insert(schema::BASIS.to_string(), PropertyValue::from(basis.as_str()));
    pattern
}

fn ordered_pairs(ids: &BTreeSet<NodeId>) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
    ids.iter()
        .enumerate()
        .flat_map(move |(i, a)| ids.iter().skip(i + 1).map(move |b| (*a, *b)))
}
