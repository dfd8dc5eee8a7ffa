//! Cycle detection over relations between objects.
//!
//! A relation is read off a set of entities through two [`Endpoint`]s: every
//! entity contributes an edge from each of its `from` names to each of its `to`
//! names. Nodes are names (strings) on both ends, so hosts referenced by name and
//! hosts naming themselves meet on the same node.
//!
//! The check is read-only. It returns, for every entity that contributed an edge
//! lying on a cycle, one such edge so the caller can report it.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::core::EntityId;
use crate::item::Entity;

/// Where the names on one end of an edge come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// The entity's own name
    SelfName,
    /// A (possibly list-valued) property
    Attr(&'static str),
    /// Two properties combined as `first/second`, e.g. host and service description
    Pair(&'static str, &'static str),
}

impl Endpoint {
    fn names(self, entity: &Entity) -> Vec<String> {
        let attr = |prop: &str| entity.get(prop).map(|v| v.to_names()).unwrap_or_default();
        match self {
            Endpoint::SelfName => vec![entity.get_name()],
            Endpoint::Attr(prop) => attr(prop),
            Endpoint::Pair(first, second) => {
                let seconds = attr(second);
                attr(first)
                    .iter()
                    .flat_map(|a| seconds.iter().map(move |b| format!("{a}/{b}")))
                    .collect()
            }
        }
    }
}

/// An entity implicated in a cycle, with one of its cyclic edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleMember {
    pub entity: EntityId,
    pub from: String,
    pub to: String,
}

/// Directed name graph remembering which entity contributed each edge.
#[derive(Debug, Default)]
pub struct CycleChecker {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
    contributions: Vec<(EntityId, NodeIndex, NodeIndex)>,
}

impl CycleChecker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(name) {
            index
        } else {
            let index = self.graph.add_node(name.to_string());
            self.node_map.insert(name.to_string(), index);
            index
        }
    }

    /// Record that `entity` makes `from` point at `to`.
    pub fn add_edge(&mut self, entity: EntityId, from: &str, to: &str) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);
        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
        self.contributions.push((entity, from_idx, to_idx));
    }

    /// Entities owning at least one edge that lies on a cycle, in id order.
    #[must_use]
    pub fn implicated(&self) -> Vec<CycleMember> {
        let mut component = HashMap::new();
        let mut cyclic = HashSet::new();
        for (index, scc) in tarjan_scc(&self.graph).into_iter().enumerate() {
            let looping = scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]);
            for node in scc {
                component.insert(node, index);
                if looping {
                    cyclic.insert(index);
                }
            }
        }

        let mut members: BTreeMap<EntityId, CycleMember> = BTreeMap::new();
        for (entity, from, to) in &self.contributions {
            let same = component.get(from).is_some_and(|c| component.get(to) == Some(c));
            if same && component.get(from).is_some_and(|c| cyclic.contains(c)) {
                members.entry(*entity).or_insert_with(|| CycleMember {
                    entity: *entity,
                    from: self.graph[*from].clone(),
                    to: self.graph[*to].clone(),
                });
            }
        }
        members.into_values().collect()
    }
}

/// Build the relation `from -> to` over `entities` and return the entities caught
/// in a cycle. Entities missing either end contribute nothing.
pub fn check_no_cycle<'a>(
    entities: impl IntoIterator<Item = &'a Entity>,
    from: Endpoint,
    to: Endpoint,
) -> Vec<CycleMember> {
    let mut checker = CycleChecker::new();
    for entity in entities {
        let targets = to.names(entity);
        for source in from.names(entity) {
            for target in &targets {
                checker.add_edge(entity.id, &source, target);
            }
        }
    }
    checker.implicated()
}
