//! Class inheritance walking
//!
//! Supertype references are resolved by Id through the specification. A
//! reference to an unknown class ends the walk; a cycle ends it as well.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

use crate::model::CimType;

/// Child → parent edges of the class hierarchy
#[derive(Debug, Default)]
pub struct InheritanceGraph {
    edges: Vec<(String, String)>,
}

impl InheritanceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from every resolvable supertype reference.
    ///
    /// An edge that would close a cycle is left out.
    pub fn from_types(types: &BTreeMap<String, CimType>) -> Self {
        let mut graph = Self::new();
        for class in types.values() {
            if !types.contains_key(&class.super_type) {
                continue;
            }
            if graph.would_create_cycle(&class.id, &class.super_type) {
                debug!(
                    class = %class.id,
                    super_type = %class.super_type,
                    "skipping cyclic supertype edge"
                );
                continue;
            }
            graph.add_edge(&class.id, &class.super_type);
        }
        graph
    }

    pub fn add_edge(&mut self, child: impl Into<String>, parent: impl Into<String>) {
        self.edges.push((child.into(), parent.into()));
    }

    /// Detect if adding this edge would create a cycle
    pub fn would_create_cycle(&self, child: &str, parent: &str) -> bool {
        if child == parent {
            return true;
        }

        // Check if parent depends on child (directly or transitively)
        let mut to_visit = vec![parent.to_string()];
        let mut visited = HashSet::new();

        while let Some(current) = to_visit.pop() {
            if current == child {
                return true;
            }
            if visited.insert(current.clone()) {
                for (c, p) in &self.edges {
                    if c == &current {
                        to_visit.push(p.clone());
                    }
                }
            }
        }

        false
    }

    /// All transitive subclasses of `id`, sorted
    pub fn descendants(&self, id: &str) -> Vec<String> {
        let mut found = BTreeSet::new();
        let mut to_visit = vec![id.to_string()];

        while let Some(current) = to_visit.pop() {
            for (c, p) in &self.edges {
                if p == &current && c != id && found.insert(c.clone()) {
                    to_visit.push(c.clone());
                }
            }
        }

        found.into_iter().collect()
    }
}

/// The type itself followed by its resolvable ancestors, nearest first
pub fn lineage<'a>(types: &'a BTreeMap<String, CimType>, id: &str) -> Vec<&'a CimType> {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut current = types.get(id);

    while let Some(class) = current {
        if !visited.insert(class.id.as_str()) {
            debug!(class = %id, at = %class.id, "inheritance cycle, stopping walk");
            break;
        }
        chain.push(class);
        current = match class.super_type.as_str() {
            "" => None,
            super_type => {
                let parent = types.get(super_type);
                if parent.is_none() {
                    debug!(class = %class.id, super_type, "unresolved supertype, stopping walk");
                }
                parent
            }
        };
    }

    chain
}

/// Ancestor ids of `id`, nearest first
pub fn ancestors(types: &BTreeMap<String, CimType>, id: &str) -> Vec<String> {
    lineage(types, id)
        .into_iter()
        .skip(1)
        .map(|class| class.id.clone())
        .collect()
}

/// Fill `super_types` and `sub_classes` of every type
pub fn link_hierarchy(types: &mut BTreeMap<String, CimType>) {
    let graph = InheritanceGraph::from_types(types);
    let links: Vec<(String, Vec<String>, Vec<String>)> = types
        .keys()
        .map(|id| (id.clone(), ancestors(types, id), graph.descendants(id)))
        .collect();

    for (id, super_types, sub_classes) in links {
        if let Some(class) = types.get_mut(&id) {
            class.super_types = super_types;
            class.sub_classes = sub_classes;
        }
    }
}
