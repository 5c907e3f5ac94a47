//! Read-only projections over a completed `DependencyTree`.
//!
//! Presentation layers consume these views; nothing here mutates the tree.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::types::{DependencyNode, DependencyTree, Direction, NodeId};

/// Flatten the discovery events of one direction (or both), deduplicated
/// by node identity with first-appearance order preserved.
pub fn flatten(tree: &DependencyTree, direction: Option<Direction>) -> Vec<DependencyNode> {
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut result = Vec::new();

    let events: Vec<&DependencyNode> = match direction {
        Some(Direction::Upstream) => tree.upstream.iter().collect(),
        Some(Direction::Downstream) => tree.downstream.iter().collect(),
        None => tree.upstream.iter().chain(tree.downstream.iter()).collect(),
    };

    for node in events {
        if seen.insert(node.id()) {
            result.push(node.clone());
        }
    }
    result
}

/// Group every registered node by absolute depth. Nodes within a depth
/// group are ordered by file, line, then name for stable output.
pub fn group_by_depth(tree: &DependencyTree) -> BTreeMap<usize, Vec<DependencyNode>> {
    let mut groups: BTreeMap<usize, Vec<DependencyNode>> = BTreeMap::new();
    for node in tree.node_registry.values() {
        groups
            .entry(node.depth.unsigned_abs() as usize)
            .or_default()
            .push(node.clone());
    }
    for nodes in groups.values_mut() {
        nodes.sort_by(|a, b| {
            (a.file_path.as_str(), a.line_start, a.name.as_str()).cmp(&(
                b.file_path.as_str(),
                b.line_start,
                b.name.as_str(),
            ))
        });
    }
    groups
}

/// Group every registered node by the root tree it belongs to.
pub fn group_by_root(tree: &DependencyTree) -> HashMap<NodeId, Vec<DependencyNode>> {
    let mut groups: HashMap<NodeId, Vec<DependencyNode>> = HashMap::new();
    for node in tree.node_registry.values() {
        groups.entry(node.root.clone()).or_default().push(node.clone());
    }
    groups
}

/// Reconstruct the name path from the tree root down to `id`, inclusive,
/// by following parent links. `None` when the id is not registered.
pub fn path_to(tree: &DependencyTree, id: &NodeId) -> Option<Vec<String>> {
    let mut names = Vec::new();
    let mut guard: HashSet<NodeId> = HashSet::new();
    let mut current = Some(id.clone());

    while let Some(node_id) = current {
        if !guard.insert(node_id.clone()) {
            break;
        }
        let node = tree.node_registry.get(&node_id)?;
        names.push(node.name.clone());
        current = node.parent.clone();
    }

    names.reverse();
    Some(names)
}

/// A bounded, connectivity-preserving subset of the tree for external
/// visualization: breadth-first from the target through registered child
/// links, at most `max_nodes` nodes, target first and ordered by absolute
/// depth.
pub fn bounded_subset(tree: &DependencyTree, max_nodes: usize) -> Vec<DependencyNode> {
    let mut picked: Vec<DependencyNode> = Vec::new();
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut queue: VecDeque<NodeId> = VecDeque::new();

    let target_id = tree.target.id();
    queue.push_back(target_id);

    while let Some(id) = queue.pop_front() {
        if picked.len() >= max_nodes {
            break;
        }
        if !seen.insert(id.clone()) {
            continue;
        }
        let Some(node) = tree.node_registry.get(&id) else {
            continue;
        };
        picked.push(node.clone());
        for child in &node.children {
            queue.push_back(child.clone());
        }
    }

    picked.sort_by_key(|n| n.depth.unsigned_abs());
    picked
}
