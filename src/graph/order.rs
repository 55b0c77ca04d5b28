use ahash::AHashMap;
use itertools::Itertools;
use std::collections::VecDeque;

use super::{Connection, Node};

/// Kahn's algorithm over the connection graph.
///
/// Returns `None` when fewer nodes drain than exist — the cycle signal.
/// Connections whose endpoints are not in the node map are skipped here;
/// they are validation's concern, not ordering's. Ties are broken by node id
/// so the order is deterministic for a given graph.
pub(super) fn topological_order(
    nodes: &AHashMap<String, Node>,
    connections: &AHashMap<String, Connection>,
) -> Option<Vec<String>> {
    let mut in_degree: AHashMap<&str, usize> =
        nodes.keys().map(|id| (id.as_str(), 0)).collect();
    let mut adjacency: AHashMap<&str, Vec<&str>> =
        nodes.keys().map(|id| (id.as_str(), Vec::new())).collect();

    for connection in connections.values() {
        let source = connection.source_node_id.as_str();
        let target = connection.target_node_id.as_str();
        if !in_degree.contains_key(source) || !in_degree.contains_key(target) {
            continue;
        }
        if let Some(neighbors) = adjacency.get_mut(source) {
            neighbors.push(target);
        }
        if let Some(degree) = in_degree.get_mut(target) {
            *degree += 1;
        }
    }
    for neighbors in adjacency.values_mut() {
        neighbors.sort_unstable();
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| *id)
        .sorted()
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(current) = queue.pop_front() {
        order.push(current.to_string());
        if let Some(neighbors) = adjacency.get(current) {
            for &neighbor in neighbors {
                if let Some(degree) = in_degree.get_mut(neighbor) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(neighbor);
                    }
                }
            }
        }
    }

    if order.len() != nodes.len() {
        return None;
    }
    Some(order)
}
