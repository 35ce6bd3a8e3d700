//! Centrality measures over the knowledge graph.
//!
//! Both measures use the directed definitions: degree centrality is
//! `(in + out) / (N - 1)` and betweenness is computed with Brandes' algorithm
//! over distinct successors, normalized by `(N - 1)(N - 2)`.

#![allow(clippy::cast_precision_loss)]

use std::collections::{HashMap, HashSet, VecDeque};

use super::types::KnowledgeGraph;

/// Degree centrality for every node.
///
/// Graphs with at most one node give every node a centrality of 1.
#[must_use]
pub fn degree_centrality(graph: &KnowledgeGraph) -> HashMap<String, f64> {
    let n = graph.node_count();
    let mut degrees: HashMap<&str, usize> = HashMap::with_capacity(n);
    for edge in graph.edges() {
        *degrees.entry(edge.source.as_str()).or_default() += 1;
        *degrees.entry(edge.target.as_str()).or_default() += 1;
    }

    graph
        .nodes()
        .iter()
        .map(|node| {
            let value = if n <= 1 {
                1.0
            } else {
                degrees.get(node.id.as_str()).copied().unwrap_or(0) as f64 / (n - 1) as f64
            };
            (node.id.clone(), value)
        })
        .collect()
}

/// Normalized betweenness centrality for every node.
#[must_use]
pub fn betweenness_centrality(graph: &KnowledgeGraph) -> HashMap<String, f64> {
    let n = graph.node_count();
    let adjacency = successor_lists(graph);
    let mut scores = vec![0.0_f64; n];

    for source in 0..n {
        let mut stack = Vec::with_capacity(n);
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0_f64; n];
        let mut dist: Vec<Option<usize>> = vec![None; n];
        sigma[source] = 1.0;
        dist[source] = Some(0);

        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            let dv = dist[v].unwrap_or(0);
            for &w in &adjacency[v] {
                if dist[w].is_none() {
                    dist[w] = Some(dv + 1);
                    queue.push_back(w);
                }
                if dist[w] == Some(dv + 1) {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0_f64; n];
        while let Some(w) = stack.pop() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != source {
                scores[w] += delta[w];
            }
        }
    }

    let scale = if n > 2 {
        1.0 / ((n - 1) * (n - 2)) as f64
    } else {
        1.0
    };

    graph
        .nodes()
        .iter()
        .zip(scores)
        .map(|(node, score)| (node.id.clone(), score * scale))
        .collect()
}

/// Distinct successor indices per node, in edge order.
fn successor_lists(graph: &KnowledgeGraph) -> Vec<Vec<usize>> {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); graph.node_count()];
    let mut seen: HashSet<(usize, usize)> = HashSet::with_capacity(graph.edge_count());
    for edge in graph.edges() {
        let (Some(s), Some(t)) = (graph.position(&edge.source), graph.position(&edge.target))
        else {
            continue;
        };
        if s != t && seen.insert((s, t)) {
            adjacency[s].push(t);
        }
    }
    adjacency
}
