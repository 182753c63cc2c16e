//! Citation network analysis.
//!
//! The stored citations form a directed graph, `citing → cited`. Nodes are added in patent
//! number order so every analysis is deterministic for a given set of citations.
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt::Write;
use std::sync::Arc;

use log::{debug, info};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::error::DiscoveryError;
use crate::repository::PatentRepository;
use crate::types::CitationEdge;

pub const DAMPING_FACTOR: f64 = 0.85;
pub const MAX_ITERATIONS: usize = 20;
pub const TOLERANCE: f64 = 1e-7;
pub const MAX_SWEEPS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPatent {
    pub patent_number: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    pub id: usize,
    pub size: usize,
    pub members: Vec<String>,
}

#[derive(Debug, Default)]
pub struct CitationGraph {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl CitationGraph {
    /// Builds the graph, ignoring repeated edges
    #[must_use]
    pub fn from_edges(edges: &[CitationEdge]) -> Self {
        let numbers: BTreeSet<&str> = edges
            .iter()
            .flat_map(|e| [e.citing.as_str(), e.cited.as_str()])
            .collect();

        let mut graph = DiGraph::with_capacity(numbers.len(), edges.len());
        let nodes: HashMap<String, NodeIndex> = numbers
            .into_iter()
            .map(|n| (n.to_string(), graph.add_node(n.to_string())))
            .collect();

        let mut seen = HashSet::new();
        for edge in edges {
            let (a, b) = (nodes[&edge.citing], nodes[&edge.cited]);
            if seen.insert((a, b)) {
                graph.add_edge(a, b, ());
            }
        }
        debug!(
            "Citation graph has {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        CitationGraph { graph, nodes }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// PageRank of every patent, highest first.
    ///
    /// Rank held by patents citing nothing is spread evenly over all patents, so the
    /// scores always sum to one.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn page_rank(&self) -> Vec<RankedPatent> {
        let n = self.graph.node_count();
        if n == 0 {
            return Vec::new();
        }
        let count = n as f64;
        let out_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|i| self.graph.neighbors_directed(i, Direction::Outgoing).count())
            .collect();

        let mut ranks = vec![1.0 / count; n];
        for iteration in 0..MAX_ITERATIONS {
            let dangling: f64 = self
                .graph
                .node_indices()
                .filter(|i| out_degree[i.index()] == 0)
                .map(|i| ranks[i.index()])
                .sum();
            let base = (1.0 - DAMPING_FACTOR) / count + DAMPING_FACTOR * dangling / count;

            let next: Vec<f64> = self
                .graph
                .node_indices()
                .map(|v| {
                    let incoming: f64 = self
                        .graph
                        .neighbors_directed(v, Direction::Incoming)
                        .map(|u| ranks[u.index()] / out_degree[u.index()] as f64)
                        .sum();
                    base + DAMPING_FACTOR * incoming
                })
                .collect();

            let delta: f64 = next.iter().zip(&ranks).map(|(a, b)| (a - b).abs()).sum();
            ranks = next;
            if delta < TOLERANCE {
                debug!("PageRank converged after {} iterations", iteration + 1);
                break;
            }
        }

        let mut ranked: Vec<RankedPatent> = self
            .graph
            .node_indices()
            .map(|i| RankedPatent {
                patent_number: self.graph[i].clone(),
                score: ranks[i.index()],
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.patent_number.cmp(&b.patent_number))
        });
        ranked
    }

    /// Groups of patents found by label propagation over citations in either direction.
    ///
    /// Each patent repeatedly takes the label most common among its neighbours, the
    /// smallest one on ties, until nothing changes or `MAX_SWEEPS` passes were made.
    #[must_use]
    pub fn communities(&self, min_size: usize) -> Vec<Community> {
        let mut labels: Vec<usize> = (0..self.graph.node_count()).collect();

        for sweep in 0..MAX_SWEEPS {
            let mut changed = false;
            for node in self.graph.node_indices() {
                let mut counts: HashMap<usize, usize> = HashMap::new();
                for neighbour in self.graph.neighbors_undirected(node) {
                    if neighbour != node {
                        *counts.entry(labels[neighbour.index()]).or_default() += 1;
                    }
                }
                let best = counts
                    .into_iter()
                    .max_by(|(la, ca), (lb, cb)| ca.cmp(cb).then_with(|| lb.cmp(la)))
                    .map(|(label, _)| label);
                if let Some(label) = best {
                    if labels[node.index()] != label {
                        labels[node.index()] = label;
                        changed = true;
                    }
                }
            }
            if !changed {
                debug!("Label propagation settled after {} sweeps", sweep + 1);
                break;
            }
        }

        let mut groups: HashMap<usize, Vec<String>> = HashMap::new();
        for node in self.graph.node_indices() {
            groups
                .entry(labels[node.index()])
                .or_default()
                .push(self.graph[node].clone());
        }

        let mut members: Vec<Vec<String>> = groups
            .into_values()
            .filter(|m| m.len() >= min_size.max(1))
            .map(|mut m| {
                m.sort();
                m
            })
            .collect();
        members.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        members
            .into_iter()
            .enumerate()
            .map(|(id, members)| Community {
                id,
                size: members.len(),
                members,
            })
            .collect()
    }

    /// Fewest hops between two patents, following citations in either direction
    #[must_use]
    pub fn shortest_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let start = *self.nodes.get(from)?;
        let goal = *self.nodes.get(to)?;

        let mut previous: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(node) = queue.pop_front() {
            if node == goal {
                let mut path = vec![self.graph[goal].clone()];
                let mut current = goal;
                while let Some(&prior) = previous.get(&current) {
                    path.push(self.graph[prior].clone());
                    current = prior;
                }
                path.reverse();
                return Some(path);
            }
            let mut neighbours: Vec<NodeIndex> = self.graph.neighbors_undirected(node).collect();
            neighbours.sort();
            for next in neighbours {
                if visited.insert(next) {
                    previous.insert(next, node);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// Cypher statements recreating the graph in Neo4j
    #[must_use]
    pub fn export_cypher(&self) -> String {
        let mut cypher = String::from(
            "CREATE CONSTRAINT patent_number_unique IF NOT EXISTS \
             FOR (p:Patent) REQUIRE p.patent_number IS UNIQUE;\n",
        );
        for node in self.graph.node_indices() {
            let _ = writeln!(
                cypher,
                "MERGE (:Patent {{patent_number: '{}'}});",
                escape_cypher(&self.graph[node])
            );
        }
        for edge in self.graph.raw_edges() {
            let _ = writeln!(
                cypher,
                "MATCH (a:Patent {{patent_number: '{}'}}), (b:Patent {{patent_number: '{}'}}) \
                 MERGE (a)-[:CITES]->(b);",
                escape_cypher(&self.graph[edge.source()]),
                escape_cypher(&self.graph[edge.target()])
            );
        }
        cypher
    }
}

fn escape_cypher(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Loads the citation graph from the repository for each analysis
pub struct GraphService {
    repository: Arc<dyn PatentRepository>,
}

impl GraphService {
    pub fn new(repository: Arc<dyn PatentRepository>) -> Self {
        Self { repository }
    }

    pub async fn citation_graph(&self) -> Result<CitationGraph, DiscoveryError> {
        let edges = self.repository.citation_edges().await?;
        let graph = CitationGraph::from_edges(&edges);
        info!(
            "Loaded citation graph: {} patents, {} citations",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    pub async fn page_rank(&self, limit: usize) -> Result<Vec<RankedPatent>, DiscoveryError> {
        let mut ranked = self.citation_graph().await?.page_rank();
        ranked.truncate(limit);
        Ok(ranked)
    }

    pub async fn communities(&self, min_size: usize) -> Result<Vec<Community>, DiscoveryError> {
        Ok(self.citation_graph().await?.communities(min_size))
    }

    pub async fn shortest_path(
        &self,
        from: &str,
        to: &str,
    ) -> Result<Option<Vec<String>>, DiscoveryError> {
        Ok(self.citation_graph().await?.shortest_path(from, to))
    }

    pub async fn export_cypher(&self) -> Result<String, DiscoveryError> {
        Ok(self.citation_graph().await?.export_cypher())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(pairs: &[(&str, &str)]) -> Vec<CitationEdge> {
        pairs
            .iter()
            .map(|(a, b)| CitationEdge {
                citing: (*a).to_string(),
                cited: (*b).to_string(),
            })
            .collect()
    }

    #[test]
    fn most_cited_patent_ranks_first_and_scores_sum_to_one() {
        let graph = CitationGraph::from_edges(&edges(&[
            ("2", "1"),
            ("3", "1"),
            ("4", "1"),
            ("4", "2"),
        ]));
        let ranked = graph.page_rank();

        assert_eq!(ranked.len(), 4);
        assert_eq!(ranked[0].patent_number, "1");
        let total: f64 = ranked.iter().map(|r| r.score).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(ranked[2].patent_number, "3");
        assert_eq!(ranked[3].patent_number, "4");
    }

    #[test]
    fn empty_graph_has_no_rank() {
        assert!(CitationGraph::from_edges(&[]).page_rank().is_empty());
    }

    #[test]
    fn repeated_edges_are_collapsed() {
        let graph = CitationGraph::from_edges(&edges(&[("1", "2"), ("1", "2")]));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn disconnected_clusters_become_communities() {
        let graph = CitationGraph::from_edges(&edges(&[
            ("a1", "a2"),
            ("a2", "a3"),
            ("a3", "a1"),
            ("b1", "b2"),
            ("z1", "z1"),
        ]));
        let communities = graph.communities(2);

        assert_eq!(communities.len(), 2);
        assert_eq!(communities[0].id, 0);
        assert_eq!(communities[0].members, vec!["a1", "a2", "a3"]);
        assert_eq!(communities[1].members, vec!["b1", "b2"]);
        assert_eq!(graph.communities(1).len(), 3);
    }

    #[test]
    fn path_follows_citations_both_ways() {
        let graph = CitationGraph::from_edges(&edges(&[("1", "2"), ("3", "2"), ("3", "4")]));
        assert_eq!(
            graph.shortest_path("1", "4"),
            Some(vec!["1".into(), "2".into(), "3".into(), "4".into()])
        );
        assert_eq!(graph.shortest_path("4", "4"), Some(vec!["4".into()]));
        assert_eq!(graph.shortest_path("1", "unknown"), None);
    }

    #[test]
    fn unreachable_patents_have_no_path() {
        let graph = CitationGraph::from_edges(&edges(&[("1", "2"), ("3", "4")]));
        assert_eq!(graph.shortest_path("1", "4"), None);
    }

    #[test]
    fn cypher_export_merges_nodes_and_relationships() {
        let graph = CitationGraph::from_edges(&edges(&[("2", "1")]));
        let cypher = graph.export_cypher();
        let lines: Vec<&str> = cypher.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("CREATE CONSTRAINT"));
        assert_eq!(lines[1], "MERGE (:Patent {patent_number: '1'});");
        assert!(lines[3].contains("{patent_number: '2'}), (b:Patent {patent_number: '1'})"));
        assert!(lines[3].ends_with("MERGE (a)-[:CITES]->(b);"));
    }

    #[test]
    fn cypher_values_are_escaped() {
        assert_eq!(escape_cypher("O'Brien"), "O\\'Brien");
    }
}
