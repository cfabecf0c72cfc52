//! In-memory resource graph for sampling and metrics.
//!
//! Nodes live in a dense arena (0..N-1); string ids are kept only in the id
//! table and the id → index map so the sampling and metric loops work on
//! plain integer adjacency.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use scaledown_core::Properties;

/// Outgoing edge in the adjacency list.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    /// Relationship type: "CONTAINS", "DEPENDS_ON", etc.
    pub rel_type: String,
    /// Target node index.
    pub target_index: usize,
    pub properties: Properties,
}

/// Directed resource graph.
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    /// Node ids, indexed by dense index.
    ids: Vec<String>,
    /// `adjacency[i]` = outgoing edges from node `i`.
    adjacency: Vec<Vec<GraphEdge>>,
    /// Map from node id → dense index.
    node_index: HashMap<String, usize>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from node ids and `(source, target, rel_type)` triples.
    /// Triples with an unknown endpoint are dropped.
    pub fn from_edge_list<'a>(
        ids: impl IntoIterator<Item = &'a str>,
        edges: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    ) -> Self {
        let mut graph = Self::new();
        for id in ids {
            graph.add_node(id);
        }
        for (source, target, rel_type) in edges {
            graph.add_edge(source, target, rel_type, Properties::new());
        }
        graph
    }

    /// Add a node, returning its index. Adding an existing id is a no-op.
    pub fn add_node(&mut self, id: &str) -> usize {
        if let Some(&idx) = self.node_index.get(id) {
            return idx;
        }
        let idx = self.ids.len();
        self.ids.push(id.to_string());
        self.adjacency.push(Vec::new());
        self.node_index.insert(id.to_string(), idx);
        idx
    }

    /// Add a directed edge between two existing nodes.
    ///
    /// Returns `false` without modifying the graph if either endpoint is
    /// unknown, so no edge is ever stored dangling.
    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        rel_type: &str,
        properties: Properties,
    ) -> bool {
        let (Some(&src), Some(&tgt)) = (self.node_index.get(source), self.node_index.get(target))
        else {
            return false;
        };
        self.adjacency[src].push(GraphEdge {
            rel_type: rel_type.to_string(),
            target_index: tgt,
            properties,
        });
        true
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(|edges| edges.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    /// Id of the node at a dense index.
    pub fn id(&self, index: usize) -> &str {
        &self.ids[index]
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn outgoing(&self, index: usize) -> &[GraphEdge] {
        &self.adjacency[index]
    }

    /// Every edge as `(source_index, edge)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, &GraphEdge)> {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(src, edges)| edges.iter().map(move |e| (src, e)))
    }

    /// Total (in + out) degree per node.
    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees: Vec<usize> = self.adjacency.iter().map(Vec::len).collect();
        for (_, edge) in self.edges() {
            degrees[edge.target_index] += 1;
        }
        degrees
    }

    /// Degree value → number of nodes with that total degree.
    pub fn degree_histogram(&self) -> BTreeMap<usize, usize> {
        let mut histogram = BTreeMap::new();
        for degree in self.degrees() {
            *histogram.entry(degree).or_insert(0) += 1;
        }
        histogram
    }

    /// Mean total degree, `2|E| / |V|`.
    pub fn average_degree(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        2.0 * self.edge_count() as f64 / self.node_count() as f64
    }

    /// Undirected projection: both directions merged, parallel edges
    /// collapsed, self-loops dropped.
    pub fn undirected(&self) -> UndirectedView {
        let mut neighbors: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); self.node_count()];
        for (src, edge) in self.edges() {
            if src == edge.target_index {
                continue;
            }
            neighbors[src].insert(edge.target_index);
            neighbors[edge.target_index].insert(src);
        }
        UndirectedView {
            neighbors: neighbors
                .into_iter()
                .map(|set| set.into_iter().collect())
                .collect(),
        }
    }

    /// Subgraph induced by `keep`: the kept nodes (in original order) and
    /// every edge whose endpoints are both kept. Unknown ids are ignored.
    pub fn induced(&self, keep: &BTreeSet<String>) -> ResourceGraph {
        let mut sub = ResourceGraph::new();
        for id in &self.ids {
            if keep.contains(id) {
                sub.add_node(id);
            }
        }
        for (src, edge) in self.edges() {
            let source = &self.ids[src];
            let target = &self.ids[edge.target_index];
            if keep.contains(source) && keep.contains(target) {
                sub.add_edge(source, target, &edge.rel_type, edge.properties.clone());
            }
        }
        sub
    }
}

/// Symmetric neighbor lists over the same dense indices as the source graph.
#[derive(Debug, Clone)]
pub struct UndirectedView {
    neighbors: Vec<Vec<usize>>,
}

impl UndirectedView {
    pub fn node_count(&self) -> usize {
        self.neighbors.len()
    }

    pub fn neighbors(&self, index: usize) -> &[usize] {
        &self.neighbors[index]
    }

    pub fn degree(&self, index: usize) -> usize {
        self.neighbors[index].len()
    }
}
