use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use petgraph::graph::NodeIndex;
use petgraph::prelude::StableDiGraph;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// Structural `composes ... from` edges between stylesheets, pointing from the composing file to
/// the file it composes from.
///
/// Nodes are never removed. A file that is evicted keeps its node, and with it the incoming edges
/// of its dependents, until those dependents are evicted in turn.
#[derive(Debug, Default)]
pub struct ModuleGraph {
  graph: StableDiGraph<PathBuf, ()>,
  nodes: HashMap<PathBuf, NodeIndex>,
}

impl ModuleGraph {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_dependency(&mut self, from: &Path, to: &Path) {
    let from = self.node(from);
    let to = self.node(to);

    if self.graph.find_edge(from, to).is_none() {
      self.graph.add_edge(from, to, ());
    }
  }

  /// Drop every outgoing edge of `path`
  pub fn remove_dependencies(&mut self, path: &Path) {
    let Some(node) = self.nodes.get(path) else {
      return;
    };

    let edges = self
      .graph
      .edges_directed(*node, Direction::Outgoing)
      .map(|edge| edge.id())
      .collect::<Vec<_>>();

    for edge in edges {
      self.graph.remove_edge(edge);
    }
  }

  /// Files `path` composes from, sorted by path
  pub fn dependencies(&self, path: &Path) -> Vec<PathBuf> {
    self.neighbors(path, Direction::Outgoing)
  }

  /// Files composing from `path`, sorted by path
  pub fn dependents(&self, path: &Path) -> Vec<PathBuf> {
    self.neighbors(path, Direction::Incoming)
  }

  fn neighbors(&self, path: &Path, direction: Direction) -> Vec<PathBuf> {
    let Some(node) = self.nodes.get(path) else {
      return Vec::new();
    };

    let mut neighbors = self
      .graph
      .neighbors_directed(*node, direction)
      .map(|neighbor| self.graph[neighbor].clone())
      .collect::<Vec<_>>();

    neighbors.sort();
    neighbors
  }

  fn node(&mut self, path: &Path) -> NodeIndex {
    if let Some(node) = self.nodes.get(path) {
      return *node;
    }

    let node = self.graph.add_node(path.to_path_buf());
    self.nodes.insert(path.to_path_buf(), node);
    node
  }
}
