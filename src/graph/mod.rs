//! The dependency graph: nodes keyed by their declared outputs.
//!
//! A [`Graph`] is an ordered sequence of [`GraphNode`]s plus an index from
//! every declared output path to its owning node. Acyclicity is structural:
//! a node may only be appended when each of its inputs is either the declared
//! output of an earlier node or a registered source file, so no back edge can
//! ever exist. Nodes are never mutated after insertion; an extend invocation
//! builds a fresh graph rather than patching the old one.
//!
//! Paths inside the output directory are stored relative (they double as the
//! rule targets of the emitted build description); original input files keep
//! the caller-supplied path.

mod builder;
mod layout;
mod node;

pub use builder::GraphBuilder;
pub use layout::{
    INTERMEDIATE_MARKERS, JOINT_NAME, OutputLayout, REFERENCE_ALIAS, REFERENCE_STEM,
};
pub use node::{GraphNode, NodeKind};

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

/// Structural invariant violations raised while assembling a graph.
///
/// The builder constructs graphs that cannot trip these; they exist so the
/// invariants are checked where they live instead of trusted at a distance.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// Two nodes declared the same output path.
    #[error("output '{}' is declared by more than one node", path.display())]
    #[diagnostic(code(snpforge::graph::duplicate_output))]
    DuplicateOutput { path: PathBuf },

    /// A node input is neither an earlier node's output nor a source file.
    #[error("node '{node}' reads '{}' which no earlier node produces", path.display())]
    #[diagnostic(
        code(snpforge::graph::unknown_input),
        help("Declare the file as a source or emit its producing node first.")
    )]
    UnknownInput { node: String, path: PathBuf },
}

/// Ordered node sequence with an output-to-owner index.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    output_index: FxHashMap<PathBuf, usize>,
    sources: FxHashSet<PathBuf>,
}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file that exists outside the graph (original reads,
    /// contigs, or artifacts materialized by a previous invocation).
    pub fn register_source(&mut self, path: impl Into<PathBuf>) {
        self.sources.insert(path.into());
    }

    /// Append a node, enforcing output uniqueness and the edge contract.
    pub fn push(&mut self, node: GraphNode) -> Result<(), GraphError> {
        for input in node.inputs() {
            if !self.output_index.contains_key(input) && !self.sources.contains(input) {
                return Err(GraphError::UnknownInput {
                    node: node.kind().to_string(),
                    path: input.clone(),
                });
            }
        }
        let index = self.nodes.len();
        for output in node.outputs() {
            if self.output_index.insert(output.clone(), index).is_some() {
                return Err(GraphError::DuplicateOutput {
                    path: output.clone(),
                });
            }
        }
        self.nodes.push(node);
        Ok(())
    }

    #[must_use]
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// The node owning a declared output, if any.
    #[must_use]
    pub fn owner_of(&self, output: &Path) -> Option<&GraphNode> {
        self.output_index.get(output).map(|&i| &self.nodes[i])
    }

    #[must_use]
    pub fn is_source(&self, path: &Path) -> bool {
        self.sources.contains(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: NodeKind, outputs: &[&str], inputs: &[&str]) -> GraphNode {
        GraphNode::new(
            kind,
            outputs.iter().map(PathBuf::from).collect(),
            inputs.iter().map(PathBuf::from).collect(),
            "true".to_string(),
        )
    }

    #[test]
    fn push_rejects_unknown_input() {
        let mut graph = Graph::new();
        let err = graph
            .push(node(NodeKind::SequenceIndex, &["a.fai"], &["a.fa"]))
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownInput { .. }));
    }

    #[test]
    fn push_rejects_duplicate_output() {
        let mut graph = Graph::new();
        graph.register_source("a.fa");
        graph
            .push(node(NodeKind::SequenceIndex, &["a.fai"], &["a.fa"]))
            .unwrap();
        let err = graph
            .push(node(NodeKind::SplitRegions, &["a.fai"], &["a.fa"]))
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateOutput { .. }));
    }

    #[test]
    fn owner_index_tracks_every_output() {
        let mut graph = Graph::new();
        graph.register_source("a.fa");
        graph
            .push(node(NodeKind::SequenceIndex, &["a.fai"], &["a.fa"]))
            .unwrap();
        graph
            .push(node(
                NodeKind::SplitRegions,
                &["a.regions"],
                &["a.fai"],
            ))
            .unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(
            graph.owner_of(Path::new("a.regions")).unwrap().kind(),
            &NodeKind::SplitRegions
        );
        assert!(graph.owner_of(Path::new("missing")).is_none());
    }
}
