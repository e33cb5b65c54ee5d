//! Graph nodes: one unit of external-tool work with declared edges.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Identifies what a node does and, for per-sample nodes, which sample it
/// belongs to. Per-sample kinds namespace their outputs by sample id so
/// concurrent jobs never collide in the shared output directory.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Copy the reference FASTA to its fixed alias.
    CopyReference,
    /// Sequence index (`.fai`) over the reference copy.
    SequenceIndex,
    /// Aligner index over the reference copy.
    AlignerIndex,
    /// Split the indexed reference into fixed-size regions.
    SplitRegions,
    /// Align one sample's reads (or synthesized pseudo-reads) to the
    /// reference.
    Align { sample: String },
    /// Drop low-mapping-quality records from one sample's raw alignment.
    QualityFilter { sample: String },
    /// Coordinate-sort one sample's filtered alignment.
    SortAlignment { sample: String },
    /// Index one sample's sorted alignment.
    IndexAlignment { sample: String },
    /// Per-sample variant call, emitted only when requested.
    CallSample { sample: String },
    /// Joint variant call over every sample's alignment.
    CallJoint,
    /// Depth profile over every sample's alignment.
    DepthProfile,
    /// Core-variant extraction producing the final alignment, report, and
    /// tree-input artifacts.
    ExtractCore,
}

impl NodeKind {
    /// The sample this node belongs to, or `None` for shared nodes.
    #[must_use]
    pub fn sample(&self) -> Option<&str> {
        match self {
            NodeKind::Align { sample }
            | NodeKind::QualityFilter { sample }
            | NodeKind::SortAlignment { sample }
            | NodeKind::IndexAlignment { sample }
            | NodeKind::CallSample { sample } => Some(sample),
            _ => None,
        }
    }

    /// Joint nodes read the combined outputs of all per-sample nodes.
    #[must_use]
    pub fn is_joint(&self) -> bool {
        matches!(
            self,
            NodeKind::CallJoint | NodeKind::DepthProfile | NodeKind::ExtractCore
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::CopyReference => write!(f, "copy_reference"),
            NodeKind::SequenceIndex => write!(f, "sequence_index"),
            NodeKind::AlignerIndex => write!(f, "aligner_index"),
            NodeKind::SplitRegions => write!(f, "split_regions"),
            NodeKind::Align { sample } => write!(f, "align:{sample}"),
            NodeKind::QualityFilter { sample } => write!(f, "quality_filter:{sample}"),
            NodeKind::SortAlignment { sample } => write!(f, "sort:{sample}"),
            NodeKind::IndexAlignment { sample } => write!(f, "index:{sample}"),
            NodeKind::CallSample { sample } => write!(f, "call:{sample}"),
            NodeKind::CallJoint => write!(f, "call_joint"),
            NodeKind::DepthProfile => write!(f, "depth_profile"),
            NodeKind::ExtractCore => write!(f, "extract_core"),
        }
    }
}

/// One pipeline work unit: declared outputs, declared inputs, and a single
/// deterministic action string.
///
/// The command is a pure function of the node kind, the ordered input
/// identities, and the resolved option values; two invocations with
/// identical samples and options render byte-identical commands, which is
/// what lets the build substrate skip unchanged work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    kind: NodeKind,
    outputs: Vec<PathBuf>,
    inputs: Vec<PathBuf>,
    command: String,
}

impl GraphNode {
    #[must_use]
    pub fn new(
        kind: NodeKind,
        outputs: Vec<PathBuf>,
        inputs: Vec<PathBuf>,
        command: String,
    ) -> Self {
        debug_assert!(!outputs.is_empty(), "a node must declare an output");
        Self {
            kind,
            outputs,
            inputs,
            command,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[must_use]
    pub fn outputs(&self) -> &[PathBuf] {
        &self.outputs
    }

    /// The output that stands for the node in manifests and recovery.
    #[must_use]
    pub fn primary_output(&self) -> &PathBuf {
        &self.outputs[0]
    }

    #[must_use]
    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }
}
