//! Assembles the per-sample and joint nodes into a [`Graph`].
//!
//! The builder is handed the resolved samples, the resource budget, and the
//! resolved toolchain, and emits nodes in a fixed order: shared reference
//! nodes first, then the per-sample chains for samples sorted by id, then
//! the joint nodes. Emission order and every command string depend only on
//! the sorted sample ids and the resolved option values, never on input
//! argument order, so re-running over the same inputs reproduces the rule
//! text byte for byte.
//!
//! In extend mode the builder receives the previously known sample ids: their
//! alignments enter the graph as source files rather than re-emitted nodes,
//! which is what guarantees the executor can never touch them.

use std::path::PathBuf;

use super::{Graph, GraphError, GraphNode, NodeKind, OutputLayout};
use crate::config::{PipelineConfig, Tool, Toolchain};
use crate::resources::ResourceBudget;
use crate::samples::Sample;

pub struct GraphBuilder<'a> {
    config: &'a PipelineConfig,
    layout: &'a OutputLayout,
    budget: ResourceBudget,
    toolchain: &'a Toolchain,
    samples: Vec<Sample>,
    recovered: Vec<String>,
    reference_source: Option<PathBuf>,
}

impl<'a> GraphBuilder<'a> {
    #[must_use]
    pub fn new(
        config: &'a PipelineConfig,
        layout: &'a OutputLayout,
        budget: ResourceBudget,
        toolchain: &'a Toolchain,
    ) -> Self {
        Self {
            config,
            layout,
            budget,
            toolchain,
            samples: Vec::new(),
            recovered: Vec::new(),
            reference_source: None,
        }
    }

    /// Samples whose per-sample chains this graph must contain.
    #[must_use]
    pub fn with_samples(mut self, samples: Vec<Sample>) -> Self {
        self.samples = samples;
        self
    }

    /// Previously known sample ids whose alignments already exist; they join
    /// the joint nodes as source files, never as re-emitted work.
    #[must_use]
    pub fn with_recovered(mut self, ids: Vec<String>) -> Self {
        self.recovered = ids;
        self
    }

    /// The original reference path for a fresh run. Absent in extend mode,
    /// where the materialized copy is treated as a source file.
    #[must_use]
    pub fn with_reference_source(mut self, source: Option<PathBuf>) -> Self {
        self.reference_source = source;
        self
    }

    /// Assemble the graph.
    pub fn build(mut self) -> Result<Graph, GraphError> {
        self.samples.sort_by(|a, b| a.id.cmp(&b.id));
        self.recovered.sort();

        let mut all_ids: Vec<String> = self
            .recovered
            .iter()
            .cloned()
            .chain(self.samples.iter().map(|s| s.id.clone()))
            .collect();
        all_ids.sort();

        let mut graph = Graph::new();
        self.add_reference_nodes(&mut graph)?;
        for sample in &self.samples {
            self.add_sample_chain(&mut graph, sample)?;
        }
        for id in &self.recovered {
            graph.register_source(self.layout.alignment(id));
            graph.register_source(self.layout.alignment_index(id));
        }
        self.add_joint_nodes(&mut graph, &all_ids)?;

        tracing::info!(
            nodes = graph.len(),
            samples = self.samples.len(),
            recovered = self.recovered.len(),
            "assembled pipeline graph"
        );
        Ok(graph)
    }

    fn tool(&self, tool: Tool) -> String {
        self.toolchain.path(tool).display().to_string()
    }

    fn add_reference_nodes(&self, graph: &mut Graph) -> Result<(), GraphError> {
        let reference = self.layout.reference();

        match &self.reference_source {
            Some(source) => {
                graph.register_source(source.clone());
                graph.push(GraphNode::new(
                    NodeKind::CopyReference,
                    vec![reference.clone()],
                    vec![source.clone()],
                    format!("cp '{}' $@", source.display()),
                ))?;
            }
            // Extend mode: the materialized copy is authoritative.
            None => graph.register_source(reference.clone()),
        }

        graph.push(GraphNode::new(
            NodeKind::SequenceIndex,
            vec![self.layout.sequence_index()],
            vec![reference.clone()],
            format!("{} faidx $<", self.tool(Tool::BamKit)),
        ))?;
        graph.push(GraphNode::new(
            NodeKind::AlignerIndex,
            vec![self.layout.aligner_index()],
            vec![reference.clone()],
            format!("{} index $<", self.tool(Tool::Aligner)),
        ))?;
        graph.push(GraphNode::new(
            NodeKind::SplitRegions,
            vec![self.layout.regions()],
            vec![self.layout.sequence_index()],
            format!(
                "{} $< {} > $@",
                self.tool(Tool::RegionSplitter),
                self.budget.region_chunk_size
            ),
        ))?;
        Ok(())
    }

    /// align -> quality-filter -> sort -> index, plus the optional
    /// per-sample call node.
    fn add_sample_chain(&self, graph: &mut Graph, sample: &Sample) -> Result<(), GraphError> {
        let id = &sample.id;
        let reference = self.layout.reference();
        let raw = self.layout.raw_alignment(id);
        let filtered = self.layout.filtered_alignment(id);
        let sorted = self.layout.alignment(id);
        let index = self.layout.alignment_index(id);

        for file in &sample.dependency_files {
            graph.register_source(file.clone());
        }

        let mut align_inputs = vec![reference.clone(), self.layout.aligner_index()];
        align_inputs.extend(sample.dependency_files.iter().cloned());
        graph.push(GraphNode::new(
            NodeKind::Align { sample: id.clone() },
            vec![raw.clone()],
            align_inputs,
            self.align_command(sample),
        ))?;

        graph.push(GraphNode::new(
            NodeKind::QualityFilter { sample: id.clone() },
            vec![filtered.clone()],
            vec![raw],
            format!(
                "{} view -b -q {} -o $@ $<",
                self.tool(Tool::BamKit),
                self.config.map_quality
            ),
        ))?;
        graph.push(GraphNode::new(
            NodeKind::SortAlignment { sample: id.clone() },
            vec![sorted.clone()],
            vec![filtered],
            format!(
                "{} sort -@ {} -o $@ $<",
                self.tool(Tool::BamKit),
                self.budget.threads_per_job
            ),
        ))?;
        graph.push(GraphNode::new(
            NodeKind::IndexAlignment { sample: id.clone() },
            vec![index.clone()],
            vec![sorted.clone()],
            format!("{} index $<", self.tool(Tool::BamKit)),
        ))?;

        if self.config.per_sample_calls {
            graph.push(GraphNode::new(
                NodeKind::CallSample { sample: id.clone() },
                vec![self.layout.sample_calls(id)],
                vec![sorted, index, reference, self.layout.sequence_index()],
                format!(
                    "{} -f {} {} $< > $@",
                    self.tool(Tool::Caller),
                    self.layout.reference().display(),
                    self.caller_options(),
                ),
            ))?;
        }
        Ok(())
    }

    fn add_joint_nodes(&self, graph: &mut Graph, all_ids: &[String]) -> Result<(), GraphError> {
        // The manifests are materialized at commit, before anything runs, and
        // only rewritten when the sample set changes. Declaring them makes a
        // shrunken set invalidate the joint artifacts.
        graph.register_source(self.layout.alignment_manifest());
        graph.register_source(self.layout.sample_manifest());

        let mut joint_inputs = vec![
            self.layout.reference(),
            self.layout.sequence_index(),
            self.layout.regions(),
            self.layout.alignment_manifest(),
        ];
        for id in all_ids {
            joint_inputs.push(self.layout.alignment(id));
            joint_inputs.push(self.layout.alignment_index(id));
        }
        graph.push(GraphNode::new(
            NodeKind::CallJoint,
            vec![self.layout.joint_calls()],
            joint_inputs,
            format!(
                "{} {} {} -f {} {} -L {} > $@",
                self.tool(Tool::ParallelCaller),
                self.layout.regions().display(),
                self.budget.total_cores,
                self.layout.reference().display(),
                self.caller_options(),
                self.layout.alignment_manifest().display(),
            ),
        ))?;

        let mut depth_inputs = vec![self.layout.alignment_manifest()];
        depth_inputs.extend(all_ids.iter().map(|id| self.layout.alignment(id)));
        graph.push(GraphNode::new(
            NodeKind::DepthProfile,
            vec![self.layout.depth_profile()],
            depth_inputs,
            format!(
                "{} depth -aa -q {} -Q {} -f {} > $@",
                self.tool(Tool::BamKit),
                self.config.base_quality,
                self.config.map_quality,
                self.layout.alignment_manifest().display(),
            ),
        ))?;

        let exclude = if self.config.exclude_reference {
            " --exclude-reference"
        } else {
            ""
        };
        graph.push(GraphNode::new(
            NodeKind::ExtractCore,
            vec![
                self.layout.core_alignment(),
                self.layout.full_alignment(),
                self.layout.report(),
            ],
            vec![
                self.layout.joint_calls(),
                self.layout.depth_profile(),
                self.layout.reference(),
                self.layout.sample_manifest(),
            ],
            format!(
                "{} --reference {} --min-depth {} --samples {}{} --prefix {} {} {}",
                self.tool(Tool::CoreExtractor),
                self.layout.reference().display(),
                self.config.min_depth,
                self.layout.sample_manifest().display(),
                exclude,
                self.config.prefix,
                self.layout.joint_calls().display(),
                self.layout.depth_profile().display(),
            ),
        ))?;
        Ok(())
    }

    /// Read folders align directly; contig inputs stream through the
    /// pseudo-read synthesis step at the configured coverage target.
    fn align_command(&self, sample: &Sample) -> String {
        let aligner = self.tool(Tool::Aligner);
        let bamkit = self.tool(Tool::BamKit);
        let reference = self.layout.reference();
        let threads = self.budget.threads_per_job;

        if sample.kind.is_contigs() {
            return format!(
                "{} --coverage {} '{}' | {} mem -t {} -p {} - | {} view -b -o $@ -",
                self.tool(Tool::ContigShredder),
                self.config.contig_coverage,
                sample.source_path.display(),
                aligner,
                threads,
                reference.display(),
                bamkit,
            );
        }

        let reads = sample
            .dependency_files
            .iter()
            .map(|p| format!("'{}'", p.display()))
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "{} mem -t {} {} {} | {} view -b -o $@ -",
            aligner,
            threads,
            reference.display(),
            reads,
            bamkit,
        )
    }

    /// Threshold options shared by the per-sample and joint callers.
    fn caller_options(&self) -> String {
        format!(
            "-p 1 -q {} -m {} -F {}",
            self.config.base_quality, self.config.map_quality, self.config.min_fraction
        )
    }
}
