//! Makefile rendering and `make`-backed execution.

use std::fs::File;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::{BuildSubstrate, RunReport, SubstrateError};
use crate::graph::{GraphNode, OutputLayout, REFERENCE_ALIAS};
use crate::resources::ResourceBudget;

/// Renders declared nodes into a Makefile and drives `make` over it.
///
/// Rule text is deterministic: identical graphs render identical bytes, and
/// files are only rewritten when their content actually changed, so a re-run
/// over an unchanged sample set never bumps modification times and never
/// makes fresh outputs look stale.
pub struct MakefileSubstrate {
    layout: OutputLayout,
    budget: ResourceBudget,
    executor: PathBuf,
    sample_ids: Vec<String>,
    goals: Vec<PathBuf>,
    rules: Vec<String>,
    committed: bool,
}

impl MakefileSubstrate {
    #[must_use]
    pub fn new(
        layout: OutputLayout,
        budget: ResourceBudget,
        executor: PathBuf,
        sample_ids: Vec<String>,
        goals: Vec<PathBuf>,
    ) -> Self {
        Self {
            layout,
            budget,
            executor,
            sample_ids,
            goals,
            rules: Vec::new(),
            committed: false,
        }
    }

    /// The global header: budget figures, reference alias, and the shell
    /// settings that make every node action atomic in its visible effect
    /// (a failed action deletes its partial target instead of leaving a
    /// fresh-looking file behind).
    fn render_header(&self) -> String {
        let mut text = String::new();
        text.push_str(&format!("CPUS := {}\n", self.budget.total_cores));
        text.push_str(&format!("THREADS := {}\n", self.budget.threads_per_job));
        text.push_str(&format!("CHUNK := {}\n", self.budget.region_chunk_size));
        text.push_str(&format!("REF := {REFERENCE_ALIAS}\n"));
        text.push('\n');
        text.push_str("SHELL := /bin/bash\n");
        text.push_str(".SHELLFLAGS := -o pipefail -c\n");
        text.push_str(".DELETE_ON_ERROR:\n");
        text.push_str(".SUFFIXES:\n");
        text.push('\n');
        text.push_str(".PHONY: all\n");
        let goals = self
            .goals
            .iter()
            .map(|g| g.display().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        text.push_str(&format!("all: {goals}\n"));
        text
    }

    /// One rule block: targets, prerequisites, single action. Multi-output
    /// nodes use a grouped target so the action runs once.
    fn render_rule(node: &GraphNode) -> String {
        let targets = node
            .outputs()
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let separator = if node.outputs().len() > 1 { "&:" } else { ":" };
        let prerequisites = node
            .inputs()
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        format!("{targets} {separator} {prerequisites}\n\t{}\n", node.command())
    }

    /// Write only when the content differs, preserving modification times of
    /// unchanged files across re-runs.
    fn write_if_changed(&self, relative: &PathBuf, content: &str) -> Result<(), SubstrateError> {
        let path = self.layout.absolute(relative);
        if let Ok(existing) = std::fs::read_to_string(&path)
            && existing == content
        {
            tracing::debug!(path = %path.display(), "unchanged, not rewritten");
            return Ok(());
        }
        std::fs::write(&path, content).map_err(|source| SubstrateError::Write { path, source })
    }
}

#[async_trait]
impl BuildSubstrate for MakefileSubstrate {
    fn declare(&mut self, node: &GraphNode) -> Result<(), SubstrateError> {
        if self.committed {
            return Err(SubstrateError::DeclareAfterCommit {
                node: node.kind().to_string(),
            });
        }
        self.rules.push(Self::render_rule(node));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SubstrateError> {
        let mut text = self.render_header();
        for rule in &self.rules {
            text.push('\n');
            text.push_str(rule);
        }
        self.write_if_changed(&self.layout.build_description(), &text)?;

        let bam_manifest = self
            .sample_ids
            .iter()
            .map(|id| format!("{}\n", self.layout.alignment(id).display()))
            .collect::<String>();
        self.write_if_changed(&self.layout.alignment_manifest(), &bam_manifest)?;

        let id_manifest = self
            .sample_ids
            .iter()
            .map(|id| format!("{id}\n"))
            .collect::<String>();
        self.write_if_changed(&self.layout.sample_manifest(), &id_manifest)?;

        self.committed = true;
        tracing::info!(
            rules = self.rules.len(),
            makefile = %self.layout.absolute(self.layout.build_description()).display(),
            "committed build description"
        );
        Ok(())
    }

    async fn run(&mut self, parallelism: usize) -> Result<RunReport, SubstrateError> {
        if !self.committed {
            return Err(SubstrateError::RunBeforeCommit);
        }
        let log = self.layout.absolute(self.layout.run_log());
        let err_log = self.layout.absolute(self.layout.run_err());
        let stdout = File::create(&log).map_err(|source| SubstrateError::Write {
            path: log.clone(),
            source,
        })?;
        let stderr = File::create(&err_log).map_err(|source| SubstrateError::Write {
            path: err_log.clone(),
            source,
        })?;

        tracing::info!(
            executor = %self.executor.display(),
            jobs = parallelism,
            "starting build executor"
        );
        let status = Command::new(&self.executor)
            .arg("-C")
            .arg(self.layout.outdir())
            .arg("-j")
            .arg(parallelism.to_string())
            .arg("all")
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .status()
            .await
            .map_err(|source| SubstrateError::Launch {
                executor: self.executor.clone(),
                source,
            })?;

        tracing::info!(code = ?status.code(), "build executor finished");
        Ok(RunReport {
            exit: status.code(),
            log: Some(log),
            err_log: Some(err_log),
        })
    }
}
