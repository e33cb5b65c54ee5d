//! Shared fixtures for integration tests.
//!
//! Real bioinformatics tools never run here: the stub locator resolves every
//! tool to a fixed path, and the freshness simulator executes graphs
//! in-process by comparing file modification times and touching declared
//! outputs, which is exactly the contract the production executor relies on.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;

use snpforge::config::{Tool, ToolLocator};
use snpforge::graph::GraphNode;
use snpforge::substrate::{BuildSubstrate, RunReport, SubstrateError};

/// Resolves every tool to a fixed, fake path. Never touches the filesystem,
/// so rendered commands are reproducible across machines.
pub struct StubLocator;

impl ToolLocator for StubLocator {
    fn locate(&self, tool: Tool) -> Option<PathBuf> {
        Some(PathBuf::from("/opt/tools").join(tool.binary()))
    }
}

/// Locator that pretends one tool is missing.
pub struct MissingToolLocator(pub Tool);

impl ToolLocator for MissingToolLocator {
    fn locate(&self, tool: Tool) -> Option<PathBuf> {
        (tool != self.0).then(|| PathBuf::from("/opt/tools").join(tool.binary()))
    }
}

/// Write a small FASTA reference and return its path.
pub fn write_reference(dir: &Path, name: &str, body_bytes: usize) -> PathBuf {
    let path = dir.join(name);
    let mut content = String::from(">chr1\n");
    content.push_str(&"ACGT".repeat(body_bytes / 4 + 1)[..body_bytes]);
    content.push('\n');
    fs::write(&path, content).unwrap();
    path
}

/// Create a read folder holding a standard R1/R2 pair.
pub fn read_folder(dir: &Path, id: &str) -> PathBuf {
    let folder = dir.join(id);
    fs::create_dir(&folder).unwrap();
    fs::write(folder.join(format!("{id}_R1.fastq.gz")), b"r1").unwrap();
    fs::write(folder.join(format!("{id}_R2.fastq.gz")), b"r2").unwrap();
    folder
}

/// Create a plain contig FASTA input.
pub fn contig_file(dir: &Path, id: &str) -> PathBuf {
    let path = dir.join(format!("{id}.fasta"));
    fs::write(&path, ">contig1\nACGT\n").unwrap();
    path
}

/// In-process freshness simulator.
///
/// Runs declared nodes in graph order; a node executes only when one of its
/// declared outputs is missing or older than its newest declared input, and
/// "execution" just writes the outputs. Executed node kinds are recorded so
/// tests can assert exactly which work was redone.
pub struct FreshnessSim {
    outdir: PathBuf,
    nodes: Vec<GraphNode>,
    committed: bool,
    pub executed: Vec<String>,
}

impl FreshnessSim {
    pub fn new(outdir: impl Into<PathBuf>) -> Self {
        Self {
            outdir: outdir.into(),
            nodes: Vec::new(),
            committed: false,
            executed: Vec::new(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_relative() {
            self.outdir.join(path)
        } else {
            path.to_path_buf()
        }
    }

    fn mtime(path: &Path) -> Option<SystemTime> {
        fs::metadata(path).and_then(|m| m.modified()).ok()
    }
}

#[async_trait]
impl BuildSubstrate for FreshnessSim {
    fn declare(&mut self, node: &GraphNode) -> Result<(), SubstrateError> {
        if self.committed {
            return Err(SubstrateError::DeclareAfterCommit {
                node: node.kind().to_string(),
            });
        }
        self.nodes.push(node.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SubstrateError> {
        self.committed = true;
        Ok(())
    }

    async fn run(&mut self, _parallelism: usize) -> Result<RunReport, SubstrateError> {
        if !self.committed {
            return Err(SubstrateError::RunBeforeCommit);
        }
        for node in &self.nodes {
            let newest_input = node
                .inputs()
                .iter()
                .filter_map(|p| Self::mtime(&self.resolve(p)))
                .max();
            let stale = node.outputs().iter().any(|out| {
                match Self::mtime(&self.resolve(out)) {
                    None => true,
                    Some(out_time) => newest_input.is_some_and(|in_time| out_time < in_time),
                }
            });
            if stale {
                for out in node.outputs() {
                    fs::write(self.resolve(out), format!("simulated: {}\n", node.kind())).map_err(
                        |source| SubstrateError::Write {
                            path: self.resolve(out),
                            source,
                        },
                    )?;
                }
                self.executed.push(node.kind().to_string());
            }
        }
        Ok(RunReport {
            exit: Some(0),
            log: None,
            err_log: None,
        })
    }
}
