//! The build substrate: where graphs become runnable rule descriptions.
//!
//! The graph layer never judges freshness itself; it targets an abstract
//! incremental-execution capability with two operations: `declare` every
//! node, then `run` with a concurrency bound. Production uses
//! [`MakefileSubstrate`], which renders a Makefile and shells out to `make`;
//! tests drive the same graphs through an in-process freshness simulator so
//! skip behavior is exercised without real bioinformatics tools.

mod makefile;

pub use makefile::MakefileSubstrate;

use std::path::PathBuf;

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::graph::GraphNode;

/// Failures inside a build substrate.
///
/// A non-zero executor exit is not a substrate error; it is reported through
/// [`RunReport`] because the emitted description stays valid and reusable.
#[derive(Debug, Error, Diagnostic)]
pub enum SubstrateError {
    #[error("failed to write {}", path.display())]
    #[diagnostic(code(snpforge::substrate::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch build executor '{}'", executor.display())]
    #[diagnostic(
        code(snpforge::substrate::launch),
        help("Check that the executor binary is runnable.")
    )]
    Launch {
        executor: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Declarations are only accepted before the description is committed.
    #[error("node '{node}' declared after the build description was committed")]
    #[diagnostic(code(snpforge::substrate::declare_after_commit))]
    DeclareAfterCommit { node: String },

    /// Running requires a committed description.
    #[error("run requested before the build description was committed")]
    #[diagnostic(code(snpforge::substrate::run_before_commit))]
    RunBeforeCommit,
}

/// Outcome of one executor run.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// Exit code of the executor, `None` when it died to a signal.
    pub exit: Option<i32>,
    /// Where stdout was redirected, when the substrate captures it.
    pub log: Option<PathBuf>,
    /// Where stderr was redirected, when the substrate captures it.
    pub err_log: Option<PathBuf>,
}

impl RunReport {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.exit == Some(0)
    }
}

/// Incremental-execution capability the emitter targets.
#[async_trait]
pub trait BuildSubstrate: Send {
    /// Declare one node's rule. Nodes arrive in graph order.
    fn declare(&mut self, node: &GraphNode) -> Result<(), SubstrateError>;

    /// Materialize everything declared so far (rule description plus
    /// manifests). After this the description is immutable and may be
    /// executed now or by a later invocation.
    fn commit(&mut self) -> Result<(), SubstrateError>;

    /// Execute the committed description, running at most `parallelism`
    /// node actions concurrently, and block until it finishes.
    async fn run(&mut self, parallelism: usize) -> Result<RunReport, SubstrateError>;
}
