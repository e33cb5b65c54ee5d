//! Pipeline-level error taxonomy.
//!
//! Every failure a caller can observe before or after graph emission is a
//! [`PipelineError`]. Validation-class errors are raised eagerly, before any
//! rule text is written, so a failed invocation never leaves a partial build
//! description behind. [`PipelineError::ExecutorFailure`] is the one
//! post-emission variant: the emitted graph is a reusable artifact, so a
//! failed run is reported without discarding it and the caller may re-run
//! without rebuilding.
//!
//! Structural errors raised while assembling the graph
//! ([`crate::graph::GraphError`]) and build-substrate I/O errors
//! ([`crate::substrate::SubstrateError`]) are wrapped transparently.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::graph::GraphError;
use crate::substrate::SubstrateError;

/// Process exit code for a successful invocation.
pub const EXIT_OK: i32 = 0;
/// Process exit code for validation-class failures (nothing was emitted).
pub const EXIT_VALIDATION: i32 = 2;
/// Process exit code for a build-executor failure (the graph was emitted).
pub const EXIT_EXECUTOR: i32 = 3;

/// Errors surfaced by pipeline preparation and execution.
#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    /// A precondition on the invocation itself failed: missing or unreadable
    /// reference, too few samples, unreadable output location.
    #[error("input validation failed: {reason}")]
    #[diagnostic(code(snpforge::validate::input))]
    InputValidation { reason: String },

    /// Two inputs derived the same sample id, or a new input collides with a
    /// sample recovered from a previous run.
    #[error("duplicate sample id '{id}' derived from {}", path.display())]
    #[diagnostic(
        code(snpforge::resolve::duplicate_id),
        help("Rename one of the inputs; ids come from the basename with extensions stripped.")
    )]
    DuplicateSampleId { id: String, path: PathBuf },

    /// A derived sample id equals the reference alias, the output prefix, or
    /// the joint-output name.
    #[error("sample id '{id}' collides with a reserved output name")]
    #[diagnostic(
        code(snpforge::resolve::reserved_name),
        help("Rename the input; this name is claimed by a pipeline artifact.")
    )]
    ReservedNameCollision { id: String },

    /// No read-filename pattern matched one or two files in a read folder.
    #[error("no read files found in folder {}", dir.display())]
    #[diagnostic(
        code(snpforge::resolve::no_reads),
        help("Expected paired files like R1/R2.fastq.gz or a single .fastq[.gz] file.")
    )]
    NoReadsFoundInFolder { dir: PathBuf },

    /// A reference was supplied in extend mode; the materialized copy in the
    /// output directory is authoritative there.
    #[error(
        "reference {} conflicts with the reference already materialized in the output directory",
        supplied.display()
    )]
    #[diagnostic(
        code(snpforge::extend::conflicting_reference),
        help("Omit the reference when extending; the prior copy is reused.")
    )]
    ConflictingReference { supplied: PathBuf },

    /// The output directory already holds files and neither force nor extend
    /// was requested.
    #[error("output directory {} already exists", dir.display())]
    #[diagnostic(
        code(snpforge::validate::output_exists),
        help("Pass force to reuse the directory, or extend to add samples to it.")
    )]
    OutputDirectoryExists { dir: PathBuf },

    /// A required external tool could not be located.
    #[error("required tool '{tool}' was not found")]
    #[diagnostic(
        code(snpforge::validate::missing_tool),
        help("Install the tool or make it visible to the configured tool locator.")
    )]
    MissingRequiredTool { tool: &'static str },

    /// The build executor exited non-zero after the graph was emitted.
    #[error("build executor failed (exit status {code:?})")]
    #[diagnostic(
        code(snpforge::run::executor),
        help("The emitted build description is intact; inspect the run logs and re-run.")
    )]
    ExecutorFailure { code: Option<i32> },

    /// Structural graph invariant violation.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    /// Build-substrate failure while declaring or materializing rules.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Substrate(#[from] SubstrateError),

    /// Filesystem error with the offending path attached.
    #[error("i/o error at {}", path.display())]
    #[diagnostic(code(snpforge::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Attach a path to a raw I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Map this error onto the process exit-code contract.
    ///
    /// Everything detected before emission maps to [`EXIT_VALIDATION`];
    /// only a failed executor run maps to [`EXIT_EXECUTOR`].
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::ExecutorFailure { .. } => EXIT_EXECUTOR,
            _ => EXIT_VALIDATION,
        }
    }
}
