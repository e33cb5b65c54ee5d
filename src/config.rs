//! Immutable pipeline configuration and external-tool resolution.
//!
//! A [`PipelineConfig`] is constructed once per invocation and passed by
//! reference to every component; nothing in this crate reads process-global
//! mutable state or mutates the environment. Tool locations are resolved
//! through the injected [`ToolLocator`] collaborator, so tests can substitute
//! a stub without touching `PATH`.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;

/// External tools the emitted node commands invoke.
///
/// The genomic algorithms behind these are opaque collaborators; the graph
/// layer only needs a resolvable binary for each so validation can fail
/// eagerly with [`PipelineError::MissingRequiredTool`] instead of mid-run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tool {
    /// Short-read aligner (`bwa`): indexing and alignment.
    Aligner,
    /// Alignment toolkit (`samtools`): faidx, view, sort, index, depth.
    BamKit,
    /// Variant caller (`freebayes`), used for per-sample calls.
    Caller,
    /// Region-parallel wrapper around the caller (`freebayes-parallel`).
    ParallelCaller,
    /// Splits an indexed reference into fixed-size regions.
    RegionSplitter,
    /// Streams contigs as pseudo-reads at a target coverage.
    ContigShredder,
    /// Extracts core variants and writes alignment/report/tree inputs.
    CoreExtractor,
    /// The incremental build executor (`make`).
    Executor,
}

impl Tool {
    /// All tools a run depends on, probed during validation.
    pub const ALL: [Tool; 8] = [
        Tool::Aligner,
        Tool::BamKit,
        Tool::Caller,
        Tool::ParallelCaller,
        Tool::RegionSplitter,
        Tool::ContigShredder,
        Tool::CoreExtractor,
        Tool::Executor,
    ];

    /// Binary name looked up by the locator.
    #[must_use]
    pub fn binary(&self) -> &'static str {
        match self {
            Tool::Aligner => "bwa",
            Tool::BamKit => "samtools",
            Tool::Caller => "freebayes",
            Tool::ParallelCaller => "freebayes-parallel",
            Tool::RegionSplitter => "fasta_generate_regions",
            Tool::ContigShredder => "shred-contigs",
            Tool::CoreExtractor => "vcf2core",
            Tool::Executor => "make",
        }
    }
}

/// Resolves tool binaries to concrete paths.
///
/// Production code uses [`PathLocator`]; tests inject a stub that points
/// every tool at a fixture. Returning `None` makes validation fail with
/// [`PipelineError::MissingRequiredTool`].
pub trait ToolLocator {
    fn locate(&self, tool: Tool) -> Option<PathBuf>;
}

/// Locator that scans an explicit list of directories, captured once.
///
/// [`PathLocator::from_env`] snapshots `PATH` at construction; after that no
/// environment access happens, keeping resolution a pure function of the
/// captured directory list.
#[derive(Clone, Debug)]
pub struct PathLocator {
    dirs: Vec<PathBuf>,
}

impl PathLocator {
    #[must_use]
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Snapshot the current `PATH` into a locator.
    #[must_use]
    pub fn from_env() -> Self {
        let dirs = std::env::var_os("PATH")
            .map(|raw| std::env::split_paths(&raw).collect())
            .unwrap_or_default();
        Self { dirs }
    }
}

impl ToolLocator for PathLocator {
    fn locate(&self, tool: Tool) -> Option<PathBuf> {
        let name = tool.binary();
        self.dirs.iter().find_map(|dir| {
            let candidate = dir.join(name);
            candidate.is_file().then_some(candidate)
        })
    }
}

/// The full set of resolved tool paths for one invocation.
#[derive(Clone, Debug)]
pub struct Toolchain {
    resolved: FxHashMap<Tool, PathBuf>,
}

impl Toolchain {
    /// Probe every required tool through the locator.
    ///
    /// Fails on the first missing tool; this runs during eager validation so
    /// a missing binary never surfaces mid-build.
    pub fn resolve(locator: &dyn ToolLocator) -> Result<Self, PipelineError> {
        let mut resolved = FxHashMap::default();
        for tool in Tool::ALL {
            let path = locator
                .locate(tool)
                .ok_or(PipelineError::MissingRequiredTool {
                    tool: tool.binary(),
                })?;
            tracing::debug!(tool = tool.binary(), path = %path.display(), "resolved tool");
            resolved.insert(tool, path);
        }
        Ok(Self { resolved })
    }

    /// Path of a resolved tool. Every [`Tool`] is present by construction.
    #[must_use]
    pub fn path(&self, tool: Tool) -> &Path {
        &self.resolved[&tool]
    }
}

/// Everything one invocation needs, fixed at construction.
///
/// Threshold values are forwarded opaquely into node command templates; the
/// graph layer never interprets them. Construct with [`PipelineConfig::new`]
/// and the `with_*` methods:
///
/// ```
/// use snpforge::config::PipelineConfig;
///
/// let config = PipelineConfig::new("/data/outbreak/run1")
///     .with_reference("/data/refs/ecoli.fa")
///     .with_inputs(vec!["/data/reads/s1".into(), "/data/reads/s2".into()])
///     .with_cpus(8)
///     .with_min_depth(10);
/// assert_eq!(config.prefix, "core");
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Reference FASTA. Required for a fresh run; forbidden in extend mode,
    /// where the materialized copy is authoritative.
    pub reference: Option<PathBuf>,
    /// Output directory holding every artifact and the build description.
    pub outdir: PathBuf,
    /// Raw sample inputs: read folders, contig files, contig archives.
    pub inputs: Vec<PathBuf>,
    /// Total CPU budget partitioned across jobs.
    pub cpus: usize,
    /// Stem for the final core-variant artifacts.
    pub prefix: String,
    /// Minimum base quality forwarded to the callers.
    pub base_quality: u32,
    /// Minimum mapping quality forwarded to filter and callers.
    pub map_quality: u32,
    /// Minimum read depth forwarded to core extraction.
    pub min_depth: u32,
    /// Minimum variant fraction forwarded to the callers.
    pub min_fraction: f64,
    /// Target coverage when synthesizing pseudo-reads from contigs.
    pub contig_coverage: u32,
    /// Emit a per-sample variant-call node for every sample.
    pub per_sample_calls: bool,
    /// Drop the reference row from the core alignment.
    pub exclude_reference: bool,
    /// Reuse a non-empty output directory.
    pub force: bool,
    /// Extend a previously materialized output directory with new samples.
    pub extend: bool,
    /// Run the build executor immediately after emission.
    pub run_now: bool,
}

impl PipelineConfig {
    pub const DEFAULT_PREFIX: &'static str = "core";
    pub const DEFAULT_BASE_QUALITY: u32 = 20;
    pub const DEFAULT_MAP_QUALITY: u32 = 60;
    pub const DEFAULT_MIN_DEPTH: u32 = 10;
    pub const DEFAULT_MIN_FRACTION: f64 = 0.9;
    pub const DEFAULT_CONTIG_COVERAGE: u32 = 25;

    #[must_use]
    pub fn new(outdir: impl Into<PathBuf>) -> Self {
        Self {
            reference: None,
            outdir: outdir.into(),
            inputs: Vec::new(),
            cpus: 1,
            prefix: Self::DEFAULT_PREFIX.to_string(),
            base_quality: Self::DEFAULT_BASE_QUALITY,
            map_quality: Self::DEFAULT_MAP_QUALITY,
            min_depth: Self::DEFAULT_MIN_DEPTH,
            min_fraction: Self::DEFAULT_MIN_FRACTION,
            contig_coverage: Self::DEFAULT_CONTIG_COVERAGE,
            per_sample_calls: false,
            exclude_reference: false,
            force: false,
            extend: false,
            run_now: false,
        }
    }

    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<PathBuf>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    #[must_use]
    pub fn with_inputs(mut self, inputs: Vec<PathBuf>) -> Self {
        self.inputs = inputs;
        self
    }

    #[must_use]
    pub fn with_cpus(mut self, cpus: usize) -> Self {
        self.cpus = cpus.max(1);
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_base_quality(mut self, q: u32) -> Self {
        self.base_quality = q;
        self
    }

    #[must_use]
    pub fn with_map_quality(mut self, q: u32) -> Self {
        self.map_quality = q;
        self
    }

    #[must_use]
    pub fn with_min_depth(mut self, depth: u32) -> Self {
        self.min_depth = depth;
        self
    }

    #[must_use]
    pub fn with_min_fraction(mut self, fraction: f64) -> Self {
        self.min_fraction = fraction;
        self
    }

    #[must_use]
    pub fn with_contig_coverage(mut self, coverage: u32) -> Self {
        self.contig_coverage = coverage;
        self
    }

    #[must_use]
    pub fn with_per_sample_calls(mut self, enabled: bool) -> Self {
        self.per_sample_calls = enabled;
        self
    }

    #[must_use]
    pub fn with_exclude_reference(mut self, enabled: bool) -> Self {
        self.exclude_reference = enabled;
        self
    }

    #[must_use]
    pub fn with_force(mut self, enabled: bool) -> Self {
        self.force = enabled;
        self
    }

    #[must_use]
    pub fn with_extend(mut self, enabled: bool) -> Self {
        self.extend = enabled;
        self
    }

    #[must_use]
    pub fn with_run_now(mut self, enabled: bool) -> Self {
        self.run_now = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoTools;

    impl ToolLocator for NoTools {
        fn locate(&self, _tool: Tool) -> Option<PathBuf> {
            None
        }
    }

    #[test]
    fn toolchain_reports_first_missing_tool() {
        let err = Toolchain::resolve(&NoTools).unwrap_err();
        match err {
            PipelineError::MissingRequiredTool { tool } => assert_eq!(tool, "bwa"),
            other => panic!("expected MissingRequiredTool, got {other:?}"),
        }
    }

    #[test]
    fn cpus_floor_at_one() {
        let config = PipelineConfig::new("out").with_cpus(0);
        assert_eq!(config.cpus, 1);
    }
}
