//! # snpforge: deterministic task graphs for core-variant pipelines
//!
//! snpforge turns a reference genome plus a set of heterogeneous sample
//! inputs (folders of reads, assembled contig files, compressed contig
//! archives) into a sized, incrementally-rebuildable task graph. The graph
//! drives per-sample alignment, per-sample and joint variant calling, and
//! final core-variant extraction through opaque external tools; snpforge
//! itself owns the hard coordination problems:
//!
//! - resolving arbitrarily named inputs into canonical sample identities and
//!   concrete dependency file lists,
//! - partitioning a fixed CPU budget into a `(jobs × threads)` grid with no
//!   oversubscription,
//! - keying every graph node deterministically so unchanged work is skipped
//!   on re-runs,
//! - extending a previously materialized run with new samples without ever
//!   touching already-computed per-sample outputs.
//!
//! ## Quick start
//!
//! ```no_run
//! use snpforge::config::{PathLocator, PipelineConfig};
//! use snpforge::pipeline::Pipeline;
//!
//! # async fn example() -> Result<(), snpforge::errors::PipelineError> {
//! let config = PipelineConfig::new("/data/outbreak/run1")
//!     .with_reference("/data/refs/ecoli.fa")
//!     .with_inputs(vec!["/data/reads/iso1".into(), "/data/reads/iso2.fasta".into()])
//!     .with_cpus(16)
//!     .with_run_now(true);
//!
//! let pipeline = Pipeline::new(config, &PathLocator::from_env())?;
//! let outcome = pipeline.run().await?;
//! println!("built for {} samples", outcome.sample_ids.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module guide
//!
//! - [`samples`] - input classification and sample identity resolution
//! - [`resources`] - CPU-budget partitioning and region chunk sizing
//! - [`graph`] - the dependency graph, its builder, and artifact layout
//! - [`substrate`] - the build-substrate capability and the Makefile backend
//! - [`extend`] - recovery and extension of materialized runs
//! - [`pipeline`] - invocation orchestration and the two-phase protocol
//! - [`config`] - immutable per-invocation configuration and tool resolution
//! - [`errors`] - the error taxonomy and exit-code contract

pub mod config;
pub mod errors;
pub mod extend;
pub mod graph;
pub mod pipeline;
pub mod resources;
pub mod samples;
pub mod substrate;
pub mod telemetry;
