//! Invocation orchestration: validate, resolve, allocate, build, emit, run.
//!
//! The pipeline follows a two-phase protocol. [`Pipeline::prepare`] performs
//! every validation eagerly and assembles the graph; nothing is written until
//! it succeeds, so a validation failure never leaves a partial build
//! description behind. [`Pipeline::emit`] materializes the description
//! through a [`BuildSubstrate`], and [`Pipeline::execute`] optionally drives
//! the executor, bounded at the budget's job count. Execution may also be
//! deferred entirely: the emitted description is a self-contained artifact a
//! later invocation (or a bare `make -j N`) can pick up.

use std::path::PathBuf;

use tracing::instrument;

use crate::config::{PipelineConfig, Tool, ToolLocator, Toolchain};
use crate::errors::PipelineError;
use crate::extend::ExtensionManager;
use crate::graph::{Graph, GraphBuilder, NodeKind, OutputLayout};
use crate::resources::ResourceBudget;
use crate::samples::SampleResolver;
use crate::substrate::{BuildSubstrate, MakefileSubstrate, RunReport};

/// Fresh runs need enough samples for a meaningful core; extend runs only
/// need one new input on top of the recovered set.
const MIN_FRESH_SAMPLES: usize = 2;

/// Everything `prepare` computed for one invocation.
#[derive(Debug)]
pub struct Prepared {
    pub graph: Graph,
    pub budget: ResourceBudget,
    /// Union of recovered and new sample ids, sorted.
    pub sample_ids: Vec<String>,
    /// Default goals of the emitted description, in emission order.
    pub goals: Vec<PathBuf>,
}

/// What a completed invocation produced.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub budget: ResourceBudget,
    pub sample_ids: Vec<String>,
    /// Present when immediate execution was requested and succeeded.
    pub run: Option<RunReport>,
}

#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    layout: OutputLayout,
    toolchain: Toolchain,
}

impl Pipeline {
    /// Probe the toolchain and fix the invocation's configuration.
    pub fn new(config: PipelineConfig, locator: &dyn ToolLocator) -> Result<Self, PipelineError> {
        let toolchain = Toolchain::resolve(locator)?;
        let layout = OutputLayout::new(&config.outdir, &config.prefix);
        Ok(Self {
            config,
            layout,
            toolchain,
        })
    }

    #[must_use]
    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Validate everything and assemble the graph. Writes nothing except, in
    /// extend mode, the removal of stale joint artifacts once all validation
    /// has passed.
    #[instrument(skip(self), fields(extend = self.config.extend))]
    pub fn prepare(&self) -> Result<Prepared, PipelineError> {
        if self.config.extend {
            self.prepare_extend()
        } else {
            self.prepare_fresh()
        }
    }

    fn prepare_fresh(&self) -> Result<Prepared, PipelineError> {
        let reference =
            self.config
                .reference
                .as_ref()
                .ok_or_else(|| PipelineError::InputValidation {
                    reason: "a reference FASTA is required for a fresh run".to_string(),
                })?;
        let metadata =
            std::fs::metadata(reference).map_err(|e| PipelineError::InputValidation {
                reason: format!("reference '{}' is not readable: {e}", reference.display()),
            })?;
        if !metadata.is_file() {
            return Err(PipelineError::InputValidation {
                reason: format!("reference '{}' is not a file", reference.display()),
            });
        }
        if self.config.inputs.len() < MIN_FRESH_SAMPLES {
            return Err(PipelineError::InputValidation {
                reason: format!(
                    "need at least {MIN_FRESH_SAMPLES} samples, got {}",
                    self.config.inputs.len()
                ),
            });
        }
        // Resolve before claiming the output directory: a resolution failure
        // must not leave a freshly created directory behind.
        let mut resolver = SampleResolver::new(self.layout.reserved_names());
        let mut samples = Vec::with_capacity(self.config.inputs.len());
        for input in &self.config.inputs {
            samples.push(resolver.resolve(input)?);
        }
        self.claim_outdir()?;

        let budget = ResourceBudget::allocate(self.config.cpus, samples.len(), metadata.len());
        let mut sample_ids: Vec<String> = samples.iter().map(|s| s.id.clone()).collect();
        sample_ids.sort();

        let graph = GraphBuilder::new(&self.config, &self.layout, budget, &self.toolchain)
            .with_samples(samples)
            .with_reference_source(Some(reference.clone()))
            .build()?;
        let goals = self.goals_of(&graph);

        Ok(Prepared {
            graph,
            budget,
            sample_ids,
            goals,
        })
    }

    fn prepare_extend(&self) -> Result<Prepared, PipelineError> {
        if let Some(supplied) = &self.config.reference {
            return Err(PipelineError::ConflictingReference {
                supplied: supplied.clone(),
            });
        }
        let manager = ExtensionManager::new(&self.layout);
        if !manager.is_materialized()? {
            return Err(PipelineError::InputValidation {
                reason: format!(
                    "'{}' does not hold a materialized run to extend",
                    self.layout.outdir().display()
                ),
            });
        }
        if self.config.inputs.is_empty() {
            return Err(PipelineError::InputValidation {
                reason: "extend requires at least one new sample input".to_string(),
            });
        }

        let known = manager.recover_known_samples()?;
        let mut resolver = SampleResolver::new(self.layout.reserved_names());
        resolver.claim_known(known.iter().cloned());
        let mut samples = Vec::with_capacity(self.config.inputs.len());
        for input in &self.config.inputs {
            samples.push(resolver.resolve(input)?);
        }

        let reference_copy = self.layout.absolute(self.layout.reference());
        let metadata = std::fs::metadata(&reference_copy)
            .map_err(|e| PipelineError::io(reference_copy, e))?;
        let budget = ResourceBudget::allocate(
            self.config.cpus,
            known.len() + samples.len(),
            metadata.len(),
        );

        let mut sample_ids: Vec<String> = known
            .iter()
            .cloned()
            .chain(samples.iter().map(|s| s.id.clone()))
            .collect();
        sample_ids.sort();

        // Validation is done; the sample set is definitely changing.
        manager.purge_stale_joint_artifacts()?;

        let graph = GraphBuilder::new(&self.config, &self.layout, budget, &self.toolchain)
            .with_samples(samples)
            .with_recovered(known)
            .with_reference_source(None)
            .build()?;
        let goals = self.goals_of(&graph);

        Ok(Prepared {
            graph,
            budget,
            sample_ids,
            goals,
        })
    }

    /// The final core artifacts plus any per-sample call outputs this graph
    /// actually owns rules for.
    fn goals_of(&self, graph: &Graph) -> Vec<PathBuf> {
        let mut goals = vec![self.layout.core_alignment()];
        goals.extend(
            graph
                .nodes()
                .iter()
                .filter(|n| matches!(n.kind(), NodeKind::CallSample { .. }))
                .map(|n| n.primary_output().clone()),
        );
        goals
    }

    /// Declare every node and materialize the build description.
    pub fn emit(
        &self,
        prepared: &Prepared,
        substrate: &mut dyn BuildSubstrate,
    ) -> Result<(), PipelineError> {
        for node in prepared.graph.nodes() {
            substrate.declare(node)?;
        }
        substrate.commit()?;
        Ok(())
    }

    /// Run the committed description, bounding concurrency at the budget's
    /// job count. A non-zero executor exit becomes
    /// [`PipelineError::ExecutorFailure`]; the emitted description stays
    /// valid either way.
    pub async fn execute(
        &self,
        prepared: &Prepared,
        substrate: &mut dyn BuildSubstrate,
    ) -> Result<RunReport, PipelineError> {
        let report = substrate.run(prepared.budget.job_count).await?;
        if report.succeeded() {
            Ok(report)
        } else {
            Err(PipelineError::ExecutorFailure { code: report.exit })
        }
    }

    /// The production flow: prepare, emit through the Makefile substrate,
    /// and execute immediately when configured to.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<PipelineOutcome, PipelineError> {
        let prepared = self.prepare()?;
        let mut substrate = self.makefile_substrate(&prepared);
        self.emit(&prepared, &mut substrate)?;

        let run = if self.config.run_now {
            Some(self.execute(&prepared, &mut substrate).await?)
        } else {
            None
        };
        Ok(PipelineOutcome {
            budget: prepared.budget,
            sample_ids: prepared.sample_ids,
            run,
        })
    }

    /// The production substrate for this invocation.
    #[must_use]
    pub fn makefile_substrate(&self, prepared: &Prepared) -> MakefileSubstrate {
        MakefileSubstrate::new(
            self.layout.clone(),
            prepared.budget,
            self.toolchain.path(Tool::Executor).to_path_buf(),
            prepared.sample_ids.clone(),
            prepared.goals.clone(),
        )
    }

    fn claim_outdir(&self) -> Result<(), PipelineError> {
        let outdir = self.layout.outdir();
        if outdir.exists() {
            let occupied = std::fs::read_dir(outdir)
                .map_err(|e| PipelineError::io(outdir.to_path_buf(), e))?
                .next()
                .is_some();
            if occupied && !self.config.force {
                return Err(PipelineError::OutputDirectoryExists {
                    dir: outdir.to_path_buf(),
                });
            }
        }
        std::fs::create_dir_all(outdir).map_err(|e| PipelineError::InputValidation {
            reason: format!("output location '{}' is not writable: {e}", outdir.display()),
        })
    }
}
