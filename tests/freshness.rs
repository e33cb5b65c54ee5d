//! End-to-end incremental behavior, driven through the in-process freshness
//! simulator: full builds, no-op re-runs, partial invalidation, and the
//! extend-mode reuse guarantee.

mod common;

use common::{FreshnessSim, StubLocator, contig_file, read_folder, write_reference};
use snpforge::config::PipelineConfig;
use snpforge::pipeline::{Pipeline, Prepared};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Fixture {
    workspace: TempDir,
    outdir: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        snpforge::telemetry::init_tracing();
        let workspace = TempDir::new().unwrap();
        let outdir = workspace.path().join("out");
        Self { workspace, outdir }
    }

    fn fresh_config(&self) -> PipelineConfig {
        let reference = write_reference(self.workspace.path(), "ref.fa", 1_200);
        let inputs = vec![
            read_folder(self.workspace.path(), "s1"),
            read_folder(self.workspace.path(), "s2"),
        ];
        PipelineConfig::new(&self.outdir)
            .with_reference(reference)
            .with_inputs(inputs)
            .with_cpus(4)
    }

    async fn run(&self, config: PipelineConfig) -> (Prepared, Vec<String>) {
        let pipeline = Pipeline::new(config, &StubLocator).unwrap();
        let prepared = pipeline.prepare().unwrap();
        let mut sim = FreshnessSim::new(&self.outdir);
        pipeline.emit(&prepared, &mut sim).unwrap();
        let report = pipeline.execute(&prepared, &mut sim).await.unwrap();
        assert!(report.succeeded());
        (prepared, sim.executed)
    }
}

/// A fresh build executes every node exactly once.
#[tokio::test]
async fn fresh_build_executes_every_node() {
    let fixture = Fixture::new();
    let (prepared, executed) = fixture.run(fixture.fresh_config()).await;

    // 4 shared + 4 per sample x 2 + 3 joint.
    assert_eq!(prepared.graph.len(), 15);
    assert_eq!(executed.len(), 15);
    assert!(fixture.outdir.join("core.aln").is_file());
    assert!(fixture.outdir.join("s1.bam.bai").is_file());
}

/// Re-running over an unchanged world does no work at all.
#[tokio::test]
async fn unchanged_rerun_skips_everything() {
    let fixture = Fixture::new();
    let config = fixture.fresh_config().with_force(true);
    fixture.run(config.clone()).await;

    let (_, executed) = fixture.run(config).await;
    assert!(executed.is_empty(), "re-executed: {executed:?}");
}

/// Deleting one intermediate artifact re-runs only its producer and the
/// downstream nodes whose inputs then became newer.
#[tokio::test]
async fn missing_artifact_invalidates_only_downstream_work() {
    let fixture = Fixture::new();
    let config = fixture.fresh_config().with_force(true);
    fixture.run(config.clone()).await;

    std::fs::remove_file(fixture.outdir.join("s1.bam")).unwrap();
    let (_, executed) = fixture.run(config).await;
    assert_eq!(
        executed,
        vec![
            "sort:s1",
            "index:s1",
            "call_joint",
            "depth_profile",
            "extract_core",
        ]
    );
}

/// The reuse law: extending with a new sample re-runs the joint work and the
/// new sample's chain, and provably never touches a known sample's outputs.
#[tokio::test]
async fn extend_adds_a_sample_without_touching_known_outputs() {
    let fixture = Fixture::new();
    fixture.run(fixture.fresh_config()).await;

    let known_bam = fixture.outdir.join("s1.bam");
    let before_bytes = std::fs::read(&known_bam).unwrap();
    let before_mtime = std::fs::metadata(&known_bam).unwrap().modified().unwrap();
    assert!(fixture.outdir.join("joint.vcf").is_file());

    let s3 = contig_file(fixture.workspace.path(), "s3");
    let extend = PipelineConfig::new(&fixture.outdir)
        .with_inputs(vec![s3])
        .with_cpus(4)
        .with_extend(true);

    let pipeline = Pipeline::new(extend, &StubLocator).unwrap();
    let prepared = pipeline.prepare().unwrap();

    // Validation passed, so the stale joint artifacts are already gone.
    assert!(!fixture.outdir.join("joint.vcf").exists());
    assert!(!fixture.outdir.join("core.aln").exists());
    assert_eq!(prepared.sample_ids, vec!["s1", "s2", "s3"]);
    assert_eq!(prepared.budget.sample_count, 3);

    // Known alignments are sources, not re-emitted nodes.
    assert!(prepared.graph.is_source(Path::new("s1.bam")));
    assert!(prepared.graph.owner_of(Path::new("s1.bam")).is_none());

    // Emit the real description too: its manifests must cover the union of
    // recovered and new samples.
    let mut description = pipeline.makefile_substrate(&prepared);
    pipeline.emit(&prepared, &mut description).unwrap();

    let mut sim = FreshnessSim::new(&fixture.outdir);
    pipeline.emit(&prepared, &mut sim).unwrap();
    pipeline.execute(&prepared, &mut sim).await.unwrap();

    assert_eq!(
        sim.executed,
        vec![
            "align:s3",
            "quality_filter:s3",
            "sort:s3",
            "index:s3",
            "call_joint",
            "depth_profile",
            "extract_core",
        ]
    );
    assert_eq!(std::fs::read(&known_bam).unwrap(), before_bytes);
    assert_eq!(
        std::fs::metadata(&known_bam).unwrap().modified().unwrap(),
        before_mtime
    );
    let bams = std::fs::read_to_string(fixture.outdir.join("bams.list")).unwrap();
    assert_eq!(bams, "s1.bam\ns2.bam\ns3.bam\n");
}

/// Folder ids legitimately contain dots; such a sample must survive
/// artifact-scan recovery and stay in the extended sample set.
#[tokio::test]
async fn extend_recovers_samples_with_dotted_ids() {
    let fixture = Fixture::new();
    let reference = write_reference(fixture.workspace.path(), "ref.fa", 1_200);
    let inputs = vec![
        read_folder(fixture.workspace.path(), "iso.2024"),
        read_folder(fixture.workspace.path(), "s2"),
    ];
    let fresh = PipelineConfig::new(&fixture.outdir)
        .with_reference(reference)
        .with_inputs(inputs)
        .with_cpus(4);
    fixture.run(fresh).await;
    assert!(fixture.outdir.join("iso.2024.bam").is_file());

    let s3 = contig_file(fixture.workspace.path(), "s3");
    let extend = PipelineConfig::new(&fixture.outdir)
        .with_inputs(vec![s3])
        .with_cpus(4)
        .with_extend(true);
    let pipeline = Pipeline::new(extend, &StubLocator).unwrap();
    let prepared = pipeline.prepare().unwrap();

    assert_eq!(prepared.sample_ids, vec!["iso.2024", "s2", "s3"]);
    assert!(prepared.graph.is_source(Path::new("iso.2024.bam")));

    let mut sim = FreshnessSim::new(&fixture.outdir);
    pipeline.emit(&prepared, &mut sim).unwrap();
    pipeline.execute(&prepared, &mut sim).await.unwrap();
    assert!(!sim.executed.iter().any(|kind| kind.contains("iso.2024")));
}

/// A force re-run over a shrunken sample set rewrites the manifests, which
/// the joint nodes declare as prerequisites, so the stale joint artifacts
/// are rebuilt instead of silently kept.
#[tokio::test]
async fn shrunken_sample_set_invalidates_joint_artifacts() {
    let fixture = Fixture::new();
    let reference = write_reference(fixture.workspace.path(), "ref.fa", 1_200);
    let inputs = vec![
        read_folder(fixture.workspace.path(), "s1"),
        read_folder(fixture.workspace.path(), "s2"),
        read_folder(fixture.workspace.path(), "s3"),
    ];
    let full = PipelineConfig::new(&fixture.outdir)
        .with_reference(reference)
        .with_inputs(inputs.clone())
        .with_cpus(4)
        .with_force(true);

    let run_with = |config: PipelineConfig| async {
        let pipeline = Pipeline::new(config, &StubLocator).unwrap();
        let prepared = pipeline.prepare().unwrap();
        let mut description = pipeline.makefile_substrate(&prepared);
        pipeline.emit(&prepared, &mut description).unwrap();
        let mut sim = FreshnessSim::new(&fixture.outdir);
        pipeline.emit(&prepared, &mut sim).unwrap();
        pipeline.execute(&prepared, &mut sim).await.unwrap();
        sim.executed
    };

    run_with(full.clone()).await;

    let mut shrunken_inputs = inputs;
    shrunken_inputs.truncate(2);
    let shrunken = full.with_inputs(shrunken_inputs);
    let executed = run_with(shrunken).await;
    assert_eq!(executed, vec!["call_joint", "depth_profile", "extract_core"]);
}

/// A new input whose id collides with a recovered sample is rejected, and
/// nothing is purged when validation fails.
#[tokio::test]
async fn extend_rejects_collision_with_recovered_sample() {
    let fixture = Fixture::new();
    fixture.run(fixture.fresh_config()).await;

    let clashing = contig_file(fixture.workspace.path(), "s1");
    let extend = PipelineConfig::new(&fixture.outdir)
        .with_inputs(vec![clashing])
        .with_extend(true);

    let pipeline = Pipeline::new(extend, &StubLocator).unwrap();
    let err = pipeline.prepare().unwrap_err();
    assert!(matches!(
        err,
        snpforge::errors::PipelineError::DuplicateSampleId { .. }
    ));
    assert!(fixture.outdir.join("joint.vcf").is_file());
}
