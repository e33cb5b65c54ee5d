//! Artifact naming inside the output directory.
//!
//! Every path a node declares or a manifest lists comes from here, so the
//! builder, the emitter, and the extension manager can never disagree about
//! where an artifact lives. Artifact paths are relative to the output
//! directory; [`OutputLayout::absolute`] anchors them when touching the
//! filesystem directly.

use std::path::{Path, PathBuf};

/// Fixed alias the reference is copied to inside the output directory.
pub const REFERENCE_ALIAS: &str = "reference.fa";
/// Reserved id stem claimed by the reference alias.
pub const REFERENCE_STEM: &str = "reference";
/// Reserved stem of the joint variant-call output.
pub const JOINT_NAME: &str = "joint";
/// Id suffixes claimed by intermediate per-sample alignments. An id ending
/// in one would make its `<id>.bam` indistinguishable from another sample's
/// intermediate during artifact-scan recovery, so the resolver rejects them.
pub const INTERMEDIATE_MARKERS: [&str; 2] = [".raw", ".filt"];

#[derive(Clone, Debug)]
pub struct OutputLayout {
    outdir: PathBuf,
    prefix: String,
}

impl OutputLayout {
    #[must_use]
    pub fn new(outdir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            outdir: outdir.into(),
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn outdir(&self) -> &Path {
        &self.outdir
    }

    /// Anchor a layout-relative artifact path in the output directory.
    #[must_use]
    pub fn absolute(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.outdir.join(relative)
    }

    /// Sample ids that may not be used because an artifact claims the name.
    #[must_use]
    pub fn reserved_names(&self) -> Vec<String> {
        vec![
            REFERENCE_STEM.to_string(),
            self.prefix.clone(),
            JOINT_NAME.to_string(),
        ]
    }

    // Reference artifacts.

    #[must_use]
    pub fn reference(&self) -> PathBuf {
        PathBuf::from(REFERENCE_ALIAS)
    }

    #[must_use]
    pub fn sequence_index(&self) -> PathBuf {
        PathBuf::from(format!("{REFERENCE_ALIAS}.fai"))
    }

    #[must_use]
    pub fn aligner_index(&self) -> PathBuf {
        PathBuf::from(format!("{REFERENCE_ALIAS}.bwt"))
    }

    #[must_use]
    pub fn regions(&self) -> PathBuf {
        PathBuf::from(format!("{REFERENCE_STEM}.regions"))
    }

    // Per-sample artifacts, namespaced by sample id.

    #[must_use]
    pub fn raw_alignment(&self, id: &str) -> PathBuf {
        PathBuf::from(format!("{id}.raw.bam"))
    }

    #[must_use]
    pub fn filtered_alignment(&self, id: &str) -> PathBuf {
        PathBuf::from(format!("{id}.filt.bam"))
    }

    /// The per-sample primary output; its presence marks the sample as known
    /// to a previously materialized run.
    #[must_use]
    pub fn alignment(&self, id: &str) -> PathBuf {
        PathBuf::from(format!("{id}.bam"))
    }

    #[must_use]
    pub fn alignment_index(&self, id: &str) -> PathBuf {
        PathBuf::from(format!("{id}.bam.bai"))
    }

    #[must_use]
    pub fn sample_calls(&self, id: &str) -> PathBuf {
        PathBuf::from(format!("{id}.vcf"))
    }

    // Joint and downstream artifacts, invalidated whenever the sample set
    // changes.

    #[must_use]
    pub fn joint_calls(&self) -> PathBuf {
        PathBuf::from(format!("{JOINT_NAME}.vcf"))
    }

    #[must_use]
    pub fn depth_profile(&self) -> PathBuf {
        PathBuf::from("depth.tab")
    }

    #[must_use]
    pub fn core_alignment(&self) -> PathBuf {
        PathBuf::from(format!("{}.aln", self.prefix))
    }

    #[must_use]
    pub fn full_alignment(&self) -> PathBuf {
        PathBuf::from(format!("{}.full.aln", self.prefix))
    }

    #[must_use]
    pub fn report(&self) -> PathBuf {
        PathBuf::from(format!("{}.txt", self.prefix))
    }

    /// Everything that must be purged when the sample set changes.
    #[must_use]
    pub fn joint_artifacts(&self) -> Vec<PathBuf> {
        vec![
            self.joint_calls(),
            self.depth_profile(),
            self.core_alignment(),
            self.full_alignment(),
            self.report(),
        ]
    }

    // Emitter artifacts.

    #[must_use]
    pub fn build_description(&self) -> PathBuf {
        PathBuf::from("Makefile")
    }

    #[must_use]
    pub fn alignment_manifest(&self) -> PathBuf {
        PathBuf::from("bams.list")
    }

    #[must_use]
    pub fn sample_manifest(&self) -> PathBuf {
        PathBuf::from("samples.txt")
    }

    #[must_use]
    pub fn run_log(&self) -> PathBuf {
        PathBuf::from("run.log")
    }

    #[must_use]
    pub fn run_err(&self) -> PathBuf {
        PathBuf::from("run.err")
    }
}
