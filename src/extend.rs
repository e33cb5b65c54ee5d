//! Extending a previously materialized output directory with new samples.
//!
//! Recovery is artifact-scan based: a sample is "known" when its primary
//! alignment (`<id>.bam`) already exists in the output directory. No
//! persisted manifest is read back, so a partially failed prior run simply
//! re-runs the missing work. Joint and downstream artifacts are invalidated
//! by any change to the sample set and are deleted here; per-sample outputs
//! of previously known samples are never touched, which is the core
//! incremental-reuse guarantee.

use std::path::PathBuf;

use crate::errors::PipelineError;
use crate::graph::{INTERMEDIATE_MARKERS, OutputLayout};

pub struct ExtensionManager<'a> {
    layout: &'a OutputLayout,
}

impl<'a> ExtensionManager<'a> {
    #[must_use]
    pub fn new(layout: &'a OutputLayout) -> Self {
        Self { layout }
    }

    /// A directory is a materialized run when the reference copy and at
    /// least one per-sample primary alignment are present.
    pub fn is_materialized(&self) -> Result<bool, PipelineError> {
        let reference = self.layout.absolute(self.layout.reference());
        if !reference.is_file() {
            return Ok(false);
        }
        Ok(!self.recover_known_samples()?.is_empty())
    }

    /// Enumerate previously known sample ids from their primary alignment
    /// artifacts, sorted for deterministic downstream ordering.
    pub fn recover_known_samples(&self) -> Result<Vec<String>, PipelineError> {
        let outdir = self.layout.outdir();
        let entries =
            std::fs::read_dir(outdir).map_err(|e| PipelineError::io(outdir.to_path_buf(), e))?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PipelineError::io(outdir.to_path_buf(), e))?;
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            // Intermediate alignments also end in .bam; only the primary
            // output marks a known sample. The resolver refuses ids ending
            // in an intermediate marker, so this filter never hides a real
            // sample.
            if let Some(id) = name.strip_suffix(".bam")
                && !INTERMEDIATE_MARKERS.iter().any(|m| id.ends_with(m))
                && !id.is_empty()
            {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        tracing::debug!(known = ids.len(), "recovered sample ids from artifacts");
        Ok(ids)
    }

    /// Delete the joint and downstream artifacts, which are necessarily
    /// stale once the sample set changes. Per-sample outputs are left alone.
    pub fn purge_stale_joint_artifacts(&self) -> Result<Vec<PathBuf>, PipelineError> {
        let mut removed = Vec::new();
        for artifact in self.layout.joint_artifacts() {
            let path = self.layout.absolute(&artifact);
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "removed stale joint artifact");
                    removed.push(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(PipelineError::io(path, e)),
            }
        }
        Ok(removed)
    }
}
