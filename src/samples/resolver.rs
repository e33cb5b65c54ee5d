//! Resolution of raw inputs into [`Sample`] values.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use super::patterns::{ReadPattern, priority_patterns};
use super::{Sample, SampleKind, classify, derive_id};
use crate::errors::PipelineError;
use crate::graph::INTERMEDIATE_MARKERS;

/// Stateful resolver for one invocation.
///
/// The resolver owns the id namespace: it rejects ids already assigned in
/// this invocation, ids recovered from a previous run (extend mode), and ids
/// that collide with reserved artifact names. Resolution order does not
/// matter for the eventual graph, the builder sorts samples by id.
pub struct SampleResolver {
    reserved: Vec<String>,
    assigned: FxHashMap<String, PathBuf>,
    patterns: Vec<ReadPattern>,
}

impl SampleResolver {
    /// Create a resolver with the invocation's reserved artifact names
    /// (reference alias stem, output prefix, joint-output name).
    #[must_use]
    pub fn new(reserved: impl IntoIterator<Item = String>) -> Self {
        Self {
            reserved: reserved.into_iter().collect(),
            assigned: FxHashMap::default(),
            patterns: priority_patterns(),
        }
    }

    /// Pre-claim ids recovered from a previously materialized run so new
    /// inputs cannot collide with them.
    pub fn claim_known(&mut self, ids: impl IntoIterator<Item = String>) {
        for id in ids {
            self.assigned.entry(id).or_insert_with(PathBuf::new);
        }
    }

    /// Resolve one raw input path into a [`Sample`].
    pub fn resolve(&mut self, path: &Path) -> Result<Sample, PipelineError> {
        let kind = classify(path);
        let id = derive_id(path, kind).ok_or_else(|| PipelineError::InputValidation {
            reason: format!("cannot derive a sample id from '{}'", path.display()),
        })?;

        if self.reserved.iter().any(|name| *name == id) {
            return Err(PipelineError::ReservedNameCollision { id });
        }
        // Folder ids keep their dots, so an id like `iso.raw` would shadow
        // another sample's intermediate alignment and vanish from
        // artifact-scan recovery.
        if INTERMEDIATE_MARKERS.iter().any(|m| id.ends_with(m)) {
            return Err(PipelineError::ReservedNameCollision { id });
        }
        if self.assigned.contains_key(&id) {
            return Err(PipelineError::DuplicateSampleId {
                id,
                path: path.to_path_buf(),
            });
        }

        let dependency_files = match kind {
            SampleKind::ReadFolder => self.discover_reads(path)?,
            SampleKind::ContigFile | SampleKind::ContigArchive => vec![path.to_path_buf()],
        };

        tracing::debug!(
            id,
            %kind,
            files = dependency_files.len(),
            "resolved sample input"
        );
        self.assigned.insert(id.clone(), path.to_path_buf());
        Ok(Sample {
            id,
            kind,
            source_path: path.to_path_buf(),
            dependency_files,
        })
    }

    /// Try each filename pattern in priority order and take the first one
    /// matching exactly one or two files, sorted lexicographically.
    fn discover_reads(&self, dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        let entries = std::fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))?;
        let mut files: Vec<(String, PathBuf)> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PipelineError::io(dir, e))?;
            let path = entry.path();
            if path.is_file() {
                files.push((entry.file_name().to_string_lossy().into_owned(), path));
            }
        }

        for pattern in &self.patterns {
            let mut matches: Vec<&(String, PathBuf)> = files
                .iter()
                .filter(|(name, _)| pattern.regex.is_match(name))
                .collect();
            if matches.len() == 1 || matches.len() == 2 {
                matches.sort_by(|a, b| a.0.cmp(&b.0));
                tracing::debug!(
                    dir = %dir.display(),
                    paired = pattern.paired,
                    count = matches.len(),
                    "read pattern matched"
                );
                return Ok(matches.into_iter().map(|(_, path)| path.clone()).collect());
            }
        }
        Err(PipelineError::NoReadsFoundInFolder {
            dir: dir.to_path_buf(),
        })
    }
}
