//! Sample identity and input classification.
//!
//! Raw inputs arrive as arbitrarily named paths: folders of reads, assembled
//! contig files, or compressed contig archives. This module turns each one
//! into a canonical [`Sample`] with a unique id and an ordered dependency
//! file list. Classification is a pure function of path metadata and name;
//! no file content is ever inspected here.

mod patterns;
mod resolver;

pub use resolver::SampleResolver;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Closed classification of a raw sample input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleKind {
    /// A directory holding paired or single read files.
    ReadFolder,
    /// A plain or compressed multi-contig FASTA file.
    ContigFile,
    /// A compressed tarball of contig files.
    ContigArchive,
}

impl SampleKind {
    /// Contig inputs are aligned through the pseudo-read synthesis step.
    #[must_use]
    pub fn is_contigs(&self) -> bool {
        matches!(self, SampleKind::ContigFile | SampleKind::ContigArchive)
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleKind::ReadFolder => write!(f, "read folder"),
            SampleKind::ContigFile => write!(f, "contig file"),
            SampleKind::ContigArchive => write!(f, "contig archive"),
        }
    }
}

/// One resolved sample: identity plus concrete dependency files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Canonical id, unique across the invocation including recovered ids.
    pub id: String,
    pub kind: SampleKind,
    /// The raw input path as supplied by the caller.
    pub source_path: PathBuf,
    /// Ordered files the sample's align node depends on: one or two read
    /// files for a [`SampleKind::ReadFolder`], the source path itself for
    /// contig inputs.
    pub dependency_files: Vec<PathBuf>,
}

/// Archive suffixes recognized as [`SampleKind::ContigArchive`].
const ARCHIVE_SUFFIXES: [&str; 5] = [".tar.gz", ".tar.bz2", ".tar.xz", ".tgz", ".tar"];

/// Classify a path into a [`SampleKind`] from metadata and name alone.
#[must_use]
pub fn classify(path: &Path) -> SampleKind {
    if path.is_dir() {
        return SampleKind::ReadFolder;
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if ARCHIVE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
        SampleKind::ContigArchive
    } else {
        SampleKind::ContigFile
    }
}

/// Derive the canonical sample id for a path of the given kind.
///
/// Files lose every trailing extension component (`ecoli.fasta.gz` →
/// `ecoli`); directories use their final path segment. Returns `None` when
/// nothing usable remains (for example a bare `.` path).
#[must_use]
pub fn derive_id(path: &Path, kind: SampleKind) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    let id = match kind {
        SampleKind::ReadFolder => name.to_string(),
        SampleKind::ContigFile | SampleKind::ContigArchive => {
            name.split('.').find(|part| !part.is_empty())?.to_string()
        }
    };
    (!id.is_empty()).then_some(id)
}
