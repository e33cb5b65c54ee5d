//! CPU-budget partitioning across an unknown sample count.
//!
//! The allocator turns a total core budget into a `(job_count,
//! threads_per_job)` grid with no oversubscription, plus the region chunk
//! size used to split the reference for the joint caller. Inputs are
//! pre-validated by the caller (positive core and sample counts), so there is
//! no failure path here.

use serde::{Deserialize, Serialize};

/// The computed partitioning for one invocation.
///
/// Invariants, guaranteed by [`ResourceBudget::allocate`]:
///
/// - `job_count * threads_per_job <= total_cores`
/// - `1 <= job_count <= sample_count`
/// - `threads_per_job >= 1`
///
/// ```
/// use snpforge::resources::ResourceBudget;
///
/// let b = ResourceBudget::allocate(8, 3, 5_000_000);
/// assert_eq!(b.threads_per_job, 2);
/// assert_eq!(b.job_count, 3); // capped by sample count, not 4
/// assert_eq!(b.region_chunk_size, 208_333);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBudget {
    pub total_cores: usize,
    pub sample_count: usize,
    pub threads_per_job: usize,
    pub job_count: usize,
    pub region_chunk_size: u64,
}

impl ResourceBudget {
    /// Empirical granularity divisor for region chunking.
    const CHUNK_FACTOR: u64 = 3;

    /// Partition `total_cores` across `sample_count` concurrent jobs.
    ///
    /// Note: a reference much smaller than `total_cores * 3` bytes yields a
    /// chunk size of zero; the formula is kept unclamped on purpose and the
    /// region splitter is expected to cope.
    #[must_use]
    pub fn allocate(total_cores: usize, sample_count: usize, reference_size_bytes: u64) -> Self {
        let threads_per_job = (total_cores / sample_count).max(1);
        let job_count = sample_count.min(total_cores / threads_per_job);
        let region_chunk_size = reference_size_bytes / total_cores as u64 / Self::CHUNK_FACTOR;
        tracing::debug!(
            total_cores,
            sample_count,
            threads_per_job,
            job_count,
            region_chunk_size,
            "allocated resource budget"
        );
        Self {
            total_cores,
            sample_count,
            threads_per_job,
            job_count,
            region_chunk_size,
        }
    }
}
