//! Fixed, priority-ordered read-filename patterns.
//!
//! The first pattern that matches exactly one or two files in a read folder
//! wins; paired-end layouts are tried before single-end ones.

use regex::Regex;

pub(crate) struct ReadPattern {
    pub regex: Regex,
    pub paired: bool,
}

/// Build the pattern list, paired-end variants first.
///
/// The regexes are fixed at compile time; construction cannot fail.
pub(crate) fn priority_patterns() -> Vec<ReadPattern> {
    // Illumina-style mate markers, then bare fastq fallbacks.
    const SPECS: [(&str, bool); 4] = [
        (r"_R[12][._](.*\.)?f(ast)?q(\.gz)?$", true),
        (r"_[12]\.f(ast)?q(\.gz)?$", true),
        (r"\.f(ast)?q\.gz$", false),
        (r"\.f(ast)?q$", false),
    ];
    SPECS
        .iter()
        .map(|(pattern, paired)| ReadPattern {
            regex: Regex::new(pattern).expect("fixed read pattern"),
            paired: *paired,
        })
        .collect()
}
