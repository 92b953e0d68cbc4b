//! Configuration for LD matrix construction.

use crate::ld::SortStrategy;

/// Default COO length from which [`SortStrategy::Auto`] sorts in parallel.
pub const DEFAULT_PARALLEL_SORT_MIN_LEN: usize = 1 << 16;

/// How finalization sorts the merged COO list.
///
/// The r² threshold is not part of the configuration: it is passed to each
/// ingestion and finalization call and checked there.
#[derive(Debug, Clone, PartialEq)]
pub struct LdConfig {
    /// Sort used before compaction.
    pub sort: SortStrategy,
    /// COO length from which `SortStrategy::Auto` goes parallel.
    pub parallel_sort_min_len: usize,
}

impl LdConfig {
    /// Default sorting: `Auto` with [`DEFAULT_PARALLEL_SORT_MIN_LEN`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sort strategy.
    pub fn with_sort(mut self, sort: SortStrategy) -> Self {
        self.sort = sort;
        self
    }

    /// Set the parallel sort threshold used by `SortStrategy::Auto`.
    pub fn with_parallel_sort_min_len(mut self, len: usize) -> Self {
        self.parallel_sort_min_len = len;
        self
    }
}

impl Default for LdConfig {
    fn default() -> Self {
        Self {
            sort: SortStrategy::Auto,
            parallel_sort_min_len: DEFAULT_PARALLEL_SORT_MIN_LEN,
        }
    }
}
