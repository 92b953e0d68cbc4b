//! Compressed-row LD r² store.
//!
//! Rows are reference SNPs, columns are tag indices. Entries of a row are
//! sorted by tag index, so a point lookup is a binary search inside the row.

use std::ops::Range;

use rayon::prelude::*;
use tracing::debug;

use super::coo::CooEntry;

/// How the merged COO list is sorted before compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortStrategy {
    /// Parallel above a size threshold, sequential below it.
    #[default]
    Auto,
    /// Always the single-threaded stable sort.
    Sequential,
    /// Always the rayon stable sort.
    Parallel,
}

/// Sort COO records by `(snp_index, tag_index)`, keeping input order among
/// equal keys. Both strategies yield the same sequence.
pub fn sort_coo(entries: &mut [CooEntry], strategy: SortStrategy, parallel_min_len: usize) {
    let parallel = match strategy {
        SortStrategy::Auto => entries.len() >= parallel_min_len,
        SortStrategy::Sequential => false,
        SortStrategy::Parallel => true,
    };
    let key = |e: &CooEntry| (e.snp_index, e.tag_index);
    if parallel {
        debug!(len = entries.len(), "parallel stable sort of COO entries");
        entries.par_sort_by_key(key);
    } else {
        debug!(len = entries.len(), "sequential stable sort of COO entries");
        entries.sort_by_key(key);
    }
}

/// One stored LD entry, as returned by range queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LdEntry {
    /// Row (reference SNP).
    pub snp_index: u32,
    /// Column (tag).
    pub tag_index: u32,
    /// Squared correlation.
    pub r2: f32,
}

/// Borrowed view of one CSR row.
#[derive(Debug, Clone, Copy)]
pub struct LdRow<'a> {
    /// Tag indices, ascending.
    pub tag_index: &'a [u32],
    /// r² values aligned with `tag_index`.
    pub r2: &'a [f32],
}

impl<'a> LdRow<'a> {
    /// Number of entries in the row.
    pub fn len(&self) -> usize {
        self.tag_index.len()
    }

    /// Whether the row is empty.
    pub fn is_empty(&self) -> bool {
        self.tag_index.is_empty()
    }

    /// `(tag_index, r2)` pairs in ascending tag order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + 'a {
        self.tag_index.iter().copied().zip(self.r2.iter().copied())
    }
}

/// CSR arrays: `row_start[num_snp + 1]`, `col_tag_index[nnz]`,
/// `value_r2[nnz]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsrLd {
    row_start: Vec<usize>,
    col_tag_index: Vec<u32>,
    value_r2: Vec<f32>,
}

impl CsrLd {
    /// Wrap externally produced arrays. Nothing is checked here; run
    /// [`validate_csr`](super::validate::validate_csr) before trusting them.
    pub fn from_parts(row_start: Vec<usize>, col_tag_index: Vec<u32>, value_r2: Vec<f32>) -> Self {
        Self {
            row_start,
            col_tag_index,
            value_r2,
        }
    }

    /// Compact COO records already sorted by `(snp_index, tag_index)`.
    ///
    /// `row_start[s]` is the first position of row `s`; rows without
    /// entries inherit the start of the next populated row, so every row
    /// range is well formed and empty rows have zero length.
    pub fn from_sorted_coo(num_snp: usize, sorted: &[CooEntry]) -> Self {
        let nnz = sorted.len();
        let mut col_tag_index = Vec::with_capacity(nnz);
        let mut value_r2 = Vec::with_capacity(nnz);
        for entry in sorted {
            col_tag_index.push(entry.tag_index);
            value_r2.push(entry.r2);
        }

        let mut row_start = vec![nnz; num_snp + 1];
        for (position, entry) in sorted.iter().enumerate().rev() {
            row_start[entry.snp_index as usize] = position;
        }
        for snp_index in (0..num_snp).rev() {
            if row_start[snp_index] > row_start[snp_index + 1] {
                row_start[snp_index] = row_start[snp_index + 1];
            }
        }

        Self {
            row_start,
            col_tag_index,
            value_r2,
        }
    }

    /// Row pointers.
    pub fn row_start(&self) -> &[usize] {
        &self.row_start
    }

    /// Tag index per stored entry.
    pub fn col_tag_index(&self) -> &[u32] {
        &self.col_tag_index
    }

    /// r² per stored entry.
    pub fn value_r2(&self) -> &[f32] {
        &self.value_r2
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.value_r2.len()
    }

    /// Whether nothing has been compacted yet.
    pub fn is_empty(&self) -> bool {
        self.row_start.is_empty() && self.value_r2.is_empty()
    }

    /// Number of rows (`row_start.len() - 1`).
    pub fn num_rows(&self) -> usize {
        self.row_start.len().saturating_sub(1)
    }

    /// Position range of a row's entries. Caller guarantees `snp_index`
    /// is a valid row.
    pub fn row_range(&self, snp_index: usize) -> Range<usize> {
        self.row_start[snp_index]..self.row_start[snp_index + 1]
    }

    /// Entries of a row.
    pub fn row(&self, snp_index: usize) -> LdRow<'_> {
        let range = self.row_range(snp_index);
        LdRow {
            tag_index: &self.col_tag_index[range.clone()],
            r2: &self.value_r2[range],
        }
    }

    /// Exact-match lookup of `tag_index` in a row.
    pub fn find(&self, snp_index: usize, tag_index: u32) -> Option<f32> {
        let row = self.row(snp_index);
        row.tag_index
            .binary_search(&tag_index)
            .ok()
            .map(|offset| row.r2[offset])
    }

    /// Entries of all rows in `snps`, row by row.
    pub fn entries_in(&self, snps: Range<usize>) -> impl Iterator<Item = LdEntry> + '_ {
        snps.flat_map(move |snp_index| {
            self.row(snp_index).iter().map(move |(tag_index, r2)| LdEntry {
                snp_index: snp_index as u32,
                tag_index,
                r2,
            })
        })
    }

    /// Number of entries in rows `snps`.
    pub fn count_in(&self, snps: Range<usize>) -> usize {
        if snps.is_empty() {
            return 0;
        }
        self.row_start[snps.end] - self.row_start[snps.start]
    }

    /// Bytes held by `(row_start, col_tag_index, value_r2)`.
    pub fn mem_bytes(&self) -> (usize, usize, usize) {
        (
            self.row_start.len() * std::mem::size_of::<usize>(),
            self.col_tag_index.len() * std::mem::size_of::<u32>(),
            self.value_r2.len() * std::mem::size_of::<f32>(),
        )
    }

    /// blake3 digest of the three arrays.
    pub fn fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        for &start in &self.row_start {
            hasher.update(&(start as u64).to_le_bytes());
        }
        for &tag in &self.col_tag_index {
            hasher.update(&tag.to_le_bytes());
        }
        for &r2 in &self.value_r2 {
            hasher.update(&r2.to_bits().to_le_bytes());
        }
        hasher.finalize()
    }
}
