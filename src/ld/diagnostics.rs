//! Memory and size report for an LD matrix at any lifecycle stage.

use tracing::info;

/// Sizes of one COO chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChunkDiagnostics {
    /// Chromosome label the chunk was ingested under.
    pub chr_label: u32,
    /// Number of COO records.
    pub coo_len: usize,
    /// Bytes used by the COO records.
    pub coo_bytes: usize,
}

/// Sizes of the compacted CSR arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CsrDiagnostics {
    /// Length of `row_start`.
    pub row_start_len: usize,
    /// Bytes used by `row_start`.
    pub row_start_bytes: usize,
    /// Length of `col_tag_index`.
    pub tag_index_len: usize,
    /// Bytes used by `col_tag_index`.
    pub tag_index_bytes: usize,
    /// Length of `value_r2`.
    pub r2_len: usize,
    /// Bytes used by `value_r2`.
    pub r2_bytes: usize,
}

/// Full report: chunks, CSR arrays and running-sum accumulators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LdMatrixDiagnostics {
    /// Per-chunk sizes, ascending chromosome label.
    pub chunks: Vec<ChunkDiagnostics>,
    /// CSR sizes (all zero before finalization).
    pub csr: CsrDiagnostics,
    /// Bytes used by both running-sum accumulators.
    pub tag_sum_bytes: usize,
}

impl LdMatrixDiagnostics {
    /// Sum of every byte count in the report.
    pub fn total_bytes(&self) -> usize {
        let chunks: usize = self.chunks.iter().map(|c| c.coo_bytes).sum();
        chunks
            + self.csr.row_start_bytes
            + self.csr.tag_index_bytes
            + self.csr.r2_bytes
            + self.tag_sum_bytes
    }

    /// Emit the report through `tracing` and return the total byte count.
    pub fn log(&self) -> usize {
        for chunk in &self.chunks {
            info!(
                chr_label = chunk.chr_label,
                coo_len = chunk.coo_len,
                coo_bytes = chunk.coo_bytes,
                "diag: LD COO chunk"
            );
        }
        info!(
            row_start_len = self.csr.row_start_len,
            row_start_bytes = self.csr.row_start_bytes,
            tag_index_len = self.csr.tag_index_len,
            tag_index_bytes = self.csr.tag_index_bytes,
            r2_len = self.csr.r2_len,
            r2_bytes = self.csr.r2_bytes,
            "diag: LD CSR combined"
        );
        info!(tag_sum_bytes = self.tag_sum_bytes, "diag: LD tag sums");
        let total = self.total_bytes();
        info!(total_bytes = total, "diag: LD matrix total");
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_adds_all_arrays() {
        let report = LdMatrixDiagnostics {
            chunks: vec![ChunkDiagnostics {
                chr_label: 1,
                coo_len: 2,
                coo_bytes: 24,
            }],
            csr: CsrDiagnostics {
                row_start_len: 3,
                row_start_bytes: 24,
                tag_index_len: 1,
                tag_index_bytes: 4,
                r2_len: 1,
                r2_bytes: 4,
            },
            tag_sum_bytes: 32,
        };
        assert_eq!(report.total_bytes(), 88);
        assert_eq!(report.log(), 88);
    }
}
