//! Sparse symmetric LD r² structure.
//!
//! Data flow:
//! triplets → running sums (unconditional) → causal/tag filtering → COO
//! chunks → diagonal injection → stable sort → CSR compaction → validation
//! → read-only queries.

mod clump;
mod coo;
mod csr;
mod diagnostics;
mod error;
mod io;
mod matrix;
mod tag_sum;
mod validate;

pub use clump::ld_clump;
pub use coo::{expand_triplets, CooChunk, CooEntry, ExpandedBatch, LdTriplets};
pub use csr::{sort_coo, CsrLd, LdEntry, LdRow, SortStrategy};
pub use diagnostics::{ChunkDiagnostics, CsrDiagnostics, LdMatrixDiagnostics};
pub use error::{ErrorKind, IndexSpace, LdMatrixError, Result, ValidationError};
pub use io::{read_ld_triplets, write_ld_triplets};
pub use matrix::{LdMatrix, LdMatrixState};
pub use tag_sum::{
    LdTagSum, TagSumPair, TagSumUpdate, LD_TAG_COMPONENT_ABOVE_R2MIN,
    LD_TAG_COMPONENT_BELOW_R2MIN, LD_TAG_COMPONENT_COUNT,
};
pub use validate::validate_csr;
