//! # Sparse LD r² structure for mixture-model GWAS likelihoods
//!
//! This library builds and validates the linkage-disequilibrium backbone
//! that univariate and bivariate mixture-model cost functions iterate over.
//!
//! ## Pipeline
//!
//! 1. **Ingestion**: per-chromosome `(snp, snp, r²)` triplets are checked,
//!    folded into per-tag running sums, and expanded into directed COO
//!    records for causal-eligible rows and tag columns
//! 2. **Finalization**: a 1.0 diagonal is added for every tag, the merged
//!    COO list is stably sorted (in parallel when large) and compacted
//!    into CSR arrays
//! 3. **Validation**: row pointers, ranges, uniqueness, diagonal presence
//!    and symmetry are checked before the structure becomes queryable
//! 4. **Queries**: point lookups and per-SNP, per-chromosome and SNP-range
//!    scans, all read-only
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ldcsr::{LdMatrix, LdTriplets, TagIndexMapping};
//!
//! let mut mapping = TagIndexMapping::new(3, &[0, 2])?;
//! mapping.set_mafvec(vec![0.1, 0.2, 0.3])?;
//!
//! let mut triplets = LdTriplets::new();
//! triplets.push(0, 2, 0.5);
//!
//! let mut ld = LdMatrix::new(Arc::new(mapping));
//! ld.ingest(1, &triplets, 0.1)?;
//! ld.finalize(0.1)?;
//! assert_eq!(ld.find_ld_r2(0, 1)?, Some(0.5));
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod config;     // Construction parameters
pub mod ld;         // COO ingestion, CSR store, validation, queries
pub mod mapping;    // Tag/SNP index spaces
/// Python bindings for exposing the LD matrix to external runtimes.
#[cfg(feature = "python-bindings")]
pub mod python_bindings;

// Re-exports for convenience
pub use config::LdConfig;
pub use ld::{
    CsrLd, ErrorKind, LdEntry, LdMatrix, LdMatrixDiagnostics, LdMatrixError, LdMatrixState,
    LdRow, LdTagSum, LdTriplets, SortStrategy, ValidationError,
};
pub use mapping::{find_hvec, MappingError, TagIndexMapping, TagToSnpMapping};
