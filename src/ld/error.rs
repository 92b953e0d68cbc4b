use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of [`LdMatrixError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation called in the wrong lifecycle state.
    Precondition,
    /// Input triplets or files are unusable.
    MalformedInput,
    /// Built structure broke a structural invariant.
    Invariant,
    /// Index outside its valid range.
    OutOfRange,
}

/// Which index space an out-of-range index belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSpace {
    /// Reference SNP index.
    Snp,
    /// Tag index.
    Tag,
    /// LD component of a running-sum accumulator.
    Component,
    /// Per-tag value buffer length.
    Buffer,
}

/// Structural invariant violations found by CSR validation.
///
/// Variants are listed in the order the checks run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// Row pointer array does not have `num_snp + 1` entries.
    #[error("row_start has {actual} entries, expected num_snp + 1 = {expected}")]
    RowStartLength {
        /// Actual length.
        actual: usize,
        /// Required length.
        expected: usize,
    },

    /// Row pointer past the end of the value arrays.
    #[error("row_start[{snp_index}] = {value} exceeds nnz = {nnz}")]
    RowStartOutOfBounds {
        /// Row whose pointer is invalid.
        snp_index: usize,
        /// Pointer value.
        value: usize,
        /// Number of stored entries.
        nnz: usize,
    },

    /// Row pointers decrease.
    #[error("row_start[{snp_index}] = {value} is below the previous entry {prev_value}")]
    RowStartNotMonotone {
        /// Row whose pointer is smaller than its predecessor.
        snp_index: usize,
        /// Pointer value.
        value: usize,
        /// Predecessor value.
        prev_value: usize,
    },

    /// Last row pointer is not nnz.
    #[error("row_start ends at {last}, expected nnz = {nnz}")]
    RowStartEnd {
        /// Last pointer.
        last: usize,
        /// Number of stored entries.
        nnz: usize,
    },

    /// Column and value arrays differ in length.
    #[error("col_tag_index has {tags} entries but value_r2 has {values}")]
    ColumnLengthMismatch {
        /// Length of the tag index array.
        tags: usize,
        /// Length of the value array.
        values: usize,
    },

    /// Stored tag index outside `[0, num_tag)`.
    #[error("entry {position} has tag index {tag_index}, num_tag is {num_tag}")]
    TagIndexOutOfRange {
        /// Position in the value arrays.
        position: usize,
        /// Stored tag index.
        tag_index: u32,
        /// Number of tags.
        num_tag: usize,
    },

    /// Stored r2 outside `[r2_min, 1]` or not finite.
    #[error("entry {position} has r2 = {value}, allowed range is [{r2_min}, 1]")]
    R2OutOfRange {
        /// Position in the value arrays.
        position: usize,
        /// Stored value.
        value: f32,
        /// Lower bound in effect.
        r2_min: f32,
    },

    /// Two entries of one row share a tag index.
    #[error("snp {snp_index} stores tag {tag_index} more than once")]
    DuplicateTagIndex {
        /// Row.
        snp_index: usize,
        /// Repeated tag index.
        tag_index: u32,
    },

    /// Tag SNP row lacks its own 1.0 diagonal entry.
    #[error("tag {tag_index} (snp {snp_index}) has no diagonal r2 = 1.0 entry")]
    MissingDiagonal {
        /// Row.
        snp_index: usize,
        /// Tag index of the row's SNP.
        tag_index: u32,
    },

    /// Reverse lookup disagrees with a stored entry.
    #[error("r2(snp {snp_index}, tag {tag_index}) = {r2} but reverse lookup gives {reverse:?}")]
    Asymmetric {
        /// Row of the stored entry.
        snp_index: usize,
        /// Column of the stored entry.
        tag_index: u32,
        /// Stored value.
        r2: f32,
        /// Value found from the opposite direction, if any.
        reverse: Option<f32>,
    },
}

/// Errors raised by the LD matrix core.
#[derive(Debug, Error)]
pub enum LdMatrixError {
    /// Ingestion attempted before allele frequencies were set.
    #[error("can't ingest LD triplets before mafvec is set")]
    MafNotSet,

    /// Ingestion or finalization attempted on a finalized matrix.
    #[error("LD matrix is already finalized; clear it before ingesting again")]
    AlreadyFinalized,

    /// Finalization attempted with nothing ingested.
    #[error("COO list is empty, nothing to finalize")]
    EmptyCoo,

    /// Query attempted before finalization.
    #[error("LD matrix is not finalized")]
    NotFinalized,

    /// Chromosome query without chromosome labels.
    #[error("chromosome labels (chrnumvec) are not set")]
    ChrNumVecNotSet,

    /// r² threshold not finite or outside `[0, 1]`.
    #[error("r2_min must be a finite value in [0, 1], got {0}")]
    InvalidR2Min(f32),

    /// Triplet pairs a SNP with itself.
    #[error("triplet {position} pairs snp {snp_index} with itself; LD input must exclude the diagonal")]
    SelfPair {
        /// Position within the batch.
        position: usize,
        /// SNP index on both sides.
        snp_index: i32,
    },

    /// Triplet carries NaN or infinite r2.
    #[error("triplet {position} has non-finite r2 ({value})")]
    NonFiniteR2 {
        /// Position within the batch.
        position: usize,
        /// Rejected value.
        value: f32,
    },

    /// Parallel columns of unequal length.
    #[error("triplet columns differ in length: snp_index {snp}, other_index {other}, r2 {r2}")]
    ColumnLengthMismatch {
        /// Length of the first index column.
        snp: usize,
        /// Length of the second index column.
        other: usize,
        /// Length of the value column.
        r2: usize,
    },

    /// Triplet file header is unusable.
    #[error("{}: invalid element count {numel}", .path.display())]
    InvalidElementCount {
        /// File path.
        path: PathBuf,
        /// Header value.
        numel: i64,
    },

    /// Triplet file ends early.
    #[error("{}: truncated, expected {expected} bytes of payload", .path.display())]
    TruncatedFile {
        /// File path.
        path: PathBuf,
        /// Payload size implied by the header.
        expected: u64,
    },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Structural validation failed.
    #[error("LD structure validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Index outside its valid range.
    #[error("{space:?} index {index} out of range (bound {bound})")]
    IndexOutOfRange {
        /// Index space.
        space: IndexSpace,
        /// Offending index.
        index: i64,
        /// Exclusive upper bound.
        bound: usize,
    },
}

impl LdMatrixError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LdMatrixError::MafNotSet
            | LdMatrixError::AlreadyFinalized
            | LdMatrixError::EmptyCoo
            | LdMatrixError::NotFinalized
            | LdMatrixError::ChrNumVecNotSet => ErrorKind::Precondition,
            LdMatrixError::InvalidR2Min(_)
            | LdMatrixError::SelfPair { .. }
            | LdMatrixError::NonFiniteR2 { .. }
            | LdMatrixError::ColumnLengthMismatch { .. }
            | LdMatrixError::InvalidElementCount { .. }
            | LdMatrixError::TruncatedFile { .. }
            | LdMatrixError::Io(_) => ErrorKind::MalformedInput,
            LdMatrixError::Validation(_) => ErrorKind::Invariant,
            LdMatrixError::IndexOutOfRange { .. } => ErrorKind::OutOfRange,
        }
    }

    pub(crate) fn check_r2_min(r2_min: f32) -> Result<()> {
        if r2_min.is_finite() && (0.0..=1.0).contains(&r2_min) {
            Ok(())
        } else {
            Err(LdMatrixError::InvalidR2Min(r2_min))
        }
    }

    pub(crate) fn out_of_range(space: IndexSpace, index: i64, bound: usize) -> Self {
        LdMatrixError::IndexOutOfRange {
            space,
            index,
            bound,
        }
    }
}

/// Result alias for LD matrix operations.
pub type Result<T> = std::result::Result<T, LdMatrixError>;
