//! Tag/reference SNP index mapping.
//!
//! The LD structure is keyed by two index spaces:
//! - `snp_index` in `[0, num_snp)`: position in the reference panel,
//! - `tag_index` in `[0, num_tag)`: position in the GWAS summary statistics.
//!
//! Every tag is exactly one reference SNP. [`TagToSnpMapping`] is the
//! read-only view the LD core consumes; [`TagIndexMapping`] is an in-memory
//! implementation for callers that do not bring their own.

use bitvec::prelude::*;
use thiserror::Error;

/// Read-only view of the tag/SNP index spaces.
pub trait TagToSnpMapping {
    /// Number of reference SNPs.
    fn num_snp(&self) -> usize;

    /// Number of tag SNPs.
    fn num_tag(&self) -> usize;

    /// Minor allele frequency per reference SNP. Empty until populated.
    fn mafvec(&self) -> &[f32];

    /// Whether the reference SNP is present in the GWAS data.
    fn is_tag(&self, snp_index: usize) -> bool;

    /// Tag index of a reference SNP, `None` for non-tag SNPs.
    fn snp_to_tag(&self, snp_index: usize) -> Option<u32>;

    /// Reference SNP index of every tag, length `num_tag`.
    fn tag_to_snp(&self) -> &[u32];

    /// Whether the SNP may be selected as a causal variant.
    fn snp_can_be_causal(&self, snp_index: usize) -> bool;

    /// Chromosome label per reference SNP. Empty when unknown.
    fn chrnumvec(&self) -> &[u32];
}

/// Errors raised while populating a [`TagIndexMapping`].
#[derive(Debug, Error, PartialEq)]
pub enum MappingError {
    /// Tag points outside the reference panel.
    #[error("tag index {tag_index} refers to snp {snp_index}, but num_snp is {num_snp}")]
    TagOutOfRange {
        /// Position in the tag list.
        tag_index: usize,
        /// Offending reference index.
        snp_index: u32,
        /// Reference panel size.
        num_snp: usize,
    },

    /// The same reference SNP was listed twice as a tag.
    #[error("snp {snp_index} listed as a tag more than once")]
    DuplicateTag {
        /// Duplicated reference index.
        snp_index: u32,
    },

    /// Per-SNP vector does not cover the reference panel.
    #[error("{name} has length {actual}, expected num_snp = {expected}")]
    LengthMismatch {
        /// Which vector was rejected.
        name: &'static str,
        /// Supplied length.
        actual: usize,
        /// Required length.
        expected: usize,
    },

    /// Allele frequency outside `[0, 1]` or not finite.
    #[error("invalid allele frequency {value} at snp {snp_index}")]
    InvalidMaf {
        /// Reference index.
        snp_index: usize,
        /// Rejected value.
        value: f32,
    },
}

/// In-memory tag/SNP mapping with MAF, chromosome labels and causal flags.
#[derive(Debug, Clone)]
pub struct TagIndexMapping {
    num_snp: usize,
    tag_to_snp: Vec<u32>,
    snp_to_tag: Vec<Option<u32>>,
    is_tag: BitVec,
    can_be_causal: BitVec,
    mafvec: Vec<f32>,
    chrnumvec: Vec<u32>,
}

impl TagIndexMapping {
    /// Build the mapping from the reference indices of the tag SNPs.
    ///
    /// Order of `tag_indices` defines tag index order. All SNPs start out
    /// causal-eligible; MAF and chromosome labels start out empty.
    pub fn new(num_snp: usize, tag_indices: &[u32]) -> Result<Self, MappingError> {
        let mut snp_to_tag = vec![None; num_snp];
        let mut is_tag = bitvec![0; num_snp];

        for (tag_index, &snp_index) in tag_indices.iter().enumerate() {
            let snp = snp_index as usize;
            if snp >= num_snp {
                return Err(MappingError::TagOutOfRange {
                    tag_index,
                    snp_index,
                    num_snp,
                });
            }
            if is_tag[snp] {
                return Err(MappingError::DuplicateTag { snp_index });
            }
            is_tag.set(snp, true);
            snp_to_tag[snp] = Some(tag_index as u32);
        }

        Ok(Self {
            num_snp,
            tag_to_snp: tag_indices.to_vec(),
            snp_to_tag,
            is_tag,
            can_be_causal: bitvec![1; num_snp],
            mafvec: Vec::new(),
            chrnumvec: Vec::new(),
        })
    }

    /// Populate minor allele frequencies.
    pub fn set_mafvec(&mut self, mafvec: Vec<f32>) -> Result<(), MappingError> {
        self.check_len("mafvec", mafvec.len())?;
        if let Some((snp_index, &value)) = mafvec
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0 || **v > 1.0)
        {
            return Err(MappingError::InvalidMaf { snp_index, value });
        }
        self.mafvec = mafvec;
        Ok(())
    }

    /// Populate per-SNP chromosome labels.
    pub fn set_chrnumvec(&mut self, chrnumvec: Vec<u32>) -> Result<(), MappingError> {
        self.check_len("chrnumvec", chrnumvec.len())?;
        self.chrnumvec = chrnumvec;
        Ok(())
    }

    /// Replace the causal-eligibility flags.
    pub fn set_snp_can_be_causal(&mut self, flags: &[bool]) -> Result<(), MappingError> {
        self.check_len("snp_can_be_causal", flags.len())?;
        self.can_be_causal = flags.iter().copied().collect();
        Ok(())
    }

    fn check_len(&self, name: &'static str, actual: usize) -> Result<(), MappingError> {
        if actual != self.num_snp {
            return Err(MappingError::LengthMismatch {
                name,
                actual,
                expected: self.num_snp,
            });
        }
        Ok(())
    }
}

impl TagToSnpMapping for TagIndexMapping {
    fn num_snp(&self) -> usize {
        self.num_snp
    }

    fn num_tag(&self) -> usize {
        self.tag_to_snp.len()
    }

    fn mafvec(&self) -> &[f32] {
        &self.mafvec
    }

    fn is_tag(&self, snp_index: usize) -> bool {
        self.is_tag[snp_index]
    }

    fn snp_to_tag(&self, snp_index: usize) -> Option<u32> {
        self.snp_to_tag[snp_index]
    }

    fn tag_to_snp(&self) -> &[u32] {
        &self.tag_to_snp
    }

    fn snp_can_be_causal(&self, snp_index: usize) -> bool {
        self.can_be_causal[snp_index]
    }

    fn chrnumvec(&self) -> &[u32] {
        &self.chrnumvec
    }
}

/// Heterozygosity `2·maf·(1-maf)` per SNP.
pub fn find_hvec(mafvec: &[f32]) -> Vec<f32> {
    mafvec
        .iter()
        .map(|&maf| 2.0f32 * maf * (1.0f32 - maf))
        .collect()
}
