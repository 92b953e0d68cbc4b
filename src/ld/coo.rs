//! Triplet batches and coordinate-list (COO) chunks.

use crate::mapping::TagToSnpMapping;

use super::error::{IndexSpace, LdMatrixError, Result};
use super::tag_sum::{TagSumUpdate, LD_TAG_COMPONENT_ABOVE_R2MIN, LD_TAG_COMPONENT_BELOW_R2MIN};

/// A batch of `(snp, other snp, r2)` correlations, stored column-wise.
///
/// Input is expected lower-triangular: no self pairs and no unordered pair
/// listed twice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LdTriplets {
    snp_index: Vec<i32>,
    other_index: Vec<i32>,
    r2: Vec<f32>,
}

impl LdTriplets {
    /// Empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Batch from three parallel columns of equal length.
    pub fn from_columns(snp_index: Vec<i32>, other_index: Vec<i32>, r2: Vec<f32>) -> Result<Self> {
        if snp_index.len() != other_index.len() || snp_index.len() != r2.len() {
            return Err(LdMatrixError::ColumnLengthMismatch {
                snp: snp_index.len(),
                other: other_index.len(),
                r2: r2.len(),
            });
        }
        Ok(Self {
            snp_index,
            other_index,
            r2,
        })
    }

    /// Append one triplet.
    pub fn push(&mut self, snp_index: i32, other_index: i32, r2: f32) {
        self.snp_index.push(snp_index);
        self.other_index.push(other_index);
        self.r2.push(r2);
    }

    /// Number of triplets.
    pub fn len(&self) -> usize {
        self.r2.len()
    }

    /// Whether the batch holds no triplets.
    pub fn is_empty(&self) -> bool {
        self.r2.is_empty()
    }

    /// First endpoint column.
    pub fn snp_index(&self) -> &[i32] {
        &self.snp_index
    }

    /// Second endpoint column.
    pub fn other_index(&self) -> &[i32] {
        &self.other_index
    }

    /// r² column.
    pub fn r2(&self) -> &[f32] {
        &self.r2
    }

    /// Iterate triplets in input order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, f32)> + '_ {
        self.snp_index
            .iter()
            .zip(&self.other_index)
            .zip(&self.r2)
            .map(|((&a, &b), &r2)| (a, b, r2))
    }

    /// Check every triplet against the reference panel without touching any
    /// state: indices in range, no self pair, finite r².
    pub fn validate(&self, num_snp: usize) -> Result<()> {
        for (position, (a, b, r2)) in self.iter().enumerate() {
            for index in [a, b] {
                if index < 0 || index as usize >= num_snp {
                    return Err(LdMatrixError::out_of_range(
                        IndexSpace::Snp,
                        index as i64,
                        num_snp,
                    ));
                }
            }
            if a == b {
                return Err(LdMatrixError::SelfPair {
                    position,
                    snp_index: a,
                });
            }
            if !r2.is_finite() {
                return Err(LdMatrixError::NonFiniteR2 {
                    position,
                    value: r2,
                });
            }
        }
        Ok(())
    }
}

/// One directed COO record: causal SNP row, tag column, r².
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CooEntry {
    /// Row (reference index of the causal-eligible endpoint).
    pub snp_index: u32,
    /// Column (tag index of the other endpoint).
    pub tag_index: u32,
    /// Squared correlation.
    pub r2: f32,
}

impl CooEntry {
    /// Bytes per record as accounted by diagnostics.
    pub const MEM_BYTES: usize =
        std::mem::size_of::<u32>() + std::mem::size_of::<u32>() + std::mem::size_of::<f32>();
}

/// Appendable COO list for one chromosome (or ingestion batch).
#[derive(Debug, Clone, Default)]
pub struct CooChunk {
    entries: Vec<CooEntry>,
}

impl CooChunk {
    /// Empty chunk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records in insertion order.
    pub fn entries(&self) -> &[CooEntry] {
        &self.entries
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the chunk holds no records.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append records.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = CooEntry>) {
        self.entries.extend(entries);
    }

    /// Heap bytes used by the records.
    pub fn mem_bytes(&self) -> usize {
        self.entries.len() * CooEntry::MEM_BYTES
    }

    /// Drop all records and release their memory.
    pub fn clear(&mut self) {
        self.entries = Vec::new();
    }

    pub(crate) fn into_entries(self) -> Vec<CooEntry> {
        self.entries
    }
}

/// Output of [`expand_triplets`]: COO records plus accumulator updates.
#[derive(Debug, Default)]
pub struct ExpandedBatch {
    /// Directed records to append to a chunk.
    pub entries: Vec<CooEntry>,
    /// Accumulator updates in the order they must be applied.
    pub updates: Vec<TagSumUpdate>,
}

/// Expand a validated batch into directed COO records and running-sum
/// updates.
///
/// Every triplet touching a tag contributes to the running sums whatever
/// its r². Only triplets with `r2 >= r2_min` become COO records, one per
/// direction whose row SNP is causal-eligible and whose column SNP is a
/// tag.
pub fn expand_triplets<M>(
    mapping: &M,
    hvec: &[f32],
    triplets: &LdTriplets,
    r2_min: f32,
) -> ExpandedBatch
where
    M: TagToSnpMapping + ?Sized,
{
    let mut out = ExpandedBatch {
        entries: Vec::with_capacity(2 * triplets.len()),
        updates: Vec::with_capacity(2 * triplets.len()),
    };

    for (a, b, r2) in triplets.iter() {
        let (a, b) = (a as usize, b as usize);
        let component = if r2 < r2_min {
            LD_TAG_COMPONENT_BELOW_R2MIN
        } else {
            LD_TAG_COMPONENT_ABOVE_R2MIN
        };
        let tag_a = mapping.snp_to_tag(a);
        let tag_b = mapping.snp_to_tag(b);

        if let Some(tag_index) = tag_b {
            out.updates.push(TagSumUpdate {
                component,
                tag_index,
                r2,
                r2_hvec: r2 * hvec[a],
            });
        }
        if let Some(tag_index) = tag_a {
            out.updates.push(TagSumUpdate {
                component,
                tag_index,
                r2,
                r2_hvec: r2 * hvec[b],
            });
        }

        if r2 < r2_min {
            continue;
        }
        if let Some(tag_index) = tag_b {
            if mapping.snp_can_be_causal(a) {
                out.entries.push(CooEntry {
                    snp_index: a as u32,
                    tag_index,
                    r2,
                });
            }
        }
        if let Some(tag_index) = tag_a {
            if mapping.snp_can_be_causal(b) {
                out.entries.push(CooEntry {
                    snp_index: b as u32,
                    tag_index,
                    r2,
                });
            }
        }
    }

    out
}
