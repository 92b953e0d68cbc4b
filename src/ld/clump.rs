//! Informed LD clumping over a per-tag value buffer.

use std::cmp::Ordering;

use crate::mapping::TagToSnpMapping;

use super::csr::CsrLd;
use super::error::{IndexSpace, LdMatrixError, Result};

/// Clump `values` (one entry per tag) in place.
///
/// Tags are visited by decreasing value, ties by increasing tag index. A
/// visited tag that is still finite is kept, and every other tag with
/// `r2 >= r2_threshold` in its SNP's row is set to NaN. Non-finite inputs
/// are never picked and never overwritten.
pub fn ld_clump<M>(csr: &CsrLd, mapping: &M, r2_threshold: f32, values: &mut [f32]) -> Result<()>
where
    M: TagToSnpMapping + ?Sized,
{
    let num_tag = mapping.num_tag();
    if values.len() != num_tag {
        return Err(LdMatrixError::out_of_range(
            IndexSpace::Buffer,
            values.len() as i64,
            num_tag,
        ));
    }

    let mut order: Vec<usize> = (0..num_tag).filter(|&t| values[t].is_finite()).collect();
    order.sort_by(|&a, &b| {
        values[b]
            .partial_cmp(&values[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let tag_to_snp = mapping.tag_to_snp();
    for lead in order {
        if !values[lead].is_finite() {
            continue;
        }
        let row = csr.row(tag_to_snp[lead] as usize);
        for (tag_index, r2) in row.iter() {
            let tag_index = tag_index as usize;
            if tag_index != lead && r2 >= r2_threshold && values[tag_index].is_finite() {
                values[tag_index] = f32::NAN;
            }
        }
    }
    Ok(())
}
