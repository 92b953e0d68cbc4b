//! Structural validation of a compacted LD matrix.
//!
//! Checks run in a fixed order and stop at the first violation:
//! 1. row pointers: length, bounds, monotone, last == nnz
//! 2. column/value arrays: equal length, tag indices in range
//! 3. r² values finite and inside `[r2_min, 1]`
//! 4. no repeated tag index inside a row
//! 5. every tag SNP row holds its own diagonal with r² = 1.0
//! 6. symmetry between tag SNPs, compared bit for bit

use std::time::Instant;

use tracing::info;

use crate::mapping::TagToSnpMapping;

use super::csr::CsrLd;
use super::error::ValidationError;

/// Run every structural check against `csr`.
pub fn validate_csr<M>(csr: &CsrLd, mapping: &M, r2_min: f32) -> Result<(), ValidationError>
where
    M: TagToSnpMapping + ?Sized,
{
    let timer = Instant::now();
    info!(nnz = csr.nnz(), "validating LD r2 CSR structure");

    check_row_start(csr, mapping.num_snp())?;
    check_columns(csr, mapping.num_tag())?;
    check_values(csr, r2_min)?;
    check_no_duplicates(csr, mapping.num_snp())?;
    check_diagonal(csr, mapping)?;
    check_symmetry(csr, mapping)?;

    info!(
        elapsed_ms = timer.elapsed().as_millis() as u64,
        "LD r2 CSR structure is valid"
    );
    Ok(())
}

fn check_row_start(csr: &CsrLd, num_snp: usize) -> Result<(), ValidationError> {
    let row_start = csr.row_start();
    let nnz = csr.value_r2().len();

    if row_start.len() != num_snp + 1 {
        return Err(ValidationError::RowStartLength {
            actual: row_start.len(),
            expected: num_snp + 1,
        });
    }
    if let Some((snp_index, &value)) = row_start.iter().enumerate().find(|(_, &v)| v > nnz) {
        return Err(ValidationError::RowStartOutOfBounds {
            snp_index,
            value,
            nnz,
        });
    }
    if let Some(i) = (1..row_start.len()).find(|&i| row_start[i - 1] > row_start[i]) {
        return Err(ValidationError::RowStartNotMonotone {
            snp_index: i,
            value: row_start[i],
            prev_value: row_start[i - 1],
        });
    }
    let last = row_start[num_snp];
    if last != nnz {
        return Err(ValidationError::RowStartEnd { last, nnz });
    }
    Ok(())
}

fn check_columns(csr: &CsrLd, num_tag: usize) -> Result<(), ValidationError> {
    let tags = csr.col_tag_index();
    if tags.len() != csr.value_r2().len() {
        return Err(ValidationError::ColumnLengthMismatch {
            tags: tags.len(),
            values: csr.value_r2().len(),
        });
    }
    match tags.iter().position(|&t| t as usize >= num_tag) {
        Some(position) => Err(ValidationError::TagIndexOutOfRange {
            position,
            tag_index: tags[position],
            num_tag,
        }),
        None => Ok(()),
    }
}

fn check_values(csr: &CsrLd, r2_min: f32) -> Result<(), ValidationError> {
    let values = csr.value_r2();
    // written so that NaN fails the range test
    let in_range = |v: f32| v.is_finite() && v >= r2_min && v <= 1.0;
    match values.iter().position(|&v| !in_range(v)) {
        Some(position) => Err(ValidationError::R2OutOfRange {
            position,
            value: values[position],
            r2_min,
        }),
        None => Ok(()),
    }
}

fn check_no_duplicates(csr: &CsrLd, num_snp: usize) -> Result<(), ValidationError> {
    for snp_index in 0..num_snp {
        let row = csr.row(snp_index);
        if let Some(pair) = row.tag_index.windows(2).find(|w| w[0] == w[1]) {
            return Err(ValidationError::DuplicateTagIndex {
                snp_index,
                tag_index: pair[0],
            });
        }
    }
    Ok(())
}

fn check_diagonal<M>(csr: &CsrLd, mapping: &M) -> Result<(), ValidationError>
where
    M: TagToSnpMapping + ?Sized,
{
    for (tag_index, &snp) in mapping.tag_to_snp().iter().enumerate() {
        let snp_index = snp as usize;
        let row = csr.row(snp_index);
        let has_diagonal = row
            .iter()
            .any(|(t, r2)| t as usize == tag_index && r2 == 1.0);
        if !has_diagonal {
            return Err(ValidationError::MissingDiagonal {
                snp_index,
                tag_index: tag_index as u32,
            });
        }
    }
    Ok(())
}

fn check_symmetry<M>(csr: &CsrLd, mapping: &M) -> Result<(), ValidationError>
where
    M: TagToSnpMapping + ?Sized,
{
    let tag_to_snp = mapping.tag_to_snp();
    for snp_index in 0..mapping.num_snp() {
        let Some(own_tag) = mapping.snp_to_tag(snp_index) else {
            continue;
        };
        for (tag_index, r2) in csr.row(snp_index).iter() {
            let partner = tag_to_snp[tag_index as usize] as usize;
            let reverse = csr.find(partner, own_tag);
            match reverse {
                Some(value) if value.is_finite() && value.to_bits() == r2.to_bits() => {}
                _ => {
                    return Err(ValidationError::Asymmetric {
                        snp_index,
                        tag_index,
                        r2,
                        reverse,
                    })
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::TagIndexMapping;

    // two snps, both tags, r2(0,1) = 0.5
    fn valid() -> (CsrLd, TagIndexMapping) {
        let csr = CsrLd::from_parts(vec![0, 2, 4], vec![0, 1, 0, 1], vec![1.0, 0.5, 0.5, 1.0]);
        (csr, TagIndexMapping::new(2, &[0, 1]).unwrap())
    }

    #[test]
    fn accepts_consistent_structure() {
        let (csr, mapping) = valid();
        assert_eq!(validate_csr(&csr, &mapping, 0.1), Ok(()));
    }

    #[test]
    fn detects_asymmetry() {
        let (_, mapping) = valid();
        let csr = CsrLd::from_parts(vec![0, 2, 4], vec![0, 1, 0, 1], vec![1.0, 0.5, 0.6, 1.0]);
        assert_eq!(
            validate_csr(&csr, &mapping, 0.1),
            Err(ValidationError::Asymmetric {
                snp_index: 0,
                tag_index: 1,
                r2: 0.5,
                reverse: Some(0.6),
            })
        );
    }

    #[test]
    fn nan_values_are_out_of_range() {
        let (_, mapping) = valid();
        let csr = CsrLd::from_parts(vec![0, 2, 4], vec![0, 1, 0, 1], vec![1.0, f32::NAN, 0.5, 1.0]);
        assert!(matches!(
            validate_csr(&csr, &mapping, 0.1),
            Err(ValidationError::R2OutOfRange { position: 1, .. })
        ));
    }
}
