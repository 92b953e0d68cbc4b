//! Per-component running sums of LD contributions, keyed by tag.
//!
//! Each slot `(component, tag_index)` accumulates both `Σ value` and
//! `Σ value²`. The core keeps two instances: one fed with raw r², one with
//! r² weighted by the heterozygosity of the opposite endpoint.

use super::error::{IndexSpace, LdMatrixError, Result};

/// Component receiving contributions with `r2 < r2_min`.
pub const LD_TAG_COMPONENT_BELOW_R2MIN: usize = 0;
/// Component receiving contributions with `r2 >= r2_min` and the diagonal.
pub const LD_TAG_COMPONENT_ABOVE_R2MIN: usize = 1;
/// Number of components the LD core uses.
pub const LD_TAG_COMPONENT_COUNT: usize = 2;

/// Fixed-size accumulator over `(component, tag_index)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LdTagSum {
    num_tag: usize,
    r2: Vec<Vec<f32>>,
    r4: Vec<Vec<f32>>,
}

impl LdTagSum {
    /// Zero-initialised accumulator with `num_components × num_tag` slots.
    pub fn new(num_components: usize, num_tag: usize) -> Self {
        Self {
            num_tag,
            r2: vec![vec![0.0; num_tag]; num_components],
            r4: vec![vec![0.0; num_tag]; num_components],
        }
    }

    /// Number of components.
    pub fn num_components(&self) -> usize {
        self.r2.len()
    }

    /// Number of tags.
    pub fn num_tag(&self) -> usize {
        self.num_tag
    }

    /// Add `value` (and `value²`) into slot `(component, tag_index)`.
    pub fn store(&mut self, component: usize, tag_index: usize, value: f32) -> Result<()> {
        self.check(component, tag_index)?;
        self.r2[component][tag_index] += value;
        self.r4[component][tag_index] += value * value;
        Ok(())
    }

    /// Reset every slot to zero.
    pub fn clear(&mut self) {
        for row in self.r2.iter_mut().chain(self.r4.iter_mut()) {
            row.iter_mut().for_each(|v| *v = 0.0);
        }
    }

    /// Accumulated `Σ value` at `(component, tag_index)`.
    pub fn r2(&self, component: usize, tag_index: usize) -> Result<f32> {
        self.check(component, tag_index)?;
        Ok(self.r2[component][tag_index])
    }

    /// Accumulated `Σ value²` at `(component, tag_index)`.
    pub fn r4(&self, component: usize, tag_index: usize) -> Result<f32> {
        self.check(component, tag_index)?;
        Ok(self.r4[component][tag_index])
    }

    /// All `Σ value` slots of one component, indexed by tag.
    pub fn ld_tag_sum_r2(&self, component: usize) -> Result<&[f32]> {
        self.check_component(component)?;
        Ok(&self.r2[component])
    }

    /// All `Σ value²` slots of one component, indexed by tag.
    pub fn ld_tag_sum_r4(&self, component: usize) -> Result<&[f32]> {
        self.check_component(component)?;
        Ok(&self.r4[component])
    }

    /// `Σ value` per tag, summed over components.
    pub fn ld_sum_r2(&self) -> Vec<f32> {
        sum_components(&self.r2, self.num_tag)
    }

    /// `Σ value²` per tag, summed over components.
    pub fn ld_sum_r4(&self) -> Vec<f32> {
        sum_components(&self.r4, self.num_tag)
    }

    /// Heap bytes held by the slots.
    pub fn mem_bytes(&self) -> usize {
        2 * self.num_components() * self.num_tag * std::mem::size_of::<f32>()
    }

    fn check_component(&self, component: usize) -> Result<()> {
        if component >= self.num_components() {
            return Err(LdMatrixError::out_of_range(
                IndexSpace::Component,
                component as i64,
                self.num_components(),
            ));
        }
        Ok(())
    }

    fn check(&self, component: usize, tag_index: usize) -> Result<()> {
        self.check_component(component)?;
        if tag_index >= self.num_tag {
            return Err(LdMatrixError::out_of_range(
                IndexSpace::Tag,
                tag_index as i64,
                self.num_tag,
            ));
        }
        Ok(())
    }
}

fn sum_components(slots: &[Vec<f32>], num_tag: usize) -> Vec<f32> {
    let mut total = vec![0.0f32; num_tag];
    for row in slots {
        for (acc, v) in total.iter_mut().zip(row) {
            *acc += v;
        }
    }
    total
}

/// One pending `store` call, recorded by an ingestion task and replayed
/// later on the shared accumulators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagSumUpdate {
    /// Target component.
    pub component: usize,
    /// Target tag.
    pub tag_index: u32,
    /// Unweighted contribution.
    pub r2: f32,
    /// Contribution weighted by the opposite endpoint's heterozygosity.
    pub r2_hvec: f32,
}

/// The unweighted and hvec-weighted accumulators, updated together.
#[derive(Debug, Clone, PartialEq)]
pub struct TagSumPair {
    /// Raw r² sums.
    pub plain: LdTagSum,
    /// r² sums weighted by heterozygosity.
    pub adjust_for_hvec: LdTagSum,
}

impl TagSumPair {
    /// Both accumulators with [`LD_TAG_COMPONENT_COUNT`] components.
    pub fn new(num_tag: usize) -> Self {
        Self {
            plain: LdTagSum::new(LD_TAG_COMPONENT_COUNT, num_tag),
            adjust_for_hvec: LdTagSum::new(LD_TAG_COMPONENT_COUNT, num_tag),
        }
    }

    /// Replay recorded updates in order.
    pub fn apply(&mut self, updates: &[TagSumUpdate]) -> Result<()> {
        for update in updates {
            let tag = update.tag_index as usize;
            self.adjust_for_hvec
                .store(update.component, tag, update.r2_hvec)?;
            self.plain.store(update.component, tag, update.r2)?;
        }
        Ok(())
    }

    /// Reset both accumulators.
    pub fn clear(&mut self) {
        self.plain.clear();
        self.adjust_for_hvec.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_accumulates_r2_and_r4() {
        let mut sum = LdTagSum::new(2, 3);
        sum.store(1, 2, 0.5).unwrap();
        sum.store(1, 2, 0.25).unwrap();
        sum.store(0, 2, 0.5).unwrap();
        assert_eq!(sum.r2(1, 2).unwrap(), 0.75);
        assert_eq!(sum.r4(1, 2).unwrap(), 0.3125);
        assert_eq!(sum.ld_tag_sum_r2(1).unwrap(), &[0.0, 0.0, 0.75]);
        assert_eq!(sum.ld_sum_r2(), vec![0.0, 0.0, 1.25]);
        assert_eq!(sum.ld_sum_r4(), vec![0.0, 0.0, 0.5625]);
    }

    #[test]
    fn store_rejects_out_of_range() {
        let mut sum = LdTagSum::new(2, 3);
        let err = sum.store(2, 0, 1.0).unwrap_err();
        assert!(matches!(
            err,
            LdMatrixError::IndexOutOfRange {
                space: IndexSpace::Component,
                index: 2,
                bound: 2
            }
        ));
        let err = sum.store(0, 3, 1.0).unwrap_err();
        assert!(matches!(
            err,
            LdMatrixError::IndexOutOfRange {
                space: IndexSpace::Tag,
                ..
            }
        ));
        assert_eq!(sum, LdTagSum::new(2, 3));
    }

    #[test]
    fn clear_zeroes_everything() {
        let mut sum = LdTagSum::new(2, 2);
        sum.store(0, 0, 0.3).unwrap();
        sum.store(1, 1, 0.7).unwrap();
        sum.clear();
        assert_eq!(sum, LdTagSum::new(2, 2));
    }

    #[test]
    fn pair_replays_updates() {
        let mut pair = TagSumPair::new(2);
        pair.apply(&[
            TagSumUpdate {
                component: LD_TAG_COMPONENT_ABOVE_R2MIN,
                tag_index: 1,
                r2: 0.5,
                r2_hvec: 0.25,
            },
            TagSumUpdate {
                component: LD_TAG_COMPONENT_BELOW_R2MIN,
                tag_index: 0,
                r2: 0.01,
                r2_hvec: 0.005,
            },
        ])
        .unwrap();
        assert_eq!(pair.plain.r2(LD_TAG_COMPONENT_ABOVE_R2MIN, 1).unwrap(), 0.5);
        assert_eq!(
            pair.adjust_for_hvec
                .r2(LD_TAG_COMPONENT_ABOVE_R2MIN, 1)
                .unwrap(),
            0.25
        );
        assert_eq!(pair.plain.r2(LD_TAG_COMPONENT_BELOW_R2MIN, 0).unwrap(), 0.01);
    }
}
