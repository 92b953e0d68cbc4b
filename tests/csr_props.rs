use std::sync::Arc;

use ldcsr::ld::{LD_TAG_COMPONENT_ABOVE_R2MIN, LD_TAG_COMPONENT_BELOW_R2MIN};
use ldcsr::{LdMatrix, TagIndexMapping, TagToSnpMapping};
use proptest::prelude::*;
mod common;
use common::{all_tag_mapping, lower_triangular, unordered};

const R2_MIN: f32 = 0.1;

fn pair_lists(num_snp: u32) -> impl Strategy<Value = Vec<(u32, u32, f32)>> {
    proptest::collection::vec((0..num_snp, 0..num_snp, 0.0f32..=1.0), 1..120)
}

proptest! {
    #[test]
    fn finalized_structure_is_well_formed(
        num_snp in 2usize..24,
        raw in pair_lists(24),
    ) {
        let raw: Vec<_> = raw
            .into_iter()
            .map(|(a, b, r2)| (a % num_snp as u32, b % num_snp as u32, r2))
            .collect();
        let pairs = unordered(raw);
        prop_assume!(pairs.values().any(|&r2| r2 >= R2_MIN));
        let mapping = Arc::new(all_tag_mapping(num_snp, None));
        let mut ld = LdMatrix::new(Arc::clone(&mapping));
        ld.ingest(1, &lower_triangular(&pairs), R2_MIN).expect("ingestion succeeds");
        ld.finalize(R2_MIN).expect("finalize succeeds");

        let csr = ld.csr().expect("finalized");
        let row_start = csr.row_start();
        prop_assert_eq!(row_start.len(), num_snp + 1);
        prop_assert_eq!(row_start[num_snp], csr.nnz());
        prop_assert!(row_start.windows(2).all(|w| w[0] <= w[1]), "row pointers must not decrease");

        for snp in 0..num_snp {
            let row = ld.ld_r2_snp(snp).expect("row exists");
            prop_assert!(row.tag_index.windows(2).all(|w| w[0] < w[1]), "row must be strictly ascending");
            prop_assert!(row.r2.iter().all(|&v| (R2_MIN..=1.0).contains(&v)));
            prop_assert_eq!(ld.find_ld_r2(snp, snp).expect("in range"), Some(1.0));
        }

        // every kept pair is stored both ways, every dropped pair neither way
        for (&(a, b), &r2) in &pairs {
            let forward = ld.find_ld_r2(a as usize, b as usize).expect("in range");
            let backward = ld.find_ld_r2(b as usize, a as usize).expect("in range");
            prop_assert_eq!(forward, backward);
            if r2 >= R2_MIN {
                prop_assert_eq!(forward, Some(r2));
            } else {
                prop_assert_eq!(forward, None);
            }
        }
        let kept = pairs.values().filter(|&&r2| r2 >= R2_MIN).count();
        prop_assert_eq!(csr.nnz(), num_snp + 2 * kept);
        prop_assert_eq!(ld.num_ld_r2_snp_range(0, num_snp).expect("valid range"), csr.nnz());
        prop_assert_eq!(mapping.num_tag(), num_snp);
    }

    #[test]
    fn running_sums_split_by_threshold(
        raw in pair_lists(12),
    ) {
        let pairs = unordered(raw);
        prop_assume!(pairs.values().any(|&r2| r2 >= R2_MIN));
        let mut ld = LdMatrix::new(Arc::new(all_tag_mapping(12, None)));
        ld.ingest(1, &lower_triangular(&pairs), R2_MIN).expect("ingestion succeeds");
        ld.finalize(R2_MIN).expect("finalize succeeds");

        let sums = ld.ld_tag_sum().expect("sums exist");
        let below = sums.ld_tag_sum_r2(LD_TAG_COMPONENT_BELOW_R2MIN).expect("component");
        let above = sums.ld_tag_sum_r2(LD_TAG_COMPONENT_ABOVE_R2MIN).expect("component");

        for tag in 0..12u32 {
            let mut expect_below = 0.0f64;
            let mut expect_above = 1.0f64;
            for (&(a, b), &r2) in &pairs {
                if a == tag || b == tag {
                    if r2 < R2_MIN {
                        expect_below += r2 as f64;
                    } else {
                        expect_above += r2 as f64;
                    }
                }
            }
            prop_assert!((below[tag as usize] as f64 - expect_below).abs() < 1e-3);
            prop_assert!((above[tag as usize] as f64 - expect_above).abs() < 1e-3);
        }
    }

    #[test]
    fn clear_and_reingest_reproduce_the_structure(
        raw in pair_lists(16),
    ) {
        let pairs = unordered(raw);
        prop_assume!(pairs.values().any(|&r2| r2 >= R2_MIN));
        let triplets = lower_triangular(&pairs);
        let mut ld = LdMatrix::new(Arc::new(all_tag_mapping(16, None)));

        ld.ingest(3, &triplets, R2_MIN).expect("ingestion succeeds");
        ld.finalize(R2_MIN).expect("finalize succeeds");
        let first = ld.fingerprint().expect("finalized");

        ld.clear();
        ld.ingest(3, &triplets, R2_MIN).expect("ingestion succeeds");
        ld.finalize(R2_MIN).expect("finalize succeeds");
        prop_assert_eq!(ld.fingerprint().expect("finalized"), first);
    }

    #[test]
    fn partial_tag_panels_keep_diagonal_and_symmetry(
        num_snp in 2usize..20,
        is_tag in proptest::collection::vec(any::<bool>(), 20),
        causal in proptest::collection::vec(any::<bool>(), 20),
        order in proptest::collection::vec(any::<u32>(), 20),
        raw in pair_lists(20),
    ) {
        // tags in a shuffled order, so tag index differs from snp index
        let mut tags: Vec<u32> = (0..num_snp as u32).filter(|&s| is_tag[s as usize]).collect();
        prop_assume!(!tags.is_empty());
        tags.sort_by_key(|&s| (order[s as usize], s));
        // tags must stay causal-eligible for the structure to be symmetric
        let can_be_causal: Vec<bool> = (0..num_snp).map(|s| is_tag[s] || causal[s]).collect();

        let mut mapping = TagIndexMapping::new(num_snp, &tags).expect("valid tags");
        mapping
            .set_mafvec((0..num_snp).map(|s| 0.05 + 0.02 * s as f32).collect())
            .expect("valid maf");
        mapping.set_snp_can_be_causal(&can_be_causal).expect("valid flags");
        let mapping = Arc::new(mapping);

        let raw: Vec<_> = raw
            .into_iter()
            .map(|(a, b, r2)| (a % num_snp as u32, b % num_snp as u32, r2))
            .collect();
        let pairs = unordered(raw);
        let directed = |row: u32, col: u32| can_be_causal[row as usize] && is_tag[col as usize];
        let stored: usize = pairs
            .iter()
            .filter(|(_, r2)| **r2 >= R2_MIN)
            .map(|(&(a, b), _)| directed(a, b) as usize + directed(b, a) as usize)
            .sum();
        prop_assume!(stored > 0);

        let mut ld = LdMatrix::new(Arc::clone(&mapping));
        ld.ingest(1, &lower_triangular(&pairs), R2_MIN).expect("ingestion succeeds");
        ld.finalize(R2_MIN).expect("finalize succeeds");
        prop_assert_eq!(ld.csr().expect("finalized").nnz(), tags.len() + stored);

        for (tag_index, &snp) in mapping.tag_to_snp().iter().enumerate() {
            prop_assert_eq!(ld.find_ld_r2(snp as usize, tag_index).expect("in range"), Some(1.0));
        }

        for snp in 0..num_snp {
            let row = ld.ld_r2_snp(snp).expect("row exists");
            if !can_be_causal[snp] {
                prop_assert!(row.is_empty(), "ineligible snp must have an empty row");
            }
            let Some(own_tag) = mapping.snp_to_tag(snp) else {
                continue;
            };
            for (tag_index, r2) in row.iter() {
                let partner = mapping.tag_to_snp()[tag_index as usize] as usize;
                prop_assert_eq!(
                    ld.find_ld_r2(partner, own_tag as usize).expect("in range"),
                    Some(r2)
                );
            }
        }

        for (&(a, b), &r2) in &pairs {
            for (row, col) in [(a, b), (b, a)] {
                let Some(col_tag) = mapping.snp_to_tag(col as usize) else {
                    continue;
                };
                let expected = (r2 >= R2_MIN && can_be_causal[row as usize]).then_some(r2);
                prop_assert_eq!(
                    ld.find_ld_r2(row as usize, col_tag as usize).expect("in range"),
                    expected
                );
            }
        }
    }
}
