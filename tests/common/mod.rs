#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use ldcsr::{LdMatrix, LdTriplets, TagIndexMapping};

/// Three SNPs, tags on snps 0 and 2, all causal-eligible.
pub fn small_mapping() -> TagIndexMapping {
    let mut mapping = TagIndexMapping::new(3, &[0, 2]).expect("valid tags");
    mapping
        .set_mafvec(vec![0.1, 0.2, 0.3])
        .expect("valid maf");
    mapping
}

pub fn small_matrix() -> LdMatrix<TagIndexMapping> {
    LdMatrix::new(Arc::new(small_mapping()))
}

pub fn triplets(entries: &[(i32, i32, f32)]) -> LdTriplets {
    let mut out = LdTriplets::new();
    for &(a, b, r2) in entries {
        out.push(a, b, r2);
    }
    out
}

/// Lower-triangular batch: each unordered pair at most once, no diagonal.
pub fn lower_triangular(pairs: &BTreeMap<(u32, u32), f32>) -> LdTriplets {
    let mut out = LdTriplets::new();
    for (&(a, b), &r2) in pairs {
        if a == b {
            continue;
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        out.push(hi as i32, lo as i32, r2);
    }
    out
}

/// Deduplicate unordered pairs, keeping the first value seen.
pub fn unordered(pairs: Vec<(u32, u32, f32)>) -> BTreeMap<(u32, u32), f32> {
    let mut out = BTreeMap::new();
    for (a, b, r2) in pairs {
        if a == b {
            continue;
        }
        out.entry((a.min(b), a.max(b))).or_insert(r2);
    }
    out
}

/// Every SNP is a causal-eligible tag; `maf` spread over `(0, 0.5)`.
pub fn all_tag_mapping(num_snp: usize, chrnumvec: Option<Vec<u32>>) -> TagIndexMapping {
    let tags: Vec<u32> = (0..num_snp as u32).collect();
    let mut mapping = TagIndexMapping::new(num_snp, &tags).expect("valid tags");
    mapping
        .set_mafvec((0..num_snp).map(|i| 0.01 + 0.48 * (i as f32 / num_snp as f32)).collect())
        .expect("valid maf");
    if let Some(chrnumvec) = chrnumvec {
        mapping.set_chrnumvec(chrnumvec).expect("valid chromosome labels");
    }
    mapping
}

/// Deterministic unordered pairs inside `[lo, hi)` drawn with splitmix64.
pub fn seeded_pairs(seed: u64, lo: u32, hi: u32, count: usize) -> BTreeMap<(u32, u32), f32> {
    let mut state = seed;
    let mut next = move || {
        state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    };
    let span = (hi - lo) as u64;
    let mut pairs = Vec::with_capacity(count);
    for _ in 0..count {
        let a = lo + (next() % span) as u32;
        let b = lo + (next() % span) as u32;
        let r2 = (next() % 1000) as f32 / 1000.0;
        pairs.push((a, b, r2));
    }
    unordered(pairs)
}
