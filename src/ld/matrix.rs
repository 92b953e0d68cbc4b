use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::LdConfig;
use crate::mapping::{find_hvec, TagToSnpMapping};

use super::clump::ld_clump;
use super::coo::{expand_triplets, CooChunk, CooEntry, ExpandedBatch, LdTriplets};
use super::csr::{sort_coo, CsrLd, LdEntry, LdRow};
use super::diagnostics::{ChunkDiagnostics, CsrDiagnostics, LdMatrixDiagnostics};
use super::error::{IndexSpace, LdMatrixError, Result};
use super::io::read_ld_triplets;
use super::tag_sum::{LdTagSum, TagSumPair, TagSumUpdate, LD_TAG_COMPONENT_ABOVE_R2MIN};
use super::validate::validate_csr;

/// Lifecycle of an [`LdMatrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LdMatrixState {
    /// Nothing ingested since construction or the last clear.
    Empty,
    /// Triplets ingested, CSR not built yet.
    Ingesting,
    /// CSR built and validated; read-only until cleared.
    Finalized,
}

/// LD r² matrix: per-chromosome COO ingestion, CSR finalization, queries.
///
/// ```ignore
/// let mut ld = LdMatrix::new(Arc::new(mapping));
/// ld.ingest(1, &triplets, 0.05)?;
/// ld.finalize(0.05)?;
/// let r2 = ld.find_ld_r2(snp_index, tag_index)?;
/// ```
#[derive(Debug)]
pub struct LdMatrix<M> {
    mapping: Arc<M>,
    config: LdConfig,
    state: LdMatrixState,
    chunks: BTreeMap<u32, CooChunk>,
    combined: CsrLd,
    tag_sums: Option<TagSumPair>,
}

impl<M: TagToSnpMapping> LdMatrix<M> {
    /// Empty matrix with the default configuration.
    pub fn new(mapping: Arc<M>) -> Self {
        Self::with_config(mapping, LdConfig::default())
    }

    /// Empty matrix with an explicit configuration.
    pub fn with_config(mapping: Arc<M>, config: LdConfig) -> Self {
        Self {
            mapping,
            config,
            state: LdMatrixState::Empty,
            chunks: BTreeMap::new(),
            combined: CsrLd::default(),
            tag_sums: None,
        }
    }

    /// The tag/SNP mapping this matrix is keyed by.
    pub fn mapping(&self) -> &M {
        &self.mapping
    }

    /// Active configuration.
    pub fn config(&self) -> &LdConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LdMatrixState {
        self.state
    }

    /// Ingest one batch of triplets into the chunk of `chr_label`.
    ///
    /// `r2_min` and the whole batch are checked before anything is mutated.
    pub fn ingest(&mut self, chr_label: u32, triplets: &LdTriplets, r2_min: f32) -> Result<()> {
        LdMatrixError::check_r2_min(r2_min)?;
        self.check_can_ingest()?;
        triplets.validate(self.mapping.num_snp())?;
        info!(chr_label, length = triplets.len(), "ingesting LD r2 triplets");

        let timer = Instant::now();
        let hvec = find_hvec(self.mapping.mafvec());
        let expanded = expand_triplets(self.mapping.as_ref(), &hvec, triplets, r2_min);
        let added = self.absorb(chr_label, expanded)?;

        info!(
            chr_label,
            added,
            coo_len = self.coo_len(),
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "ingested LD r2 triplets"
        );
        Ok(())
    }

    /// Ingest several batches concurrently, one rayon task per batch.
    ///
    /// Each task expands its batch privately; accumulator updates are then
    /// replayed in batch order, so the outcome is bit-identical to calling
    /// [`ingest`](Self::ingest) on each batch in turn.
    pub fn ingest_parallel(&mut self, batches: &[(u32, LdTriplets)], r2_min: f32) -> Result<()>
    where
        M: Sync,
    {
        LdMatrixError::check_r2_min(r2_min)?;
        self.check_can_ingest()?;
        let num_snp = self.mapping.num_snp();
        for (_, triplets) in batches {
            triplets.validate(num_snp)?;
        }
        info!(batches = batches.len(), "ingesting LD r2 triplets in parallel");

        let timer = Instant::now();
        let hvec = find_hvec(self.mapping.mafvec());
        let mapping = self.mapping.as_ref();
        let expanded: Vec<(u32, ExpandedBatch)> = batches
            .par_iter()
            .map(|(chr_label, triplets)| {
                (*chr_label, expand_triplets(mapping, &hvec, triplets, r2_min))
            })
            .collect();

        let mut added = 0;
        for (chr_label, batch) in expanded {
            added += self.absorb(chr_label, batch)?;
        }

        info!(
            added,
            coo_len = self.coo_len(),
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "ingested LD r2 triplets in parallel"
        );
        Ok(())
    }

    /// Read a binary triplet file and ingest it.
    pub fn ingest_file<P: AsRef<Path>>(&mut self, chr_label: u32, path: P, r2_min: f32) -> Result<()> {
        LdMatrixError::check_r2_min(r2_min)?;
        self.check_can_ingest()?;
        let triplets = read_ld_triplets(path)?;
        self.ingest(chr_label, &triplets, r2_min)
    }

    /// Merge all chunks, add the diagonal, sort, compact and validate.
    ///
    /// COO storage is released. On validation failure the whole matrix is
    /// reset to [`LdMatrixState::Empty`] and the error returned.
    pub fn finalize(&mut self, r2_min: f32) -> Result<()> {
        LdMatrixError::check_r2_min(r2_min)?;
        if self.state == LdMatrixState::Finalized {
            return Err(LdMatrixError::AlreadyFinalized);
        }
        let coo_len = self.coo_len();
        if coo_len == 0 {
            return Err(LdMatrixError::EmptyCoo);
        }
        info!(coo_len, "building LD r2 CSR");
        let timer = Instant::now();

        let mapping = Arc::clone(&self.mapping);
        let tag_to_snp = mapping.tag_to_snp();
        let hvec = find_hvec(mapping.mafvec());

        let mut coo: Vec<CooEntry> = Vec::with_capacity(coo_len + tag_to_snp.len());
        for chunk in std::mem::take(&mut self.chunks).into_values() {
            coo.extend(chunk.into_entries());
        }

        info!(
            count = tag_to_snp.len(),
            "adding r2 = 1.0 diagonal elements to the LD r2 matrix"
        );
        let mut diagonal = Vec::with_capacity(tag_to_snp.len());
        for (tag_index, &snp_index) in tag_to_snp.iter().enumerate() {
            coo.push(CooEntry {
                snp_index,
                tag_index: tag_index as u32,
                r2: 1.0,
            });
            diagonal.push(TagSumUpdate {
                component: LD_TAG_COMPONENT_ABOVE_R2MIN,
                tag_index: tag_index as u32,
                r2: 1.0,
                r2_hvec: hvec[snp_index as usize],
            });
        }
        let num_tag = mapping.num_tag();
        self.tag_sums
            .get_or_insert_with(|| TagSumPair::new(num_tag))
            .apply(&diagonal)?;

        let sort_timer = Instant::now();
        sort_coo(&mut coo, self.config.sort, self.config.parallel_sort_min_len);
        info!(
            elapsed_ms = sort_timer.elapsed().as_millis() as u64,
            "sorted LD r2 elements"
        );

        self.combined = CsrLd::from_sorted_coo(mapping.num_snp(), &coo);
        drop(coo);
        info!(
            nnz = self.combined.nnz(),
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "built LD r2 CSR"
        );

        if let Err(err) = validate_csr(&self.combined, mapping.as_ref(), r2_min) {
            warn!(error = %err, "LD r2 CSR failed validation, discarding it");
            self.clear();
            return Err(err.into());
        }
        self.state = LdMatrixState::Finalized;
        Ok(())
    }

    /// Drop chunks, the CSR arrays and zero the running sums.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.combined = CsrLd::default();
        if let Some(tag_sums) = self.tag_sums.as_mut() {
            tag_sums.clear();
        }
        self.state = LdMatrixState::Empty;
        info!("cleared LD r2 matrix");
    }

    /// r² between `snp_index` and `tag_index`, `None` when not stored.
    pub fn find_ld_r2(&self, snp_index: usize, tag_index: usize) -> Result<Option<f32>> {
        let csr = self.finalized()?;
        self.check_snp(snp_index)?;
        self.check_tag(tag_index)?;
        Ok(csr.find(snp_index, tag_index as u32))
    }

    /// Number of entries stored for one SNP.
    pub fn num_ld_r2_snp(&self, snp_index: usize) -> Result<usize> {
        Ok(self.ld_r2_snp(snp_index)?.len())
    }

    /// Entries stored for one SNP, ascending tag index.
    pub fn ld_r2_snp(&self, snp_index: usize) -> Result<LdRow<'_>> {
        let csr = self.finalized()?;
        self.check_snp(snp_index)?;
        Ok(csr.row(snp_index))
    }

    /// Number of entries stored for SNPs of one chromosome.
    pub fn num_ld_r2_chr(&self, chr_label: u32) -> Result<usize> {
        let csr = self.finalized()?;
        Ok(self
            .chr_snps(chr_label)?
            .map(|snp_index| csr.row_range(snp_index).len())
            .sum())
    }

    /// Entries stored for SNPs of one chromosome, in SNP order.
    pub fn ld_r2_chr(&self, chr_label: u32) -> Result<Vec<LdEntry>> {
        let csr = self.finalized()?;
        Ok(self
            .chr_snps(chr_label)?
            .flat_map(|snp_index| csr.entries_in(snp_index..snp_index + 1))
            .collect())
    }

    /// Number of entries stored for SNPs in `[from, to)`.
    pub fn num_ld_r2_snp_range(&self, from: usize, to: usize) -> Result<usize> {
        let csr = self.finalized()?;
        let range = self.check_range(from, to)?;
        Ok(csr.count_in(range))
    }

    /// Entries stored for SNPs in `[from, to)`, in SNP order.
    pub fn ld_r2_snp_range(
        &self,
        from: usize,
        to: usize,
    ) -> Result<impl Iterator<Item = LdEntry> + '_> {
        let csr = self.finalized()?;
        let range = self.check_range(from, to)?;
        Ok(csr.entries_in(range))
    }

    /// The finalized CSR arrays.
    pub fn csr(&self) -> Result<&CsrLd> {
        self.finalized()
    }

    /// blake3 digest of the finalized CSR arrays.
    pub fn fingerprint(&self) -> Result<blake3::Hash> {
        Ok(self.finalized()?.fingerprint())
    }

    /// Greedy clumping of a per-tag buffer, see [`ld_clump`].
    pub fn ld_clump(&self, r2_threshold: f32, values: &mut [f32]) -> Result<()> {
        let csr = self.finalized()?;
        ld_clump(csr, self.mapping.as_ref(), r2_threshold, values)
    }

    /// Unweighted running sums; `None` before the first ingestion.
    pub fn ld_tag_sum(&self) -> Option<&LdTagSum> {
        self.tag_sums.as_ref().map(|pair| &pair.plain)
    }

    /// Heterozygosity-weighted running sums; `None` before the first
    /// ingestion.
    pub fn ld_tag_sum_adjust_for_hvec(&self) -> Option<&LdTagSum> {
        self.tag_sums.as_ref().map(|pair| &pair.adjust_for_hvec)
    }

    /// Number of COO records currently held by all chunks.
    pub fn coo_len(&self) -> usize {
        self.chunks.values().map(CooChunk::len).sum()
    }

    /// Memory report of chunks, CSR arrays and running sums.
    pub fn diagnostics(&self) -> LdMatrixDiagnostics {
        let (row_start_bytes, tag_index_bytes, r2_bytes) = self.combined.mem_bytes();
        LdMatrixDiagnostics {
            chunks: self
                .chunks
                .iter()
                .map(|(&chr_label, chunk)| ChunkDiagnostics {
                    chr_label,
                    coo_len: chunk.len(),
                    coo_bytes: chunk.mem_bytes(),
                })
                .collect(),
            csr: CsrDiagnostics {
                row_start_len: self.combined.row_start().len(),
                row_start_bytes,
                tag_index_len: self.combined.col_tag_index().len(),
                tag_index_bytes,
                r2_len: self.combined.value_r2().len(),
                r2_bytes,
            },
            tag_sum_bytes: self
                .tag_sums
                .as_ref()
                .map_or(0, |pair| pair.plain.mem_bytes() + pair.adjust_for_hvec.mem_bytes()),
        }
    }

    /// Log the memory report and return the total byte count.
    pub fn log_diagnostics(&self) -> usize {
        self.diagnostics().log()
    }

    fn check_can_ingest(&self) -> Result<()> {
        if self.state == LdMatrixState::Finalized {
            return Err(LdMatrixError::AlreadyFinalized);
        }
        if self.mapping.mafvec().is_empty() {
            return Err(LdMatrixError::MafNotSet);
        }
        Ok(())
    }

    fn absorb(&mut self, chr_label: u32, batch: ExpandedBatch) -> Result<usize> {
        let num_tag = self.mapping.num_tag();
        self.tag_sums
            .get_or_insert_with(|| TagSumPair::new(num_tag))
            .apply(&batch.updates)?;
        let added = batch.entries.len();
        self.chunks.entry(chr_label).or_default().extend(batch.entries);
        self.state = LdMatrixState::Ingesting;
        Ok(added)
    }

    fn finalized(&self) -> Result<&CsrLd> {
        match self.state {
            LdMatrixState::Finalized => Ok(&self.combined),
            _ => Err(LdMatrixError::NotFinalized),
        }
    }

    fn check_snp(&self, snp_index: usize) -> Result<()> {
        let num_snp = self.mapping.num_snp();
        if snp_index >= num_snp {
            return Err(LdMatrixError::out_of_range(
                IndexSpace::Snp,
                snp_index as i64,
                num_snp,
            ));
        }
        Ok(())
    }

    fn check_tag(&self, tag_index: usize) -> Result<()> {
        let num_tag = self.mapping.num_tag();
        if tag_index >= num_tag {
            return Err(LdMatrixError::out_of_range(
                IndexSpace::Tag,
                tag_index as i64,
                num_tag,
            ));
        }
        Ok(())
    }

    fn check_range(&self, from: usize, to: usize) -> Result<Range<usize>> {
        let num_snp = self.mapping.num_snp();
        if to > num_snp {
            return Err(LdMatrixError::out_of_range(IndexSpace::Snp, to as i64, num_snp + 1));
        }
        if from > to {
            return Err(LdMatrixError::out_of_range(IndexSpace::Snp, from as i64, to + 1));
        }
        Ok(from..to)
    }

    fn chr_snps(&self, chr_label: u32) -> Result<impl Iterator<Item = usize> + '_> {
        let chrnumvec = self.mapping.chrnumvec();
        if chrnumvec.is_empty() {
            return Err(LdMatrixError::ChrNumVecNotSet);
        }
        Ok(chrnumvec
            .iter()
            .enumerate()
            .filter(move |(_, &chr)| chr == chr_label)
            .map(|(snp_index, _)| snp_index))
    }
}
