//! Python bindings that expose the LD matrix via PyO3.
use std::sync::Arc;

use pyo3::{exceptions::PyRuntimeError, prelude::*, types::PyModule};

use crate::ld::{LdMatrix, LdTriplets, LD_TAG_COMPONENT_COUNT};
use crate::mapping::{TagIndexMapping, TagToSnpMapping};

fn runtime_err(err: impl std::fmt::Display) -> PyErr {
    PyRuntimeError::new_err(err.to_string())
}

/// Python-facing LD r2 matrix bound to one tag/SNP mapping.
#[pyclass]
#[derive(Debug)]
pub struct PyLdMatrix {
    inner: LdMatrix<TagIndexMapping>,
}

#[pymethods]
impl PyLdMatrix {
    #[new]
    #[pyo3(signature = (num_snp, tag_indices, mafvec, chrnumvec=None))]
    /// Create the matrix from reference size, tag indices and allele frequencies.
    pub fn new(
        num_snp: usize,
        tag_indices: Vec<u32>,
        mafvec: Vec<f32>,
        chrnumvec: Option<Vec<u32>>,
    ) -> PyResult<Self> {
        let mut mapping = TagIndexMapping::new(num_snp, &tag_indices).map_err(runtime_err)?;
        mapping.set_mafvec(mafvec).map_err(runtime_err)?;
        if let Some(chrnumvec) = chrnumvec {
            mapping.set_chrnumvec(chrnumvec).map_err(runtime_err)?;
        }
        Ok(Self {
            inner: LdMatrix::new(Arc::new(mapping)),
        })
    }

    /// Ingest `(snp_index, other_index, r2)` columns for one chromosome.
    pub fn set_ld_r2_coo(
        &mut self,
        chr_label: u32,
        snp_index: Vec<i32>,
        other_index: Vec<i32>,
        r2: Vec<f32>,
        r2_min: f32,
    ) -> PyResult<()> {
        let triplets = LdTriplets::from_columns(snp_index, other_index, r2).map_err(runtime_err)?;
        self.inner
            .ingest(chr_label, &triplets, r2_min)
            .map_err(runtime_err)
    }

    /// Ingest a binary triplet file for one chromosome.
    pub fn set_ld_r2_coo_from_file(&mut self, chr_label: u32, path: &str, r2_min: f32) -> PyResult<()> {
        self.inner
            .ingest_file(chr_label, path, r2_min)
            .map_err(runtime_err)
    }

    /// Build and validate the CSR structure.
    pub fn set_ld_r2_csr(&mut self, r2_min: f32) -> PyResult<()> {
        self.inner.finalize(r2_min).map_err(runtime_err)
    }

    /// r2 between a SNP and a tag, `None` when not stored.
    pub fn find_ld_r2(&self, snp_index: usize, tag_index: usize) -> PyResult<Option<f32>> {
        self.inner
            .find_ld_r2(snp_index, tag_index)
            .map_err(runtime_err)
    }

    /// `(tag_index, r2)` lists stored for one SNP.
    pub fn retrieve_ld_r2_snp(&self, snp_index: usize) -> PyResult<(Vec<u32>, Vec<f32>)> {
        let row = self.inner.ld_r2_snp(snp_index).map_err(runtime_err)?;
        Ok((row.tag_index.to_vec(), row.r2.to_vec()))
    }

    /// `(snp_index, tag_index, r2)` lists stored for one chromosome.
    pub fn retrieve_ld_r2_chr(&self, chr_label: u32) -> PyResult<(Vec<u32>, Vec<u32>, Vec<f32>)> {
        let entries = self.inner.ld_r2_chr(chr_label).map_err(runtime_err)?;
        Ok(split_entries(entries))
    }

    /// `(snp_index, tag_index, r2)` lists stored for SNPs in `[from, to)`.
    pub fn retrieve_ld_r2_snp_range(
        &self,
        from: usize,
        to: usize,
    ) -> PyResult<(Vec<u32>, Vec<u32>, Vec<f32>)> {
        let entries: Vec<_> = self
            .inner
            .ld_r2_snp_range(from, to)
            .map_err(runtime_err)?
            .collect();
        Ok(split_entries(entries))
    }

    /// Running r2 sum per tag for one component.
    #[pyo3(signature = (component, adjust_for_hvec=false))]
    pub fn retrieve_tag_r2_sum(&self, component: usize, adjust_for_hvec: bool) -> PyResult<Vec<f32>> {
        if component >= LD_TAG_COMPONENT_COUNT {
            return Err(runtime_err(format!("component {component} out of range")));
        }
        let sums = if adjust_for_hvec {
            self.inner.ld_tag_sum_adjust_for_hvec()
        } else {
            self.inner.ld_tag_sum()
        };
        match sums {
            Some(sums) => Ok(sums.ld_tag_sum_r2(component).map_err(runtime_err)?.to_vec()),
            None => Ok(vec![0.0; self.inner.mapping().num_tag()]),
        }
    }

    /// Greedy LD clumping; returns the clumped copy of `values`.
    pub fn perform_ld_clump(&self, r2_threshold: f32, mut values: Vec<f32>) -> PyResult<Vec<f32>> {
        self.inner
            .ld_clump(r2_threshold, &mut values)
            .map_err(runtime_err)?;
        Ok(values)
    }

    /// Drop all LD data and reset the running sums.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Log the memory report and return total bytes.
    pub fn log_diagnostics(&self) -> usize {
        self.inner.log_diagnostics()
    }
}

fn split_entries(entries: Vec<crate::ld::LdEntry>) -> (Vec<u32>, Vec<u32>, Vec<f32>) {
    let mut snp = Vec::with_capacity(entries.len());
    let mut tag = Vec::with_capacity(entries.len());
    let mut r2 = Vec::with_capacity(entries.len());
    for entry in entries {
        snp.push(entry.snp_index);
        tag.push(entry.tag_index);
        r2.push(entry.r2);
    }
    (snp, tag, r2)
}

/// Create Python module.
#[pymodule]
pub fn ldcsr_py(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyLdMatrix>()?;
    Ok(())
}
