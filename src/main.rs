use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ldcsr::ld::read_ld_triplets;
use ldcsr::{LdConfig, LdMatrix, SortStrategy, TagIndexMapping};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ldcsr", about = "Build and validate sparse LD r2 structures")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarise a binary LD triplet file.
    Inspect {
        /// Triplet file (`i64` count, `i32` snp, `i32` snp, `f32` r2 columns).
        file: PathBuf,
        /// Threshold used to count negligible correlations.
        #[arg(long, default_value_t = 0.05)]
        r2_min: f32,
    },
    /// Ingest per-chromosome triplet files, build and validate the CSR matrix.
    Build {
        /// Number of reference SNPs.
        #[arg(long)]
        num_snp: usize,
        /// Reference indices of tag SNPs, one per line.
        #[arg(long)]
        tags: PathBuf,
        /// Minor allele frequency per reference SNP, one per line.
        #[arg(long)]
        maf: PathBuf,
        /// Chromosome label per reference SNP, one per line.
        #[arg(long)]
        chr: Option<PathBuf>,
        /// Triplet file for one chromosome as `<label>=<path>`; repeatable.
        #[arg(long = "ld", required = true)]
        ld: Vec<LdInput>,
        /// Correlations below this value are not stored.
        #[arg(long, default_value_t = 0.05)]
        r2_min: f32,
        /// Sort used before compaction.
        #[arg(long, value_enum, default_value_t = SortArg::Auto)]
        sort: SortArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Auto,
    Sequential,
    Parallel,
}

impl From<SortArg> for SortStrategy {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Auto => SortStrategy::Auto,
            SortArg::Sequential => SortStrategy::Sequential,
            SortArg::Parallel => SortStrategy::Parallel,
        }
    }
}

#[derive(Debug, Clone)]
struct LdInput {
    chr_label: u32,
    path: PathBuf,
}

impl FromStr for LdInput {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (label, path) = s
            .split_once('=')
            .ok_or_else(|| format!("expected <label>=<path>, got '{s}'"))?;
        let chr_label = label
            .parse()
            .map_err(|_| format!("invalid chromosome label '{label}'"))?;
        Ok(Self {
            chr_label,
            path: PathBuf::from(path),
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LDCSR_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { file, r2_min } => run_inspect(file, r2_min)?,
        Commands::Build {
            num_snp,
            tags,
            maf,
            chr,
            ld,
            r2_min,
            sort,
        } => run_build(num_snp, tags, maf, chr, ld, r2_min, sort)?,
    }

    Ok(())
}

fn run_inspect(path: PathBuf, r2_min: f32) -> Result<()> {
    let triplets = read_ld_triplets(&path)
        .with_context(|| format!("failed to read LD triplets from {}", path.display()))?;

    let (mut min, mut max) = (f32::INFINITY, f32::NEG_INFINITY);
    let (mut below, mut self_pairs, mut non_finite) = (0usize, 0usize, 0usize);
    for (a, b, r2) in triplets.iter() {
        if a == b {
            self_pairs += 1;
        }
        if !r2.is_finite() {
            non_finite += 1;
            continue;
        }
        min = min.min(r2);
        max = max.max(r2);
        if r2 < r2_min {
            below += 1;
        }
    }

    println!("file\t{}", path.display());
    println!("triplets\t{}", triplets.len());
    if min <= max {
        println!("r2_min_observed\t{min}");
        println!("r2_max_observed\t{max}");
    }
    println!("below_r2_min\t{below}");
    println!("self_pairs\t{self_pairs}");
    println!("non_finite\t{non_finite}");
    Ok(())
}

fn run_build(
    num_snp: usize,
    tags_path: PathBuf,
    maf_path: PathBuf,
    chr_path: Option<PathBuf>,
    inputs: Vec<LdInput>,
    r2_min: f32,
    sort: SortArg,
) -> Result<()> {
    let tags: Vec<u32> = read_column(&tags_path)?;
    let mut mapping = TagIndexMapping::new(num_snp, &tags)
        .with_context(|| format!("invalid tag indices in {}", tags_path.display()))?;
    mapping
        .set_mafvec(read_column(&maf_path)?)
        .with_context(|| format!("invalid allele frequencies in {}", maf_path.display()))?;
    if let Some(chr_path) = &chr_path {
        mapping
            .set_chrnumvec(read_column(chr_path)?)
            .with_context(|| format!("invalid chromosome labels in {}", chr_path.display()))?;
    }

    let config = LdConfig::new().with_sort(sort.into());
    let mut ld = LdMatrix::with_config(Arc::new(mapping), config);

    for input in &inputs {
        ld.ingest_file(input.chr_label, &input.path, r2_min)
            .with_context(|| {
                format!(
                    "failed to ingest chromosome {} from {}",
                    input.chr_label,
                    input.path.display()
                )
            })?;
    }
    ld.finalize(r2_min).context("failed to build LD r2 matrix")?;

    let report = ld.diagnostics();
    println!("nnz\t{}", ld.csr()?.nnz());
    println!("row_start_bytes\t{}", report.csr.row_start_bytes);
    println!("tag_index_bytes\t{}", report.csr.tag_index_bytes);
    println!("r2_bytes\t{}", report.csr.r2_bytes);
    println!("tag_sum_bytes\t{}", report.tag_sum_bytes);
    println!("total_bytes\t{}", report.total_bytes());
    println!("fingerprint\t{}", ld.fingerprint()?.to_hex());
    Ok(())
}

fn read_column<T>(path: &Path) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(line_no, line)| {
            line.trim().parse().map_err(|err| {
                anyhow!(
                    "{}: invalid value '{}' on line {}: {}",
                    path.display(),
                    line.trim(),
                    line_no + 1,
                    err
                )
            })
        })
        .collect()
}
