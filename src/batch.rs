//! Batch orchestration.
//!
//! Turns a TOML manifest or a folder of FASTA targets into unit requests and
//! runs them with bounded concurrency. A failed unit is reported and the
//! batch carries on.

use crate::pipeline::{UnitOutcome, UnitRequest};
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use walkdir::WalkDir;

/// A batch manifest: one `[[jobs]]` table per ligand/target pair.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub drug_name: Option<String>,
    #[serde(default)]
    pub smiles: Option<String>,
    pub fasta_path: String,
    #[serde(default)]
    pub outdir: Option<PathBuf>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Folder-safe label: alphanumerics, `-` and `_` survive, everything else
/// becomes `_`; runs of `_` collapse and edge `_` are trimmed.
pub fn slugify(s: &str) -> String {
    let mut slug = String::new();

    for c in s.trim().chars() {
        let c = if c.is_alphanumeric() || c == '-' || c == '_' {
            c
        } else {
            '_'
        };
        if c == '_' && slug.ends_with('_') {
            continue;
        }
        slug.push(c);
    }

    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "item".to_string()
    } else {
        slug.to_string()
    }
}

/// First 8 hex digits of the BLAKE3 hash of a SMILES string.
pub fn smiles_hash(smiles: &str) -> String {
    blake3::hash(smiles.as_bytes()).to_hex().as_str()[..8].to_string()
}

/// Ligand part of a default output folder name.
pub fn ligand_label(drug_name: Option<&str>, smiles: Option<&str>) -> String {
    match (smiles, drug_name) {
        (Some(smiles), _) => format!("smiles_{}", smiles_hash(smiles)),
        (None, Some(name)) => slugify(name),
        (None, None) => "item".to_string(),
    }
}

/// Default output folder: `<outroot>/<fasta stem>__<ligand label>`.
pub fn outdir_for(
    outroot: &Path,
    fasta_path: &Path,
    drug_name: Option<&str>,
    smiles: Option<&str>,
) -> PathBuf {
    let stem = fasta_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    outroot.join(format!("{}__{}", stem, ligand_label(drug_name, smiles)))
}

/// Turn manifest jobs into unit requests. Jobs without a ligand are skipped.
pub fn plan_manifest(manifest: &Manifest, outroot: &Path) -> Vec<UnitRequest> {
    let mut requests = Vec::new();

    for (i, job) in manifest.jobs.iter().enumerate() {
        let drug_name = trimmed(&job.drug_name);
        let smiles = trimmed(&job.smiles);
        let fasta_path = PathBuf::from(job.fasta_path.trim().replace('\\', "/"));

        if drug_name.is_none() && smiles.is_none() {
            warn!(
                "Skipping job {}: need at least drug_name or smiles ({})",
                i + 1,
                fasta_path.display()
            );
            continue;
        }

        let outdir = job
            .outdir
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| {
                outdir_for(outroot, &fasta_path, drug_name.as_deref(), smiles.as_deref())
            });

        requests.push(UnitRequest {
            fasta_path,
            drug_name,
            smiles,
            outdir,
        });
    }

    requests
}

/// Every `*.fasta` file directly inside `dir`, sorted by path.
pub fn discover_targets(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut targets = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry =
            entry.with_context(|| format!("Failed to list targets in {}", dir.display()))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|e| e == "fasta") {
            targets.push(path.to_path_buf());
        }
    }

    targets.sort();
    Ok(targets)
}

/// One ligand against every target.
pub fn plan_sweep(
    targets: &[PathBuf],
    drug_name: Option<&str>,
    smiles: Option<&str>,
    outroot: &Path,
) -> Vec<UnitRequest> {
    let drug_name = drug_name.map(str::trim).filter(|s| !s.is_empty());
    let smiles = smiles.map(str::trim).filter(|s| !s.is_empty());

    targets
        .iter()
        .map(|fasta| UnitRequest {
            fasta_path: fasta.clone(),
            drug_name: drug_name.map(String::from),
            smiles: smiles.map(String::from),
            outdir: outdir_for(outroot, fasta, drug_name, smiles),
        })
        .collect()
}

/// Tally of a finished batch.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub completed: usize,
    pub with_data: usize,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.completed + self.failed.len()
    }
}

fn progress_bar(len: usize, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// Run every request with at most `concurrency` in flight.
pub async fn run_units<F, Fut>(
    requests: Vec<UnitRequest>,
    concurrency: usize,
    show_progress: bool,
    run: F,
) -> BatchSummary
where
    F: Fn(UnitRequest) -> Fut,
    Fut: Future<Output = Result<UnitOutcome>>,
{
    let pb = progress_bar(requests.len(), show_progress);
    let mut summary = BatchSummary::default();

    let mut results = stream::iter(requests)
        .map(|request| {
            let outdir = request.outdir.clone();
            let fut = run(request);
            async move { (outdir, fut.await) }
        })
        .buffer_unordered(concurrency.max(1));

    while let Some((outdir, result)) = results.next().await {
        match result {
            Ok(outcome) => {
                info!("{} -> {}", outdir.display(), outcome.counts_line());
                summary.completed += 1;
                if outcome.has_data() {
                    summary.with_data += 1;
                }
            }
            Err(e) => {
                error!("Unit {} failed: {:#}", outdir.display(), e);
                summary.failed.push((outdir, format!("{:#}", e)));
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    summary
}
