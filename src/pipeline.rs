//! One ligand/target unit of work.
//!
//! Resolves the ligand, queries every database, persists the raw records and
//! writes the summary artifact plus the combined and per-source reports.

use crate::analysis::{combine_sources, generate_summary_text, summarize_by_type, type_distribution};
use crate::config::{Config, ReportConfig};
use crate::models::{Meta, Source, SummaryArtifact, SummaryMap};
use crate::report::{self, AffinityReport};
use crate::sources::bindingdb::BindingDbClient;
use crate::sources::chembl::ChemblClient;
use crate::sources::iuphar::IupharClient;
use crate::sources::pubchem::{filter_by_target, PubchemClient};
use crate::sources::{HttpClient, LigandIdentity, SourceRecords};
use crate::target::TargetInfo;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SUMMARY_FILE: &str = "summary.json";
pub const COMBINED_REPORT_FILE: &str = "report_online.md";

/// A ligand/target pair to process.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitRequest {
    pub fasta_path: PathBuf,
    pub drug_name: Option<String>,
    pub smiles: Option<String>,
    pub outdir: PathBuf,
}

/// What a finished unit produced.
#[derive(Debug, Clone)]
pub struct UnitOutcome {
    pub outdir: PathBuf,
    pub meta: Meta,
    pub counts: BTreeMap<Source, usize>,
    pub summaries: SummaryMap,
}

impl UnitOutcome {
    /// True when at least one affinity type was summarized.
    pub fn has_data(&self) -> bool {
        !self.summaries.is_empty()
    }

    /// Row counts line, e.g. "ChEMBL rows: 12 | PubChem assays: 3 | ...".
    pub fn counts_line(&self) -> String {
        let count = |s: Source| self.counts.get(&s).copied().unwrap_or(0);
        format!(
            "ChEMBL rows: {} | PubChem assays: {} | IUPHAR rows: {} | BindingDB rows: {}",
            count(Source::Chembl),
            count(Source::Pubchem),
            count(Source::Iuphar),
            count(Source::Bindingdb)
        )
    }

    pub fn summary_line(&self) -> String {
        generate_summary_text(&self.summaries)
    }
}

/// Runs units of work against the configured databases.
pub struct Pipeline {
    config: Config,
    http: HttpClient,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        let http = HttpClient::new(&config.http).context("Failed to create HTTP client")?;
        Ok(Self { config, http })
    }

    /// Fetch, persist and report one ligand/target pair.
    pub async fn run_unit(&self, request: &UnitRequest) -> Result<UnitOutcome> {
        let target = TargetInfo::from_fasta_file(&request.fasta_path)?;
        debug!("FASTA header: {}", target.header);
        info!(
            "Target {} (UniProt {}, gene {}, {} residues)",
            target.protein_name.as_deref().unwrap_or("?"),
            target.uniprot.as_deref().unwrap_or("-"),
            target.gene.as_deref().unwrap_or("-"),
            target.sequence.len()
        );

        let drug_name = non_blank(request.drug_name.as_deref()).unwrap_or_default();
        let identity = self
            .resolve_ligand(drug_name, non_blank(request.smiles.as_deref()))
            .await;
        let meta = build_meta(drug_name, &identity, &target);

        let records = self.fetch_records(&meta, &target).await;

        std::fs::create_dir_all(&request.outdir).with_context(|| {
            format!("Failed to create output folder: {}", request.outdir.display())
        })?;
        records.save(&request.outdir)?;

        let summaries = write_outputs(&request.outdir, &meta, &records, &self.config.report)?;

        let counts = Source::ALL
            .iter()
            .map(|&s| (s, records.record_count(s)))
            .collect();

        Ok(UnitOutcome {
            outdir: request.outdir.clone(),
            meta,
            counts,
            summaries,
        })
    }

    /// Resolve structure identifiers. SMILES wins over the name for the
    /// structure lookup; the name still backs up a missing CID.
    async fn resolve_ligand(&self, drug_name: &str, smiles: Option<&str>) -> LigandIdentity {
        let pubchem = PubchemClient::new(&self.http, &self.config.sources.pubchem_url);

        let mut identity = match smiles {
            Some(smiles) => {
                let mut identity = pubchem.resolve_by_smiles(smiles).await;
                if identity.smiles.is_none() {
                    identity.smiles = Some(smiles.to_string());
                }
                identity
            }
            None => pubchem.resolve_by_name(drug_name).await,
        };

        if identity.cid.is_none() && smiles.is_some() && !drug_name.is_empty() {
            identity.cid = pubchem.resolve_by_name(drug_name).await.cid;
        }

        identity
    }

    /// Query all four databases concurrently. Failures degrade to empty sets.
    async fn fetch_records(&self, meta: &Meta, target: &TargetInfo) -> SourceRecords {
        let sources = &self.config.sources;
        let drug_name = meta.drug_name.as_str();
        let uniprot = non_blank(Some(&meta.uniprot));

        let chembl = async {
            let client = ChemblClient::new(
                &self.http,
                &sources.chembl_url,
                sources.chembl_page_size,
                sources.chembl_max_offset,
            );
            let Some(uniprot) = uniprot else {
                debug!("No UniProt accession; skipping ChEMBL");
                return Vec::new();
            };
            let targets = client.target_ids_by_uniprot(uniprot).await;
            if targets.is_empty() {
                return Vec::new();
            }
            let molecules = if drug_name.is_empty() {
                Default::default()
            } else {
                client.molecule_ids_by_name(drug_name).await
            };
            client.activities(&targets, &molecules).await
        };

        let pubchem = async {
            let Some(cid) = non_blank(Some(&meta.cid)) else {
                debug!("No PubChem CID; skipping assay summary");
                return Vec::new();
            };
            let client = PubchemClient::new(&self.http, &sources.pubchem_url);
            let assays = client.assay_summary(cid).await;
            match target.filter_pattern() {
                Some(pattern) if !sources.pubchem_keep_all => {
                    let kept = filter_by_target(assays, pattern);
                    debug!("PubChem assays matching '{}': {}", pattern, kept.len());
                    kept
                }
                _ => assays,
            }
        };

        let iuphar = async {
            if drug_name.is_empty() {
                return Vec::new();
            }
            let client = IupharClient::new(&self.http, &sources.iuphar_url);
            let ligand_ids = client.ligand_ids_by_name(drug_name).await;
            if ligand_ids.is_empty() {
                return Vec::new();
            }
            client.interactions(&ligand_ids, uniprot).await
        };

        let bindingdb = async {
            if !sources.enable_bindingdb || drug_name.is_empty() {
                return Vec::new();
            }
            let Some(term) = target.search_term() else {
                return Vec::new();
            };
            BindingDbClient::new(&self.http, &sources.bindingdb_url)
                .fetch(drug_name, term)
                .await
        };

        let (chembl, pubchem, iuphar, bindingdb) = tokio::join!(chembl, pubchem, iuphar, bindingdb);

        SourceRecords {
            chembl,
            pubchem,
            iuphar,
            bindingdb,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Identifying context for the reports; unknown fields stay empty.
pub fn build_meta(drug_name: &str, identity: &LigandIdentity, target: &TargetInfo) -> Meta {
    Meta {
        drug_name: drug_name.to_string(),
        smiles: identity.smiles.clone().unwrap_or_default(),
        cid: identity.cid.clone().unwrap_or_default(),
        uniprot: target.uniprot.clone().unwrap_or_default(),
        gene: target.gene.clone().unwrap_or_default(),
        protein_name: target.protein_name.clone().unwrap_or_default(),
    }
}

/// Write `summary.json`, the combined report and (if enabled) the
/// per-source reports. Returns the combined summaries.
pub fn write_outputs(
    outdir: &Path,
    meta: &Meta,
    records: &SourceRecords,
    report_config: &ReportConfig,
) -> Result<SummaryMap> {
    let include = &report_config.combined_sources;

    let measurements: Vec<_> = Source::ALL
        .iter()
        .map(|&s| (s, records.measurements(s)))
        .collect();
    for (source, ms) in &measurements {
        debug!("{} type distribution: {:?}", source, type_distribution(ms));
    }
    let groups: Vec<_> = measurements
        .iter()
        .map(|(s, ms)| (*s, ms.as_slice()))
        .collect();
    let combined = combine_sources(&groups, include);

    let artifact = SummaryArtifact {
        meta: meta.clone(),
        summaries: combined.clone(),
        generated_at: Some(Utc::now()),
    };
    report::write_atomic(
        &outdir.join(SUMMARY_FILE),
        &report::generate_json_artifact(&artifact)?,
    )?;

    let record_count = include.iter().map(|&s| records.record_count(s)).sum();
    let online = AffinityReport::combined(include, meta, combined.clone(), record_count);
    report::write_report(&online, &outdir.join(COMBINED_REPORT_FILE))?;
    info!("Wrote {}", outdir.join(COMBINED_REPORT_FILE).display());

    if report_config.write_per_source {
        write_source_reports(outdir, meta, records)?;
    }

    Ok(combined)
}

/// File name of a source's report, e.g. `report_chembl.md`.
pub fn source_report_file(source: Source) -> String {
    format!("report_{}.md", source.slug())
}

/// Write one report per database. Returns the written paths.
pub fn write_source_reports(
    outdir: &Path,
    meta: &Meta,
    records: &SourceRecords,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for source in Source::ALL {
        let path = outdir.join(source_report_file(source));

        let content = match source {
            Source::Bindingdb => {
                let file = SourceRecords::file_name(source);
                let saved = (!records.bindingdb.is_empty()).then_some(file.as_str());
                report::generate_bindingdb_note(meta, saved)
            }
            _ => {
                let summaries = summarize_by_type(&records.measurements(source));
                let report = AffinityReport::for_source(
                    source,
                    meta,
                    summaries,
                    records.record_count(source),
                );
                report::generate_markdown_report(&report)
            }
        };

        report::write_atomic(&path, &content)?;
        debug!("Wrote {}", path.display());
        written.push(path);
    }

    Ok(written)
}

/// The part of `summary.json` needed to rebuild reports; summaries are
/// recomputed from the record files.
#[derive(Debug, Deserialize)]
struct StoredMeta {
    #[serde(default)]
    meta: Meta,
}

/// Rebuild per-source reports from a finished fetch in `outdir`.
pub fn rebuild_reports(outdir: &Path) -> Result<Vec<PathBuf>> {
    let summary_path = outdir.join(SUMMARY_FILE);
    let content = std::fs::read_to_string(&summary_path).with_context(|| {
        format!(
            "{} not found. Run `bindreport fetch` first.",
            summary_path.display()
        )
    })?;
    let stored: StoredMeta = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", summary_path.display()))?;

    let records = SourceRecords::load(outdir);
    write_source_reports(outdir, &stored.meta, &records)
}
