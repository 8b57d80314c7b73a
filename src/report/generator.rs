//! Markdown report generation.
//!
//! This module assembles the per-source and combined affinity reports, the
//! BindingDB note and the JSON summary artifact.

use crate::analysis::{classify, sig3, synthesize, Interpretation, Scope};
use crate::models::{Meta, Source, SummaryArtifact, SummaryMap};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Static caveats printed in every affinity report.
const CAVEATS: [&str; 4] = [
    "Assays differ in format and conditions (biochemical vs cellular; readouts like inhibition vs viability).",
    "Units and conversions are normalized to nM; residual heterogeneity may remain.",
    "Outliers can reflect specific constructs, mutations, or co-factors.",
    "Cross-database curation standards vary; prefer original publications for critical decisions.",
];

const SOURCE_NEXT_STEPS: [&str; 3] = [
    "Cross-check other sources (ChEMBL, PubChem, IUPHAR, BindingDB) for concordance.",
    "Inspect per-assay metadata (journal/year, assay type) to explain outliers.",
    "If applicable, align target identifiers (UniProt/Gene) and drug synonyms/SMILES.",
];

const AGGREGATE_NEXT_STEPS: [&str; 3] = [
    "Cross-check per-source reports for concordance and outliers.",
    "Inspect assay metadata (journal/year, assay type) to explain extremes.",
    "If needed, try alternative drug synonyms or run with SMILES to ensure correct compound mapping.",
];

/// Everything needed to render one affinity report.
#[derive(Debug, Clone)]
pub struct AffinityReport {
    /// Document title, e.g. "ChEMBL Report".
    pub title: String,
    /// Name used in the caveats block.
    pub source_label: String,
    pub scope: Scope,
    pub meta: Meta,
    pub summaries: SummaryMap,
    /// Number of raw records retrieved for this report.
    pub record_count: usize,
}

impl AffinityReport {
    /// Report over a single database.
    pub fn for_source(source: Source, meta: &Meta, summaries: SummaryMap, record_count: usize) -> Self {
        Self {
            title: format!("{} Report", source.display_name()),
            source_label: source.display_name().to_string(),
            scope: Scope::Source,
            meta: meta.clone(),
            summaries,
            record_count,
        }
    }

    /// Report over the merged summaries of several databases.
    pub fn combined(sources: &[Source], meta: &Meta, summaries: SummaryMap, record_count: usize) -> Self {
        let label = sources
            .iter()
            .map(|s| s.display_name())
            .collect::<Vec<_>>()
            .join("/");

        Self {
            title: "Online Binding Report".to_string(),
            source_label: label,
            scope: Scope::Aggregate,
            meta: meta.clone(),
            summaries,
            record_count,
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AffinityReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", report.title));
    output.push_str(&generate_header_section(&report.meta, report.record_count));
    output.push_str(&generate_summary_section(&report.summaries));
    output.push_str(&generate_caveats_section(&report.source_label));
    output.push_str(&generate_interpretation_section(&report.summaries, report.scope));
    output.push_str(&generate_footer());

    output
}

/// Generate the ligand/target identification lines.
fn generate_header_section(meta: &Meta, record_count: usize) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "**Ligand**: `{}` | **SMILES**: `{}` | **CID**: `{}`\n",
        meta.drug_name, meta.smiles, meta.cid
    ));
    section.push_str(&format!(
        "**Target**: `{}` | **UniProt**: `{}` | **Gene**: `{}`\n",
        meta.protein_name, meta.uniprot, meta.gene
    ));
    section.push_str(&format!("**Records retrieved**: {}\n\n", record_count));

    section
}

/// Generate the normalized summary bullets.
fn generate_summary_section(summaries: &SummaryMap) -> String {
    let mut section = String::new();

    section.push_str("## Summary (normalized to nM)\n\n");

    if summaries.is_empty() {
        section.push_str("_No quantitative affinities found._\n\n");
        return section;
    }

    for (affinity_type, s) in summaries {
        section.push_str(&format!(
            "- **{}**: n={} | median={} nM | min={} nM | max={} nM → **{}** (best)\n",
            affinity_type,
            s.n,
            sig3(s.median_nm),
            sig3(s.min_nm),
            sig3(s.max_nm),
            classify(s.min_nm),
        ));
    }
    section.push('\n');

    section
}

/// Generate the caveats block.
fn generate_caveats_section(source_label: &str) -> String {
    let mut section = String::new();

    section.push_str("## Interpretation (detailed)\n\n");
    section.push_str(&format!(
        "This section interprets **{}** results in plain language.\n",
        source_label
    ));
    for caveat in CAVEATS {
        section.push_str(&format!("- {}\n", caveat));
    }
    section.push('\n');

    section
}

/// Generate the biological meaning, practical take and next steps.
fn generate_interpretation_section(summaries: &SummaryMap, scope: Scope) -> String {
    let mut section = String::new();

    section.push_str("## Biological meaning\n\n");

    let reading = match synthesize(summaries, scope) {
        Interpretation::NoData { sentence } => {
            section.push_str(&format!("- {}\n\n", sentence));
            return section;
        }
        Interpretation::Primary(reading) => reading,
    };

    section.push_str(&format!(
        "- Using **{}** as the primary metric:\n",
        reading.metric
    ));
    section.push_str(&format!("  - {}\n", reading.potency_sentence));
    section.push_str(&format!("  - {}\n", reading.variability_sentence));
    section.push_str(&format!("  - {}\n\n", reading.evidence_sentence));

    section.push_str("## Practical take\n\n");
    section.push_str(&format!("- {}\n\n", reading.practical_sentence));

    section.push_str("## Suggested next steps\n\n");
    let steps = match scope {
        Scope::Source => SOURCE_NEXT_STEPS,
        Scope::Aggregate => AGGREGATE_NEXT_STEPS,
    };
    for step in steps {
        section.push_str(&format!("- {}\n", step));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by BindReport*\n".to_string()
}

/// Generate the BindingDB note.
///
/// BindingDB rows are saved raw and never numeric-parsed, so this report only
/// points at the saved file.
pub fn generate_bindingdb_note(meta: &Meta, rows_file: Option<&str>) -> String {
    let mut note = String::new();

    note.push_str("# BindingDB Online Report\n\n");

    match rows_file {
        None => note.push_str("No BindingDB online rows saved.\n"),
        Some(file) => {
            note.push_str(&format!(
                "**Ligand**: `{}` | **Target**: `{}`\n\n",
                meta.drug_name, meta.protein_name
            ));
            note.push_str("Raw HTML rows saved (not numeric-parsed).\n");
            note.push_str(&format!("- File: `{}`\n", file));
        }
    }

    note
}

/// Generate the JSON summary artifact.
pub fn generate_json_artifact(artifact: &SummaryArtifact) -> Result<String> {
    serde_json::to_string_pretty(artifact).map_err(Into::into)
}

/// Write content next to `path` in a temp file, then rename it into place.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

/// Write a Markdown report to a file.
pub fn write_report(report: &AffinityReport, path: &Path) -> Result<()> {
    write_atomic(path, &generate_markdown_report(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AffinityType, Summary};

    fn create_test_meta() -> Meta {
        Meta {
            drug_name: "Lapatinib".to_string(),
            smiles: "CS(=O)(=O)CCNCc1ccc(o1)".to_string(),
            cid: "208908".to_string(),
            uniprot: "P00533".to_string(),
            gene: "EGFR".to_string(),
            protein_name: "EGFR_HUMAN".to_string(),
        }
    }

    fn create_test_summaries() -> SummaryMap {
        let mut map = SummaryMap::new();
        map.insert(
            AffinityType::Ic50,
            Summary {
                n: 3,
                median_nm: 15.0,
                min_nm: 5.0,
                max_nm: 25.0,
            },
        );
        map.insert(
            AffinityType::Ki,
            Summary {
                n: 12,
                median_nm: 50.0,
                min_nm: 5.0,
                max_nm: 5000.0,
            },
        );
        map
    }

    #[test]
    fn test_section_order() {
        let report =
            AffinityReport::for_source(Source::Chembl, &create_test_meta(), create_test_summaries(), 42);
        let markdown = generate_markdown_report(&report);

        let positions: Vec<usize> = [
            "# ChEMBL Report",
            "**Ligand**: `Lapatinib`",
            "## Summary (normalized to nM)",
            "## Interpretation (detailed)",
            "## Biological meaning",
            "## Practical take",
            "## Suggested next steps",
        ]
        .iter()
        .map(|h| markdown.find(h).unwrap_or_else(|| panic!("missing {}", h)))
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(markdown.contains("**Records retrieved**: 42"));
    }

    #[test]
    fn test_summary_bullets_in_priority_order() {
        let section = generate_summary_section(&create_test_summaries());

        let ki = section.find("- **Ki**").unwrap();
        let ic50 = section.find("- **IC50**").unwrap();
        assert!(ki < ic50);
        assert!(section.contains(
            "- **Ki**: n=12 | median=50 nM | min=5 nM | max=5e+03 nM → **High** (best)"
        ));
        assert!(section.contains(
            "- **IC50**: n=3 | median=15 nM | min=5 nM | max=25 nM → **High** (best)"
        ));
    }

    #[test]
    fn test_empty_summaries_render_no_data() {
        let report =
            AffinityReport::for_source(Source::Iuphar, &create_test_meta(), SummaryMap::new(), 0);
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("_No quantitative affinities found._"));
        assert!(markdown.contains("No quantitative values parsed for this source"));
        assert!(!markdown.contains("## Practical take"));
        assert!(markdown.contains("This section interprets **IUPHAR** results"));
    }

    #[test]
    fn test_interpretation_uses_primary_metric() {
        let section = generate_interpretation_section(&create_test_summaries(), Scope::Source);

        assert!(section.contains("Using **Ki** as the primary metric"));
        assert!(section.contains("Median potency is **strong** (median 50 nM)"));
        assert!(section.contains("≥3 orders of magnitude"));
        assert!(section.contains("Evidence base is **limited** (n=12)."));
        assert!(section.contains("compatible with drug-like potency"));
    }

    #[test]
    fn test_combined_report_label_and_steps() {
        let report = AffinityReport::combined(
            &[Source::Chembl, Source::Pubchem],
            &create_test_meta(),
            create_test_summaries(),
            7,
        );
        let markdown = generate_markdown_report(&report);

        assert!(markdown.starts_with("# Online Binding Report"));
        assert!(markdown.contains("interprets **ChEMBL/PubChem** results"));
        assert!(markdown.contains("Cross-check per-source reports for concordance and outliers."));
    }

    #[test]
    fn test_report_is_deterministic() {
        let report =
            AffinityReport::for_source(Source::Pubchem, &create_test_meta(), create_test_summaries(), 3);
        assert_eq!(generate_markdown_report(&report), generate_markdown_report(&report));
    }

    #[test]
    fn test_bindingdb_note() {
        let meta = create_test_meta();

        let empty = generate_bindingdb_note(&meta, None);
        assert!(empty.contains("No BindingDB online rows saved."));

        let saved = generate_bindingdb_note(&meta, Some("bindingdb_rows.json"));
        assert!(saved.contains("`bindingdb_rows.json`"));
        assert!(saved.contains("**Target**: `EGFR_HUMAN`"));
    }

    #[test]
    fn test_generate_json_artifact() {
        let artifact = SummaryArtifact {
            meta: create_test_meta(),
            summaries: create_test_summaries(),
            generated_at: None,
        };
        let json = generate_json_artifact(&artifact).unwrap();

        assert!(json.contains("\"meta\""));
        assert!(json.contains("\"summaries\""));
        assert!(json.contains("\"median_nM\""));
        assert!(json.find("\"Ki\"").unwrap() < json.find("\"IC50\"").unwrap());
    }

    #[test]
    fn test_write_report_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report_chembl.md");
        let report =
            AffinityReport::for_source(Source::Chembl, &create_test_meta(), SummaryMap::new(), 0);

        write_report(&report, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# ChEMBL Report"));
    }
}
