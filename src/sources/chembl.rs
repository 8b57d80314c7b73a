//! ChEMBL activity retrieval.
//!
//! Targets are resolved from a UniProt accession, molecules from the ligand
//! name (synonym and preferred-name lookups), then activities are paged per
//! target and filtered to Ki/Kd/IC50/EC50 for the resolved molecules.

use super::http::HttpClient;
use super::{json_string, ToMeasurements};
use crate::models::{AffinityType, Measurement, Provenance, RawValue, Source};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// One ChEMBL activity row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemblActivity {
    pub target_chembl_id: String,
    pub molecule_chembl_id: Option<String>,
    pub standard_type: Option<String>,
    pub standard_value: Option<RawValue>,
    pub standard_units: Option<String>,
    pub relation: Option<String>,
    pub ligand_name: Option<String>,
    #[serde(flatten)]
    pub provenance: Provenance,
}

impl ChemblActivity {
    fn from_json(target_id: &str, a: &Value) -> Self {
        Self {
            target_chembl_id: target_id.to_string(),
            molecule_chembl_id: a["molecule_chembl_id"].as_str().map(String::from),
            standard_type: a["standard_type"].as_str().map(String::from),
            standard_value: RawValue::from_json(&a["standard_value"]),
            standard_units: a["standard_units"].as_str().map(String::from),
            relation: a["standard_relation"].as_str().map(String::from),
            ligand_name: a["molecule_pref_name"].as_str().map(String::from),
            provenance: Provenance {
                pmid: json_string(&a["document_pubmed_id"]).or_else(|| json_string(&a["pmid"])),
                doi: a["document_doi"]
                    .as_str()
                    .or_else(|| a["doi"].as_str())
                    .map(String::from),
                journal: a["document_journal"]
                    .as_str()
                    .or_else(|| a["journal"].as_str())
                    .map(String::from),
                year: a["document_year"].as_i64().or_else(|| a["year"].as_i64()),
            },
        }
    }

    fn affinity_type(&self) -> Option<AffinityType> {
        self.standard_type.as_deref().and_then(AffinityType::parse)
    }
}

impl ToMeasurements for ChemblActivity {
    fn measurements(&self) -> Vec<Measurement> {
        self.affinity_type()
            .map(|t| {
                Measurement::new(
                    Source::Chembl,
                    t,
                    self.standard_value.clone(),
                    self.standard_units.clone(),
                )
            })
            .into_iter()
            .collect()
    }
}

/// Keep the affinity-typed activities of one page, restricted to `molecules`
/// when that set is non-empty.
pub fn parse_activity_page(
    target_id: &str,
    page: &Value,
    molecules: &BTreeSet<String>,
) -> Vec<ChemblActivity> {
    page["activities"]
        .as_array()
        .map(|acts| {
            acts.iter()
                .map(|a| ChemblActivity::from_json(target_id, a))
                .filter(|a| a.affinity_type().is_some())
                .filter(|a| {
                    molecules.is_empty()
                        || a
                            .molecule_chembl_id
                            .as_ref()
                            .is_some_and(|id| molecules.contains(id))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn page_is_empty(page: &Value) -> bool {
    page["activities"].as_array().map_or(true, |a| a.is_empty())
}

/// ChEMBL REST client.
pub struct ChemblClient<'a> {
    http: &'a HttpClient,
    base_url: String,
    page_size: usize,
    max_offset: usize,
}

impl<'a> ChemblClient<'a> {
    pub fn new(http: &'a HttpClient, base_url: &str, page_size: usize, max_offset: usize) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size: page_size.max(1),
            max_offset,
        }
    }

    /// ChEMBL target ids whose components carry this UniProt accession.
    pub async fn target_ids_by_uniprot(&self, uniprot: &str) -> Vec<String> {
        let url = format!("{}/target.json", self.base_url);
        let query = [
            ("target_components__accession", uniprot.to_string()),
            ("limit", "1000".to_string()),
        ];

        match self.http.get_json(&url, &query).await {
            Ok(data) => data["targets"]
                .as_array()
                .map(|ts| {
                    ts.iter()
                        .filter_map(|t| t["target_chembl_id"].as_str().map(String::from))
                        .collect()
                })
                .unwrap_or_default(),
            Err(e) => {
                warn!("ChEMBL target lookup failed: {}", e);
                Vec::new()
            }
        }
    }

    /// ChEMBL molecule ids matching the ligand name by synonym or preferred name.
    pub async fn molecule_ids_by_name(&self, name: &str) -> BTreeSet<String> {
        let url = format!("{}/molecule.json", self.base_url);
        let lookups = [
            [("molecule_synonyms__icontains", name.to_string()), ("limit", "100".to_string())],
            [("pref_name__iexact", name.to_string()), ("limit", "50".to_string())],
        ];

        let mut ids = BTreeSet::new();
        for query in &lookups {
            match self.http.get_json(&url, query).await {
                Ok(data) => {
                    if let Some(molecules) = data["molecules"].as_array() {
                        ids.extend(
                            molecules
                                .iter()
                                .filter_map(|m| m["molecule_chembl_id"].as_str().map(String::from)),
                        );
                    }
                }
                Err(e) => warn!("ChEMBL molecule lookup failed: {}", e),
            }
        }

        ids
    }

    /// Page through activities for every target.
    ///
    /// Paging for a target stops on an empty page, a failed request, or once
    /// the offset passes the configured maximum.
    pub async fn activities(
        &self,
        target_ids: &[String],
        molecules: &BTreeSet<String>,
    ) -> Vec<ChemblActivity> {
        let url = format!("{}/activity.json", self.base_url);
        let mut rows = Vec::new();

        for target_id in target_ids {
            let mut offset = 0;
            loop {
                let query = [
                    ("target_chembl_id", target_id.clone()),
                    ("limit", self.page_size.to_string()),
                    ("offset", offset.to_string()),
                ];

                let page = match self.http.get_json_once(&url, &query).await {
                    Ok(page) => page,
                    Err(e) => {
                        warn!("ChEMBL activity page for {} failed: {}", target_id, e);
                        break;
                    }
                };

                if page_is_empty(&page) {
                    break;
                }

                let kept = parse_activity_page(target_id, &page, molecules);
                debug!("{} offset {}: kept {} activities", target_id, offset, kept.len());
                rows.extend(kept);

                offset += self.page_size;
                if offset > self.max_offset {
                    break;
                }
            }
        }

        info!("ChEMBL: {} activity rows", rows.len());
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_page() -> Value {
        json!({
            "activities": [
                {
                    "molecule_chembl_id": "CHEMBL554",
                    "standard_type": "IC50",
                    "standard_value": "10.8",
                    "standard_units": "nM",
                    "standard_relation": "=",
                    "molecule_pref_name": "LAPATINIB",
                    "document_pubmed_id": 17375933,
                    "document_journal": "J Med Chem",
                    "document_year": 2007
                },
                {
                    "molecule_chembl_id": "CHEMBL554",
                    "standard_type": "KI",
                    "standard_value": "3",
                    "standard_units": "nM"
                },
                {
                    "molecule_chembl_id": "CHEMBL554",
                    "standard_type": "Inhibition",
                    "standard_value": "95",
                    "standard_units": "%"
                },
                {
                    "molecule_chembl_id": "CHEMBL939",
                    "standard_type": "Kd",
                    "standard_value": null,
                    "standard_units": "nM"
                }
            ]
        })
    }

    #[test]
    fn test_parse_page_keeps_affinity_types() {
        let rows = parse_activity_page("CHEMBL203", &sample_page(), &BTreeSet::new());

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].provenance.pmid.as_deref(), Some("17375933"));
        assert_eq!(rows[0].provenance.year, Some(2007));
        assert_eq!(rows[0].relation.as_deref(), Some("="));
        assert_eq!(rows[1].standard_type.as_deref(), Some("KI"));
    }

    #[test]
    fn test_parse_page_filters_molecules() {
        let molecules: BTreeSet<String> = ["CHEMBL939".to_string()].into_iter().collect();
        let rows = parse_activity_page("CHEMBL203", &sample_page(), &molecules);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].molecule_chembl_id.as_deref(), Some("CHEMBL939"));
    }

    #[test]
    fn test_measurements() {
        let rows = parse_activity_page("CHEMBL203", &sample_page(), &BTreeSet::new());
        let measurements = rows.measurements();

        assert_eq!(measurements.len(), 3);
        assert_eq!(measurements[1].affinity_type, AffinityType::Ki);
        assert_eq!(measurements[2].raw_value, None);
        assert!(measurements.iter().all(|m| m.source == Source::Chembl));
    }

    #[test]
    fn test_empty_page() {
        assert!(page_is_empty(&json!({"activities": []})));
        assert!(page_is_empty(&json!({})));
        assert!(!page_is_empty(&sample_page()));
    }
}
