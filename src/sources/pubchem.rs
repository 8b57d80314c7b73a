//! PubChem ligand resolution and assay summaries.

use super::http::{endpoint, HttpClient};
use super::{json_string, ToMeasurements};
use crate::models::{AffinityType, Measurement, RawValue, Source};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Structure identifiers resolved for a ligand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LigandIdentity {
    pub smiles: Option<String>,
    pub inchikey: Option<String>,
    pub cid: Option<String>,
}

impl LigandIdentity {
    fn apply_properties(&mut self, data: &Value) {
        let props = &data["PropertyTable"]["Properties"][0];
        if props.is_null() {
            return;
        }
        if let Some(smiles) = props["IsomericSMILES"]
            .as_str()
            .or_else(|| props["SMILES"].as_str())
        {
            self.smiles = Some(smiles.to_string());
        }
        if let Some(key) = props["InChIKey"].as_str() {
            self.inchikey = Some(key.to_string());
        }
    }
}

/// First CID of an `IdentifierList` reply.
pub fn first_cid(data: &Value) -> Option<String> {
    json_string(&data["IdentifierList"]["CID"][0])
}

/// One row of a compound's assay summary. Affinity columns are in nM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PubchemAssay {
    pub aid: Option<String>,
    pub target_name: Option<String>,
    pub gene_symbol: Option<String>,
    pub activity_outcome: Option<String>,
    pub ac50: Option<RawValue>,
    pub ic50: Option<RawValue>,
    pub ec50: Option<RawValue>,
    pub ki: Option<RawValue>,
    pub kd: Option<RawValue>,
    pub pmid: Option<String>,
}

impl PubchemAssay {
    fn from_json(a: &Value) -> Self {
        Self {
            aid: json_string(&a["AID"]),
            target_name: a["TargetName"].as_str().map(String::from),
            gene_symbol: a["GeneSymbol"].as_str().map(String::from),
            activity_outcome: a["ActivityOutcome"].as_str().map(String::from),
            ac50: RawValue::from_json(&a["AC50"]),
            ic50: RawValue::from_json(&a["IC50"]),
            ec50: RawValue::from_json(&a["EC50"]),
            ki: RawValue::from_json(&a["Ki"]),
            kd: RawValue::from_json(&a["Kd"]),
            pmid: json_string(&a["PMID"]),
        }
    }

    fn value_for(&self, affinity_type: AffinityType) -> Option<&RawValue> {
        match affinity_type {
            AffinityType::Ki => self.ki.as_ref(),
            AffinityType::Kd => self.kd.as_ref(),
            AffinityType::Ic50 => self.ic50.as_ref(),
            AffinityType::Ec50 => self.ec50.as_ref(),
        }
    }

    fn target_text(&self) -> String {
        format!(
            "{} {}",
            self.gene_symbol.as_deref().unwrap_or_default(),
            self.target_name.as_deref().unwrap_or_default()
        )
        .to_lowercase()
    }
}

impl ToMeasurements for PubchemAssay {
    fn measurements(&self) -> Vec<Measurement> {
        AffinityType::ALL
            .iter()
            .filter_map(|&t| {
                self.value_for(t).map(|v| {
                    Measurement::new(Source::Pubchem, t, Some(v.clone()), Some("nM".to_string()))
                })
            })
            .collect()
    }
}

/// Parse an `AssaySummaries` reply.
pub fn parse_assay_summaries(data: &Value) -> Vec<PubchemAssay> {
    data["AssaySummaries"]["AssaySummary"]
        .as_array()
        .map(|rows| rows.iter().map(PubchemAssay::from_json).collect())
        .unwrap_or_default()
}

/// Keep assays whose gene symbol or target name mentions `pattern`.
/// An empty pattern keeps everything.
pub fn filter_by_target(assays: Vec<PubchemAssay>, pattern: &str) -> Vec<PubchemAssay> {
    let pattern = pattern.trim().to_lowercase();
    if pattern.is_empty() {
        return assays;
    }
    assays
        .into_iter()
        .filter(|a| a.target_text().contains(&pattern))
        .collect()
}

/// PubChem PUG REST client.
pub struct PubchemClient<'a> {
    http: &'a HttpClient,
    base_url: String,
}

impl<'a> PubchemClient<'a> {
    pub fn new(http: &'a HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }

    /// Resolve SMILES, InChIKey and CID from a ligand name.
    pub async fn resolve_by_name(&self, name: &str) -> LigandIdentity {
        let mut identity = LigandIdentity::default();

        match endpoint(
            &self.base_url,
            &["compound", "name", name, "property", "IsomericSMILES,InChIKey", "JSON"],
        ) {
            Ok(url) => match self.http.get_json(&url, &[]).await {
                Ok(data) => identity.apply_properties(&data),
                Err(e) => warn!("PubChem property lookup for '{}' failed: {}", name, e),
            },
            Err(e) => warn!("{}", e),
        }

        match endpoint(&self.base_url, &["compound", "name", name, "cids", "JSON"]) {
            Ok(url) => match self.http.get_json(&url, &[]).await {
                Ok(data) => identity.cid = first_cid(&data),
                Err(e) => warn!("PubChem CID lookup for '{}' failed: {}", name, e),
            },
            Err(e) => warn!("{}", e),
        }

        debug!("PubChem identity for '{}': {:?}", name, identity);
        identity
    }

    /// Canonicalize a SMILES string and find its CID.
    pub async fn resolve_by_smiles(&self, smiles: &str) -> LigandIdentity {
        let mut identity = LigandIdentity {
            smiles: Some(smiles.to_string()),
            ..Default::default()
        };
        let smiles_param = [("smiles", smiles.to_string())];

        match endpoint(
            &self.base_url,
            &["compound", "smiles", "property", "IsomericSMILES,InChIKey", "JSON"],
        ) {
            Ok(url) => match self.http.get_json(&url, &smiles_param).await {
                Ok(data) => identity.apply_properties(&data),
                Err(e) => warn!("PubChem SMILES lookup failed: {}", e),
            },
            Err(e) => warn!("{}", e),
        }

        match endpoint(&self.base_url, &["compound", "smiles", "cids", "JSON"]) {
            Ok(url) => match self.http.post_form_json(&url, &smiles_param).await {
                Ok(data) => identity.cid = first_cid(&data),
                Err(e) => warn!("PubChem CID lookup by SMILES failed: {}", e),
            },
            Err(e) => warn!("{}", e),
        }

        identity
    }

    /// Assay summary rows for a compound.
    pub async fn assay_summary(&self, cid: &str) -> Vec<PubchemAssay> {
        let url = match endpoint(&self.base_url, &["compound", "cid", cid, "assaysummary", "JSON"]) {
            Ok(url) => url,
            Err(e) => {
                warn!("{}", e);
                return Vec::new();
            }
        };

        match self.http.get_json(&url, &[]).await {
            Ok(data) => {
                let assays = parse_assay_summaries(&data);
                info!("PubChem: {} assays for CID {}", assays.len(), cid);
                assays
            }
            Err(e) => {
                warn!("PubChem assay summary for CID {} failed: {}", cid, e);
                Vec::new()
            }
        }
    }
}
