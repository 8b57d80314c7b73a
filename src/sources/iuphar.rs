//! IUPHAR/BPS Guide to Pharmacology interactions.

use super::http::{endpoint, HttpClient};
use super::{json_string, ToMeasurements};
use crate::models::{AffinityType, Measurement, RawValue, Source};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// One ligand/target interaction with its affinity, as published by GtoPdb.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IupharInteraction {
    pub ligand_id: i64,
    pub target_name: Option<String>,
    pub uniprot: Option<String>,
    pub affinity_type: Option<String>,
    pub relation: Option<String>,
    pub value: Option<RawValue>,
    pub units: Option<String>,
    pub pmid: Option<String>,
}

#[derive(Default)]
struct AffinityFields {
    affinity_type: Option<String>,
    relation: Option<String>,
    value: Option<RawValue>,
    units: Option<String>,
}

impl AffinityFields {
    fn from_object(obj: &Value) -> Self {
        Self {
            affinity_type: obj["type"].as_str().map(String::from),
            relation: obj["relation"].as_str().map(String::from),
            value: RawValue::from_json(&obj["value"]),
            units: obj["units"].as_str().map(String::from),
        }
    }

    /// The affinity field comes as an object, a list (first entry wins) or
    /// a bare value.
    fn from_json(affinity: &Value) -> Self {
        match affinity {
            Value::Object(_) => Self::from_object(affinity),
            Value::Array(items) => match items.first() {
                Some(first @ Value::Object(_)) => Self::from_object(first),
                Some(other) => Self {
                    value: json_string(other).map(RawValue::Text),
                    ..Default::default()
                },
                None => Self::default(),
            },
            Value::String(s) => Self {
                value: Some(RawValue::Text(s.clone())),
                ..Default::default()
            },
            _ => Self::default(),
        }
    }
}

/// Parse a ligand's interaction list, keeping targets that match `uniprot`
/// (case-insensitive) when both sides carry an accession.
pub fn parse_interactions(
    ligand_id: i64,
    data: &Value,
    uniprot: Option<&str>,
) -> Vec<IupharInteraction> {
    let Some(items) = data.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let target = &item["target"];
            let target_uniprot = target["uniprotId"].as_str();

            if let (Some(wanted), Some(found)) = (uniprot, target_uniprot) {
                if !wanted.eq_ignore_ascii_case(found) {
                    return None;
                }
            }

            let affinity = AffinityFields::from_json(&item["affinity"]);
            Some(IupharInteraction {
                ligand_id,
                target_name: target["name"].as_str().map(String::from),
                uniprot: target_uniprot.map(String::from),
                affinity_type: affinity.affinity_type,
                relation: affinity.relation,
                value: affinity.value,
                units: affinity.units,
                pmid: json_string(&item["reference"]["pubmedId"]),
            })
        })
        .collect()
}

impl ToMeasurements for IupharInteraction {
    fn measurements(&self) -> Vec<Measurement> {
        self.affinity_type
            .as_deref()
            .and_then(AffinityType::parse)
            .map(|t| Measurement::new(Source::Iuphar, t, self.value.clone(), self.units.clone()))
            .into_iter()
            .collect()
    }
}

/// GtoPdb web services client.
pub struct IupharClient<'a> {
    http: &'a HttpClient,
    base_url: String,
}

impl<'a> IupharClient<'a> {
    pub fn new(http: &'a HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }

    /// GtoPdb ligand ids matching a ligand name.
    pub async fn ligand_ids_by_name(&self, name: &str) -> Vec<i64> {
        let url = match endpoint(&self.base_url, &["ligands"]) {
            Ok(url) => url,
            Err(e) => {
                warn!("{}", e);
                return Vec::new();
            }
        };

        match self.http.get_json(&url, &[("name", name.to_string())]).await {
            Ok(data) => {
                let ids: Vec<i64> = data
                    .as_array()
                    .map(|ls| ls.iter().filter_map(|l| l["ligandId"].as_i64()).collect())
                    .unwrap_or_default();
                debug!("IUPHAR ligand ids for '{}': {:?}", name, ids);
                ids
            }
            Err(e) => {
                warn!("IUPHAR ligand lookup for '{}' failed: {}", name, e);
                Vec::new()
            }
        }
    }

    /// Interactions of every ligand, filtered to the target accession.
    pub async fn interactions(
        &self,
        ligand_ids: &[i64],
        uniprot: Option<&str>,
    ) -> Vec<IupharInteraction> {
        let mut rows = Vec::new();

        for &ligand_id in ligand_ids {
            let id = ligand_id.to_string();
            let url = match endpoint(&self.base_url, &["ligands", &id, "interactions"]) {
                Ok(url) => url,
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            };

            match self.http.get_json(&url, &[]).await {
                Ok(data) => rows.extend(parse_interactions(ligand_id, &data, uniprot)),
                Err(e) => warn!("IUPHAR interactions for ligand {} failed: {}", ligand_id, e),
            }
        }

        info!("IUPHAR: {} interaction rows", rows.len());
        rows
    }
}
