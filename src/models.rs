//! Data models for the affinity aggregator.
//!
//! This module contains the core data structures shared by the retrieval
//! adapters, the normalization engine and the report generator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of affinity measurement.
///
/// Declaration order is the primary-metric priority (Ki > Kd > IC50 > EC50),
/// so a `BTreeMap` keyed by this type iterates in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AffinityType {
    Ki,
    Kd,
    #[serde(rename = "IC50")]
    Ic50,
    #[serde(rename = "EC50")]
    Ec50,
}

impl AffinityType {
    /// All affinity types in priority order.
    pub const ALL: [AffinityType; 4] = [
        AffinityType::Ki,
        AffinityType::Kd,
        AffinityType::Ic50,
        AffinityType::Ec50,
    ];

    /// Parse a source-supplied type label, case-insensitively.
    ///
    /// Labels such as `pKi` or `AC50` are not affinity types in this sense
    /// and yield `None`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "KI" => Some(AffinityType::Ki),
            "KD" => Some(AffinityType::Kd),
            "IC50" => Some(AffinityType::Ic50),
            "EC50" => Some(AffinityType::Ec50),
            _ => None,
        }
    }
}

impl fmt::Display for AffinityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AffinityType::Ki => write!(f, "Ki"),
            AffinityType::Kd => write!(f, "Kd"),
            AffinityType::Ic50 => write!(f, "IC50"),
            AffinityType::Ec50 => write!(f, "EC50"),
        }
    }
}

/// Public database a record was retrieved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Chembl,
    Pubchem,
    Iuphar,
    Bindingdb,
}

impl Source {
    /// All sources in fetch and report order.
    pub const ALL: [Source; 4] = [
        Source::Chembl,
        Source::Pubchem,
        Source::Iuphar,
        Source::Bindingdb,
    ];

    /// Human-readable database name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Source::Chembl => "ChEMBL",
            Source::Pubchem => "PubChem",
            Source::Iuphar => "IUPHAR",
            Source::Bindingdb => "BindingDB",
        }
    }

    /// Short identifier used in file names and configuration.
    pub fn slug(&self) -> &'static str {
        match self {
            Source::Chembl => "chembl",
            Source::Pubchem => "pubchem",
            Source::Iuphar => "iuphar",
            Source::Bindingdb => "bindingdb",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chembl" => Ok(Source::Chembl),
            "pubchem" => Ok(Source::Pubchem),
            "iuphar" | "gtopdb" => Ok(Source::Iuphar),
            "bindingdb" => Ok(Source::Bindingdb),
            other => Err(format!("unknown source: {}", other)),
        }
    }
}

/// A measured value as delivered by a source: JSON number or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Lift a JSON field into a raw value. `null`, objects and arrays are absent.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map(RawValue::Number),
            serde_json::Value::String(s) => Some(RawValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(n) => write!(f, "{}", n),
            RawValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One unit-tagged affinity measurement, ready for normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub raw_value: Option<RawValue>,
    pub raw_unit: Option<String>,
    pub affinity_type: AffinityType,
    pub source: Source,
}

impl Measurement {
    pub fn new(
        source: Source,
        affinity_type: AffinityType,
        raw_value: Option<RawValue>,
        raw_unit: Option<String>,
    ) -> Self {
        Self {
            raw_value,
            raw_unit,
            affinity_type,
            source,
        }
    }
}

/// Literature provenance attached to a record, when the source supplies it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pmid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
}

/// Statistical summary of normalized values for one affinity type.
///
/// Never constructed for empty input: see [`crate::analysis::summarize`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub n: usize,
    #[serde(rename = "median_nM")]
    pub median_nm: f64,
    #[serde(rename = "min_nM")]
    pub min_nm: f64,
    #[serde(rename = "max_nM")]
    pub max_nm: f64,
}

/// Summaries keyed by affinity type, iterated in priority order.
pub type SummaryMap = BTreeMap<AffinityType, Summary>;

/// Identifying context for a ligand/target pair, passed through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub drug_name: String,
    #[serde(default)]
    pub smiles: String,
    #[serde(default)]
    pub cid: String,
    #[serde(default)]
    pub uniprot: String,
    #[serde(default)]
    pub gene: String,
    #[serde(default)]
    pub protein_name: String,
}

/// Machine-readable summary artifact (`summary.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryArtifact {
    pub meta: Meta,
    pub summaries: SummaryMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affinity_type_priority_order() {
        assert!(AffinityType::Ki < AffinityType::Kd);
        assert!(AffinityType::Kd < AffinityType::Ic50);
        assert!(AffinityType::Ic50 < AffinityType::Ec50);
    }

    #[test]
    fn test_affinity_type_parse() {
        assert_eq!(AffinityType::parse("Ki"), Some(AffinityType::Ki));
        assert_eq!(AffinityType::parse("KI"), Some(AffinityType::Ki));
        assert_eq!(AffinityType::parse(" ic50 "), Some(AffinityType::Ic50));
        assert_eq!(AffinityType::parse("pKi"), None);
        assert_eq!(AffinityType::parse("AC50"), None);
    }

    #[test]
    fn test_source_from_str() {
        assert_eq!("ChEMBL".parse::<Source>(), Ok(Source::Chembl));
        assert_eq!("gtopdb".parse::<Source>(), Ok(Source::Iuphar));
        assert!("drugbank".parse::<Source>().is_err());
    }

    #[test]
    fn test_raw_value_from_json() {
        assert_eq!(
            RawValue::from_json(&serde_json::json!(12.5)),
            Some(RawValue::Number(12.5))
        );
        assert_eq!(
            RawValue::from_json(&serde_json::json!("7.1")),
            Some(RawValue::Text("7.1".to_string()))
        );
        assert_eq!(RawValue::from_json(&serde_json::Value::Null), None);
    }

    #[test]
    fn test_summary_artifact_keys() {
        let mut summaries = SummaryMap::new();
        summaries.insert(
            AffinityType::Ic50,
            Summary {
                n: 3,
                median_nm: 15.0,
                min_nm: 5.0,
                max_nm: 25.0,
            },
        );
        let artifact = SummaryArtifact {
            meta: Meta::default(),
            summaries,
            generated_at: None,
        };

        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["summaries"]["IC50"]["n"], 3);
        assert_eq!(json["summaries"]["IC50"]["median_nM"], 15.0);
        assert!(json.get("generated_at").is_none());
        assert_eq!(json["meta"]["drug_name"], "");
    }
}
