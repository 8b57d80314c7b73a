//! Retrieval adapters for the public affinity databases.
//!
//! Each adapter turns remote JSON/HTML into typed records that can be
//! persisted as-is and converted into [`Measurement`]s. A failing source
//! degrades to an empty record set; it never aborts the unit of work.

pub mod bindingdb;
pub mod chembl;
pub mod http;
pub mod iuphar;
pub mod pubchem;

pub use bindingdb::BindingDbRow;
pub use chembl::ChemblActivity;
pub use http::{HttpClient, SourceError};
pub use iuphar::IupharInteraction;
pub use pubchem::{LigandIdentity, PubchemAssay};

use crate::models::{Measurement, Source};
use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::warn;

/// Records that can be reduced to unit-tagged measurements.
pub trait ToMeasurements {
    fn measurements(&self) -> Vec<Measurement>;
}

impl<T: ToMeasurements> ToMeasurements for [T] {
    fn measurements(&self) -> Vec<Measurement> {
        self.iter().flat_map(|r| r.measurements()).collect()
    }
}

/// All records retrieved for one ligand/target pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceRecords {
    pub chembl: Vec<ChemblActivity>,
    pub pubchem: Vec<PubchemAssay>,
    pub iuphar: Vec<IupharInteraction>,
    pub bindingdb: Vec<BindingDbRow>,
}

impl SourceRecords {
    /// Measurements contributed by one source. BindingDB rows carry none.
    pub fn measurements(&self, source: Source) -> Vec<Measurement> {
        match source {
            Source::Chembl => self.chembl.measurements(),
            Source::Pubchem => self.pubchem.measurements(),
            Source::Iuphar => self.iuphar.measurements(),
            Source::Bindingdb => Vec::new(),
        }
    }

    /// Number of raw records retrieved from one source.
    pub fn record_count(&self, source: Source) -> usize {
        match source {
            Source::Chembl => self.chembl.len(),
            Source::Pubchem => self.pubchem.len(),
            Source::Iuphar => self.iuphar.len(),
            Source::Bindingdb => self.bindingdb.len(),
        }
    }

    /// File name used to persist a source's records.
    pub fn file_name(source: Source) -> String {
        match source {
            Source::Bindingdb => "bindingdb_rows.json".to_string(),
            other => format!("{}_records.json", other.slug()),
        }
    }

    /// Persist every source's records into `outdir`.
    pub fn save(&self, outdir: &Path) -> Result<()> {
        save_records(&outdir.join(Self::file_name(Source::Chembl)), &self.chembl)?;
        save_records(&outdir.join(Self::file_name(Source::Pubchem)), &self.pubchem)?;
        save_records(&outdir.join(Self::file_name(Source::Iuphar)), &self.iuphar)?;
        save_records(&outdir.join(Self::file_name(Source::Bindingdb)), &self.bindingdb)?;
        Ok(())
    }

    /// Load previously persisted records. Missing or unreadable files are empty.
    pub fn load(outdir: &Path) -> Self {
        Self {
            chembl: load_records(&outdir.join(Self::file_name(Source::Chembl))),
            pubchem: load_records(&outdir.join(Self::file_name(Source::Pubchem))),
            iuphar: load_records(&outdir.join(Self::file_name(Source::Iuphar))),
            bindingdb: load_records(&outdir.join(Self::file_name(Source::Bindingdb))),
        }
    }
}

fn save_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let content = serde_json::to_string_pretty(records)?;
    crate::report::write_atomic(path, &content)
        .with_context(|| format!("Failed to save records to {}", path.display()))
}

fn load_records<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) if !c.trim().is_empty() => c,
        _ => return Vec::new(),
    };

    match serde_json::from_str(&content) {
        Ok(records) => records,
        Err(e) => {
            warn!("Ignoring unreadable records file {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Read a JSON scalar as text: strings as-is, numbers rendered.
pub(crate) fn json_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
