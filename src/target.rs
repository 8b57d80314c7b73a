//! Protein target identification from FASTA files.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static UNIPROT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([OPQ][0-9][A-Z0-9]{3}[0-9]|[A-NR-Z][0-9][A-Z0-9]{3}[0-9])\b").unwrap()
});
static GENE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bGN=([A-Za-z0-9_-]+)").unwrap());

/// Identifiers of a protein target read from its FASTA header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetInfo {
    pub header: String,
    pub sequence: String,
    pub uniprot: Option<String>,
    pub gene: Option<String>,
    pub protein_name: Option<String>,
}

impl TargetInfo {
    /// Read and parse a FASTA file.
    pub fn from_fasta_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read FASTA file: {}", path.display()))?;
        Ok(Self::from_fasta(&content))
    }

    /// Parse FASTA text. Only a header on the first line counts; later
    /// header lines are skipped and every other line is sequence.
    pub fn from_fasta(content: &str) -> Self {
        let mut header = String::new();
        let mut sequence = String::new();

        for (i, line) in content.lines().enumerate() {
            if let Some(rest) = line.strip_prefix('>') {
                if i == 0 {
                    header = rest.trim().to_string();
                }
                continue;
            }
            sequence.push_str(line.trim());
        }

        Self {
            uniprot: extract_uniprot(&header),
            gene: extract_gene(&header),
            protein_name: extract_protein_name(&header),
            header,
            sequence,
        }
    }

    /// Text used to narrow PubChem assays: gene symbol, else protein name.
    pub fn filter_pattern(&self) -> Option<&str> {
        self.gene.as_deref().or(self.protein_name.as_deref())
    }

    /// Target term for BindingDB: UniProt accession, else protein name.
    pub fn search_term(&self) -> Option<&str> {
        self.uniprot.as_deref().or(self.protein_name.as_deref())
    }
}

/// First UniProt accession in a header.
pub fn extract_uniprot(header: &str) -> Option<String> {
    UNIPROT_RE.captures(header).map(|c| c[1].to_string())
}

/// Gene symbol from a `GN=` tag.
pub fn extract_gene(header: &str) -> Option<String> {
    GENE_RE.captures(header).map(|c| c[1].to_string())
}

/// Entry name from a `db|accession|name ...` header, else the first token.
pub fn extract_protein_name(header: &str) -> Option<String> {
    let parts: Vec<&str> = header.split('|').collect();
    let candidate = if parts.len() >= 3 { parts[2] } else { header };
    candidate.split_whitespace().next().map(String::from)
}
