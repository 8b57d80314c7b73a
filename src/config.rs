//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.bindreport.toml` files.

use crate::models::Source;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".bindreport.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Per-database retrieval settings.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output directory (root directory for batches).
    #[serde(default = "default_outdir")]
    pub outdir: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Number of ligand/target pairs processed at once in batches.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            outdir: default_outdir(),
            verbose: false,
            concurrency: default_concurrency(),
        }
    }
}

fn default_outdir() -> String {
    "results".to_string()
}

fn default_concurrency() -> usize {
    4
}

/// HTTP client settings shared by every database adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Attempts per JSON request.
    #[serde(default = "default_retries")]
    pub retries: usize,

    /// Pause between attempts in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_user_agent() -> String {
    "DTA-OnlineFetcher/1.0".to_string()
}

fn default_timeout() -> u64 {
    20
}

fn default_retries() -> usize {
    3
}

fn default_retry_delay_ms() -> u64 {
    1200
}

/// Database endpoints and retrieval limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_chembl_url")]
    pub chembl_url: String,

    #[serde(default = "default_pubchem_url")]
    pub pubchem_url: String,

    #[serde(default = "default_iuphar_url")]
    pub iuphar_url: String,

    #[serde(default = "default_bindingdb_url")]
    pub bindingdb_url: String,

    /// Activities requested per ChEMBL page.
    #[serde(default = "default_chembl_page_size")]
    pub chembl_page_size: usize,

    /// Stop paging a ChEMBL target once the offset passes this value.
    #[serde(default = "default_chembl_max_offset")]
    pub chembl_max_offset: usize,

    /// Keep every PubChem assay instead of filtering by gene/target name.
    #[serde(default)]
    pub pubchem_keep_all: bool,

    /// Query the BindingDB summary page.
    #[serde(default = "default_true")]
    pub enable_bindingdb: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            chembl_url: default_chembl_url(),
            pubchem_url: default_pubchem_url(),
            iuphar_url: default_iuphar_url(),
            bindingdb_url: default_bindingdb_url(),
            chembl_page_size: default_chembl_page_size(),
            chembl_max_offset: default_chembl_max_offset(),
            pubchem_keep_all: false,
            enable_bindingdb: true,
        }
    }
}

fn default_chembl_url() -> String {
    "https://www.ebi.ac.uk/chembl/api/data".to_string()
}

fn default_pubchem_url() -> String {
    "https://pubchem.ncbi.nlm.nih.gov/rest/pug".to_string()
}

fn default_iuphar_url() -> String {
    "https://www.guidetopharmacology.org/services".to_string()
}

fn default_bindingdb_url() -> String {
    "https://www.bindingdb.org/rwd/bind/chemsearch/marvin/SummaryBindingPage.jsp".to_string()
}

fn default_chembl_page_size() -> usize {
    200
}

fn default_chembl_max_offset() -> usize {
    6000
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Sources folded into the combined `report_online.md` summary.
    #[serde(default = "default_combined_sources")]
    pub combined_sources: Vec<Source>,

    /// Write `report_<source>.md` next to the combined report.
    #[serde(default = "default_true")]
    pub write_per_source: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            combined_sources: default_combined_sources(),
            write_per_source: true,
        }
    }
}

fn default_combined_sources() -> Vec<Source> {
    vec![Source::Chembl, Source::Pubchem]
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(concurrency) = args.concurrency {
            self.general.concurrency = concurrency;
        }
        if let Some(timeout) = args.timeout {
            self.http.timeout_seconds = timeout;
        }
        if let Some(retries) = args.retries {
            self.http.retries = retries;
        }
        if args.no_bindingdb {
            self.sources.enable_bindingdb = false;
        }
        if args.pubchem_keep_all() {
            self.sources.pubchem_keep_all = true;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Log level once CLI flags are merged: `--quiet` wins, then `verbose`.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
