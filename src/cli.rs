//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// BindReport - ligand/target binding affinity aggregator
///
/// Pulls Ki, Kd, IC50 and EC50 measurements from ChEMBL, PubChem,
/// IUPHAR/BPS and BindingDB, normalizes them to nM and writes
/// plain-language Markdown reports.
///
/// Examples:
///   bindreport fetch --protein EGFR.fasta --drug-name Lapatinib
///   bindreport fetch --protein EGFR.fasta --smiles 'CS(=O)(=O)CCNCc1ccc(o1)...'
///   bindreport reports --outdir results
///   bindreport batch jobs.toml
///   bindreport sweep --targets-dir targets --drug-name Gefitinib
///   bindreport --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .bindreport.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Number of ligand/target pairs processed at once
    #[arg(long, value_name = "NUM", global = true)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Attempts per HTTP request
    #[arg(long, value_name = "COUNT", global = true)]
    pub retries: Option<usize>,

    /// Skip the BindingDB summary page
    #[arg(long, global = true)]
    pub no_bindingdb: bool,

    /// Exit with code 2 when no quantitative affinity was found
    ///
    /// Useful for pipelines. For batches, applies when every pair came back empty.
    #[arg(long, global = true)]
    pub fail_on_empty: bool,

    /// Generate a default .bindreport.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch, summarize and report one ligand against one target
    Fetch(FetchArgs),

    /// Rebuild per-source reports from a previous fetch
    Reports {
        /// Folder holding summary.json and the record files
        #[arg(long, value_name = "DIR")]
        outdir: Option<PathBuf>,
    },

    /// Run every job listed in a TOML manifest
    Batch {
        /// Manifest with [[jobs]] entries (drug_name, smiles, fasta_path, outdir)
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,

        /// Root folder for jobs without an explicit outdir
        #[arg(long, value_name = "DIR")]
        outroot: Option<PathBuf>,
    },

    /// Run one ligand against every FASTA file in a folder
    Sweep {
        /// Folder containing .fasta targets
        #[arg(long, value_name = "DIR")]
        targets_dir: PathBuf,

        #[command(flatten)]
        ligand: LigandArgs,

        /// Root results folder
        #[arg(long, value_name = "DIR")]
        outroot: Option<PathBuf>,

        /// Keep all PubChem assays (no gene/target filter)
        #[arg(long)]
        pubchem_keep_all: bool,
    },
}

/// Ligand selection shared by `fetch` and `sweep`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct LigandArgs {
    /// Ligand name (e.g., Lapatinib)
    #[arg(long, value_name = "NAME")]
    pub drug_name: Option<String>,

    /// Ligand SMILES (takes precedence over --drug-name for structure lookup)
    #[arg(long, value_name = "SMILES")]
    pub smiles: Option<String>,
}

impl LigandArgs {
    /// True when at least one non-blank identifier was given.
    pub fn is_present(&self) -> bool {
        [&self.drug_name, &self.smiles]
            .iter()
            .any(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

/// Arguments of the `fetch` subcommand.
#[derive(clap::Args, Debug, Clone)]
pub struct FetchArgs {
    /// Protein FASTA path
    #[arg(long, value_name = "FILE")]
    pub protein: PathBuf,

    #[command(flatten)]
    pub ligand: LigandArgs,

    /// Output folder
    #[arg(long, value_name = "DIR")]
    pub outdir: Option<PathBuf>,

    /// Do not filter PubChem assays by gene/target name
    #[arg(long)]
    pub pubchem_keep_all: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// True when the selected subcommand asked to keep every PubChem assay.
    pub fn pubchem_keep_all(&self) -> bool {
        match &self.command {
            Some(Command::Fetch(fetch)) => fetch.pubchem_keep_all,
            Some(Command::Sweep {
                pubchem_keep_all, ..
            }) => *pubchem_keep_all,
            _ => false,
        }
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.retries == Some(0) {
            return Err("Retries must be at least 1".to_string());
        }

        match &self.command {
            None => Err("No command given. Run with --help for usage.".to_string()),
            Some(Command::Fetch(fetch)) => {
                if !fetch.ligand.is_present() {
                    return Err("Provide --drug-name or --smiles".to_string());
                }
                if !fetch.protein.is_file() {
                    return Err(format!(
                        "Protein FASTA not found: {}",
                        fetch.protein.display()
                    ));
                }
                Ok(())
            }
            Some(Command::Reports { .. }) => Ok(()),
            Some(Command::Batch { manifest, .. }) => {
                if !manifest.is_file() {
                    return Err(format!("Manifest not found: {}", manifest.display()));
                }
                Ok(())
            }
            Some(Command::Sweep {
                targets_dir,
                ligand,
                ..
            }) => {
                if !ligand.is_present() {
                    return Err("Provide --drug-name or --smiles".to_string());
                }
                if !targets_dir.is_dir() {
                    return Err(format!(
                        "Targets folder not found: {}",
                        targets_dir.display()
                    ));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(command: Option<Command>) -> Args {
        Args {
            command,
            config: None,
            verbose: false,
            quiet: false,
            concurrency: None,
            timeout: None,
            retries: None,
            no_bindingdb: false,
            fail_on_empty: false,
            init_config: false,
        }
    }

    fn fetch_command(protein: PathBuf, drug_name: Option<&str>) -> Command {
        Command::Fetch(FetchArgs {
            protein,
            ligand: LigandArgs {
                drug_name: drug_name.map(String::from),
                smiles: None,
            },
            outdir: None,
            pubchem_keep_all: false,
        })
    }

    #[test]
    fn test_validation_requires_ligand() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = dir.path().join("EGFR.fasta");
        std::fs::write(&fasta, ">sp|P00533|EGFR_HUMAN\nMRPSG\n").unwrap();

        let args = make_args(Some(fetch_command(fasta.clone(), None)));
        assert!(args.validate().is_err());

        let args = make_args(Some(fetch_command(fasta.clone(), Some("  "))));
        assert!(args.validate().is_err());

        let args = make_args(Some(fetch_command(fasta, Some("Lapatinib"))));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_fasta() {
        let args = make_args(Some(fetch_command(
            PathBuf::from("/nonexistent/target.fasta"),
            Some("Lapatinib"),
        )));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args(Some(Command::Reports { outdir: None }));
        assert!(args.validate().is_ok());

        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_values() {
        let mut args = make_args(Some(Command::Reports { outdir: None }));
        args.concurrency = Some(0);
        assert!(args.validate().is_err());

        args.concurrency = Some(2);
        args.retries = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_requires_command() {
        assert!(make_args(None).validate().is_err());

        let mut args = make_args(None);
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_parse_subcommands() {
        let args = Args::try_parse_from([
            "bindreport",
            "fetch",
            "--protein",
            "EGFR.fasta",
            "--drug-name",
            "Lapatinib",
            "--pubchem-keep-all",
            "-v",
        ])
        .unwrap();
        assert!(args.verbose);
        assert!(args.pubchem_keep_all());
        match args.command {
            Some(Command::Fetch(fetch)) => {
                assert_eq!(fetch.ligand.drug_name.as_deref(), Some("Lapatinib"));
                assert_eq!(fetch.protein, PathBuf::from("EGFR.fasta"));
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let args = Args::try_parse_from(["bindreport", "batch", "jobs.toml", "--concurrency", "8"])
            .unwrap();
        assert_eq!(args.concurrency, Some(8));
        assert!(!args.pubchem_keep_all());
    }
}
