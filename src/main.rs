//! BindReport - ligand/target binding affinity aggregator
//!
//! A CLI tool that collects Ki/Kd/IC50/EC50 measurements from public
//! databases, normalizes them to nM and writes plain-language reports.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, unreadable input, write failure, etc.)
//!   2 - No quantitative affinity found and --fail-on-empty was set

mod analysis;
mod batch;
mod cli;
mod config;
mod models;
mod pipeline;
mod report;
mod sources;
mod target;

use anyhow::{Context, Result};
use cli::{Args, Command, FetchArgs, LigandArgs};
use config::{Config, CONFIG_FILE_NAME};
use pipeline::{Pipeline, UnitRequest};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration; its verbose setting feeds the log level
    let (mut config, config_origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(config.log_level(args.quiet));

    info!("BindReport v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", config_origin);
    debug!("Arguments: {:?}", args);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .bindreport.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize endpoints, retries, PubChem filtering, and more.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Dispatch the selected command. Returns the exit code.
async fn run(args: Args, mut config: Config) -> Result<i32> {
    let Some(command) = args.command.clone() else {
        return Ok(1);
    };

    match command {
        Command::Fetch(fetch) => run_fetch(&args, config, fetch).await,
        Command::Reports { outdir } => {
            let outdir = outdir.unwrap_or_else(|| PathBuf::from(&config.general.outdir));
            run_reports(&outdir)
        }
        Command::Batch { manifest, outroot } => {
            // Batch jobs keep every PubChem assay.
            config.sources.pubchem_keep_all = true;
            let outroot = outroot.unwrap_or_else(|| PathBuf::from(&config.general.outdir));
            let manifest = batch::Manifest::load(&manifest)?;
            let requests = batch::plan_manifest(&manifest, &outroot);
            run_batch(&args, config, requests).await
        }
        Command::Sweep {
            targets_dir,
            ligand,
            outroot,
            ..
        } => {
            let outroot = outroot.unwrap_or_else(|| PathBuf::from(&config.general.outdir));
            let targets = batch::discover_targets(&targets_dir)?;
            if targets.is_empty() {
                eprintln!("No FASTA files in: {}", targets_dir.display());
                return Ok(1);
            }
            let LigandArgs { drug_name, smiles } = ligand;
            let requests =
                batch::plan_sweep(&targets, drug_name.as_deref(), smiles.as_deref(), &outroot);
            run_batch(&args, config, requests).await
        }
    }
}

/// Fetch one ligand/target pair.
async fn run_fetch(args: &Args, config: Config, fetch: FetchArgs) -> Result<i32> {
    let start_time = Instant::now();

    let request = UnitRequest {
        fasta_path: fetch.protein,
        drug_name: fetch.ligand.drug_name,
        smiles: fetch.ligand.smiles,
        outdir: fetch
            .outdir
            .unwrap_or_else(|| PathBuf::from(&config.general.outdir)),
    };

    println!(
        "🔬 Fetching affinities: {} vs {}",
        request
            .drug_name
            .as_deref()
            .or(request.smiles.as_deref())
            .unwrap_or("?"),
        request.fasta_path.display()
    );

    let pipeline = Pipeline::new(config)?;
    let outcome = pipeline.run_unit(&request).await?;

    println!("\n✅ Online fetch complete.");
    println!(
        "   Ligand: {} | CID: {} | UniProt: {}",
        outcome.meta.drug_name, outcome.meta.cid, outcome.meta.uniprot
    );
    println!("   {}", outcome.counts_line());
    println!("   {}", outcome.summary_line());
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!("   Reports saved to: {}", outcome.outdir.display());

    if args.fail_on_empty && !outcome.has_data() {
        eprintln!("\n⛔ No quantitative affinities found. Failing (exit code 2).");
        return Ok(2);
    }

    Ok(0)
}

/// Rebuild per-source reports from a previous fetch.
fn run_reports(outdir: &Path) -> Result<i32> {
    let written = pipeline::rebuild_reports(outdir)?;

    println!("Per-source reports written to {}:", outdir.display());
    for path in &written {
        if let Some(name) = path.file_name() {
            println!(" - {}", name.to_string_lossy());
        }
    }

    Ok(0)
}

/// Run a list of units with bounded concurrency.
async fn run_batch(args: &Args, config: Config, requests: Vec<UnitRequest>) -> Result<i32> {
    let start_time = Instant::now();

    if requests.is_empty() {
        warn!("Nothing to run");
        println!("No runnable jobs.");
        return Ok(if args.fail_on_empty { 2 } else { 0 });
    }

    let concurrency = config.general.concurrency;
    println!(
        "📦 Running {} ligand/target pairs ({} at a time)...",
        requests.len(),
        concurrency
    );

    let pipeline = Pipeline::new(config)?;
    let pipeline = &pipeline;
    let summary = batch::run_units(requests, concurrency, !args.quiet, |request| async move {
        pipeline.run_unit(&request).await
    })
    .await;

    println!("\n📊 Batch Summary:");
    println!("   Completed: {} / {}", summary.completed, summary.total());
    println!("   With quantitative data: {}", summary.with_data);
    for (outdir, reason) in &summary.failed {
        println!("   ⚠️  {}: {}", outdir.display(), reason);
    }
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!("\n✅ Batch complete.");

    if args.fail_on_empty && summary.with_data == 0 {
        eprintln!("\n⛔ No pair produced quantitative affinities. Failing (exit code 2).");
        return Ok(2);
    }

    Ok(0)
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is installed, so it returns a description of where
/// the configuration came from instead of logging it.
fn load_config(args: &Args) -> Result<(Config, String)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, format!("loaded from {}", config_path.display())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, format!("loaded from {}", CONFIG_FILE_NAME))),
        Ok(None) => Ok((Config::default(), "defaults (no config file found)".to_string())),
        Err(e) => Ok((
            Config::default(),
            format!("defaults (failed to load {}: {})", CONFIG_FILE_NAME, e),
        )),
    }
}
