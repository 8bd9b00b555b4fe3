//! Modchain CLI
//!
//! Loads a directory of module descriptors and inspects the resulting registry

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use modchain_core::{
    ActionOutcome, DelegationChain, FsViewStore, LoadReport, ModuleLoader, ModuleRegistry, RegistryConfig,
};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(name = "modchain")]
#[command(version)]
#[command(about = "Module registry with dependency checks and parent delegation", long_about = None)]
struct Cli {
    /// Registry configuration file (YAML)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load all modules and report which ones prepared successfully
    Check {
        /// Directory containing module descriptors
        dir: PathBuf,
    },
    /// List loaded modules
    List {
        dir: PathBuf,
        /// Print the registry as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write package manifests for every module
    Manifest { dir: PathBuf },
    /// Run an action, falling back to parent modules
    Dispatch {
        dir: PathBuf,
        /// Module id
        module: String,
        /// Action name
        action: String,
    },
    /// Render a view, falling back to parent modules
    Render {
        dir: PathBuf,
        /// Module id
        module: String,
        /// View path relative to the module directory
        view: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => RegistryConfig::load(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => RegistryConfig::default(),
    };

    match cli.command {
        Commands::Check { dir } => {
            let (_, reports) = load(&dir, config)?;
            print_reports(&reports);
            let failed = reports.iter().filter(|r| !r.is_ok()).count();
            if failed > 0 {
                bail!("{} of {} modules failed to load", failed, reports.len());
            }
        }
        Commands::List { dir, json } => {
            let (registry, _) = load(&dir, config)?;
            if json {
                let modules: Vec<_> = registry.list().iter().map(|m| m.as_ref().clone()).collect();
                println!("{}", serde_json::to_string_pretty(&modules)?);
            } else {
                list_modules(&registry)?;
            }
        }
        Commands::Manifest { dir } => {
            let config = RegistryConfig { emit_manifests: true, ..config };
            let (_, reports) = load(&dir, config)?;
            for report in &reports {
                if let Some(status) = report.manifest {
                    println!("{:<24} {:?}", report.id, status);
                }
            }
        }
        Commands::Dispatch { dir, module, action } => {
            let (registry, _) = load(&dir, config)?;
            match registry.dispatch(&module, &action)? {
                ActionOutcome::Handled(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                ActionOutcome::NotHandled => bail!("action '{}' not handled by '{}' or its parents", action, module),
            }
        }
        Commands::Render { dir, module, view } => {
            let (registry, _) = load(&dir, config)?;
            let store = FsViewStore::new();
            print!("{}", registry.output(&module, &view, &store)?);
        }
    }

    Ok(())
}

fn load(dir: &Path, config: RegistryConfig) -> anyhow::Result<(ModuleRegistry, Vec<LoadReport>)> {
    ModuleLoader::new(dir)
        .load(config)
        .with_context(|| format!("failed to load modules from {}", dir.display()))
}

fn print_reports(reports: &[LoadReport]) {
    for report in reports {
        match &report.error {
            None => println!("{} {}", "OK  ".green().bold(), report.id),
            Some(e) => println!("{} {}: {}", "FAIL".red().bold(), report.id, e),
        }
    }
}

fn list_modules(registry: &ModuleRegistry) -> anyhow::Result<()> {
    println!("{:<24} {:<12} {:<12} LINEAGE", "ID", "VERSION", "STATUS");
    let chain = DelegationChain::new(registry);
    for module in registry.list() {
        let lineage = chain.lineage(&module.id)?.join(" -> ");
        println!("{:<24} {:<12} {:<12} {}", module.id, module.version, module.status, lineage);
    }
    Ok(())
}
