use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use modelsync_catalog::SnapshotCatalog;
use modelsync_core::{ClassKind, JsonModelStore, ModelGraph, ModelStore, Severity, SyncConfig, SyncReport};
use modelsync_engine::Synchronizer;

/// Config file picked up from the working directory when `--config` is absent
const DEFAULT_CONFIG: &str = "modelsync.toml";

/// ModelSync - keep a model graph in step with a database catalog
#[derive(Parser)]
#[command(name = "modelsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: modelsync.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a catalog snapshot into a model file
    Sync {
        /// Catalog snapshot (JSON)
        #[arg(long)]
        catalog: PathBuf,

        /// Model file; created if it does not exist
        #[arg(short, long)]
        model: PathBuf,

        /// Output file for the sync report
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Run the sync without writing the model file
        #[arg(long)]
        dry_run: bool,
    },

    /// Summarize the classes and associations of a model file
    Inspect {
        /// Model file
        #[arg(short, long)]
        model: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref(), Path::new("."), cli.verbose)?;

    match cli.command {
        Commands::Sync { catalog, model, report, dry_run } => {
            sync_command(config, &catalog, &model, report.as_deref(), dry_run)
        }
        Commands::Inspect { model } => inspect_command(&model),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Load `path`, or `DEFAULT_CONFIG` inside `dir` when no path is given
fn load_config(path: Option<&Path>, dir: &Path, verbose: bool) -> Result<SyncConfig> {
    let default_path = dir.join(DEFAULT_CONFIG);
    let path = match path {
        Some(path) => Some(path),
        None if default_path.exists() => Some(default_path.as_path()),
        None => None,
    };

    let Some(path) = path else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        return Ok(SyncConfig::default());
    };

    let config = SyncConfig::from_file(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    if verbose {
        eprintln!("{} {}", "Using config:".cyan(), path.display());
    }
    Ok(config)
}

/// Sync command - reconcile the catalog into the model
fn sync_command(
    config: SyncConfig,
    catalog_path: &Path,
    model_path: &Path,
    report_path: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let catalog = SnapshotCatalog::from_file(catalog_path)
        .with_context(|| format!("Failed to load catalog snapshot {}", catalog_path.display()))?;

    let store = JsonModelStore::new();
    let graph_name = model_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Model");
    let graph = store.load_or_default(model_path, graph_name)?;

    let outcome = Synchronizer::new(config).run(&catalog, graph)?;

    if dry_run {
        tracing::info!(path = %model_path.display(), "Dry run, model not written");
    } else {
        store.save(&outcome.graph, model_path)?;
    }

    if let Some(path) = report_path {
        outcome
            .report
            .save_to_file(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Report saved");
    }

    print_sync_summary(&outcome.report, model_path, dry_run);
    Ok(())
}

/// Inspect command - show what a model file contains
fn inspect_command(model_path: &Path) -> Result<()> {
    let graph = JsonModelStore::new().load(model_path)?;
    print_model(&graph);
    Ok(())
}

fn print_sync_summary(report: &SyncReport, model_path: &Path, dry_run: bool) {
    let summary = &report.summary;

    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Model Sync Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Catalog: {}", report.catalog);
    println!("Model:   {}", model_path.display());
    println!();

    println!("{}", "Summary:".bold());
    println!("  Classes:      {} created, {} updated", summary.classes_created, summary.classes_updated);
    println!("  Attributes:   {} created, {} updated", summary.attributes_created, summary.attributes_updated);
    println!(
        "  Associations: {} created, {} reused, {} skipped",
        summary.associations_created, summary.associations_reused, summary.foreign_keys_skipped
    );
    println!("  Indexes:      {} created, {} updated", summary.indexes_created, summary.indexes_updated);
    println!("  Procedures:   {} created, {} updated", summary.procedures_created, summary.procedures_updated);

    if summary.warnings > 0 {
        println!("  Warnings:     {}", summary.warnings.to_string().yellow());
    } else {
        println!("  Warnings:     {}", summary.warnings.to_string().green());
    }
    println!();

    for diag in &report.diagnostics {
        let severity = match diag.severity {
            Severity::Error => "ERROR".red().bold(),
            Severity::Warn => "WARN".yellow().bold(),
            Severity::Info => "INFO".cyan(),
        };
        println!("  [{}] {}: {}", severity, diag.code, diag.message);
        if let Some(object) = &diag.object {
            println!("    at {}", object);
        }
    }

    if dry_run {
        println!("{}", "Dry run: model file left untouched".yellow());
    } else if summary.has_changes() {
        println!("{}", "✓ Model updated".green().bold());
    } else {
        println!("{}", "✓ Model already up to date".green().bold());
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}

fn print_model(graph: &ModelGraph) {
    println!("\n{} {}", "Model:".bold(), graph.name.green());
    println!(
        "{} folders, {} classes, {} associations, {} procedures",
        graph.folders.len(),
        graph.classes.len(),
        graph.associations.len(),
        graph.procedures.len()
    );
    println!();

    println!("{}", "Classes:".bold());
    for class in &graph.classes {
        let kind = match class.kind {
            ClassKind::Table => class.kind.to_string().normal(),
            ClassKind::View => class.kind.to_string().cyan(),
            ClassKind::DataContract => class.kind.to_string().magenta(),
        };
        let source = class.external_ref.as_deref().unwrap_or("-");
        println!("  {} [{}] {} attributes ({})", class.name.bold(), kind, class.attributes.len(), source.dimmed());
    }

    if !graph.associations.is_empty() {
        println!();
        println!("{}", "Associations:".bold());
        for association in &graph.associations {
            let name_of = |id: &str| graph.class(id).map(|c| c.name.as_str()).unwrap_or("?");
            let arity = if association.source_end.collection { "*" } else { "1" };
            println!(
                "  {} ({}) -> {} as {}",
                name_of(&association.source_end.class_id),
                arity,
                name_of(&association.target_end.class_id),
                association.target_end.name.as_deref().unwrap_or("-"),
            );
        }
    }

    if !graph.procedures.is_empty() {
        println!();
        println!("{}", "Stored procedures:".bold());
        for procedure in &graph.procedures {
            let returns = match &procedure.return_type {
                Some(type_ref) => type_ref.type_id.as_deref().map_or("untyped".to_string(), |id| {
                    graph.class(id).map_or_else(|| id.to_string(), |c| c.name.clone())
                }),
                None => "nothing".to_string(),
            };
            println!("  {} ({} parameters) returns {}", procedure.name.bold(), procedure.parameters.len(), returns);
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sync_arguments() {
        let cli = Cli::try_parse_from([
            "modelsync", "--verbose", "sync", "--catalog", "catalog.json", "--model", "model.json", "--dry-run",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Sync { catalog, model, report, dry_run } => {
                assert_eq!(catalog, PathBuf::from("catalog.json"));
                assert_eq!(model, PathBuf::from("model.json"));
                assert!(report.is_none());
                assert!(dry_run);
            }
            Commands::Inspect { .. } => panic!("expected sync"),
        }
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(None, dir.path(), false).unwrap();
        assert_eq!(config, SyncConfig::default());
    }

    #[test]
    fn default_config_is_picked_up_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut expected = SyncConfig::default();
        expected.export.indexes = false;
        expected.save_to_file(&dir.path().join(DEFAULT_CONFIG)).unwrap();

        let config = load_config(None, dir.path(), false).unwrap();
        assert_eq!(config, expected);
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(load_config(Some(&missing), dir.path(), false).is_err());
    }
}
