//! fdb - inspect and maintain a fractal image database.
//!
//! Usage:
//!   fdb layout                 Show the database tree
//!   fdb scan                   Rescan every category
//!   fdb list <KIND>            Print a derived list
//!   fdb show <NAME>            Show the artifacts of an area
//!   fdb seen <FILE>            Mark a raster seen and relocate it
//!   fdb backup <FILE>          Move a file into its backup folder
//!   fdb --help                 Show help

use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context as _, Result, eyre};
use itertools::Itertools;
use serde_json::json;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use fractaldb_core::{AreaName, Category, QualifiedName};
use fractaldb_env::{Environment, EnvironmentOptions, ListKind};
use fractaldb_ops::Relocation;
use fractaldb_scan::{Context, Scanner, sub_names_of};

#[derive(Parser)]
#[command(
    name = "fdb",
    version,
    about = "Inspect and maintain a fractal image database",
    long_about = "fdb opens the database tree described by fractaldb.toml files, \
                  scans its artifacts and prints the derived lists used while \
                  curating the collection."
)]
struct Cli {
    /// Database root (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    db: PathBuf,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the database tree and its categories
    Layout,

    /// Rescan every category and print a summary
    Scan,

    /// Print a derived list
    List {
        /// List to print
        kind: ListChoice,

        /// Base area for dead ends
        #[arg(short, long, default_value = "root")]
        base: String,
    },

    /// Show the artifacts, variants and sub-areas of a name
    Show {
        /// Area or qualified name
        name: String,
    },

    /// Mark a raster file seen and move it into the seen store
    Seen {
        /// Raster file
        file: PathBuf,
    },

    /// Move a file into the backup folder of a category
    Backup {
        /// File to back up
        file: PathBuf,

        /// Category selecting the backup folder
        #[arg(short, long, default_value = "raster", value_parser = Category::from_str)]
        category: Category,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ListChoice {
    NewRasters,
    Variants,
    Leafs,
    Pending,
    DeadEnds,
    Unseen,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Layout => run_layout(&cli.db, cli.format)?,
        Command::Scan => run_scan(&cli.db, cli.verbose, cli.format)?,
        Command::List { kind, base } => run_list(&cli.db, kind, &base, cli.format)?,
        Command::Show { name } => run_show(&cli.db, &name, cli.format)?,
        Command::Seen { file } => run_seen(&cli.db, &file, cli.format)?,
        Command::Backup { file, category } => run_backup(&cli.db, &file, category)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "fractaldb=debug"
    } else {
        "fractaldb=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open(db: &Path) -> Result<Environment> {
    Environment::open(db, EnvironmentOptions::default())
        .with_context(|| format!("Cannot open database {}", db.display()))
}

/// Print the database tree.
fn run_layout(db: &Path, format: OutputFormat) -> Result<()> {
    let context = Context::open(db).context("Invalid database")?;

    match format {
        OutputFormat::Text => {
            for line in context.layout() {
                println!("{line}");
            }
        }
        OutputFormat::Json => {
            let members: Vec<_> = context
                .members()
                .iter()
                .map(|member| {
                    let database = member.database();
                    json!({
                        "label": database.label(),
                        "root": database.root(),
                        "readonly": database.is_readonly(),
                        "categories": database.categories().map(|c| c.to_string()).collect::<Vec<_>>(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&members)?);
        }
    }
    Ok(())
}

/// Rescan all categories and show per-category results.
fn run_scan(db: &Path, verbose: bool, format: OutputFormat) -> Result<()> {
    let options = EnvironmentOptions::builder()
        .initial_scan(false)
        .verbose(verbose)
        .build()?;
    let env = Environment::open(db, options)
        .with_context(|| format!("Cannot open database {}", db.display()))?;

    eprintln!("Scanning {}...", env.context().database().root().display());
    let results = env.rescan(verbose);

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(60));
            for (category, result) in &results {
                match result {
                    Ok(summary) => println!(
                        " {:<14} {:>7} names {:>8} artifacts {:>4} warnings  {:.2}s",
                        category.to_string(),
                        summary.names,
                        summary.artifacts,
                        summary.warnings,
                        summary.elapsed.as_secs_f64()
                    ),
                    Err(e) => println!(" {:<14} failed: {e}", category.to_string()),
                }
                if let Ok(summary) = result {
                    for failure in &summary.failed_members {
                        println!("   member {} failed: {}", failure.label, failure.message);
                    }
                }
            }
            println!("{}", "─".repeat(60));
            println!(" {} unseen", env.unseen().lock().len());
        }
        OutputFormat::Json => {
            let report: Vec<_> = results
                .iter()
                .map(|(category, result)| match result {
                    Ok(summary) => json!({
                        "category": category.to_string(),
                        "names": summary.names,
                        "artifacts": summary.artifacts,
                        "warnings": summary.warnings,
                        "failed_members": summary.failed_members.iter().map(|f| &f.label).collect::<Vec<_>>(),
                        "elapsed_secs": summary.elapsed.as_secs_f64(),
                    }),
                    Err(e) => json!({
                        "category": category.to_string(),
                        "error": e.to_string(),
                    }),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

/// Print one derived list.
fn run_list(db: &Path, kind: ListChoice, base: &str, format: OutputFormat) -> Result<()> {
    let env = open(db)?;

    let names: Vec<QualifiedName> = match kind {
        ListChoice::Unseen => env.unseen().lock().entries().to_vec(),
        ListChoice::DeadEnds => {
            let base = AreaName::parse(base)?;
            env.dead_ends(base)
                .ok_or_else(|| eyre!("No scanner for category all"))?
                .entries()
                .to_vec()
        }
        other => {
            let kind = match other {
                ListChoice::NewRasters => ListKind::NewRasters,
                ListChoice::Variants => ListKind::Variants,
                ListChoice::Leafs => ListKind::Leafs,
                _ => ListKind::Pending,
            };
            env.list(&kind)
                .ok_or_else(|| eyre!("List {kind} is not available in this database"))?
                .lock()
                .entries()
                .to_vec()
        }
    };

    print_names(&names, format)
}

fn print_names(names: &[QualifiedName], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for name in names {
                println!("{name}");
            }
            eprintln!("{} entries", names.len());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(names)?),
    }
    Ok(())
}

/// Show what the database knows about an area.
fn run_show(db: &Path, name: &str, format: OutputFormat) -> Result<()> {
    let qualified = QualifiedName::parse(name)?;
    let area = qualified.area_name();
    let env = open(db)?;
    let all = env
        .scanner(Category::All)
        .ok_or_else(|| eyre!("No scanner for category all"))?;

    let variants = all.qualified_names(area);
    let sub_names = sub_names_of(all.as_ref(), area, None);
    let handles = all.handles(area);
    let unseen = env.unseen().lock().contains(&qualified);
    let image = env.image_data_for_area(area);

    match format {
        OutputFormat::Text => {
            println!("{area}");
            println!("{}", "─".repeat(60));
            for handle in &handles {
                let size = std::fs::metadata(handle.path()).map(|m| m.len()).unwrap_or(0);
                println!(
                    " {:<24} {:<12} {:>10}  {}",
                    handle.name().to_string(),
                    format!("{:?}", handle.kind()),
                    format_size(size),
                    handle.path().display()
                );
            }
            if handles.is_empty() {
                println!(" no artifacts");
            }
            println!();
            println!(" variants : {}", join(variants.iter()));
            println!(" sub-areas: {}", join(sub_names.iter()));
            println!(" image    : {}", join(image.iter().map(|h| h.name())));
            if unseen {
                println!(" {qualified} is unseen");
            }
        }
        OutputFormat::Json => {
            let artifacts: Vec<_> = handles
                .iter()
                .map(|h| {
                    json!({
                        "name": h.name(),
                        "kind": format!("{:?}", h.kind()),
                        "path": h.path(),
                    })
                })
                .collect();
            let report = json!({
                "name": area,
                "artifacts": artifacts,
                "variants": variants,
                "sub_areas": sub_names,
                "image": image.as_ref().map(|h| h.path()),
                "unseen": unseen,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

/// Mark a raster seen.
fn run_seen(db: &Path, file: &Path, format: OutputFormat) -> Result<()> {
    let env = open(db)?;
    let file = file.canonicalize().context("Invalid path")?;
    let report = env.observe_raster(&file);

    let (outcome, detail) = match &report.relocation {
        Relocation::Moved { to, .. } => ("moved", to.display().to_string()),
        Relocation::Skipped(reason) => ("skipped", reason.to_string()),
        Relocation::Failed(e) => ("failed", e.to_string()),
    };

    match format {
        OutputFormat::Text => {
            match &report.name {
                Some(name) if report.seen_modified => println!("{name}: marked seen"),
                Some(name) => println!("{name}: already seen"),
                None => {}
            }
            if report.seen_modified && !report.persisted {
                println!("warning: seen list could not be saved");
            }
            println!("relocation {outcome}: {detail}");
        }
        OutputFormat::Json => {
            let json = json!({
                "name": report.name,
                "seen_modified": report.seen_modified,
                "persisted": report.persisted,
                "relocation": outcome,
                "detail": detail,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    if let Relocation::Failed(e) = report.relocation {
        return Err(e.into());
    }
    Ok(())
}

/// Move a file into its backup folder.
fn run_backup(db: &Path, file: &Path, category: Category) -> Result<()> {
    let options = EnvironmentOptions::builder().initial_scan(false).build()?;
    let env = Environment::open(db, options)
        .with_context(|| format!("Cannot open database {}", db.display()))?;

    match env.backup_file(file, category)? {
        Some(target) => println!("{} -> {}", file.display(), target.display()),
        None => return Err(eyre!("No backup folder configured for {category}")),
    }
    Ok(())
}

fn join<T: std::fmt::Display>(mut items: impl Iterator<Item = T>) -> String {
    let joined = items.join(", ");
    if joined.is_empty() { "-".to_string() } else { joined }
}

/// Format bytes as human-readable size.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
