//! scriptsense CLI
//!
//! Opens a workspace (config, extraction cache, symbol index, scope graph)
//! and runs one query against it:
//!
//! - `check`: call-site diagnostics for script files
//! - `lookup`: members and signatures of an indexed object
//! - `scopes`: the unit owning a path and the modules it can see
//! - `cache`: extraction cache statistics
//!
//! Logs go to stderr, results to stdout.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use scriptsense::index::SymbolIndex;
use scriptsense::render::{function_detail, function_markdown};
use scriptsense::Workspace;

/// Code intelligence for doc-commented platform scripts
///
/// Examples:
///   scriptsense check crm/main.js            # Type-check call sites
///   scriptsense lookup databaseManager       # List an object's members
///   scriptsense lookup globals open          # Show one function's overloads
///   scriptsense scopes crm/forms/edit.js     # Unit and visible modules
#[derive(Parser, Debug)]
#[command(name = "scriptsense")]
#[command(version)]
#[command(about, long_about = None)]
pub struct Cli {
    /// Workspace root directory
    ///
    /// Holds the solutions, the optional scriptsense.toml and the cache.
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// Verbose logging (debug level unless RUST_LOG says otherwise)
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Report call sites that match no overload
    Check {
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
    },
    /// Show an indexed object, or one of its functions
    Lookup { name: String, member: Option<String> },
    /// Show the unit owning a path and what it can see
    Scopes { path: PathBuf },
    /// Show extraction cache statistics
    Cache,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let workspace = Workspace::open(&cli.root)?;
    run(&workspace, &cli.command)
}

fn run(ws: &Workspace, command: &Command) -> Result<ExitCode> {
    match command {
        Command::Check { files } => Ok(if check(ws, files) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }),
        Command::Lookup { name, member } => Ok(lookup(ws, name, member.as_deref())),
        Command::Scopes { path } => Ok(scopes(ws, path)),
        Command::Cache => {
            let stats = ws.cache().stats();
            println!("{}", ws.config().display_summary());
            println!("entries: {}", stats.entries);
            println!("size:    {}", stats.size_human());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// `path:line:col: severity: message`, 1-based. Detail lines are indented.
/// False when any file has diagnostics or could not be checked.
fn check(ws: &Workspace, files: &[PathBuf]) -> bool {
    let mut failed = false;
    for file in files {
        match ws.check_file(file) {
            Ok(diagnostics) => {
                for d in &diagnostics {
                    println!(
                        "{}:{}:{}: {}: {}",
                        file.display(),
                        d.range.start.line + 1,
                        d.range.start.character + 1,
                        d.severity.label(),
                        d.message.replace('\n', "\n    ")
                    );
                }
                failed |= !diagnostics.is_empty();
            }
            Err(e) => {
                eprintln!("{}: {e:#}", file.display());
                failed = true;
            }
        }
    }
    !failed
}

fn lookup(ws: &Workspace, name: &str, member: Option<&str>) -> ExitCode {
    let Some(obj) = ws.index().lookup(name) else {
        let similar: Vec<&str> = ws
            .index()
            .search_objects(name)
            .into_iter()
            .map(|o| o.name.as_str())
            .collect();
        eprintln!("no object named '{name}'");
        if !similar.is_empty() {
            eprintln!("did you mean: {}", similar.join(", "));
        }
        return ExitCode::FAILURE;
    };

    match member {
        Some(member) => {
            let overloads: Vec<_> = obj.overloads(member).collect();
            if overloads.is_empty() {
                let similar: Vec<&str> = SymbolIndex::search_functions(obj, member)
                    .into_iter()
                    .map(|f| f.name.as_str())
                    .collect();
                eprintln!("'{name}' has no function '{member}'");
                if !similar.is_empty() {
                    eprintln!("did you mean: {}", similar.join(", "));
                }
                return ExitCode::FAILURE;
            }
            println!("{}\n", function_detail(overloads.iter().copied()));
            println!("{}", function_markdown(overloads));
        }
        None => {
            println!("{}\n\n{}\n", obj.name, obj.description);
            for f in &obj.functions {
                println!("{}", function_detail([f]));
            }
            for c in &obj.constants {
                println!("(constant) {}: {}", c.name, c.ty);
            }
            for p in &obj.properties {
                println!("(property) {}: {}", p.name, p.ty);
            }
        }
    }
    ExitCode::SUCCESS
}

fn scopes(ws: &Workspace, path: &std::path::Path) -> ExitCode {
    match scopes_report(ws, path) {
        Some(report) => {
            print!("{report}");
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("{} belongs to no unit", path.display());
            ExitCode::FAILURE
        }
    }
}

/// Unit owning `path`, its direct references, what it reaches indirectly
/// and its visible modules. `None` when no unit owns the path.
fn scopes_report(ws: &Workspace, path: &std::path::Path) -> Option<String> {
    let scopes = ws.scopes();
    let unit = scopes.solution_for_path(path)?;

    let references: Vec<String> = scopes.references_of(&unit.name).into_iter().collect();
    // Indirect references are listed but grant no visibility.
    let reachable: Vec<String> = scopes.graph().transitive_closure(&unit.name).into_iter().collect();

    let mut report = format!("unit: {} ({})\n", unit.name, unit.path.display());
    report.push_str(&format!("sees: {}\n", references.join(", ")));
    report.push_str(&format!("reaches: {}\n", reachable.join(", ")));
    for module in scopes.visible_modules(&unit.name) {
        report.push_str(&format!("  {} [{}]\n", module.module_name, module.origin_unit));
    }
    Some(report)
}
