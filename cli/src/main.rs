mod bootstrap;
mod config;
mod logging;
mod render;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use library_erd_core::build_diagram_with_style;
use library_erd_sqlite::{
    ActiveLoan, Catalog, Migration, MigrationStatus, introspect, introspect_sorted,
};
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info};

use crate::config::{AppConfig, DiagramFormat};
use crate::render::{RenderError, renderer_for};

/// CLI-specific diagram format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliDiagramFormat {
    Png,
    Svg,
    Pdf,
    Dot,
    Json,
}

impl From<CliDiagramFormat> for DiagramFormat {
    fn from(fmt: CliDiagramFormat) -> Self {
        match fmt {
            CliDiagramFormat::Png => Self::Png,
            CliDiagramFormat::Svg => Self::Svg,
            CliDiagramFormat::Pdf => Self::Pdf,
            CliDiagramFormat::Dot => Self::Dot,
            CliDiagramFormat::Json => Self::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "library-erd")]
#[command(about = "Library catalog showcase and entity-relationship diagram generator")]
struct Cli {
    /// YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create and seed the catalog database, then run the demo scenario.
    Showcase(ShowcaseArgs),
    /// Introspect the database schema and render an ER diagram.
    Erd(ErdArgs),
    /// Catalog table lifecycle operations.
    Migrate(MigrateArgs),
}

#[derive(Debug, Args)]
struct ShowcaseArgs {
    /// Database file path.
    #[arg(long)]
    db: Option<PathBuf>,
    /// SQL script to run instead of the bundled schema and demo data.
    #[arg(long)]
    schema: Option<PathBuf>,
    /// Keep an existing database instead of recreating it.
    #[arg(long)]
    keep: bool,
}

#[derive(Debug, Args)]
struct ErdArgs {
    /// Database file path.
    #[arg(long)]
    db: Option<PathBuf>,
    /// Output path without extension.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Output format.
    #[arg(long)]
    format: Option<CliDiagramFormat>,
    /// Sort tables by name instead of catalog order.
    #[arg(long)]
    sorted: bool,
    /// Graphviz executable.
    #[arg(long)]
    dot_binary: Option<String>,
    /// Keep the intermediate .dot file.
    #[arg(long)]
    keep_source: bool,
    /// Fail instead of running the seeding process when the database is missing.
    #[arg(long)]
    no_bootstrap: bool,
}

#[derive(Debug, Args)]
struct MigrateArgs {
    #[command(subcommand)]
    operation: MigrateOperation,
}

#[derive(Debug, Subcommand)]
enum MigrateOperation {
    /// Create the catalog tables.
    Up(MigrateDbArgs),
    /// Drop the catalog tables.
    Down(MigrateDbArgs),
    /// Insert the bundled demo data, or run an external SQL script.
    Seed(MigrateSeedArgs),
    /// Drop, recreate and reseed the catalog tables.
    Refresh(MigrateDbArgs),
    /// Show table status and row counts.
    Status(MigrateDbArgs),
}

#[derive(Debug, Args)]
struct MigrateDbArgs {
    /// Database file path.
    #[arg(long)]
    db: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct MigrateSeedArgs {
    /// Database file path.
    #[arg(long)]
    db: Option<PathBuf>,
    /// SQL script to execute instead of the bundled demo data.
    #[arg(long)]
    script: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };
    logging::init(&config.logging.level, cli.verbose);

    let result = match cli.command {
        Command::Showcase(args) => run_showcase(args, config),
        Command::Erd(args) => run_erd(args, config),
        Command::Migrate(args) => run_migrate(args, config),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_showcase(args: ShowcaseArgs, config: AppConfig) -> Result<(), String> {
    let db = args.db.unwrap_or(config.database);
    let showcase = config.showcase;
    let schema_script = args.schema.or(showcase.schema_script);

    if db.exists() && !args.keep {
        fs::remove_file(&db)
            .map_err(|err| format!("Failed to remove old database '{}': {err}", db.display()))?;
        println!("Removed old database '{}'.", db.display());
    }

    let mut migration = open_migration(&db)?;
    match &schema_script {
        Some(script) => {
            migration
                .run_script(script)
                .map_err(|e| format!("Schema script failed: {e}"))?;
            println!("Script '{}' executed.", script.display());
        }
        None => {
            migration
                .up()
                .map_err(|e| format!("Migration up failed: {e}"))?;
            let status = migration
                .status()
                .map_err(|e| format!("Failed to get migration status: {e}"))?;
            if status.book_count == 0 {
                migration
                    .seed()
                    .map_err(|e| format!("Seed failed: {e}"))?;
            }
            println!("Catalog schema and demo data loaded.");
        }
    }

    let conn = migration.into_connection();
    let catalog = Catalog::new(&conn).map_err(|e| e.to_string())?;

    println!("\n*** Step 1: initial active loans ***");
    print_active_loans(&catalog.list_active_loans().map_err(|e| e.to_string())?);

    println!("\n*** Step 2: register a new member ***");
    let member = &showcase.member;
    let member_id = catalog
        .add_member(
            &member.first_name,
            &member.last_name,
            &member.email,
            member.membership_expiry,
        )
        .map_err(|e| e.to_string())?;
    match member_id {
        Some(id) => println!(
            "Added member {} {} (id {id}).",
            member.first_name, member.last_name
        ),
        None => println!(
            "Member not added: email '{}' is already registered.",
            member.email
        ),
    }

    if let Some(member_id) = member_id {
        println!("\n*** Step 3: find an available copy of '{}' ***", showcase.title);
        let copy = catalog
            .find_available_copy(&showcase.title)
            .map_err(|e| e.to_string())?;

        match copy {
            Some(copy_id) => {
                println!("Found available copy {copy_id}.");
                println!("\n*** Step 4: loan the copy to the new member ***");
                match catalog.loan_copy(copy_id, member_id) {
                    Ok(receipt) => println!(
                        "Copy {} loaned to member {}. Due back {}.",
                        receipt.copy_id, receipt.member_id, receipt.due_date
                    ),
                    // A failed loan is reported and rolled back; the demo goes on.
                    Err(err) => println!("Loan failed: {err}"),
                }
            }
            None => println!(
                "'{}' is not in the catalog or all copies are out.",
                showcase.title
            ),
        }
    }

    println!("\n*** Step 5: final active loans ***");
    print_active_loans(&catalog.list_active_loans().map_err(|e| e.to_string())?);

    drop(catalog);
    conn.close()
        .map_err(|(_, err)| format!("Failed to close database: {err}"))?;
    println!("Database '{}' closed.", db.display());
    Ok(())
}

fn print_active_loans(loans: &[ActiveLoan]) {
    println!("--- Active loans ---");
    if loans.is_empty() {
        println!("All books are in the library.");
    }
    for loan in loans {
        println!(
            "Member: {}, Book: '{}', issued {}, due {}",
            loan.member_name, loan.title, loan.issue_date, loan.due_date
        );
    }
    println!("--------------------");
}

fn run_erd(args: ErdArgs, config: AppConfig) -> Result<(), String> {
    let db = args.db.unwrap_or(config.database);
    let mut erd = config.erd;
    if let Some(output) = args.output {
        erd.output = output;
    }
    if let Some(format) = args.format {
        erd.format = format.into();
    }
    if let Some(binary) = args.dot_binary {
        erd.render.dot_binary = binary;
    }
    erd.sorted |= args.sorted;
    erd.render.keep_source |= args.keep_source;
    erd.bootstrap &= !args.no_bootstrap;

    if bootstrap::ensure_database(&db, erd.bootstrap, erd.seed_command.as_deref())
        .map_err(|e| format!("Cannot prepare database: {e}"))?
    {
        println!("Database '{}' created by the seeding process.", db.display());
    }

    let conn = Connection::open_with_flags(&db, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| format!("Failed to open database '{}': {e}", db.display()))?;
    let model = if erd.sorted {
        introspect_sorted(&conn)
    } else {
        introspect(&conn)
    }
    .map_err(|e| format!("Schema introspection failed: {e}"))?;
    drop(conn);
    debug!(tables = model.tables.len(), relations = model.relations.len(), "model ready");

    let graph = build_diagram_with_style(&model, erd.style.clone())
        .map_err(|e| format!("Inconsistent schema snapshot: {e}"))?;

    let renderer = renderer_for(erd.format, &erd.render);
    let path = renderer.render(&graph, &erd.output).map_err(|err| match err {
        RenderError::Unavailable(_) => format!(
            "{err}. Make sure Graphviz is installed, or use --format dot|json."
        ),
        other => other.to_string(),
    })?;

    info!(nodes = graph.nodes.len(), edges = graph.edges.len(), "diagram written");
    println!("Diagram saved to '{}'.", path.display());
    Ok(())
}

fn run_migrate(args: MigrateArgs, config: AppConfig) -> Result<(), String> {
    let default_db = config.database;
    match args.operation {
        MigrateOperation::Up(a) => {
            let db = a.db.unwrap_or(default_db);
            open_migration(&db)?
                .up()
                .map_err(|e| format!("Migration up failed: {e}"))?;
            println!("Migration up complete. Tables created in '{}'.", db.display());
        }
        MigrateOperation::Down(a) => {
            let db = a.db.unwrap_or(default_db);
            open_migration(&db)?
                .down()
                .map_err(|e| format!("Migration down failed: {e}"))?;
            println!("Migration down complete. Tables dropped from '{}'.", db.display());
        }
        MigrateOperation::Seed(a) => {
            let db = a.db.unwrap_or(default_db);
            let mut migration = open_migration(&db)?;
            let status = match a.script {
                Some(script) => {
                    migration
                        .run_script(&script)
                        .map_err(|e| format!("Seed failed: {e}"))?;
                    migration
                        .status()
                        .map_err(|e| format!("Failed to get migration status: {e}"))?
                }
                None => migration.seed().map_err(|e| format!("Seed failed: {e}"))?,
            };
            println!("Seed complete:");
            print_counts(&status);
        }
        MigrateOperation::Refresh(a) => {
            let db = a.db.unwrap_or(default_db);
            let status = open_migration(&db)?
                .refresh()
                .map_err(|e| format!("Refresh failed: {e}"))?;
            println!("Refresh complete (tables dropped, recreated, and reseeded):");
            print_counts(&status);
        }
        MigrateOperation::Status(a) => {
            let db = a.db.unwrap_or(default_db);
            let status = open_migration(&db)?
                .status()
                .map_err(|e| format!("Failed to get migration status: {e}"))?;
            println!("Migration Status:");
            println!(
                "  Tables exist: {}",
                if status.tables_exist { "yes" } else { "no" }
            );
            print_counts(&status);
        }
    }
    Ok(())
}

fn print_counts(status: &MigrationStatus) {
    println!("  Members: {}", status.member_count);
    println!("  Books: {}", status.book_count);
    println!("  Copies: {}", status.copy_count);
    println!(
        "  Loans: {} ({} active)",
        status.loan_count, status.active_loan_count
    );
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_migration(db: &Path) -> Result<Migration, String> {
    let conn = Connection::open(db)
        .map_err(|e| format!("Failed to open database '{}': {e}", db.display()))?;
    Migration::new(conn).map_err(|e| format!("Failed to initialize migration: {e}"))
}
