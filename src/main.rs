//! Archmap CLI - drive the project persistence core from the terminal

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use archmap::config::{self, ArchmapConfig};
use archmap::db::{ensure_schema, Catalog, ProjectStore, Session};
use archmap::ui::{self, Icons, ProjectRow};
use archmap::{compile, derive_schema_id, Document};

#[derive(Parser)]
#[command(name = "archmap")]
#[command(version = "0.0.1")]
#[command(about = "Architecture mapper persistence core - per-project relational storage for function diagrams")]
#[command(long_about = r#"
Archmap persists visually composed function diagrams, one schema per
project, in a PostgreSQL store:
  • Register projects in a global catalog
  • Save/load diagram documents transactionally
  • Compile diagrams into GenAI implementation prompts

Example usage:
  archmap projects
  archmap save --file diagram.json --project "My App"
  archmap load --project "My App" --file diagram.json
  archmap compile --project "My App"
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ./archmap.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store host (overrides config)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Store port (overrides config)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Database name (overrides config)
    #[arg(long, global = true)]
    dbname: Option<String>,

    /// Store user (overrides config)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Store password (or set ARCHMAP_PASSWORD)
    #[arg(long, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an archmap.toml with the resolved connection settings
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Probe the store connection, creating the database if missing
    Connect,

    /// Register a new empty project and provision its schema
    Create {
        /// Project name
        #[arg(short, long)]
        name: String,
    },

    /// List all projects, most recently updated first
    Projects,

    /// Save a diagram document into its project (replace-all)
    Save {
        /// Diagram document to save
        #[arg(short, long)]
        file: PathBuf,

        /// Project name (defaults to the document's own)
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Load a project back into a diagram document
    Load {
        /// Project name
        #[arg(short, long)]
        project: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Permanently delete a project and all its data
    Delete {
        /// Project name
        #[arg(short, long)]
        project: String,

        /// Confirm the irreversible drop
        #[arg(long)]
        yes: bool,
    },

    /// Compile a diagram into GenAI implementation prompts
    Compile {
        /// Diagram document to compile (otherwise --project reads the store)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Project to read from the store
        #[arg(short, long)]
        project: Option<String>,

        /// Write prompts to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip function descriptions
        #[arg(long)]
        no_descriptions: bool,

        /// Skip input/output details
        #[arg(long)]
        no_io: bool,

        /// Skip the inferred data-flow section
        #[arg(long)]
        no_relationships: bool,

        /// Skip per-function implementation prompts
        #[arg(long)]
        no_implementation: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let file_config = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    let params = file_config.resolve(
        cli.host.clone(),
        cli.port,
        cli.dbname.clone(),
        cli.user.clone(),
        cli.password.clone(),
    );

    match cli.command {
        Commands::Init { force } => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(config::default_config_path);
            let written = ArchmapConfig {
                host: Some(params.host.clone()),
                port: Some(params.port),
                database: Some(params.database.clone()),
                user: Some(params.user.clone()),
            };
            config::write_config(&path, &written, force)?;
            ui::success(&format!("wrote {}", path.display()));
        }

        Commands::Connect => {
            let session = Session::ensure_database_exists(&params)?;
            ui::success(&format!(
                "connected to '{}' on {}:{} as {}",
                params.database, params.host, params.port, params.user
            ));
            session.close()?;
        }

        Commands::Create { name } => {
            let mut session = Session::ensure_database_exists(&params)?;
            let mut catalog = Catalog::open(&mut session)?;
            if catalog.get_project(&name)?.is_some() {
                anyhow::bail!("project '{}' already exists", name);
            }
            let project = catalog.upsert_project(&name)?;
            let schema = derive_schema_id(&project.name);
            ensure_schema(&mut session, &schema)?;
            ui::success(&format!(
                "created project '{}' (schema {})",
                project.name, schema
            ));
        }

        Commands::Projects => {
            let mut session = Session::ensure_database_exists(&params)?;
            let projects = Catalog::open(&mut session)?.list_projects()?;
            if projects.is_empty() {
                ui::info("projects", "none found");
                return Ok(());
            }

            let mut rows = Vec::with_capacity(projects.len());
            for project in &projects {
                let count = ProjectStore::new(&mut session).count_functions(&project.name)?;
                rows.push(ProjectRow::new(project, count));
            }

            ui::header("Projects");
            println!("{}", ui::projects_table(&rows));
        }

        Commands::Save { file, project } => {
            let document = Document::load_from_path(&file)?;
            let name = project.unwrap_or_else(|| document.project.clone());

            let mut session = Session::ensure_database_exists(&params)?;
            let saved = ProjectStore::new(&mut session).save(&name, &document.functions)?;
            let count = saved.len();

            // Flow the assigned ids back into the caller's document.
            Document::new(name.clone(), saved).save_to_path(&file)?;
            ui::success(&format!("saved {count} functions to project '{name}'"));
        }

        Commands::Load { project, file } => {
            let mut session = Session::ensure_database_exists(&params)?;
            let nodes = ProjectStore::new(&mut session).load(&project)?;
            let count = nodes.len();
            let document = Document::new(project.clone(), nodes);

            match file {
                Some(path) => {
                    document.save_to_path(&path)?;
                    ui::success(&format!(
                        "loaded {count} functions from '{project}' into {}",
                        path.display()
                    ));
                }
                None => println!("{}", serde_json::to_string_pretty(&document)?),
            }
        }

        Commands::Delete { project, yes } => {
            if !yes {
                ui::warn(&format!(
                    "deleting '{project}' permanently removes the project, all its functions, and all inputs/outputs"
                ));
                anyhow::bail!("re-run with --yes to confirm");
            }

            let mut session = Session::ensure_database_exists(&params)?;
            ProjectStore::new(&mut session).delete(&project)?;
            ui::status(Icons::TRASH, "deleted", &project);
        }

        Commands::Compile {
            file,
            project,
            output,
            no_descriptions,
            no_io,
            no_relationships,
            no_implementation,
        } => {
            let (name, nodes) = match (file, project) {
                (Some(path), maybe_name) => {
                    let document = Document::load_from_path(&path)?;
                    (
                        maybe_name.unwrap_or(document.project),
                        document.functions,
                    )
                }
                (None, Some(name)) => {
                    let mut session = Session::ensure_database_exists(&params)?;
                    let nodes = ProjectStore::new(&mut session).load(&name)?;
                    (name, nodes)
                }
                (None, None) => anyhow::bail!("pass --file or --project"),
            };

            if nodes.is_empty() {
                anyhow::bail!("no functions to compile; add some to the diagram first");
            }

            let options = compile::CompileOptions {
                descriptions: !no_descriptions,
                io_details: !no_io,
                relationships: !no_relationships,
                implementation: !no_implementation,
            };
            let prompts = compile::compile_prompts(&name, &nodes, &options);

            match output {
                Some(path) => {
                    std::fs::write(&path, &prompts)?;
                    ui::status(Icons::FILE, "prompts written", &path.display().to_string());
                }
                None => println!("{prompts}"),
            }
        }
    }

    Ok(())
}
