//! CLI entry point for dev-notebook

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dev_notebook::Notebook;

#[derive(Parser)]
#[command(name = "dev-notebook")]
#[command(version)]
#[command(about = "A small notebook of programming concepts, served from Markdown", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new notebook with sample concepts
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new concept document
    New {
        /// Title of the new concept
        title: String,

        /// Slug to use instead of one derived from the title
        #[arg(short, long)]
        slug: Option<String>,
    },

    /// Export the notebook as static files
    #[command(alias = "b")]
    Build {
        /// Watch for file changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Start a local server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,

        /// Enable static mode (no file watching)
        #[arg(long)]
        r#static: bool,
    },

    /// Remove the public folder
    Clean,

    /// List concepts
    List {
        /// Only list concepts whose title contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "dev_notebook=debug,info"
    } else {
        "dev_notebook=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing notebook in {:?}", target_dir);
            dev_notebook::commands::init::init_notebook(&target_dir)?;
            println!("Initialized notebook in {:?}", target_dir);
        }

        Commands::New { title, slug } => {
            let notebook = Notebook::new(&base_dir)?;
            tracing::info!("Creating concept with title: {}", title);
            let path =
                dev_notebook::commands::new::create_concept(&notebook, &title, slug.as_deref())?;
            println!("Created: {}", path.display());
        }

        Commands::Build { watch } => {
            let notebook = Notebook::new(&base_dir)?;
            tracing::info!("Exporting static files...");

            let report = notebook.build().await?;
            if report.failed.is_empty() {
                println!("Exported {} concepts successfully!", report.concepts);
            } else {
                println!(
                    "Exported {} concepts, {} failed to load: {}",
                    report.concepts,
                    report.failed.len(),
                    report.failed.join(", ")
                );
            }

            if watch {
                dev_notebook::commands::build::watch(&notebook).await?;
            }
        }

        Commands::Server {
            port,
            ip,
            open,
            r#static,
        } => {
            let notebook = Notebook::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            dev_notebook::server::start(&notebook, &ip, port, !r#static, open).await?;
        }

        Commands::Clean => {
            let notebook = Notebook::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            notebook.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { search } => {
            let notebook = Notebook::new(&base_dir)?;
            dev_notebook::commands::list::run(&notebook, search.as_deref())?;
        }

        Commands::Version => {
            println!("dev-notebook version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
